//! Best-effort subnet scan for camera devices.
//!
//! Probes every host in `prefix.1 ..= prefix.254` with a short bounded
//! `GET /status`. All probes run concurrently; individual failures are
//! swallowed and never abort the scan.

use std::{net::Ipv4Addr, time::Duration};

use tokio::task::JoinSet;

use crate::{Error, Result};

fn parse_prefix(prefix: &str) -> Result<[u8; 3]> {
  let octets: Vec<u8> = prefix
    .split('.')
    .map(|part| part.parse::<u8>())
    .collect::<std::result::Result<_, _>>()
    .map_err(|_| Error::Subnet(prefix.to_string()))?;
  let [a, b, c] = octets[..] else {
    return Err(Error::Subnet(prefix.to_string()));
  };
  Ok([a, b, c])
}

/// Scan `prefix.1 ..= prefix.254` (`prefix` like `"192.168.1"`) on `port`,
/// returning the reachable device addresses in ascending order.
pub async fn scan_subnet(
  prefix: &str,
  port: u16,
  probe_timeout: Duration,
) -> Result<Vec<Ipv4Addr>> {
  let [a, b, c] = parse_prefix(prefix)?;
  let client = reqwest::Client::builder()
    .connect_timeout(probe_timeout)
    .build()?;

  let mut probes = JoinSet::new();
  for host in 1u8..=254 {
    let addr = Ipv4Addr::new(a, b, c, host);
    let url = format!("http://{addr}:{port}/status");
    let client = client.clone();
    probes.spawn(async move {
      let reachable = matches!(
        tokio::time::timeout(probe_timeout, client.get(&url).send()).await,
        Ok(Ok(resp)) if resp.status().is_success()
      );
      (addr, reachable)
    });
  }

  let mut found = Vec::new();
  while let Some(joined) = probes.join_next().await {
    match joined {
      Ok((addr, true)) => {
        tracing::info!(%addr, "device found");
        found.push(addr);
      }
      Ok((_, false)) => {}
      Err(e) => tracing::debug!(error = %e, "probe task failed"),
    }
  }

  found.sort();
  Ok(found)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testutil::{StubBehavior, StubDevice};

  #[test]
  fn prefix_parsing() {
    assert_eq!(parse_prefix("192.168.1").unwrap(), [192, 168, 1]);
    assert!(parse_prefix("192.168").is_err());
    assert!(parse_prefix("192.168.1.0").is_err());
    assert!(parse_prefix("not.a.prefix").is_err());
  }

  #[tokio::test]
  async fn scan_finds_only_listening_hosts() {
    // Every 127.0.0.x resolves to loopback; bind one specific host so
    // exactly one probe succeeds and the other 253 are refused.
    let stub =
      StubDevice::spawn_at("127.0.0.23:0", StubBehavior::default()).await;

    let found = scan_subnet(
      "127.0.0",
      stub.port(),
      Duration::from_millis(500),
    )
    .await
    .unwrap();

    assert_eq!(found, vec![Ipv4Addr::new(127, 0, 0, 23)]);
  }
}
