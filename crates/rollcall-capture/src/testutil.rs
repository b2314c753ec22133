//! A socket-level stub camera device for tests.
//!
//! Speaks just enough HTTP/1.1 for the wire contract endpoints. Each
//! request gets its own connection (`Connection: close`), which keeps the
//! handler a simple accept loop.

use std::time::Duration;

use tokio::{
  io::{AsyncReadExt, AsyncWriteExt},
  net::{TcpListener, TcpStream},
  task::JoinHandle,
};

#[derive(Debug, Clone, Default)]
pub struct StubBehavior {
  /// Delay `/capture` responses to provoke a capture timeout.
  pub capture_delay: Option<Duration>,
  /// Answer `/ping` with 503 instead of 200.
  pub fail_ping:     bool,
}

pub struct StubDevice {
  port:   u16,
  handle: JoinHandle<()>,
}

impl StubDevice {
  pub async fn spawn(behavior: StubBehavior) -> Self {
    let listener = TcpListener::bind("127.0.0.1:0")
      .await
      .expect("bind stub device");
    Self::spawn_on(listener, behavior)
  }

  /// Bind to a specific address — used by the discovery test.
  pub async fn spawn_at(addr: &str, behavior: StubBehavior) -> Self {
    let listener = TcpListener::bind(addr).await.expect("bind stub device");
    Self::spawn_on(listener, behavior)
  }

  fn spawn_on(listener: TcpListener, behavior: StubBehavior) -> Self {
    let port = listener.local_addr().expect("stub addr").port();
    let handle = tokio::spawn(async move {
      loop {
        let Ok((socket, _)) = listener.accept().await else {
          break;
        };
        let behavior = behavior.clone();
        tokio::spawn(async move {
          let _ = handle_connection(socket, behavior).await;
        });
      }
    });
    Self { port, handle }
  }

  pub fn port(&self) -> u16 { self.port }

  /// Stop answering, simulating a silent device disconnect.
  pub fn kill(&self) { self.handle.abort(); }
}

impl Drop for StubDevice {
  fn drop(&mut self) { self.handle.abort(); }
}

async fn handle_connection(
  mut socket: TcpStream,
  behavior: StubBehavior,
) -> std::io::Result<()> {
  let mut buf = vec![0u8; 4096];
  let mut read = 0;
  // Read until the end of the request head.
  loop {
    let n = socket.read(&mut buf[read..]).await?;
    if n == 0 {
      return Ok(());
    }
    read += n;
    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") || read == buf.len() {
      break;
    }
  }

  let head = String::from_utf8_lossy(&buf[..read]);
  let path = head
    .lines()
    .next()
    .and_then(|line| line.split_whitespace().nth(1))
    .unwrap_or("/")
    .to_string();

  let (status, content_type, body): (&str, &str, Vec<u8>) = match path.as_str()
  {
    "/status" => (
      "200 OK",
      "application/json",
      br#"{"model":"ESP32-CAM","firmware":"1.4.2","resolution":"640x480"}"#
        .to_vec(),
    ),
    "/capture" => {
      if let Some(delay) = behavior.capture_delay {
        tokio::time::sleep(delay).await;
      }
      ("200 OK", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10])
    }
    "/stream" => (
      "200 OK",
      "multipart/x-mixed-replace; boundary=frame",
      b"--frame\r\n".to_vec(),
    ),
    "/ping" => {
      if behavior.fail_ping {
        ("503 Service Unavailable", "text/plain", b"down".to_vec())
      } else {
        ("200 OK", "text/plain", b"ok".to_vec())
      }
    }
    "/control" => ("200 OK", "application/json", b"{}".to_vec()),
    _ => ("404 Not Found", "text/plain", b"not found".to_vec()),
  };

  let header = format!(
    "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
    body.len()
  );
  socket.write_all(header.as_bytes()).await?;
  socket.write_all(&body).await?;
  socket.shutdown().await?;
  Ok(())
}
