//! Minimal HTTP server answering canned responses, for client tests.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub struct StubServer {
    pub address: String,
    requests: JoinHandle<Vec<String>>,
}

impl StubServer {
    /// Serve one connection per response, in order.
    pub async fn start(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());

        let requests = tokio::spawn(async move {
            let mut seen = Vec::new();

            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();

                let mut head = Vec::new();
                let mut chunk = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    head.extend_from_slice(&chunk[..n]);
                }
                seen.push(String::from_utf8_lossy(&head).into_owned());

                let response = format!(
                    "HTTP/1.1 {} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }

            seen
        });

        Self { address, requests }
    }

    /// Request heads received, once every response was served.
    pub async fn requests(self) -> Vec<String> {
        self.requests.await.unwrap()
    }
}

/// First line of a request head.
pub fn request_line(request: &str) -> &str {
    request.lines().next().unwrap_or_default()
}

/// Value of a header, matched case-insensitively.
pub fn header<'a>(request: &'a str, name: &str) -> Option<&'a str> {
    request.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.eq_ignore_ascii_case(name).then(|| value.trim())
    })
}
