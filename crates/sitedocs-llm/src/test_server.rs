//! Minimal one-shot HTTP server for backend tests.

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Build a complete HTTP/1.1 response with a correct `Content-Length`.
pub(crate) fn http_response(status: u16, body: &str) -> String {
    let reason = match status {
        200 => "OK",
        401 => "Unauthorized",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "Status",
    };
    format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

/// Serve each response to one incoming connection, in order.
///
/// The request head and body are drained before answering so the client never
/// sees a reset on an unread socket.
pub(crate) async fn spawn_mock_server(responses: Vec<String>) -> (u16, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        for resp in responses {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let (reader, mut writer) = stream.split();
            let mut buf_reader = BufReader::new(reader);
            let mut content_length = 0usize;
            let mut line = String::new();
            loop {
                line.clear();
                buf_reader.read_line(&mut line).await.unwrap_or(0);
                if line == "\r\n" || line == "\n" || line.is_empty() {
                    break;
                }
                let lower = line.to_ascii_lowercase();
                if let Some(v) = lower.strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap_or(0);
                }
            }
            let mut body = vec![0u8; content_length];
            buf_reader.read_exact(&mut body).await.ok();
            writer.write_all(resp.as_bytes()).await.ok();
            writer.shutdown().await.ok();
        }
    });

    (port, handle)
}
