//! HTTP API for HR records: health checks, mock auth, employee listing.
//! Plain tokio sockets, one task per connection.

pub mod auth;
pub mod http;
pub mod routes;

pub use http::{HttpRequest, HttpResponse};
pub use routes::{handle_request, AppState};

use http::expected_request_len;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};

const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Accept connections forever.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    loop {
        let (stream, addr) = listener.accept().await?;
        debug!("New connection from: {}", addr);
        tokio::spawn(handle_connection(stream, Arc::clone(&state)));
    }
}

async fn handle_connection(mut stream: TcpStream, state: Arc<AppState>) {
    let raw = match read_request(&mut stream).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            let response = HttpResponse::detail(400, "Bad Request").render(None);
            if let Err(e) = stream.write_all(response.as_bytes()).await {
                warn!("Failed to write response: {}", e);
            }
            return;
        }
        Err(e) => {
            warn!("Failed to read from stream: {}", e);
            return;
        }
    };

    let text = String::from_utf8_lossy(&raw);
    let (response, origin) = match HttpRequest::parse(&text) {
        Some(request) => {
            let origin = state.allowed_origin(request.header("origin"));
            (handle_request(&request, &state).await, origin)
        }
        None => (HttpResponse::detail(400, "Bad Request"), None),
    };

    if let Err(e) = stream
        .write_all(response.render(origin.as_deref()).as_bytes())
        .await
    {
        warn!("Failed to write response: {}", e);
    }
}

/// Read headers plus `Content-Length` bytes of body. `None` when the
/// request exceeds the size limit.
async fn read_request(stream: &mut TcpStream) -> std::io::Result<Option<Vec<u8>>> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            return Ok(Some(buffer));
        }
        buffer.extend_from_slice(&chunk[..read]);
        if buffer.len() > MAX_REQUEST_BYTES {
            return Ok(None);
        }
        if let Some(total) = expected_request_len(&buffer) {
            if buffer.len() >= total {
                return Ok(Some(buffer));
            }
        }
    }
}
