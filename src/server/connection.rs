//! Per-connection lifecycle: decode, dispatch, flush, close.

use crate::{
    http::{request::RequestDecoder, response::ResponseWriter},
    limits::{ConnLimits, ReqLimits},
    router::Handler,
    StatusCode,
};
use std::net::SocketAddr;
use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    time::timeout,
};

/// Serves exactly one request on `stream`, then closes it
/// (`Connection: close` semantics; connections are never reused).
pub(crate) async fn run<S>(
    mut stream: S,
    client_addr: SocketAddr,
    handler: Handler,
    req_limits: ReqLimits,
    conn_limits: ConnLimits,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let decoded = timeout(
        conn_limits.read_timeout,
        RequestDecoder::from_reader(&mut stream, &req_limits),
    )
    .await;

    match decoded {
        Err(_elapsed) => {
            tracing::warn!(%client_addr, "request read timed out");
            send_error(&mut stream, StatusCode::RequestTimeout).await;
        }
        Ok(Err(err)) => {
            tracing::warn!(%client_addr, error = %err, "failed to decode request");
            if let Some(status) = err.status() {
                send_error(&mut stream, status).await;
            }
        }
        Ok(Ok((mut request, excess))) => {
            if !excess.is_empty() {
                // A second pipelined request may sit here; it is preserved
                // by the decoder but this server never reuses connections.
                tracing::debug!(%client_addr, bytes = excess.len(), "ignoring bytes past the request");
            }

            let mut writer = ResponseWriter::new();
            handler(&mut writer, &mut request);

            if let Err(err) = stream.write_all(writer.buffer()).await {
                tracing::warn!(%client_addr, error = %err, "failed to write response");
            }
        }
    }

    let _ = stream.shutdown().await;
}

async fn send_error<S>(stream: &mut S, status: StatusCode)
where
    S: AsyncWrite + Unpin,
{
    let mut writer = ResponseWriter::new();
    writer.respond(status, status.reason().as_bytes());

    if let Err(err) = stream.write_all(writer.buffer()).await {
        tracing::debug!(error = %err, "failed to write error response");
    }
}
