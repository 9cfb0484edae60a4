//! Realtime WebSocket client.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use super::ClientError;
use crate::objects::{Identity, WsCloseCode, WsServerMessage};
use crate::signature::{IDENTITY_QUERY_PARAM, SIGNATURE_QUERY_PARAM, sign_identity};

/// An open `/api/v1/ws` connection yielding [`WsServerMessage`] frames.
pub struct RealtimeStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl RealtimeStream {
    /// Connect with the identity assertion carried in query parameters.
    pub async fn connect(
        base_url: &Url,
        identity: &Identity,
        identity_secret: &[u8],
    ) -> Result<Self, ClientError> {
        let url = realtime_url(base_url, identity, identity_secret)?;
        let (socket, _response) = connect_async(url.as_str()).await?;
        Ok(Self { socket })
    }

    /// Next server frame. `None` once the server closed the connection.
    ///
    /// Ping/pong and binary frames are skipped.
    pub async fn next_message(&mut self) -> Option<Result<WsServerMessage, ClientError>> {
        while let Some(frame) = self.socket.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    return Some(serde_json::from_str(&text).map_err(ClientError::Json));
                }
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }

    /// Close the connection with a normal close code.
    pub async fn close(mut self) -> Result<(), ClientError> {
        let frame = CloseFrame {
            code: CloseCode::from(WsCloseCode::NORMAL),
            reason: "client closed".into(),
        };
        self.socket.send(Message::Close(Some(frame))).await?;
        Ok(())
    }
}

fn realtime_url(
    base_url: &Url,
    identity: &Identity,
    identity_secret: &[u8],
) -> Result<Url, ClientError> {
    let mut url = base_url.join("/api/v1/ws")?;
    let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
    // http(s) -> ws(s) is always an allowed scheme change.
    let _ = url.set_scheme(scheme);

    let signed = sign_identity(identity, identity_secret);
    url.query_pairs_mut()
        .append_pair(IDENTITY_QUERY_PARAM, &signed.identity)
        .append_pair(SIGNATURE_QUERY_PARAM, &signed.signature);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::Bucket;

    #[test]
    fn realtime_url_switches_scheme_and_carries_identity() {
        let base = Url::parse("https://scratch.example.com/").unwrap();
        let url = realtime_url(&base, &Identity::new("u1", Bucket::B), b"secret").unwrap();

        assert_eq!(url.scheme(), "wss");
        assert_eq!(url.path(), "/api/v1/ws");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("identity".to_owned(), "u1.b".to_owned()));
        assert_eq!(pairs[1].0, "signature");
    }
}
