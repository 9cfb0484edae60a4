use axum::{
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use scratch_core::events::{ChannelKey, EventReceiver, RealtimeEvent};
use scratch_sdk::objects::{Identity, WsCloseCode, WsServerMessage};
use tokio::sync::broadcast::error::RecvError;

use crate::api::extractors::SocketUser;
use crate::state::AppState;

/// `GET /ws`: realtime stream for the authenticated caller.
///
/// The connection joins the caller's bucket channel (card updates from the
/// opposite bucket) and user channel (their notifications). Delivery is
/// best effort; after a [`WsServerMessage::Resync`] the client re-fetches
/// over HTTP.
pub(super) async fn realtime_ws(
    State(state): State<AppState>,
    SocketUser(identity): SocketUser,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, identity))
}

enum Flow {
    Continue,
    Stop,
}

/// Background task that drives a single WebSocket connection.
async fn handle_socket(mut socket: WebSocket, state: AppState, identity: Identity) {
    let fanout = state.engine.fanout.clone();
    let bucket_key = ChannelKey::Bucket(identity.bucket);
    let user_key = ChannelKey::User(identity.user_id.clone());

    // Subscribe before announcing so nothing sent after `joined` is missed.
    let mut bucket_rx = fanout.subscribe(bucket_key.clone());
    let mut user_rx = fanout.subscribe(user_key.clone());
    tracing::debug!(user_id = %identity.user_id, bucket = %identity.bucket, "WS: joined");

    relay(&mut socket, &identity, &mut bucket_rx, &mut user_rx).await;

    drop(bucket_rx);
    drop(user_rx);
    fanout.release(&bucket_key);
    fanout.release(&user_key);
    tracing::debug!(user_id = %identity.user_id, "WS: left");
}

async fn relay(
    socket: &mut WebSocket,
    identity: &Identity,
    bucket_rx: &mut EventReceiver,
    user_rx: &mut EventReceiver,
) {
    let joined = WsServerMessage::Joined {
        user_id: identity.user_id.clone(),
        bucket: identity.bucket,
    };
    if send_json(socket, &joined).await.is_err() {
        return;
    }

    loop {
        let flow = tokio::select! {
            result = bucket_rx.recv() => forward(socket, identity, result).await,
            result = user_rx.recv() => forward(socket, identity, result).await,
            msg = socket.recv() => match msg {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => Flow::Stop,
                // Pings are answered by axum; client text is ignored.
                Some(Ok(_)) => Flow::Continue,
            },
        };
        if let Flow::Stop = flow {
            return;
        }
    }
}

async fn forward(
    socket: &mut WebSocket,
    identity: &Identity,
    result: Result<RealtimeEvent, RecvError>,
) -> Flow {
    let msg = match result {
        Ok(event) => WsServerMessage::from(event),
        Err(RecvError::Lagged(skipped)) => {
            tracing::warn!(
                user_id = %identity.user_id,
                skipped,
                "WS: broadcast receiver lagged, asking client to resync"
            );
            WsServerMessage::Resync {
                reason: format!("{skipped} events dropped"),
            }
        }
        Err(RecvError::Closed) => {
            tracing::error!(user_id = %identity.user_id, "WS: event channel closed");
            let _ = send_json(
                socket,
                &WsServerMessage::Error {
                    code: WsCloseCode::INTERNAL_ERROR,
                    reason: "internal error".into(),
                },
            )
            .await;
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: WsCloseCode::INTERNAL_ERROR,
                    reason: "internal error".into(),
                })))
                .await;
            return Flow::Stop;
        }
    };

    match send_json(socket, &msg).await {
        Ok(()) => Flow::Continue,
        Err(()) => Flow::Stop,
    }
}

/// Serialize `value` as JSON and send it as a text WebSocket frame.
///
/// Returns `Err(())` if the send fails (client disconnected).
async fn send_json<T: serde::Serialize>(socket: &mut WebSocket, value: &T) -> Result<(), ()> {
    let json = serde_json::to_string(value).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}
