use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};
use tokio_util::sync::CancellationToken;

use crate::room::registry::RoomHandle;
use crate::state::AppState;
use crate::ws::protocol::{self, ServerEvent};

/// Ping interval: server sends WebSocket ping every 30 seconds, so
/// abruptly dropped connections cannot leak members or edit locks.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Pong timeout: if pong not received within 10 seconds after ping, close.
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Close code sent when joining a room that does not exist.
const CLOSE_ROOM_NOT_FOUND: u16 = 4004;

/// Close code sent when the member's outbound queue overflowed.
const CLOSE_OVERLOADED: u16 = 1013;

/// Run the actor-per-connection state machine: CONNECTING → JOINED → CLOSED.
///
/// Splits the WebSocket into reader and writer halves:
/// - Writer task: owns the sink, forwards frames from a bounded mpsc channel
/// - Reader loop: parses action messages and applies them to the room
///
/// The room clones the bounded sender to fan events out to this client.
/// On any exit from the reader loop, graceful or abrupt, the member is
/// removed from the room, its edit locks are released, and `user_left`
/// is broadcast to the remaining members.
pub async fn run_connection(
    mut socket: WebSocket,
    state: AppState,
    room_id: String,
    username: String,
) {
    // CONNECTING: the target room must exist before a member is created.
    let Some(room) = state.rooms.get(&room_id) else {
        tracing::warn!(room_id = %room_id, username = %username, "Join rejected, room not found");
        if let Some(frame) = protocol::encode_event(&ServerEvent::Error {
            message: "Room not found".to_string(),
        }) {
            let _ = socket.send(frame).await;
        }
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: CLOSE_ROOM_NOT_FOUND,
                reason: "Room not found".into(),
            })))
            .await;
        return;
    };

    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::channel::<Message>(state.outbound_queue);
    let kill = CancellationToken::new();

    // JOINED: register the member, enqueue its snapshot, and announce it
    // to the rest of the room in one critical section. The init frame
    // must be queued before the lock is released: the member is already
    // in the presence set, so a competing broadcast would otherwise land
    // in its queue ahead of the snapshot. The queue is freshly created
    // and broadcasts serialize on this lock, so try_send cannot fail here.
    let member_id = {
        let mut guard = match room.lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::error!(room_id = %room_id, "Room lock poisoned, refusing join");
                return;
            }
        };
        let snapshot = guard.join(&username, tx.clone(), kill.clone());
        let member_id = snapshot.member.id.clone();
        let init = ServerEvent::Init {
            user: snapshot.member.identity(),
            pins: snapshot.pins,
            users: snapshot.others,
        };
        if let Some(frame) = protocol::encode_event(&init) {
            let _ = tx.try_send(frame);
        }
        guard.broadcast(
            &ServerEvent::UserJoined {
                user: snapshot.member.view(),
            },
            Some(&member_id),
        );
        member_id
    };

    tracing::info!(
        room_id = %room_id,
        member_id = %member_id,
        username = %username,
        "WebSocket actor started"
    );

    // Spawn writer task: forwards queued frames to the WebSocket sink
    let writer_handle = tokio::spawn(writer_task(ws_sender, rx));

    // Track pong reception
    let (pong_tx, mut pong_rx) = mpsc::unbounded_channel::<()>();

    // Spawn ping task: sends periodic pings and monitors pong responses
    let ping_tx = tx.clone();
    let ping_handle = tokio::spawn(async move {
        let mut ping_timer = interval(PING_INTERVAL);
        // Skip the first immediate tick
        ping_timer.tick().await;

        loop {
            ping_timer.tick().await;

            match ping_tx.try_send(Message::Ping(vec![1, 2, 3, 4].into())) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    // Queue congested; the overload policy will deal with
                    // this member on the next broadcast.
                    continue;
                }
                Err(mpsc::error::TrySendError::Closed(_)) => break,
            }

            match timeout(PONG_TIMEOUT, pong_rx.recv()).await {
                Ok(Some(())) => {
                    // Pong received, continue
                }
                _ => {
                    tracing::warn!("Pong timeout, closing connection");
                    let _ = ping_tx.try_send(Message::Close(Some(CloseFrame {
                        code: 1001,
                        reason: "Pong timeout".into(),
                    })));
                    break;
                }
            }
        }
    });

    // Reader loop: one action message at a time, applied to the room
    // under its lock, until the transport ends or the kill token fires.
    loop {
        tokio::select! {
            _ = kill.cancelled() => {
                tracing::warn!(
                    room_id = %room_id,
                    member_id = %member_id,
                    "Force-disconnecting overloaded member"
                );
                let _ = tx.try_send(Message::Close(Some(CloseFrame {
                    code: CLOSE_OVERLOADED,
                    reason: "Outbound queue overflow".into(),
                })));
                break;
            }
            incoming = ws_receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    match room.lock() {
                        Ok(mut guard) => {
                            protocol::handle_text_message(text.as_str(), &mut guard, &member_id);
                        }
                        Err(_) => {
                            tracing::error!(room_id = %room_id, "Room lock poisoned");
                            break;
                        }
                    }
                }
                Some(Ok(Message::Binary(_))) => {
                    tracing::debug!(
                        member_id = %member_id,
                        "Ignoring binary frame (protocol is JSON text)"
                    );
                }
                Some(Ok(Message::Pong(_))) => {
                    let _ = pong_tx.send(());
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = tx.try_send(Message::Pong(data));
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(
                        member_id = %member_id,
                        reason = ?frame,
                        "Client initiated close"
                    );
                    break;
                }
                Some(Err(e)) => {
                    tracing::warn!(
                        member_id = %member_id,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
                None => {
                    tracing::info!(member_id = %member_id, "WebSocket stream ended");
                    break;
                }
            }
        }
    }

    writer_handle.abort();
    ping_handle.abort();

    // CLOSED: cleanup must run for graceful and abrupt termination alike,
    // so a poisoned lock is recovered rather than skipped.
    cleanup(&room, &member_id);

    tracing::info!(
        room_id = %room_id,
        member_id = %member_id,
        username = %username,
        "WebSocket actor stopped"
    );
}

/// Remove the member, release its edit locks, and notify the room.
fn cleanup(room: &RoomHandle, member_id: &str) {
    let mut guard = match room.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if guard.leave(member_id) {
        guard.broadcast(
            &ServerEvent::UserLeft {
                member_id: member_id.to_string(),
            },
            None,
        );
    }
}

/// Writer task: receives frames from the bounded channel and forwards
/// them to the WebSocket sink.
async fn writer_task(
    mut ws_sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        if ws_sender.send(msg).await.is_err() {
            // WebSocket send failed — connection is broken
            break;
        }
    }
}
