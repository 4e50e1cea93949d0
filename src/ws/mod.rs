pub mod actor;
pub mod handler;
pub mod protocol;

use tokio::sync::mpsc;

/// Sender half of a connection's bounded outbound queue. The room clones
/// this to push events to a specific client; the connection's writer task
/// drains the other end into the WebSocket sink.
pub type ConnectionSender = mpsc::Sender<axum::extract::ws::Message>;
