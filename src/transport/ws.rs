//! WebSocket transport over `tokio-tungstenite`.
//!
//! `connect` performs the handshake, then splits the socket: a reader
//! task translates tungstenite messages into [`TransportEvent`]s, and a
//! dedicated writer task drains a command channel into the sink, so
//! [`Transport::send`] never blocks the caller.

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};

use super::{NotificationReceiver, NotificationSender, Transport, TransportEvent, WireFrame};
use crate::error::{Error, Result};

/// Command consumed by the writer task.
enum Command {
    Frame(WireFrame),
    Close,
}

/// WebSocket-backed [`Transport`].
pub struct WsTransport {
    commands: mpsc::UnboundedSender<Command>,
}

impl WsTransport {
    /// Connect to `uri`, optionally offering a WebSocket subprotocol.
    ///
    /// Returns the transport handle and the notification stream; an
    /// [`TransportEvent::Open`] is already queued on success.
    ///
    /// # Errors
    ///
    /// Returns a WebSocket error if the URI is invalid or the handshake
    /// fails, or [`Error::Protocol`] if the subprotocol is not a valid
    /// header value.
    pub async fn connect(
        uri: &str,
        subprotocol: Option<&str>,
    ) -> Result<(Self, NotificationReceiver)> {
        let mut request = uri.into_client_request()?;
        if let Some(protocol) = subprotocol {
            let value = HeaderValue::from_str(protocol)
                .map_err(|_| Error::Protocol(format!("invalid subprotocol {protocol:?}")))?;
            request.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, value);
        }

        let (socket, _response) = connect_async(request).await?;
        let (sink, source) = socket.split();

        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let _ = notify_tx.send(TransportEvent::Open);
        tokio::spawn(write_loop(sink, command_rx));
        tokio::spawn(read_loop(source, notify_tx));

        Ok((
            Self {
                commands: command_tx,
            },
            notify_rx,
        ))
    }
}

impl Transport for WsTransport {
    fn send(&self, frame: WireFrame) -> Result<()> {
        self.commands
            .send(Command::Frame(frame))
            .map_err(|_| Error::ConnectionClosed)
    }

    fn close(&self) -> Result<()> {
        self.commands
            .send(Command::Close)
            .map_err(|_| Error::ConnectionClosed)
    }
}

/// Drain outbound commands into the WebSocket sink.
async fn write_loop<S>(mut sink: S, mut commands: mpsc::UnboundedReceiver<Command>)
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    while let Some(command) = commands.recv().await {
        let result = match command {
            Command::Frame(WireFrame::Text(text)) => sink.send(Message::text(text)).await,
            Command::Frame(WireFrame::Binary(payload)) => {
                sink.send(Message::binary(payload)).await
            }
            Command::Close => {
                if let Err(e) = sink.send(Message::Close(None)).await {
                    tracing::debug!("close frame not sent: {e}");
                }
                return;
            }
        };

        if let Err(e) = result {
            tracing::warn!("websocket write failed: {e}");
            return;
        }
    }
}

/// Translate inbound WebSocket messages into transport notifications.
async fn read_loop<S>(mut source: S, notify: NotificationSender)
where
    S: Stream<Item = tungstenite::Result<Message>> + Unpin,
{
    while let Some(message) = source.next().await {
        let event = match message {
            Ok(Message::Text(text)) => {
                TransportEvent::Frame(WireFrame::Text(text.as_str().to_owned()))
            }
            Ok(Message::Binary(payload)) => TransportEvent::Frame(WireFrame::Binary(payload)),
            Ok(Message::Close(frame)) => {
                let _ = notify.send(close_event(frame));
                return;
            }
            // Ping/pong and raw frames are handled by tungstenite
            Ok(_) => continue,
            Err(e) => {
                let _ = notify.send(TransportEvent::Error(e.to_string()));
                break;
            }
        };

        if notify.send(event).is_err() {
            // Consumer went away; stop reading
            return;
        }
    }

    let _ = notify.send(TransportEvent::Closed {
        code: None,
        reason: String::new(),
    });
}

fn close_event(frame: Option<CloseFrame>) -> TransportEvent {
    match frame {
        Some(frame) => TransportEvent::Closed {
            code: Some(u16::from(frame.code)),
            reason: frame.reason.as_str().to_owned(),
        },
        None => TransportEvent::Closed {
            code: None,
            reason: String::new(),
        },
    }
}
