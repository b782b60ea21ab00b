//! Connection facade and driver loop.
//!
//! [`EvSocket`] is the public surface: it owns a transport, a listener
//! registry, and the session state, and runs a driver task that feeds
//! transport notifications through the dispatcher. The lifecycle:
//! 1. Connect the transport (or accept a pre-built one)
//! 2. Spawn the driver on the notification stream
//! 3. Dispatch inbound frames, applying emits and control transitions
//!
//! # Example
//!
//! ```ignore
//! use evsock_client::{callback, ConnectOptions, EvSocket};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> evsock_client::Result<()> {
//!     let socket = EvSocket::connect(
//!         "ws://localhost:8080",
//!         ConnectOptions::new().auth(json!({"token": "t"})),
//!     )
//!     .await?;
//!
//!     socket.on("open", callback(|_| println!("connected")));
//!     socket.on("chat", callback(|payload| {
//!         println!("chat: {:?}", payload.as_json());
//!     }));
//!
//!     socket.join("lobby")?;
//!     socket.send("chat", &"hello")?;
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::control::{local, wire, BroadcastRequest, ConnectionState};
use crate::dispatch::{Action, Dispatcher};
use crate::error::Result;
use crate::events::{Callback, EventPayload, ListenerId, ListenerRegistry};
use crate::protocol::{binary, Envelope};
use crate::transport::{
    NotificationReceiver, Transport, TransportEvent, WireFrame, WsTransport,
};

/// Connection options: WebSocket subprotocol and authentication
/// payload.
///
/// # Example
///
/// ```
/// use evsock_client::ConnectOptions;
/// use serde_json::json;
///
/// let options = ConnectOptions::new()
///     .protocol("evsock-v1")
///     .auth(json!({"token": "secret"}));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    protocol: Option<String>,
    auth: Option<Value>,
}

impl ConnectOptions {
    /// Empty options: no subprotocol, empty auth payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a WebSocket subprotocol during the handshake.
    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }

    /// Payload for the automatic authenticate reply. Servers that do
    /// not request authentication never see it.
    pub fn auth(mut self, auth: Value) -> Self {
        self.auth = Some(auth);
        self
    }
}

/// State shared between the facade and its driver task.
struct Shared {
    transport: Box<dyn Transport>,
    registry: Mutex<ListenerRegistry>,
    state: Mutex<ConnectionState>,
    dispatcher: Dispatcher,
}

impl Shared {
    fn registry(&self) -> MutexGuard<'_, ListenerRegistry> {
        self.registry.lock().expect("listener registry poisoned")
    }

    fn state(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().expect("connection state poisoned")
    }
}

/// An event-multiplexed connection.
///
/// All methods are non-blocking; sends are queued to the transport's
/// writer. Listener callbacks run on the driver task, one at a time, in
/// registration order.
pub struct EvSocket {
    shared: Arc<Shared>,
    /// Driver task handle; the task ends when the transport closes.
    _driver: JoinHandle<()>,
}

impl EvSocket {
    /// Connect over WebSocket.
    ///
    /// # Errors
    ///
    /// Returns a WebSocket error if the URI is invalid or the handshake
    /// fails.
    pub async fn connect(uri: &str, options: ConnectOptions) -> Result<Self> {
        let (transport, notifications) =
            WsTransport::connect(uri, options.protocol.as_deref()).await?;
        Ok(Self::with_transport(transport, notifications, options.auth))
    }

    /// Wrap an already-constructed transport.
    ///
    /// `notifications` is the transport's event stream; `auth` is the
    /// payload for the automatic authenticate reply.
    pub fn with_transport<T: Transport>(
        transport: T,
        notifications: NotificationReceiver,
        auth: Option<Value>,
    ) -> Self {
        let shared = Arc::new(Shared {
            transport: Box::new(transport),
            registry: Mutex::new(ListenerRegistry::new()),
            state: Mutex::new(ConnectionState::new()),
            dispatcher: Dispatcher::new(auth),
        });

        let driver = tokio::spawn(drive(shared.clone(), notifications));

        Self {
            shared,
            _driver: driver,
        }
    }

    /// The server-assigned connection id, once sync has arrived.
    pub fn id(&self) -> Option<String> {
        self.shared.state().id().map(str::to_owned)
    }

    /// Current channel name; empty when not joined.
    pub fn channel_name(&self) -> String {
        self.shared.state().channel_name().to_owned()
    }

    /// Register a persistent listener.
    pub fn on(&self, event: &str, callback: Callback) -> ListenerId {
        self.shared.registry().on(event, callback)
    }

    /// Register a one-shot listener.
    pub fn once(&self, event: &str, callback: Callback) -> ListenerId {
        self.shared.registry().once(event, callback)
    }

    /// Remove the first listener on `event` registered with this exact
    /// callback `Arc`.
    pub fn off(&self, event: &str, callback: &Callback) {
        self.shared.registry().off(event, callback);
    }

    /// Remove a listener by the id `on`/`once` returned.
    pub fn off_id(&self, event: &str, id: ListenerId) {
        self.shared.registry().off_id(event, id);
    }

    /// Drop every listener for `event`.
    pub fn off_event(&self, event: &str) {
        self.shared.registry().off_event(event);
    }

    /// Drop every listener for every event.
    pub fn off_all(&self) {
        self.shared.registry().off_all();
    }

    /// Fire a local event. Does not touch the wire; part of the public
    /// surface for symmetry with `on`.
    pub fn emit(&self, event: &str, payload: &EventPayload) {
        emit_local(&self.shared, event, payload);
    }

    /// Send a named event with a JSON payload as a text frame.
    ///
    /// # Errors
    ///
    /// Fails if the payload cannot be serialized or the connection has
    /// closed.
    pub fn send<T: Serialize>(&self, event: &str, data: &T) -> Result<()> {
        let envelope = Envelope::new(event, serde_json::to_value(data)?);
        self.shared
            .transport
            .send(WireFrame::Text(envelope.to_text()?))
    }

    /// Send a named event with an opaque binary payload.
    ///
    /// The event name travels as the frame's metadata envelope; the
    /// payload bytes are appended verbatim.
    ///
    /// # Errors
    ///
    /// Fails if the serialized metadata exceeds 255 UTF-16 code units
    /// or the connection has closed.
    pub fn send_binary(&self, event: &str, payload: &[u8]) -> Result<()> {
        let metadata = Envelope::event_only(event).to_text()?;
        let framed = binary::attach(payload, &metadata)?;
        self.shared.transport.send(WireFrame::Binary(framed))
    }

    /// Ask the server to join a channel.
    pub fn join(&self, channel: &str) -> Result<()> {
        self.send(wire::JOIN_CHANNEL, &channel)
    }

    /// Ask the server to leave the current channel.
    pub fn leave(&self) -> Result<()> {
        let envelope = Envelope::event_only(wire::LEAVE_CHANNEL);
        self.shared
            .transport
            .send(WireFrame::Text(envelope.to_text()?))
    }

    /// Fan an event out to the members of the joined channel.
    ///
    /// Silently dropped when not in a channel. Membership is
    /// server-confirmed, so a broadcast issued before the channeljoin
    /// round-trip completes is a no-op.
    pub fn broadcast<T: Serialize>(&self, event: &str, data: &T) -> Result<()> {
        if !self.shared.state().is_joined() {
            tracing::debug!(event, "not in a channel, dropping broadcast");
            return Ok(());
        }

        let request = BroadcastRequest {
            event: event.to_string(),
            data: serde_json::to_value(data)?,
        };
        self.send(wire::BROADCAST, &request)
    }

    /// Close the connection.
    ///
    /// Listeners for the local `close` event fire when the transport
    /// confirms; sending after close fails with a closed-connection
    /// error.
    pub fn close(&self) -> Result<()> {
        self.shared.transport.close()
    }
}

/// Driver loop: one notification at a time, in arrival order.
async fn drive(shared: Arc<Shared>, mut notifications: NotificationReceiver) {
    while let Some(event) = notifications.recv().await {
        match event {
            TransportEvent::Open => {
                // The local open event is tied to sync, not the socket
                tracing::debug!("transport connected");
            }

            TransportEvent::Frame(frame) => {
                let dispatched = {
                    let mut state = shared.state();
                    shared.dispatcher.dispatch(&frame, &mut state)
                };

                match dispatched {
                    Ok(actions) => apply_actions(&shared, actions),
                    Err(e) => {
                        // One bad frame never takes the connection down
                        tracing::warn!("dropping inbound frame: {e}");
                        emit_local(
                            &shared,
                            local::ERROR,
                            &EventPayload::Json(Value::String(e.to_string())),
                        );
                    }
                }
            }

            TransportEvent::Closed { code, reason } => {
                tracing::debug!(?code, %reason, "transport closed");
                emit_local(
                    &shared,
                    local::CLOSE,
                    &EventPayload::Json(json!({"code": code, "reason": reason})),
                );
            }

            TransportEvent::Error(message) => {
                tracing::warn!(%message, "transport error");
                emit_local(
                    &shared,
                    local::ERROR,
                    &EventPayload::Json(Value::String(message)),
                );
            }
        }
    }

    tracing::debug!("notification stream ended, driver exiting");
}

fn apply_actions(shared: &Arc<Shared>, actions: Vec<Action>) {
    for action in actions {
        match action {
            Action::Emit { event, payload } => emit_local(shared, &event, &payload),
            Action::Send(frame) => {
                if let Err(e) = shared.transport.send(frame) {
                    tracing::warn!("control reply not sent: {e}");
                }
            }
            Action::LeaveChannel => shared.state().leave_channel(),
        }
    }
}

/// Snapshot the listeners under the lock, invoke them outside it.
/// Callbacks may re-enter `on`/`off`/`send` freely.
fn emit_local(shared: &Shared, event: &str, payload: &EventPayload) {
    let snapshot = shared.registry().begin_emit(event);
    for callback in snapshot {
        callback(payload);
    }
}
