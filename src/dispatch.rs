//! Inbound frame classification and control-event handling.
//!
//! The dispatcher is a pure state machine: it decodes one frame,
//! applies control transitions to the [`ConnectionState`], and returns
//! the local emits and outbound sends for the connection driver to
//! perform. It never does I/O itself, so every protocol rule is
//! testable without a transport.

use bytes::Bytes;
use serde_json::Value;

use crate::control::{local, wire, ConnectionState, SyncPayload};
use crate::error::{Error, Result};
use crate::events::EventPayload;
use crate::protocol::{binary, Envelope};
use crate::transport::WireFrame;

/// One step the connection driver must take after dispatching a frame.
#[derive(Debug)]
pub enum Action {
    /// Fire a local event.
    Emit {
        /// Event name.
        event: String,
        /// Payload handed to listeners.
        payload: EventPayload,
    },
    /// Send a frame to the server.
    Send(WireFrame),
    /// Clear channel membership. Ordered after the corresponding emit
    /// so channelleave listeners still observe the joined state.
    LeaveChannel,
}

/// Decodes inbound frames and interprets reserved control events.
pub struct Dispatcher {
    auth: Value,
}

impl Dispatcher {
    /// Create a dispatcher with the caller-supplied authentication
    /// payload. An empty JSON object stands in when none is configured.
    pub fn new(auth: Option<Value>) -> Self {
        Self {
            auth: auth.unwrap_or_else(|| Value::Object(Default::default())),
        }
    }

    /// Dispatch one inbound frame.
    ///
    /// On success the returned actions must be applied in order. On
    /// error the frame is dropped whole: `state` is only mutated by
    /// fully decoded control events, so a malformed frame never leaves
    /// partial state behind.
    pub fn dispatch(&self, frame: &WireFrame, state: &mut ConnectionState) -> Result<Vec<Action>> {
        match frame {
            WireFrame::Text(text) => self.dispatch_text(text, state),
            WireFrame::Binary(payload) => dispatch_binary(payload),
        }
    }

    fn dispatch_text(&self, text: &str, state: &mut ConnectionState) -> Result<Vec<Action>> {
        let envelope = Envelope::parse(text)?;

        match envelope.event.as_str() {
            wire::SYNC => {
                let sync: SyncPayload =
                    serde_json::from_value(envelope.data.unwrap_or(Value::Null))?;
                let mut actions = Vec::new();

                if state.assign_id(&sync.id) {
                    actions.push(Action::Emit {
                        event: local::OPEN.to_string(),
                        payload: EventPayload::None,
                    });
                } else {
                    tracing::warn!(id = %sync.id, "ignoring id reassignment from repeated sync");
                }

                if sync.has_auth {
                    let reply = Envelope::new(wire::AUTHENTICATE, self.auth.clone());
                    actions.push(Action::Send(WireFrame::Text(reply.to_text()?)));
                }

                Ok(actions)
            }

            wire::CHANNEL_JOIN => {
                let name = envelope
                    .data
                    .as_ref()
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        Error::Protocol("channeljoin payload must be a string".to_string())
                    })?;
                state.join_channel(name);
                tracing::debug!(channel = %name, "joined channel");

                Ok(vec![Action::Emit {
                    event: local::CHANNEL_JOIN.to_string(),
                    payload: EventPayload::Json(Value::String(name.to_string())),
                }])
            }

            wire::CHANNEL_LEAVE => {
                tracing::debug!(channel = %state.channel_name(), "leaving channel");

                // Emit first, clear after: listeners see the old state
                Ok(vec![
                    Action::Emit {
                        event: local::CHANNEL_LEAVE.to_string(),
                        payload: match envelope.data {
                            Some(data) => EventPayload::Json(data),
                            None => EventPayload::None,
                        },
                    },
                    Action::LeaveChannel,
                ])
            }

            _ => {
                if wire::is_control(&envelope.event) {
                    tracing::warn!(event = %envelope.event, "unrecognized control event, forwarding to listeners");
                }
                Ok(vec![Action::Emit {
                    payload: match envelope.data {
                        Some(data) => EventPayload::Json(data),
                        None => EventPayload::None,
                    },
                    event: envelope.event,
                }])
            }
        }
    }
}

/// Decode a binary frame: the metadata string is an event-only
/// envelope, the detached tail is the listener-visible payload.
fn dispatch_binary(frame: &Bytes) -> Result<Vec<Action>> {
    let metadata = binary::extract_metadata(frame)?;
    let payload = binary::detach(frame)?;
    let envelope = Envelope::parse(&metadata)?;

    Ok(vec![Action::Emit {
        event: envelope.event,
        payload: EventPayload::Binary(payload),
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_frame(value: Value) -> WireFrame {
        WireFrame::Text(value.to_string())
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(None)
    }

    /// Apply a LeaveChannel action the way the driver would.
    fn apply_state_actions(actions: &[Action], state: &mut ConnectionState) {
        for action in actions {
            if matches!(action, Action::LeaveChannel) {
                state.leave_channel();
            }
        }
    }

    #[test]
    fn test_sync_assigns_id_and_emits_open() {
        let mut state = ConnectionState::new();
        let frame = text_frame(json!({"event": wire::SYNC, "data": {"id": "abc123"}}));

        let actions = dispatcher().dispatch(&frame, &mut state).unwrap();

        assert_eq!(state.id(), Some("abc123"));
        assert_eq!(actions.len(), 1);
        assert!(matches!(
            &actions[0],
            Action::Emit { event, payload: EventPayload::None } if event == local::OPEN
        ));
    }

    #[test]
    fn test_sync_with_auth_sends_authenticate() {
        let mut state = ConnectionState::new();
        let dispatcher = Dispatcher::new(Some(json!({"token": "t"})));
        let frame = text_frame(json!({
            "event": wire::SYNC,
            "data": {"id": "abc123", "hasAuth": true}
        }));

        let actions = dispatcher.dispatch(&frame, &mut state).unwrap();

        assert_eq!(actions.len(), 2);
        assert!(matches!(&actions[0], Action::Emit { event, .. } if event == local::OPEN));
        match &actions[1] {
            Action::Send(WireFrame::Text(text)) => {
                let reply = Envelope::parse(text).unwrap();
                assert_eq!(reply.event, wire::AUTHENTICATE);
                assert_eq!(reply.data, Some(json!({"token": "t"})));
            }
            other => panic!("expected authenticate send, got {other:?}"),
        }
    }

    #[test]
    fn test_sync_without_configured_auth_sends_empty_object() {
        let mut state = ConnectionState::new();
        let frame = text_frame(json!({
            "event": wire::SYNC,
            "data": {"id": "abc123", "hasAuth": true}
        }));

        let actions = dispatcher().dispatch(&frame, &mut state).unwrap();

        match &actions[1] {
            Action::Send(WireFrame::Text(text)) => {
                assert_eq!(Envelope::parse(text).unwrap().data, Some(json!({})));
            }
            other => panic!("expected authenticate send, got {other:?}"),
        }
    }

    #[test]
    fn test_repeated_sync_keeps_first_id_and_opens_once() {
        let mut state = ConnectionState::new();
        let d = dispatcher();

        let first = text_frame(json!({"event": wire::SYNC, "data": {"id": "one"}}));
        let second = text_frame(json!({"event": wire::SYNC, "data": {"id": "two", "hasAuth": true}}));

        d.dispatch(&first, &mut state).unwrap();
        let actions = d.dispatch(&second, &mut state).unwrap();

        assert_eq!(state.id(), Some("one"));
        // No second open, but the authenticate request is still honored
        assert_eq!(actions.len(), 1);
        assert!(matches!(&actions[0], Action::Send(_)));
    }

    #[test]
    fn test_sync_without_id_is_decode_error() {
        let mut state = ConnectionState::new();
        let frame = text_frame(json!({"event": wire::SYNC, "data": {"hasAuth": true}}));

        assert!(dispatcher().dispatch(&frame, &mut state).is_err());
        assert_eq!(state.id(), None);
    }

    #[test]
    fn test_channel_join_sets_state_and_emits() {
        let mut state = ConnectionState::new();
        let frame = text_frame(json!({"event": wire::CHANNEL_JOIN, "data": "room-1"}));

        let actions = dispatcher().dispatch(&frame, &mut state).unwrap();

        assert_eq!(state.channel_name(), "room-1");
        assert!(matches!(
            &actions[0],
            Action::Emit { event, payload: EventPayload::Json(Value::String(name)) }
                if event == local::CHANNEL_JOIN && name == "room-1"
        ));
    }

    #[test]
    fn test_channel_join_rejects_non_string_payload() {
        let mut state = ConnectionState::new();
        let frame = text_frame(json!({"event": wire::CHANNEL_JOIN, "data": 7}));

        let err = dispatcher().dispatch(&frame, &mut state).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
        assert!(!state.is_joined());
    }

    #[test]
    fn test_channel_leave_emits_before_clearing() {
        let mut state = ConnectionState::new();
        state.join_channel("room-1");
        let frame = text_frame(json!({"event": wire::CHANNEL_LEAVE, "data": "room-1"}));

        let actions = dispatcher().dispatch(&frame, &mut state).unwrap();

        // State untouched until the deferred action runs
        assert_eq!(state.channel_name(), "room-1");
        assert!(matches!(
            &actions[0],
            Action::Emit { event, .. } if event == local::CHANNEL_LEAVE
        ));
        assert!(matches!(&actions[1], Action::LeaveChannel));

        apply_state_actions(&actions, &mut state);
        assert!(!state.is_joined());
    }

    #[test]
    fn test_application_event_passes_through() {
        let mut state = ConnectionState::new();
        let frame = text_frame(json!({"event": "chat", "data": {"msg": "hi"}}));

        let actions = dispatcher().dispatch(&frame, &mut state).unwrap();

        assert_eq!(actions.len(), 1);
        assert!(matches!(
            &actions[0],
            Action::Emit { event, payload: EventPayload::Json(data) }
                if event == "chat" && data == &json!({"msg": "hi"})
        ));
    }

    #[test]
    fn test_event_without_data_emits_none_payload() {
        let mut state = ConnectionState::new();
        let frame = text_frame(json!({"event": "ping"}));

        let actions = dispatcher().dispatch(&frame, &mut state).unwrap();
        assert!(matches!(
            &actions[0],
            Action::Emit { event, payload: EventPayload::None } if event == "ping"
        ));
    }

    #[test]
    fn test_unknown_control_event_still_forwards() {
        let mut state = ConnectionState::new();
        let frame = text_frame(json!({"event": "__evsock__::mystery", "data": 1}));

        let actions = dispatcher().dispatch(&frame, &mut state).unwrap();
        assert!(matches!(
            &actions[0],
            Action::Emit { event, .. } if event == "__evsock__::mystery"
        ));
    }

    #[test]
    fn test_malformed_text_is_error_and_leaves_state_alone() {
        let mut state = ConnectionState::new();
        state.join_channel("room-1");

        let err = dispatcher()
            .dispatch(&WireFrame::Text("{oops".to_string()), &mut state)
            .unwrap_err();

        assert!(matches!(err, Error::Json(_)));
        assert_eq!(state.channel_name(), "room-1");
        assert_eq!(state.id(), None);
    }

    #[test]
    fn test_binary_frame_emits_event_with_payload_bytes() {
        let mut state = ConnectionState::new();
        let framed = binary::attach(&[9, 9, 9], r#"{"event":"chunk"}"#).unwrap();

        let actions = dispatcher()
            .dispatch(&WireFrame::Binary(framed), &mut state)
            .unwrap();

        assert!(matches!(
            &actions[0],
            Action::Emit { event, payload: EventPayload::Binary(bytes) }
                if event == "chunk" && bytes.as_ref() == [9, 9, 9]
        ));
    }

    #[test]
    fn test_binary_frame_with_control_name_is_not_interpreted() {
        // Control handling is text-plane only; a binary frame whose
        // metadata names a reserved event goes to listeners unchanged.
        let mut state = ConnectionState::new();
        let metadata = format!(r#"{{"event":"{}"}}"#, wire::CHANNEL_JOIN);
        let framed = binary::attach(b"x", &metadata).unwrap();

        let actions = dispatcher()
            .dispatch(&WireFrame::Binary(framed), &mut state)
            .unwrap();

        assert!(!state.is_joined());
        assert!(matches!(
            &actions[0],
            Action::Emit { event, payload: EventPayload::Binary(_) } if event == wire::CHANNEL_JOIN
        ));
    }

    #[test]
    fn test_truncated_binary_frame_is_range_error() {
        let mut state = ConnectionState::new();
        let frame = WireFrame::Binary(Bytes::from_static(&[200, 1, 2]));

        let err = dispatcher().dispatch(&frame, &mut state).unwrap_err();
        assert!(matches!(err, Error::TruncatedFrame { .. }));
    }

    #[test]
    fn test_binary_frame_with_non_envelope_metadata_is_error() {
        let mut state = ConnectionState::new();
        let framed = binary::attach(b"x", "not json").unwrap();

        let err = dispatcher()
            .dispatch(&WireFrame::Binary(framed), &mut state)
            .unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }
}
