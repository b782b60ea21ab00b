//! # evsock-client
//!
//! Rust client for the EvSocket protocol: application-level named
//! events multiplexed over a single WebSocket connection, with JSON
//! text envelopes, metadata-prefixed binary frames, and lightweight
//! channel grouping (join/leave/broadcast).
//!
//! ## Architecture
//!
//! - **Text plane**: JSON `{event, data}` envelopes
//! - **Binary plane**: frames carrying a UTF-16 metadata string ahead
//!   of an opaque payload
//! - **Control plane**: reserved `__evsock__::`-prefixed events drive
//!   id assignment, the authentication round-trip, and channel
//!   membership
//!
//! ## Example
//!
//! ```ignore
//! use evsock_client::{callback, ConnectOptions, EvSocket};
//!
//! #[tokio::main]
//! async fn main() -> evsock_client::Result<()> {
//!     let socket = EvSocket::connect("ws://localhost:8080", ConnectOptions::new()).await?;
//!
//!     socket.on("open", callback(|_| println!("ready")));
//!     socket.send("greet", &"hello")?;
//!     socket.send_binary("chunk", &[1, 2, 3])?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod control;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod protocol;
pub mod transport;

mod connection;

pub use connection::{ConnectOptions, EvSocket};
pub use error::{Error, Result};
pub use events::{callback, Callback, EventPayload, ListenerId};
