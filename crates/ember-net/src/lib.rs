//! Typed envelopes between the authoritative host and client sessions.
//!
//! Three addressing modes, one enum each:
//! - [`ClientRequest`]: owning session → host.
//! - [`HostNotice`]: host → one owning session.
//! - [`Broadcast`]: host → every session.
//!
//! Messages travel as `[version: u8] [postcard body]`. The
//! [`LoopbackNetwork`] moves encoded messages between in-process sessions
//! over `crossbeam-channel` with a fixed delivery delay in ticks.

mod messages;
mod transport;

pub use messages::{
    Broadcast, ClientRequest, HostNotice, Message, PROTOCOL_VERSION, PathPayload, RejectReason,
    ReplicationPayload, WireError, decode_message, encode_message,
};
pub use transport::{ClientEndpoint, HostEndpoint, LoopbackNetwork, TransportError};
