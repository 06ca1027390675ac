//! WebSocket event stream.
//!
//! This module provides the persistent connection that receives gateway
//! events and the frame codec it uses.

pub mod codec;
mod connection;

pub use codec::decode_frame;
pub use connection::StreamConnection;
