//! HTTP command transport.
//!
//! This module provides the command client and its typed wrappers.

mod api;
mod client;

pub use client::CommandClient;
