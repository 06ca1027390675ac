//! Gateway data model.
//!
//! - [`common`]: entities shared by events and command results
//! - [`event`]: the built-in event shapes and [`default_event_registry`]
//! - [`command`]: the catalogue of command endpoints
//! - [`api`]: request and response bodies for the typed command wrappers

pub mod api;
pub mod command;
pub mod common;
pub mod event;

pub use api::{Empty, HttpResult};
pub use command::{Command, CommandGroup};
pub use common::{
    FriendCategory, FriendEntity, GroupEntity, GroupMemberEntity, IncomingMessage, MessageScene,
    Segment, plain_text,
};
pub use event::default_event_registry;
