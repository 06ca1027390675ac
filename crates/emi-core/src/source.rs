//! The event source seam.
//!
//! The dispatcher only needs something that can be opened into a stream of
//! [`RawEvent`]s and closed again. The WebSocket `StreamConnection` in
//! `emi-transport` is the production implementation; tests feed the
//! dispatcher from an in-memory channel instead.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::TransportResult;
use crate::event::RawEvent;

/// A producer of raw gateway events.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Opens the source and returns the receiving end of its event channel.
    ///
    /// Fails with [`TransportError::AlreadyConnected`](crate::TransportError::AlreadyConnected)
    /// if the source is already open. The channel closes when the source does.
    async fn open(&self) -> TransportResult<mpsc::Receiver<RawEvent>>;

    /// Closes the source. Closing a closed source is a no-op.
    async fn close(&self) -> TransportResult<()>;

    /// Resolves once the current (or most recent) connection has ended.
    ///
    /// Returns immediately if the source was never opened.
    async fn wait(&self);
}

#[async_trait]
impl<S: EventSource + ?Sized> EventSource for std::sync::Arc<S> {
    async fn open(&self) -> TransportResult<mpsc::Receiver<RawEvent>> {
        (**self).open().await
    }

    async fn close(&self) -> TransportResult<()> {
        (**self).close().await
    }

    async fn wait(&self) {
        (**self).wait().await
    }
}
