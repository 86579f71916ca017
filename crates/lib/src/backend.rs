//! Host store interface: where events, statuses, and channel logs end up.
//!
//! The persistent store lives outside this crate; [`MemoryBackend`] keeps everything in
//! process for the gateway binary and for tests.

use crate::channels::{ChannelLog, Event, MsgStatus};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Backend: Send + Sync {
    async fn write_event(&self, event: &Event) -> Result<(), BackendError>;
    async fn write_status(&self, status: &MsgStatus) -> Result<(), BackendError>;
    async fn write_channel_log(&self, log: &ChannelLog) -> Result<(), BackendError>;
}

#[derive(Default)]
struct Written {
    events: Vec<Event>,
    statuses: Vec<MsgStatus>,
    logs: Vec<ChannelLog>,
}

/// In-memory backend (append only).
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<RwLock<Written>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<Event> {
        self.inner.read().await.events.clone()
    }

    pub async fn statuses(&self) -> Vec<MsgStatus> {
        self.inner.read().await.statuses.clone()
    }

    pub async fn logs(&self) -> Vec<ChannelLog> {
        self.inner.read().await.logs.clone()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn write_event(&self, event: &Event) -> Result<(), BackendError> {
        self.inner.write().await.events.push(event.clone());
        Ok(())
    }

    async fn write_status(&self, status: &MsgStatus) -> Result<(), BackendError> {
        self.inner.write().await.statuses.push(status.clone());
        Ok(())
    }

    async fn write_channel_log(&self, log: &ChannelLog) -> Result<(), BackendError> {
        self.inner.write().await.logs.push(log.clone());
        Ok(())
    }
}
