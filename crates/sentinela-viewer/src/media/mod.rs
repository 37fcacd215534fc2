use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::Result;

pub mod webrtc;

/// One inbound stream of a single kind, ready to hand to a renderer.
pub trait MediaStream: Send + Sync {
    fn id(&self) -> &str;

    /// Latest decoded video frame, PNG-encoded, if one has arrived yet.
    fn capture_frame(&self) -> Option<Vec<u8>>;
}

pub type StreamHandle = Arc<dyn MediaStream>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Video,
    Audio,
}

#[derive(Clone)]
pub enum TransportEvent {
    /// A remote track arrived on the transport.
    Track { kind: TrackKind, stream: StreamHandle },
    /// Media packets are flowing for this session.
    FrameFlowing,
    /// The transport dropped out from under a connected session.
    ConnectivityLost,
}

/// Factory for per-camera media transports. The session layer only ever
/// talks to this seam, so tests can swap in an in-memory stack.
#[async_trait]
pub trait MediaStack: Send + Sync {
    async fn open(&self, camera_id: &str) -> Result<Box<dyn MediaSession>>;
}

#[async_trait]
pub trait MediaSession: Send {
    /// Produces the local SDP offer, waiting at most `gather_timeout` for
    /// candidate gathering before sending whatever has been collected.
    async fn create_offer(&mut self, gather_timeout: Duration) -> Result<String>;

    async fn apply_answer(&mut self, answer: &str) -> Result<()>;

    /// Hands out the event channel. Yields once; `None` on later calls.
    fn take_events(&mut self) -> Option<mpsc::Receiver<TransportEvent>>;

    /// Tears the transport down. Safe to call more than once.
    async fn close(&mut self);
}
