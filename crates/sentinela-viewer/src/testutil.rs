use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::mpsc;

use sentinela_client::{
    CameraDirectory, Signalling,
    error::{Error as ClientError, Result as ClientResult},
    models::{Camera, CameraStatus},
};
use sentinela_data::Store;

use crate::{
    Result,
    context::Context,
    media::{MediaSession, MediaStack, MediaStream, StreamHandle, TransportEvent},
};

pub fn camera(id: &str, enabled: bool) -> Camera {
    Camera {
        id: id.to_string(),
        name: format!("Camera {id}"),
        enabled,
        status: CameraStatus::Online,
    }
}

pub struct FakeDirectory {
    pub cameras: Mutex<Vec<Camera>>,
}

impl FakeDirectory {
    pub fn with(cameras: Vec<Camera>) -> Arc<Self> {
        Arc::new(Self {
            cameras: Mutex::new(cameras),
        })
    }

    pub fn set(&self, cameras: Vec<Camera>) {
        *self.cameras.lock().unwrap() = cameras;
    }
}

pub fn empty_directory() -> Arc<FakeDirectory> {
    FakeDirectory::with(Vec::new())
}

#[async_trait]
impl CameraDirectory for FakeDirectory {
    async fn list_cameras(&self) -> ClientResult<Vec<Camera>> {
        Ok(self.cameras.lock().unwrap().clone())
    }
}

enum SignalScript {
    AlwaysOk,
    AlwaysStatus(u16),
    FailNThenOk { failures: usize, status: u16 },
    NeverResolves,
}

pub struct FakeSignalling {
    calls: AtomicUsize,
    script: SignalScript,
}

impl FakeSignalling {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: SignalScript::AlwaysOk,
        })
    }

    pub fn status(status: u16) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: SignalScript::AlwaysStatus(status),
        })
    }

    pub fn fail_n_then_ok(failures: usize, status: u16) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: SignalScript::FailNThenOk { failures, status },
        })
    }

    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: SignalScript::NeverResolves,
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Signalling for FakeSignalling {
    async fn negotiate(&self, _camera_id: &str, _offer: &str) -> ClientResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            SignalScript::AlwaysOk => Ok("v=0 answer".to_string()),
            SignalScript::AlwaysStatus(status) => Err(ClientError::Signalling { status: *status }),
            SignalScript::FailNThenOk { failures, status } => {
                if call < *failures {
                    Err(ClientError::Signalling { status: *status })
                } else {
                    Ok("v=0 answer".to_string())
                }
            }
            SignalScript::NeverResolves => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

/// In-memory media stack. Each `open` hands the caller a session whose events
/// the test can feed through [`FakeMediaStack::emit`].
pub struct FakeMediaStack {
    taps: Mutex<Vec<mpsc::Sender<TransportEvent>>>,
    opened: AtomicUsize,
}

impl FakeMediaStack {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            taps: Mutex::new(Vec::new()),
            opened: AtomicUsize::new(0),
        })
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Sends an event into the most recently opened session.
    pub async fn emit(&self, event: TransportEvent) {
        let tap = self.taps.lock().unwrap().last().cloned();
        if let Some(tap) = tap {
            let _ = tap.send(event).await;
        }
    }
}

#[async_trait]
impl MediaStack for FakeMediaStack {
    async fn open(&self, camera_id: &str) -> Result<Box<dyn MediaSession>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let (tap, events) = mpsc::channel(16);
        self.taps.lock().unwrap().push(tap);
        Ok(Box::new(FakeMediaSession {
            camera_id: camera_id.to_string(),
            events: Some(events),
        }))
    }
}

struct FakeMediaSession {
    camera_id: String,
    events: Option<mpsc::Receiver<TransportEvent>>,
}

#[async_trait]
impl MediaSession for FakeMediaSession {
    async fn create_offer(&mut self, _gather_timeout: Duration) -> Result<String> {
        Ok(format!("v=0 offer {}", self.camera_id))
    }

    async fn apply_answer(&mut self, _answer: &str) -> Result<()> {
        Ok(())
    }

    fn take_events(&mut self) -> Option<mpsc::Receiver<TransportEvent>> {
        self.events.take()
    }

    async fn close(&mut self) {}
}

struct FakeStream {
    id: String,
}

impl MediaStream for FakeStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn capture_frame(&self) -> Option<Vec<u8>> {
        // PNG magic, enough for a screenshot test to write a file.
        Some(vec![0x89, b'P', b'N', b'G'])
    }
}

pub fn stream(id: &str) -> StreamHandle {
    Arc::new(FakeStream { id: id.to_string() })
}

pub async fn test_context(
    directory: Arc<FakeDirectory>,
    signalling: Arc<FakeSignalling>,
    media: Arc<FakeMediaStack>,
) -> (Arc<Context>, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let store = Store::new(&dir.path().join("layout.db"))
        .await
        .expect("layout store");
    let context = Arc::new(Context {
        directory,
        signalling,
        media,
        store,
    });
    (context, dir)
}
