use std::{collections::HashMap, sync::Arc};

use futures_util::future::join_all;
use tracing::{debug, info};

use super::{CameraSession, SessionHandle, SessionSettings, SessionState, Surface};
use crate::context::Context;

/// Owns every live camera session, keyed by camera id. At most one session
/// exists per camera; spawning again tears the previous one down first.
pub struct SessionRegistry {
    context: Arc<Context>,
    settings: SessionSettings,
    sessions: HashMap<String, SessionHandle>,
}

impl SessionRegistry {
    pub fn new(context: Arc<Context>, settings: SessionSettings) -> Self {
        Self {
            context,
            settings,
            sessions: HashMap::new(),
        }
    }

    pub async fn spawn(&mut self, camera_id: &str) {
        if let Some(previous) = self.sessions.remove(camera_id) {
            debug!(camera_id, "Replacing existing session");
            previous.destroy().await;
        }
        info!(camera_id, "Starting camera session");
        let handle = CameraSession::spawn(self.context.clone(), camera_id, self.settings);
        self.sessions.insert(camera_id.to_string(), handle);
    }

    pub async fn destroy(&mut self, camera_id: &str) {
        if let Some(handle) = self.sessions.remove(camera_id) {
            info!(camera_id, "Stopping camera session");
            handle.destroy().await;
        }
    }

    pub fn contains(&self, camera_id: &str) -> bool {
        self.sessions.contains_key(camera_id)
    }

    pub fn get(&self, camera_id: &str) -> Option<&SessionHandle> {
        self.sessions.get(camera_id)
    }

    pub fn surface(&self, camera_id: &str) -> Option<Surface> {
        self.sessions.get(camera_id).and_then(SessionHandle::surface)
    }

    pub fn state(&self, camera_id: &str) -> Option<SessionState> {
        self.sessions.get(camera_id).map(SessionHandle::state)
    }

    pub fn running_ids(&self) -> Vec<String> {
        self.sessions.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub async fn retry_now(&self, camera_id: &str) {
        if let Some(handle) = self.sessions.get(camera_id) {
            handle.retry_now().await;
        }
    }

    pub async fn shutdown(&mut self) {
        let teardowns: Vec<_> = self
            .sessions
            .drain()
            .map(|(_, handle)| handle.destroy())
            .collect();
        join_all(teardowns).await;
    }
}
