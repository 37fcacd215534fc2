use std::time::{Duration, Instant};

use tracing::debug;

use super::zoom::{SurfaceKind, ZoomTransform};
use crate::session::Surface;

/// Header and controls hide after this long without pointer activity.
pub const CHROME_HIDE_AFTER: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullscreenEntry {
    pub camera_id: String,
    pub name: String,
}

struct FullscreenView {
    /// Ordering snapshot taken when fullscreen opened; later grid reorders
    /// do not affect navigation.
    cameras: Vec<FullscreenEntry>,
    index: usize,
    surface: Option<Surface>,
    zoom: ZoomTransform,
    chrome_deadline: Instant,
}

/// Single-camera takeover of the viewport. Borrows the live surface from the
/// session layer; opening or navigating never triggers a new negotiation.
#[derive(Default)]
pub struct FullscreenCoordinator {
    view: Option<FullscreenView>,
}

impl FullscreenCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.view.is_some()
    }

    pub fn open(
        &mut self,
        camera_id: &str,
        snapshot: Vec<FullscreenEntry>,
        surface: Option<Surface>,
        now: Instant,
    ) {
        let index = snapshot
            .iter()
            .position(|entry| entry.camera_id == camera_id)
            .unwrap_or(0);
        debug!(camera_id, cameras = snapshot.len(), "Entering fullscreen");
        self.view = Some(FullscreenView {
            cameras: snapshot,
            index,
            surface,
            zoom: ZoomTransform::new(SurfaceKind::Fullscreen),
            chrome_deadline: now + CHROME_HIDE_AFTER,
        });
    }

    /// Steps through the snapshot with wraparound. `lookup` re-borrows the
    /// target camera's current surface. No-op with fewer than two cameras.
    pub fn navigate<F>(&mut self, step: i32, lookup: F, now: Instant)
    where
        F: FnOnce(&str) -> Option<Surface>,
    {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        if view.cameras.len() <= 1 {
            return;
        }

        let len = view.cameras.len() as i64;
        view.index = (view.index as i64 + i64::from(step)).rem_euclid(len) as usize;
        let entry = &view.cameras[view.index];
        debug!(camera_id = %entry.camera_id, "Fullscreen navigate");

        view.surface = lookup(&entry.camera_id);
        view.zoom = ZoomTransform::new(SurfaceKind::Fullscreen);
        view.chrome_deadline = now + CHROME_HIDE_AFTER;
    }

    /// Leaves fullscreen. The underlying session keeps streaming; only the
    /// borrowed surface handle is dropped.
    pub fn close(&mut self) {
        if self.view.take().is_some() {
            debug!("Leaving fullscreen");
        }
    }

    /// Pointer activity: keeps the chrome visible a while longer.
    pub fn poke(&mut self, now: Instant) {
        if let Some(view) = self.view.as_mut() {
            view.chrome_deadline = now + CHROME_HIDE_AFTER;
        }
    }

    pub fn chrome_visible(&self, now: Instant) -> bool {
        self.view
            .as_ref()
            .is_some_and(|view| now < view.chrome_deadline)
    }

    pub fn current(&self) -> Option<&FullscreenEntry> {
        let view = self.view.as_ref()?;
        view.cameras.get(view.index)
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.view.as_ref()?.surface.as_ref()
    }

    pub fn zoom(&self) -> Option<&ZoomTransform> {
        self.view.as_ref().map(|view| &view.zoom)
    }

    pub fn zoom_mut(&mut self) -> Option<&mut ZoomTransform> {
        self.view.as_mut().map(|view| &mut view.zoom)
    }
}
