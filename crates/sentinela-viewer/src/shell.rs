use std::{collections::HashMap, sync::Arc, time::Instant};

use chrono::Utc;
use tokio::{sync::mpsc, time::interval};
use tracing::{debug, info, warn};

use sentinela_data::AspectRatio;

use crate::{
    Result,
    config::ViewerConfig,
    context::Context,
    layout::{CameraTile, GridLayout},
    session::{SessionRegistry, SessionSettings, SessionState},
    viewport::{
        fullscreen::{FullscreenCoordinator, FullscreenEntry},
        zoom::{SurfaceKind, ZoomTransform},
    },
};

const COMMAND_CHANNEL_DEPTH: usize = 64;

/// Which rendering surface a pointer or zoom gesture addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoomTarget {
    Cell(String),
    Fullscreen,
}

#[derive(Debug, Clone)]
pub enum ShellCommand {
    Reorder { moved_id: String, target_id: String },
    SetAspect { camera_id: String, aspect: AspectRatio },
    RetryNow { camera_id: String },
    OpenFullscreen { camera_id: String },
    CloseFullscreen,
    Navigate { step: i32 },
    ToggleZoom(ZoomTarget),
    ScrollZoom { target: ZoomTarget, delta_y: f64 },
    Pinch { target: ZoomTarget, distance_delta: f64 },
    BeginDrag { target: ZoomTarget, x: f64, y: f64 },
    Drag { target: ZoomTarget, x: f64, y: f64 },
    EndDrag(ZoomTarget),
    DoubleActivate(ZoomTarget),
    PointerActivity,
    Screenshot { camera_id: String },
}

/// Top of the viewer: owns the grid, the sessions, and the fullscreen stage,
/// and turns UI commands into state changes.
pub struct ViewerShell {
    context: Arc<Context>,
    config: ViewerConfig,
    registry: SessionRegistry,
    layout: GridLayout,
    fullscreen: FullscreenCoordinator,
    cell_zoom: HashMap<String, ZoomTransform>,
    tiles: Vec<CameraTile>,
    commands: mpsc::Receiver<ShellCommand>,
}

impl ViewerShell {
    pub fn new(
        context: Arc<Context>,
        config: ViewerConfig,
        settings: SessionSettings,
    ) -> (Self, mpsc::Sender<ShellCommand>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_DEPTH);
        let shell = Self {
            registry: SessionRegistry::new(context.clone(), settings),
            layout: GridLayout::new(context.clone()),
            fullscreen: FullscreenCoordinator::new(),
            cell_zoom: HashMap::new(),
            tiles: Vec::new(),
            context,
            config,
            commands: command_rx,
        };
        (shell, command_tx)
    }

    pub async fn run(&mut self) -> Result<()> {
        info!("Starting viewer shell");
        let mut refresh = interval(self.config.poll_interval);
        loop {
            tokio::select! {
                _ = refresh.tick() => {
                    // A flaky backend shouldn't kill the viewer; running
                    // sessions keep going until the next successful pass.
                    if let Err(e) = self.refresh().await {
                        warn!(error = %e, "Camera list refresh failed");
                    }
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command).await?,
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                },
            }
        }
        self.registry.shutdown().await;
        Ok(())
    }

    /// One reconcile pass: fetch the camera list, merge the layout, and line
    /// the session registry up with the enabled cameras.
    async fn refresh(&mut self) -> Result<()> {
        let cameras = self.context.directory.list_cameras().await?;
        self.tiles = self.layout.ordered(&cameras).await?;

        for tile in &self.tiles {
            let camera_id = &tile.camera.id;
            if tile.camera.enabled {
                if !self.registry.contains(camera_id) {
                    self.registry.spawn(camera_id).await;
                }
            } else if self.registry.contains(camera_id) {
                self.registry.destroy(camera_id).await;
            }
        }

        // Sessions for cameras the backend no longer knows about.
        for camera_id in self.registry.running_ids() {
            if !self.tiles.iter().any(|tile| tile.camera.id == camera_id) {
                self.registry.destroy(&camera_id).await;
                self.cell_zoom.remove(&camera_id);
            }
        }
        Ok(())
    }

    async fn handle(&mut self, command: ShellCommand) -> Result<()> {
        match command {
            ShellCommand::Reorder { moved_id, target_id } => {
                self.layout.reorder(&moved_id, &target_id).await?;
            }
            ShellCommand::SetAspect { camera_id, aspect } => {
                debug!(camera_id, %aspect, "Aspect changed");
                self.layout.set_aspect(&camera_id, aspect).await?;
            }
            ShellCommand::RetryNow { camera_id } => {
                self.registry.retry_now(&camera_id).await;
            }
            ShellCommand::OpenFullscreen { camera_id } => self.open_fullscreen(&camera_id),
            ShellCommand::CloseFullscreen => self.fullscreen.close(),
            ShellCommand::Navigate { step } => {
                let registry = &self.registry;
                self.fullscreen
                    .navigate(step, |id| registry.surface(id), Instant::now());
            }
            ShellCommand::ToggleZoom(target) => {
                if let Some(zoom) = self.zoom_mut(&target) {
                    zoom.toggle();
                }
            }
            ShellCommand::ScrollZoom { target, delta_y } => {
                if let Some(zoom) = self.zoom_mut(&target) {
                    zoom.scroll_zoom(delta_y);
                }
            }
            ShellCommand::Pinch { target, distance_delta } => {
                if let Some(zoom) = self.zoom_mut(&target) {
                    zoom.pinch(distance_delta);
                }
            }
            ShellCommand::BeginDrag { target, x, y } => {
                if let Some(zoom) = self.zoom_mut(&target) {
                    zoom.begin_drag(x, y);
                }
            }
            ShellCommand::Drag { target, x, y } => {
                if let Some(zoom) = self.zoom_mut(&target) {
                    zoom.drag(x, y);
                }
            }
            ShellCommand::EndDrag(target) => {
                if let Some(zoom) = self.zoom_mut(&target) {
                    zoom.end_drag();
                }
            }
            ShellCommand::DoubleActivate(target) => {
                if let Some(zoom) = self.zoom_mut(&target) {
                    zoom.double_activate();
                }
            }
            ShellCommand::PointerActivity => self.fullscreen.poke(Instant::now()),
            ShellCommand::Screenshot { camera_id } => self.screenshot(&camera_id).await?,
        }
        Ok(())
    }

    fn open_fullscreen(&mut self, camera_id: &str) {
        let snapshot: Vec<FullscreenEntry> = self
            .tiles
            .iter()
            .map(|tile| FullscreenEntry {
                camera_id: tile.camera.id.clone(),
                name: tile.camera.name.clone(),
            })
            .collect();
        // Borrows the running surface; fullscreen never negotiates.
        let surface = self.registry.surface(camera_id);
        self.fullscreen
            .open(camera_id, snapshot, surface, Instant::now());
    }

    async fn screenshot(&self, camera_id: &str) -> Result<()> {
        let surface = self
            .fullscreen
            .surface()
            .filter(|surface| surface.camera_id == camera_id)
            .cloned()
            .or_else(|| self.registry.surface(camera_id));

        let Some(frame) = surface.as_ref().and_then(|surface| surface.capture_frame()) else {
            warn!(camera_id, "No video frame available for screenshot");
            return Ok(());
        };

        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S");
        let path = self
            .config
            .screenshot_dir
            .join(format!("{camera_id}_{timestamp}.png"));
        tokio::fs::create_dir_all(&self.config.screenshot_dir).await?;
        tokio::fs::write(&path, frame).await?;
        info!(camera_id, path = %path.display(), "Screenshot saved");
        Ok(())
    }

    fn zoom_mut(&mut self, target: &ZoomTarget) -> Option<&mut ZoomTransform> {
        match target {
            ZoomTarget::Cell(camera_id) => Some(
                self.cell_zoom
                    .entry(camera_id.clone())
                    .or_insert_with(|| ZoomTransform::new(SurfaceKind::Cell)),
            ),
            ZoomTarget::Fullscreen => self.fullscreen.zoom_mut(),
        }
    }

    pub fn tiles(&self) -> &[CameraTile] {
        &self.tiles
    }

    pub fn session_state(&self, camera_id: &str) -> Option<SessionState> {
        self.registry.state(camera_id)
    }

    pub fn fullscreen(&self) -> &FullscreenCoordinator {
        &self.fullscreen
    }

    pub fn cell_zoom(&self, camera_id: &str) -> Option<&ZoomTransform> {
        self.cell_zoom.get(camera_id)
    }
}
