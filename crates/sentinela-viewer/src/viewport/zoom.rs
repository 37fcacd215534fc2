const MIN_SCALE: f64 = 1.0;
const CELL_ZOOM_STEP: f64 = 0.2;
const CELL_MAX_SCALE: f64 = 5.0;
const FULLSCREEN_ZOOM_STEP: f64 = 0.25;
const FULLSCREEN_MAX_SCALE: f64 = 8.0;
const PINCH_SENSITIVITY: f64 = 0.01;

/// Grid cells and the fullscreen stage zoom with different steps and limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Cell,
    Fullscreen,
}

impl SurfaceKind {
    fn zoom_step(self) -> f64 {
        match self {
            Self::Cell => CELL_ZOOM_STEP,
            Self::Fullscreen => FULLSCREEN_ZOOM_STEP,
        }
    }

    fn max_scale(self) -> f64 {
        match self {
            Self::Cell => CELL_MAX_SCALE,
            Self::Fullscreen => FULLSCREEN_MAX_SCALE,
        }
    }
}

/// Scale and pan state for one rendering surface.
///
/// Invariant: whenever `scale` is at the identity, pan is `(0, 0)` and no
/// drag can alter it.
#[derive(Debug, Clone)]
pub struct ZoomTransform {
    kind: SurfaceKind,
    scale: f64,
    pan_x: f64,
    pan_y: f64,
    active: bool,
    dragging: bool,
    last_x: f64,
    last_y: f64,
}

impl ZoomTransform {
    pub fn new(kind: SurfaceKind) -> Self {
        Self {
            kind,
            scale: MIN_SCALE,
            pan_x: 0.0,
            pan_y: 0.0,
            active: false,
            dragging: false,
            last_x: 0.0,
            last_y: 0.0,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn pan(&self) -> (f64, f64) {
        (self.pan_x, self.pan_y)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Flips zoom mode on or off; leaving zoom mode discards the transform.
    pub fn toggle(&mut self) -> bool {
        self.active = !self.active;
        if !self.active {
            self.reset();
        }
        self.active
    }

    pub fn reset(&mut self) {
        self.scale = MIN_SCALE;
        self.pan_x = 0.0;
        self.pan_y = 0.0;
        self.dragging = false;
    }

    /// Wheel input: scrolling up (negative delta) zooms in.
    pub fn scroll_zoom(&mut self, delta_y: f64) {
        if !self.active {
            return;
        }
        let step = if delta_y > 0.0 {
            -self.kind.zoom_step()
        } else {
            self.kind.zoom_step()
        };
        self.apply_scale(self.scale + step);
    }

    /// Two-finger pinch, driven by the change in finger distance.
    pub fn pinch(&mut self, distance_delta: f64) {
        if !self.active {
            return;
        }
        self.apply_scale(self.scale + distance_delta * PINCH_SENSITIVITY);
    }

    pub fn begin_drag(&mut self, x: f64, y: f64) {
        if !self.active || self.scale <= MIN_SCALE {
            return;
        }
        self.dragging = true;
        self.last_x = x;
        self.last_y = y;
    }

    pub fn drag(&mut self, x: f64, y: f64) {
        if !self.dragging || self.scale <= MIN_SCALE {
            return;
        }
        // Divide by scale so panning feels the same at every zoom level.
        self.pan_x += (x - self.last_x) / self.scale;
        self.pan_y += (y - self.last_y) / self.scale;
        self.last_x = x;
        self.last_y = y;
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    /// Double-click/double-tap: back to identity, zoom mode stays on.
    pub fn double_activate(&mut self) {
        self.reset();
    }

    fn apply_scale(&mut self, scale: f64) {
        self.scale = scale.clamp(MIN_SCALE, self.kind.max_scale());
        if self.scale <= MIN_SCALE {
            self.pan_x = 0.0;
            self.pan_y = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_cell() -> ZoomTransform {
        let mut zoom = ZoomTransform::new(SurfaceKind::Cell);
        zoom.toggle();
        zoom
    }

    #[test]
    fn inactive_transform_ignores_input() {
        let mut zoom = ZoomTransform::new(SurfaceKind::Cell);
        zoom.scroll_zoom(-1.0);
        zoom.pinch(100.0);
        zoom.begin_drag(10.0, 10.0);
        zoom.drag(50.0, 50.0);

        assert_eq!(zoom.scale(), 1.0);
        assert_eq!(zoom.pan(), (0.0, 0.0));
        assert!(!zoom.is_dragging());
    }

    #[test]
    fn scroll_steps_differ_per_surface_kind() {
        let mut cell = active_cell();
        cell.scroll_zoom(-1.0);
        assert!((cell.scale() - 1.2).abs() < 1e-9);

        let mut fullscreen = ZoomTransform::new(SurfaceKind::Fullscreen);
        fullscreen.toggle();
        fullscreen.scroll_zoom(-1.0);
        assert!((fullscreen.scale() - 1.25).abs() < 1e-9);
    }

    #[test]
    fn scale_clamps_to_surface_limits() {
        let mut cell = active_cell();
        for _ in 0..100 {
            cell.scroll_zoom(-1.0);
        }
        assert_eq!(cell.scale(), 5.0);

        let mut fullscreen = ZoomTransform::new(SurfaceKind::Fullscreen);
        fullscreen.toggle();
        for _ in 0..100 {
            fullscreen.scroll_zoom(-1.0);
        }
        assert_eq!(fullscreen.scale(), 8.0);

        for _ in 0..100 {
            fullscreen.scroll_zoom(1.0);
        }
        assert_eq!(fullscreen.scale(), 1.0);
    }

    #[test]
    fn zooming_back_to_identity_recenters_pan() {
        let mut zoom = active_cell();
        zoom.scroll_zoom(-1.0);
        zoom.begin_drag(0.0, 0.0);
        zoom.drag(60.0, 36.0);
        assert_ne!(zoom.pan(), (0.0, 0.0));

        for _ in 0..10 {
            zoom.scroll_zoom(1.0);
        }
        assert_eq!(zoom.scale(), 1.0);
        assert_eq!(zoom.pan(), (0.0, 0.0));
    }

    #[test]
    fn drag_requires_zoomed_in_surface() {
        let mut zoom = active_cell();
        zoom.begin_drag(0.0, 0.0);
        assert!(!zoom.is_dragging());

        zoom.scroll_zoom(-1.0);
        zoom.begin_drag(0.0, 0.0);
        assert!(zoom.is_dragging());
        zoom.drag(12.0, 12.0);
        let (px, py) = zoom.pan();
        assert!((px - 10.0).abs() < 1e-9);
        assert!((py - 10.0).abs() < 1e-9);

        zoom.end_drag();
        zoom.drag(100.0, 100.0);
        assert_eq!(zoom.pan(), (px, py));
    }

    #[test]
    fn pinch_scales_with_distance_delta() {
        let mut zoom = active_cell();
        zoom.pinch(50.0);
        assert!((zoom.scale() - 1.5).abs() < 1e-9);
        zoom.pinch(-50.0);
        assert_eq!(zoom.scale(), 1.0);
    }

    #[test]
    fn toggle_off_discards_transform() {
        let mut zoom = active_cell();
        zoom.scroll_zoom(-1.0);
        zoom.begin_drag(0.0, 0.0);
        zoom.drag(30.0, 30.0);

        assert!(!zoom.toggle());
        assert_eq!(zoom.scale(), 1.0);
        assert_eq!(zoom.pan(), (0.0, 0.0));
        assert!(!zoom.is_dragging());
    }

    #[test]
    fn double_activate_resets_but_stays_active() {
        let mut zoom = active_cell();
        zoom.scroll_zoom(-1.0);
        zoom.double_activate();
        assert!(zoom.is_active());
        assert_eq!(zoom.scale(), 1.0);
    }
}
