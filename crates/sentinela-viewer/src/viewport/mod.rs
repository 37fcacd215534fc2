pub mod fullscreen;
pub mod zoom;

pub use fullscreen::{FullscreenCoordinator, FullscreenEntry};
pub use zoom::{SurfaceKind, ZoomTransform};
