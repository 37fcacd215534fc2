use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraStatus {
    Offline,
    Online,
    Recording,
    Error,
}

/// One camera record as reported by the backend. The backend owns the
/// lifecycle; the viewer only reads snapshots on each list refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    pub id: String,
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_status")]
    pub status: CameraStatus,
}

fn default_enabled() -> bool {
    true
}

fn default_status() -> CameraStatus {
    CameraStatus::Offline
}

impl Camera {
    pub fn is_streamable(&self) -> bool {
        self.enabled
    }
}
