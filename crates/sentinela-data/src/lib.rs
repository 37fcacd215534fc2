use std::{collections::HashMap, fmt, path::Path};

use serde::{Deserialize, Serialize};
use sqlx::{SqlitePool, migrate::MigrateDatabase, sqlite::SqlitePoolOptions};
use tracing::warn;

pub mod error;

use crate::error::Result;

const ORDER_KEY: &str = "camera-order";
const PREFS_KEY: &str = "camera-prefs";

/// Display aspect ratio for one camera tile. A rendering hint only; changing
/// it never touches the media session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    SixteenNine,
    #[serde(rename = "4:3")]
    FourThree,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "9:16")]
    NineSixteen,
    #[serde(rename = "auto")]
    Auto,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::SixteenNine,
        AspectRatio::FourThree,
        AspectRatio::Square,
        AspectRatio::NineSixteen,
        AspectRatio::Auto,
    ];
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AspectRatio::SixteenNine => "16:9",
            AspectRatio::FourThree => "4:3",
            AspectRatio::Square => "1:1",
            AspectRatio::NineSixteen => "9:16",
            AspectRatio::Auto => "auto",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraPrefs {
    #[serde(default)]
    pub aspect: AspectRatio,
}

/// Durable key/value store for viewer layout state. Both values are opaque
/// JSON blobs as far as the backend is concerned and never sync server-side.
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn new(db_path: &Path) -> Result<Self> {
        if !sqlx::Sqlite::database_exists(&db_path.to_string_lossy()).await? {
            sqlx::Sqlite::create_database(&db_path.to_string_lossy()).await?;
        }

        let database_url = format!("sqlite:{}", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Store { pool })
    }

    /// Persisted camera ordering. Malformed or missing content reads as empty
    /// rather than failing; the viewer falls back to backend order.
    pub async fn camera_order(&self) -> Result<Vec<String>> {
        let Some(raw) = self.read_value(ORDER_KEY).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(order) => Ok(order),
            Err(e) => {
                warn!(error = %e, "Persisted camera order is malformed, ignoring it");
                Ok(Vec::new())
            }
        }
    }

    pub async fn set_camera_order(&self, order: &[String]) -> Result<()> {
        let blob = serde_json::to_string(order)?;
        self.write_value(ORDER_KEY, &blob).await
    }

    pub async fn camera_prefs(&self) -> Result<HashMap<String, CameraPrefs>> {
        let Some(raw) = self.read_value(PREFS_KEY).await? else {
            return Ok(HashMap::new());
        };

        match serde_json::from_str(&raw) {
            Ok(prefs) => Ok(prefs),
            Err(e) => {
                warn!(error = %e, "Persisted camera prefs are malformed, ignoring them");
                Ok(HashMap::new())
            }
        }
    }

    /// Read-modify-write of one camera's prefs inside a transaction so a
    /// concurrent write from the same client cannot interleave.
    pub async fn set_camera_aspect(&self, camera_id: &str, aspect: AspectRatio) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let raw: Option<String> = sqlx::query_scalar("SELECT value FROM layout WHERE key = ?")
            .bind(PREFS_KEY)
            .fetch_optional(&mut *tx)
            .await?;

        let mut prefs: HashMap<String, CameraPrefs> = raw
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();

        prefs.entry(camera_id.to_string()).or_default().aspect = aspect;

        let blob = serde_json::to_string(&prefs)?;
        sqlx::query(
            "INSERT INTO layout (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(PREFS_KEY)
        .bind(blob)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn read_value(&self, key: &str) -> Result<Option<String>> {
        let value = sqlx::query_scalar("SELECT value FROM layout WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn write_value(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO layout (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
