use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

pub mod config;
pub mod error;
pub mod models;

use crate::{
    config::NvrConfig,
    error::{Error, Result},
    models::Camera,
};

/// Read-only view of the backend's camera inventory.
#[async_trait]
pub trait CameraDirectory: Send + Sync {
    async fn list_cameras(&self) -> Result<Vec<Camera>>;
}

/// WHEP-style signalling: POST an SDP offer for a camera, get the answer back.
/// Non-2xx responses surface as [`Error::Signalling`] so callers can classify
/// them for retry purposes.
#[async_trait]
pub trait Signalling: Send + Sync {
    async fn negotiate(&self, camera_id: &str, offer: &str) -> Result<String>;
}

/// A stalled backend must never park a request forever.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct NvrClient {
    client: Client,
    base_url: Url,
}

impl NvrClient {
    pub fn new(config: NvrConfig) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(!config.verify_ssl)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let scheme = if config.tls { "https" } else { "http" };
        let base_url = Url::parse(&format!("{scheme}://{}:{}", config.address, config.port))
            .map_err(|e| Error::General(format!("Invalid URL: {e}")))?;

        Ok(NvrClient { client, base_url })
    }
}

#[async_trait]
impl CameraDirectory for NvrClient {
    async fn list_cameras(&self) -> Result<Vec<Camera>> {
        let list_url = self
            .base_url
            .join("/api/cameras")
            .map_err(|e| Error::General(format!("Invalid URL: {e}")))?;

        let response = self.client.get(list_url).send().await?;

        if !response.status().is_success() {
            return Err(Error::Api(format!(
                "Camera list request failed: {}",
                response.status()
            )));
        }

        let cameras: Vec<Camera> = response.json().await?;
        Ok(cameras)
    }
}

#[async_trait]
impl Signalling for NvrClient {
    async fn negotiate(&self, camera_id: &str, offer: &str) -> Result<String> {
        let whep_url = self
            .base_url
            .join(&format!("/api/whep/{camera_id}"))
            .map_err(|e| Error::General(format!("Invalid URL: {e}")))?;

        debug!(camera_id, "Sending WHEP offer");

        let response = self
            .client
            .post(whep_url)
            .header("Content-Type", "application/sdp")
            .body(offer.to_string())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Signalling {
                status: status.as_u16(),
            });
        }

        let answer = response.text().await?;
        debug!(camera_id, "Received WHEP answer");
        Ok(answer)
    }
}
