use std::sync::Arc;

use sentinela_client::{CameraDirectory, NvrClient, Signalling};
use sentinela_data::Store;

use crate::{Result, config::Config, media::MediaStack};

/// Shared handles every task hangs off of.
pub struct Context {
    pub directory: Arc<dyn CameraDirectory>,
    pub signalling: Arc<dyn Signalling>,
    pub media: Arc<dyn MediaStack>,
    pub store: Store,
}

impl Context {
    pub async fn new(config: &Config, media: Arc<dyn MediaStack>) -> Result<Self> {
        let client = Arc::new(NvrClient::new(config.nvr.clone())?);
        let store = Store::new(&config.store.path).await?;

        Ok(Self {
            directory: client.clone(),
            signalling: client,
            media,
            store,
        })
    }
}
