use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Backend client error: {0}")]
    Client(#[from] sentinela_client::error::Error),

    #[error("Layout store error: {0}")]
    Store(#[from] sentinela_data::error::Error),

    #[error("Media stack error: {0}")]
    Media(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("General error: {0}")]
    General(String),
}
