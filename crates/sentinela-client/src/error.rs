use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Signalling endpoint returned status {status}")]
    Signalling { status: u16 },

    #[error("API error: {0}")]
    Api(String),

    #[error("General error: {0}")]
    General(String),
}

impl Error {
    /// Status code of a rejected signalling exchange, if that is what this is.
    pub fn signalling_status(&self) -> Option<u16> {
        match self {
            Error::Signalling { status } => Some(*status),
            _ => None,
        }
    }
}
