pub mod config;
pub mod context;
pub mod layout;
pub mod logging;
pub mod media;
pub mod retry;
pub mod session;
pub mod shell;
pub mod viewport;

mod error;
#[cfg(test)]
pub(crate) mod testutil;

pub use error::{Error, Result};
