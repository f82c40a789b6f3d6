pub mod credentials;
pub mod metadata;

mod error;

pub use error::{Error, Result};
