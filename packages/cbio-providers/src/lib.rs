pub mod upload;

mod error;

pub use error::{Error, Result};
pub use reqwest::Body;
