//! Types shared by the Keepsake feature crates

mod error;

pub use error::{ErrorBody, ErrorDetails, HttpError};
