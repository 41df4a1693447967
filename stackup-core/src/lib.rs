pub mod error;
pub mod models;

pub use error::{Result, StackupError};
pub use models::*;
