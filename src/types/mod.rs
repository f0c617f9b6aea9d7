mod models;
pub mod payload;

pub use models::*;
pub use payload::{BaseEntry, ColorantEntry};
