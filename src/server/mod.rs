pub mod dto;
mod extract;
mod formulas;
mod pages;
pub mod response;
mod router;
pub mod validation;
mod views;

pub use router::{AppState, create_router};
