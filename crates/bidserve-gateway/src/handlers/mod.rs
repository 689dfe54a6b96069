//! Request handlers for the bid service

pub mod health;
pub mod suggest;

pub use health::health_router;
pub use suggest::suggest_router;
