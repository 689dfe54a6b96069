//! `bidserve-gateway`: HTTP service shell around a bid decision engine.
//!
//! | Stage | Module |
//! |-------|--------|
//! | Load the engine once, in the background | [`loader`] |
//! | Gate traffic until it is loaded | [`readiness`] |
//! | Validate inbound requests | [`translator`] |
//! | One engine session per request | [`adapter`] |
//! | Stable response contract | [`shaper`] |
//! | Routes and probes | [`handlers`], [`server`] |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use bidserve_engine::HeuristicBuilder;
//! use bidserve_gateway::{config::ServiceConfig, server::BidServer};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServiceConfig::load().unwrap();
//!     let server = BidServer::new(config, Arc::new(HeuristicBuilder));
//!     server.start().await.unwrap();
//! }
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod handlers;
pub mod loader;
pub mod readiness;
pub mod server;
pub mod shaper;
pub mod state;
pub mod translator;

pub use error::{LoadError, ServeError, ServiceError, ValidationError};
pub use readiness::{ReadinessGate, ServiceReadiness};
pub use server::{BidServer, build_router};
