//! `bidserve-engine`: bid decision engine contracts and the built-in
//! heuristic backend.
//!
//! | Contract | Implementation |
//! |----------|----------------|
//! | [`EngineBuilder`] | [`heuristic::HeuristicBuilder`] |
//! | [`DecisionEngine`] | [`heuristic::HeuristicEngine`] |
//! | [`DecisionSession`] | one heuristic session per request |
//!
//! The service shell only ever talks to the traits; any other engine (for
//! example a neural bidder behind FFI) slots in by implementing them.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use bidserve_engine::{
//!     DecisionEngine, DecisionSession, EngineBuilder, HeuristicBuilder, SessionParams,
//!     Vulnerability,
//! };
//! use std::path::Path;
//!
//! let root = Path::new("./engine");
//! let builder = HeuristicBuilder;
//! let settings = builder.parse_settings(&root.join("config/default.conf")).unwrap();
//! let engine = builder.build(&settings, root, &["consult_bba"]).unwrap();
//!
//! let mut session = engine
//!     .open_session(SessionParams {
//!         vulnerability: Vulnerability::default(),
//!         hand: "6.AKJT82.762.K63".into(),
//!         seat: 2,
//!         dealer: 0,
//!         aux_integration: false,
//!         disabled_features: vec![],
//!         verbose: false,
//!     })
//!     .unwrap();
//! let batch = session.bid_candidates(&["1D".into(), "3S".into()]).unwrap();
//! println!("{:?}", batch.candidates.first());
//! ```

pub mod auction;
pub mod error;
pub mod hand;
pub mod heuristic;
pub mod models;
pub mod sampler;
pub mod session;
pub mod settings;

pub use error::{EngineError, EngineResult};
pub use heuristic::{HeuristicBuilder, HeuristicEngine};
pub use session::{
    CandidateBatch, DecisionEngine, DecisionSession, EngineBuilder, RawCandidate, SessionParams,
    Vulnerability,
};
pub use settings::EngineSettings;
