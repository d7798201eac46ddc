//! Power levels for declaratively authored game abilities.
//!
//! Each property of an ability resolves to a signed modifier through a
//! [`ModifierTable`]; the level is their sum. Nested sub-effects and attack
//! branches are evaluated recursively, and authoring invariants are checked
//! before any level is computed.

pub mod ability;
pub mod cli;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod parallel;
pub mod report;

pub use data::{AbilityCatalog, ModifierTable};
pub use engine::{evaluate, explain, EngineSettings, Evaluation, Explanation};
pub use error::{ConfigurationError, EvaluationError, ValidationError};
