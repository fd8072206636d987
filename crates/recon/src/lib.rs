//! `enrollname-recon` — Device naming reconciliation engine.
//!
//! Pure engine crate: receives a pre-fetched device snapshot and a loaded
//! directive set, returns one classified decision per directive.
//! No network dependencies; remote updates go through [`action::UpdateAction`].

pub mod action;
pub mod classify;
pub mod config;
pub mod duplicates;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod load;
pub mod model;
pub mod normalize;
pub mod report;

pub use action::{SimulateOnly, UpdateAction};
pub use config::ReconPolicy;
pub use engine::{plan, run};
pub use error::ReconError;
pub use model::{
    Decision, DecisionStatus, Directive, DirectiveSet, ReconResult, ReconSummary, RemoteDevice,
    UpdateOutcome,
};
