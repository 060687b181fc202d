//! Remedy Safety - gates around every file mutation
//!
//! - [`SafetyEngine`]: path-keyed content hashes; detects files that changed
//!   behind the pipeline's back
//! - [`confidence`]: the penalty table, confidence score, and review gate
//! - [`validator`]: post-patch checks that can veto an applied change

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod confidence;
pub mod engine;
pub mod error;
pub mod hash;
pub mod validator;

pub use confidence::{
    assess, calculate_confidence, requires_human_review, Assessment, RemediationPlan,
};
pub use engine::{IntegrityVerdict, SafetyEngine};
pub use error::SafetyError;
pub use hash::ContentHash;
pub use validator::{run_validators, Finding, PostValidator, SecurityPatternValidator};
