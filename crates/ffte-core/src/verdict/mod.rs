//! Verdict module - failure classification, severity, and policy

mod classify;
mod failure;
mod policy;
mod severity;

pub use classify::classify;
pub use failure::{FailureClassification, FailureFlags, FailureKind};
pub use policy::{Verdict, VerdictPolicy, VerdictStatus};
pub use severity::Severity;
