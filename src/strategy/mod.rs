//! Strategy — ITM-probability pricing and best-edge contract selection.

pub mod pricing;
pub mod selector;

pub use pricing::ProbabilityModel;
pub use selector::{Candidate, CandidateSelector};
