pub mod classifier;
pub mod outcome_store;

use serde::Serialize;

/// Terminal classification of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Verdict {
    Vulnerable,
    NotExploitable,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Vulnerable => write!(f, "vulnerable"),
            Verdict::NotExploitable => write!(f, "not exploitable"),
        }
    }
}
