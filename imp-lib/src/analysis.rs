use core::fmt::{self, Display, Formatter};

pub mod available_expressions;
pub mod constant_propagation;
pub mod dead_code;
pub mod def_use;
pub mod dominators;
pub mod liveness;
pub mod loops;

#[cfg(test)]
mod liveness_tests;

/// Stable identifiers the analyses are addressed by.
pub const CFG_ID: &str = "cfg";
pub const CONST_PROP_ID: &str = "const-prop";
pub const LIVE_VAR_ID: &str = "live-var";
pub const DOMINATOR_ID: &str = "dominator";
pub const AVAIL_EXPR_ID: &str = "avail-expr";
pub const DEAD_CODE_ID: &str = "dead-code";
pub const LOOP_ID: &str = "loop-detection";
pub const DEF_USE_ID: &str = "def-use";
pub const ICFG_ID: &str = "icfg";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnalysisError {
    UnknownAnalysis(String),
    /// A known identifier whose result is not produced by `run`: the
    /// graphs are built eagerly and the ICFG through `build_icfg`.
    NotRunnable {
        analysis: &'static str,
        hint: &'static str,
    },
    UnknownFunction(String),
    /// The solver exceeded its iteration budget before reaching a
    /// fixed point.
    Diverged {
        analysis: &'static str,
        function: String,
    },
}

impl Display for AnalysisError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::UnknownAnalysis(id) => write!(f, "Unknown analysis '{id}'."),
            AnalysisError::NotRunnable { analysis, hint } => {
                write!(f, "'{analysis}' cannot be run on demand; {hint}.")
            }
            AnalysisError::UnknownFunction(name) => write!(f, "Unknown function '{name}'."),
            AnalysisError::Diverged { analysis, function } => {
                write!(f, "Analysis '{analysis}' failed to converge on '{function}'.")
            }
        }
    }
}

impl std::error::Error for AnalysisError {}
