//! Error taxonomy for parameter loading and the (feature-gated) training
//! surface. `Network::evaluate`, the hot-path entry point, never returns a
//! `Result` (§7); these variants surface at load time or at the opt-in
//! buffer-pooling entry point, `Network::evaluate_into`.

use thiserror::Error;

/// All failure modes the NNUE core can surface.
#[derive(Debug, Error)]
pub enum NnueError {
    /// File open/read/write failure.
    #[error("NNUE parameter I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Version or composed architecture hash mismatch. The load is
    /// rejected atomically: the caller's previously-loaded parameters, if
    /// any, are left untouched.
    #[error("NNUE architecture mismatch in {path}: expected hash {expected:#010x}, found {found:#010x}")]
    ArchMismatch {
        path: String,
        expected: u32,
        found: u32,
    },

    /// File shorter than the architecture's expected byte length.
    #[error("NNUE parameter file {path} is truncated: expected at least {expected_at_least} bytes, found {found}")]
    Truncated {
        path: String,
        expected_at_least: usize,
        found: usize,
    },

    /// The caller-provided scratch buffer is smaller than
    /// `Network::BUFFER_SIZE`. Returned by `Network::evaluate_into`; the
    /// zero-allocation `Network::evaluate` sidesteps this entirely by
    /// owning its own scratch array.
    #[error("NNUE scratch buffer undersized: need {needed} bytes, got {got}")]
    BufferUndersized { needed: usize, got: usize },
}

pub type Result<T> = std::result::Result<T, NnueError>;
