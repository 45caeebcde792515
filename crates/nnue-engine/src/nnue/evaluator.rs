//! The evaluator facade: a process-wide parameter store and the single
//! `evaluate` entry point described in §4.5 and §6.

use std::sync::OnceLock;

use crate::config::EvalConfig;
use crate::error::Result;
use crate::nnue::features::{Friend, HalfKp};
use crate::nnue::network::Network;
use crate::position::Position;

/// The feature set this build's evaluator is compiled against. The source
/// spec names `HalfKP(Friend)` as the default architecture (§3); swapping in
/// `HalfKp<Enemy>` or a `ConcatFeatureSet` is a type-level change here, not a
/// runtime one.
pub type DefaultFeatureSet = HalfKp<Friend>;

static NETWORK: OnceLock<Network<DefaultFeatureSet>> = OnceLock::new();

/// Loads parameters from `config.eval_file` (or the build-embedded default
/// if unset) into the process-wide store. Calling this a second time is a
/// programmer error, not a recoverable runtime condition — like the other
/// contract violations in §7, it asserts in debug builds; in release it is a
/// no-op that leaves the already-loaded parameters untouched (§5).
pub fn load(config: &EvalConfig) -> Result<()> {
    debug_assert!(NETWORK.get().is_none(), "nnue::evaluator::load called more than once");
    if NETWORK.get().is_some() {
        return Ok(());
    }

    let network = if config.skip_loading_eval {
        log::info!("nnue: SkipLoadingEval set, initializing parameters to zero");
        Network::<DefaultFeatureSet>::zeroed()
    } else {
        let path = config.eval_file_or_default();
        log::info!("nnue: loading parameters from {path}");
        Network::load(path)?
    };

    // A racing second `set` loses silently here for the same reason: the
    // first load wins, and this path is only reachable via the programmer
    // error the assertion above already flags.
    let _ = NETWORK.set(network);
    Ok(())
}

/// Evaluates `pos` from the side-to-move's perspective, in centipawns.
///
/// Panics if `load` has not been called yet — matching the source spec's
/// "parameters are loaded once at engine start" lifecycle (§5); there is no
/// sensible fallback score to return instead.
pub fn evaluate(pos: &mut Position) -> i32 {
    let network = NETWORK.get().expect("nnue::evaluator::load must run before evaluate");

    #[cfg(feature = "nnue-stats")]
    {
        let had_parent_accumulation = pos
            .previous_state()
            .is_some_and(|parent| parent.accumulator.computed_accumulation);
        let score = network.evaluate(pos);
        log::debug!(
            "nnue: evaluated via {} path, score={}",
            if had_parent_accumulation { "incremental" } else { "full-refresh" },
            score
        );
        return score;
    }

    #[cfg(not(feature = "nnue-stats"))]
    network.evaluate(pos)
}

#[cfg(test)]
pub(crate) fn loaded_for_test() -> bool {
    NETWORK.get().is_some()
}
