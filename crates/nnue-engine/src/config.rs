//! The three recognized configuration keys of §6, modeled as a plain struct
//! rather than a free-form key/value map, since the set is small and fixed.

const DEFAULT_EVAL_FILE: &str = "nn.bin";

/// NNUE configuration. All fields are optional in the sense that
/// `EvalConfig::default()` produces a usable configuration (load the
/// build-embedded default parameter file, do not train from scratch).
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Path to the parameter file. `None` uses the build-embedded default
    /// name (`nn.bin`).
    pub eval_file: Option<String>,
    /// Directory training snapshots are written to and restored from.
    /// Only consulted when the `nnue-train` feature is enabled.
    pub eval_save_dir: Option<String>,
    /// When true, `load` initializes parameters to zero instead of reading
    /// `eval_file`, for training from scratch.
    pub skip_loading_eval: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            eval_file: None,
            eval_save_dir: None,
            skip_loading_eval: false,
        }
    }
}

impl EvalConfig {
    pub fn eval_file_or_default(&self) -> &str {
        self.eval_file.as_deref().unwrap_or(DEFAULT_EVAL_FILE)
    }

    /// Builds a config from `NNUE_EVAL_FILE`, `NNUE_EVAL_SAVE_DIR`, and
    /// `NNUE_SKIP_LOADING_EVAL` (`"1"`/`"true"`, case-insensitive), falling
    /// back to `Default` for any key that isn't set.
    pub fn from_env() -> Self {
        let skip_loading_eval = std::env::var("NNUE_SKIP_LOADING_EVAL")
            .map(|v| v.eq_ignore_ascii_case("1") || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        EvalConfig {
            eval_file: std::env::var("NNUE_EVAL_FILE").ok(),
            eval_save_dir: std::env::var("NNUE_EVAL_SAVE_DIR").ok(),
            skip_loading_eval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_embedded_eval_file_name() {
        let config = EvalConfig::default();
        assert_eq!(config.eval_file_or_default(), DEFAULT_EVAL_FILE);
    }

    #[test]
    fn explicit_eval_file_overrides_default() {
        let config = EvalConfig { eval_file: Some("custom.bin".to_string()), ..EvalConfig::default() };
        assert_eq!(config.eval_file_or_default(), "custom.bin");
    }

    #[test]
    fn from_env_reads_nnue_prefixed_variables() {
        std::env::set_var("NNUE_EVAL_FILE", "env.bin");
        std::env::set_var("NNUE_EVAL_SAVE_DIR", "/tmp/snapshots");
        std::env::set_var("NNUE_SKIP_LOADING_EVAL", "TRUE");

        let config = EvalConfig::from_env();

        std::env::remove_var("NNUE_EVAL_FILE");
        std::env::remove_var("NNUE_EVAL_SAVE_DIR");
        std::env::remove_var("NNUE_SKIP_LOADING_EVAL");

        assert_eq!(config.eval_file.as_deref(), Some("env.bin"));
        assert_eq!(config.eval_save_dir.as_deref(), Some("/tmp/snapshots"));
        assert!(config.skip_loading_eval);
    }

    #[test]
    fn from_env_falls_back_to_default_when_unset() {
        std::env::remove_var("NNUE_EVAL_FILE");
        std::env::remove_var("NNUE_EVAL_SAVE_DIR");
        std::env::remove_var("NNUE_SKIP_LOADING_EVAL");

        let config = EvalConfig::from_env();

        assert_eq!(config.eval_file, None);
        assert_eq!(config.eval_save_dir, None);
        assert!(!config.skip_loading_eval);
    }
}
