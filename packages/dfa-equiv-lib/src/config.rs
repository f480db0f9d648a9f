use dfa_equiv_macros::config;

use crate::{
    automaton::dfa::equivalence::PropagationStrategy, logger::LogLevel, output::OutputFormat,
};

pub trait IntoOr<T> {
    fn into_or(self, or: T) -> T;
}

impl<T> IntoOr<Option<T>> for Option<T> {
    fn into_or(self, or: Option<T>) -> Option<T> {
        match self {
            Some(t) => Some(t),
            None => or,
        }
    }
}

impl<T> IntoOr<T> for Option<T> {
    fn into_or(self, or: T) -> T {
        self.unwrap_or(or)
    }
}

config! {
    pub struct LoggerConfig {
        enabled: bool = false,
        log_file: bool = false,
        log_level: LogLevel = LogLevel::Warn,
    }
}

config! {
    /// Settings for one batch run over a list of test cases.
    pub struct EquivalenceConfig {
        /// How the distinguishability table is driven to its fixed point.
        strategy: PropagationStrategy = PropagationStrategy::Worklist,
        /// Process independent test cases on a rayon thread pool.
        parallel: bool = false,
        /// Size of the thread pool, rayon's default when unset.
        threads: Option<usize> = None,
        /// Attach a distinguishing word to every non-equivalent pair in JSON output.
        witnesses: bool = false,
        format: OutputFormat = OutputFormat::Text,
        logger: LoggerConfig (Option<PartialLoggerConfig> = LoggerConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = EquivalenceConfig::from_toml_str("").unwrap();

        assert_eq!(*config.get_strategy(), PropagationStrategy::Worklist);
        assert!(!*config.get_parallel());
        assert_eq!(*config.get_threads(), None);
        assert_eq!(*config.get_format(), OutputFormat::Text);
        assert!(!*config.get_logger().get_enabled());
    }

    #[test]
    fn partial_config_overrides_fields() {
        let config = EquivalenceConfig::from_toml_str(
            r#"
            strategy = "rescan"
            parallel = true
            threads = 2
            format = "json"

            [logger]
            enabled = true
            log_level = "Debug"
            "#,
        )
        .unwrap();

        assert_eq!(*config.get_strategy(), PropagationStrategy::Rescan);
        assert!(*config.get_parallel());
        assert_eq!(*config.get_threads(), Some(2));
        assert_eq!(*config.get_format(), OutputFormat::Json);
        assert!(*config.get_logger().get_enabled());
        assert_eq!(*config.get_logger().get_log_level(), LogLevel::Debug);
        assert!(!*config.get_logger().get_log_file());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(EquivalenceConfig::from_toml_str("stratgy = \"rescan\"").is_err());
    }
}
