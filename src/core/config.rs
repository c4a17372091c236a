// ============================================================================
// spark-observe - Configuration
// Per-thread switches controlling advisory warnings and observation
// ============================================================================

use std::fmt;
use std::rc::Rc;

use super::context::with_context;

/// Receives every advisory warning instead of the default `tracing` sink.
pub type WarnHandler = Rc<dyn Fn(&str)>;

/// Observer configuration.
///
/// Lives in the thread-local reactive context. The defaults correspond to a
/// development build: warnings on, observation on.
#[derive(Clone, Default)]
pub struct Config {
    /// Production mode: advisory warnings and custom setter hooks are skipped.
    pub production: bool,

    /// Suppress the default `tracing` warning sink. A `warn_handler` still
    /// receives messages.
    pub silent: bool,

    /// Values are never observed while server rendering.
    pub server_rendering: bool,

    pub warn_handler: Option<WarnHandler>,
}

const ENV_PRODUCTION: &str = "SPARK_OBSERVE_PRODUCTION";
const ENV_SILENT: &str = "SPARK_OBSERVE_SILENT";
const ENV_SSR: &str = "SPARK_OBSERVE_SSR";

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

impl Config {
    /// Build a configuration from `SPARK_OBSERVE_PRODUCTION`,
    /// `SPARK_OBSERVE_SILENT` and `SPARK_OBSERVE_SSR`.
    ///
    /// Each accepts `1`, `true`, `yes` or `on`; anything else is false.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            production: env_flag(ENV_PRODUCTION),
            silent: env_flag(ENV_SILENT),
            server_rendering: env_flag(ENV_SSR),
            warn_handler: None,
        }
    }

    #[must_use]
    pub fn production() -> Self {
        Self {
            production: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_warn_handler(mut self, handler: impl Fn(&str) + 'static) -> Self {
        self.warn_handler = Some(Rc::new(handler));
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("production", &self.production)
            .field("silent", &self.silent)
            .field("server_rendering", &self.server_rendering)
            .field("warn_handler", &self.warn_handler.is_some())
            .finish()
    }
}

// =============================================================================
// ACCESS
// =============================================================================

/// Snapshot of the current thread's configuration
pub fn config() -> Config {
    with_context(|ctx| ctx.config())
}

/// Replace the current thread's configuration, returning the previous one
pub fn set_config(config: Config) -> Config {
    with_context(|ctx| ctx.replace_config(config))
}

/// Run `f` with `config` installed, restoring the previous configuration
/// afterwards (also when `f` panics).
pub fn with_config<R>(config: Config, f: impl FnOnce() -> R) -> R {
    struct Restore(Option<Config>);

    impl Drop for Restore {
        fn drop(&mut self) {
            if let Some(previous) = self.0.take() {
                set_config(previous);
            }
        }
    }

    let _restore = Restore(Some(set_config(config)));
    f()
}

// =============================================================================
// WARNINGS
// =============================================================================

/// Emit an advisory warning. No-op in production.
pub(crate) fn warn(message: &str) {
    let config = config();
    if config.production {
        return;
    }

    if let Some(handler) = &config.warn_handler {
        handler(message);
    } else if !config.silent {
        tracing::warn!(target: "spark_observe", "{message}");
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tracing_test::traced_test;

    #[test]
    fn default_is_development() {
        let cfg = Config::default();
        assert!(!cfg.production);
        assert!(!cfg.silent);
        assert!(!cfg.server_rendering);
        assert!(cfg.warn_handler.is_none());
    }

    #[test]
    fn with_config_restores_previous() {
        assert!(!config().production);
        with_config(Config::production(), || {
            assert!(config().production);
        });
        assert!(!config().production);
    }

    #[test]
    fn with_config_restores_on_panic() {
        let result = std::panic::catch_unwind(|| {
            with_config(Config::production(), || panic!("boom"));
        });
        assert!(result.is_err());
        assert!(!config().production);
    }

    #[test]
    fn warn_handler_receives_messages() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let cfg = Config {
            silent: true,
            ..Config::default()
        }
        .with_warn_handler(move |msg| sink.borrow_mut().push(msg.to_string()));

        with_config(cfg, || warn("first"));
        assert_eq!(*seen.borrow(), vec!["first".to_string()]);
    }

    #[test]
    fn production_swallows_warnings() {
        let seen = Rc::new(RefCell::new(0));
        let sink = seen.clone();
        let cfg = Config::production().with_warn_handler(move |_| *sink.borrow_mut() += 1);

        with_config(cfg, || warn("ignored"));
        assert_eq!(*seen.borrow(), 0);
    }

    #[test]
    #[traced_test]
    fn default_sink_is_tracing() {
        warn("declare it upfront");
        assert!(logs_contain("declare it upfront"));
    }

    #[test]
    fn debug_hides_handler() {
        let cfg = Config::default().with_warn_handler(|_| {});
        let debug = format!("{cfg:?}");
        assert!(debug.contains("warn_handler: true"));
    }
}
