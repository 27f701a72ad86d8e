// src/logging.rs
use tracing_subscriber::EnvFilter;

/// Crate log level for the given verbosity flags; `quiet` wins over `verbose`
pub fn level_for(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the flags.
/// Calling this more than once is harmless.
pub fn init(verbose: bool, quiet: bool) {
    let level = level_for(verbose, quiet);
    let default_filter = format!("trimurti={level},reqwest=warn,hyper=warn", level = level);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&default_filter))
        .unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert_eq!(level_for(false, false), "info");
        assert_eq!(level_for(true, false), "debug");
        assert_eq!(level_for(true, true), "error");
    }

    #[test]
    fn test_init_twice() {
        init(false, true);
        init(true, false);
    }
}
