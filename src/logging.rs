use env_logger::Env;

/// Initialize the global logger, defaulting to `info` when `RUST_LOG` is not
/// set. Later calls are no-ops.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_is_repeatable() {
        init_logger();
        init_logger();

        if std::env::var("RUST_LOG").is_err() {
            assert!(log::log_enabled!(log::Level::Info));
            assert!(!log::log_enabled!(log::Level::Debug));
        }
    }
}
