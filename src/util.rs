static INIT_ONCE: std::sync::Once = std::sync::Once::new();

/// Install the fmt subscriber once. `RUST_LOG` wins; otherwise `default_filter`.
pub fn init_tracing_once(default_filter: &str) {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
    });
}
