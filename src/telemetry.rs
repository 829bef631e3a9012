use tracing_subscriber::EnvFilter;

/// Initializes the process-wide tracing subscriber. Matches the teacher's
/// `main.rs` setup (thread ids, file/line, env filter) but reads the filter
/// from `RUST_LOG` instead of hard-coding a level.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("image_search_orchestrator=info,tower_http=info")),
        )
        .init();
}
