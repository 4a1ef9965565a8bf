use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directives used when `RUST_LOG` is unset. The HTTP client stack stays
/// quiet unless asked for, so backend round trips show up only as this
/// crate's own `debug` events.
fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "unit_admin=debug,reqwest=info,hyper=warn,hyper_util=warn,rustls=warn,warn"
    } else {
        "unit_admin=info,reqwest=warn,hyper=warn,hyper_util=warn,rustls=error,warn"
    }
}

fn env_or_default(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

/// Compact human output for the CLI.
pub fn init_cli_logger(verbose: bool) {
    tracing_subscriber::registry()
        .with(env_or_default(verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(verbose)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// One JSON object per event, carrying the enclosing `unit_save` span.
pub fn init_json_logger() {
    tracing_subscriber::registry()
        .with(env_or_default(false))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_span_list(false)
                .with_file(false)
                .with_line_number(false),
        )
        .init();
}
