use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init(verbose: bool) {
    let default_filter = if verbose {
        "persist_dl=debug,pdl=debug"
    } else {
        "persist_dl=info,pdl=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_timer(ChronoLocal::new("%H:%M:%S".to_string()))
        .with_target(false)
        .with_writer(std::io::stdout)
        .init();
}
