use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Default filter directive for the given verbosity flags. `quiet` wins over `debug`.
pub fn default_directive(debug: bool, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else if debug {
        "debug"
    } else {
        "info"
    }
}

/// Installs the global tracing subscriber. `RUST_LOG` overrides the flags when set.
///
/// Log lines go to stderr through the indicatif layer, which draws progress bars for spans and
/// prints each line above them instead of through them.
pub fn init_logging(debug: bool, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug, quiet)));
    let indicatif_layer = IndicatifLayer::new();

    let fmt_layer = fmt::layer()
        .with_writer(indicatif_layer.get_stderr_writer())
        .with_target(debug)
        .with_file(debug)
        .with_line_number(debug);

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(indicatif_layer)
        .try_init();

    if let Err(e) = result {
        eprintln!("⚠️  Failed to initialize logging: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false, false), "info");
        assert_eq!(default_directive(true, false), "debug");
        assert_eq!(default_directive(false, true), "error");
        assert_eq!(default_directive(true, true), "error");
    }
}
