use std::io::Write;

use env_logger::{Builder, Target, DEFAULT_FILTER_ENV};
use log::LevelFilter;

/// Logs warnings to stderr, or debug messages if `verbose` is set.
/// `RUST_LOG` takes precedence over both
pub fn setup_logging(verbose: bool) {
    let mut builder = Builder::default();
    builder.target(Target::Stderr);
    builder.filter_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });

    let has_debug = std::env::var(DEFAULT_FILTER_ENV)
        .map(|v| v.contains("debug"))
        .unwrap_or(false);

    if verbose || has_debug {
        builder.format_timestamp_millis();
    } else {
        // <level>: <message>
        builder.format(|buf, record| {
            writeln!(
                buf,
                "{}: {}",
                record.level().as_str().to_lowercase(),
                record.args()
            )
        });
    }

    builder.parse_default_env();
    builder.init();
}
