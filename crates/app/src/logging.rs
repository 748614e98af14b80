use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

pub(crate) const LOG_ENV_VAR: &str = "FORMA_LOG";

/// Level from `--log-level`, then `FORMA_LOG`, then INFO.
pub(crate) fn resolve_level(arg: Option<&str>) -> Result<LevelFilter, String> {
    let env = std::env::var(LOG_ENV_VAR).ok();
    match arg.or(env.as_deref()) {
        Some(name) => parse_level(name),
        None => Ok(LevelFilter::INFO),
    }
}

pub(crate) fn parse_level(name: &str) -> Result<LevelFilter, String> {
    LevelFilter::from_str(name.trim()).map_err(|_| format!("unknown log level {name:?}"))
}

/// Logs forma crates at `level` and everything else at WARN or above.
pub(crate) fn setup_tracing(level: LevelFilter) {
    let filter_layer = tracing_subscriber::filter::filter_fn(move |metadata| {
        let is_forma = metadata.target().starts_with("forma");
        let effective = if is_forma {
            level
        } else {
            LevelFilter::from_level(Level::WARN).min(level)
        };
        effective >= *metadata.level()
    });
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter_layer))
        .init();
}
