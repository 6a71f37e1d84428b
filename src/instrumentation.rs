use tracing_chrome::{ChromeLayerBuilder, FlushGuard};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

/// Install the log output on stderr, at DEBUG when `verbose` and INFO
/// otherwise. With `trace` also enable tracing to chrome://tracing or
/// https://ui.perfetto.dev/
///
/// Make sure to store the guard in a variable in the scope to be instrumented, otherwise the trace
/// will be disabled immediately.
pub fn init(trace: bool, verbose: bool) -> Option<FlushGuard> {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(level);
    let (chrome_layer, guard) = if trace {
        let (layer, guard) = ChromeLayerBuilder::new().build();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };
    tracing_subscriber::registry()
        .with(chrome_layer)
        .with(fmt_layer)
        .init();
    guard
}
