/// Initialize tracing/logging for the application.
///
/// `level` is parsed leniently, falling back to `info`; `format`
/// selects the JSON formatter when set to `"json"` and the plain one
/// otherwise.
pub fn init(level: &str, format: &str) {
    let lvl = match level.to_lowercase().as_str() {
        "error" => tracing::Level::ERROR,
        "warn" | "warning" => tracing::Level::WARN,
        "debug" => tracing::Level::DEBUG,
        "trace" => tracing::Level::TRACE,
        _ => tracing::Level::INFO,
    };

    let builder = tracing_subscriber::fmt()
        .with_max_level(lvl)
        .with_target(false);

    // Use try_init so tests and libraries can call this multiple times
    // without panicking.
    let _ = match format {
        "json" => builder.json().try_init(),
        _ => builder.try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::init;

    #[test]
    fn init_accepts_levels_and_formats() {
        // Should not panic, even when called repeatedly.
        init("info", "json");
        init("debug", "plain");
        init("nonsense", "nonsense");
    }
}
