//! Logging setup for the terminal front end

/// Initialize the logger for a raw-mode terminal UI.
/// Uses INFO level by default; the RUST_LOG environment variable overrides it.
/// Lines start with a carriage return so they stay aligned while raw mode is on.
pub fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "\r[{} {:5} {}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.module_path().unwrap_or("tonegen"),
                record.args()
            )
        })
        .init();
}
