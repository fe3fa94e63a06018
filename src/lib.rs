pub mod api;
pub mod config;
pub mod core;

pub fn init_logging() {
    // RUST_LOG 优先，默认 info
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
