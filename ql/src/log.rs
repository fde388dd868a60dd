use log::LevelFilter;

pub fn init_logging() {
    env_logger::builder()
        .format_target(false)
        .format_timestamp_secs()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init()
}

/// Like [init_logging], but tolerates repeated calls - meant for test binaries and examples
/// which may end up initializing twice.
pub fn try_init_logging(level: LevelFilter) {
    let _ = env_logger::builder()
        .format_timestamp_secs()
        .filter_level(level)
        .parse_default_env()
        .is_test(cfg!(test))
        .try_init();
}

#[cfg(test)]
#[ctor::ctor]
fn init() {
    try_init_logging(LevelFilter::Debug)
}
