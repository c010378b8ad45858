// Logger setup shared by the binaries. `RUST_LOG` wins over the default level.

use log::LevelFilter;

pub fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

pub fn init(default_level: LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(default_level);
    builder.parse_default_env();
    builder.format_timestamp_secs();

    // A second init keeps the first logger.
    let _ = builder.try_init();
}
