// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use log::LevelFilter;

/// Map the number of `--verbose` flags to a log level.
pub fn level_for_verbosity(occurrences: u8) -> LevelFilter {
    match occurrences {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install the global logger.
///
/// `RUST_LOG` takes precedence over the verbosity-derived default.
pub fn init_logging(occurrences: u8) {
    let log_level = level_for_verbosity(occurrences);

    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level.as_str()),
    );

    // Disable log context except at higher log levels.
    if log_level <= LevelFilter::Info {
        builder.format_timestamp(None).format_target(false);
    }

    builder.init();
}
