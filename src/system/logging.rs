//! Logger initialisation.
//!
//! Grounded on `router-core/src/system/writer/mod.rs`: the teacher
//! builds its own `env_logger` format with a `chrono` timestamp prefix
//! rather than taking the crate's default format. We keep that choice
//! but drop the teacher's additional UDP tag-sender fallback chain —
//! nothing in spec.md's scope needs a second log sink, and ambient
//! logging only has to reach stdout/stderr here (SPEC_FULL.md §B).

use std::io::Write;

use chrono::Local;
use env_logger::Builder;
use log::LevelFilter;

/// Initialise the process-wide logger. Safe to call more than once;
/// `env_logger` itself guards against double-initialisation.
pub fn init(default_level: LevelFilter) {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter_level(default_level);

    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    let _ = builder.try_init();
}
