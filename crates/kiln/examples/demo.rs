//! The demo scene.
//!
//! ```text
//! cargo run --example demo                  # built-in scene
//! cargo run --example demo -- scene.json    # scene from a config file
//! ```
//!
//! Run `kiln-telemetry` in another terminal to watch frame diagnostics.

use std::path::PathBuf;

use anyhow::Context as _;
use kiln::prelude::*;

fn main() -> anyhow::Result<()> {
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = KilnConfig::load_or_default(path.as_deref())
        .with_context(|| format!("loading config {}", path.as_deref().map_or("(default)".into(), |p| p.display().to_string())))?;

    init_logging(&config.logging);
    for problem in config.problems() {
        log::warn!("config: {problem}");
    }

    kiln::run(config).context("kiln exited with an error")
}
