//! Application entry point for the membrane growth viewer.
//!
//! This binary sets up logging, loads the simulation configuration and hands
//! everything else to [`Viewer`] from the `viewer` module.

mod viewer;

use std::path::PathBuf;

use membrane_core::SimConfig;
use viewer::Viewer;

/// Default configuration file, read from the working directory when present.
const DEFAULT_CONFIG: &str = "membrane.toml";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Resolves the configuration: first CLI argument, else `membrane.toml`,
/// else built-in defaults.
///
/// A file that exists but fails to load is reported and replaced by the
/// defaults, so a typo never keeps the window from opening.
fn load_config() -> SimConfig {
    let explicit = std::env::args_os().nth(1).map(PathBuf::from);
    let path = explicit.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    if !path.exists() {
        tracing::info!(path = %path.display(), "no config file, using defaults");
        return SimConfig::default();
    }

    match SimConfig::load(&path) {
        Ok(cfg) => {
            tracing::info!(path = %path.display(), size = cfg.size, "config loaded");
            cfg
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "config rejected, using defaults");
            SimConfig::default()
        }
    }
}

/// Starts the native eframe application titled `"Membrane Growth"`.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the window or the simulation cannot be built.
fn main() -> eframe::Result<()> {
    init_tracing();
    let cfg = load_config();
    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "Membrane Growth",
        options,
        Box::new(|_cc| Ok(Box::new(Viewer::new(cfg)?))),
    )
}
