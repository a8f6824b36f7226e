//! Some utilities

use std::path::{Path, PathBuf};

use frangible::{ElementIndex, EventSink, SimulationParameters, StructuralMaterial};
use ftlog::{
    LevelFilter, LoggerGuard,
    appender::{FileAppender, Period},
};
use serde::Serialize;

/// Configures the logger.
///
/// # Errors
///
/// - If a logs directory could not be located/created.
/// - If the log file name has no stem.
/// - If the logger could not be initialized.
pub fn configure_logger(file_name: &str) -> Result<(LoggerGuard, PathBuf), String> {
    let root_dir = PathBuf::from(".").canonicalize().map_err(|e| e.to_string())?;
    let logs_dir = root_dir.join("logs");
    if !logs_dir.exists() {
        std::fs::create_dir(&logs_dir).map_err(|e| e.to_string())?;
    }
    let log_path = logs_dir.join(file_name);

    let writer = FileAppender::builder().path(&log_path).rotate(Period::Day).build();

    let err_stem = log_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| format!("Log file name {file_name:?} has no stem"))?;
    let err_path = log_path.with_file_name(format!("{err_stem}-err"));

    let guard = ftlog::Builder::new()
        // global max log level
        .max_log_level(LevelFilter::Info)
        // define root appender, pass None would write to stderr
        .root(writer)
        // write `Warn` and `Error` logs in ftlog::appender to `err_path` instead of `log_path`
        .filter("ftlog::appender", "ftlog-appender", LevelFilter::Warn)
        .appender("ftlog-appender", FileAppender::new(err_path))
        .try_init()
        .map_err(|e| e.to_string())?;

    Ok((guard, log_path))
}

/// Reads the simulation parameters, falling back to the defaults when no file is given.
///
/// # Errors
///
/// - If the file cannot be read or parsed.
pub fn read_parameters(path: Option<&Path>) -> Result<SimulationParameters, String> {
    path.map_or_else(
        || Ok(SimulationParameters::default()),
        |path| {
            ftlog::info!("Reading parameters from {path:?}");
            SimulationParameters::from_path(path).map_err(|e| e.to_string())
        },
    )
}

/// Writes `value` as JSON to `path`, or pretty-prints it to stdout if there is no path.
///
/// # Errors
///
/// - If the file cannot be created.
/// - If `value` cannot be serialized.
pub fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<(), String> {
    match path {
        Some(path) => {
            let file = std::fs::File::create(path).map_err(|e| e.to_string())?;
            serde_json::to_writer_pretty(std::io::BufWriter::new(file), value).map_err(|e| e.to_string())?;
            ftlog::info!("Wrote {path:?}");
        }
        None => println!("{}", serde_json::to_string_pretty(value).map_err(|e| e.to_string())?),
    }
    Ok(())
}

/// An `EventSink` that writes every event to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn on_break(&self, material: &StructuralMaterial, count: usize) {
        ftlog::info!("{count} {} springs broke", material.name);
    }

    fn on_stress(&self, material: &StructuralMaterial, count: usize) {
        ftlog::debug!("{count} {} springs are stressed", material.name);
    }

    fn on_destroy(&self, material: &StructuralMaterial, count: usize) {
        ftlog::info!("{count} {} particles destroyed", material.name);
    }

    fn on_leak(&self, point: ElementIndex) {
        ftlog::debug!("Particle {point} is leaking");
    }

    fn on_spring_repaired(&self, material: &StructuralMaterial, count: usize) {
        ftlog::info!("{count} {} springs repaired", material.name);
    }

    fn on_triangle_repaired(&self, material: &StructuralMaterial, count: usize) {
        ftlog::info!("{count} {} triangles repaired", material.name);
    }

    fn on_body_repaired(&self) {
        ftlog::info!("The body is fully repaired");
    }

    fn on_ephemeral_exhausted(&self) {
        ftlog::warn!("The ephemeral particle pool is exhausted");
    }
}
