use crate::config::{LoggingConfig, Section};
use std::{
    collections::HashMap,
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::{level_filters::LevelFilter, Level};
use tracing_subscriber::{
    filter::{FilterFn, Targets},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer, Registry,
};

use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

// -------- level helpers --------
fn parse_tracing_level(s: &str) -> Option<Level> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

/// Returns true if target == crate_name or target starts with "crate_name::"
fn matches_crate_prefix(target: &str, crate_name: &str) -> bool {
    target == crate_name
        || (target.starts_with(crate_name) && target[crate_name.len()..].starts_with("::"))
}

/// Everything not claimed by an explicit subsystem section, up to `max_level`.
fn default_filter(
    claimed: Vec<String>,
    max_level: Level,
) -> FilterFn<impl Fn(&tracing::Metadata<'_>) -> bool> {
    FilterFn::new(move |meta: &tracing::Metadata<'_>| {
        let t = meta.target();
        !claimed.iter().any(|c| matches_crate_prefix(t, c)) && meta.level() <= &max_level
    })
}

// -------- rotating writer for files --------
#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl Write for RotWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log writer lock poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log writer lock poisoned"))?
            .flush()
    }
}

impl<'a> fmt::MakeWriter<'a> for RotWriter {
    type Writer = RotWriter;
    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

// -------- path resolution helpers --------

/// Resolve a log file path against `base_dir` (home_dir).
/// Absolute paths are kept as-is; relative paths are joined with `base_dir`.
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

/// Retention policy for rotated files: an explicit backup count wins over age.
fn file_limit(section: &Section) -> FileLimit {
    match (section.max_backups, section.max_age_days) {
        (Some(n), _) => FileLimit::MaxFiles(n.max(1)),
        (None, Some(days)) => FileLimit::Age(chrono::Duration::days(i64::from(days.max(1)))),
        (None, None) => FileLimit::Age(chrono::Duration::days(1)),
    }
}

/// Create a rotating writer for log files, ensuring the parent directory exists.
fn create_rotating_writer_at_path(
    log_path: &Path,
    max_bytes: usize,
    limit: FileLimit,
) -> std::io::Result<RotWriter> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let rot = FileRotate::new(
        log_path,
        AppendTimestamp::default(limit),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None, // file permissions (Unix only)
    );

    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

fn section_writer(name: &str, section: &Section, base_dir: &Path) -> Option<RotWriter> {
    if section.file.trim().is_empty() {
        return None;
    }
    let max_bytes = section.max_size_mb.unwrap_or(100) * 1024 * 1024;
    let log_path = resolve_log_path(&section.file, base_dir);

    match create_rotating_writer_at_path(&log_path, max_bytes as usize, file_limit(section)) {
        Ok(writer) => Some(writer),
        Err(e) => {
            eprintln!(
                "Failed to init log file for '{}': {} ({})",
                name,
                log_path.to_string_lossy(),
                e
            );
            None
        }
    }
}

// -------- layer assembly --------

fn console_layer<F>(ansi: bool, filter: F) -> BoxedLayer
where
    F: tracing_subscriber::layer::Filter<Registry> + Send + Sync + 'static,
{
    fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(filter)
        .boxed()
}

fn file_layer<F>(writer: RotWriter, filter: F) -> BoxedLayer
where
    F: tracing_subscriber::layer::Filter<Registry> + Send + Sync + 'static,
{
    fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_current_span(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_writer(writer)
        .with_filter(filter)
        .boxed()
}

/// Build one console layer and at most one file layer per section.
fn build_layers(cfg: &LoggingConfig, base_dir: &Path, ansi: bool) -> Vec<BoxedLayer> {
    let mut layers = Vec::new();

    let subsystems: HashMap<&String, &Section> =
        cfg.iter().filter(|(k, _)| k.as_str() != "default").collect();
    let claimed: Vec<String> = subsystems.keys().map(|k| (*k).clone()).collect();

    for (name, section) in &subsystems {
        if let Some(level) = parse_tracing_level(&section.console_level) {
            let targets =
                Targets::new().with_target((*name).clone(), LevelFilter::from_level(level));
            layers.push(console_layer(ansi, targets));
        }
        if let (Some(level), Some(writer)) = (
            parse_tracing_level(&section.file_level),
            section_writer(name, section, base_dir),
        ) {
            let targets =
                Targets::new().with_target((*name).clone(), LevelFilter::from_level(level));
            layers.push(file_layer(writer, targets));
        }
    }

    if let Some(section) = cfg.get("default") {
        if let Some(level) = parse_tracing_level(&section.console_level) {
            layers.push(console_layer(ansi, default_filter(claimed.clone(), level)));
        }
        if let (Some(level), Some(writer)) = (
            parse_tracing_level(&section.file_level),
            section_writer("default", section, base_dir),
        ) {
            layers.push(file_layer(writer, default_filter(claimed, level)));
        }
    }

    layers
}

// -------- public init --------

/// Initialize logging from a configuration.
/// - `cfg`: LoggingConfig containing the logging sections
/// - `base_dir`: base directory used to resolve relative log file paths (usually server.home_dir)
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    // Bridge `log` → `tracing` *before* installing the subscriber
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        let _ = fmt()
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .try_init();
        return;
    }

    let ansi = std::io::stdout().is_terminal();
    let layers = build_layers(cfg, base_dir, ansi);
    let _ = Registry::default().with(layers).try_init();
}

// =================== tests ===================
