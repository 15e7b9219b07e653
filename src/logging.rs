// src/logging.rs
//
// Timestamped stderr logging with an optional mirror into a session log
// file. Each run gets its own `<YYYYmmdd-HHMMSS>-juma-vmc.log`; older
// session logs beyond `LOG_RETENTION` are removed when a new one starts.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Local};

const LOG_SUFFIX: &str = "-juma-vmc.log";

/// Symlink to the newest session log (Unix only)
const LATEST_LOG_NAME: &str = "juma-vmc.log";

/// Session logs kept in the log directory, including the current one
pub const LOG_RETENTION: usize = 10;

struct SessionLog {
    path: PathBuf,
    file: File,
}

static SESSION: Mutex<Option<SessionLog>> = Mutex::new(None);

fn timestamp() -> impl fmt::Display {
    Local::now().format("%H:%M:%S%.3f")
}

/// Write one timestamped line to stderr and, if a session is active, to its file.
/// Used by `tlog!`.
pub fn emit(args: fmt::Arguments<'_>) {
    let line = format!("{} {}", timestamp(), args);
    eprintln!("{}", line);
    if let Ok(mut guard) = SESSION.lock() {
        if let Some(session) = guard.as_mut() {
            let _ = writeln!(session.file, "{}", line);
        }
    }
}

/// Timestamped logging macro.
/// Prepends `HH:MM:SS.mmm` local time; mirrored to the session log file.
#[macro_export]
macro_rules! tlog {
    ($($arg:tt)*) => {
        $crate::logging::emit(format_args!($($arg)*))
    };
}

/// `<data dir>/juma-vmc/logs`
pub fn default_log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("juma-vmc").join("logs"))
}

fn session_file_name(started: DateTime<Local>) -> String {
    format!("{}{}", started.format("%Y%m%d-%H%M%S"), LOG_SUFFIX)
}

fn is_session_log(name: &str) -> bool {
    name.len() > LOG_SUFFIX.len()
        && name.ends_with(LOG_SUFFIX)
        && name.as_bytes()[0].is_ascii_digit()
}

/// Delete all but the newest `keep` session logs in `dir`.
/// Other files are left alone. Returns how many were removed.
pub fn prune_old_logs(dir: &Path, keep: usize) -> Result<usize, String> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| format!("Failed to read log dir: {}", e))?;

    let mut logs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|entry| entry.file_name().to_str().is_some_and(is_session_log))
        .map(|entry| entry.path())
        .collect();

    if logs.len() <= keep {
        return Ok(0);
    }

    // The timestamp prefix sorts chronologically
    logs.sort();
    let stale = logs.len() - keep;
    let mut removed = 0;
    for path in logs.into_iter().take(stale) {
        match std::fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!("{} [logging] Could not remove {}: {}", timestamp(), path.display(), e),
        }
    }
    Ok(removed)
}

#[cfg(unix)]
fn point_latest_at(dir: &Path, file_name: &str) {
    let link = dir.join(LATEST_LOG_NAME);
    let _ = std::fs::remove_file(&link);
    if let Err(e) = std::os::unix::fs::symlink(file_name, &link) {
        eprintln!("{} [logging] Failed to link {}: {}", timestamp(), LATEST_LOG_NAME, e);
    }
}

// Windows symlinks need elevated privileges
#[cfg(not(unix))]
fn point_latest_at(_dir: &Path, _file_name: &str) {}

/// Stops file logging when dropped.
#[must_use = "file logging stops when the guard is dropped"]
pub struct LogGuard {
    path: PathBuf,
}

impl LogGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        stop_file_logging();
    }
}

/// Start a new session log in `log_dir`, replacing any active one, and
/// prune old session logs down to `LOG_RETENTION`.
pub fn init_file_logging(log_dir: &Path) -> Result<LogGuard, String> {
    std::fs::create_dir_all(log_dir)
        .map_err(|e| format!("Failed to create log dir: {}", e))?;

    let file_name = session_file_name(Local::now());
    let path = log_dir.join(&file_name);
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| format!("Failed to create log file: {}", e))?;

    point_latest_at(log_dir, &file_name);

    if let Ok(mut guard) = SESSION.lock() {
        *guard = Some(SessionLog {
            path: path.clone(),
            file,
        });
    }
    tlog!("[logging] File logging started: {}", path.display());

    match prune_old_logs(log_dir, LOG_RETENTION) {
        Ok(0) => {}
        Ok(n) => tlog!("[logging] Removed {} old log file(s)", n),
        Err(e) => tlog!("[logging] {}", e),
    }

    Ok(LogGuard { path })
}

/// Path of the active session log, if any.
pub fn current_log_path() -> Option<PathBuf> {
    SESSION
        .lock()
        .ok()
        .and_then(|guard| guard.as_ref().map(|s| s.path.clone()))
}

/// Close the session log. stderr logging continues.
pub fn stop_file_logging() {
    let closed = match SESSION.lock() {
        Ok(mut guard) => guard.take(),
        Err(_) => None,
    };
    if let Some(mut session) = closed {
        let _ = session.file.flush();
        eprintln!("{} [logging] File logging stopped: {}", timestamp(), session.path.display());
    }
}
