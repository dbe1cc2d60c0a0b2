use std::{
    env, fs,
    path::{Path, PathBuf},
};

use directories::BaseDirs;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "chat-handler.log";

// stderr carries the JSON error channel, so logs go to a file.
// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init() -> Option<WorkerGuard> {
    init_in(&log_dir()?)
}

// Any failure leaves the process without logging; it never aborts it.
fn init_in(dir: &Path) -> Option<WorkerGuard> {
    fs::create_dir_all(dir).ok()?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(dir)
        .ok()?;
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter =
        EnvFilter::try_from_env("CHAT_HANDLER_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;
    Some(guard)
}

fn log_dir() -> Option<PathBuf> {
    if let Ok(d) = env::var("CHAT_HANDLER_LOG_DIR") {
        if !d.trim().is_empty() {
            return Some(PathBuf::from(d));
        }
    }
    let base = BaseDirs::new()?;
    Some(base.data_dir().join("chat-handler").join("logs"))
}
