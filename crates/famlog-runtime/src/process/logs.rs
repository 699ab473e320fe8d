//! Per-port server log files.
//!
//! Each port gets one append-mode file that receives the child's stdout and
//! stderr plus a header and trailer written by the supervisor. The file is
//! opened before spawning so launch failures still leave a diagnostic
//! artifact behind. Nothing is ever parsed back out of it.

use chrono::Utc;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Log file path for a port inside `log_dir`.
pub fn log_path_for(log_dir: &Path, port: u16) -> PathBuf {
    log_dir.join(format!("llama-server-{port}.log"))
}

/// Exclusively owned, append-mode log sink of one managed server.
///
/// Dropping or [`close`](Self::close)-ing it releases the supervisor's handle;
/// the child keeps its own duplicated descriptors until it exits.
#[derive(Debug)]
pub struct ServerLogFile {
    path: PathBuf,
    file: File,
}

impl ServerLogFile {
    /// Open (or create) the log for `port`, creating `log_dir` if needed.
    pub fn open(log_dir: &Path, port: u16) -> io::Result<Self> {
        fs::create_dir_all(log_dir)?;
        let path = log_path_for(log_dir, port);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Duplicate handles for the child's stdout and stderr.
    pub fn stdio(&self) -> io::Result<(Stdio, Stdio)> {
        Ok((
            Stdio::from(self.file.try_clone()?),
            Stdio::from(self.file.try_clone()?),
        ))
    }

    /// Append a timestamped supervisor line.
    ///
    /// Failures are ignored: a full disk must not break lifecycle handling.
    pub fn note(&mut self, message: &str) {
        let stamp = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let _ = writeln!(self.file, "=== [famlog {stamp}] {message} ===");
    }

    /// Flush and release the handle.
    pub fn close(mut self) {
        let _ = self.file.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn path_is_keyed_by_port() {
        assert_eq!(
            log_path_for(Path::new("/var/log/famlog"), 8080),
            PathBuf::from("/var/log/famlog/llama-server-8080.log")
        );
    }

    #[test]
    fn reopening_appends() {
        let dir = tempdir().unwrap();

        let mut first = ServerLogFile::open(dir.path(), 9000).unwrap();
        first.note("first run");
        first.close();

        let mut second = ServerLogFile::open(dir.path(), 9000).unwrap();
        second.note("second run");
        let path = second.path().to_path_buf();
        second.close();

        let contents = fs::read_to_string(path).unwrap();
        let first_at = contents.find("first run").unwrap();
        let second_at = contents.find("second run").unwrap();
        assert!(first_at < second_at);
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let log = ServerLogFile::open(&nested, 1234).unwrap();
        assert!(log.path().exists());
    }
}
