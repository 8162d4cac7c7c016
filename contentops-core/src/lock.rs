use anyhow::{anyhow, Context, Result};
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

const STALE_LOCK_TIMEOUT_SECS: u64 = 300; // 5 minutes

/// Exclusive claim on one repository snapshot for the length of a run.
///
/// The lock lives next to the snapshot as `<snapshot>.lock` and holds
/// `pid:timestamp`. A lock older than five minutes, or whose process is gone,
/// is taken over.
#[derive(Debug)]
pub struct RepositoryLock {
    path: PathBuf,
    pid: u32,
    timestamp: u64,
}

pub fn lock_path_for(snapshot: &Path) -> PathBuf {
    let mut name = snapshot
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("repository"));
    name.push(".lock");
    snapshot.with_file_name(name)
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl RepositoryLock {
    pub fn acquire(snapshot: &Path) -> Result<Self> {
        let lock_path = lock_path_for(snapshot);

        if let Ok(content) = fs::read_to_string(&lock_path) {
            if let Some((pid, timestamp)) = content.trim().split_once(':') {
                let pid = pid.parse::<u32>().unwrap_or(0);
                let timestamp = timestamp.parse::<u64>().unwrap_or(0);

                if now_secs().saturating_sub(timestamp) > STALE_LOCK_TIMEOUT_SECS {
                    tracing::warn!(path = %lock_path.display(), pid, "removing stale lock");
                    fs::remove_file(&lock_path).context("Failed to remove stale lock file")?;
                } else if is_process_running(pid) {
                    return Err(anyhow!(
                        "Another contentops process is already working on this repository (PID: {}). \
                        If this is incorrect, remove the lock file at: {}",
                        pid,
                        lock_path.display()
                    ));
                } else {
                    tracing::warn!(path = %lock_path.display(), pid, "removing orphaned lock");
                    fs::remove_file(&lock_path).context("Failed to remove orphaned lock file")?;
                }
            }
        }

        let pid = process::id();
        let timestamp = now_secs();

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to create lock file {}", lock_path.display()))?;
        file.write_all(format!("{pid}:{timestamp}").as_bytes())
            .context("Failed to write lock file")?;

        tracing::debug!(path = %lock_path.display(), "repository lock acquired");
        Ok(Self {
            path: lock_path,
            pid,
            timestamp,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the lock file if it is still ours.
    pub fn release(self) -> Result<()> {
        if let Ok(content) = fs::read_to_string(&self.path) {
            if content.trim() == format!("{}:{}", self.pid, self.timestamp) {
                fs::remove_file(&self.path).context("Failed to remove lock file")?;
            }
        }
        Ok(())
    }
}

impl Drop for RepositoryLock {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = fs::remove_file(&self.path);
        }
    }
}

#[cfg(unix)]
fn is_process_running(pid: u32) -> bool {
    #[allow(clippy::cast_possible_wrap)]
    unsafe {
        libc::kill(pid as libc::pid_t, 0) == 0
    }
}

#[cfg(windows)]
fn is_process_running(pid: u32) -> bool {
    use winapi::um::handleapi::CloseHandle;
    use winapi::um::processthreadsapi::OpenProcess;
    use winapi::um::winnt::PROCESS_QUERY_INFORMATION;

    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_INFORMATION, 0, pid);
        if handle.is_null() {
            false
        } else {
            CloseHandle(handle);
            true
        }
    }
}

#[cfg(not(any(unix, windows)))]
fn is_process_running(_pid: u32) -> bool {
    false
}
