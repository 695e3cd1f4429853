use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

/// Pid file held for the lifetime of the daemon; removed on drop.
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Fails with the running daemon's pid when another instance is alive.
    /// Stale or unreadable pid files are replaced.
    pub fn acquire(path: &Path) -> Result<Self, i32> {
        if let Some(pid) = running_pid(path) {
            return Err(pid);
        }
        if let Err(e) = write_pid(path) {
            tracing::warn!("Failed to write pid file {}: {}", path.display(), e);
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn running_pid(path: &Path) -> Option<i32> {
    let contents = fs::read_to_string(path).ok()?;
    match contents.trim().parse::<i32>() {
        Ok(pid) if pid > 0 && is_process_running(pid) => Some(pid),
        _ => {
            let _ = fs::remove_file(path);
            None
        }
    }
}

fn write_pid(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, process::id().to_string())
}

fn is_process_running(pid: i32) -> bool {
    // Signal 0 only checks that the process exists; EPERM means it does.
    if unsafe { libc::kill(pid, 0) } == 0 {
        return true;
    }
    io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_writes_and_releases() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gridsnap.pid");
        {
            let _pid = PidFile::acquire(&path).unwrap();
            let written = fs::read_to_string(&path).unwrap();
            assert_eq!(written, process::id().to_string());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_garbage_pid_file_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gridsnap.pid");
        fs::write(&path, "not a pid").unwrap();
        assert!(PidFile::acquire(&path).is_ok());
    }

    #[test]
    fn test_live_process_blocks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gridsnap.pid");
        let own = process::id() as i32;
        fs::write(&path, own.to_string()).unwrap();
        let err = PidFile::acquire(&path).err();
        assert_eq!(err, Some(own));
        assert!(path.exists());
    }
}
