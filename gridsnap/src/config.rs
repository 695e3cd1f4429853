use std::env;
use std::path::PathBuf;

const APP_NAME: &str = "gridsnap";

/// Where the daemon and the CLI keep their files.
#[derive(Debug, Clone)]
pub struct Paths {
    pub data_dir: PathBuf,
    pub socket: PathBuf,
    pub pid_file: PathBuf,
}

impl Paths {
    /// `GRIDSNAP_DATA_DIR` and `GRIDSNAP_SOCKET` override the platform defaults.
    pub fn resolve() -> Self {
        let data_dir = env::var_os("GRIDSNAP_DATA_DIR")
            .map(PathBuf::from)
            .or_else(|| dirs::data_dir().map(|d| d.join(APP_NAME)))
            .unwrap_or_else(|| env::temp_dir().join(APP_NAME));
        let runtime_dir = dirs::runtime_dir().unwrap_or_else(env::temp_dir);
        let socket = env::var_os("GRIDSNAP_SOCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|| runtime_dir.join(format!("{}.sock", APP_NAME)));

        Self {
            pid_file: runtime_dir.join(format!("{}.pid", APP_NAME)),
            data_dir,
            socket,
        }
    }

    pub fn preferences(&self) -> PathBuf {
        self.data_dir.join("preferences.json")
    }

    pub fn layouts(&self) -> PathBuf {
        self.data_dir.join("layouts.json")
    }

    pub fn desktop(&self) -> PathBuf {
        self.data_dir.join("desktop.json")
    }
}
