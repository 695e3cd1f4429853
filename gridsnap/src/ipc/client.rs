use anyhow::{Context, Result};
use gridsnap_ipc::{Command, Response};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;

pub struct IpcClient {
    stream: UnixStream,
}

impl IpcClient {
    pub fn connect(path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(path).with_context(|| {
            format!(
                "Failed to connect to gridsnap daemon at {} (is `gridsnap daemon` running?)",
                path.display()
            )
        })?;
        Ok(Self { stream })
    }

    pub fn send(&mut self, cmd: &Command) -> Result<Response> {
        let json = serde_json::to_string(cmd)?;
        writeln!(self.stream, "{}", json)?;
        self.stream.flush()?;

        let mut reader = BufReader::new(&self.stream);
        let mut line = String::new();
        reader.read_line(&mut line)?;

        let response: Response = serde_json::from_str(&line)
            .with_context(|| format!("Failed to parse daemon response: {}", line.trim()))?;
        Ok(response)
    }
}
