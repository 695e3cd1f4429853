use gridsnap_ipc::{Command, Response};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, watch};

use crate::error::Result;
use crate::handler::Handler;

const QUEUE_DEPTH: usize = 32;

/// JSON-lines socket server.
///
/// Connections are acknowledged as soon as a request is queued. A single
/// worker drains the queue, so reconciliations never overlap. `quit` closes
/// every open connection, so idle clients cannot hold the daemon up.
pub struct IpcServer {
    listener: UnixListener,
    path: PathBuf,
}

impl IpcServer {
    pub fn bind(path: &Path) -> Result<Self> {
        match fs::remove_file(path) {
            Ok(()) => tracing::debug!("Removed stale socket {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(path)?;
        tracing::info!("Listening on {}", path.display());
        Ok(Self {
            listener,
            path: path.to_path_buf(),
        })
    }

    /// Serves until a `quit` command arrives, then finishes queued requests.
    pub async fn run(self, handler: Arc<Handler>) -> Result<()> {
        let (tx, mut rx) = mpsc::channel::<Command>(QUEUE_DEPTH);
        let (shutdown, _) = watch::channel(false);
        let shutdown = Arc::new(shutdown);
        let mut stop = shutdown.subscribe();

        let worker = tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match handler.handle(command).await {
                    Ok(Some(report)) => tracing::info!(
                        "Request done: {} ok, {} failed",
                        report.succeeded(),
                        report.failures().count()
                    ),
                    Ok(None) => {}
                    Err(e) => tracing::error!("Request failed: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        tokio::spawn(serve_connection(stream, tx.clone(), shutdown.clone()));
                    }
                    Err(e) => tracing::warn!("Failed to accept connection: {}", e),
                },
                _ = stopped(&mut stop) => break,
            }
        }

        tracing::info!("Shutting down");
        drop(tx);
        if let Err(e) = worker.await {
            tracing::error!("Worker task ended abnormally: {}", e);
        }
        Ok(())
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

async fn stopped(stop: &mut watch::Receiver<bool>) {
    // A dropped sender also means the server is gone.
    let _ = stop.wait_for(|stopped| *stopped).await;
}

async fn serve_connection(
    stream: UnixStream,
    tx: mpsc::Sender<Command>,
    shutdown: Arc<watch::Sender<bool>>,
) {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut stop = shutdown.subscribe();

    loop {
        let next = tokio::select! {
            next = lines.next_line() => next,
            _ = stopped(&mut stop) => break,
        };
        let line = match next {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("Connection read error: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Command>(&line) {
            Ok(Command::Ping) => Response::Ok,
            Ok(Command::Quit) => {
                shutdown.send_replace(true);
                Response::Ok
            }
            Ok(command) => {
                tracing::debug!("Queued {:?}", command);
                match tx.send(command).await {
                    Ok(()) => Response::Ok,
                    Err(_) => Response::Error {
                        message: "daemon is shutting down".to_string(),
                    },
                }
            }
            Err(e) => Response::Error {
                message: format!("invalid command: {}", e),
            },
        };

        let mut json = match serde_json::to_vec(&response) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to encode response: {}", e);
                break;
            }
        };
        json.push(b'\n');
        if let Err(e) = writer.write_all(&json).await {
            tracing::debug!("Connection write error: {}", e);
            break;
        }
    }
}
