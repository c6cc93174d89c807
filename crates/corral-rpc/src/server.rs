//! Unix socket server for the lifecycle service.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use corral_common::error::{CorralError, FailureCategory, Result};
use corral_runtime::service::LifecycleService;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};

use crate::protocol::{self, Request, Response};

/// Longest request line accepted, newline included.
pub const MAX_REQUEST_BYTES: u64 = 1 << 20;

/// A bound daemon endpoint.
pub struct Server {
    listener: UnixListener,
    socket_path: PathBuf,
    service: Arc<LifecycleService>,
}

impl Server {
    /// Binds the socket, replacing a stale socket file left by a previous run.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Io`] if the socket cannot be bound.
    pub fn bind(socket_path: &Path, service: Arc<LifecycleService>) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CorralError::io(parent, e))?;
        }
        match std::fs::remove_file(socket_path) {
            Ok(()) => tracing::debug!(path = %socket_path.display(), "removed stale socket"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(CorralError::io(socket_path, e)),
        }

        let listener = UnixListener::bind(socket_path).map_err(|e| CorralError::io(socket_path, e))?;
        tracing::info!(path = %socket_path.display(), "daemon listening");
        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
            service,
        })
    }

    /// Path of the bound socket.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Accepts connections until `shutdown` resolves, then removes the
    /// socket file. Each connection is served on its own task.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Io`] if accepting a connection fails.
    pub async fn serve(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);
        let result = loop {
            tokio::select! {
                () = &mut shutdown => break Ok(()),
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        let service = Arc::clone(&self.service);
                        drop(tokio::spawn(async move {
                            if let Err(err) = handle_connection(stream, service).await {
                                tracing::warn!(error = %err, "connection closed with error");
                            }
                        }));
                    }
                    Err(e) => break Err(CorralError::io(&self.socket_path, e)),
                },
            }
        };

        if let Err(e) = std::fs::remove_file(&self.socket_path) {
            tracing::debug!(error = %e, "socket file already gone");
        }
        tracing::info!("daemon stopped");
        result
    }
}

async fn handle_connection(stream: UnixStream, service: Arc<LifecycleService>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        let read = (&mut reader)
            .take(MAX_REQUEST_BYTES + 1)
            .read_until(b'\n', &mut line)
            .await
            .map_err(transport)?;
        if read == 0 {
            break;
        }

        // Without a newline inside the limit there is no way to resync.
        let oversized = line.len() as u64 > MAX_REQUEST_BYTES && !line.ends_with(b"\n");
        let response = if oversized {
            tracing::warn!(limit = MAX_REQUEST_BYTES, "request line too long, closing connection");
            malformed(format!("request exceeds {MAX_REQUEST_BYTES} bytes"))
        } else {
            let Ok(text) = std::str::from_utf8(&line) else {
                write_response(&mut writer, &malformed("request is not valid UTF-8".into())).await?;
                continue;
            };
            if text.trim().is_empty() {
                continue;
            }
            match protocol::decode::<Request>(text.trim_end()) {
                Ok(request) => dispatch(Arc::clone(&service), request).await,
                Err(err) => {
                    tracing::debug!(error = %err, "malformed request");
                    malformed(err.to_string())
                }
            }
        };
        write_response(&mut writer, &response).await?;
        if oversized {
            break;
        }
    }
    Ok(())
}

async fn write_response(writer: &mut OwnedWriteHalf, response: &Response) -> Result<()> {
    writer
        .write_all(&protocol::encode(response)?)
        .await
        .map_err(transport)
}

const fn malformed(message: String) -> Response {
    Response::Error {
        category: FailureCategory::InvalidRequest,
        message,
    }
}

fn transport(e: std::io::Error) -> CorralError {
    CorralError::Transport {
        message: e.to_string(),
    }
}

/// Runs a request on the blocking pool; the service holds a synchronous
/// lock across external runtime invocations.
async fn dispatch(service: Arc<LifecycleService>, request: Request) -> Response {
    tokio::task::spawn_blocking(move || handle(&service, request))
        .await
        .unwrap_or_else(|join_err| Response::Error {
            category: FailureCategory::Internal,
            message: format!("request handler failed: {join_err}"),
        })
}

/// Executes one request against the service.
#[must_use]
pub fn handle(service: &LifecycleService, request: Request) -> Response {
    let outcome = match request {
        Request::Create {
            image,
            name,
            command,
        } => service
            .create(&image, &name, &command)
            .map(|container_id| Response::Created { container_id }),
        Request::Start { container_id } => service.start(&container_id).map(applied),
        Request::Stop { container_id } => service.stop(&container_id).map(applied),
        Request::Delete { container_id } => service.delete(&container_id).map(applied),
        Request::Exec {
            container_id,
            command,
        } => service
            .exec(&container_id, &command)
            .map(|reply| Response::Exec {
                output: reply.output,
                success: reply.success,
            }),
        Request::List => service
            .list()
            .map(|containers| Response::List { containers }),
        Request::GetLogs { container_id } => {
            service.get_logs(&container_id).map(|reply| Response::Logs {
                logs: reply.logs,
                success: reply.success,
            })
        }
    };
    outcome.unwrap_or_else(|err| Response::from_error(&err))
}

const fn applied(success: bool) -> Response {
    Response::Applied { success }
}
