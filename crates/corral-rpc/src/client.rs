//! Async client for the daemon socket.

use std::path::{Path, PathBuf};

use corral_common::error::{CorralError, Result};
use corral_common::types::{ContainerId, ContainerSummary};
use corral_runtime::service::{ExecReply, LogsReply};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};

use crate::protocol::{self, Request, Response};

/// One connection to the daemon. Requests are sent one at a time.
pub struct Client {
    socket_path: PathBuf,
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    /// Connects to the daemon listening on `socket_path`.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Io`] if the socket cannot be reached.
    pub async fn connect(socket_path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(socket_path)
            .await
            .map_err(|e| CorralError::io(socket_path, e))?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            socket_path: socket_path.to_path_buf(),
            lines: BufReader::new(reader).lines(),
            writer,
        })
    }

    /// Creates a container and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns the daemon's error or a transport failure.
    pub async fn create(&mut self, image: &str, name: &str, command: &str) -> Result<ContainerId> {
        let request = Request::Create {
            image: image.to_string(),
            name: name.to_string(),
            command: command.to_string(),
        };
        match self.call(&request).await? {
            Response::Created { container_id } => Ok(container_id),
            other => Err(unexpected(&other)),
        }
    }

    /// Starts a container.
    ///
    /// # Errors
    ///
    /// Returns the daemon's error or a transport failure.
    pub async fn start(&mut self, id: &ContainerId) -> Result<bool> {
        self.applied(Request::Start {
            container_id: id.clone(),
        })
        .await
    }

    /// Stops a container.
    ///
    /// # Errors
    ///
    /// Returns the daemon's error or a transport failure.
    pub async fn stop(&mut self, id: &ContainerId) -> Result<bool> {
        self.applied(Request::Stop {
            container_id: id.clone(),
        })
        .await
    }

    /// Deletes a container.
    ///
    /// # Errors
    ///
    /// Returns the daemon's error or a transport failure.
    pub async fn delete(&mut self, id: &ContainerId) -> Result<bool> {
        self.applied(Request::Delete {
            container_id: id.clone(),
        })
        .await
    }

    /// Runs a command inside a running container.
    ///
    /// # Errors
    ///
    /// Returns the daemon's error or a transport failure.
    pub async fn exec(&mut self, id: &ContainerId, command: &str) -> Result<ExecReply> {
        let request = Request::Exec {
            container_id: id.clone(),
            command: command.to_string(),
        };
        match self.call(&request).await? {
            Response::Exec { output, success } => Ok(ExecReply { output, success }),
            other => Err(unexpected(&other)),
        }
    }

    /// Lists every registered container.
    ///
    /// # Errors
    ///
    /// Returns the daemon's error or a transport failure.
    pub async fn list(&mut self) -> Result<Vec<ContainerSummary>> {
        match self.call(&Request::List).await? {
            Response::List { containers } => Ok(containers),
            other => Err(unexpected(&other)),
        }
    }

    /// Fetches a container's runtime log.
    ///
    /// # Errors
    ///
    /// Returns the daemon's error or a transport failure.
    pub async fn get_logs(&mut self, id: &ContainerId) -> Result<LogsReply> {
        let request = Request::GetLogs {
            container_id: id.clone(),
        };
        match self.call(&request).await? {
            Response::Logs { logs, success } => Ok(LogsReply { logs, success }),
            other => Err(unexpected(&other)),
        }
    }

    async fn applied(&mut self, request: Request) -> Result<bool> {
        match self.call(&request).await? {
            Response::Applied { success } => Ok(success),
            other => Err(unexpected(&other)),
        }
    }

    /// Sends one request and waits for its response. Error responses are
    /// turned into [`CorralError::Remote`].
    async fn call(&mut self, request: &Request) -> Result<Response> {
        self.writer
            .write_all(&protocol::encode(request)?)
            .await
            .map_err(|e| CorralError::io(&self.socket_path, e))?;

        let line = self
            .lines
            .next_line()
            .await
            .map_err(|e| CorralError::io(&self.socket_path, e))?
            .ok_or_else(|| CorralError::Transport {
                message: "daemon closed the connection".into(),
            })?;

        match protocol::decode::<Response>(&line)? {
            Response::Error { category, message } => Err(CorralError::Remote { category, message }),
            response => Ok(response),
        }
    }
}

fn unexpected(response: &Response) -> CorralError {
    CorralError::Transport {
        message: format!("unexpected response: {response:?}"),
    }
}
