//! Client/server round trips over a real Unix socket.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use corral_common::config::CorralConfig;
use corral_common::error::{CorralError, FailureCategory, Result};
use corral_common::types::{ContainerId, ContainerState};
use corral_rpc::server::MAX_REQUEST_BYTES;
use corral_rpc::{Client, Server};
use corral_runtime::invoker::{Invocation, RuntimeInvoker, Signal};
use corral_runtime::service::LifecycleService;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Runtime double that always succeeds and echoes `echo` commands.
struct EchoRuntime;

impl RuntimeInvoker for EchoRuntime {
    fn run(&self, _id: &ContainerId, _bundle: &Path, log_path: &Path) -> Result<Invocation> {
        std::fs::write(log_path, "runtime log line\n").unwrap();
        Ok(Invocation::succeeded(""))
    }

    fn kill(&self, _id: &ContainerId, _signal: Signal) -> Result<Invocation> {
        Ok(Invocation::succeeded(""))
    }

    fn exec(&self, _id: &ContainerId, command: &str) -> Result<Invocation> {
        let text = command.strip_prefix("echo ").unwrap_or_default();
        Ok(Invocation::succeeded(format!("{text}\n")))
    }

    fn remove(&self, _id: &ContainerId) -> Result<Invocation> {
        Ok(Invocation::succeeded(""))
    }
}

struct Daemon {
    _dir: tempfile::TempDir,
    socket: PathBuf,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<Result<()>>,
}

fn spawn_daemon() -> Daemon {
    let dir = tempfile::tempdir().unwrap();
    let socket = dir.path().join("corral.sock");
    let config = CorralConfig {
        scratch_root: dir.path().join("scratch"),
        socket_path: socket.clone(),
        ..CorralConfig::default()
    };
    let service = Arc::new(LifecycleService::with_invoker(&config, Box::new(EchoRuntime)).unwrap());
    let server = Server::bind(&socket, service).unwrap();

    let (shutdown, signal) = oneshot::channel::<()>();
    let task = tokio::spawn(server.serve(async move {
        let _ = signal.await;
    }));
    Daemon {
        _dir: dir,
        socket,
        shutdown,
        task,
    }
}

#[tokio::test]
async fn lifecycle_over_socket() {
    let daemon = spawn_daemon();
    let mut client = Client::connect(&daemon.socket).await.unwrap();

    let id = client.create("alpine.img", "web", "echo hi").await.unwrap();
    let listed = client.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, id);
    assert_eq!(listed[0].status, ContainerState::Created);

    assert!(client.start(&id).await.unwrap());
    let exec = client.exec(&id, "echo hi").await.unwrap();
    assert!(exec.success);
    assert!(exec.output.contains("hi"));

    let logs = client.get_logs(&id).await.unwrap();
    assert!(logs.success);
    assert!(logs.logs.contains("runtime log line"));

    assert!(!client.delete(&id).await.unwrap());
    assert!(client.stop(&id).await.unwrap());
    assert!(!client.stop(&id).await.unwrap());
    assert!(client.delete(&id).await.unwrap());
    assert!(client.list().await.unwrap().is_empty());

    daemon.shutdown.send(()).unwrap();
    daemon.task.await.unwrap().unwrap();
    assert!(!daemon.socket.exists());
}

#[tokio::test]
async fn invalid_create_is_reported_as_remote_error() {
    let daemon = spawn_daemon();
    let mut client = Client::connect(&daemon.socket).await.unwrap();

    let err = client.create("alpine.img", "", "echo hi").await.unwrap_err();
    match err {
        CorralError::Remote { category, message } => {
            assert_eq!(category, FailureCategory::InvalidRequest);
            assert!(message.contains("name"));
        }
        other => panic!("unexpected error: {other}"),
    }

    // The connection stays usable after an error response.
    assert!(client.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_line_gets_error_and_connection_survives() {
    let daemon = spawn_daemon();
    let stream = UnixStream::connect(&daemon.socket).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    writer.write_all(b"this is not json\n").await.unwrap();
    let reply = lines.next_line().await.unwrap().unwrap();
    assert!(reply.contains("\"kind\":\"error\""));
    assert!(reply.contains("invalid_request"));

    writer.write_all(b"{\"method\":\"list\"}\n").await.unwrap();
    let reply = lines.next_line().await.unwrap().unwrap();
    assert_eq!(reply, "{\"kind\":\"list\",\"containers\":[]}");
}

#[tokio::test]
async fn oversized_line_is_rejected_and_connection_closed() {
    let daemon = spawn_daemon();
    let stream = UnixStream::connect(&daemon.socket).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let payload = vec![b'a'; usize::try_from(MAX_REQUEST_BYTES).unwrap() + 16];
    let sender = tokio::spawn(async move {
        // The daemon may hang up before the tail is written.
        let _ = writer.write_all(&payload).await;
        writer
    });

    let reply = lines.next_line().await.unwrap().unwrap();
    assert!(reply.contains("\"kind\":\"error\""));
    assert!(reply.contains("invalid_request"));
    // Unread bytes may turn the hang-up into a reset instead of EOF.
    assert!(!matches!(lines.next_line().await, Ok(Some(_))));
    drop(sender.await.unwrap());

    // The daemon keeps serving other clients.
    let mut client = Client::connect(&daemon.socket).await.unwrap();
    assert!(client.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_container_yields_not_applicable() {
    let daemon = spawn_daemon();
    let mut client = Client::connect(&daemon.socket).await.unwrap();
    let ghost = ContainerId::new("ctr-ghost");

    assert!(!client.start(&ghost).await.unwrap());
    assert!(!client.exec(&ghost, "echo hi").await.unwrap().success);
    let logs = client.get_logs(&ghost).await.unwrap();
    assert!(!logs.success);
    assert_eq!(logs.logs, "No logs available");
}

#[tokio::test]
async fn concurrent_clients_create_distinct_containers() {
    const N: usize = 16;
    let daemon = spawn_daemon();

    let mut tasks = Vec::new();
    for i in 0..N {
        let socket = daemon.socket.clone();
        tasks.push(tokio::spawn(async move {
            let mut client = Client::connect(&socket).await.unwrap();
            client
                .create("alpine.img", &format!("c{i}"), "true")
                .await
                .unwrap()
        }));
    }
    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), N);

    let mut client = Client::connect(&daemon.socket).await.unwrap();
    assert_eq!(client.list().await.unwrap().len(), N);
}
