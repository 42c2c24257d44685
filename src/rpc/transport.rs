use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{
    response_error, tool_call_text, LineBuffer, PendingRequests, RpcNotification, RpcRequest,
    HANDSHAKE_ID, PROTOCOL_VERSION,
};
use crate::error::{GraphHookError, Result};

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// The duplex byte streams of one backend connection.
pub struct Pipes {
    pub reader: BoxedReader,
    pub writer: BoxedWriter,
    /// Killed when the connection is stopped. `None` for in-memory transports.
    pub child: Option<Child>,
}

/// Opens the byte streams for a new connection epoch.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, cwd: &Path) -> Result<Pipes>;
}

/// Spawns `<command...> mcp` with stdin/stdout piped.
pub struct ProcessConnector {
    command: Vec<String>,
}

impl ProcessConnector {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl Connector for ProcessConnector {
    async fn connect(&self, cwd: &Path) -> Result<Pipes> {
        let (program, args) = self.command.split_first().ok_or(GraphHookError::EmptyCommand)?;

        let mut child = Command::new(program)
            .args(args)
            .arg("mcp")
            .current_dir(cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| GraphHookError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or_else(|| GraphHookError::Rpc {
            reason: "child stdin unavailable".into(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| GraphHookError::Rpc {
            reason: "child stdout unavailable".into(),
        })?;

        info!(program = %program, cwd = %cwd.display(), "spawned graph backend");
        Ok(Pipes {
            reader: Box::new(stdout),
            writer: Box::new(stdin),
            child: Some(child),
        })
    }
}

/// Observable lifecycle of the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Unstarted,
    Starting,
    Ready,
    Closed,
    Errored,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Unstarted => write!(f, "unstarted"),
            ConnectionState::Starting => write!(f, "starting"),
            ConnectionState::Ready => write!(f, "ready"),
            ConnectionState::Closed => write!(f, "closed"),
            ConnectionState::Errored => write!(f, "errored"),
        }
    }
}

/// One live backend connection: writer, pending map, read loop, child handle.
struct Connection {
    writer: tokio::sync::Mutex<BoxedWriter>,
    pending: Arc<PendingRequests>,
    next_id: AtomicU64,
    child: Mutex<Option<Child>>,
    reader_task: JoinHandle<()>,
}

impl Connection {
    fn attach(pipes: Pipes) -> Arc<Self> {
        let pending = Arc::new(PendingRequests::new());
        let reader_task = tokio::spawn(read_loop(pipes.reader, pending.clone()));
        Arc::new(Self {
            writer: tokio::sync::Mutex::new(pipes.writer),
            pending,
            next_id: AtomicU64::new(HANDSHAKE_ID + 1),
            child: Mutex::new(pipes.child),
            reader_task,
        })
    }

    fn is_closed(&self) -> bool {
        self.pending.is_closed()
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.request_with_id(id, method, params).await
    }

    async fn request_with_id(&self, id: u64, method: &str, params: Value) -> Result<Value> {
        let line = serde_json::to_string(&RpcRequest::new(id, method, params))?;
        let rx = self
            .pending
            .register(id)
            .ok_or(GraphHookError::ConnectionClosed)?;

        if let Err(e) = self.write_line(&line).await {
            self.pending.cancel(id);
            return Err(GraphHookError::Rpc {
                reason: format!("write failed: {e}"),
            });
        }

        rx.await.map_err(|_| GraphHookError::ConnectionClosed)
    }

    async fn notify(&self, method: &str) -> Result<()> {
        let line = serde_json::to_string(&RpcNotification::new(method))?;
        self.write_line(&line).await.map_err(|e| GraphHookError::Rpc {
            reason: format!("write failed: {e}"),
        })
    }

    async fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(format!("{line}\n").as_bytes()).await?;
        writer.flush().await
    }

    fn shutdown(&self) {
        let failed = self.pending.close();
        if failed > 0 {
            debug!(failed, "failed pending calls on shutdown");
        }
        let mut child = self.child.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(child) = child.as_mut() {
            let _ = child.start_kill();
        }
        self.reader_task.abort();
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

/// Feed backend output through the line framer until EOF, then fail whatever is left.
async fn read_loop(mut reader: BoxedReader, pending: Arc<PendingRequests>) {
    let mut framing = LineBuffer::new();
    let mut chunk = vec![0u8; 8192];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                for line in framing.push(&chunk[..n]) {
                    pending.resolve_line(&line);
                }
            }
            Err(e) => {
                warn!(error = %e, "graph backend read failed");
                break;
            }
        }
    }
    let failed = pending.close();
    debug!(failed, "graph backend stream closed");
}

type Startup = Shared<BoxFuture<'static, Option<Arc<Connection>>>>;

enum Slot {
    Unstarted,
    Starting { epoch: u64, startup: Startup },
    Ready(Arc<Connection>),
    Closed,
    Errored,
}

/// Lazily connected JSON-RPC client bound to one working directory.
///
/// The first call starts a connection epoch; concurrent callers share that
/// startup. After a close or failed startup the next call starts a new epoch.
pub struct RpcTransport {
    connector: Arc<dyn Connector>,
    cwd: PathBuf,
    client_name: String,
    startup_timeout: Duration,
    slot: Mutex<Slot>,
    epoch: AtomicU64,
}

impl RpcTransport {
    pub fn new(connector: Arc<dyn Connector>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            connector,
            cwd: cwd.into(),
            client_name: "graph-hook".into(),
            startup_timeout: Duration::from_secs(30),
            slot: Mutex::new(Slot::Unstarted),
            epoch: AtomicU64::new(0),
        }
    }

    /// Transport that spawns `<command...> mcp` in `cwd`.
    pub fn spawning(command: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(ProcessConnector::new(command)), cwd)
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    pub fn working_directory(&self) -> &Path {
        &self.cwd
    }

    pub fn state(&self) -> ConnectionState {
        let slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        match &*slot {
            Slot::Unstarted => ConnectionState::Unstarted,
            Slot::Starting { .. } => ConnectionState::Starting,
            Slot::Ready(conn) if conn.is_closed() => ConnectionState::Closed,
            Slot::Ready(_) => ConnectionState::Ready,
            Slot::Closed => ConnectionState::Closed,
            Slot::Errored => ConnectionState::Errored,
        }
    }

    /// Call a backend tool. `None` on every failure and on empty results.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Option<String> {
        let response = self
            .call("tools/call", json!({ "name": name, "arguments": arguments }))
            .await?;
        tool_call_text(&response)
    }

    /// Raw request/response. `None` if the connection can't be established or closes first.
    pub async fn call(&self, method: &str, params: Value) -> Option<Value> {
        let conn = self.connection().await?;
        match conn.request(method, params).await {
            Ok(response) => Some(response),
            Err(e) => {
                debug!(method, error = %e, "rpc call failed");
                None
            }
        }
    }

    /// Tear down the current connection. Pending calls resolve empty.
    pub fn stop(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        match &*slot {
            Slot::Ready(conn) => {
                conn.shutdown();
                *slot = Slot::Closed;
            }
            Slot::Starting { .. } => *slot = Slot::Closed,
            _ => {}
        }
    }

    async fn connection(&self) -> Option<Arc<Connection>> {
        let (epoch, startup) = {
            let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
            match &*slot {
                Slot::Ready(conn) if !conn.is_closed() => return Some(conn.clone()),
                Slot::Starting { epoch, startup } => (*epoch, startup.clone()),
                _ => {
                    let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
                    let startup = start(
                        self.connector.clone(),
                        self.cwd.clone(),
                        self.client_name.clone(),
                        self.startup_timeout,
                    )
                    .boxed()
                    .shared();
                    *slot = Slot::Starting {
                        epoch,
                        startup: startup.clone(),
                    };
                    (epoch, startup)
                }
            }
        };

        let outcome = startup.await;

        let conn = {
            let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
            match &*slot {
                Slot::Starting { epoch: current, .. } if *current == epoch => {
                    *slot = match &outcome {
                        Some(conn) => Slot::Ready(conn.clone()),
                        None => Slot::Errored,
                    };
                    return outcome;
                }
                // Another waiter of this epoch already stored it.
                Slot::Ready(ready) if outcome.as_ref().is_some_and(|c| Arc::ptr_eq(ready, c)) => {
                    return outcome;
                }
                _ => outcome?,
            }
        };

        // Stopped or superseded while starting; nothing tracks this connection.
        debug!(epoch, "discarding connection from a stopped startup");
        conn.shutdown();
        None
    }
}

impl Drop for RpcTransport {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn start(
    connector: Arc<dyn Connector>,
    cwd: PathBuf,
    client_name: String,
    timeout: Duration,
) -> Option<Arc<Connection>> {
    match tokio::time::timeout(timeout, handshake(connector, &cwd, &client_name)).await {
        Ok(Ok(conn)) => Some(conn),
        Ok(Err(e)) => {
            warn!(error = %e, cwd = %cwd.display(), "graph backend startup failed");
            None
        }
        Err(_) => {
            warn!(
                timeout_secs = timeout.as_secs(),
                "graph backend startup timed out"
            );
            None
        }
    }
}

async fn handshake(
    connector: Arc<dyn Connector>,
    cwd: &Path,
    client_name: &str,
) -> Result<Arc<Connection>> {
    let pipes = connector.connect(cwd).await?;
    let conn = Connection::attach(pipes);

    let params = json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {},
        "clientInfo": {
            "name": client_name,
            "version": env!("CARGO_PKG_VERSION"),
        },
    });

    let response = match conn.request_with_id(HANDSHAKE_ID, "initialize", params).await {
        Ok(response) => response,
        Err(e) => {
            conn.shutdown();
            return Err(GraphHookError::Handshake {
                reason: e.to_string(),
            });
        }
    };

    if let Some(err) = response_error(&response) {
        conn.shutdown();
        return Err(GraphHookError::Handshake {
            reason: format!("{} ({})", err.message, err.code),
        });
    }

    if let Err(e) = conn.notify("notifications/initialized").await {
        conn.shutdown();
        return Err(e);
    }

    debug!("graph backend handshake complete");
    Ok(conn)
}
