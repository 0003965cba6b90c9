//! Shared fixtures: a fake Val Town API and scripted CLI collaborators.
#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Response;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vtmcp::ApiClient;
use vtmcp::ApiToken;
use vtmcp::cli::{CliRunner, CommandOutput};
use vtmcp::executor::{ExecutionPreference, Executor};
use vtmcp::workspace::{Workspace, WorkspaceManager};

pub const TOKEN: &str = "test-token";

/// One request seen by [`FakeApi`].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Canned response for a method and path.
#[derive(Debug, Clone)]
pub struct Reply {
    status: u16,
    content_type: String,
    body: Vec<u8>,
}

impl Reply {
    pub fn json(body: Value) -> Self {
        Self {
            status: 200,
            content_type: "application/json".into(),
            body: serde_json::to_vec(&body).unwrap(),
        }
    }

    pub fn text(body: &str) -> Self {
        Self::bytes("text/plain; charset=utf-8", body.as_bytes().to_vec())
    }

    pub fn bytes(content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: content_type.into(),
            body,
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain".into(),
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            content_type: String::new(),
            body: Vec::new(),
        }
    }
}

#[derive(Default)]
struct Shared {
    routes: HashMap<(String, String), Reply>,
    requests: Vec<Recorded>,
}

/// A Val Town API stand-in on an ephemeral local port.
pub struct FakeApi {
    pub base: String,
    shared: Arc<Mutex<Shared>>,
}

impl FakeApi {
    pub async fn start() -> Self {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let app = Router::new().fallback(handle).with_state(shared.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base: format!("http://{addr}"),
            shared,
        }
    }

    /// Answer `method path` (path as sent, percent-encoded) with `reply`.
    pub fn reply(&self, method: &str, path: &str, reply: Reply) {
        self.shared
            .lock()
            .unwrap()
            .routes
            .insert((method.into(), path.into()), reply);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.shared.lock().unwrap().requests.clone()
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base)
            .unwrap()
            .with_token(ApiToken::new(TOKEN))
    }
}

async fn handle(State(shared): State<Arc<Mutex<Shared>>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = to_bytes(body, usize::MAX).await.unwrap().to_vec();
    let method = parts.method.to_string();
    let path = parts.uri.path().to_string();

    let mut shared = shared.lock().unwrap();
    shared.requests.push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query: parts.uri.query().map(str::to_owned),
        headers: parts.headers.clone(),
        body,
    });
    let reply = shared
        .routes
        .get(&(method, path))
        .cloned()
        .unwrap_or_else(|| Reply::status(404, "no such route"));

    let mut response = Response::builder().status(StatusCode::from_u16(reply.status).unwrap());
    if !reply.content_type.is_empty() {
        response = response.header(header::CONTENT_TYPE, reply.content_type);
    }
    response.body(Body::from(reply.body)).unwrap()
}

/// A `vt` stand-in answering by subcommand.
#[derive(Default)]
pub struct ScriptedCli {
    pub available: bool,
    outputs: Mutex<HashMap<String, CommandOutput>>,
    calls: Mutex<Vec<(Vec<String>, Option<PathBuf>)>>,
    pub probes: AtomicUsize,
}

impl ScriptedCli {
    pub fn available() -> Self {
        Self {
            available: true,
            ..Default::default()
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Output for every invocation whose first argument is `command`.
    pub fn on(self, command: &str, output: CommandOutput) -> Self {
        self.outputs.lock().unwrap().insert(command.into(), output);
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(args, _)| args.clone())
            .collect()
    }

    pub fn cwds(&self) -> Vec<Option<PathBuf>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, cwd)| cwd.clone())
            .collect()
    }
}

impl CliRunner for ScriptedCli {
    async fn is_available(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.available
    }

    async fn run(&self, args: &[&str], cwd: Option<&Path>) -> CommandOutput {
        self.calls.lock().unwrap().push((
            args.iter().map(|a| a.to_string()).collect(),
            cwd.map(Path::to_path_buf),
        ));
        self.outputs
            .lock()
            .unwrap()
            .get(args[0])
            .cloned()
            .unwrap_or_else(|| CommandOutput::ok(""))
    }
}

/// Real directories seeded with files, counted on acquire and release.
pub struct SeededWorkspaces {
    base: tempfile::TempDir,
    files: Vec<(&'static str, &'static str)>,
    fail: bool,
    pub acquired: AtomicUsize,
    pub released: AtomicUsize,
}

impl SeededWorkspaces {
    pub fn new(files: &[(&'static str, &'static str)]) -> Self {
        Self {
            base: tempfile::tempdir().unwrap(),
            files: files.to_vec(),
            fail: false,
            acquired: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }

    /// Directories currently on disk.
    pub fn live(&self) -> usize {
        std::fs::read_dir(self.base.path()).unwrap().count()
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl WorkspaceManager for SeededWorkspaces {
    async fn acquire(&self, val_id: &str) -> Result<Workspace, vtmcp::Error> {
        if self.fail {
            return Err(vtmcp::Error::Cli(format!("vt clone {val_id} failed")));
        }
        let n = self.acquired.fetch_add(1, Ordering::SeqCst);
        let root = self.base.path().join(format!("ws-{n}"));
        std::fs::create_dir_all(root.join(".vt")).unwrap();
        for (path, content) in &self.files {
            let file = root.join(path);
            std::fs::create_dir_all(file.parent().unwrap()).unwrap();
            std::fs::write(file, content).unwrap();
        }
        Ok(Workspace::new(root))
    }

    fn release(&self, workspace: &Workspace) -> Result<(), vtmcp::Error> {
        self.released.fetch_add(1, Ordering::SeqCst);
        match std::fs::remove_dir_all(workspace.root()) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

pub fn executor<C: CliRunner, W: WorkspaceManager>(
    prefer_cli: bool,
    cli: C,
    workspaces: W,
) -> Executor<C, W> {
    let preference = ExecutionPreference {
        prefer_cli,
        cli_path: "vt".into(),
        command_timeout: Duration::from_secs(10),
    };
    Executor::new(preference, cli, workspaces)
}
