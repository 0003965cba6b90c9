//! Ephemeral val checkouts for the CLI path.
//!
//! Every operation that goes through the CLI gets its own directory, holding a
//! fresh `vt clone` of the target val. The directory never outlives the
//! operation: [`WorkspaceGuard`] releases it on drop, so success, fallback,
//! error and cancellation all clean up.

use crate::cli::CliRunner;
use crate::error::Error;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Prefix of every workspace directory name.
pub const WORKSPACE_PREFIX: &str = "vtmcp-";

/// A private local checkout of one val.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Creates and destroys workspaces.
pub trait WorkspaceManager: Send + Sync {
    /// Check out `val_id` into a new private workspace.
    ///
    /// On failure nothing is left behind.
    fn acquire(&self, val_id: &str) -> impl Future<Output = Result<Workspace, Error>> + Send;

    /// Delete the workspace. Releasing a missing workspace is a no-op.
    ///
    /// Blocks; used from `Drop`, where nothing can be awaited.
    fn release(&self, workspace: &Workspace) -> Result<(), Error>;

    /// [`release`](Self::release) without blocking the runtime.
    fn release_async(
        &self,
        workspace: &Workspace,
    ) -> impl Future<Output = Result<(), Error>> + Send {
        async move { self.release(workspace) }
    }

    /// An empty private directory for commands that create their own checkout.
    fn scratch(&self) -> Result<Workspace, Error> {
        let workspace = Workspace::new(std::env::temp_dir().join(unique_name()));
        std::fs::create_dir_all(workspace.root())?;
        Ok(workspace)
    }
}

fn unique_name() -> String {
    format!("{WORKSPACE_PREFIX}{}", uuid::Uuid::new_v4())
}

/// Workspaces produced by `vt clone` under a base directory.
#[derive(Debug, Clone)]
pub struct CloneWorkspaces<C> {
    cli: C,
    base: PathBuf,
}

impl<C> CloneWorkspaces<C> {
    pub fn new(cli: C, base: impl Into<PathBuf>) -> Self {
        Self {
            cli,
            base: base.into(),
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl<C: CliRunner> WorkspaceManager for CloneWorkspaces<C> {
    async fn acquire(&self, val_id: &str) -> Result<Workspace, Error> {
        let workspace = Workspace::new(self.base.join(unique_name()));
        let target = workspace.root().to_string_lossy().into_owned();
        // `vt clone` creates the directory; it is ours from here on, even if
        // this future is dropped mid-clone.
        let pending = WorkspaceGuard::new(self, workspace.clone());
        let out = self.cli.run(&["clone", val_id, &target], None).await;

        let failure = if !out.success {
            Some(format!("vt clone {val_id} failed: {}", out.reason()))
        } else if !workspace.root().is_dir() {
            Some(format!("vt clone {val_id} did not create {target}"))
        } else {
            None
        };
        match failure {
            None => {
                pending.disarm();
                Ok(workspace)
            }
            Some(reason) => {
                pending.release().await;
                Err(Error::Cli(reason))
            }
        }
    }

    fn scratch(&self) -> Result<Workspace, Error> {
        let workspace = Workspace::new(self.base.join(unique_name()));
        std::fs::create_dir_all(workspace.root())?;
        Ok(workspace)
    }

    fn release(&self, workspace: &Workspace) -> Result<(), Error> {
        missing_is_released(std::fs::remove_dir_all(workspace.root()))
    }

    async fn release_async(&self, workspace: &Workspace) -> Result<(), Error> {
        missing_is_released(tokio::fs::remove_dir_all(workspace.root()).await)
    }
}

fn missing_is_released(result: std::io::Result<()>) -> Result<(), Error> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Owns an acquired workspace and releases it exactly once.
pub struct WorkspaceGuard<'a, W: WorkspaceManager> {
    manager: &'a W,
    workspace: Option<Workspace>,
}

impl<'a, W: WorkspaceManager> WorkspaceGuard<'a, W> {
    pub fn new(manager: &'a W, workspace: Workspace) -> Self {
        Self {
            manager,
            workspace: Some(workspace),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.workspace.as_ref().map(Workspace::root)
    }

    /// Release now instead of at drop.
    ///
    /// If this future is dropped before it completes, `Drop` still removes
    /// the workspace.
    pub async fn release(mut self) {
        let Some(workspace) = self.workspace.clone() else {
            return;
        };
        let result = self.manager.release_async(&workspace).await;
        self.workspace = None;
        log_release(&workspace, result);
    }

    /// Hand the workspace over to the caller without deleting it.
    pub fn disarm(mut self) {
        self.workspace = None;
    }

    fn finish(&mut self) {
        if let Some(workspace) = self.workspace.take() {
            let result = self.manager.release(&workspace);
            log_release(&workspace, result);
        }
    }
}

fn log_release(workspace: &Workspace, result: Result<(), Error>) {
    match result {
        Ok(()) => tracing::debug!(root = %workspace.root().display(), "released workspace"),
        Err(e) => tracing::warn!(
            root = %workspace.root().display(),
            error = %e,
            "failed to release workspace"
        ),
    }
}

impl<W: WorkspaceManager> Drop for WorkspaceGuard<'_, W> {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Map a val-relative path into `root`, refusing anything that escapes it.
///
/// The deepest existing ancestor is canonicalized, so symlinks inside the
/// checkout cannot point the operation outside of it.
pub fn resolve(root: &Path, relative: &str) -> Result<PathBuf, Error> {
    check_relative(relative)?;
    let root = root.canonicalize()?;
    let joined = root.join(relative.trim_start_matches('/'));

    let mut existing = joined.as_path();
    let mut rest = Vec::new();
    while !existing.exists() {
        let name = existing
            .file_name()
            .ok_or_else(|| Error::invalid(format!("cannot resolve {relative}")))?;
        rest.push(name.to_os_string());
        existing = existing
            .parent()
            .ok_or_else(|| Error::invalid(format!("cannot resolve {relative}")))?;
    }
    let mut resolved = existing.canonicalize()?;
    if !resolved.starts_with(&root) {
        return Err(Error::invalid(format!("{relative} escapes the val")));
    }
    for name in rest.into_iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

/// Val paths are relative, NUL-free and never step upwards.
pub fn check_relative(path: &str) -> Result<(), Error> {
    if path.contains('\0') {
        return Err(Error::invalid("path contains null byte"));
    }
    let candidate = Path::new(path.trim_start_matches('/'));
    for component in candidate.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return Err(Error::invalid(format!("path not allowed: {path}"))),
        }
    }
    Ok(())
}
