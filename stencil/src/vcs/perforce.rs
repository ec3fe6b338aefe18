//! Perforce implementation of [`VersionControl`] over the `p4` command line.
//!
//! Command shape: `p4 [-u user -c client] command [command options] [file]`. Client workspaces
//! for the current user are discovered once per workspace root and cached in
//! [`WorkspaceCache`]. Commands run through [`CommandRunner`] so tests can script `p4` output.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{PendingChangelist, VersionControl};
use crate::error::VcsError;

/// A client workspace owned by the current user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientWorkspace {
    pub user: String,
    pub workspace: String,
    pub root: String,
}

/// Captured output of an external command.
#[derive(Clone, Debug, Default)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runs an external program to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String], cwd: &Path)
        -> std::io::Result<CommandOutput>;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
    ) -> std::io::Result<CommandOutput> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .await?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Client workspaces keyed by workspace root, populated on first use.
///
/// Safe to share between concurrently applied targets: lookups take a read lock and the
/// first miss for a root populates it under the write lock exactly once.
#[derive(Debug, Default)]
pub struct WorkspaceCache {
    entries: RwLock<HashMap<PathBuf, Arc<Vec<ClientWorkspace>>>>,
}

impl WorkspaceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, root: &Path) -> Option<Arc<Vec<ClientWorkspace>>> {
        self.entries.read().await.get(root).cloned()
    }

    /// Returns the cached clients for `root`, running `populate` on a miss.
    ///
    /// A failed populate caches nothing, so the next call tries again.
    pub async fn get_or_try_populate<F, Fut>(
        &self,
        root: &Path,
        populate: F,
    ) -> Result<Arc<Vec<ClientWorkspace>>, VcsError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<ClientWorkspace>, VcsError>>,
    {
        if let Some(hit) = self.get(root).await {
            return Ok(hit);
        }
        let mut entries = self.entries.write().await;
        if let Some(hit) = entries.get(root) {
            return Ok(hit.clone());
        }
        let clients = Arc::new(populate().await?);
        entries.insert(root.to_path_buf(), clients.clone());
        Ok(clients)
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

/// Perforce client for one workspace root.
pub struct PerforceClient<R = ProcessRunner> {
    runner: R,
    exe: String,
    workspace_root: PathBuf,
    cache: WorkspaceCache,
}

impl PerforceClient<ProcessRunner> {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self::with_runner(ProcessRunner, workspace_root)
    }
}

impl<R: CommandRunner> PerforceClient<R> {
    pub fn with_runner(runner: R, workspace_root: impl Into<PathBuf>) -> Self {
        let exe = if cfg!(windows) { "p4.exe" } else { "p4" };
        Self {
            runner,
            exe: exe.to_string(),
            workspace_root: workspace_root.into(),
            cache: WorkspaceCache::new(),
        }
    }

    pub fn cache(&self) -> &WorkspaceCache {
        &self.cache
    }

    /// Runs `p4 <args>` in the workspace root; returns stdout. Any stderr output is a failure.
    async fn send(&self, args: Vec<String>) -> Result<String, VcsError> {
        let command = format!("{} {}", self.exe, args.join(" "));
        tracing::debug!(command = %command, "p4");
        let output = self
            .runner
            .run(&self.exe, &args, &self.workspace_root)
            .await
            .map_err(|source| VcsError::Spawn {
                command: command.clone(),
                source,
            })?;
        let stderr = output.stderr.trim();
        if !stderr.is_empty() || !output.success {
            return Err(VcsError::CommandFailed {
                command,
                stderr: stderr.to_string(),
            });
        }
        Ok(output.stdout)
    }

    async fn clients(&self) -> Result<Arc<Vec<ClientWorkspace>>, VcsError> {
        self.cache
            .get_or_try_populate(&self.workspace_root, || async {
                let args = vec!["clients".to_string(), "--me".to_string()];
                let stdout = self.send(args).await?;
                if stdout.trim().is_empty() {
                    return Err(VcsError::NoOutput {
                        command: format!("{} clients --me", self.exe),
                    });
                }
                let clients = parse_clients(&stdout);
                tracing::debug!(count = clients.len(), "p4 clients discovered");
                Ok(clients)
            })
            .await
    }

    async fn owning_client(&self, path: &Path) -> Result<ClientWorkspace, VcsError> {
        let clients = self.clients().await?;
        find_client_for_path(&clients, path)
            .cloned()
            .ok_or_else(|| VcsError::NoWorkspace {
                path: path.to_path_buf(),
            })
    }

    async fn file_command(
        &self,
        command: &str,
        path: &Path,
        changelist: Option<&str>,
    ) -> Result<(), VcsError> {
        let client = self.owning_client(path).await?;
        let mut args = vec![
            "-u".to_string(),
            client.user,
            "-c".to_string(),
            client.workspace,
            command.to_string(),
        ];
        if let Some(cl) = changelist.filter(|cl| !cl.is_empty()) {
            args.push("-c".to_string());
            args.push(cl.to_string());
        }
        args.push(path.to_string_lossy().into_owned());
        self.send(args).await.map(|_| ())
    }
}

#[async_trait]
impl<R: CommandRunner> VersionControl for PerforceClient<R> {
    async fn prepare_for_add(&self, path: &Path, changelist: Option<&str>) -> Result<(), VcsError> {
        self.file_command("add", path, changelist).await
    }

    async fn prepare_for_edit(
        &self,
        path: &Path,
        changelist: Option<&str>,
    ) -> Result<(), VcsError> {
        self.file_command("edit", path, changelist).await
    }

    async fn list_pending_changelists(&self) -> Result<Vec<PendingChangelist>, VcsError> {
        let client = self.owning_client(&self.workspace_root).await?;
        let args = vec![
            "changes".to_string(),
            "--me".to_string(),
            "-s".to_string(),
            "pending".to_string(),
        ];
        let stdout = self.send(args).await?;
        Ok(parse_pending_changes(&stdout)
            .into_iter()
            .filter(|cl| cl.workspace_name == client.workspace)
            .collect())
    }
}

/// Parses `p4 clients --me`: `Client <name> <date> root <root> 'Created by <user>. '`.
pub fn parse_clients(stdout: &str) -> Vec<ClientWorkspace> {
    stdout
        .replace("\r\n", "\n")
        .lines()
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split(' ').collect();
            if tokens.len() <= 7 {
                return None;
            }
            Some(ClientWorkspace {
                workspace: tokens[1].to_string(),
                root: tokens[4].to_string(),
                user: tokens[7].replace('.', ""),
            })
        })
        .collect()
}

/// Parses `p4 changes --me -s pending`:
/// `Change <id> on <date> by <user>@<client> *pending* '<description> '`.
pub fn parse_pending_changes(stdout: &str) -> Vec<PendingChangelist> {
    const DESCRIPTION_START: &str = "*pending* '";
    stdout
        .replace("\r\n", "\n")
        .lines()
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split(' ').collect();
            if tokens.len() <= 7 {
                return None;
            }
            let start = line.find(DESCRIPTION_START)? + DESCRIPTION_START.len();
            let body = &line[start..];
            let body = body.strip_suffix('\'').unwrap_or(body);
            let workspace_name = tokens[5].split('@').nth(1).unwrap_or_default();
            Some(PendingChangelist {
                id: tokens[1].to_string(),
                workspace_name: workspace_name.to_string(),
                short_description: format!("{}...", body.trim_end()),
            })
        })
        .collect()
}

/// The client whose root contains `path`, compared case-insensitively. Longest root wins.
pub fn find_client_for_path<'a>(
    clients: &'a [ClientWorkspace],
    path: &Path,
) -> Option<&'a ClientWorkspace> {
    let path = path.to_string_lossy().to_lowercase();
    clients
        .iter()
        .filter(|client| root_contains(&client.root.to_lowercase(), &path))
        .max_by_key(|client| client.root.len())
}

fn root_contains(root: &str, path: &str) -> bool {
    let root = root.trim_end_matches(['/', '\\']);
    if root.is_empty() {
        return false;
    }
    match path.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\'),
        None => false,
    }
}
