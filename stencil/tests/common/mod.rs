//! Fakes shared by the integration tests: a scripted prompter, a counting file system and a
//! recording VCS.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use stencil::{
    FileSystem, LocalFileSystem, PendingChangelist, Prompter, SelectItem, SelectOptions,
    TextPrompt, VcsError, VersionControl,
};

/// One scripted operator response.
#[derive(Clone, Debug)]
pub enum Reply {
    Pick(Option<usize>),
    Type(Option<String>),
}

/// Answers prompts from a queue; a missing or mismatched reply counts as a cancel.
#[derive(Default)]
pub struct ScriptedPrompter {
    replies: Mutex<VecDeque<Reply>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Titles of every prompt shown, in order.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }

    fn next(&self, title: &str) -> Option<Reply> {
        self.asked.lock().unwrap().push(title.to_string());
        self.replies.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn select_one(&self, options: &SelectOptions, items: &[SelectItem]) -> Option<usize> {
        match self.next(&options.title)? {
            Reply::Pick(index) => index.filter(|&i| i < items.len()),
            Reply::Type(_) => None,
        }
    }

    async fn prompt_text(&self, prompt: &TextPrompt) -> Option<String> {
        match self.next(&prompt.title)? {
            Reply::Type(text) => text,
            Reply::Pick(_) => None,
        }
    }
}

/// [`LocalFileSystem`] that counts every call.
#[derive(Default)]
pub struct CountingFs {
    inner: LocalFileSystem,
    pub reads: AtomicUsize,
    pub writes: AtomicUsize,
    pub dirs: AtomicUsize,
}

impl CountingFs {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn dirs(&self) -> usize {
        self.dirs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileSystem for CountingFs {
    async fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_to_string(path).await
    }

    async fn write(&self, path: &Path, contents: &str) -> std::io::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write(path, contents).await
    }

    async fn create_dir_all(&self, path: &Path) -> std::io::Result<()> {
        self.dirs.fetch_add(1, Ordering::SeqCst);
        self.inner.create_dir_all(path).await
    }
}

/// VCS collaborator that records calls and rejects paths ending with `reject_suffix`.
#[derive(Default)]
pub struct RecordingVcs {
    pub pending: Vec<PendingChangelist>,
    pub reject_suffix: Option<String>,
    calls: Mutex<Vec<(String, PathBuf, Option<String>)>>,
}

impl RecordingVcs {
    pub fn with_pending(pending: Vec<PendingChangelist>) -> Self {
        Self {
            pending,
            ..Self::default()
        }
    }

    pub fn rejecting(suffix: &str) -> Self {
        Self {
            reject_suffix: Some(suffix.to_string()),
            ..Self::default()
        }
    }

    /// `(operation, path, changelist)` for every call, in order.
    pub fn calls(&self) -> Vec<(String, PathBuf, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, op: &str, path: &Path, changelist: Option<&str>) -> Result<(), VcsError> {
        self.calls.lock().unwrap().push((
            op.to_string(),
            path.to_path_buf(),
            changelist.map(str::to_string),
        ));
        match &self.reject_suffix {
            Some(suffix) if path.to_string_lossy().ends_with(suffix.as_str()) => {
                Err(VcsError::CommandFailed {
                    command: format!("p4 {}", op),
                    stderr: "file is locked by another user".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl VersionControl for RecordingVcs {
    async fn prepare_for_add(&self, path: &Path, changelist: Option<&str>) -> Result<(), VcsError> {
        self.record("add", path, changelist)
    }

    async fn prepare_for_edit(
        &self,
        path: &Path,
        changelist: Option<&str>,
    ) -> Result<(), VcsError> {
        self.record("edit", path, changelist)
    }

    async fn list_pending_changelists(&self) -> Result<Vec<PendingChangelist>, VcsError> {
        Ok(self.pending.clone())
    }
}
