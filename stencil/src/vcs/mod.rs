//! Version-control gate: files must be opened for add/edit before targets touch them.
//!
//! [`VersionControl`] is the collaborator interface; [`perforce::PerforceClient`] implements it
//! on top of the `p4` command line. When no collaborator is configured, targets write directly.

pub mod perforce;

use std::path::Path;

use async_trait::async_trait;

use crate::error::VcsError;
use crate::prompt::{Prompter, SelectItem, SelectOptions};

pub use perforce::{
    ClientWorkspace, CommandOutput, CommandRunner, PerforceClient, ProcessRunner, WorkspaceCache,
};

/// Changelist identifier meaning "the client's default changelist".
pub const DEFAULT_CHANGELIST: &str = "default";

/// A pending changelist owned by the current user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingChangelist {
    pub id: String,
    pub workspace_name: String,
    pub short_description: String,
}

#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Marks a newly written file for add, optionally into `changelist`.
    async fn prepare_for_add(&self, path: &Path, changelist: Option<&str>) -> Result<(), VcsError>;

    /// Opens an existing file for edit, optionally into `changelist`.
    async fn prepare_for_edit(&self, path: &Path, changelist: Option<&str>)
        -> Result<(), VcsError>;

    /// Pending changelists belonging to the client of the current workspace.
    async fn list_pending_changelists(&self) -> Result<Vec<PendingChangelist>, VcsError>;
}

/// Outcome of [`choose_changelist`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChangelistChoice {
    /// Nothing pending; files go to the default changelist without an explicit id.
    NoneAvailable,
    Selected(String),
    Cancelled,
}

/// Lets the operator pick the destination changelist. The default changelist is listed first.
pub async fn choose_changelist(
    prompter: &dyn Prompter,
    pending: &[PendingChangelist],
) -> ChangelistChoice {
    let Some(first) = pending.first() else {
        return ChangelistChoice::NoneAvailable;
    };
    let mut items = Vec::with_capacity(pending.len() + 1);
    items.push(SelectItem {
        label: "Default Change List".to_string(),
        detail: first.workspace_name.clone(),
        description: String::new(),
    });
    items.extend(pending.iter().map(|cl| SelectItem {
        label: cl.short_description.clone(),
        detail: cl.workspace_name.clone(),
        description: cl.id.clone(),
    }));
    let options = SelectOptions {
        title: "Change List Picker".to_string(),
        placeholder: "Select change list destination".to_string(),
    };
    match prompter.select_one(&options, &items).await {
        None => ChangelistChoice::Cancelled,
        Some(0) => ChangelistChoice::Selected(DEFAULT_CHANGELIST.to_string()),
        Some(i) => match pending.get(i - 1) {
            Some(cl) => ChangelistChoice::Selected(cl.id.clone()),
            None => ChangelistChoice::Cancelled,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::TextPrompt;
    use std::sync::Mutex;

    struct PickIndex(Option<usize>, Mutex<Vec<SelectItem>>);

    #[async_trait]
    impl Prompter for PickIndex {
        async fn select_one(&self, _o: &SelectOptions, items: &[SelectItem]) -> Option<usize> {
            *self.1.lock().unwrap() = items.to_vec();
            self.0
        }
        async fn prompt_text(&self, _p: &TextPrompt) -> Option<String> {
            None
        }
    }

    fn pending() -> Vec<PendingChangelist> {
        vec![PendingChangelist {
            id: "1234".to_string(),
            workspace_name: "alice_ws".to_string(),
            short_description: "Add widgets...".to_string(),
        }]
    }

    #[tokio::test]
    async fn no_pending_changelists_skips_the_picker() {
        let p = PickIndex(Some(0), Mutex::new(Vec::new()));
        assert_eq!(choose_changelist(&p, &[]).await, ChangelistChoice::NoneAvailable);
        assert!(p.1.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn default_entry_comes_first() {
        let p = PickIndex(Some(0), Mutex::new(Vec::new()));
        let choice = choose_changelist(&p, &pending()).await;
        assert_eq!(choice, ChangelistChoice::Selected("default".to_string()));
        let items = p.1.lock().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].label, "Default Change List");
        assert_eq!(items[0].detail, "alice_ws");
        assert_eq!(items[1].description, "1234");
    }

    #[tokio::test]
    async fn picking_a_pending_changelist_returns_its_id() {
        let p = PickIndex(Some(1), Mutex::new(Vec::new()));
        assert_eq!(
            choose_changelist(&p, &pending()).await,
            ChangelistChoice::Selected("1234".to_string())
        );
    }

    #[tokio::test]
    async fn cancel_is_reported() {
        let p = PickIndex(None, Mutex::new(Vec::new()));
        assert_eq!(choose_changelist(&p, &pending()).await, ChangelistChoice::Cancelled);
    }
}
