use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::renderer::ActionTarget;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("path does not exist: {0}")]
    NotFound(String),

    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("failed to move {path} to the trash: {source}")]
    Trash {
        path: String,
        #[source]
        source: trash::Error,
    },

    #[error("failed to delete {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Calls into the native host for context-menu actions.
pub trait HostBridge {
    fn open_path(&mut self, path: &str) -> Result<(), HostError>;
    fn write_clipboard(&mut self, text: &str) -> Result<(), HostError>;
    fn move_to_trash(&mut self, path: &str) -> Result<(), HostError>;
    fn delete_path(&mut self, path: &str) -> Result<(), HostError>;
}

/// Yes/no confirmation and blocking message surface.
pub trait Dialogs {
    fn ask(&mut self, title: &str, message: &str) -> bool;
    fn message(&mut self, text: &str);
}

/// Show `path` in the platform file manager.
pub fn open_in_file_manager(path: &str) -> Result<(), HostError> {
    if !Path::new(path).exists() {
        return Err(HostError::NotFound(path.to_string()));
    }
    open::that(path).map_err(|source| HostError::Open {
        path: path.to_string(),
        source,
    })
}

pub fn trash_path(path: &str) -> Result<(), HostError> {
    trash::delete(path).map_err(|source| HostError::Trash {
        path: path.to_string(),
        source,
    })
}

/// Delete a file or a whole directory tree, bypassing the trash.
pub fn remove_path(path: &str) -> Result<(), HostError> {
    let result = if Path::new(path).is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|source| HostError::Io {
        path: path.to_string(),
        source,
    })
}

/// Native dialogs via `rfd`.
#[derive(Debug, Default)]
pub struct NativeDialogs;

impl Dialogs for NativeDialogs {
    fn ask(&mut self, title: &str, message: &str) -> bool {
        let answer = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Warning)
            .set_title(title)
            .set_description(message)
            .set_buttons(rfd::MessageButtons::YesNo)
            .show();
        matches!(answer, rfd::MessageDialogResult::Yes)
    }

    fn message(&mut self, text: &str) {
        rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Error)
            .set_description(text)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Mac,
    Windows,
    Linux,
}

impl HostOs {
    /// Classify an environment identification string (a user agent, an OS
    /// name). Checked in order: Mac, Windows, Linux.
    pub fn detect(ident: &str) -> Option<Self> {
        if ident.is_empty() {
            None
        } else if ident.contains("Mac") {
            Some(HostOs::Mac)
        } else if ident.contains("Windows") {
            Some(HostOs::Windows)
        } else if ident.contains("Linux") {
            Some(HostOs::Linux)
        } else {
            None
        }
    }

    pub fn current() -> Option<Self> {
        let ident = match std::env::consts::OS {
            "macos" => "Mac",
            "windows" => "Windows",
            "linux" => "Linux",
            _ => "",
        };
        Self::detect(ident)
    }

    pub fn name(self) -> &'static str {
        match self {
            HostOs::Mac => "Mac",
            HostOs::Windows => "Windows",
            HostOs::Linux => "Linux",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextAction {
    CopyPath,
    Open,
    MoveToTrash,
    Delete,
}

impl ContextAction {
    /// Entries of the arc context menu, in display order.
    pub const MENU: [ContextAction; 4] = [
        ContextAction::CopyPath,
        ContextAction::Open,
        ContextAction::MoveToTrash,
        ContextAction::Delete,
    ];

    pub fn label(self, os: Option<HostOs>) -> &'static str {
        match (self, os) {
            (ContextAction::CopyPath, _) => "Copy path",
            (ContextAction::Open, Some(HostOs::Mac)) => "Reveal in Finder",
            (ContextAction::Open, Some(HostOs::Windows)) => "Show in Explorer",
            (ContextAction::Open, _) => "Open in file manager",
            (ContextAction::MoveToTrash, Some(HostOs::Windows)) => "Move to Recycle Bin",
            (ContextAction::MoveToTrash, _) => "Move to trash",
            (ContextAction::Delete, _) => "Delete permanently",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Done,
    /// The node is gone from disk; `on_removed` has been called
    Removed,
    Cancelled,
    /// Reported through the message surface, nothing else to do
    Failed,
}

/// Run one context-menu action against the host.
///
/// Removals ask for confirmation first. Failures are shown to the user and
/// swallowed; there are no retries.
pub fn run_context_action<H, D>(
    action: ContextAction,
    target: &ActionTarget,
    host: &mut H,
    dialogs: &mut D,
    on_removed: impl FnOnce(&ActionTarget),
) -> ActionOutcome
where
    H: HostBridge + ?Sized,
    D: Dialogs + ?Sized,
{
    let result = match action {
        ContextAction::CopyPath => host.write_clipboard(&target.path),
        ContextAction::Open => host.open_path(&target.open_path),
        ContextAction::MoveToTrash | ContextAction::Delete => {
            let (title, message) = removal_prompt(action, target);
            if !dialogs.ask(&title, &message) {
                return ActionOutcome::Cancelled;
            }
            let removed = if action == ContextAction::Delete {
                host.delete_path(&target.path)
            } else {
                host.move_to_trash(&target.path)
            };
            if removed.is_ok() {
                tracing::info!(path = %target.path, ?action, "removed");
                on_removed(target);
                return ActionOutcome::Removed;
            }
            removed
        }
    };

    match result {
        Ok(()) => ActionOutcome::Done,
        Err(err) => {
            tracing::warn!(path = %target.path, ?action, "host action failed: {err}");
            dialogs.message(&err.to_string());
            ActionOutcome::Failed
        }
    }
}

fn removal_prompt(action: ContextAction, target: &ActionTarget) -> (String, String) {
    let kind = if target.is_dir { "folder" } else { "file" };
    let (title, detail) = match action {
        ContextAction::Delete => (
            format!("Delete this {kind} permanently?"),
            "This cannot be undone.",
        ),
        _ => (
            format!("Move this {kind} to the trash?"),
            "It can be restored from the trash.",
        ),
    };
    let detail = if target.is_dir {
        format!("{detail} Everything inside the folder goes with it.")
    } else {
        detail.to_string()
    };
    (title, format!("{detail}\n\n\n{}\n", target.path))
}
