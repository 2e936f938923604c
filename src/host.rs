//! Panel-hosting collaborator
//!
//! The editor that hosts the preview is abstracted behind two small traits:
//! [`PanelHost`] creates panels and shows transient notifications, [`Panel`]
//! is one live display surface. [`FilePanelHost`] is a headless host that
//! writes the displayed document to a file, used by the CLI.

use crate::{Error, Result};
use log::{error, info};
use std::path::PathBuf;

/// Identifier of a panel, unique per host.
pub type PanelId = u64;

/// Options for a newly created panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelOptions {
    /// Title shown on the panel's tab
    pub title: String,
    /// Whether scripts may run inside the panel
    pub enable_scripts: bool,
    /// Whether the panel opens beside the active view rather than over it
    pub beside_active: bool,
}

impl PanelOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            enable_scripts: true,
            beside_active: true,
        }
    }
}

/// A live display surface owned by the preview session.
pub trait Panel: Send {
    fn id(&self) -> PanelId;

    /// Bring the panel to the front without changing its content
    fn reveal(&mut self);

    fn set_title(&mut self, title: &str);

    /// Replace the displayed document
    fn set_html(&mut self, html: &str) -> Result<()>;

    /// Close the panel from the coordinator side
    fn dispose(&mut self);
}

/// Host editor facilities used by the coordinator.
///
/// The host reports user-initiated panel closes back through
/// [`crate::PreviewHandle::panel_closed`].
pub trait PanelHost: Send {
    type Panel: Panel;

    fn create_panel(&mut self, options: PanelOptions) -> Result<Self::Panel>;

    /// Show a transient notification, e.g. for an invalid selection
    fn show_error_message(&mut self, message: &str);
}

/// Headless host that mirrors the single panel into an HTML file.
pub struct FilePanelHost {
    output: PathBuf,
    next_id: PanelId,
}

impl FilePanelHost {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            next_id: 1,
        }
    }
}

impl PanelHost for FilePanelHost {
    type Panel = FilePanel;

    fn create_panel(&mut self, options: PanelOptions) -> Result<FilePanel> {
        let id = self.next_id;
        self.next_id += 1;
        info!("Opened panel {} '{}' at {}", id, options.title, self.output.display());
        Ok(FilePanel {
            id,
            title: options.title,
            output: self.output.clone(),
        })
    }

    fn show_error_message(&mut self, message: &str) {
        error!("{}", message);
    }
}

/// Panel created by [`FilePanelHost`].
pub struct FilePanel {
    id: PanelId,
    title: String,
    output: PathBuf,
}

impl FilePanel {
    pub fn title(&self) -> &str {
        &self.title
    }
}

impl Panel for FilePanel {
    fn id(&self) -> PanelId {
        self.id
    }

    fn reveal(&mut self) {
        info!("Revealing panel {} '{}'", self.id, self.title);
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn set_html(&mut self, html: &str) -> Result<()> {
        std::fs::write(&self.output, html)
            .map_err(|e| Error::Panel(format!("{}: {}", self.output.display(), e)))
    }

    fn dispose(&mut self) {
        info!("Disposed panel {}", self.id);
    }
}
