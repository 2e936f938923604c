//! UI Preview
//!
//! Live preview of Qt Designer `.ui` files inside an editor panel. Rendering is
//! delegated to an external rasterizer process that prints a base64-encoded
//! image; this crate coordinates the preview session around it.
//!
//! # Features
//!
//! - **Single panel**: at most one preview panel, retargeted on each request
//! - **Save-driven refresh**: saving the previewed file re-renders it
//! - **Stale-result discard**: every render is tagged with a generation and
//!   only the newest one may update the panel
//!
//! # Example
//!
//! ```no_run
//! use uipreview::{host::FilePanelHost, PreviewConfig};
//!
//! # async fn run() -> uipreview::Result<()> {
//! let config = PreviewConfig::default();
//! let host = FilePanelHost::new("preview.html");
//! let handle = uipreview::start(config, host)?;
//! handle.preview(Some("/work/widget.ui".into()), None).await?;
//! # Ok(())
//! # }
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub mod error;
pub use error::{Error, Result};

pub mod coordinator;
pub mod display;
pub mod host;
pub mod invoker;
pub mod session;
pub mod trigger;
pub mod watcher;

pub use coordinator::{Coordinator, PreviewHandle, SessionSnapshot};
pub use display::DisplayState;
pub use invoker::{ProcessRasterizer, Rasterizer, RenderResult};
pub use session::{PreviewSession, RenderRequest};

/// Default cap on captured rasterizer output (stdout and stderr combined).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Command line used to start the rasterizer. The file to render is appended
/// after `args`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RasterizerCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for RasterizerCommand {
    fn default() -> Self {
        Self {
            program: "python".to_string(),
            args: vec!["render_ui.py".to_string()],
        }
    }
}

/// How the rasterizer's standard output should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadEncoding {
    /// stdout is already base64 text
    #[default]
    Base64,
    /// stdout is raw image bytes
    Binary,
}

/// Configuration for the preview coordinator
///
/// Defaults match the reference Python rasterizer: `python render_ui.py <file>`
/// printing a base64 PNG on stdout.
///
/// # Examples
///
/// ```
/// let cfg = uipreview::PreviewConfig::default();
/// assert_eq!(cfg.extension, "ui");
/// assert_eq!(cfg.max_output_bytes, 10 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Rasterizer command line
    pub rasterizer: RasterizerCommand,
    /// Recognized UI-definition extension, without the dot
    pub extension: String,
    /// Rasterizer timeout in milliseconds (0 => no timeout)
    pub timeout_ms: u64,
    /// Maximum combined stdout/stderr size before a render fails
    pub max_output_bytes: usize,
    /// Interpretation of the rasterizer's stdout
    pub payload_encoding: PayloadEncoding,
    /// Prefix of the panel title; the file name is appended
    pub panel_title_prefix: String,
    /// MIME type used when embedding the image
    pub image_mime: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            rasterizer: RasterizerCommand::default(),
            extension: "ui".to_string(),
            timeout_ms: 30_000,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            payload_encoding: PayloadEncoding::Base64,
            panel_title_prefix: "UI Preview: ".to_string(),
            image_mime: "image/png".to_string(),
        }
    }
}

impl PreviewConfig {
    /// Load a configuration from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that could never produce a render.
    pub fn validate(&self) -> Result<()> {
        if self.rasterizer.program.trim().is_empty() {
            return Err(Error::ConfigError("rasterizer program is empty".into()));
        }
        if self.extension.is_empty() || self.extension.starts_with('.') {
            return Err(Error::ConfigError(format!(
                "extension must be non-empty and given without a dot, got {:?}",
                self.extension
            )));
        }
        if self.max_output_bytes == 0 {
            return Err(Error::ConfigError("max_output_bytes must be positive".into()));
        }
        Ok(())
    }

    /// Whether `path` names a UI-definition file this preview accepts.
    pub fn accepts(&self, path: &Path) -> bool {
        let Some(name) = path.to_str() else {
            return false;
        };
        let suffix = format!(".{}", self.extension);
        name.len() > suffix.len() && name.ends_with(&suffix)
    }

    /// Resolve the target of the preview command: the explicit file if one was
    /// given, otherwise the focused file. The result must carry the recognized
    /// extension.
    pub fn resolve_selection(
        &self,
        explicit: Option<PathBuf>,
        focused: Option<PathBuf>,
    ) -> Result<PathBuf> {
        match explicit.or(focused) {
            Some(path) if self.accepts(&path) => Ok(path),
            Some(path) => Err(Error::InvalidSelection(format!(
                "{} is not a .{} file",
                path.display(),
                self.extension
            ))),
            None => Err(Error::InvalidSelection("no file selected".into())),
        }
    }

    /// Notification shown when the preview command is given a bad file.
    pub fn invalid_selection_message(&self) -> String {
        format!("Please select a valid .{} file to preview.", self.extension)
    }

    /// Title of the panel previewing `path`.
    pub fn panel_title(&self, path: &Path) -> String {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        format!("{}{}", self.panel_title_prefix, name)
    }
}

/// Start a coordinator on the current tokio runtime using the process-backed
/// rasterizer, returning a handle to drive it.
pub fn start<H>(config: PreviewConfig, host: H) -> Result<PreviewHandle>
where
    H: host::PanelHost + 'static,
{
    config.validate()?;
    let rasterizer = ProcessRasterizer::new(&config);
    Ok(Coordinator::spawn(config, host, rasterizer))
}
