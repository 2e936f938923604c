//! Panel session: the single source of truth for whether a preview is open,
//! which file it targets and what it shows.
//!
//! Every render request bumps a generation counter and carries a snapshot of
//! it. A completion is applied only if its generation is still the newest, so
//! a slow render can never overwrite a newer one or a closed panel.

use crate::display::{self, DisplayOptions, DisplayState};
use crate::host::{Panel, PanelHost, PanelId, PanelOptions};
use crate::{PreviewConfig, RenderResult, Result};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// A render to dispatch, tagged with the generation it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub file_path: PathBuf,
    pub generation: u64,
}

/// The open panel together with what it previews. Bundled so a panel can
/// never exist without a target file or vice versa.
struct ActivePanel<P> {
    panel: P,
    file_path: PathBuf,
    display: DisplayState,
}

/// Preview session owned by the coordinator
pub struct PreviewSession<H: PanelHost> {
    host: H,
    config: PreviewConfig,
    display_options: DisplayOptions,
    active: Option<ActivePanel<H::Panel>>,
    /// Never reset, so renders from before a close cannot match requests
    /// made after a reopen.
    generation: u64,
    stale_discards: u64,
}

impl<H: PanelHost> PreviewSession<H> {
    pub fn new(config: PreviewConfig, host: H) -> Self {
        Self {
            host,
            display_options: DisplayOptions::from(&config),
            config,
            active: None,
            generation: 0,
            stale_discards: 0,
        }
    }

    /// Open (or reuse) the panel for `file_path`, show the loading state and
    /// return the render to dispatch.
    pub fn request_preview(&mut self, file_path: PathBuf) -> Result<RenderRequest> {
        let title = self.config.panel_title(&file_path);

        match self.active.as_mut() {
            Some(active) => {
                if active.file_path != file_path {
                    info!(
                        "Retargeting preview from {} to {}",
                        active.file_path.display(),
                        file_path.display()
                    );
                }
                active.panel.reveal();
                active.panel.set_title(&title);
                active.file_path = file_path.clone();
                active.display = DisplayState::Loading;
            }
            None => {
                let panel = self.host.create_panel(PanelOptions::titled(title))?;
                info!("Opened preview panel {} for {}", panel.id(), file_path.display());
                self.active = Some(ActivePanel {
                    panel,
                    file_path: file_path.clone(),
                    display: DisplayState::Loading,
                });
            }
        }

        self.generation += 1;
        self.refresh();
        debug!("Render requested for {} (generation {})", file_path.display(), self.generation);

        Ok(RenderRequest {
            file_path,
            generation: self.generation,
        })
    }

    /// Apply a finished render. Returns whether it reached the panel.
    pub fn on_render_complete(&mut self, generation: u64, result: RenderResult) -> bool {
        if generation != self.generation {
            self.stale_discards += 1;
            debug!(
                "Discarding stale render (generation {}, current {})",
                generation, self.generation
            );
            return false;
        }
        let Some(active) = self.active.as_mut() else {
            self.stale_discards += 1;
            debug!("Discarding render for closed panel (generation {})", generation);
            return false;
        };

        active.display = match result {
            RenderResult::Success(payload) => DisplayState::Rendered(payload),
            RenderResult::Failure(message) => DisplayState::Errored(message),
        };
        self.refresh();
        true
    }

    /// Forget the panel after the host closed it. Close notifications for a
    /// panel that is no longer current are ignored.
    pub fn on_panel_closed(&mut self, panel_id: PanelId) -> bool {
        match &self.active {
            Some(active) if active.panel.id() == panel_id => {
                info!("Preview panel {} closed", panel_id);
                self.active = None;
                true
            }
            _ => {
                debug!("Ignoring close of unknown panel {}", panel_id);
                false
            }
        }
    }

    /// Dispose the panel from our side, e.g. on shutdown.
    pub fn close(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.panel.dispose();
        }
    }

    /// Push the document for the current state to the panel.
    fn refresh(&mut self) {
        if let Some(active) = self.active.as_mut() {
            let html = display::render(&active.display, &self.display_options);
            if let Err(e) = active.panel.set_html(&html) {
                warn!("Failed to update preview panel: {}", e);
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_file_path(&self) -> Option<&Path> {
        self.active.as_ref().map(|a| a.file_path.as_path())
    }

    pub fn display_state(&self) -> Option<&DisplayState> {
        self.active.as_ref().map(|a| &a.display)
    }

    pub fn panel(&self) -> Option<&H::Panel> {
        self.active.as_ref().map(|a| &a.panel)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of completions dropped because a newer request or a panel
    /// close superseded them
    pub fn stale_discards(&self) -> u64 {
        self.stale_discards
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}
