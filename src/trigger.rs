//! Re-render trigger: decides whether a save notification refreshes the preview.

use crate::host::PanelHost;
use crate::session::{PreviewSession, RenderRequest};
use crate::Result;
use log::debug;
use std::path::Path;

/// Whether saving `saved_path` should re-render the open preview.
pub fn should_rerender<H: PanelHost>(session: &PreviewSession<H>, saved_path: &Path) -> bool {
    session.active_file_path() == Some(saved_path)
}

/// Re-request the preview if `saved_path` is the file being shown.
pub fn on_file_saved<H: PanelHost>(
    session: &mut PreviewSession<H>,
    saved_path: &Path,
) -> Result<Option<RenderRequest>> {
    if !should_rerender(session, saved_path) {
        debug!("Save of {} does not affect the preview", saved_path.display());
        return Ok(None);
    }
    session.request_preview(saved_path.to_path_buf()).map(Some)
}
