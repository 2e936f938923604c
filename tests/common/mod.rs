//! Shared test doubles for the coordinator tests
#![allow(dead_code)]

use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use uipreview::host::{Panel, PanelHost, PanelId, PanelOptions};
use uipreview::{PreviewHandle, Rasterizer, RenderResult, SessionSnapshot};

/// Everything the host was asked to do
#[derive(Default, Debug)]
pub struct HostLog {
    pub created: Vec<PanelOptions>,
    pub messages: Vec<String>,
    pub html: Vec<(PanelId, String)>,
    pub titles: Vec<(PanelId, String)>,
    pub reveals: Vec<PanelId>,
    pub disposed: Vec<PanelId>,
}

/// Host whose log stays inspectable after the host moves into a coordinator
#[derive(Clone, Default)]
pub struct RecordingHost {
    pub log: Arc<Mutex<HostLog>>,
}

pub struct RecordingPanel {
    id: PanelId,
    log: Arc<Mutex<HostLog>>,
}

impl Panel for RecordingPanel {
    fn id(&self) -> PanelId {
        self.id
    }

    fn reveal(&mut self) {
        self.log.lock().unwrap().reveals.push(self.id);
    }

    fn set_title(&mut self, title: &str) {
        self.log.lock().unwrap().titles.push((self.id, title.to_string()));
    }

    fn set_html(&mut self, html: &str) -> uipreview::Result<()> {
        self.log.lock().unwrap().html.push((self.id, html.to_string()));
        Ok(())
    }

    fn dispose(&mut self) {
        self.log.lock().unwrap().disposed.push(self.id);
    }
}

impl PanelHost for RecordingHost {
    type Panel = RecordingPanel;

    fn create_panel(&mut self, options: PanelOptions) -> uipreview::Result<RecordingPanel> {
        let mut log = self.log.lock().unwrap();
        log.created.push(options);
        Ok(RecordingPanel {
            id: log.created.len() as PanelId,
            log: self.log.clone(),
        })
    }

    fn show_error_message(&mut self, message: &str) {
        self.log.lock().unwrap().messages.push(message.to_string());
    }
}

impl RecordingHost {
    pub fn created(&self) -> usize {
        self.log.lock().unwrap().created.len()
    }

    pub fn messages(&self) -> Vec<String> {
        self.log.lock().unwrap().messages.clone()
    }

    pub fn last_html(&self) -> Option<String> {
        self.log.lock().unwrap().html.last().map(|(_, h)| h.clone())
    }

    pub fn html_writes(&self) -> usize {
        self.log.lock().unwrap().html.len()
    }
}

/// Rasterizer whose renders finish only when the test releases them, in
/// whatever order the test chooses.
#[derive(Clone, Default)]
pub struct GatedRasterizer {
    gates: Arc<Mutex<Vec<(PathBuf, oneshot::Sender<RenderResult>)>>>,
    calls: Arc<Mutex<HashMap<PathBuf, usize>>>,
}

impl Rasterizer for GatedRasterizer {
    fn invoke(&self, file_path: &Path) -> BoxFuture<'static, RenderResult> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push((file_path.to_path_buf(), tx));
        *self.calls.lock().unwrap().entry(file_path.to_path_buf()).or_default() += 1;
        async move {
            rx.await
                .unwrap_or_else(|_| RenderResult::Failure("gate dropped".into()))
        }
        .boxed()
    }
}

impl GatedRasterizer {
    /// Number of renders started so far
    pub fn started(&self) -> usize {
        self.gates.lock().unwrap().len()
    }

    pub fn calls_for(&self, path: &str) -> usize {
        self.calls.lock().unwrap().get(Path::new(path)).copied().unwrap_or(0)
    }

    /// Finish the `index`-th render (0-based, in start order).
    pub fn release(&self, index: usize, result: RenderResult) {
        let mut gates = self.gates.lock().unwrap();
        let (_, tx) = std::mem::replace(
            &mut gates[index],
            (PathBuf::new(), oneshot::channel().0),
        );
        let _ = tx.send(result);
    }
}

/// Poll the coordinator until `cond` holds, failing after two seconds.
pub async fn wait_for<F>(handle: &PreviewHandle, cond: F) -> SessionSnapshot
where
    F: Fn(&SessionSnapshot) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        let snap = handle.snapshot().await.expect("coordinator stopped");
        if cond(&snap) {
            return snap;
        }
        if tokio::time::Instant::now() > deadline {
            panic!("condition not reached; last snapshot: {:?}", snap);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
