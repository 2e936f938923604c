//! Event loop that owns the preview session.
//!
//! Commands, save notifications, panel closes and render completions all
//! arrive on one channel and are handled to completion one at a time, so the
//! generation check and the state update it guards are never split by an
//! await. Renders run on their own tasks and post their result back as an
//! event.

use crate::display::DisplayState;
use crate::host::{Panel, PanelHost, PanelId};
use crate::invoker::{Rasterizer, RenderResult};
use crate::session::{PreviewSession, RenderRequest};
use crate::{trigger, Error, PreviewConfig, Result};
use log::{debug, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::sync::oneshot;

enum Event {
    Preview {
        explicit: Option<PathBuf>,
        focused: Option<PathBuf>,
        resp: oneshot::Sender<Result<()>>,
    },
    Saved(PathBuf),
    PanelClosed(PanelId),
    RenderComplete {
        generation: u64,
        result: RenderResult,
    },
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown(oneshot::Sender<()>),
}

/// Point-in-time view of the session, for callers outside the loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub panel_id: Option<PanelId>,
    pub active_file_path: Option<PathBuf>,
    pub display_state: Option<DisplayState>,
    pub generation: u64,
    pub stale_discards: u64,
}

/// Owns the session and the rasterizer; drive it through the
/// [`PreviewHandle`] returned alongside it.
pub struct Coordinator<H: PanelHost, R> {
    session: PreviewSession<H>,
    rasterizer: Arc<R>,
    // Weak so the loop ends once every handle is gone.
    events: WeakUnboundedSender<Event>,
    inbox: UnboundedReceiver<Event>,
}

impl<H, R> Coordinator<H, R>
where
    H: PanelHost + 'static,
    R: Rasterizer + 'static,
{
    pub fn new(config: PreviewConfig, host: H, rasterizer: R) -> (Self, PreviewHandle) {
        let (tx, inbox) = mpsc::unbounded_channel();
        let coordinator = Self {
            session: PreviewSession::new(config, host),
            rasterizer: Arc::new(rasterizer),
            events: tx.downgrade(),
            inbox,
        };
        (coordinator, PreviewHandle { tx })
    }

    /// Create a coordinator and run it on a new task.
    pub fn spawn(config: PreviewConfig, host: H, rasterizer: R) -> PreviewHandle {
        let (coordinator, handle) = Self::new(config, host, rasterizer);
        tokio::spawn(coordinator.run());
        handle
    }

    /// Process events until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        while let Some(event) = self.inbox.recv().await {
            if !self.handle_event(event) {
                break;
            }
        }
        self.session.close();
        debug!("Preview coordinator stopped");
    }

    fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Preview {
                explicit,
                focused,
                resp,
            } => {
                let res = self.preview(explicit, focused);
                let _ = resp.send(res);
            }
            Event::Saved(path) => match trigger::on_file_saved(&mut self.session, &path) {
                Ok(Some(request)) => self.dispatch(request),
                Ok(None) => {}
                Err(e) => warn!("Re-render of {} failed: {}", path.display(), e),
            },
            Event::PanelClosed(id) => {
                self.session.on_panel_closed(id);
            }
            Event::RenderComplete { generation, result } => {
                self.session.on_render_complete(generation, result);
            }
            Event::Snapshot(resp) => {
                let _ = resp.send(self.snapshot());
            }
            Event::Shutdown(resp) => {
                self.session.close();
                let _ = resp.send(());
                return false;
            }
        }
        true
    }

    fn preview(&mut self, explicit: Option<PathBuf>, focused: Option<PathBuf>) -> Result<()> {
        let path = match self.session.config().resolve_selection(explicit, focused) {
            Ok(path) => path,
            Err(e) => {
                let message = self.session.config().invalid_selection_message();
                self.session.host_mut().show_error_message(&message);
                return Err(e);
            }
        };
        let request = self.session.request_preview(path)?;
        self.dispatch(request);
        Ok(())
    }

    fn dispatch(&self, request: RenderRequest) {
        let Some(events) = self.events.upgrade() else {
            return;
        };
        let render = self.rasterizer.invoke(&request.file_path);
        let generation = request.generation;
        tokio::spawn(async move {
            let result = render.await;
            let _ = events.send(Event::RenderComplete { generation, result });
        });
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            panel_id: self.session.panel().map(|p| p.id()),
            active_file_path: self.session.active_file_path().map(|p| p.to_path_buf()),
            display_state: self.session.display_state().cloned(),
            generation: self.session.generation(),
            stale_discards: self.session.stale_discards(),
        }
    }
}

/// Cloneable handle to a running coordinator.
#[derive(Clone)]
pub struct PreviewHandle {
    tx: UnboundedSender<Event>,
}

impl PreviewHandle {
    /// The "preview this UI file" command: preview `explicit` if given,
    /// otherwise the focused file. Resolves once the panel shows the loading
    /// state and the render is dispatched.
    pub async fn preview(&self, explicit: Option<PathBuf>, focused: Option<PathBuf>) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Preview {
            explicit,
            focused,
            resp: tx,
        })?;
        rx.await
            .map_err(|e| Error::Other(format!("Preview canceled: {}", e)))?
    }

    /// Report that `path` was saved.
    pub fn file_saved(&self, path: impl Into<PathBuf>) -> Result<()> {
        self.send(Event::Saved(path.into()))
    }

    /// Report that the host closed panel `id`.
    pub fn panel_closed(&self, id: PanelId) -> Result<()> {
        self.send(Event::PanelClosed(id))
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Snapshot(tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Snapshot canceled: {}", e)))
    }

    /// Close the panel and stop the coordinator.
    pub async fn shutdown(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Event::Shutdown(tx))?;
        rx.await
            .map_err(|e| Error::Other(format!("Shutdown canceled: {}", e)))
    }

    fn send(&self, event: Event) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| Error::Other("Preview coordinator is not running".into()))
    }
}
