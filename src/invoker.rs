//! Render invoker: runs the external rasterizer for one file.
//!
//! Each call spawns exactly one subprocess, `<program> <args..> <file>`, and
//! captures its output. Overlapping calls are not tracked here; the session
//! decides which completion is allowed to reach the panel.

use crate::{Error, PayloadEncoding, PreviewConfig, RasterizerCommand, Result};
use base64::Engine as Base64Engine;
use futures::future::{BoxFuture, FutureExt};
use log::{debug, warn};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// Outcome of one rasterizer run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderResult {
    /// Base64-encoded image payload. Not validated as an image.
    Success(String),
    /// Diagnostic text to show instead of the image
    Failure(String),
}

impl From<Result<String>> for RenderResult {
    fn from(res: Result<String>) -> Self {
        match res {
            Ok(payload) => RenderResult::Success(payload),
            Err(err) => RenderResult::Failure(err.diagnostic()),
        }
    }
}

/// Anything that can turn a UI file into a [`RenderResult`].
///
/// The returned future owns everything it needs so it can be driven on a
/// separate task while the caller keeps handling events.
pub trait Rasterizer: Send + Sync {
    fn invoke(&self, file_path: &Path) -> BoxFuture<'static, RenderResult>;
}

/// Rasterizer backed by an external process.
#[derive(Debug, Clone)]
pub struct ProcessRasterizer {
    command: RasterizerCommand,
    timeout_ms: u64,
    max_output_bytes: usize,
    encoding: PayloadEncoding,
}

impl ProcessRasterizer {
    pub fn new(config: &PreviewConfig) -> Self {
        Self {
            command: config.rasterizer.clone(),
            timeout_ms: config.timeout_ms,
            max_output_bytes: config.max_output_bytes,
            encoding: config.payload_encoding,
        }
    }

    /// Run the rasterizer and return the encoded payload.
    pub async fn run(&self, file_path: &Path) -> Result<String> {
        debug!(
            "Spawning {} {:?} {}",
            self.command.program,
            self.command.args,
            file_path.display()
        );

        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .arg(file_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::ProcessLaunchFailure(format!("{}: {}", self.command.program, e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Other("rasterizer stdout was not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::Other("rasterizer stderr was not captured".into()))?;

        let limit = self.max_output_bytes;
        let collect = async {
            let (out, err) = tokio::try_join!(read_capped(stdout, limit), read_capped(stderr, limit))?;
            if out.len() + err.len() > limit {
                return Err(Error::BufferExceeded { limit });
            }
            let status = child
                .wait()
                .await
                .map_err(|e| Error::ProcessExecutionFailure(format!("failed to wait for rasterizer: {}", e)))?;
            Ok((status, out, err))
        };

        // The child is killed on drop if we bail out early.
        let (status, out, err) = if self.timeout_ms > 0 {
            tokio::time::timeout(Duration::from_millis(self.timeout_ms), collect)
                .await
                .map_err(|_| Error::Timeout(self.timeout_ms))??
        } else {
            collect.await?
        };

        self.classify(status, out, err)
    }

    fn classify(&self, status: ExitStatus, stdout: Vec<u8>, stderr: Vec<u8>) -> Result<String> {
        if !status.success() {
            let text = String::from_utf8_lossy(&stderr);
            let message = if text.trim().is_empty() {
                describe_status(status)
            } else {
                text.into_owned()
            };
            return Err(Error::ProcessExecutionFailure(message));
        }
        Ok(encode_payload(self.encoding, &stdout))
    }
}

impl Rasterizer for ProcessRasterizer {
    fn invoke(&self, file_path: &Path) -> BoxFuture<'static, RenderResult> {
        let this = self.clone();
        let path = file_path.to_path_buf();
        async move {
            let res = this.run(&path).await;
            if let Err(e) = &res {
                warn!("Render of {} failed: {}", path.display(), e);
            }
            RenderResult::from(res)
        }
        .boxed()
    }
}

/// Read at most `limit` bytes, failing once the stream produces more.
async fn read_capped<R: AsyncRead + Unpin>(reader: R, limit: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader
        .take((limit as u64).saturating_add(1))
        .read_to_end(&mut buf)
        .await
        .map_err(|e| Error::ProcessExecutionFailure(format!("failed to read rasterizer output: {}", e)))?;
    if buf.len() > limit {
        return Err(Error::BufferExceeded { limit });
    }
    Ok(buf)
}

fn encode_payload(encoding: PayloadEncoding, stdout: &[u8]) -> String {
    match encoding {
        PayloadEncoding::Base64 => String::from_utf8_lossy(stdout).trim().to_string(),
        PayloadEncoding::Binary => base64::engine::general_purpose::STANDARD.encode(stdout),
    }
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("rasterizer exited with status {}", code),
        None => "rasterizer was terminated by a signal".to_string(),
    }
}
