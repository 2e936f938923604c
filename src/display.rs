//! Display renderer: maps the preview state to the document shown in the panel.
//!
//! [`render`] is pure. Long payloads and messages are emitted as-is.

use crate::PreviewConfig;

/// What the panel is currently showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayState {
    Loading,
    /// Base64-encoded image payload
    Rendered(String),
    /// Diagnostic text from the failed render
    Errored(String),
}

/// Inputs to the templates that come from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    /// MIME type of the embedded image
    pub image_mime: String,
    /// Program named in the troubleshooting hint
    pub toolchain: String,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self::from(&PreviewConfig::default())
    }
}

impl From<&PreviewConfig> for DisplayOptions {
    fn from(config: &PreviewConfig) -> Self {
        Self {
            image_mime: config.image_mime.clone(),
            toolchain: config.rasterizer.program.clone(),
        }
    }
}

const LOADING_STYLE: &str = "body { font-family: sans-serif; display: flex; justify-content: center; align-items: center; height: 100vh; color: var(--vscode-editor-foreground); }";

const RENDERED_STYLE: &str = "body { display: flex; justify-content: center; padding: 20px; background-color: var(--vscode-editor-background); }\n\
img { max-width: 100%; height: auto; border: 1px solid var(--vscode-panel-border); }";

const ERRORED_STYLE: &str = "body { font-family: sans-serif; padding: 20px; color: var(--vscode-errorForeground); }\n\
pre { font-family: monospace; background-color: var(--vscode-textCodeBlock-background); padding: 10px; overflow-x: auto; white-space: pre-wrap; }";

/// Render `state` into a complete HTML document.
pub fn render(state: &DisplayState, options: &DisplayOptions) -> String {
    match state {
        DisplayState::Loading => page(LOADING_STYLE, "<h2>Rendering UI preview...</h2>"),
        DisplayState::Rendered(payload) => page(
            RENDERED_STYLE,
            &format!(
                "<img src=\"data:{};base64,{}\" alt=\"UI preview\" />",
                escape_html(&options.image_mime),
                escape_html(payload)
            ),
        ),
        DisplayState::Errored(message) => page(
            ERRORED_STYLE,
            &format!(
                "<h2>Failed to render UI</h2>\n<p>Check that '{}' is on your PATH and that its rendering toolchain is installed.</p>\n<pre>{}</pre>",
                escape_html(&options.toolchain),
                escape_html(message)
            ),
        ),
    }
}

fn page(style: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n<style>\n{}\n</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        style, body
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
