use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uipreview::display::{self, DisplayOptions, DisplayState};
use uipreview::host::FilePanelHost;
use uipreview::watcher::SaveWatcher;
use uipreview::{PayloadEncoding, PreviewConfig, ProcessRasterizer, Rasterizer, RenderResult};

#[derive(Parser)]
#[command(name = "uipreview")]
#[command(version)]
#[command(about = "Preview Qt .ui files through an external rasterizer", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Rasterizer program (overrides the configuration file)
    #[arg(long, global = true)]
    rasterizer: Option<String>,

    /// Argument passed to the rasterizer before the file path (repeatable)
    #[arg(long = "rasterizer-arg", global = true, allow_hyphen_values = true)]
    rasterizer_args: Vec<String>,

    /// Rasterizer timeout in milliseconds (0 disables it)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Treat the rasterizer's stdout as raw image bytes instead of base64
    #[arg(long, global = true)]
    binary_output: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a file once and print the preview document
    Render {
        file: PathBuf,

        /// Print only the encoded image payload
        #[arg(long)]
        payload: bool,
    },
    /// Keep a preview document up to date while files are saved
    Watch {
        /// Files to watch; the first one is previewed
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Where the preview document is written
        #[arg(long, default_value = "uipreview.html")]
        out: PathBuf,
    },
}

impl Cli {
    fn load_config(&self) -> Result<PreviewConfig> {
        let mut config = match &self.config {
            Some(path) => PreviewConfig::from_json_file(path)?,
            None => PreviewConfig::default(),
        };
        if let Some(program) = &self.rasterizer {
            config.rasterizer.program = program.clone();
            config.rasterizer.args = self.rasterizer_args.clone();
        } else if !self.rasterizer_args.is_empty() {
            config.rasterizer.args = self.rasterizer_args.clone();
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout_ms = ms;
        }
        if self.binary_output {
            config.payload_encoding = PayloadEncoding::Binary;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    // Handlers run one at a time, matching an editor's event loop.
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    rt.block_on(async {
        match cli.command {
            Command::Render { file, payload } => render_once(config, file, payload).await,
            Command::Watch { files, out } => watch(config, files, out).await,
        }
    })
}

async fn render_once(config: PreviewConfig, file: PathBuf, payload_only: bool) -> Result<()> {
    let file = config.resolve_selection(Some(file), None)?;
    let rasterizer = ProcessRasterizer::new(&config);

    match rasterizer.invoke(&file).await {
        RenderResult::Success(payload) if payload_only => {
            println!("{}", payload);
            Ok(())
        }
        RenderResult::Success(payload) => {
            let html = display::render(&DisplayState::Rendered(payload), &DisplayOptions::from(&config));
            print!("{}", html);
            Ok(())
        }
        RenderResult::Failure(message) => bail!("{}", message),
    }
}

async fn watch(config: PreviewConfig, files: Vec<PathBuf>, out: PathBuf) -> Result<()> {
    // Save notifications carry canonical paths, so preview the canonical one.
    let first = files.first().context("no file to watch")?;
    let first = first
        .canonicalize()
        .with_context(|| format!("cannot watch {}", first.display()))?;
    let mut watcher = SaveWatcher::new(&files)?;

    let handle = uipreview::start(config, FilePanelHost::new(&out))?;
    handle.preview(Some(first.clone()), None).await?;
    log::info!("Writing preview of {} to {}", first.display(), out.display());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            saved = watcher.next_save() => match saved {
                Some(path) => handle.file_saved(path)?,
                None => break,
            },
        }
    }

    handle.shutdown().await?;
    Ok(())
}
