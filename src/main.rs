use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use serde::Serialize;
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode, WriteLogger};

use chatmark::core::config::{self, CliOverrides};
use chatmark::render::highlight::HighlightStyle;
use chatmark::{Renderer, StreamRenderer, split_chunks};

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum OutputFormat {
    /// Raw HTML; frames separated by `<!-- frame N -->` comments
    #[default]
    Html,
    /// One JSON object per frame
    Jsonl,
}

#[derive(Parser)]
#[command(name = "chatmark", about = "Render chat Markdown to HTML")]
struct Args {
    /// Markdown file to render (reads stdin if omitted)
    input: Option<PathBuf>,

    /// Replay the input chunk by chunk, printing every intermediate frame
    #[arg(long)]
    stream: bool,

    /// Characters per chunk in --stream mode
    #[arg(
        long,
        default_value_t = 16,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    chunk_size: usize,

    /// Output format for --stream frames
    #[arg(long, default_value_t, value_enum)]
    format: OutputFormat,

    /// syntect theme for highlighting (an unknown name lists the bundled ones)
    #[arg(long)]
    theme: Option<String>,

    #[arg(long, value_enum)]
    highlight_style: Option<HighlightStyle>,

    /// Emit code blocks escaped but uncoloured
    #[arg(long)]
    no_highlight: bool,

    /// Wrap code blocks with a language header and copy button
    #[arg(long)]
    copy_buttons: bool,

    /// Escape raw HTML found in the input
    #[arg(long)]
    escape_html: bool,

    /// Fail on render errors instead of printing the source text
    #[arg(long)]
    strict: bool,

    /// Print the highlight stylesheet and exit
    #[arg(long)]
    css: bool,

    /// Config file to use instead of ~/.chatmark/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write debug logs here (default: warnings on stderr)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            theme: self.theme.clone(),
            highlight_style: self.highlight_style,
            no_highlight: self.no_highlight,
            copy_buttons: self.copy_buttons,
            escape_html: self.escape_html,
            strict: self.strict,
        }
    }
}

#[derive(Serialize)]
struct Frame<'a> {
    frame: usize,
    done: bool,
    html: &'a str,
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();
    init_logging(args.log_file.as_deref());

    let file_config = match &args.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    }
    .map_err(io::Error::other)?;
    let options = config::resolve(&file_config, &args.overrides());
    let renderer = Renderer::new(options).map_err(io::Error::other)?;
    log::info!("chatmark starting with options: {:?}", renderer.options());
    let mut out = io::stdout().lock();

    if args.css {
        let css = renderer.stylesheet().map_err(io::Error::other)?;
        return out.write_all(css.as_bytes());
    }

    let text = read_input(args.input.as_deref())?;
    if args.stream {
        write_frames(&renderer, &text, args.chunk_size, args.format, &mut out)
    } else {
        let html = renderer.render_markdown(&text).map_err(io::Error::other)?;
        out.write_all(html.as_bytes())
    }
}

/// File logging at debug level when asked for, otherwise warnings on stderr
/// so stdout carries nothing but HTML.
fn init_logging(log_file: Option<&Path>) {
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Some(path) = log_file {
        match File::create(path) {
            Ok(file) => {
                let _ = WriteLogger::init(LevelFilter::Debug, log_config, file);
                return;
            }
            Err(e) => eprintln!("chatmark: cannot open log file {}: {e}", path.display()),
        }
    }
    let _ = TermLogger::init(
        LevelFilter::Warn,
        log_config,
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

fn read_input(path: Option<&Path>) -> io::Result<String> {
    match path {
        Some(p) => fs::read_to_string(p),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn write_frames(
    renderer: &Renderer,
    text: &str,
    chunk_size: usize,
    format: OutputFormat,
    out: &mut impl Write,
) -> io::Result<()> {
    let mut stream = StreamRenderer::new(renderer);
    for chunk in split_chunks(text, chunk_size) {
        let html = stream.push(chunk).map_err(io::Error::other)?;
        write_frame(out, format, stream.frames(), false, &html)?;
    }
    let frame = stream.frames() + 1;
    let html = stream.finish().map_err(io::Error::other)?;
    write_frame(out, format, frame, true, &html)
}

fn write_frame(
    out: &mut impl Write,
    format: OutputFormat,
    frame: usize,
    done: bool,
    html: &str,
) -> io::Result<()> {
    match format {
        OutputFormat::Html => {
            let label = if done { "final" } else { "frame" };
            writeln!(out, "<!-- {label} {frame} -->")?;
            out.write_all(html.as_bytes())
        }
        OutputFormat::Jsonl => {
            let line = serde_json::to_string(&Frame { frame, done, html })?;
            writeln!(out, "{line}")
        }
    }
}
