//! reqmark - Attach requirement notes to ranges of source code
//!
//! The default command runs the language server on stdio. `list` and
//! `hover` read the annotations file directly, without an editor.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use eyre::Result;
use owo_colors::OwoColorize;
use reqmark::config::{Config, config_path, load_config};
use reqmark_core::{Annotation, JsonFileStorage, Position, Workspace};
use tracing_subscriber::EnvFilter;

/// CLI arguments
#[derive(Debug, Parser)]
#[command(name = "reqmark", version, about)]
struct Args {
    /// Project root (default: nearest directory with .git or .vscode)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Path to config file (default: <root>/.config/reqmark/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to run (default: lsp)
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the language server over stdio
    Lsp,

    /// Print stored annotations
    List {
        /// Only annotations of this file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Print the hover text for a position (zero-based line and character)
    Hover {
        file: PathBuf,
        line: u32,
        character: u32,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // stdout is the LSP channel, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("REQMARK_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();

    match args.command {
        None | Some(Command::Lsp) => reqmark::lsp::run(args.root, args.config).await,
        Some(Command::List { file }) => {
            let (root, workspace) = open_workspace(args.root, args.config)?;
            let file = file.map(|f| absolute_in(&root, &f));
            run_list(&workspace, file.as_deref());
            Ok(())
        }
        Some(Command::Hover {
            file,
            line,
            character,
        }) => {
            let (root, workspace) = open_workspace(args.root, args.config)?;
            let file = absolute_in(&root, &file);
            match workspace.hover(&file, Position::new(line, character)) {
                Some(markup) => println!("{markup}"),
                None => eprintln!(
                    "{} No annotations at {}:{}:{}",
                    "->".blue().bold(),
                    file,
                    line,
                    character
                ),
            }
            Ok(())
        }
    }
}

fn open_workspace(
    root: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<(PathBuf, Workspace<JsonFileStorage, ()>)> {
    let root = match root {
        Some(r) => r,
        None => reqmark::find_project_root()?,
    };
    let config: Config = load_config(&config.unwrap_or_else(|| config_path(&root)))?;
    let workspace = Workspace::open(config.storage(&root));
    Ok((root, workspace))
}

/// Stored paths are absolute; resolve relative CLI paths against the root
fn absolute_in(root: &Path, file: &Path) -> String {
    if file.is_absolute() {
        file.to_string_lossy().into_owned()
    } else {
        root.join(file).to_string_lossy().into_owned()
    }
}

fn run_list(workspace: &Workspace<JsonFileStorage, ()>, file: Option<&str>) {
    let annotations: Vec<&Annotation> = workspace
        .store()
        .iter()
        .filter(|a| file.is_none_or(|f| a.file_path == f))
        .collect();

    if annotations.is_empty() {
        eprintln!("{} No annotations found", "->".blue().bold());
        return;
    }

    for annotation in annotations {
        let swatch = match parse_hex(&annotation.color) {
            Some((r, g, b)) => "■".truecolor(r, g, b).to_string(),
            None => "■".to_string(),
        };
        println!(
            "{} {}:{} {}",
            swatch,
            annotation.file_path.cyan(),
            annotation.range.yellow(),
            annotation.text.bold()
        );
        if let Some(url) = &annotation.url {
            println!("    {}", url.dimmed());
        }
    }
}

/// `#RRGGBB` or `#RRGGBBAA`
fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 && hex.len() != 8 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}
