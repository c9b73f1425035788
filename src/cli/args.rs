//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::asset::AssetFamily;

/// Sidecar asset server and diagram rasterizer for documentation sites
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Content directory path (relative to project root)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub content: Option<PathBuf>,

    /// Config file path (default: sidecar.toml)
    #[arg(short = 'C', long, global = true, default_value = "sidecar.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve sidecar assets over HTTP
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Cache asset bytes in memory (revalidated by mtime)
        #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        cache: Option<bool>,

        /// Enable the `/preview/...` rasterizing endpoint
        #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        preview: Option<bool>,
    },

    /// Print every existing asset route for one asset family as JSON
    #[command(visible_alias = "p")]
    Params {
        #[command(flatten)]
        args: ParamsArgs,
    },

    /// Print the navigation page tree as JSON
    #[command(visible_alias = "t")]
    Tree {
        /// Keep empty folders as folders instead of converting them to pages
        #[arg(short, long)]
        raw: bool,

        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Render diagram files to PNG, SVG or PDF with a headless browser
    #[command(visible_alias = "r")]
    Render {
        #[command(flatten)]
        args: RenderArgs,
    },
}

/// Asset family selector for the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyArg {
    Bpmn,
    Excalidraw,
}

impl From<FamilyArg> for AssetFamily {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::Bpmn => Self::Bpmn,
            FamilyArg::Excalidraw => Self::Excalidraw,
        }
    }
}

/// Params command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ParamsArgs {
    /// Asset family to enumerate
    #[arg(value_enum)]
    pub family: FamilyArg,

    /// Pretty-print JSON output
    #[arg(short, long)]
    pub pretty: bool,

    /// Write output to file instead of stdout
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

/// Render command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct RenderArgs {
    /// Diagram files to render (.bpmn, .excalidraw)
    #[arg(required = true, value_hint = clap::ValueHint::FilePath)]
    pub inputs: Vec<PathBuf>,

    /// Explicit output file (only valid with a single input)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Output directory (default: next to each input)
    #[arg(short = 'd', long, value_hint = clap::ValueHint::DirPath)]
    pub out_dir: Option<PathBuf>,

    /// Output formats, derived from file extensions (comma-separated)
    #[arg(short, long, value_delimiter = ',', default_value = "png")]
    pub formats: Vec<String>,

    /// Title shown with the diagram (empty uses the file name)
    #[arg(long, conflicts_with = "no_title")]
    pub title: Option<String>,

    /// Do not render a title
    #[arg(long)]
    pub no_title: bool,

    /// Footer text shown below the diagram
    #[arg(long)]
    pub footer: Option<String>,

    /// Minimum output width in CSS pixels
    #[arg(long)]
    pub min_width: Option<u32>,

    /// Minimum output height in CSS pixels
    #[arg(long)]
    pub min_height: Option<u32>,

    /// Device scale factor (pixel density multiplier)
    #[arg(short, long)]
    pub scale: Option<f64>,
}
