//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::combine::CombineMode;
use crate::registry::ContentKind;

/// Combine HTML, CSS and JS files into one page, or serve them locally
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: htmlcomb.toml when present)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output (per-request logs)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve files locally and open an interactive console
    #[command(visible_alias = "s")]
    Serve {
        /// Files to register at startup
        #[arg(value_hint = clap::ValueHint::FilePath)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        kinds: KindArgs,

        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Combine files into one standalone HTML document
    #[command(visible_alias = "c")]
    Combine {
        /// Files to combine, in order
        #[arg(required = true, value_hint = clap::ValueHint::FilePath)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        kinds: KindArgs,

        /// Document title (default: "Combined App")
        #[arg(short, long)]
        title: Option<String>,

        /// Embed CSS/JS bodies (inline) or reference the files (linked)
        #[arg(short, long, value_enum)]
        mode: Option<CombineMode>,

        /// Minify the combined document
        #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        minify: Option<bool>,

        /// Output file, `-` for stdout (default: combined.html)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Print the registry the given files would produce, as JSON
    #[command(visible_alias = "l")]
    List {
        /// Files to register, in order
        #[arg(required = true, value_hint = clap::ValueHint::FilePath)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        kinds: KindArgs,

        /// Pretty-print JSON output
        #[arg(short, long)]
        pretty: bool,
    },
}

/// Kind overrides shared by every subcommand.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct KindArgs {
    /// Override a file's kind, e.g. `-k page.txt=html` (repeatable)
    #[arg(short = 'k', long = "kind", value_name = "NAME=KIND", value_parser = parse_kind_override)]
    pub kinds: Vec<(String, ContentKind)>,
}

impl KindArgs {
    /// Override for `name` (case-insensitive; the last one given wins).
    pub fn lookup(&self, name: &str) -> Option<ContentKind> {
        self.kinds
            .iter()
            .rev()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, kind)| *kind)
    }
}

fn parse_kind_override(s: &str) -> Result<(String, ContentKind), String> {
    let (name, kind) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=KIND, got `{s}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing file name in `{s}`"));
    }
    Ok((name.to_string(), kind.trim().parse()?))
}
