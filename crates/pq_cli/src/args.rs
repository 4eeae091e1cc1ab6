// crates/pq_cli/src/args.rs
//
// CLI argument surface and light pre-flight checks.
// - Contest input is a local JSON file (no scheme:// paths)
// - Output: --out dir, --render [text|json]* (text when omitted)
// - --validate-only loads and checks the contest without scoring it

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;

/// Parsed CLI arguments.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "pq",
    disable_help_subcommand = true,
    about = "Score a season-long prediction contest from a local contest file"
)]
pub struct Args {
    /// Contest JSON path (schedules, tables, entries, questions).
    #[arg(long)]
    pub contest: PathBuf,

    /// Output directory for JSON archives (default: current directory).
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Renderer(s) to emit: text prints tables to stdout, json writes archives to --out.
    #[arg(long, value_enum, num_args = 1..=2)]
    pub render: Vec<Render>,

    /// Load and validate the contest only; do not score.
    #[arg(long)]
    pub validate_only: bool,

    /// Only log warnings and errors.
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Render {
    Text,
    Json,
}

impl Args {
    /// Renderers to run; text when none were asked for.
    pub fn renders(&self) -> Vec<Render> {
        if self.render.is_empty() {
            vec![Render::Text]
        } else {
            let mut out = Vec::with_capacity(2);
            for r in &self.render {
                if !out.contains(r) {
                    out.push(*r);
                }
            }
            out
        }
    }
}

/// Errors surfaced by argument checks. Messages are short and stable.
#[derive(Debug)]
pub enum CliError {
    NonLocalPath(String),
    NotFound(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::NonLocalPath(p) => write!(f, "path must be a local file (no scheme): {p}"),
            CliError::NotFound(p) => write!(f, "file not found: {p}"),
        }
    }
}

impl std::error::Error for CliError {}

/// Entry point used by main.rs.
pub fn parse_and_validate() -> Result<Args, CliError> {
    check(Args::parse())
}

fn check(mut args: Args) -> Result<Args, CliError> {
    ensure_local_path(&args.contest)?;
    ensure_local_path(&args.out)?;
    ensure_local_exists(&args.contest, "--contest")?;
    args.contest = normalize_path(&args.contest);
    args.out = normalize_path(&args.out);
    Ok(args)
}

#[inline]
fn has_scheme(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.contains("://") || lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("file:")
}

#[inline]
fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    if let Some(s) = p.to_str() {
        if has_scheme(s) {
            return Err(CliError::NonLocalPath(s.to_string()));
        }
    }
    Ok(())
}

fn ensure_local_exists(p: &Path, label: &'static str) -> Result<(), CliError> {
    let meta = fs::metadata(p).map_err(|_| CliError::NotFound(format!("{label} {}", p.display())))?;
    if !meta.is_file() {
        return Err(CliError::NotFound(format!("{label} {}", p.display())));
    }
    Ok(())
}

/// Absolute path; falls back to joining the CWD when the path does not exist yet.
fn normalize_path(p: &Path) -> PathBuf {
    fs::canonicalize(p).unwrap_or_else(|_| {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(p)
        }
    })
}
