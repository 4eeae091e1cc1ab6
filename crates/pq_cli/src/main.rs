// crates/pq_cli/src/main.rs
//
// Exit codes, typed error mapping, the validate-only short-circuit, and the
// full run path (load → pipeline → text tables / JSON archives).

mod args;
mod logging;

mod exitcodes {
    pub const OK: u8 = 0;
    /// Bad flags, malformed or inconsistent contest file.
    pub const VALIDATION: u8 = 2;
    /// Read/write/path failures.
    pub const IO: u8 = 4;
    /// The run completed but at least one question failed on malformed input.
    pub const QUESTION_FAILED: u8 = 5;
}

use std::process::ExitCode;

use args::{parse_and_validate, Args, Render};
use pq_io::IoError;
use pq_pipeline::{archive_outcome, run_contest, ContestOutcome, PipelineError, QuestionStatus};
use tracing::{error, info};

/// Central error type for exit-code mapping.
#[derive(Debug)]
enum MainError {
    Validation(String),
    Io(String),
}

fn main() -> ExitCode {
    let args = match parse_and_validate() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("pq: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION);
        }
    };
    logging::init(args.quiet);

    let result = if args.validate_only { validate_only(&args) } else { run_once(&args) };
    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            let (code, msg) = match &e {
                MainError::Validation(m) => (exitcodes::VALIDATION, m),
                MainError::Io(m) => (exitcodes::IO, m),
            };
            error!(error = %msg, "run aborted");
            eprintln!("pq: error: {msg}");
            ExitCode::from(code)
        }
    }
}

fn validate_only(args: &Args) -> Result<u8, MainError> {
    let contest = pq_io::load_contest(&args.contest).map_err(map_io_err)?;
    if !args.quiet {
        eprintln!(
            "validate-only: contest {:?} OK ({} questions, {} entries)",
            contest.name,
            contest.questions.len(),
            contest.entries.len()
        );
    }
    Ok(exitcodes::OK)
}

fn run_once(args: &Args) -> Result<u8, MainError> {
    let contest = pq_io::load_contest(&args.contest).map_err(map_io_err)?;
    let outcome = run_contest(&contest);

    for render in args.renders() {
        match render {
            Render::Text => print!("{}", render_text(&outcome)),
            Render::Json => {
                let written = archive_outcome(&outcome, &args.out).map_err(map_pipeline_err)?;
                info!(dir = %args.out.display(), files = written.len(), "json archives written");
            }
        }
    }

    if outcome.has_failures() {
        for q in outcome.failed() {
            eprintln!("pq: question {} failed: {}", q.id, q.status.reason().unwrap_or(""));
        }
        return Ok(exitcodes::QUESTION_FAILED);
    }
    Ok(exitcodes::OK)
}

/// Every scored round's table, a status line for the rest, then overall standings.
fn render_text(outcome: &ContestOutcome) -> String {
    let mut out = String::new();
    for q in &outcome.questions {
        match (&q.status, &q.round) {
            (QuestionStatus::Scored, Some(round)) => {
                out.push_str(&round.table().to_string());
                out.push_str("\n\n");
            }
            (status, _) => {
                out.push_str(&format!("{} [{}]: {}\n\n", q.title, status.as_str(), status.reason().unwrap_or("")));
            }
        }
    }
    out.push_str(&outcome.standings.to_string());
    out.push('\n');
    out
}

fn map_io_err(e: IoError) -> MainError {
    match e {
        IoError::Json { .. } | IoError::Invalid(_) => MainError::Validation(e.to_string()),
        IoError::Path(_) => MainError::Io(e.to_string()),
    }
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    match e {
        PipelineError::Io(io) => map_io_err(io),
    }
}
