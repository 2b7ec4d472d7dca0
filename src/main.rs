//! grimoire - Command-line driver
//!
//! Runs the markup engine over a file:
//!
//! ```text
//! grimoire stats   <file>            metrics of the file
//! grimoire check   <file>            parse/serialize round trip
//! grimoire tree    <file> [--read|--write]
//! grimoire preview <file>            HTML preview document
//! grimoire mode [read|write|toggle]  show or set the default mode
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use grimoire::config::{load_config, save_config, EditorMode};
use grimoire::editor::Metrics;
use grimoire::error::{Error, Result};
use grimoire::markdown::{
    generate_preview_document, parse_markdown_with_options, serialize_with_options,
};
use log::{debug, error, info};

/// Application name constant.
const APP_NAME: &str = "grimoire";

const USAGE: &str = "usage: grimoire <stats|check|tree|preview> <file> [--read|--write]\n       \
                     grimoire mode [read|write|toggle]";

/// Parsed command line.
struct Invocation {
    command: String,
    operand: Option<String>,
    mode: Option<EditorMode>,
}

impl Invocation {
    /// The file operand of a file command.
    fn path(&self) -> Result<PathBuf> {
        self.operand
            .as_ref()
            .map(PathBuf::from)
            .ok_or_else(|| Error::Application(USAGE.to_string()))
    }
}

fn main() -> ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let invocation = parse_args(std::env::args().skip(1))?;
    debug!("Starting {} {}", APP_NAME, invocation.command);

    if invocation.command == "mode" {
        return set_default_mode(invocation.operand.as_deref());
    }

    let path = invocation.path()?;
    let source = read_source(&path)?;

    match invocation.command.as_str() {
        "stats" => {
            let metrics = Metrics::from_text(&source);
            println!("{}", metrics.format_compact());
            println!("characters: {}", metrics.characters);
            println!("words:      {}", metrics.words);
            println!("lines:      {}", metrics.lines);
            println!("size:       {}", metrics.format_size());
            Ok(ExitCode::SUCCESS)
        }
        "check" => Ok(check_round_trip(&source, invocation.mode.unwrap_or_default())),
        "tree" => {
            let mode = invocation
                .mode
                .unwrap_or_else(|| load_config().default_mode);
            info!("Parsing in {} mode", mode.label());
            let document = parse_markdown_with_options(&source, &mode.markdown_options());
            print!("{}", document);
            Ok(ExitCode::SUCCESS)
        }
        "preview" => {
            let title = path
                .file_stem()
                .and_then(|stem| stem.to_str());
            println!("{}", generate_preview_document(&source, title));
            Ok(ExitCode::SUCCESS)
        }
        other => Err(Error::Application(format!(
            "unknown command '{}'\n{}",
            other, USAGE
        ))),
    }
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Invocation> {
    let mut positional = Vec::new();
    let mut mode = None;

    for arg in args {
        match arg.as_str() {
            "--read" => mode = Some(EditorMode::Read),
            "--write" => mode = Some(EditorMode::Write),
            flag if flag.starts_with("--") => {
                return Err(Error::Application(format!(
                    "unknown option '{}'\n{}",
                    flag, USAGE
                )))
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    match (positional.next(), positional.next(), positional.next()) {
        (Some(command), operand, None) if command == "mode" || operand.is_some() => Ok(Invocation {
            command,
            operand,
            mode,
        }),
        _ => Err(Error::Application(USAGE.to_string())),
    }
}

/// Print the configured default mode, or change and persist it.
fn set_default_mode(operand: Option<&str>) -> Result<ExitCode> {
    let mut settings = load_config();
    let Some(operand) = operand else {
        println!("{}", settings.default_mode.label());
        return Ok(ExitCode::SUCCESS);
    };

    settings.default_mode = next_mode(settings.default_mode, operand)?;
    save_config(&settings)?;
    info!("Default mode set to {}", settings.default_mode.label());
    Ok(ExitCode::SUCCESS)
}

fn next_mode(current: EditorMode, operand: &str) -> Result<EditorMode> {
    match operand {
        "read" => Ok(EditorMode::Read),
        "write" => Ok(EditorMode::Write),
        "toggle" => Ok(current.toggle()),
        other => Err(Error::Application(format!(
            "unknown mode '{}'\n{}",
            other, USAGE
        ))),
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize the parsed file and compare it with the source line by line.
fn check_round_trip(source: &str, mode: EditorMode) -> ExitCode {
    let options = mode.markdown_options();
    let output = serialize_with_options(&parse_markdown_with_options(source, &options), &options);

    match first_differing_line(source, &output) {
        None => {
            println!("ok: {} lines round-trip unchanged", source.split('\n').count());
            ExitCode::SUCCESS
        }
        Some(line) => {
            println!("line {} differs:", line);
            println!("  source: {}", nth_line(source, line));
            println!("  output: {}", nth_line(&output, line));
            ExitCode::FAILURE
        }
    }
}

/// 1-based number of the first line where the texts differ.
fn first_differing_line(expected: &str, actual: &str) -> Option<usize> {
    let mut expected = expected.split('\n');
    let mut actual = actual.split('\n');
    let mut line = 1;
    loop {
        match (expected.next(), actual.next()) {
            (None, None) => return None,
            (Some(a), Some(b)) if a == b => line += 1,
            _ => return Some(line),
        }
    }
}

fn nth_line(text: &str, line: usize) -> &str {
    text.split('\n').nth(line - 1).unwrap_or("<end of file>")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn test_parse_args_with_mode() {
        let invocation = parse_args(args(&["tree", "note.md", "--read"])).unwrap();
        assert_eq!(invocation.command, "tree");
        assert_eq!(invocation.path().unwrap(), PathBuf::from("note.md"));
        assert_eq!(invocation.mode, Some(EditorMode::Read));
    }

    #[test]
    fn test_parse_args_rejects_missing_file() {
        assert!(parse_args(args(&["stats"])).is_err());
        assert!(parse_args(args(&["stats", "a", "b"])).is_err());
        assert!(parse_args(args(&["stats", "a", "--fast"])).is_err());
    }

    #[test]
    fn test_parse_args_mode_command() {
        let invocation = parse_args(args(&["mode"])).unwrap();
        assert_eq!(invocation.operand, None);
        assert!(invocation.path().is_err());

        let invocation = parse_args(args(&["mode", "toggle"])).unwrap();
        assert_eq!(invocation.operand.as_deref(), Some("toggle"));
    }

    #[test]
    fn test_next_mode() {
        assert_eq!(next_mode(EditorMode::Write, "toggle").unwrap(), EditorMode::Read);
        assert_eq!(next_mode(EditorMode::Read, "toggle").unwrap(), EditorMode::Write);
        assert_eq!(next_mode(EditorMode::Read, "read").unwrap(), EditorMode::Read);
        assert_eq!(next_mode(EditorMode::Read, "write").unwrap(), EditorMode::Write);
        assert!(matches!(
            next_mode(EditorMode::Write, "edit"),
            Err(Error::Application(_))
        ));
    }

    #[test]
    fn test_first_differing_line() {
        assert_eq!(first_differing_line("a\nb", "a\nb"), None);
        assert_eq!(first_differing_line("a\nb\nc", "a\nx\nc"), Some(2));
        assert_eq!(first_differing_line("a\nb", "a"), Some(2));
    }

    #[test]
    fn test_canonical_file_round_trips() {
        let source = "# Title\n- **bold** item\n*x ";
        let options = EditorMode::Write.markdown_options();
        let output = serialize_with_options(&parse_markdown_with_options(source, &options), &options);
        assert_eq!(first_differing_line(source, &output), None);
        assert_eq!(nth_line(source, 3), "*x ");
    }

    #[test]
    fn test_read_source_missing_file() {
        let result = read_source(Path::new("/nonexistent/grimoire/note.md"));
        assert!(matches!(result, Err(Error::FileRead { .. })));
    }
}
