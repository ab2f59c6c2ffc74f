//! Output renderers and formatting helpers for CLI commands.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use mklink_core::LinkOutcome;
use mklink_telemetry::Metrics;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::{CliError, CliResult};

#[derive(Serialize)]
struct OutcomeRow<'a> {
    source: &'a Path,
    #[serde(flatten)]
    outcome: &'a LinkOutcome,
}

#[derive(Serialize)]
struct PrivilegeReport {
    allowed: bool,
}

pub(crate) fn render_batch(
    sources: &[PathBuf],
    outcomes: &[LinkOutcome],
    format: OutputFormat,
) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    write_batch(&mut stdout, sources, outcomes, format)
}

pub(crate) fn render_privilege(allowed: bool, format: OutputFormat) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    match format {
        OutputFormat::Json => write_json(&mut stdout, &PrivilegeReport { allowed }),
        OutputFormat::Table => {
            let state = if allowed { "allowed" } else { "denied" };
            writeln!(stdout, "symlink creation: {state}").map_err(write_failed)
        }
    }
}

pub(crate) fn render_metrics(metrics: &Metrics, format: OutputFormat) -> CliResult<()> {
    let mut stderr = io::stderr().lock();
    match format {
        OutputFormat::Json => write_json(&mut stderr, &metrics.snapshot()),
        OutputFormat::Table => {
            let text = metrics.render().map_err(CliError::failure)?;
            stderr.write_all(text.as_bytes()).map_err(write_failed)
        }
    }
}

fn write_batch(
    out: &mut impl Write,
    sources: &[PathBuf],
    outcomes: &[LinkOutcome],
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<OutcomeRow<'_>> = sources
                .iter()
                .zip(outcomes)
                .map(|(source, outcome)| OutcomeRow {
                    source: source.as_path(),
                    outcome,
                })
                .collect();
            write_json(out, &rows)
        }
        OutputFormat::Table => {
            writeln!(out, "{:<6} {:<20} SOURCE -> RESULT", "STATUS", "CODE").map_err(write_failed)?;
            for (source, outcome) in sources.iter().zip(outcomes) {
                let (status, code, detail) = if outcome.is_success() {
                    let link = outcome
                        .link_path()
                        .map_or_else(String::new, |path| path.display().to_string());
                    ("ok", "-", link)
                } else {
                    let code = outcome.error_code().map_or("-", |code| code.as_str());
                    let message = outcome.error_message().unwrap_or_default().to_string();
                    ("failed", code, message)
                };
                writeln!(
                    out,
                    "{status:<6} {code:<20} {} -> {detail}",
                    source.display()
                )
                .map_err(write_failed)?;
            }
            Ok(())
        }
    }
}

fn write_json<T: Serialize>(out: &mut impl Write, value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    writeln!(out, "{text}").map_err(write_failed)
}

fn write_failed(err: io::Error) -> CliError {
    CliError::failure(anyhow!("failed to write output: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mklink_core::ErrorCode;

    fn sample() -> (Vec<PathBuf>, Vec<LinkOutcome>) {
        (
            vec![PathBuf::from("/src/a"), PathBuf::from("/other/a")],
            vec![
                LinkOutcome::succeeded("/dest/a"),
                LinkOutcome::failed(ErrorCode::DuplicateName, "Duplicate name: a"),
            ],
        )
    }

    #[test]
    fn table_lists_each_source() -> Result<(), Box<dyn std::error::Error>> {
        let (sources, outcomes) = sample();
        let mut buffer = Vec::new();
        write_batch(&mut buffer, &sources, &outcomes, OutputFormat::Table)
            .map_err(|err| err.display_message())?;
        let text = String::from_utf8(buffer)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("ok"));
        assert!(lines[1].ends_with("/src/a -> /dest/a"));
        assert!(lines[2].contains("E_DUPLICATE_NAME"));
        assert!(lines[2].ends_with("/other/a -> Duplicate name: a"));
        Ok(())
    }

    #[test]
    fn json_rows_flatten_outcomes() -> Result<(), Box<dyn std::error::Error>> {
        let (sources, outcomes) = sample();
        let mut buffer = Vec::new();
        write_batch(&mut buffer, &sources, &outcomes, OutputFormat::Json)
            .map_err(|err| err.display_message())?;
        let value: serde_json::Value = serde_json::from_slice(&buffer)?;
        assert_eq!(value[0]["source"], "/src/a");
        assert_eq!(value[0]["success"], true);
        assert_eq!(value[0]["link_path"], "/dest/a");
        assert_eq!(value[1]["error_code"], "E_DUPLICATE_NAME");
        assert!(value[1].get("link_path").is_none());
        Ok(())
    }
}
