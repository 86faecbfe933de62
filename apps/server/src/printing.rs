//! Printer backends for sending receipt PDFs to the OS print system.
//!
//! Supports:
//! - CUPS on unix (`lpstat`, `lp`)
//! - Windows installed printers (PowerShell)
//! - A null backend everywhere else
//!
//! The backend is picked once at startup by [`system_printer`]. A failed print
//! is reported to the caller as a [`PrintOutcome`]; it never changes receipt
//! state.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;
use tracing::{info, instrument, warn};

/// Upper bound on any print subprocess.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Printer error types
#[derive(Debug, thiserror::Error)]
pub enum PrintError {
    /// The helper program could not be started
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        source: std::io::Error,
    },

    /// The helper program exited unsuccessfully
    #[error("{program} failed: {message}")]
    Command {
        program: &'static str,
        message: String,
    },

    /// Timeout waiting for the print system
    #[error("Timeout waiting for {0}")]
    Timeout(&'static str),

    /// No print system on this platform
    #[error("Printing is not supported on this platform")]
    Unsupported,
}

pub type PrintResult<T> = Result<T, PrintError>;

/// What the print endpoint reports back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintOutcome {
    pub success: bool,
    pub message: String,
}

impl PrintOutcome {
    pub fn from_result(result: PrintResult<String>) -> Self {
        match result {
            Ok(message) => PrintOutcome {
                success: true,
                message,
            },
            Err(e) => PrintOutcome {
                success: false,
                message: e.to_string(),
            },
        }
    }
}

/// Trait for printer backends
#[async_trait]
pub trait Printer: Send + Sync {
    /// Names of the printers the OS knows about
    async fn list_printers(&self) -> PrintResult<Vec<String>>;

    /// Sends a file to `printer`, or to the system default when `None`.
    /// Returns a human-readable confirmation.
    async fn print_file(&self, path: &Path, printer: Option<&str>) -> PrintResult<String>;
}

/// The backend for the platform this binary was built for.
pub fn system_printer() -> Arc<dyn Printer> {
    #[cfg(unix)]
    {
        Arc::new(CupsPrinter)
    }
    #[cfg(windows)]
    {
        Arc::new(WindowsPrinter)
    }
    #[cfg(not(any(unix, windows)))]
    {
        Arc::new(NullPrinter)
    }
}

/// Runs a helper program with a timeout, returning stdout on success.
async fn run(program: &'static str, args: &[&str]) -> PrintResult<String> {
    run_with_timeout(program, args, COMMAND_TIMEOUT).await
}

/// A child that outlives `limit` is killed, not left behind.
async fn run_with_timeout(program: &'static str, args: &[&str], limit: Duration) -> PrintResult<String> {
    let mut command = Command::new(program);
    command.args(args).kill_on_drop(true);

    let output = tokio::time::timeout(limit, command.output())
        .await
        .map_err(|_| PrintError::Timeout(program))?
        .map_err(|source| PrintError::Spawn { program, source })?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(PrintError::Command {
            program,
            message: if stderr.is_empty() {
                output.status.to_string()
            } else {
                stderr
            },
        })
    }
}

// =============================================================================
// CUPS
// =============================================================================

/// CUPS via `lpstat` / `lp`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CupsPrinter;

#[async_trait]
impl Printer for CupsPrinter {
    #[instrument(skip(self))]
    async fn list_printers(&self) -> PrintResult<Vec<String>> {
        let stdout = run("lpstat", &["-e"]).await?;
        Ok(parse_lines(&stdout))
    }

    #[instrument(skip(self, path), fields(path = %path.display()))]
    async fn print_file(&self, path: &Path, printer: Option<&str>) -> PrintResult<String> {
        let file = path.to_string_lossy();
        let mut args: Vec<&str> = Vec::with_capacity(3);
        if let Some(name) = printer {
            args.extend(["-d", name]);
        }
        args.push(file.as_ref());

        let stdout = run("lp", &args).await?;
        let message = match stdout.trim() {
            "" => "Print job submitted".to_string(),
            s => s.to_string(),
        };
        info!(printer = printer.unwrap_or("default"), "Print job submitted");
        Ok(message)
    }
}

// =============================================================================
// Windows
// =============================================================================

/// Installed Windows printers via PowerShell.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsPrinter;

#[async_trait]
impl Printer for WindowsPrinter {
    async fn list_printers(&self) -> PrintResult<Vec<String>> {
        let stdout = run(
            "powershell",
            &["-NoProfile", "-Command", "Get-Printer | Select-Object -ExpandProperty Name"],
        )
        .await?;
        Ok(parse_lines(&stdout))
    }

    async fn print_file(&self, path: &Path, printer: Option<&str>) -> PrintResult<String> {
        let file = powershell_quote(&path.to_string_lossy());
        let script = match printer {
            Some(name) => format!(
                "Start-Process -FilePath {file} -Verb PrintTo -ArgumentList {} -WindowStyle Hidden",
                powershell_quote(&format!("\"{name}\""))
            ),
            None => format!("Start-Process -FilePath {file} -Verb Print -WindowStyle Hidden"),
        };

        run("powershell", &["-NoProfile", "-Command", &script]).await?;
        info!(printer = printer.unwrap_or("default"), "Print job submitted");
        Ok("Print job submitted".to_string())
    }
}

/// Single-quoted PowerShell literal.
fn powershell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

// =============================================================================
// Null
// =============================================================================

/// Used where no print system is available, and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPrinter;

#[async_trait]
impl Printer for NullPrinter {
    async fn list_printers(&self) -> PrintResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn print_file(&self, _path: &Path, _printer: Option<&str>) -> PrintResult<String> {
        warn!("Print requested but no print system is available");
        Err(PrintError::Unsupported)
    }
}

fn parse_lines(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines() {
        assert_eq!(
            parse_lines("Office_Laser\n\n  Receipt_80mm  \n"),
            vec!["Office_Laser", "Receipt_80mm"]
        );
        assert!(parse_lines("").is_empty());
    }

    #[test]
    fn test_powershell_quote() {
        assert_eq!(powershell_quote("C:\\r\\a.pdf"), "'C:\\r\\a.pdf'");
        assert_eq!(powershell_quote("O'Brien"), "'O''Brien'");
    }

    #[test]
    fn test_outcome_from_result() {
        let ok = PrintOutcome::from_result(Ok("request id is P-1".into()));
        assert!(ok.success);
        assert_eq!(ok.message, "request id is P-1");

        let failed = PrintOutcome::from_result(Err(PrintError::Unsupported));
        assert!(!failed.success);
        assert_eq!(failed.message, "Printing is not supported on this platform");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timed_out_command_is_killed() {
        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("finished");
        let script = format!("sleep 1 && touch '{}'", marker.display());

        let result = run_with_timeout("sh", &["-c", &script], Duration::from_millis(100)).await;
        assert!(matches!(result, Err(PrintError::Timeout("sh"))));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_command_reports_stderr() {
        let result = run_with_timeout("sh", &["-c", "echo 'no such printer' >&2; exit 1"], Duration::from_secs(5)).await;
        match result {
            Err(PrintError::Command { program, message }) => {
                assert_eq!(program, "sh");
                assert_eq!(message, "no such printer");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_null_printer() {
        let printer = NullPrinter;
        assert!(printer.list_printers().await.unwrap().is_empty());
        assert!(printer.print_file(Path::new("/tmp/x.pdf"), None).await.is_err());
    }
}
