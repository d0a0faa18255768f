use anyhow::{Context, Result};
use colored::*;
use llmdoc_core::{
    Diagnostic, DiagnosticKind, RunReport, TOOL_IGNORE_FILENAME, VCS_IGNORE_FILENAME,
};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Reports diagnostics, performs the single whole-file document write (the
/// last step of the invocation), and prints the end-of-run summary.
pub fn finish_run(report: &RunReport, quiet: bool) -> Result<()> {
    print_diagnostics(&report.diagnostics, quiet);

    match &report.document {
        Some(content) => {
            write_to_file(&report.document_path, content)?;
            if !quiet {
                println!(
                    "{} Appended {} file(s) to: {}",
                    "✅".green(),
                    report.appended_files,
                    report.document_path.display().to_string().blue()
                );
                println!("{}", summary_line(report).dimmed());
            }
        }
        None => {
            if !quiet {
                eprintln!(
                    "{} {}",
                    "⚠️".yellow(),
                    "No text content and no overview to write; document left untouched.".yellow()
                );
            }
        }
    }
    Ok(())
}

fn summary_line(report: &RunReport) -> String {
    format!(
        "{} directorie(s) scanned, {} binary file(s) skipped, {} excluded by {}, {} excluded by {}",
        report.directories_scanned,
        report.binary_skipped,
        report.vcs_excluded,
        VCS_IGNORE_FILENAME,
        report.tool_excluded,
        TOOL_IGNORE_FILENAME
    )
}

fn print_diagnostics(diagnostics: &[Diagnostic], quiet: bool) {
    if diagnostics.is_empty() || quiet {
        return;
    }
    eprintln!(
        "\n{}",
        "⚠️ Warning: some entries were skipped:".yellow()
    );
    for diag in diagnostics {
        eprintln!(
            " - {} ({}): {}",
            diag.path.display(),
            kind_label(diag.kind),
            diag.message
        );
    }
    eprintln!("---");
}

fn kind_label(kind: DiagnosticKind) -> &'static str {
    match kind {
        DiagnosticKind::UnlistableDirectory => "unlistable directory",
        DiagnosticKind::UnreadableFile => "unreadable file",
        DiagnosticKind::NonUtf8File => "non-UTF-8 file",
        DiagnosticKind::BinarySkipped => "binary content",
        DiagnosticKind::RecursionLimit => "recursion limit",
        DiagnosticKind::UnresolvableSelection => "unresolvable selection",
        _ => "skipped",
    }
}

pub fn write_to_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let mut file =
        File::create(path).with_context(|| format!("Failed to create file {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write to file {}", path.display()))?;
    Ok(())
}
