use std::io::{self, Write};

use colored::Colorize;

use crate::diff::{DiffResult, DocumentDiff, DocumentStatus, FieldChange};

pub const NO_DIFFERENCES: &str = "No differences found between rendered manifests.";

/// Render the diff result to `out`. Returns whether any difference exists;
/// when none does, only the fixed no-differences line is emitted.
pub fn print(
    result: &DiffResult,
    ref_label: &str,
    plain: bool,
    out: &mut dyn Write,
) -> io::Result<bool> {
    if !result.has_differences() {
        writeln!(out)?;
        writeln!(out, "{NO_DIFFERENCES}")?;
        return Ok(false);
    }

    writeln!(out)?;
    writeln!(out, "--- Diff ({ref_label} vs. local) ---")?;
    match result {
        DiffResult::Unified(text) => write_unified(text, plain, out)?,
        DiffResult::Semantic(docs) => write_semantic(docs, plain, out)?,
    }
    Ok(true)
}

/// Standard unified-diff coloring: additions green, removals red, hunk
/// headers cyan. The `---`/`+++` file headers and context lines stay
/// uncolored so the eye lands on the changes.
fn write_unified(text: &str, plain: bool, out: &mut dyn Write) -> io::Result<()> {
    for line in text.lines() {
        if plain || line.starts_with("---") || line.starts_with("+++") {
            writeln!(out, "{line}")?;
        } else if line.starts_with('+') {
            writeln!(out, "{}", line.green())?;
        } else if line.starts_with('-') {
            writeln!(out, "{}", line.red())?;
        } else if line.starts_with("@@") {
            writeln!(out, "{}", line.cyan())?;
        } else {
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

/// Semantic report: grouped by document, then by field path.
fn write_semantic(docs: &[DocumentDiff], plain: bool, out: &mut dyn Write) -> io::Result<()> {
    for doc in docs {
        let heading = match doc.status {
            DocumentStatus::Added => format!("+ {} (added)", doc.label),
            DocumentStatus::Removed => format!("- {} (removed)", doc.label),
            DocumentStatus::Modified => format!("~ {}", doc.label),
        };
        writeln!(out)?;
        if plain {
            writeln!(out, "{heading}")?;
        } else {
            match doc.status {
                DocumentStatus::Added => writeln!(out, "{}", heading.green())?,
                DocumentStatus::Removed => writeln!(out, "{}", heading.red())?,
                DocumentStatus::Modified => writeln!(out, "{}", heading.bold())?,
            }
        }

        for change in &doc.changes {
            let line = match change {
                FieldChange::Added { path, value } => format!("  + {path}: {}", indented(value)),
                FieldChange::Removed { path, value } => format!("  - {path}: {}", indented(value)),
                FieldChange::Changed { path, from, to } => {
                    format!("  ~ {path}: {} -> {}", indented(from), indented(to))
                }
            };
            if plain {
                writeln!(out, "{line}")?;
                continue;
            }
            match change {
                FieldChange::Added { .. } => writeln!(out, "{}", line.green())?,
                FieldChange::Removed { .. } => writeln!(out, "{}", line.red())?,
                FieldChange::Changed { .. } => writeln!(out, "{}", line.cyan())?,
            }
        }
    }
    Ok(())
}

/// Multi-line values (rendered subtrees) get their continuation lines
/// indented under the field path.
fn indented(value: &str) -> String {
    if !value.contains('\n') {
        return value.to_string();
    }
    let mut output = String::new();
    for line in value.lines() {
        output.push_str("\n      ");
        output.push_str(line);
    }
    output
}
