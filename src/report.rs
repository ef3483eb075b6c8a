use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::scan::{CheckReport, InitResult, UpdateOutcome};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Text,
    Json,
}

pub fn render_init(result: &InitResult, format: Format) -> Result<String> {
    match format {
        Format::Text => Ok("✅ Baseline hashes created successfully.".to_string()),
        Format::Json => Ok(serde_json::to_string_pretty(&json!({
            "status": "created",
            "files": result.files_recorded,
            "baseline": result.baseline,
        }))?),
    }
}

/// Render a check report.
///
/// Text format:
///   one line per new (if `show_new`) and missing file, then either the
///   all-clear line or the tamper header followed by each modified path.
pub fn render_check(report: &CheckReport, format: Format, show_new: bool) -> Result<String> {
    if format == Format::Json {
        let status = if report.is_intact() { "intact" } else { "tampered" };
        let new_files: &[String] = if show_new { &report.new_files } else { &[] };
        return Ok(serde_json::to_string_pretty(&json!({
            "status": status,
            "files_checked": report.files_checked,
            "modified": report.modified,
            "new": new_files,
            "missing": report.missing,
        }))?);
    }

    let mut lines = Vec::new();
    if show_new {
        for path in &report.new_files {
            lines.push(format!("🆕 New file detected: {path}"));
        }
    }
    for path in &report.missing {
        lines.push(format!("⚠️ Missing file: {path}"));
    }

    if report.is_intact() {
        lines.push("✅ All files are intact (no tampering).".to_string());
    } else {
        lines.push("❌ Tampering detected in:".to_string());
        for path in &report.modified {
            lines.push(format!("   - {path}"));
        }
    }
    Ok(lines.join("\n"))
}

pub fn render_update(outcome: &UpdateOutcome, format: Format) -> Result<String> {
    match format {
        Format::Json => Ok(serde_json::to_string_pretty(outcome)?),
        Format::Text => Ok(match outcome {
            UpdateOutcome::NotAFile { .. } => "⚠️ Error: Not a valid file.".to_string(),
            UpdateOutcome::Added { .. } | UpdateOutcome::Replaced { .. } => {
                "✅ Hash updated successfully.".to_string()
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::hasher::FileHasher;
    use std::path::PathBuf;

    fn report(modified: &[&str], new_files: &[&str]) -> CheckReport {
        CheckReport {
            files_checked: modified.len() + new_files.len() + 1,
            modified: modified.iter().map(|s| s.to_string()).collect(),
            new_files: new_files.iter().map(|s| s.to_string()).collect(),
            missing: Vec::new(),
        }
    }

    #[test]
    fn intact_report_text() {
        let text = render_check(&report(&[], &[]), Format::Text, true).unwrap();
        assert_eq!(text, "✅ All files are intact (no tampering).");
    }

    #[test]
    fn tampered_report_lists_every_modified_path() {
        let text = render_check(&report(&["/d/a.txt", "/d/b.txt"], &[]), Format::Text, true).unwrap();
        assert_eq!(
            text,
            "❌ Tampering detected in:\n   - /d/a.txt\n   - /d/b.txt"
        );
    }

    #[test]
    fn new_files_listed_before_summary() {
        let text = render_check(&report(&[], &["/d/c.txt"]), Format::Text, true).unwrap();
        assert_eq!(
            text,
            "🆕 New file detected: /d/c.txt\n✅ All files are intact (no tampering)."
        );
    }

    #[test]
    fn new_files_hidden_when_disabled() {
        let text = render_check(&report(&[], &["/d/c.txt"]), Format::Text, false).unwrap();
        assert!(!text.contains("/d/c.txt"));
    }

    #[test]
    fn missing_files_listed() {
        let mut r = report(&[], &[]);
        r.missing.push("/d/gone.txt".into());
        let text = render_check(&r, Format::Text, true).unwrap();
        assert!(text.starts_with("⚠️ Missing file: /d/gone.txt\n"));
    }

    #[test]
    fn check_json_carries_status() {
        let text = render_check(&report(&["/d/a.txt"], &["/d/c.txt"]), Format::Json, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["status"], "tampered");
        assert_eq!(value["modified"][0], "/d/a.txt");
        assert_eq!(value["new"][0], "/d/c.txt");
    }

    #[test]
    fn init_text_is_count_free() {
        let result = InitResult {
            files_recorded: 12,
            baseline: PathBuf::from("file_hashes.json"),
        };
        let text = render_init(&result, Format::Text).unwrap();
        assert!(!text.contains("12"));

        let json: serde_json::Value =
            serde_json::from_str(&render_init(&result, Format::Json).unwrap()).unwrap();
        assert_eq!(json["files"], 12);
    }

    #[test]
    fn update_messages() {
        let fingerprint = FileHasher::default().hash_bytes(b"x");
        let added = UpdateOutcome::Added {
            path: "/d/a.txt".into(),
            fingerprint,
        };
        assert_eq!(
            render_update(&added, Format::Text).unwrap(),
            "✅ Hash updated successfully."
        );

        let invalid = UpdateOutcome::NotAFile { path: "d".into() };
        assert_eq!(
            render_update(&invalid, Format::Text).unwrap(),
            "⚠️ Error: Not a valid file."
        );
        let json: serde_json::Value =
            serde_json::from_str(&render_update(&invalid, Format::Json).unwrap()).unwrap();
        assert_eq!(json["status"], "not_a_file");
    }
}
