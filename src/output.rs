// ============================================
// output.rs - Saving command output to a text file
// ============================================
// Any text WinTools shows (the filtered IP report, external IP info) can be
// saved with a small header saying when it was produced and by what:
//
//   --- WinTools Output ---
//   Date/Time: 2024-05-01 14:03:22
//   Command: ipconfig /all
//   -----------------------
//
//   <output>
// ============================================

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};

/// File name suggested for saving the output of `command`,
/// e.g. "ipconfig_output_20240501_140322.txt".
pub fn default_output_filename<Tz: TimeZone>(command: &str, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    // First word of the command, without path separators
    let base: String = command
        .split_whitespace()
        .next()
        .unwrap_or("output")
        .chars()
        .filter(|c| *c != '/' && *c != '\\')
        .collect();
    let base = if base.is_empty() { "output".to_string() } else { base };

    format!("{}_output_{}.txt", base, now.format("%Y%m%d_%H%M%S"))
}

/// Header written above saved output.
pub fn output_header<Tz: TimeZone>(command: &str, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "--- WinTools Output ---\n\
         Date/Time: {}\n\
         Command: {}\n\
         -----------------------\n\n",
        now.format("%Y-%m-%d %H:%M:%S"),
        command
    )
}

/// Write `content` to `path` (UTF-8) with the standard header.
/// If `path` is a directory, the default file name is used inside it.
pub fn save_output(path: &Path, command: &str, content: &str) -> Result<std::path::PathBuf> {
    let now = Local::now();
    let file_path = if path.is_dir() {
        path.join(default_output_filename(command, &now))
    } else {
        path.to_path_buf()
    };

    let mut text = output_header(command, &now);
    text.push_str(content);

    fs::write(&file_path, text)
        .with_context(|| format!("Failed to save output to: {}", file_path.display()))?;

    log::info!("[Output] Saved output to: {}", file_path.display());
    Ok(file_path)
}

// ============================================
// TESTS
// ============================================
