//! Terminal rendering of a reply.

use std::fmt::Write as _;
use std::time::Duration;

use super::EmailResponse;

/// Opening marker of verbose output.
pub const BEGIN_MARKER: &str = "=== EMAIL RESPONSE ===";
/// Closing marker of verbose output.
pub const END_MARKER: &str = "=== END EMAIL RESPONSE ===";

/// Renders `response` for stdout.
///
/// Verbose output wraps the body in markers and a `From`/`Date`/`Subject`
/// block. When `max_lines > 0` and the body is longer, only the first
/// `max_lines` lines are shown, followed by a notice naming the setting
/// that disables truncation. The response itself is never modified.
#[must_use]
pub fn render(response: &EmailResponse, max_lines: usize, verbose: bool) -> String {
    let mut out = String::new();

    if verbose {
        let date = response
            .date
            .map(|date| date.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        let _ = writeln!(out, "{BEGIN_MARKER}");
        let _ = writeln!(out, "From: {}", response.from);
        let _ = writeln!(out, "Date: {date}");
        let _ = writeln!(out, "Subject: {}", response.subject);
        out.push('\n');
    }

    let lines: Vec<&str> = response.body.split('\n').collect();
    if max_lines > 0 && lines.len() > max_lines {
        for line in &lines[..max_lines] {
            out.push_str(line);
            out.push('\n');
        }
        let _ = writeln!(
            out,
            "\n[... body truncated at {max_lines} lines (set email.wait_for_response_max_lines to 0 to show everything) ...]"
        );
    } else {
        out.push_str(&response.body);
        out.push('\n');
    }

    if verbose {
        let _ = writeln!(out, "{END_MARKER}");
    }
    out
}

/// Formats a duration as `XmYs`, or `Ys` under a minute.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs();
    let (minutes, seconds) = (seconds / 60, seconds % 60);
    if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}
