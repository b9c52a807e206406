//! Strips the quoted original that mail clients append below a reply.
//!
//! Recognises English ("On …, Jane <jane@x> wrote:") and Portuguese
//! ("Em …, Ana <ana@x> escreveu:") attribution lines. Heuristic: a reply
//! whose own text happens to look like an attribution line is cut there.

/// Separator lines dropped when they sit directly above the attribution.
const SEPARATORS: &[&str] = &["", "---", "---original message---"];

/// Phrases that end an attribution line.
const MARKERS: &[&str] = &["escreveu:", "wrote:", "escreveu"];

/// Returns `body` with the quoted trailer removed.
///
/// Everything from the first attribution line on is dropped, along with a
/// blank or separator line directly above it and any trailing blank lines.
/// A body with no attribution line is returned unchanged. Lines split on
/// LF only, so the kept text is always a prefix of `body`.
#[must_use]
pub fn sanitize(body: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut cut = false;

    for line in body.split('\n') {
        let normalized = line.trim().to_lowercase();
        if is_attribution(&normalized) {
            if kept
                .last()
                .is_some_and(|prev| SEPARATORS.contains(&prev.trim().to_lowercase().as_str()))
            {
                kept.pop();
            }
            cut = true;
            break;
        }
        kept.push(line);
    }

    if !cut {
        return body.to_string();
    }

    while kept.last().is_some_and(|line| line.trim().is_empty()) {
        kept.pop();
    }
    kept.join("\n")
}

/// `line` must already be trimmed and lowercased.
fn is_attribution(line: &str) -> bool {
    MARKERS.iter().any(|marker| line.contains(marker)) || is_citation_header(line)
}

/// An "On <date>, <name> <address>" line without the trailing verb, as
/// produced when clients wrap the attribution.
fn is_citation_header(line: &str) -> bool {
    let lead_in = line.contains("em ") || line.contains("on ");
    let address = line.contains('@') || (line.contains('<') && line.contains('>'));
    let dated = line.contains("de ") || line.matches(',').count() >= 2;
    lead_in && address && dated
}
