//! Deterministic digests of raw command output.

/// Marker `ansible-playbook` prints before its per-host totals.
pub const PLAY_RECAP_MARKER: &str = "PLAY RECAP";

/// Keep the last `max_chars` characters of `text`.
pub fn tail_chars(text: &str, max_chars: usize) -> &str {
    if max_chars == 0 {
        return "";
    }
    match text.char_indices().rev().nth(max_chars - 1) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

/// Lines after the first line containing `marker`, blanks dropped, last `keep` of them.
pub fn recap_lines<'a>(text: &'a str, marker: &str, keep: usize) -> Vec<&'a str> {
    let mut collected = Vec::new();
    let mut started = false;
    for line in text.lines() {
        if !started {
            started = line.contains(marker);
            continue;
        }
        if !line.trim().is_empty() {
            collected.push(line);
        }
    }
    let skip = collected.len().saturating_sub(keep);
    collected.split_off(skip)
}

/// Lines containing at least one of `tokens`.
pub fn filter_lines<'a>(text: &'a str, tokens: &[&str]) -> Vec<&'a str> {
    text.lines()
        .filter(|line| tokens.iter().any(|token| line.contains(token)))
        .collect()
}

pub fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default().trim()
}
