//! Channel-name extraction heuristics.
//!
//! A handful of token-splitting rules, not a grammar: find a trigger
//! keyword, take the tokens after it, cut at the first stop word. Names
//! containing trigger or stop words as part of the name itself will be
//! truncated; callers must treat the result as a best guess.

const TRIGGERS: &[&str] = &["channel", "from", "by"];
const STOP_WORDS: &[&str] = &[
    "latest", "video", "videos", "content", "and", "show", "me", "the",
];
const QUOTES: &[char] = &['"', '\''];

/// Pull a probable channel name out of a free-text question.
///
/// The query is lower-cased and split on whitespace. The name is the token
/// run after the first trigger keyword (`channel`, `from`, `by`), truncated
/// at the next standalone stop word or trigger, with surrounding quotes and
/// a trailing possessive stripped. Returns `None` when no trigger keyword
/// is present; never fails.
#[must_use]
pub fn extract_channel_name(query: &str) -> Option<String> {
    let lowered = query.to_lowercase();
    let tokens: Vec<&str> = lowered.split_whitespace().collect();

    let trigger_pos = tokens.iter().position(|t| TRIGGERS.contains(t))?;
    let tail = &tokens[trigger_pos + 1..];

    let end = tail
        .iter()
        .position(|t| {
            let bare = t.trim_matches(QUOTES);
            STOP_WORDS.contains(&bare) || TRIGGERS.contains(&bare)
        })
        .unwrap_or(tail.len());

    let name = tail[..end].join(" ");
    let name = name.trim().trim_matches(QUOTES).trim();
    let name = name.strip_suffix("'s").unwrap_or(name).trim();

    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
