//! Strips markdown fencing from a provider response.

use regex::Regex;
use std::sync::LazyLock;

/// Opening fence with an optional language tag, lazily matched body, closing
/// fence. The newline before the closing fence belongs to the fence.
static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[\w+#.\-]*[ \t]*\r?\n(.*?)\r?\n?```")
        .expect("fenced block pattern is valid")
});

/// Returns the body of the first fenced code block in `raw`, or `raw`
/// unchanged when there is none. Whitespace trimming is left to the caller.
pub fn extract(raw: &str) -> &str {
    FENCED_BLOCK
        .captures(raw)
        .and_then(|captures| captures.get(1))
        .map_or(raw, |body| body.as_str())
}
