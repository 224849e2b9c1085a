//! The secret-detection ruleset collaborator (spec §1 non-goals, §4.10).

use async_trait::async_trait;

use crate::error::Result;

/// A byte-offset span `[start, end)` within scanned text, identified as a
/// secret by the ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretSpan {
    /// Start byte offset, inclusive.
    pub start: usize,
    /// End byte offset, exclusive.
    pub end: usize,
}

/// `SecretScanner.Scan(text) -> [span]` (spec §6). The ruleset itself is
/// opaque and out of scope; contextd only consumes spans to redact.
#[async_trait]
pub trait SecretScanner: Send + Sync {
    /// Scan `text` and return every detected secret span, in document order
    /// and non-overlapping.
    async fn scan(&self, text: &str) -> Result<Vec<SecretSpan>>;

    /// Apply [`Self::scan`] and replace each detected span with a fixed
    /// redaction marker (spec §4.10 `scrub(text) -> text`).
    ///
    /// Idempotent: scrubbing already-scrubbed text is a no-op, because the
    /// redaction marker itself never matches the ruleset (spec §8 property
    /// 3, "scrub idempotence").
    async fn scrub(&self, text: &str) -> Result<String> {
        const REDACTION_MARKER: &str = "[REDACTED]";
        let mut spans = self.scan(text).await?;
        spans.sort_by_key(|s| s.start);
        let mut out = String::with_capacity(text.len());
        let mut cursor = 0usize;
        for span in spans {
            if span.start < cursor || span.end > text.len() || span.start > span.end {
                continue;
            }
            out.push_str(&text[cursor..span.start]);
            out.push_str(REDACTION_MARKER);
            cursor = span.end;
        }
        out.push_str(&text[cursor..]);
        Ok(out)
    }
}
