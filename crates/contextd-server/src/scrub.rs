//! Outbound secret scrubbing (spec §4.10, §7: "secret-scrubbing failures
//! ... fail the containing request with `SecretScrubError`").
//!
//! Every tool result is walked recursively and each string leaf is passed
//! through [`SecretScanner::scrub`] before the response is serialized, so
//! a memory or checkpoint that was recorded before a new ruleset pattern
//! existed still comes back redacted.

use std::sync::Arc;

use serde_json::Value;

use contextd_domain::error::{Error, Result};
use contextd_domain::ports::SecretScanner;

/// Recursively scrub every string leaf of `value`. Fails closed: if the
/// scanner itself errors, the whole result is rejected rather than
/// returned partially scrubbed.
pub async fn scrub_result(scanner: &Arc<dyn SecretScanner>, value: Value) -> Result<Value> {
    match value {
        Value::String(text) => {
            let scrubbed = scanner.scrub(&text).await.map_err(|err| Error::secret_scrub(err.to_string()))?;
            Ok(Value::String(scrubbed))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(Box::pin(scrub_result(scanner, item)).await?);
            }
            Ok(Value::Array(out))
        }
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, item) in map {
                out.insert(key, Box::pin(scrub_result(scanner, item)).await?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use contextd_domain::ports::SecretSpan;
    use serde_json::json;

    struct FixedScanner;

    #[async_trait]
    impl SecretScanner for FixedScanner {
        async fn scan(&self, text: &str) -> Result<Vec<SecretSpan>> {
            match text.find("sk-live-") {
                Some(start) => Ok(vec![SecretSpan { start, end: text.len() }]),
                None => Ok(vec![]),
            }
        }
    }

    #[tokio::test]
    async fn scrubs_nested_string_leaves() {
        let scanner: Arc<dyn SecretScanner> = Arc::new(FixedScanner);
        let input = json!({"content": "token sk-live-abc123", "tags": ["ok", "sk-live-xyz"]});
        let out = scrub_result(&scanner, input).await.unwrap();
        assert_eq!(out["content"], "token [REDACTED]");
        assert_eq!(out["tags"][1], "[REDACTED]");
        assert_eq!(out["tags"][0], "ok");
    }

    #[tokio::test]
    async fn leaves_non_string_values_untouched() {
        let scanner: Arc<dyn SecretScanner> = Arc::new(FixedScanner);
        let input = json!({"count": 3, "active": true, "ratio": null});
        let out = scrub_result(&scanner, input.clone()).await.unwrap();
        assert_eq!(out, input);
    }
}
