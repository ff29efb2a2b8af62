//! Process-wide secret redaction
//!
//! Registered secrets are masked in every rendered line after formatting, so
//! values nested anywhere inside structured fields are caught as long as their
//! text reaches the output.

use parking_lot::{const_rwlock, RwLock};

/// Replacement for every secret occurrence.
pub const REDACTED_MASK: &str = "[REDACTED]";

static SECRETS: RwLock<Vec<Secret>> = const_rwlock(Vec::new());

#[derive(Debug, Clone)]
struct Secret {
    raw: String,
    /// The secret as it appears inside a JSON string literal, when different.
    json_escaped: Option<String>,
}

impl Secret {
    fn new(raw: String) -> Self {
        let json_escaped = serde_json::to_string(&raw)
            .ok()
            .map(|quoted| quoted[1..quoted.len() - 1].to_string())
            .filter(|escaped| *escaped != raw);
        Self { raw, json_escaped }
    }
}

/// Register secrets to mask. Empty strings and values already registered are
/// ignored.
///
/// ```
/// rust_field_logger::add_secret(["hunter2"]);
/// assert_eq!(rust_field_logger::redact("password=hunter2"), "password=[REDACTED]");
/// ```
pub fn add_secret<I, S>(secrets: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut registry = SECRETS.write();
    for secret in secrets {
        let secret = secret.into();
        if secret.is_empty() || registry.iter().any(|s| s.raw == secret) {
            continue;
        }
        registry.push(Secret::new(secret));
    }
}

/// Snapshot of the registered secrets, in registration order.
pub fn secrets() -> Vec<String> {
    SECRETS.read().iter().map(|s| s.raw.clone()).collect()
}

/// Mask every registered secret in `text`.
pub fn redact(text: &str) -> String {
    let registry = SECRETS.read();
    redact_with(&registry, text)
}

/// Mask every registered secret in a rendered buffer.
///
/// Leaves the buffer untouched when nothing is registered or nothing matches.
pub fn redact_in_place(buf: &mut Vec<u8>) {
    let registry = SECRETS.read();
    if registry.is_empty() {
        return;
    }
    let text = String::from_utf8_lossy(buf);
    let redacted = redact_with(&registry, &text);
    if redacted != text {
        buf.clear();
        buf.extend_from_slice(redacted.as_bytes());
    }
}

fn redact_with(registry: &[Secret], text: &str) -> String {
    let mut out = text.to_string();
    for secret in registry {
        if out.contains(&secret.raw) {
            out = out.replace(&secret.raw, REDACTED_MASK);
        }
        if let Some(ref escaped) = secret.json_escaped {
            if out.contains(escaped.as_str()) {
                out = out.replace(escaped.as_str(), REDACTED_MASK);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_secret_deduplicates() {
        add_secret(["unit-dup-secret", "unit-dup-secret", ""]);
        add_secret(vec!["unit-dup-secret".to_string()]);

        let registered = secrets();
        assert_eq!(
            registered.iter().filter(|s| *s == "unit-dup-secret").count(),
            1
        );
        assert!(!registered.iter().any(String::is_empty));
    }

    #[test]
    fn test_redact_raw_and_json_escaped() {
        add_secret(["unit\"quoted"]);

        assert_eq!(redact("value=unit\"quoted"), "value=[REDACTED]");
        // JSON-escaped form, as produced inside a JSON string
        assert_eq!(
            redact(r#"{"msg":"unit\"quoted"}"#),
            r#"{"msg":"[REDACTED]"}"#
        );
    }

    #[test]
    fn test_redact_in_place_without_match_is_identical() {
        add_secret(["unit-never-rendered"]);

        let original = b"level=\"info\" msg=\"nothing to hide\"\n".to_vec();
        let mut buf = original.clone();
        redact_in_place(&mut buf);
        assert_eq!(buf, original);
    }

    #[test]
    fn test_redact_in_place_masks_every_occurrence() {
        add_secret(["unit-token-x"]);

        let mut buf = b"a=unit-token-x b=unit-token-x".to_vec();
        redact_in_place(&mut buf);
        assert_eq!(buf, b"a=[REDACTED] b=[REDACTED]".to_vec());
    }
}
