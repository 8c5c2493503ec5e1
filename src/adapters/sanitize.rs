//! Log sanitization for clinical values and identifiers.
//!
//! Formatted log lines are scanned for:
//! - clinical measurements written as `name=value` / `"name": value`
//! - raw values echoed back in input errors (`got '...'`)
//! - UUIDs, email addresses, SSN-like and MRN-like identifiers
//!
//! Matches are replaced before the line reaches the log sink. The
//! [`SanitizingMakeWriter`] wraps any `tracing_subscriber` writer so no
//! callsite has to remember to sanitize.
//!
//! Input is capped at `CARDIOSCORE_SANITIZE_MAX_BYTES` (default 16 KiB) per
//! call.
//!
//! [`install_panic_hook`] sends panic messages through `tracing` as well, so
//! they are sanitized like any other log line instead of going to stderr.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static PATTERNS: OnceLock<Patterns> = OnceLock::new();

const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct Rule {
    regex: Regex,
    /// May reference capture groups (`$1`).
    replacement: &'static str,
}

struct Patterns {
    set: RegexSet,
    rules: Vec<Rule>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes.min(input.len());
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn max_sanitize_bytes() -> usize {
    std::env::var("CARDIOSCORE_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn patterns() -> &'static Patterns {
    PATTERNS.get_or_init(|| {
        let rules: Vec<(&'static str, &'static str)> = vec![
            // Clinical measurements in key/value or JSON form
            (
                r#"(?i)\b((?:age|anaemia|creatinine_phosphokinase|diabetes|ejection_fraction|high_blood_pressure|platelets|serum_creatinine|serum_sodium|sex|smoking|time)"?\s*[:=]\s*"?)[^\s,;"'}&)]+"#,
                "${1}[REDACTED]",
            ),
            // Raw values echoed in conversion errors
            (r"\bgot '[^']*'", "got '[REDACTED]'"),
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
                "[REDACTED-UUID]",
            ),
            (r"\b\d{3}-\d{2}-\d{4}\b", "[REDACTED-SSN]"),
            (r"\bMRN[:\s]?\d{6,10}\b", "[REDACTED-MRN]"),
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                "[REDACTED-EMAIL]",
            ),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let rules = rules
            .into_iter()
            .map(|(pattern, replacement)| Rule {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        Patterns { set, rules }
    })
}

/// Replace clinical values and identifiers in `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in patterns.set.matches(prefix).into_iter() {
        let rule = &patterns.rules[idx];
        result = rule.regex.replace_all(&result, rule.replacement).into_owned();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// A `tracing_subscriber` writer wrapper that sanitizes each formatted log
/// line before it is written to the underlying sink.
#[derive(Debug, Clone)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: std::io::Write> SanitizingWriter<W> {
    fn write_sanitized(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let sanitized = sanitize(&String::from_utf8_lossy(bytes));
        self.inner.write_all(sanitized.as_bytes())
    }

    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.write_sanitized(&line)?;
        }
        Ok(())
    }
}

impl<W: std::io::Write> std::io::Write for SanitizingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A single line larger than twice the cap is flushed early rather
        // than buffered without bound.
        if self.buffer.len() > max_sanitize_bytes().saturating_mul(2) {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
            self.inner.write_all(b"\n")?;
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;
        if !self.buffer.is_empty() {
            let pending = std::mem::take(&mut self.buffer);
            self.write_sanitized(&pending)?;
        }
        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter {
            inner: self.inner.make_writer(),
            buffer: Vec::new(),
        }
    }
}

/// Replace the default panic hook with one that logs through `tracing`.
///
/// Call after the global subscriber is installed.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        tracing::error!("Panic: {info}");
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for SharedBuffer {
        type Writer = SharedBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_sanitize_clinical_key_values() {
        let sanitized = sanitize("scoring age=65 serum_creatinine=1.9 ok");
        assert_eq!(
            sanitized,
            "scoring age=[REDACTED] serum_creatinine=[REDACTED] ok"
        );
    }

    #[test]
    fn test_sanitize_json_values() {
        let sanitized = sanitize(r#"{"platelets": "265000", "sex":1}"#);
        assert!(!sanitized.contains("265000"));
        assert!(sanitized.contains(r#""platelets": "[REDACTED]"#));
        assert!(sanitized.contains(r#""sex":[REDACTED]"#));
    }

    #[test]
    fn test_sanitize_echoed_value() {
        let sanitized = sanitize("field 'age' expects a number, got '-12x'");
        assert_eq!(sanitized, "field 'age' expects a number, got '[REDACTED]'");
    }

    #[test]
    fn test_sanitize_identifiers() {
        let sanitized = sanitize(
            "patient 550e8400-e29b-41d4-a716-446655440000 SSN: 123-45-6789 mail a.b@clinic.org",
        );
        assert!(sanitized.contains("[REDACTED-UUID]"));
        assert!(sanitized.contains("[REDACTED-SSN]"));
        assert!(sanitized.contains("[REDACTED-EMAIL]"));
        assert!(sanitize("MRN:12345678 found").contains("[REDACTED-MRN]"));
    }

    #[test]
    fn test_truncates_large_inputs() {
        let sanitized = sanitize_with_limit("prefix age=65 suffix", 10);
        assert!(sanitized.ends_with("[TRUNCATED]"));
    }

    #[test]
    fn test_writer_sanitizes_per_line() {
        let mut out = Vec::new();
        {
            let mut w = SanitizingWriter {
                inner: &mut out,
                buffer: Vec::new(),
            };
            w.write_all(b"first age=70\nsecond ").expect("write");
            w.write_all(b"smoking=1\n").expect("write");
        }
        let text = String::from_utf8(out).expect("utf8");
        assert_eq!(text, "first age=[REDACTED]\nsecond smoking=[REDACTED]\n");
    }

    fn failing_inference() {
        panic!("scoring failed for age=65");
    }

    #[test]
    fn test_panic_hook_logs_through_sanitizer() {
        let buffer = SharedBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(SanitizingMakeWriter::new(buffer.clone()))
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            install_panic_hook();
            let result = std::panic::catch_unwind(failing_inference);
            let _ = std::panic::take_hook();
            assert!(result.is_err());
        });

        let text = String::from_utf8(buffer.0.lock().expect("lock").clone()).expect("utf8");
        assert!(text.contains("Panic: "), "{text}");
        assert!(text.contains("scoring failed for age=[REDACTED]"), "{text}");
        assert!(!text.contains("age=65"));
    }
}
