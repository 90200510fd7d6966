//! Known-host rewriting.
//!
//! Some migration targets need a suffix appended to the hostname the
//! operator typed (a port, a proxy alias). Each entry pairs a pattern with
//! the suffix to append on match.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A (pattern, suffix) pair used to detect and rewrite a hostname.
///
/// Serialized as a two-element array: `["imap\\..*", ":993"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct KnownHost {
    /// Regular expression, anchored at the start of the hostname.
    pub pattern: String,
    /// Text appended to the hostname when the pattern matches.
    pub suffix: String,
}

impl KnownHost {
    /// Creates a known-host entry.
    #[must_use]
    pub fn new(pattern: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            suffix: suffix.into(),
        }
    }

    /// Returns true if the pattern matches at the start of `hostname`.
    ///
    /// # Errors
    ///
    /// Returns the regex error if the pattern does not compile on its own.
    pub fn matches(&self, hostname: &str) -> Result<bool, regex::Error> {
        let re = Regex::new(&self.pattern)?;
        Ok(re.find(hostname).is_some_and(|m| m.start() == 0))
    }
}

impl From<(String, String)> for KnownHost {
    fn from((pattern, suffix): (String, String)) -> Self {
        Self { pattern, suffix }
    }
}

impl From<KnownHost> for (String, String) {
    fn from(host: KnownHost) -> Self {
        (host.pattern, host.suffix)
    }
}

/// Rewrites `hostname` using the first matching known-host entry.
///
/// Entries are tried in order and only the first match applies. A pattern
/// that fails to compile is logged and skipped. Without a match the
/// hostname is returned unchanged.
#[must_use]
pub fn verify_host(hostname: &str, known_hosts: Option<&[KnownHost]>) -> String {
    debug!("Verifying hostname: {hostname}");

    for host in known_hosts.unwrap_or_default() {
        match host.matches(hostname) {
            Ok(true) => {
                debug!("Matched hostname pattern: {}", host.pattern);
                return format!("{hostname}{}", host.suffix);
            }
            Ok(false) => {}
            Err(e) => warn!("Regex error in pattern {}: {e}", host.pattern),
        }
    }

    debug!("No matches found for hostname: {hostname}");
    hostname.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::similar_names)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Log sink shared between the subscriber and the test.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_no_known_hosts_returns_original() {
        assert_eq!(verify_host("mail.example.com", None), "mail.example.com");
        assert_eq!(verify_host("mail.example.com", Some(&[][..])), "mail.example.com");
    }

    #[test]
    fn test_pattern_matches() {
        let known = [
            KnownHost::new(r"mail\.example\.com", "_A"),
            KnownHost::new(r"imap\.example\.org", "_B"),
        ];

        assert_eq!(
            verify_host("mail.example.com", Some(known.as_slice())),
            "mail.example.com_A"
        );
        assert_eq!(
            verify_host("imap.example.org", Some(known.as_slice())),
            "imap.example.org_B"
        );
    }

    #[test]
    fn test_no_match_returns_original() {
        let known = [KnownHost::new("foo.*", "_X")];
        assert_eq!(verify_host("bar.example.com", Some(known.as_slice())), "bar.example.com");
    }

    #[test]
    fn test_pattern_is_prefix_anchored() {
        let known = [KnownHost::new(r"example\.com", "_X")];
        assert_eq!(verify_host("mail.example.com", Some(known.as_slice())), "mail.example.com");
        assert_eq!(verify_host("example.com.br", Some(known.as_slice())), "example.com.br_X");
    }

    #[test]
    fn test_first_match_wins() {
        let known = [KnownHost::new("foo.*", "_X"), KnownHost::new("foobar", "_Y")];
        assert_eq!(verify_host("foobar", Some(known.as_slice())), "foobar_X");
    }

    #[test]
    fn test_alternation_stays_anchored() {
        let known = [KnownHost::new("a|b", "_X")];
        assert_eq!(verify_host("cb", Some(known.as_slice())), "cb");
        assert_eq!(verify_host("bc", Some(known.as_slice())), "bc_X");
    }

    #[test]
    fn test_invalid_pattern_is_skipped() {
        let known = [KnownHost::new("[invalid", "_X"), KnownHost::new("mail.*", "_OK")];
        assert_eq!(
            verify_host("mail.example.com", Some(known.as_slice())),
            "mail.example.com_OK"
        );
    }

    #[test]
    fn test_unbalanced_group_is_skipped() {
        let unbalanced = KnownHost::new("a)(b", "_X");
        assert!(unbalanced.matches("ab").is_err());

        let known = [unbalanced, KnownHost::new("a.*", "_OK")];
        assert_eq!(verify_host("ab", Some(known.as_slice())), "ab_OK");
    }

    #[test]
    fn test_invalid_pattern_logs_warning() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let known = [KnownHost::new("[invalid", "_X")];
        let result = tracing::subscriber::with_default(subscriber, || {
            verify_host("mail.example.com", Some(known.as_slice()))
        });

        assert_eq!(result, "mail.example.com");
        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("WARN"));
        assert!(logs.contains("Regex error in pattern [invalid"));
    }

    #[test]
    fn test_known_host_json_pair() {
        let host: KnownHost = serde_json::from_str(r#"["foo.*", "_X"]"#).unwrap();
        assert_eq!(host, KnownHost::new("foo.*", "_X"));
        assert_eq!(serde_json::to_string(&host).unwrap(), r#"["foo.*","_X"]"#);
    }
}
