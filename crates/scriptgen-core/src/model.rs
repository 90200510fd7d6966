//! Job and command value types.
//!
//! [`ImapSyncSpec`] describes one sync job without any secret in it and can
//! be logged or persisted freely. [`Secrets`] carries the plaintext and is
//! only handed to [`crate::generate`]. [`ImapSyncCommand`] is the result:
//! the full argument vector plus a redacted twin for display.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default directory imapsync writes its own logs into.
pub const DEFAULT_LOGDIR: &str = "/var/log/pymap";

fn default_logdir() -> String {
    DEFAULT_LOGDIR.to_string()
}

/// Secret-free description of one imapsync job.
///
/// Passwords are referenced by name; the values live in [`Secrets`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImapSyncSpec {
    /// Source host.
    pub host1: String,
    /// Source username.
    pub user1: String,
    /// Lookup key of the source password.
    pub pass1_ref: String,
    /// Destination host.
    pub host2: String,
    /// Destination username.
    pub user2: String,
    /// Lookup key of the destination password.
    pub pass2_ref: String,
    /// Log file name passed to `--logfile`.
    pub logfile: String,
    /// Extra arguments, shell-tokenized and appended to the command.
    #[serde(default)]
    pub extra_args: Option<String>,
    /// Directory passed to `--logdir`.
    #[serde(default = "default_logdir")]
    pub logdir: String,
}

/// Reference-name to plaintext-password lookup.
///
/// `Debug` lists reference names only.
#[derive(Clone, Default)]
pub struct Secrets {
    values: HashMap<String, String>,
}

impl Secrets {
    /// Creates an empty secrets map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under the reference `name`, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Looks up the plaintext for a reference name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Number of stored secrets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no secrets are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Secrets {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Secrets").field("refs", &names).finish()
    }
}

/// Secret-free facts about a generated command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// Source username.
    pub user1: String,
    /// Destination username.
    pub user2: String,
    /// Source host.
    pub host1: String,
    /// Destination host.
    pub host2: String,
    /// Comma-joined domains of both users, first-seen order, no repeats.
    pub domains: String,
}

/// A built imapsync invocation.
///
/// `Display` and `Debug` only ever show the redacted vector. The plaintext
/// vector is reachable through [`ImapSyncCommand::argv`] and
/// [`ImapSyncCommand::to_shell_string`].
#[derive(Clone, PartialEq, Eq)]
pub struct ImapSyncCommand {
    argv: Vec<String>,
    redacted_argv: Vec<String>,
    shell_line: String,
    logfile: String,
    metadata: CommandMetadata,
}

impl ImapSyncCommand {
    pub(crate) const fn new(
        argv: Vec<String>,
        redacted_argv: Vec<String>,
        shell_line: String,
        logfile: String,
        metadata: CommandMetadata,
    ) -> Self {
        Self {
            argv,
            redacted_argv,
            shell_line,
            logfile,
            metadata,
        }
    }

    /// Full argument vector. May contain plaintext passwords.
    #[must_use]
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Argument vector with every secret token masked.
    #[must_use]
    pub fn redacted_argv(&self) -> &[String] {
        &self.redacted_argv
    }

    /// Log file name passed to `--logfile`.
    #[must_use]
    pub fn logfile(&self) -> &str {
        &self.logfile
    }

    /// Secret-free metadata.
    #[must_use]
    pub const fn metadata(&self) -> &CommandMetadata {
        &self.metadata
    }

    /// Full command line for a shell script. Contains plaintext passwords.
    ///
    /// Tokens are space-separated and shell-quoted where needed, so a POSIX
    /// shell splits the line back into exactly [`ImapSyncCommand::argv`].
    #[must_use]
    pub fn to_shell_string(&self) -> String {
        self.shell_line.clone()
    }
}

impl std::fmt::Display for ImapSyncCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.redacted_argv.join(" "))
    }
}

impl std::fmt::Debug for ImapSyncCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImapSyncCommand")
            .field("redacted_argv", &self.redacted_argv)
            .field("logfile", &self.logfile)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_debug_lists_names_only() {
        let secrets: Secrets = [("pw2", "hunter2"), ("pw1", "s3cret")].into_iter().collect();
        let debug = format!("{secrets:?}");
        assert_eq!(debug, r#"Secrets { refs: ["pw1", "pw2"] }"#);
        assert_eq!(secrets.get("pw1"), Some("s3cret"));
        assert_eq!(secrets.get("pw3"), None);
        assert_eq!(secrets.len(), 2);
    }

    #[test]
    fn test_spec_deserializes_with_defaults() {
        let spec: ImapSyncSpec = serde_json::from_str(
            r#"{
                "host1": "a", "user1": "u1", "pass1_ref": "pw1",
                "host2": "b", "user2": "u2", "pass2_ref": "pw2",
                "logfile": "a__b__u1--u2.log"
            }"#,
        )
        .unwrap();
        assert_eq!(spec.logdir, DEFAULT_LOGDIR);
        assert_eq!(spec.extra_args, None);
    }
}
