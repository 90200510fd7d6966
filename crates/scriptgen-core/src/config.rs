//! Generator configuration.
//!
//! [`GeneratorConfig`] is built once per run from caller input and then
//! handed to the adapter, which resolves hosts and the log directory from
//! it at construction. [`ConfigFile`] is the optional JSON document that
//! can supply a log directory and known-host list.

use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hosts::KnownHost;
use crate::model::DEFAULT_LOGDIR;

/// Default number of commands per output script.
#[allow(clippy::unwrap_used)] // evaluated at compile time
pub const DEFAULT_SPLIT: NonZeroUsize = NonZeroUsize::new(30).unwrap();

/// Default output file prefix.
pub const DEFAULT_DESTINATION: &str = "sync";

/// Settings read from a JSON config file.
///
/// ```json
/// {
///   "LOGDIR": "/srv/imapsync/logs",
///   "HOSTS": [["imap\\.old\\.example", ":993"]]
/// }
/// ```
///
/// Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Log directory used when none is set explicitly.
    #[serde(rename = "LOGDIR", default, skip_serializing_if = "Option::is_none")]
    pub logdir: Option<String>,
    /// Known-host rewrite list used when none is set explicitly.
    #[serde(rename = "HOSTS", default, skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<KnownHost>>,
}

impl ConfigFile {
    /// Loads a config file from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON of
    /// the expected shape.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        contents.parse()
    }
}

impl FromStr for ConfigFile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// Inputs for one generator run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Source host as typed by the operator.
    pub host1: String,
    /// Destination host as typed by the operator.
    pub host2: String,
    /// Extra arguments appended to every command (shell-tokenized).
    pub extra_args: String,
    /// Output file prefix; files are named `{destination}_{N}.sh`.
    pub destination: String,
    /// Commands per output file.
    pub split: NonZeroUsize,
    /// Print instead of writing files.
    pub dry_run: bool,
    /// Explicit log directory; wins over [`ConfigFile::logdir`].
    pub logdir: Option<String>,
    /// Explicit known-host list; wins over [`ConfigFile::hosts`] when non-empty.
    pub additional_known_hosts: Vec<KnownHost>,
    /// Optional config file contents.
    pub config: Option<ConfigFile>,
}

impl GeneratorConfig {
    /// Creates a config for `host1` → `host2` with default settings.
    #[must_use]
    pub fn new(host1: impl Into<String>, host2: impl Into<String>) -> Self {
        Self {
            host1: host1.into(),
            host2: host2.into(),
            extra_args: String::new(),
            destination: DEFAULT_DESTINATION.to_string(),
            split: DEFAULT_SPLIT,
            dry_run: false,
            logdir: None,
            additional_known_hosts: Vec::new(),
            config: None,
        }
    }

    /// Sets the extra argument string.
    #[must_use]
    pub fn with_extra_args(mut self, extra_args: impl Into<String>) -> Self {
        self.extra_args = extra_args.into();
        self
    }

    /// Sets the output file prefix.
    #[must_use]
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = destination.into();
        self
    }

    /// Sets the number of commands per output file.
    #[must_use]
    pub const fn with_split(mut self, split: NonZeroUsize) -> Self {
        self.split = split;
        self
    }

    /// Enables or disables dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets an explicit log directory.
    #[must_use]
    pub fn with_logdir(mut self, logdir: impl Into<String>) -> Self {
        self.logdir = Some(logdir.into());
        self
    }

    /// Sets the explicit known-host list.
    #[must_use]
    pub fn with_known_hosts(mut self, hosts: Vec<KnownHost>) -> Self {
        self.additional_known_hosts = hosts;
        self
    }

    /// Attaches config file contents.
    #[must_use]
    pub fn with_config(mut self, config: ConfigFile) -> Self {
        self.config = Some(config);
        self
    }

    /// Known-host list to verify hosts against.
    ///
    /// The explicit list wins when non-empty, otherwise the config file's.
    #[must_use]
    pub fn known_hosts(&self) -> Option<&[KnownHost]> {
        if !self.additional_known_hosts.is_empty() {
            return Some(&self.additional_known_hosts);
        }
        self.config.as_ref().and_then(|c| c.hosts.as_deref())
    }

    /// Log directory: explicit value, then config file, then
    /// [`DEFAULT_LOGDIR`].
    #[must_use]
    pub fn resolved_logdir(&self) -> &str {
        self.logdir
            .as_deref()
            .or_else(|| self.config.as_ref().and_then(|c| c.logdir.as_deref()))
            .unwrap_or(DEFAULT_LOGDIR)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = GeneratorConfig::new("a", "b");

        assert_eq!(cfg.host1, "a");
        assert_eq!(cfg.host2, "b");
        assert_eq!(cfg.extra_args, "");
        assert_eq!(cfg.destination, "sync");
        assert_eq!(cfg.split.get(), 30);
        assert!(!cfg.dry_run);
        assert_eq!(cfg.resolved_logdir(), "/var/log/pymap");
        assert!(cfg.known_hosts().is_none());
    }

    #[test]
    fn test_overrides() {
        let cfg = GeneratorConfig::new("source", "dest")
            .with_extra_args("--ssl")
            .with_destination("out")
            .with_split(NonZeroUsize::new(5).unwrap())
            .with_dry_run(true)
            .with_logdir("/tmp/logs")
            .with_known_hosts(vec![KnownHost::new("foo.*", "_X")])
            .with_config(ConfigFile {
                logdir: Some("/custom".to_string()),
                hosts: Some(vec![KnownHost::new("bar.*", "_Y")]),
            });

        assert_eq!(cfg.extra_args, "--ssl");
        assert_eq!(cfg.destination, "out");
        assert_eq!(cfg.split.get(), 5);
        assert!(cfg.dry_run);
        assert_eq!(cfg.resolved_logdir(), "/tmp/logs");
        assert_eq!(cfg.known_hosts(), Some(&[KnownHost::new("foo.*", "_X")][..]));
    }

    #[test]
    fn test_config_file_fallbacks() {
        let cfg = GeneratorConfig::new("a", "b").with_config(ConfigFile {
            logdir: Some("/custom".to_string()),
            hosts: Some(vec![KnownHost::new("bar.*", "_Y")]),
        });

        assert_eq!(cfg.resolved_logdir(), "/custom");
        assert_eq!(cfg.known_hosts(), Some(&[KnownHost::new("bar.*", "_Y")][..]));
    }

    #[test]
    fn test_config_file_parse() {
        let config: ConfigFile = r#"{
            "LOGDIR": "/srv/logs",
            "HOSTS": [["imap\\.old", ":993"], ["mx.*", "_relay"]],
            "UNRELATED": 42
        }"#
        .parse()
        .unwrap();

        assert_eq!(config.logdir.as_deref(), Some("/srv/logs"));
        assert_eq!(
            config.hosts.unwrap(),
            vec![
                KnownHost::new(r"imap\.old", ":993"),
                KnownHost::new("mx.*", "_relay"),
            ]
        );
    }

    #[test]
    fn test_config_file_rejects_bad_host_pair() {
        let err = r#"{"HOSTS": [["only-pattern"]]}"#.parse::<ConfigFile>().unwrap_err();
        assert!(matches!(err, Error::Serde(_)));
    }
}
