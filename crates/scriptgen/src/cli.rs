//! Command-line arguments.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use scriptgen_core::{ConfigFile, DEFAULT_DESTINATION, DEFAULT_SPLIT, GeneratorConfig, KnownHost};

/// Generate imapsync scripts from a credential list.
///
/// Each input line is `user pass` or `user1 pass1 user2 pass2`. The
/// generated scripts contain plaintext passwords.
#[derive(Debug, Parser)]
#[command(name = "imapsync-scriptgen", version, about)]
pub struct Arguments {
    /// Credential list, one account per line.
    pub input_file: PathBuf,

    /// Source IMAP host.
    #[arg(long)]
    pub host1: String,

    /// Destination IMAP host.
    #[arg(long)]
    pub host2: String,

    /// Commands per output script.
    #[arg(long, default_value_t = DEFAULT_SPLIT)]
    pub split: NonZeroUsize,

    /// Extra imapsync arguments appended to every command.
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub extra: String,

    /// Output file prefix; scripts are named PREFIX_N.sh.
    #[arg(long, default_value = DEFAULT_DESTINATION)]
    pub destination: String,

    /// Directory imapsync writes its logs to.
    #[arg(long)]
    pub logdir: Option<String>,

    /// JSON config file providing LOGDIR and HOSTS.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Append SUFFIX to a host matching PATTERN. Repeatable; first match wins.
    #[arg(
        long = "known-host",
        num_args = 2,
        value_names = ["PATTERN", "SUFFIX"],
        action = ArgAction::Append
    )]
    pub known_hosts: Vec<String>,

    /// Print redacted commands instead of writing scripts.
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Arguments {
    /// Builds the generator configuration, loading `--config` if given.
    pub fn to_config(&self) -> Result<GeneratorConfig> {
        let known_hosts = self
            .known_hosts
            .chunks_exact(2)
            .map(|pair| KnownHost::new(pair[0].as_str(), pair[1].as_str()))
            .collect();

        let mut cfg = GeneratorConfig::new(self.host1.as_str(), self.host2.as_str())
            .with_extra_args(self.extra.as_str())
            .with_destination(self.destination.as_str())
            .with_split(self.split)
            .with_dry_run(self.dry_run)
            .with_known_hosts(known_hosts);

        if let Some(logdir) = &self.logdir {
            cfg = cfg.with_logdir(logdir.as_str());
        }

        if let Some(path) = &self.config {
            let config = ConfigFile::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            cfg = cfg.with_config(config);
        }

        Ok(cfg)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_arguments() {
        let args = Arguments::try_parse_from([
            "imapsync-scriptgen",
            "input.txt",
            "--host1",
            "old.example.com",
            "--host2",
            "new.example.com",
        ])
        .unwrap();

        assert_eq!(args.input_file, PathBuf::from("input.txt"));
        assert_eq!(args.split.get(), 30);
        assert!(!args.dry_run);

        let cfg = args.to_config().unwrap();
        assert_eq!(cfg.host1, "old.example.com");
        assert_eq!(cfg.destination, "sync");
        assert_eq!(cfg.extra_args, "");
        assert_eq!(cfg.resolved_logdir(), "/var/log/pymap");
        assert!(cfg.known_hosts().is_none());
    }

    #[test]
    fn test_full_arguments() {
        let args = Arguments::try_parse_from([
            "imapsync-scriptgen",
            "input.txt",
            "--host1",
            "old.example.com",
            "--host2",
            "new.example.com",
            "--split",
            "1",
            "--extra",
            "--nossl1 --notls1",
            "--destination",
            "out/batch",
            "--logdir",
            "/tmp/logs",
            "--known-host",
            "old.*",
            ":993",
            "--known-host",
            "new.*",
            "_X",
            "--dry-run",
        ])
        .unwrap();

        let cfg = args.to_config().unwrap();
        assert!(cfg.dry_run);
        assert_eq!(cfg.split.get(), 1);
        assert_eq!(cfg.extra_args, "--nossl1 --notls1");
        assert_eq!(cfg.destination, "out/batch");
        assert_eq!(cfg.resolved_logdir(), "/tmp/logs");
        assert_eq!(
            cfg.known_hosts().unwrap(),
            [KnownHost::new("old.*", ":993"), KnownHost::new("new.*", "_X")]
        );
    }

    #[test]
    fn test_zero_split_rejected() {
        let result = Arguments::try_parse_from([
            "imapsync-scriptgen",
            "input.txt",
            "--host1",
            "a",
            "--host2",
            "b",
            "--split",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_hosts_required() {
        let result = Arguments::try_parse_from(["imapsync-scriptgen", "input.txt", "--host1", "a"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_config_file_fails() {
        let args = Arguments::try_parse_from([
            "imapsync-scriptgen",
            "input.txt",
            "--host1",
            "a",
            "--host2",
            "b",
            "--config",
            "/nonexistent/scriptgen.json",
        ])
        .unwrap();

        let err = args.to_config().unwrap_err();
        assert!(err.to_string().contains("failed to load config"));
    }
}
