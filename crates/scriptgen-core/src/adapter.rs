//! Plaintext-handling adapter for the command-line tool.
//!
//! [`UnsafeScriptGenerator`] reads credential lines, holds their passwords
//! just long enough to call [`generate`], and owns every side effect: the
//! `.sh` files it writes contain plaintext passwords. Dry-run output goes
//! to a console sink and only ever shows redacted commands.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Stdout, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::batch::batch_lines;
use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::generator::{generate, split_extra_args};
use crate::hosts::verify_host;
use crate::model::{ImapSyncCommand, ImapSyncSpec, Secrets};
use crate::parser::parse_credentials;

/// Reference name of the source password in generated specs.
pub const PASS1_REF: &str = "pw1";

/// Reference name of the destination password in generated specs.
pub const PASS2_REF: &str = "pw2";

/// Outcome of [`UnsafeScriptGenerator::process_file`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Output files, in creation order. In dry-run mode, the files that
    /// would have been written.
    pub files: Vec<PathBuf>,
    /// Commands generated.
    pub commands: usize,
    /// Non-empty lines skipped because they did not parse, whitespace-only
    /// lines included.
    pub skipped: usize,
    /// Domains of all users seen, first-seen order, no repeats.
    pub domains: Vec<String>,
}

impl RunSummary {
    fn record(&mut self, command: &ImapSyncCommand) {
        self.commands += 1;
        for domain in command.metadata().domains.split(',').filter(|d| !d.is_empty()) {
            if !self.domains.iter().any(|d| d == domain) {
                self.domains.push(domain.to_string());
            }
        }
    }
}

/// Per-run settings shared by every line.
#[derive(Debug, Clone)]
struct JobTemplate {
    host1: String,
    host2: String,
    logdir: String,
    extra_args: Option<String>,
}

impl JobTemplate {
    fn process_line(&self, line: &str) -> Result<Option<ImapSyncCommand>> {
        let (user1, pass1, user2, pass2) = match parse_credentials(line) {
            Ok(creds) => creds.into_parts(),
            Err(e) => {
                warn!("{e}");
                return Ok(None);
            }
        };

        let logfile = format!("{}__{}__{user1}--{user2}.log", self.host1, self.host2);
        let spec = ImapSyncSpec {
            host1: self.host1.clone(),
            user1,
            pass1_ref: PASS1_REF.to_string(),
            host2: self.host2.clone(),
            user2,
            pass2_ref: PASS2_REF.to_string(),
            logfile,
            extra_args: self.extra_args.clone(),
            logdir: self.logdir.clone(),
        };

        let secrets: Secrets = [(PASS1_REF, pass1), (PASS2_REF, pass2)].into_iter().collect();
        generate(&spec, &secrets).map(Some)
    }
}

/// Where batches end up: numbered script files, or the console in dry-run.
#[derive(Debug)]
struct ScriptSink<W> {
    destination: String,
    dry_run: bool,
    file_count: usize,
    console: W,
}

impl<W: Write> ScriptSink<W> {
    fn write_batch(&mut self, commands: &[ImapSyncCommand]) -> Result<PathBuf> {
        let dest_file = PathBuf::from(format!("{}_{}.sh", self.destination, self.file_count));

        if self.dry_run {
            writeln!(
                self.console,
                "# Dry-run: would write {} lines to {}",
                commands.len(),
                dest_file.display()
            )?;
            for command in commands {
                writeln!(self.console, "{command}")?;
            }
            self.console.flush()?;
        } else {
            let mut contents = String::new();
            for command in commands {
                contents.push_str(&command.to_shell_string());
                contents.push('\n');
            }
            fs::write(&dest_file, contents)?;
            debug!("Wrote {} lines to {}", commands.len(), dest_file.display());
        }

        self.file_count += 1;
        Ok(dest_file)
    }
}

/// Turns credential files into imapsync scripts.
///
/// This type handles plaintext passwords and writes them to disk. Use
/// [`generate`] directly when the passwords come from somewhere safer.
#[derive(Debug)]
pub struct UnsafeScriptGenerator<W = Stdout> {
    template: JobTemplate,
    sink: ScriptSink<W>,
    split: NonZeroUsize,
}

impl UnsafeScriptGenerator<Stdout> {
    /// Creates a generator that prints dry-run output to stdout.
    ///
    /// # Errors
    ///
    /// See [`UnsafeScriptGenerator::with_console`].
    pub fn new(cfg: GeneratorConfig) -> Result<Self> {
        Self::with_console(cfg, io::stdout())
    }
}

impl<W: Write> UnsafeScriptGenerator<W> {
    /// Creates a generator that prints dry-run output to `console`.
    ///
    /// Both hosts are run through the known-host list and the log directory
    /// is resolved here, once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a host is empty, or
    /// [`Error::ExtraArgs`] if the extra argument string cannot be
    /// tokenized.
    pub fn with_console(cfg: GeneratorConfig, console: W) -> Result<Self> {
        if cfg.host1.trim().is_empty() {
            return Err(Error::Config("host1 is required".to_string()));
        }
        if cfg.host2.trim().is_empty() {
            return Err(Error::Config("host2 is required".to_string()));
        }

        let extra_args = if cfg.extra_args.trim().is_empty() {
            None
        } else {
            split_extra_args(&cfg.extra_args)?;
            Some(cfg.extra_args.clone())
        };

        let known_hosts = cfg.known_hosts();
        let template = JobTemplate {
            host1: verify_host(&cfg.host1, known_hosts),
            host2: verify_host(&cfg.host2, known_hosts),
            logdir: cfg.resolved_logdir().to_string(),
            extra_args,
        };
        debug!(
            host1 = %template.host1,
            host2 = %template.host2,
            logdir = %template.logdir,
            "Resolved generator settings"
        );

        Ok(Self {
            template,
            sink: ScriptSink {
                destination: cfg.destination,
                dry_run: cfg.dry_run,
                file_count: 0,
                console,
            },
            split: cfg.split,
        })
    }

    /// Source host after known-host rewriting.
    #[must_use]
    pub fn host1(&self) -> &str {
        &self.template.host1
    }

    /// Destination host after known-host rewriting.
    #[must_use]
    pub fn host2(&self) -> &str {
        &self.template.host2
    }

    /// Resolved log directory.
    #[must_use]
    pub fn logdir(&self) -> &str {
        &self.template.logdir
    }

    /// Number of batches written (or printed) so far.
    #[must_use]
    pub const fn file_count(&self) -> usize {
        self.sink.file_count
    }

    /// Consumes the generator, returning the console sink.
    pub fn into_console(self) -> W {
        self.sink.console
    }

    /// Builds the command for one credential line.
    ///
    /// A line that does not parse is logged and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Propagates command construction errors.
    pub fn process_line(&self, line: &str) -> Result<Option<ImapSyncCommand>> {
        self.template.process_line(line)
    }

    /// Lazily builds commands for each line, skipping empty and unparsable
    /// ones. Whitespace-only lines count as unparsable and are logged.
    pub fn line_generator<'a, I>(
        &'a self,
        lines: I,
    ) -> impl Iterator<Item = Result<ImapSyncCommand>> + 'a
    where
        I: IntoIterator + 'a,
        I::Item: AsRef<str>,
    {
        lines
            .into_iter()
            .filter(|line| !line.as_ref().is_empty())
            .filter_map(|line| self.process_line(line.as_ref()).transpose())
    }

    /// Builds commands for every line in `lines`.
    ///
    /// # Errors
    ///
    /// Returns the first command construction error.
    pub fn process_strings<I>(&self, lines: I) -> Result<Vec<ImapSyncCommand>>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.line_generator(lines).collect()
    }

    /// Writes one batch of commands and advances the file counter.
    ///
    /// In dry-run mode prints a summary line and the redacted commands to
    /// the console instead. Returns the (would-be) output path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or console write fails.
    pub fn write_output(&mut self, commands: &[ImapSyncCommand]) -> Result<PathBuf> {
        self.sink.write_batch(commands)
    }

    /// Streams `path` line by line, writing one output file per batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] before reading anything if `path` is
    /// not a regular file. Any other failure is logged and aborts the run.
    pub fn process_file(&mut self, path: impl AsRef<Path>) -> Result<RunSummary> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        info!("Processing {}", path.display());
        self.stream_file(path).inspect_err(|e| {
            error!(critical = true, path = %path.display(), "Unhandled error: {e}");
        })
    }

    fn stream_file(&mut self, path: &Path) -> Result<RunSummary> {
        let reader = BufReader::new(File::open(path)?);
        let template = &self.template;
        let sink = &mut self.sink;

        let mut summary = RunSummary::default();
        let mut skipped = 0;

        let commands = reader.lines().filter_map(|line| match line {
            Ok(line) if line.is_empty() => None,
            Ok(line) => match template.process_line(&line) {
                Ok(None) => {
                    skipped += 1;
                    None
                }
                other => other.transpose(),
            },
            Err(e) => Some(Err(Error::from(e))),
        });

        for batch in batch_lines(commands, self.split) {
            let batch = batch.into_iter().collect::<Result<Vec<_>>>()?;
            for command in &batch {
                summary.record(command);
            }
            summary.files.push(sink.write_batch(&batch)?);
        }

        summary.skipped = skipped;
        Ok(summary)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::needless_collect,
    clippy::similar_names
)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::config::ConfigFile;
    use crate::generator::MASK;
    use crate::hosts::KnownHost;

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

    fn cfg() -> GeneratorConfig {
        GeneratorConfig::new("imap.source.tld", "imap.dest.tld")
            .with_split(NonZeroUsize::new(2).unwrap())
    }

    fn dry_run() -> UnsafeScriptGenerator<Vec<u8>> {
        UnsafeScriptGenerator::with_console(cfg().with_dry_run(true), Vec::new()).unwrap()
    }

    #[test]
    fn test_process_line_valid() {
        let generator = dry_run();
        let cmd = generator.process_line("jeff p1 john p2").unwrap().unwrap();

        assert_eq!(cmd.metadata().user1, "jeff");
        assert_eq!(cmd.metadata().user2, "john");
        assert!(cmd.argv().iter().any(|t| t == "p1"));
        assert!(cmd.argv().iter().any(|t| t == "p2"));
        assert_eq!(cmd.logfile(), "imap.source.tld__imap.dest.tld__jeff--john.log");
    }

    #[test]
    fn test_process_line_invalid() {
        assert!(dry_run().process_line("user1").unwrap().is_none());
    }

    #[test]
    fn test_line_generator() {
        let generator = dry_run();
        let out: Vec<_> = generator
            .line_generator(["a1 p1", "", "   ", "bogus", "a2 p2"])
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].metadata().user1, "a1");
        assert_eq!(out[1].metadata().user1, "a2");
    }

    #[test]
    fn test_whitespace_only_line_is_logged() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let generator = dry_run();
        let out = tracing::subscriber::with_default(subscriber, || {
            generator.process_strings(["   ", ""]).unwrap()
        });

        assert!(out.is_empty());
        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert_eq!(logs.matches("WARN").count(), 1);
        assert!(logs.contains(r#"Cannot parse credentials from line: "   ""#));
    }

    #[test]
    fn test_process_strings() {
        let out = dry_run().process_strings(vec!["a1 p1".to_string()]).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].to_shell_string().contains("--user1 a1"));
    }

    #[test]
    fn test_extra_args_appended() {
        let generator = UnsafeScriptGenerator::with_console(
            cfg().with_extra_args("--nossl1 --notls1"),
            Vec::new(),
        )
        .unwrap();
        let cmd = generator.process_line("jeff p1 john p2").unwrap().unwrap();
        assert!(cmd.to_shell_string().ends_with("--addheader --nossl1 --notls1"));
    }

    #[test]
    fn test_unbalanced_extra_args_rejected_up_front() {
        let result = UnsafeScriptGenerator::with_console(
            cfg().with_extra_args("--exclude 'Junk"),
            Vec::new(),
        );
        assert!(matches!(result, Err(Error::ExtraArgs(_))));
    }

    #[test]
    fn test_empty_host_rejected() {
        let result = UnsafeScriptGenerator::with_console(GeneratorConfig::new("", "b"), Vec::new());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_hosts_and_logdir_resolved_at_construction() {
        let config = ConfigFile {
            logdir: Some("/custom".to_string()),
            hosts: Some(vec![KnownHost::new(r"imap\.source", ":993")]),
        };
        let generator =
            UnsafeScriptGenerator::with_console(cfg().with_config(config), Vec::new()).unwrap();

        assert_eq!(generator.host1(), "imap.source.tld:993");
        assert_eq!(generator.host2(), "imap.dest.tld");
        assert_eq!(generator.logdir(), "/custom");

        let cmd = generator.process_line("u1 p1").unwrap().unwrap();
        assert_eq!(cmd.metadata().host1, "imap.source.tld:993");
        assert!(cmd.to_shell_string().contains("--logdir /custom"));
    }

    #[test]
    fn test_explicit_known_hosts_win_over_config() {
        let config = ConfigFile {
            logdir: None,
            hosts: Some(vec![KnownHost::new("imap.*", "_CFG")]),
        };
        let generator = UnsafeScriptGenerator::with_console(
            cfg()
                .with_config(config)
                .with_known_hosts(vec![KnownHost::new("imap.*", "_CLI")]),
            Vec::new(),
        )
        .unwrap();

        assert_eq!(generator.host1(), "imap.source.tld_CLI");
        assert_eq!(generator.logdir(), "/var/log/pymap");
    }

    #[test]
    fn test_write_output_dry_run() {
        let mut generator = dry_run();
        let cmd = generator.process_line("u1 p1").unwrap().unwrap();

        let dest = generator.write_output(&[cmd]).unwrap();
        assert_eq!(dest, PathBuf::from("sync_0.sh"));
        assert_eq!(generator.file_count(), 1);

        let printed = String::from_utf8(generator.into_console()).unwrap();
        let mut lines = printed.lines();
        assert_eq!(lines.next(), Some("# Dry-run: would write 1 lines to sync_0.sh"));
        let shown = lines.next().unwrap();
        assert!(shown.contains(MASK));
        assert!(!shown.split(' ').any(|t| t == "p1"));
        assert_eq!(lines.next(), None);
        assert!(!printed.contains("p1"));
    }

    #[test]
    fn test_write_output_counter_advances_in_dry_run() {
        let mut generator = dry_run();
        let cmd = generator.process_line("u1 p1").unwrap().unwrap();

        generator.write_output(std::slice::from_ref(&cmd)).unwrap();
        let second = generator.write_output(&[cmd]).unwrap();
        assert_eq!(second, PathBuf::from("sync_1.sh"));
        assert_eq!(generator.file_count(), 2);
    }

    #[test]
    fn test_process_file_missing() {
        let mut generator = dry_run();
        let err = generator.process_file("not_a_file").unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
        assert_eq!(generator.file_count(), 0);
    }

    #[test]
    fn test_summary_domains() {
        let mut summary = RunSummary::default();
        let generator = dry_run();
        for line in ["a@x.org p", "b@y.org p c@x.org q", "plain p"] {
            summary.record(&generator.process_line(line).unwrap().unwrap());
        }
        assert_eq!(summary.commands, 3);
        assert_eq!(summary.domains, vec!["x.org", "y.org"]);
    }
}
