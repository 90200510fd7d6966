//! Safe command construction.
//!
//! Everything here is pure: no file or console I/O, and nothing retains the
//! plaintext handed in through [`Secrets`].

use crate::domain::unique_domains;
use crate::error::{Error, Result};
use crate::model::{CommandMetadata, ImapSyncCommand, ImapSyncSpec, Secrets};

/// Program name at the head of every generated command.
pub const PROGRAM: &str = "imapsync";

/// Replacement for secret tokens in redacted output.
pub const MASK: &str = "********";

/// Builds the imapsync command for `spec`, resolving its password
/// references against `secrets`.
///
/// Token order is fixed:
///
/// ```text
/// imapsync --host1 H1 --user1 U1 --password1 P1
///          --host2 H2 --user2 U2 --password2 P2
///          --log --logdir DIR --logfile FILE --addheader [EXTRA...]
/// ```
///
/// # Errors
///
/// Returns [`Error::MissingSecret`] naming every reference absent from
/// `secrets`, [`Error::ExtraArgs`] if the extra argument string has
/// unbalanced quoting, or [`Error::Quote`] if a token holds a nul byte and
/// cannot be written to a shell script.
pub fn generate(spec: &ImapSyncSpec, secrets: &Secrets) -> Result<ImapSyncCommand> {
    let (pass1, pass2) = match (secrets.get(&spec.pass1_ref), secrets.get(&spec.pass2_ref)) {
        (Some(p1), Some(p2)) => (p1, p2),
        (p1, p2) => {
            let mut missing = Vec::new();
            if p1.is_none() {
                missing.push(spec.pass1_ref.clone());
            }
            if p2.is_none() && spec.pass2_ref != spec.pass1_ref {
                missing.push(spec.pass2_ref.clone());
            }
            return Err(Error::MissingSecret(missing));
        }
    };

    let head: [&str; 19] = [
        PROGRAM,
        "--host1",
        &spec.host1,
        "--user1",
        &spec.user1,
        "--password1",
        pass1,
        "--host2",
        &spec.host2,
        "--user2",
        &spec.user2,
        "--password2",
        pass2,
        "--log",
        "--logdir",
        &spec.logdir,
        "--logfile",
        &spec.logfile,
        "--addheader",
    ];
    let mut argv: Vec<String> = head.iter().map(ToString::to_string).collect();

    if let Some(extra) = spec.extra_args.as_deref() {
        argv.extend(split_extra_args(extra)?);
    }

    let shell_line = shlex::try_join(argv.iter().map(String::as_str))?;
    let redacted_argv = redact(&argv, &[pass1, pass2]);

    let metadata = CommandMetadata {
        user1: spec.user1.clone(),
        user2: spec.user2.clone(),
        host1: spec.host1.clone(),
        host2: spec.host2.clone(),
        domains: unique_domains([spec.user1.as_str(), spec.user2.as_str()]).join(","),
    };

    Ok(ImapSyncCommand::new(
        argv,
        redacted_argv,
        shell_line,
        spec.logfile.clone(),
        metadata,
    ))
}

/// Replaces every token that exactly equals one of `secrets` with a mask.
///
/// The mask is [`MASK`] unless a secret is itself that string, in which case
/// `*` is appended until it differs from every secret. Matching is by whole
/// token, not substring. The output has the same length as `argv`.
#[must_use]
pub fn redact(argv: &[String], secrets: &[&str]) -> Vec<String> {
    let mask = mask_for(secrets);
    argv.iter()
        .map(|token| {
            if secrets.contains(&token.as_str()) {
                mask.clone()
            } else {
                token.clone()
            }
        })
        .collect()
}

fn mask_for(secrets: &[&str]) -> String {
    let mut mask = MASK.to_string();
    while secrets.contains(&mask.as_str()) {
        mask.push('*');
    }
    mask
}

/// Splits the extra argument string into shell words.
///
/// # Errors
///
/// Returns [`Error::ExtraArgs`] if quoting is unbalanced or the string ends
/// in a dangling escape.
pub fn split_extra_args(extra: &str) -> Result<Vec<String>> {
    shlex::split(extra).ok_or_else(|| Error::ExtraArgs(extra.to_string()))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::needless_collect,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn spec() -> ImapSyncSpec {
        ImapSyncSpec {
            host1: "imap.source.tld".to_string(),
            user1: "jeff@source.tld".to_string(),
            pass1_ref: "pw1".to_string(),
            host2: "imap.dest.tld".to_string(),
            user2: "john@dest.tld".to_string(),
            pass2_ref: "pw2".to_string(),
            logfile: "imap.source.tld__imap.dest.tld__jeff--john.log".to_string(),
            extra_args: None,
            logdir: "/var/log/pymap".to_string(),
        }
    }

    fn secrets() -> Secrets {
        [("pw1", "p1"), ("pw2", "p2")].into_iter().collect()
    }

    #[test]
    fn test_generate_token_order() {
        let cmd = generate(&spec(), &secrets()).unwrap();
        assert_eq!(
            cmd.argv(),
            [
                "imapsync",
                "--host1",
                "imap.source.tld",
                "--user1",
                "jeff@source.tld",
                "--password1",
                "p1",
                "--host2",
                "imap.dest.tld",
                "--user2",
                "john@dest.tld",
                "--password2",
                "p2",
                "--log",
                "--logdir",
                "/var/log/pymap",
                "--logfile",
                "imap.source.tld__imap.dest.tld__jeff--john.log",
                "--addheader",
            ]
        );
        assert_eq!(cmd.logfile(), "imap.source.tld__imap.dest.tld__jeff--john.log");
    }

    #[test]
    fn test_generate_redacts_passwords() {
        let cmd = generate(&spec(), &secrets()).unwrap();
        assert_eq!(cmd.redacted_argv()[6], MASK);
        assert_eq!(cmd.redacted_argv()[12], MASK);
        assert!(!cmd.redacted_argv().iter().any(|t| t == "p1" || t == "p2"));

        let shown = cmd.to_string();
        assert!(shown.contains("--password1 ******** --host2"));
        assert!(!format!("{cmd:?}").contains("p1"));
        assert!(cmd.to_shell_string().contains("--password1 p1 --host2"));
    }

    #[test]
    fn test_generate_secret_equal_to_mask_is_hidden() {
        let secrets: Secrets = [("pw1", MASK), ("pw2", "x")].into_iter().collect();
        let cmd = generate(&spec(), &secrets).unwrap();
        assert_eq!(cmd.argv()[6], MASK);
        assert!(!cmd.redacted_argv().iter().any(|t| t == MASK || t == "x"));
        assert_eq!(cmd.redacted_argv()[6], cmd.redacted_argv()[12]);
        assert_eq!(cmd.redacted_argv()[6], "*********");
    }

    #[test]
    fn test_shell_line_quotes_metacharacters() {
        let spec = ImapSyncSpec {
            extra_args: Some(r#"--exclude "Junk E-mail""#.to_string()),
            ..spec()
        };
        let secrets: Secrets = [("pw1", "Pa$$w0rd!"), ("pw2", "x;rm")].into_iter().collect();
        let cmd = generate(&spec, &secrets).unwrap();
        let line = cmd.to_shell_string();

        assert!(line.starts_with("imapsync --host1 imap.source.tld --user1 jeff@source.tld "));
        assert!(line.contains("--password1 'Pa$$w0rd!' --host2"));
        assert!(line.contains("--password2 'x;rm' --log"));
        assert!(line.ends_with("--addheader --exclude 'Junk E-mail'"));
        assert_eq!(shlex::split(&line).unwrap(), cmd.argv());
    }

    #[test]
    fn test_generate_rejects_nul_in_token() {
        let secrets: Secrets = [("pw1", "p\0q"), ("pw2", "p2")].into_iter().collect();
        let err = generate(&spec(), &secrets).unwrap_err();
        assert!(matches!(err, Error::Quote(_)));
    }

    #[test]
    fn test_generate_extra_args_are_shell_split() {
        let spec = ImapSyncSpec {
            extra_args: Some(r#"--nossl1 --exclude "Junk E-mail""#.to_string()),
            ..spec()
        };
        let cmd = generate(&spec, &secrets()).unwrap();
        assert_eq!(cmd.argv().len(), 22);
        assert_eq!(
            &cmd.argv()[19..],
            ["--nossl1", "--exclude", "Junk E-mail"]
        );
    }

    #[test]
    fn test_generate_empty_extra_args_add_nothing() {
        let spec = ImapSyncSpec {
            extra_args: Some("   ".to_string()),
            ..spec()
        };
        assert_eq!(generate(&spec, &secrets()).unwrap().argv().len(), 19);
    }

    #[test]
    fn test_generate_unbalanced_quotes_fail() {
        let spec = ImapSyncSpec {
            extra_args: Some(r#"--exclude "Junk"#.to_string()),
            ..spec()
        };
        let err = generate(&spec, &secrets()).unwrap_err();
        assert!(matches!(err, Error::ExtraArgs(_)));
    }

    #[test]
    fn test_generate_missing_one_secret() {
        let partial: Secrets = [("pw1", "p1")].into_iter().collect();
        let err = generate(&spec(), &partial).unwrap_err();
        match err {
            Error::MissingSecret(refs) => assert_eq!(refs, vec!["pw2"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_generate_missing_both_secrets() {
        let err = generate(&spec(), &Secrets::new()).unwrap_err();
        assert!(matches!(&err, Error::MissingSecret(refs) if refs == &["pw1", "pw2"]));
        let message = err.to_string();
        assert!(message.contains("pw1"));
        assert!(message.contains("pw2"));
    }

    #[test]
    fn test_generate_metadata() {
        let cmd = generate(&spec(), &secrets()).unwrap();
        let meta = cmd.metadata();
        assert_eq!(meta.user1, "jeff@source.tld");
        assert_eq!(meta.user2, "john@dest.tld");
        assert_eq!(meta.host1, "imap.source.tld");
        assert_eq!(meta.host2, "imap.dest.tld");
        assert_eq!(meta.domains, "source.tld,dest.tld");
    }

    #[test]
    fn test_generate_metadata_dedups_domains() {
        let spec = ImapSyncSpec {
            user1: "a@same.org".to_string(),
            user2: "b@same.org".to_string(),
            ..spec()
        };
        let cmd = generate(&spec, &secrets()).unwrap();
        assert_eq!(cmd.metadata().domains, "same.org");
    }

    #[test]
    fn test_redact_exact_match_only() {
        let argv: Vec<String> = ["--password1", "p1", "p1x", "xp1"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(redact(&argv, &["p1"]), ["--password1", MASK, "p1x", "xp1"]);
    }

    #[test]
    fn test_mask_for_skips_colliding_secrets() {
        assert_eq!(mask_for(&["p1"]), MASK);
        assert_eq!(mask_for(&[MASK, "*********"]), "**********");
    }

    proptest! {
        #[test]
        fn prop_redact_preserves_shape(
            argv in prop::collection::vec("[a-z0-9*]{1,9}|\\*{8,9}", 0..20),
            secrets in prop::collection::vec("[a-z0-9*]{1,9}|\\*{8,9}", 0..4),
        ) {
            let secret_refs: Vec<&str> = secrets.iter().map(String::as_str).collect();
            let redacted = redact(&argv, &secret_refs);
            let mask = mask_for(&secret_refs);

            prop_assert_eq!(redacted.len(), argv.len());
            for (before, after) in argv.iter().zip(&redacted) {
                if secrets.contains(before) {
                    prop_assert_eq!(after, &mask);
                } else {
                    prop_assert_eq!(after, before);
                }
                prop_assert!(!secrets.contains(after));
            }
        }
    }
}
