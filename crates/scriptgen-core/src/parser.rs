//! Credential line parsing.
//!
//! Input lines come in two shapes:
//!
//! ```text
//! user pass
//! user1 pass1 user2 pass2
//! ```
//!
//! Tokens are separated by any run of whitespace. A single-identity line
//! syncs the account to itself under the same name.

use crate::error::ParseError;

/// The two (user, password) pairs found on one input line.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Source username.
    pub user1: String,
    /// Source password (plaintext).
    pub pass1: String,
    /// Destination username.
    pub user2: String,
    /// Destination password (plaintext).
    pub pass2: String,
}

impl Credentials {
    /// Splits the pairs into a `(user1, pass1, user2, pass2)` tuple.
    #[must_use]
    pub fn into_parts(self) -> (String, String, String, String) {
        (self.user1, self.pass1, self.user2, self.pass2)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user1", &self.user1)
            .field("pass1", &crate::MASK)
            .field("user2", &self.user2)
            .field("pass2", &crate::MASK)
            .finish()
    }
}

/// Parses a line into its two credential pairs.
///
/// Extra tokens past the fourth are ignored. With two or three tokens the
/// second pair repeats the first.
///
/// # Errors
///
/// Returns `ParseError` if fewer than two tokens remain after whitespace
/// normalization.
pub fn parse_credentials(line: &str) -> Result<Credentials, ParseError> {
    let parts: Vec<&str> = line.split_whitespace().take(4).collect();

    let (user1, pass1, user2, pass2) = match parts.as_slice() {
        [u1, p1, u2, p2] => (*u1, *p1, *u2, *p2),
        [u1, p1] | [u1, p1, _] => (*u1, *p1, *u1, *p1),
        _ => {
            return Err(ParseError {
                line: line.to_string(),
            });
        }
    };

    Ok(Credentials {
        user1: user1.to_string(),
        pass1: pass1.to_string(),
        user2: user2.to_string(),
        pass2: pass2.to_string(),
    })
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parts(line: &str) -> (String, String, String, String) {
        parse_credentials(line).unwrap().into_parts()
    }

    fn owned(a: &str, b: &str, c: &str, d: &str) -> (String, String, String, String) {
        (a.to_string(), b.to_string(), c.to_string(), d.to_string())
    }

    #[test]
    fn test_two_fields() {
        assert_eq!(
            parts("john@email.com Password123!"),
            owned(
                "john@email.com",
                "Password123!",
                "john@email.com",
                "Password123!"
            )
        );
    }

    #[test]
    fn test_tabs_and_multiple_spaces() {
        assert_eq!(
            parts("   jeff@jeffmail.com\t   pass123   "),
            owned(
                "jeff@jeffmail.com",
                "pass123",
                "jeff@jeffmail.com",
                "pass123"
            )
        );
        assert_eq!(
            parts("\n   user1@email.com Pa$$w0rd!  \t"),
            owned(
                "user1@email.com",
                "Pa$$w0rd!",
                "user1@email.com",
                "Pa$$w0rd!"
            )
        );
    }

    #[test]
    fn test_four_fields() {
        assert_eq!(parts("u1 p1 u2 p2"), owned("u1", "p1", "u2", "p2"));
    }

    #[test]
    fn test_extra_fields_ignored() {
        assert_eq!(
            parts("u1 p1 u2 p2 uno dos tres catorze"),
            owned("u1", "p1", "u2", "p2")
        );
    }

    #[test]
    fn test_three_fields_repeat_first_pair() {
        assert_eq!(parts("u1 p1 u2"), owned("u1", "p1", "u1", "p1"));
    }

    #[test]
    fn test_invalid_lines() {
        for bad in ["", "   ", "u1", "u1   ", "\t  u1"] {
            let err = parse_credentials(bad).unwrap_err();
            assert_eq!(err.line, bad);
        }
    }

    #[test]
    fn test_debug_hides_passwords() {
        let creds = parse_credentials("alice s3cret bob hunter2").unwrap();
        let debug = format!("{creds:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("hunter2"));
    }

    proptest! {
        #[test]
        fn prop_two_or_more_tokens_parse(
            tokens in prop::collection::vec("[a-zA-Z0-9@.!$]{1,12}", 2..8),
            sep in "[ \t]{1,3}",
        ) {
            let line = tokens.join(sep.as_str());
            let creds = parse_credentials(&line).unwrap();
            prop_assert_eq!(&creds.user1, &tokens[0]);
            prop_assert_eq!(&creds.pass1, &tokens[1]);
            if tokens.len() < 4 {
                prop_assert_eq!(&creds.user2, &tokens[0]);
                prop_assert_eq!(&creds.pass2, &tokens[1]);
            } else {
                prop_assert_eq!(&creds.user2, &tokens[2]);
                prop_assert_eq!(&creds.pass2, &tokens[3]);
            }
        }

        #[test]
        fn prop_fewer_than_two_tokens_fail(
            token in proptest::option::of("[a-z0-9]{1,10}"),
            pad in "[ \t\n]{0,4}",
        ) {
            let line = match token {
                Some(t) => format!("{pad}{t}{pad}"),
                None => pad,
            };
            prop_assert!(parse_credentials(&line).is_err());
        }
    }
}
