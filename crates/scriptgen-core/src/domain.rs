//! Domain extraction from email-style usernames.

use std::sync::LazyLock;

use regex::Regex;

use crate::parser::parse_credentials;

/// Everything after the last `@`, up to the first whitespace.
#[allow(clippy::unwrap_used)] // literal pattern, checked by tests
static DOMAIN_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+@(?P<domain>\S+)").unwrap());

/// Returns the domain portion of `user`, or `None` when there is no `@`.
#[must_use]
pub fn match_domain(user: &str) -> Option<&str> {
    DOMAIN_IDENTIFIER
        .captures(user)
        .and_then(|caps| caps.name("domain"))
        .map(|m| m.as_str())
}

/// Returns the domains found in the users of `users`, deduplicated in
/// first-seen order.
#[must_use]
pub fn unique_domains<'a>(users: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut domains: Vec<String> = Vec::new();
    for domain in users.into_iter().filter_map(match_domain) {
        if !domains.iter().any(|d| d == domain) {
            domains.push(domain.to_string());
        }
    }
    domains
}

/// Returns the domains of both usernames on a raw credential line.
///
/// Passwords are never inspected. A line that does not parse yields no
/// domains.
#[must_use]
pub fn extract_domains_from_credentials(line: &str) -> Vec<String> {
    parse_credentials(line).map_or_else(
        |_| Vec::new(),
        |creds| unique_domains([creds.user1.as_str(), creds.user2.as_str()]),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::needless_collect)]
mod tests {
    use super::*;

    #[test]
    fn test_match_domain() {
        assert_eq!(match_domain("user@domain.com"), Some("domain.com"));
        assert_eq!(match_domain("no-at-symbol.com.pt "), None);
        assert_eq!(match_domain("user@sub.domain.net "), Some("sub.domain.net"));
        assert_eq!(
            match_domain("john.doe@sub.domain.co.uk"),
            Some("sub.domain.co.uk")
        );
    }

    #[test]
    fn test_match_domain_needs_local_part() {
        assert_eq!(match_domain("@domain.com"), None);
        assert_eq!(match_domain("user@"), None);
    }

    #[test]
    fn test_unique_domains_keeps_first_seen_order() {
        let users = ["a@zeta.org", "b@alpha.org", "c@zeta.org", "plain"];
        assert_eq!(unique_domains(users), vec!["zeta.org", "alpha.org"]);
    }

    #[test]
    fn test_extract_domains_from_credentials() {
        let cases: [(&str, &[&str]); 6] = [
            ("user@domain.com Pass1", &["domain.com"]),
            ("no-at-symbol.com.pt YouShallNotP@ssw.ord", &[]),
            ("Invalid", &[]),
            ("user@sub.domain.net Password@123!", &["sub.domain.net"]),
            ("john.doe@sub.domain.co.uk Testing123!", &["sub.domain.co.uk"]),
            (
                "chegg@x.y.z.com Password1 bob@ross.com P$ss0rd!",
                &["x.y.z.com", "ross.com"],
            ),
        ];

        for (line, expected) in cases {
            assert_eq!(extract_domains_from_credentials(line), expected, "{line}");
        }
    }
}
