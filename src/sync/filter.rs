//! User filtering: disabled accounts and exclude patterns

use crate::error::{AppError, Result};
use crate::provider::UserWithGroups;
use glob::Pattern;

/// Split a comma-separated pattern list and compile each glob.
///
/// Blank items are ignored; an invalid glob is a configuration error.
pub fn parse_exclude_patterns(raw: &str) -> Result<Vec<Pattern>> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            Pattern::new(&shell_glob(p)).map_err(|e| {
                AppError::Config(format!("Invalid exclude pattern '{}': {}", p, e))
            })
        })
        .collect()
}

/// Rewrite a shell glob into `glob` crate syntax.
///
/// Usernames have no path components, so `**` means the same as `*`. A `[`
/// without a closing `]` is a literal bracket.
fn shell_glob(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len());
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                out.push('*');
                while i < chars.len() && chars[i] == '*' {
                    i += 1;
                }
            }
            '[' => match bracket_end(&chars, i) {
                Some(end) => {
                    out.extend(&chars[i..=end]);
                    i = end + 1;
                }
                None => {
                    out.push_str("[[]");
                    i += 1;
                }
            },
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

/// Index of the `]` closing the bracket expression opened at `start`.
/// A `]` right after `[` or `[!` is a member, not the terminator.
fn bracket_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    (j..chars.len()).find(|&k| chars[k] == ']')
}

/// True when the username matches at least one pattern
pub fn should_exclude(username: &str, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|p| p.matches(username))
}

/// Users split by the filter, each list in input order
#[derive(Debug, Default)]
pub struct FilterOutcome {
    pub kept: Vec<UserWithGroups>,
    /// Usernames dropped because the account is disabled
    pub disabled: Vec<String>,
    /// Usernames dropped by an exclude pattern
    pub excluded: Vec<String>,
}

/// Drop disabled users, then users matching an exclude pattern
pub fn filter_users(users: Vec<UserWithGroups>, patterns: &[Pattern]) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();

    for entry in users {
        if !entry.user.enabled {
            outcome.disabled.push(entry.user.username);
        } else if should_exclude(&entry.user.username, patterns) {
            outcome.excluded.push(entry.user.username);
        } else {
            outcome.kept.push(entry);
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::RawUser;
    use rstest::rstest;

    fn patterns(raw: &str) -> Vec<Pattern> {
        parse_exclude_patterns(raw).unwrap()
    }

    fn entry(username: &str, enabled: bool) -> UserWithGroups {
        UserWithGroups {
            user: RawUser {
                id: format!("id-{}", username),
                username: username.to_string(),
                email: None,
                enabled,
                first_name: None,
                last_name: None,
            },
            groups: vec![],
        }
    }

    #[test]
    fn test_parse_splits_and_trims() {
        let parsed = patterns(" svc-* , ,test?,, [ab]ot ");
        let raw: Vec<_> = parsed.iter().map(|p| p.as_str()).collect();
        assert_eq!(raw, vec!["svc-*", "test?", "[ab]ot"]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(patterns("").is_empty());
        assert!(patterns(" , ").is_empty());
    }

    #[test]
    fn test_unclosed_bracket_is_literal() {
        let parsed = patterns("ok-*, [unclosed");
        assert_eq!(parsed.len(), 2);
        assert!(should_exclude("[unclosed", &parsed));
        assert!(!should_exclude("unclosed", &parsed));
    }

    #[rstest]
    #[case("svc**", "svc*")]
    #[case("a***b", "a*b")]
    #[case("svc-[", "svc-[[]")]
    #[case("[ab", "[[]ab")]
    #[case("[ab]ot", "[ab]ot")]
    #[case("[]x]", "[]x]")]
    #[case("[!]x]y", "[!]x]y")]
    #[case("[**]", "[**]")]
    fn test_shell_glob_rewrite(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(shell_glob(input), expected);
    }

    #[test]
    fn test_empty_patterns_never_exclude() {
        for username in ["alice", "", "svc-batch", "*"] {
            assert!(!should_exclude(username, &[]));
        }
    }

    #[test]
    fn test_glob_semantics() {
        let svc = patterns("svc-*");
        assert!(should_exclude("svc-batch", &svc));
        assert!(should_exclude("svc-", &svc));
        assert!(!should_exclude("svc", &svc));
        assert!(!should_exclude("my-svc-batch", &svc));

        let single = patterns("test?");
        assert!(should_exclude("test1", &single));
        assert!(!should_exclude("test", &single));
        assert!(!should_exclude("test12", &single));

        let class = patterns("[bc]ot");
        assert!(should_exclude("bot", &class));
        assert!(should_exclude("cot", &class));
        assert!(!should_exclude("dot", &class));

        let double_star = patterns("svc**");
        assert!(should_exclude("svc-batch", &double_star));
        assert!(should_exclude("svc", &double_star));
        assert!(!should_exclude("bob", &double_star));

        let open_bracket = patterns("svc-[");
        assert!(should_exclude("svc-[", &open_bracket));
        assert!(!should_exclude("svc-a", &open_bracket));
    }

    #[test]
    fn test_any_pattern_matches() {
        let list = patterns("admin, svc-*");
        assert!(should_exclude("admin", &list));
        assert!(should_exclude("svc-x", &list));
        assert!(!should_exclude("alice", &list));

        let reversed = patterns("svc-*, admin");
        for username in ["admin", "svc-x", "alice"] {
            assert_eq!(should_exclude(username, &list), should_exclude(username, &reversed));
        }
    }

    #[test]
    fn test_filter_users() {
        let users = vec![
            entry("alice", true),
            entry("bob", false),
            entry("svc-batch", true),
            entry("svc", true),
            entry("svc-disabled", false),
        ];

        let outcome = filter_users(users, &patterns("svc-*"));

        let kept: Vec<_> = outcome.kept.iter().map(|u| u.user.username.as_str()).collect();
        assert_eq!(kept, vec!["alice", "svc"]);
        assert_eq!(outcome.disabled, vec!["bob", "svc-disabled"]);
        assert_eq!(outcome.excluded, vec!["svc-batch"]);
    }

    #[test]
    fn test_disabled_user_dropped_without_patterns() {
        let outcome = filter_users(vec![entry("bob", false)], &[]);
        assert!(outcome.kept.is_empty());
        assert_eq!(outcome.disabled, vec!["bob"]);
    }
}
