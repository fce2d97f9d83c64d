//! Wildcard key matching for pattern invalidation.
//!
//! `*` matches any run of characters, including an empty one. Every other
//! character matches itself, and the whole key must match.

/// Returns true when `key` matches the wildcard `pattern`
pub fn wildcard_matches(pattern: &str, key: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let key: Vec<char> = key.chars().collect();

    let (mut p, mut k) = (0usize, 0usize);
    // Position of the last `*` seen and the key index it was tried against
    let mut backtrack: Option<(usize, usize)> = None;

    while k < key.len() {
        if p < pattern.len() && pattern[p] == '*' {
            backtrack = Some((p, k));
            p += 1;
        } else if p < pattern.len() && pattern[p] == key[k] {
            p += 1;
            k += 1;
        } else if let Some((star, matched)) = backtrack {
            // Let the last star swallow one more character
            p = star + 1;
            k = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_patterns() {
        assert!(wildcard_matches("session:1", "session:1"));
        assert!(!wildcard_matches("session:1", "session:12"));
        assert!(!wildcard_matches("session:12", "session:1"));
    }

    #[test]
    fn test_star_matches_any_run() {
        assert!(wildcard_matches("user:123:*", "user:123:profile"));
        assert!(wildcard_matches("user:123:*", "user:123:"));
        assert!(!wildcard_matches("user:123:*", "user:1234:profile"));
        assert!(wildcard_matches("user_*:u1", "user_interviews:u1"));
        assert!(!wildcard_matches("user_*:u1", "user_interviews:u12"));
        assert!(wildcard_matches("session:*:u1", "session:abc:u1"));
        assert!(wildcard_matches("*", ""));
        assert!(wildcard_matches("a*b*c", "aXXbYYc"));
        assert!(!wildcard_matches("a*b*c", "aXXbYY"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(wildcard_matches("q.a+[1]", "q.a+[1]"));
        assert!(!wildcard_matches("q.a", "qxa"));
    }
}
