//! Path grammar shared by the flattener and the resolver.
//!
//! A path is a `.`-separated list of segments. A segment is either a map key,
//! a map key followed by one or more list indices (`note[0]`, `matrix[1][2]`),
//! or bare indices when the containing value is itself a list (`[3]`).
//! Keys may themselves contain `.`; the resolver matches runs of tokens
//! against literal keys before splitting. The empty key renders as an empty
//! token, so `{"": {"x": 1}}` flattens to `""` and `".x"`, and a bare index
//! on a map addresses the list under its empty key.

/// One parsed `.`-separated token of a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment<'a> {
    pub key: Option<&'a str>,
    pub indices: Vec<usize>,
}

impl<'a> PathSegment<'a> {
    /// Parse a single token. Trailing `[<digits>]` groups are indices, the rest
    /// is the key. Returns `None` only for the empty token.
    pub fn parse(token: &'a str) -> Option<Self> {
        let mut rest = token;
        let mut indices = Vec::new();
        while let Some(body) = rest.strip_suffix(']') {
            let Some(open) = body.rfind('[') else {
                break;
            };
            let digits = &body[open + 1..];
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                break;
            }
            let Ok(index) = digits.parse() else {
                break;
            };
            indices.push(index);
            rest = &body[..open];
        }
        indices.reverse();

        if rest.is_empty() && indices.is_empty() {
            return None;
        }

        Some(Self {
            key: (!rest.is_empty()).then_some(rest),
            indices,
        })
    }
}

/// Path of `key` under `prefix`
pub fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Path of `key` under a node that is not the root.
///
/// Unlike [`join_key`] an empty `prefix` here names the empty key, so the
/// separator is always kept.
pub fn join_child_key(prefix: &str, key: &str) -> String {
    format!("{prefix}.{key}")
}

/// Path of list element `index` under `prefix`
pub fn join_index(prefix: &str, index: usize) -> String {
    format!("{prefix}[{index}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_key() {
        let seg = PathSegment::parse("birthDate").unwrap();
        assert_eq!(seg.key, Some("birthDate"));
        assert!(seg.indices.is_empty());
    }

    #[test]
    fn parses_key_with_indices() {
        let seg = PathSegment::parse("note[0]").unwrap();
        assert_eq!(seg.key, Some("note"));
        assert_eq!(seg.indices, vec![0]);

        let seg = PathSegment::parse("grid[12][3]").unwrap();
        assert_eq!(seg.indices, vec![12, 3]);
    }

    #[test]
    fn parses_bare_index() {
        let seg = PathSegment::parse("[4]").unwrap();
        assert_eq!(seg.key, None);
        assert_eq!(seg.indices, vec![4]);
    }

    #[test]
    fn only_the_empty_token_is_rejected() {
        assert!(PathSegment::parse("").is_none());
    }

    #[test]
    fn malformed_brackets_stay_in_the_key() {
        for token in ["[]", "note[", "note[x]", "note[-1]", "note[0]x", "[0"] {
            let seg = PathSegment::parse(token).unwrap();
            assert_eq!(seg.key, Some(token));
            assert!(seg.indices.is_empty(), "{token}");
        }
        let seg = PathSegment::parse("a[b][2]").unwrap();
        assert_eq!(seg.key, Some("a[b]"));
        assert_eq!(seg.indices, vec![2]);
    }

    #[test]
    fn keys_may_contain_dots() {
        let seg = PathSegment::parse("a.b[1]").unwrap();
        assert_eq!(seg.key, Some("a.b"));
        assert_eq!(seg.indices, vec![1]);
    }

    #[test]
    fn joins_follow_the_grammar() {
        assert_eq!(join_key("", "note"), "note");
        assert_eq!(join_index("note", 0), "note[0]");
        assert_eq!(join_key(&join_index("note", 0), "time"), "note[0].time");
        assert_eq!(join_index("", 2), "[2]");
        assert_eq!(join_child_key("", "x"), ".x");
        assert_eq!(join_child_key("a", ""), "a.");
    }
}
