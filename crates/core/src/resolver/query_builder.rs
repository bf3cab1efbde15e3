//! Search query construction from free-text post titles.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::QueryError;

/// Artist/title separators, in the order they are tried.
pub const SEPARATORS: [&str; 6] = ["-", "~", "|", "by", "--", "ー"];

/// Innermost bracketed or parenthesized group.
static ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^()\[\]]*\)|\[[^()\[\]]*\]").unwrap());

const QUOTES: [char; 6] = ['\'', '"', '‘', '’', '“', '”'];

/// Remove `(...)` and `[...]` groups, nested ones included, and quote characters.
pub fn strip_annotations(title: &str) -> String {
    let mut stripped = title.to_string();
    loop {
        let next = ANNOTATION.replace_all(&stripped, "").into_owned();
        if next == stripped {
            break;
        }
        stripped = next;
    }
    stripped.retain(|c| !QUOTES.contains(&c));
    stripped
}

/// Build a search query from `title` by splitting on `" <separator> "`.
///
/// Fails unless the split yields at least two segments, i.e. both an
/// artist-like and a title-like part were found.
pub fn build_query(title: &str, separator: &str) -> Result<String, QueryError> {
    let cleaned = strip_annotations(title);
    let pattern = format!(" {} ", separator);

    let segments: Vec<&str> = cleaned.split(pattern.as_str()).collect();
    if segments.len() < 2 {
        return Err(QueryError::NoSeparatorMatch {
            title: title.to_string(),
            separator: separator.to_string(),
        });
    }

    let query = segments
        .iter()
        .flat_map(|segment| segment.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ");

    if query.is_empty() {
        return Err(QueryError::EmptyQuery(title.to_string()));
    }

    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_query_each_separator() {
        let cases = [
            ("Something - Something", "-"),
            ("Something ~ Something", "~"),
            ("Something | Something", "|"),
            ("Something by Something", "by"),
            ("Something -- Something", "--"),
            ("Something ー Something", "ー"),
        ];

        for (title, separator) in cases {
            assert_eq!(
                build_query(title, separator).unwrap(),
                "Something Something",
                "separator '{}'",
                separator
            );
        }
    }

    #[test]
    fn test_build_query_strips_annotations() {
        assert_eq!(
            build_query("Artist - Song (Live)", "-").unwrap(),
            "Artist Song"
        );
        assert_eq!(
            build_query("Artist - Song [Official Video] (2019)", "-").unwrap(),
            "Artist Song"
        );
    }

    #[test]
    fn test_build_query_strips_nested_annotations() {
        let query = build_query("Artist - Song ((feat. [Someone]))", "-").unwrap();
        assert_eq!(query, "Artist Song");
        assert!(!query.contains('('));
        assert!(!query.contains(')'));
    }

    #[test]
    fn test_build_query_strips_quotes() {
        assert_eq!(
            build_query("Artist - \"Song\"", "-").unwrap(),
            "Artist Song"
        );
        assert_eq!(
            build_query("Artist – ‘Song’ - “Other”", "-").unwrap(),
            "Artist – Song Other"
        );
        assert_eq!(build_query("Artist - Don't Stop", "-").unwrap(), "Artist Dont Stop");
    }

    #[test]
    fn test_build_query_without_separator_fails() {
        let result = build_query("Just a title", "-");
        assert_eq!(
            result,
            Err(QueryError::NoSeparatorMatch {
                title: "Just a title".to_string(),
                separator: "-".to_string(),
            })
        );
    }

    #[test]
    fn test_separator_needs_surrounding_spaces() {
        assert!(build_query("Jay-Z - Song", "-").is_ok());
        assert!(build_query("Jay-Z", "-").is_err());
        assert!(build_query("Artist -- Song", "-").is_err());
        assert!(build_query("Stand by Me", "by").is_ok());
        assert!(build_query("Standby", "by").is_err());
    }

    #[test]
    fn test_separator_inside_annotation_is_ignored() {
        assert!(build_query("Song (Artist - Remix)", "-").is_err());
    }

    #[test]
    fn test_build_query_collapses_whitespace() {
        assert_eq!(
            build_query("  Artist   -   Song (Live)  extra ", "-").unwrap(),
            "Artist Song extra"
        );
    }

    #[test]
    fn test_build_query_more_than_two_segments() {
        assert_eq!(
            build_query("Artist - Album - Song", "-").unwrap(),
            "Artist Album Song"
        );
    }

    #[test]
    fn test_build_query_empty_segments() {
        assert!(matches!(
            build_query(" - ", "-"),
            Err(QueryError::EmptyQuery(_))
        ));
    }
}
