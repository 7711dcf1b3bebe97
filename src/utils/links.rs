use once_cell::sync::Lazy;
use regex::Regex;

static RAW_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"']+"#).expect("Failed to compile URL regex"));

/// All HTTP(S) links in `text`, in order of appearance.
#[must_use]
pub fn extract_links_from_text(text: &str) -> Vec<String> {
    RAW_URL_RE
        .find_iter(text)
        .map(|m| trim_trailing_punctuation(m.as_str()).to_string())
        .filter(|link| !link.is_empty())
        .collect()
}

/// The first link in `text`; only this one is fetched for a message.
#[must_use]
pub fn first_link(text: &str) -> Option<String> {
    extract_links_from_text(text).into_iter().next()
}

const BRACKET_PAIRS: [(char, char); 3] = [('(', ')'), ('[', ']'), ('{', '}')];

/// Strips sentence punctuation glued to the end of a link. A closing bracket
/// is only stripped while it is unbalanced within the link.
#[must_use]
fn trim_trailing_punctuation(mut s: &str) -> &str {
    while let Some(last) = s.chars().last() {
        let strip = match BRACKET_PAIRS.iter().find(|(_, close)| *close == last) {
            Some(&(open, close)) => {
                s.chars().filter(|&c| c == close).count() > s.chars().filter(|&c| c == open).count()
            }
            None => matches!(last, '.' | ',' | ';' | ':' | '!' | '?'),
        };
        if !strip {
            break;
        }
        s = &s[..s.len() - last.len_utf8()];
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_first_link_and_strips_sentence_punctuation() {
        let text = "check this out http://example.com/a). and https://foo.bar/baz";
        assert_eq!(first_link(text).as_deref(), Some("http://example.com/a"));
        assert_eq!(extract_links_from_text(text).len(), 2);
    }

    #[test]
    fn balanced_parentheses_stay_part_of_the_link() {
        let text = "see https://en.wikipedia.org/wiki/Rust_(programming_language) for details";
        assert_eq!(
            first_link(text).as_deref(),
            Some("https://en.wikipedia.org/wiki/Rust_(programming_language)")
        );
        assert_eq!(
            first_link("(https://en.wikipedia.org/wiki/Rust_(programming_language)).").as_deref(),
            Some("https://en.wikipedia.org/wiki/Rust_(programming_language)")
        );
    }

    #[test]
    fn no_link_in_plain_text() {
        assert_eq!(first_link("just words, no http here"), None);
    }
}
