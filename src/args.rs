//! Parser for free-form `/fiction` command arguments.
//!
//! Input looks like `/fiction author:john silver,topic:bananas`. The text is
//! split on runs of spaces, commas and semicolons; a token opens a capture
//! when it starts with a known key name followed by a colon, and every later
//! token that is not itself a key gets glued onto the open capture. That is
//! how multi-word values survive the split. Tokens before the first key
//! (including the `/fiction` command word itself) are ignored.
//!
//! A colon-bearing token with an unrecognized key (`style:funny`) is NOT a
//! key: it falls through and is appended to the open capture like any other
//! word. Callers rely on this.

use std::collections::HashMap;

/// Parsed `key -> value` arguments for the `/fiction` command.
pub type FictionArgs = HashMap<String, String>;

const KEYS: [&str; 2] = ["topic", "author"];

/// Pure and infallible: any input, including the empty string or text with no
/// recognized keys, yields an empty mapping.
pub fn parse_fiction_args(raw: &str) -> FictionArgs {
    let mut args = FictionArgs::new();
    let mut current: Option<&str> = None;

    for token in raw.split([' ', ',', ';']).filter(|t| !t.is_empty()) {
        let matched = KEYS.iter().find_map(|k| {
            token
                .strip_prefix(k)
                .and_then(|rest| rest.strip_prefix(':'))
                .map(|value| (*k, value))
        });

        match matched {
            Some((key, value)) => {
                // A repeated key resets its capture (last write wins).
                args.insert(key.to_string(), value.to_string());
                current = Some(key);
            }
            None => {
                if let Some(key) = current
                    && let Some(value) = args.get_mut(key)
                {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(token);
                }
            }
        }
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expect(pairs: &[(&str, &str)]) -> FictionArgs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_fiction_args("").is_empty());
    }

    #[test]
    fn test_no_colon_tokens() {
        assert!(parse_fiction_args("/fiction").is_empty());
        assert!(parse_fiction_args("/fiction tell me something").is_empty());
    }

    #[test]
    fn test_single_author() {
        assert_eq!(
            parse_fiction_args("/fiction author:bob"),
            expect(&[("author", "bob")])
        );
    }

    #[test]
    fn test_single_topic() {
        assert_eq!(
            parse_fiction_args("/fiction topic:bananas"),
            expect(&[("topic", "bananas")])
        );
    }

    #[test]
    fn test_multi_word_value_with_second_key() {
        assert_eq!(
            parse_fiction_args("/fiction author:john silver topic:bananas"),
            expect(&[("author", "john silver"), ("topic", "bananas")])
        );
    }

    #[test]
    fn test_comma_delimiter() {
        assert_eq!(
            parse_fiction_args("/fiction author:john silver,topic:bananas"),
            expect(&[("author", "john silver"), ("topic", "bananas")])
        );
    }

    #[test]
    fn test_semicolons_and_delimiter_runs() {
        assert_eq!(
            parse_fiction_args("/fiction topic:sea;;  ,monsters"),
            expect(&[("topic", "sea monsters")])
        );
    }

    #[test]
    fn test_unknown_key_falls_through_as_continuation() {
        // "style:" is not a recognized key, so the whole token joins the
        // open author capture.
        assert_eq!(
            parse_fiction_args("/fiction author:bob style:funny"),
            expect(&[("author", "bob style:funny")])
        );
    }

    #[test]
    fn test_unknown_key_before_any_capture_is_ignored() {
        assert_eq!(
            parse_fiction_args("/fiction style:funny topic:cats"),
            expect(&[("topic", "cats")])
        );
    }

    #[test]
    fn test_empty_initial_value_gets_no_leading_space() {
        assert_eq!(
            parse_fiction_args("/fiction author: bob"),
            expect(&[("author", "bob")])
        );
    }

    #[test]
    fn test_value_keeps_later_colons() {
        assert_eq!(
            parse_fiction_args("/fiction topic:12:30 lunch"),
            expect(&[("topic", "12:30 lunch")])
        );
    }

    #[test]
    fn test_repeated_key_last_write_wins() {
        assert_eq!(
            parse_fiction_args("/fiction topic:cats topic:dogs"),
            expect(&[("topic", "dogs")])
        );
    }

    #[test]
    fn test_parsing_is_pure() {
        let input = "/fiction author:john silver,topic:bananas";
        assert_eq!(parse_fiction_args(input), parse_fiction_args(input));
    }
}
