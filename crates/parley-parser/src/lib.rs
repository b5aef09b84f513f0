//! Content parser for chat command arguments.
//!
//! Turns the text after a command name into a [`ParseResult`]: an ordered
//! list of phrases, flags and option flags, each carrying its exact raw
//! slice of the input so any suffix of the input can be rebuilt losslessly.

mod parser;
mod result;

pub use parley_lexer::{LexerOptions, Token, TokenKind};
pub use result::{EntryKind, ParseResult, ParsedEntry, join_raw, window};

use parley_lexer::tokenize;

use crate::parser::Parser;

/// Parser configuration and entry point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentParser {
    options: LexerOptions,
}

impl ContentParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = self.options.flag_words(words);
        self
    }

    pub fn option_flag_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = self.options.option_flag_words(words);
        self
    }

    pub fn quoted(mut self, quoted: bool) -> Self {
        self.options = self.options.quoted(quoted);
        self
    }

    pub fn separator(mut self, separator: Option<impl Into<String>>) -> Self {
        self.options = self.options.separator(separator);
        self
    }

    /// Parse content. Never fails.
    pub fn parse(&self, content: &str) -> ParseResult {
        let tokens = tokenize(content, &self.options);
        let result = Parser::new(tokens, self.options.is_separated()).parse();
        tracing::debug!(
            phrases = result.phrases.len(),
            flags = result.flags.len(),
            option_flags = result.option_flags.len(),
            "parsed content"
        );
        result
    }
}

/// Parse content with default settings: quoting on, no flags, no separator.
pub fn parse(content: &str) -> ParseResult {
    ContentParser::new().parse(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phrase_values(result: &ParseResult) -> Vec<&str> {
        result.phrases.iter().map(ParsedEntry::value).collect()
    }

    fn assert_partition(result: &ParseResult) {
        assert_eq!(
            result.all.len(),
            result.phrases.len() + result.flags.len() + result.option_flags.len()
        );
    }

    #[test]
    fn test_parse_empty() {
        let result = parse("");
        assert!(result.is_empty());
        assert_partition(&result);
    }

    #[test]
    fn test_parse_words() {
        let result = parse("hello there world");
        assert_eq!(phrase_values(&result), vec!["hello", "there", "world"]);
        assert_eq!(result.all[0].raw, "hello ");
        assert_eq!(result.all[2].raw, "world");
    }

    #[test]
    fn test_parse_quoted_phrase() {
        let result = parse(r#""a b" c"#);
        assert_eq!(phrase_values(&result), vec!["a b", "c"]);
        assert_eq!(result.phrases[0].raw, "\"a b\" ");
    }

    #[test]
    fn test_parse_smart_quotes() {
        let result = parse("\u{201C}a b\u{201D} c");
        assert_eq!(phrase_values(&result), vec!["a b", "c"]);
    }

    #[test]
    fn test_parse_unterminated_quote() {
        let result = parse(r#"x "a b"#);
        assert_eq!(phrase_values(&result), vec!["x", "a b"]);
        assert_eq!(result.raw(), r#"x "a b"#);
    }

    #[test]
    fn test_parse_stray_end_quote() {
        let result = parse("a \u{201D} b");
        assert_eq!(phrase_values(&result), vec!["a", "\u{201D}", "b"]);
    }

    #[test]
    fn test_parse_separator() {
        let parser = ContentParser::new().separator(Some(","));
        let result = parser.parse("a, b c, d");
        assert_eq!(phrase_values(&result), vec!["a", "b c", "d"]);
        assert_eq!(result.all[0].raw, "a,");
        assert_eq!(result.all[1].raw, " b c,");
    }

    #[test]
    fn test_parse_separator_empty_arguments() {
        let parser = ContentParser::new().separator(Some(","));
        let result = parser.parse(",a,,b,");
        assert_eq!(phrase_values(&result), vec!["", "a", "", "b"]);
        assert_eq!(result.raw(), ",a,,b,");
    }

    #[test]
    fn test_parse_flag() {
        let parser = ContentParser::new().flag_words(["-f"]);
        let result = parser.parse("-f hello");
        assert_eq!(result.flags.len(), 1);
        assert_eq!(result.flags[0].key(), "-f");
        assert_eq!(phrase_values(&result), vec!["hello"]);
        assert_partition(&result);
    }

    #[test]
    fn test_parse_option_flag() {
        let parser = ContentParser::new().option_flag_words(["--name"]);
        let result = parser.parse("--name bob");
        assert_eq!(result.option_flags.len(), 1);
        assert_eq!(result.option_flags[0].key(), "--name");
        assert_eq!(result.option_flags[0].value(), "bob");
        assert!(result.phrases.is_empty());
    }

    #[test]
    fn test_parse_option_flag_quoted_value() {
        let parser = ContentParser::new().option_flag_words(["--name"]);
        let result = parser.parse(r#"--name "bob smith" rest"#);
        assert_eq!(result.option_flags[0].value(), "bob smith");
        assert_eq!(result.option_flags[0].raw, "--name \"bob smith\" ");
        assert_eq!(phrase_values(&result), vec!["rest"]);
    }

    #[test]
    fn test_parse_option_flag_without_value() {
        let parser = ContentParser::new()
            .flag_words(["-v"])
            .option_flag_words(["--to"]);
        let result = parser.parse("--to -v");
        assert_eq!(result.option_flags[0].value(), "");
        assert_eq!(result.option_flags[0].raw, "--to ");
        assert_eq!(result.flags.len(), 1);
    }

    #[test]
    fn test_parse_option_flag_in_separated_mode() {
        let parser = ContentParser::new()
            .separator(Some("|"))
            .option_flag_words(["--title"]);
        let result = parser.parse("--title big news | body");
        assert_eq!(result.option_flags[0].value(), "big news");
        assert_eq!(phrase_values(&result), vec!["body"]);
    }

    #[test]
    fn test_parse_whitespace_only() {
        let result = parse("   ");
        assert_eq!(phrase_values(&result), vec![""]);
        assert_eq!(result.raw(), "   ");
    }

    #[test]
    fn test_raw_from_suffix() {
        let parser = ContentParser::new().flag_words(["-f"]);
        let input = "one  -f \"two three\" four";
        let result = parser.parse(input);
        assert_eq!(result.raw_from(1), "-f \"two three\" four");
        assert_eq!(result.raw_from(3), "four");
        assert_eq!(result.raw_from(10), "");
    }

    #[test]
    fn test_round_trip() {
        let parsers = [
            ContentParser::new(),
            ContentParser::new().quoted(false),
            ContentParser::new().flag_words(["-f", "--force"]).option_flag_words(["--to", "-o"]),
            ContentParser::new().separator(Some(",")).flag_words(["-f"]),
            ContentParser::new().separator(Some(" | ")),
        ];
        let inputs = [
            "",
            " ",
            "a",
            "  leading and trailing  ",
            r#"say "hello world" to --to "the moon" -f"#,
            "unterminated \"quote here",
            "\u{201C}smart quoted\u{201D} and \u{201D} stray",
            "a,b,,c , d,",
            "-f--force --to",
            "tabs\tand\nnewlines",
            "mixed \"a\u{201C}b\" ”x",
            "x | y |z",
        ];
        for parser in &parsers {
            for input in inputs {
                let result = parser.parse(input);
                assert_eq!(result.raw(), input, "round trip failed for {:?}", input);
                assert_partition(&result);
            }
        }
    }

    #[test]
    fn test_serialize_result() {
        let parser = ContentParser::new().flag_words(["-f"]);
        let result = parser.parse("-f x");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["all"][0]["kind"], "Flag");
        assert_eq!(json["phrases"][0]["value"], "x");
    }
}
