//! Tokenizer for chat command input.
//!
//! Splits free-form text into words, whitespace, quotes, flag words and
//! separators. The scan is an ordered choice at each cursor position: the
//! first rule that matches emits a token and advances the cursor. There is
//! no backtracking and no failure mode; every input produces a token stream
//! that ends with exactly one [`TokenKind::End`].

mod token;

pub use token::{Token, TokenKind};

const QUOTE: char = '"';
const OPEN_QUOTE: char = '\u{201C}';
const END_QUOTE: char = '\u{201D}';

/// Quote state of the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Mode {
    /// Outside of any quotes.
    #[default]
    Default,
    /// Inside `"…"`.
    Quote,
    /// Inside `“…”`.
    SmartQuote,
}

/// Vocabulary and mode settings for the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerOptions {
    flag_words: Vec<String>,
    option_flag_words: Vec<String>,
    quoted: bool,
    separator: Option<String>,
}

impl Default for LexerOptions {
    fn default() -> Self {
        Self {
            flag_words: Vec::new(),
            option_flag_words: Vec::new(),
            quoted: true,
            separator: None,
        }
    }
}

impl LexerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag words. They are kept longest-first so `--force` wins over `--f`.
    pub fn flag_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flag_words = longest_first(words);
        self
    }

    /// Set the option flag words, kept longest-first.
    pub fn option_flag_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.option_flag_words = longest_first(words);
        self
    }

    pub fn quoted(mut self, quoted: bool) -> Self {
        self.quoted = quoted;
        self
    }

    /// Set the separator. An empty separator is treated as none.
    pub fn separator(mut self, separator: Option<impl Into<String>>) -> Self {
        self.separator = separator.map(Into::into).filter(|s| !s.is_empty());
        self
    }

    /// Whether the input is split on a separator rather than whitespace.
    pub fn is_separated(&self) -> bool {
        self.separator.is_some()
    }

    fn quoting_active(&self) -> bool {
        self.quoted && self.separator.is_none()
    }
}

fn longest_first<I, S>(words: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut words: Vec<String> = words
        .into_iter()
        .map(Into::into)
        .filter(|w| !w.is_empty())
        .collect();
    words.sort_by(|a, b| b.len().cmp(&a.len()));
    words
}

type Rule<'input, 'opts> = fn(&mut Tokenizer<'input, 'opts>) -> Option<Token<'input>>;

/// Streaming tokenizer over a borrowed input.
pub struct Tokenizer<'input, 'opts> {
    input: &'input str,
    options: &'opts LexerOptions,
    position: usize,
    mode: Mode,
    finished: bool,
}

impl<'input, 'opts> Tokenizer<'input, 'opts> {
    pub fn new(input: &'input str, options: &'opts LexerOptions) -> Self {
        Self {
            input,
            options,
            position: 0,
            mode: Mode::Default,
            finished: false,
        }
    }

    fn rest(&self) -> &'input str {
        &self.input[self.position..]
    }

    /// Case-insensitive prefix test; returns the matched input slice.
    fn starts_with(&self, word: &str) -> Option<&'input str> {
        let candidate = self.rest().get(..word.len())?;
        (candidate.to_lowercase() == word.to_lowercase()).then_some(candidate)
    }

    fn emit(&mut self, kind: TokenKind, len: usize) -> Token<'input> {
        let text = &self.input[self.position..self.position + len];
        self.position += len;
        Token::new(kind, text)
    }

    fn run_one(&mut self) -> Token<'input> {
        let rules: [Rule<'input, 'opts>; 8] = [
            Self::run_whitespace,
            Self::run_flags,
            Self::run_option_flags,
            Self::run_quote,
            Self::run_open_quote,
            Self::run_end_quote,
            Self::run_separator,
            Self::run_word,
        ];
        for rule in rules {
            if let Some(token) = rule(self) {
                return token;
            }
        }
        // Nothing matched: emit one character so the cursor always advances.
        let len = self.rest().chars().next().map_or(1, char::len_utf8);
        self.emit(TokenKind::Word, len)
    }

    fn run_whitespace(&mut self) -> Option<Token<'input>> {
        let rest = self.rest();
        let len = rest.find(|c: char| !c.is_whitespace()).unwrap_or(rest.len());
        (len > 0).then(|| self.emit(TokenKind::Whitespace, len))
    }

    fn run_flags(&mut self) -> Option<Token<'input>> {
        self.run_vocabulary(TokenKind::FlagWord)
    }

    fn run_option_flags(&mut self) -> Option<Token<'input>> {
        self.run_vocabulary(TokenKind::OptionFlagWord)
    }

    fn run_vocabulary(&mut self, kind: TokenKind) -> Option<Token<'input>> {
        if self.mode != Mode::Default {
            return None;
        }
        let options = self.options;
        let words = match kind {
            TokenKind::FlagWord => &options.flag_words,
            _ => &options.option_flag_words,
        };
        let matched = words.iter().find_map(|word| self.starts_with(word))?;
        Some(self.emit(kind, matched.len()))
    }

    fn run_quote(&mut self) -> Option<Token<'input>> {
        if !self.options.quoting_active() || !self.rest().starts_with(QUOTE) {
            return None;
        }
        self.mode = match self.mode {
            Mode::Default => Mode::Quote,
            Mode::Quote => Mode::Default,
            Mode::SmartQuote => Mode::SmartQuote,
        };
        Some(self.emit(TokenKind::Quote, QUOTE.len_utf8()))
    }

    fn run_open_quote(&mut self) -> Option<Token<'input>> {
        if !self.options.quoting_active() || !self.rest().starts_with(OPEN_QUOTE) {
            return None;
        }
        if self.mode == Mode::Default {
            self.mode = Mode::SmartQuote;
        }
        Some(self.emit(TokenKind::OpenQuote, OPEN_QUOTE.len_utf8()))
    }

    fn run_end_quote(&mut self) -> Option<Token<'input>> {
        if !self.options.quoting_active() || !self.rest().starts_with(END_QUOTE) {
            return None;
        }
        if self.mode == Mode::SmartQuote {
            self.mode = Mode::Default;
        }
        Some(self.emit(TokenKind::EndQuote, END_QUOTE.len_utf8()))
    }

    fn run_separator(&mut self) -> Option<Token<'input>> {
        let separator = self.options.separator.as_deref()?;
        let matched = self.starts_with(separator)?;
        Some(self.emit(TokenKind::Separator, matched.len()))
    }

    fn run_word(&mut self) -> Option<Token<'input>> {
        let rest = self.rest();
        let stop: fn(char) -> bool = match self.mode {
            Mode::Default => char::is_whitespace,
            Mode::Quote => |c| c.is_whitespace() || c == QUOTE,
            Mode::SmartQuote => |c| c.is_whitespace() || c == END_QUOTE,
        };
        let len = rest.find(stop).unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        let word = &rest[..len];
        let len = match self.options.separator.as_deref() {
            Some(separator) if word.to_lowercase() == separator.to_lowercase() => return None,
            Some(separator) => match word.find(separator) {
                Some(cut) if cut > 0 => cut,
                _ => len,
            },
            None => len,
        };
        Some(self.emit(TokenKind::Word, len))
    }
}

impl<'input> Iterator for Tokenizer<'input, '_> {
    type Item = Token<'input>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.position >= self.input.len() {
            self.finished = true;
            return Some(Token::new(TokenKind::End, ""));
        }
        Some(self.run_one())
    }
}

/// Tokenize a whole input. The last token is always [`TokenKind::End`].
pub fn tokenize<'input>(input: &'input str, options: &LexerOptions) -> Vec<Token<'input>> {
    let tokens: Vec<Token<'input>> = Tokenizer::new(input, options).collect();
    tracing::trace!(count = tokens.len(), "tokenized input");
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    fn collect_kinds(input: &str, options: &LexerOptions) -> Vec<TokenKind> {
        tokenize(input, options).into_iter().map(|t| t.kind).collect()
    }

    fn collect_texts<'a>(input: &'a str, options: &LexerOptions) -> Vec<&'a str> {
        tokenize(input, options).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_empty_input() {
        let tokens = collect_kinds("", &LexerOptions::new());
        assert_eq!(tokens, vec![End]);
    }

    #[test]
    fn test_words_and_whitespace() {
        let options = LexerOptions::new();
        assert_eq!(
            collect_kinds("hello  world", &options),
            vec![Word, Whitespace, Word, End]
        );
        assert_eq!(collect_texts("hello  world", &options), vec!["hello", "  ", "world", ""]);
    }

    #[test]
    fn test_quotes() {
        let options = LexerOptions::new();
        assert_eq!(
            collect_kinds(r#""a b" c"#, &options),
            vec![Quote, Word, Whitespace, Word, Quote, Whitespace, Word, End]
        );
    }

    #[test]
    fn test_word_stops_at_quote_inside_quotes() {
        let options = LexerOptions::new();
        assert_eq!(
            collect_texts(r#""ab"cd"#, &options),
            vec!["\"", "ab", "\"", "cd", ""]
        );
    }

    #[test]
    fn test_smart_quotes() {
        let options = LexerOptions::new();
        assert_eq!(
            collect_kinds("\u{201C}a b\u{201D}", &options),
            vec![OpenQuote, Word, Whitespace, Word, EndQuote, End]
        );
    }

    #[test]
    fn test_unterminated_quote() {
        let options = LexerOptions::new();
        assert_eq!(
            collect_kinds(r#""a b"#, &options),
            vec![Quote, Word, Whitespace, Word, End]
        );
    }

    #[test]
    fn test_quotes_disabled() {
        let options = LexerOptions::new().quoted(false);
        assert_eq!(
            collect_texts(r#""a b""#, &options),
            vec!["\"a", " ", "b\"", ""]
        );
    }

    #[test]
    fn test_flag_words_longest_first() {
        let options = LexerOptions::new().flag_words(["-f", "-force"]);
        assert_eq!(
            collect_kinds("-force -f", &options),
            vec![FlagWord, Whitespace, FlagWord, End]
        );
        assert_eq!(collect_texts("-force -f", &options), vec!["-force", " ", "-f", ""]);
    }

    #[test]
    fn test_flag_words_case_insensitive() {
        let options = LexerOptions::new().option_flag_words(["--name"]);
        let tokens = tokenize("--NAME bob", &options);
        assert_eq!(tokens[0].kind, OptionFlagWord);
        assert_eq!(tokens[0].text, "--NAME");
    }

    #[test]
    fn test_flag_words_ignored_inside_quotes() {
        let options = LexerOptions::new().flag_words(["-f"]);
        assert_eq!(
            collect_kinds(r#""-f""#, &options),
            vec![Quote, Word, Quote, End]
        );
    }

    #[test]
    fn test_separator() {
        let options = LexerOptions::new().separator(Some(","));
        assert_eq!(
            collect_kinds("a, b c,d", &options),
            vec![Word, Separator, Whitespace, Word, Whitespace, Word, Separator, Word, End]
        );
    }

    #[test]
    fn test_separator_disables_quotes() {
        let options = LexerOptions::new().separator(Some(","));
        assert_eq!(collect_kinds(r#""a""#, &options), vec![Word, End]);
    }

    #[test]
    fn test_multibyte_input() {
        let options = LexerOptions::new().separator(Some("|"));
        let texts = collect_texts("héllo|wörld ✓", &options);
        assert_eq!(texts, vec!["héllo", "|", "wörld", " ", "✓", ""]);
    }

    #[test]
    fn test_tokens_cover_input() {
        let options = LexerOptions::new().flag_words(["-x"]).option_flag_words(["--to"]);
        let input = " -x  \u{201C}quoted text --to \"a\" b\t";
        let joined: String = collect_texts(input, &options).concat();
        assert_eq!(joined, input);
    }

    #[test]
    fn test_exactly_one_end() {
        let options = LexerOptions::new();
        let kinds = collect_kinds("a b c", &options);
        assert_eq!(kinds.iter().filter(|k| **k == End).count(), 1);
        assert_eq!(kinds.last(), Some(&End));
    }
}
