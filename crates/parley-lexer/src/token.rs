/// Kind of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A run of non-whitespace text.
    Word,
    /// A run of whitespace.
    Whitespace,
    /// A straight double quote `"`, opening or closing.
    Quote,
    /// A curly opening quote `“`.
    OpenQuote,
    /// A curly closing quote `”`.
    EndQuote,
    /// One of the configured flag words (`-f`, `--force`).
    FlagWord,
    /// One of the configured option flag words (`--name`).
    OptionFlagWord,
    /// The configured separator.
    Separator,
    /// End of input. Always the last token, exactly once.
    End,
}

/// A token with a slice borrowed from the input.
///
/// `text` is always the exact input slice the token covers, so the texts of
/// every token concatenated in order give back the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'input> {
    pub kind: TokenKind,
    pub text: &'input str,
}

impl<'input> Token<'input> {
    pub fn new(kind: TokenKind, text: &'input str) -> Self {
        Self { kind, text }
    }

    pub fn is(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.kind)
    }
}
