use parley_lexer::{Token, TokenKind};

use crate::result::{ParseResult, ParsedEntry};

use TokenKind::*;

/// Recursive-descent parser over a token stream.
///
/// Every rule either consumes tokens or produces an empty phrase, and every
/// argument consumes at least one token, so parsing always terminates and
/// never fails.
pub(crate) struct Parser<'input> {
    tokens: Vec<Token<'input>>,
    position: usize,
    separated: bool,
    result: ParseResult,
}

impl<'input> Parser<'input> {
    pub(crate) fn new(tokens: Vec<Token<'input>>, separated: bool) -> Self {
        Self {
            tokens,
            position: 0,
            separated,
            result: ParseResult::new(),
        }
    }

    pub(crate) fn parse(mut self) -> ParseResult {
        // The final token is End.
        while self.position + 1 < self.tokens.len() {
            self.run_argument();
        }
        self.result
    }

    fn lookahead_n(&self, n: usize, kinds: &[TokenKind]) -> bool {
        self.tokens
            .get(self.position + n)
            .is_some_and(|token| token.is(kinds))
    }

    fn lookahead(&self, kinds: &[TokenKind]) -> bool {
        self.lookahead_n(0, kinds)
    }

    fn consume(&mut self, kinds: &[TokenKind]) -> Option<Token<'input>> {
        if !self.lookahead(kinds) {
            return None;
        }
        let token = self.tokens[self.position];
        self.position += 1;
        Some(token)
    }

    fn consume_text(&mut self, kind: TokenKind) -> &'input str {
        self.consume(&[kind]).map_or("", |token| token.text)
    }

    /// argument: WS? (flag | option_flag | phrase) WS? Separator?
    fn run_argument(&mut self) {
        let leading = self.consume_text(Whitespace);
        let mut entry = match self.consume(&[FlagWord, OptionFlagWord]) {
            Some(token) => self.parse_flag(token),
            None => self.parse_phrase(),
        };
        let trailing = self.consume_text(Whitespace);
        let separator = self.consume_text(Separator);
        entry.raw = format!("{leading}{}{trailing}{separator}", entry.raw);
        tracing::trace!(?entry, "parsed entry");
        self.result.push(entry);
    }

    /// option_flag: OptionFlagWord WS? phrase?
    fn parse_flag(&mut self, flag: Token<'input>) -> ParsedEntry {
        if flag.kind == FlagWord {
            return ParsedEntry::flag(flag.text, flag.text);
        }

        let mut raw = flag.text.to_string();
        raw.push_str(self.consume_text(Whitespace));
        let mut value = String::new();
        if self.lookahead(&[Quote, OpenQuote, EndQuote, Word]) {
            let phrase = self.parse_phrase();
            value = phrase.value().to_string();
            raw.push_str(&phrase.raw);
        }
        ParsedEntry::option_flag(flag.text, value, raw)
    }

    /// phrase: quoted | EndQuote | Word, or in separated mode Word (WS Word)*
    fn parse_phrase(&mut self) -> ParsedEntry {
        if self.separated {
            return self.parse_separated_phrase();
        }

        if let Some(open) = self.consume(&[Quote]) {
            return self.parse_quoted(open, Quote);
        }
        if let Some(open) = self.consume(&[OpenQuote]) {
            return self.parse_quoted(open, EndQuote);
        }
        if let Some(stray) = self.consume(&[EndQuote]) {
            return ParsedEntry::phrase(stray.text, stray.text);
        }
        match self.consume(&[Word]) {
            Some(word) => ParsedEntry::phrase(word.text, word.text),
            None => ParsedEntry::phrase("", ""),
        }
    }

    fn parse_quoted(&mut self, open: Token<'input>, closer: TokenKind) -> ParsedEntry {
        let mut value = String::new();
        let mut raw = open.text.to_string();
        while let Some(token) = self.consume(&[Word, Whitespace]) {
            value.push_str(token.text);
            raw.push_str(token.text);
        }
        // A missing closer is fine: the phrase runs to wherever the words stop.
        if let Some(end) = self.consume(&[closer]) {
            raw.push_str(end.text);
        }
        ParsedEntry::phrase(value, raw)
    }

    fn parse_separated_phrase(&mut self) -> ParsedEntry {
        let Some(first) = self.consume(&[Word]) else {
            return ParsedEntry::phrase("", "");
        };
        let mut value = first.text.to_string();
        while self.lookahead(&[Whitespace]) && self.lookahead_n(1, &[Word]) {
            value.push_str(self.consume_text(Whitespace));
            value.push_str(self.consume_text(Word));
        }
        ParsedEntry::phrase(value.clone(), value)
    }
}
