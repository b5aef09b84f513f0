use serde::Serialize;

/// What a parsed entry stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntryKind {
    /// A positional argument.
    Phrase,
    /// A bare flag word.
    Flag,
    /// A flag word followed by a value.
    OptionFlag,
}

/// A single parsed argument.
///
/// `raw` is the exact input slice the entry was built from, including the
/// whitespace before and after it and a trailing separator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedEntry {
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub raw: String,
}

impl ParsedEntry {
    pub fn phrase(value: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Phrase,
            key: None,
            value: Some(value.into()),
            raw: raw.into(),
        }
    }

    pub fn flag(key: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Flag,
            key: Some(key.into()),
            value: None,
            raw: raw.into(),
        }
    }

    pub fn option_flag(
        key: impl Into<String>,
        value: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        Self {
            kind: EntryKind::OptionFlag,
            key: Some(key.into()),
            value: Some(value.into()),
            raw: raw.into(),
        }
    }

    /// The parsed value, or `""` for bare flags.
    pub fn value(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }

    /// The flag word, or `""` for phrases.
    pub fn key(&self) -> &str {
        self.key.as_deref().unwrap_or("")
    }

    pub fn is_phrase(&self) -> bool {
        self.kind == EntryKind::Phrase
    }

    /// Whether this is a flag or option flag entry whose key matches one of `names`.
    pub fn has_key(&self, names: &[String]) -> bool {
        let Some(key) = self.key.as_deref() else {
            return false;
        };
        let key = key.to_lowercase();
        names.iter().any(|name| name.to_lowercase() == key)
    }
}

/// Result of parsing one command's content.
///
/// `all` keeps input order; the other lists are views of the same entries
/// split by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    pub all: Vec<ParsedEntry>,
    pub phrases: Vec<ParsedEntry>,
    pub flags: Vec<ParsedEntry>,
    pub option_flags: Vec<ParsedEntry>,
}

impl ParseResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, entry: ParsedEntry) {
        match entry.kind {
            EntryKind::Phrase => self.phrases.push(entry.clone()),
            EntryKind::Flag => self.flags.push(entry.clone()),
            EntryKind::OptionFlag => self.option_flags.push(entry.clone()),
        }
        self.all.push(entry);
    }

    /// Value of the phrase at `index`, or `""` past the end.
    pub fn phrase_value(&self, index: usize) -> &str {
        self.phrases.get(index).map_or("", ParsedEntry::value)
    }

    /// Concatenated raw text of `all[index..]`, i.e. the input from that entry on.
    pub fn raw_from(&self, index: usize) -> String {
        join_raw(self.all.get(index..).unwrap_or_default())
    }

    /// Concatenated raw text of the input, rebuilt from every entry.
    pub fn raw(&self) -> String {
        join_raw(&self.all)
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

/// Join the raw text of a run of entries.
pub fn join_raw(entries: &[ParsedEntry]) -> String {
    entries.iter().map(|entry| entry.raw.as_str()).collect()
}

/// Clamp `start..start + limit` to `len`, never panicking on overflow.
pub fn window(len: usize, start: usize, limit: usize) -> std::ops::Range<usize> {
    let start = start.min(len);
    let end = start.saturating_add(limit).min(len);
    start..end
}
