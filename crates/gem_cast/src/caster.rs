//! Casters - pluggable literal recognizers
//!
//! Each caster recognizes one literal syntax by looking at the trimmed text
//! and converts it, recursing through the engine for nested elements.

use crate::engine::CastEngine;
use crate::error::{CastError, Result};
use crate::lexer::unescape;
use crate::value::{bit, insert_pair, Value, Vector, VectorKind};

/// A strategy that recognizes and converts one literal syntax
pub trait Caster: Send + Sync {
    /// Name used in log output
    fn name(&self) -> &str;

    /// Returns true if this caster handles the (trimmed) text
    fn accepted(&self, text: &str) -> bool;

    /// Convert accepted text
    fn convert(&self, text: &str, engine: &CastEngine) -> Result<Value>;
}

/// Case-insensitive keyword mapped to a constant
pub struct KeywordCaster {
    keyword: &'static str,
    value: Value,
}

impl KeywordCaster {
    pub fn new(keyword: &'static str, value: Value) -> Self {
        Self { keyword, value }
    }
}

impl Caster for KeywordCaster {
    fn name(&self) -> &str {
        self.keyword
    }

    fn accepted(&self, text: &str) -> bool {
        text.eq_ignore_ascii_case(self.keyword)
    }

    fn convert(&self, _text: &str, _engine: &CastEngine) -> Result<Value> {
        Ok(self.value.clone())
    }
}

/// Bracketed sequence kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    List,
    Tuple,
}

/// `[a, b]` or `(a, b)` with recursively cast elements
pub struct SequenceCaster {
    kind: SequenceKind,
    left: char,
    right: char,
}

impl SequenceCaster {
    pub fn list() -> Self {
        Self {
            kind: SequenceKind::List,
            left: '[',
            right: ']',
        }
    }

    pub fn tuple() -> Self {
        Self {
            kind: SequenceKind::Tuple,
            left: '(',
            right: ')',
        }
    }
}

impl Caster for SequenceCaster {
    fn name(&self) -> &str {
        match self.kind {
            SequenceKind::List => "list",
            SequenceKind::Tuple => "tuple",
        }
    }

    fn accepted(&self, text: &str) -> bool {
        text.len() >= 2 && text.starts_with(self.left) && text.ends_with(self.right)
    }

    fn convert(&self, text: &str, engine: &CastEngine) -> Result<Value> {
        let items = split_top_level(inner(text, 1), ',')
            .into_iter()
            .map(|item| engine.cast(item))
            .collect();

        Ok(match self.kind {
            SequenceKind::List => Value::List(items),
            SequenceKind::Tuple => Value::Tuple(items),
        })
    }
}

/// `Vec(x, y[, z[, w]])` or `Point(..)`, arity picked by argument count
pub struct VectorCaster {
    kind: VectorKind,
}

impl VectorCaster {
    pub fn new(kind: VectorKind) -> Self {
        Self { kind }
    }
}

impl Caster for VectorCaster {
    fn name(&self) -> &str {
        self.kind.keyword()
    }

    fn accepted(&self, text: &str) -> bool {
        is_constructor(text, self.kind.keyword())
    }

    fn convert(&self, text: &str, _engine: &CastEngine) -> Result<Value> {
        let components = inner(text, self.kind.keyword().len() + 1)
            .split(',')
            .map(|n| {
                n.trim()
                    .parse::<f64>()
                    .map_err(|_| CastError::Value(format!("could not convert '{}' to float", n.trim())))
            })
            .collect::<Result<Vec<f64>>>()?;

        Vector::new(self.kind, components).map(Value::Vector)
    }
}

/// `Bit(n1, n2, ...)`, OR of the named bits
pub struct BitCaster;

impl Caster for BitCaster {
    fn name(&self) -> &str {
        "Bit"
    }

    fn accepted(&self, text: &str) -> bool {
        is_constructor(text, "Bit")
    }

    fn convert(&self, text: &str, _engine: &CastEngine) -> Result<Value> {
        let mut mask = 0u32;
        for n in inner(text, 4).split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let index = n
                .parse::<i64>()
                .map_err(|_| CastError::Value(format!("invalid bit index '{}'", n)))?;
            mask |= bit(index)?;
        }
        Ok(Value::BitMask(mask))
    }
}

/// `'text'` or `"text"`, with the same escapes as the lexer
pub struct QuotedStringCaster;

impl Caster for QuotedStringCaster {
    fn name(&self) -> &str {
        "quoted string"
    }

    fn accepted(&self, text: &str) -> bool {
        text.len() >= 2
            && (text.starts_with('\'') && text.ends_with('\'')
                || text.starts_with('"') && text.ends_with('"'))
    }

    fn convert(&self, text: &str, _engine: &CastEngine) -> Result<Value> {
        Ok(Value::String(unescape(inner(text, 1))))
    }
}

/// `{key: value, ...}` with recursively cast keys and values
pub struct DictCaster;

impl Caster for DictCaster {
    fn name(&self) -> &str {
        "dict"
    }

    fn accepted(&self, text: &str) -> bool {
        text.len() >= 2 && text.starts_with('{') && text.ends_with('}')
    }

    fn convert(&self, text: &str, engine: &CastEngine) -> Result<Value> {
        let mut pairs = Vec::new();
        for entry in split_top_level(inner(text, 1), ',') {
            let (key, value) = split_entry(entry)
                .ok_or_else(|| CastError::Value(format!("malformed dictionary entry '{}'", entry)))?;
            insert_pair(&mut pairs, engine.cast(key), engine.cast(value));
        }
        Ok(Value::Dict(pairs))
    }
}

/// Register the built-in casters. Order is significant: the first caster
/// that accepts a value converts it.
pub fn register_default_casters(engine: &mut CastEngine) {
    let casters: [Box<dyn Caster>; 10] = [
        Box::new(KeywordCaster::new("false", Value::Bool(false))),
        Box::new(KeywordCaster::new("true", Value::Bool(true))),
        Box::new(SequenceCaster::list()),
        Box::new(KeywordCaster::new("none", Value::None)),
        Box::new(BitCaster),
        Box::new(VectorCaster::new(VectorKind::Point)),
        Box::new(VectorCaster::new(VectorKind::Vec)),
        Box::new(QuotedStringCaster),
        Box::new(SequenceCaster::tuple()),
        Box::new(DictCaster),
    ];

    for caster in casters {
        engine.register_boxed(caster);
    }
}

/// `Name(` prefix and `)` suffix
fn is_constructor(text: &str, keyword: &str) -> bool {
    text.strip_prefix(keyword)
        .map_or(false, |rest| rest.starts_with('(') && text.ends_with(')'))
}

/// Text between a prefix of `open` bytes and the final closing byte
fn inner(text: &str, open: usize) -> &str {
    &text[open..text.len() - 1]
}

/// Byte offsets of `separator` outside brackets and quotes
fn top_level_separators(text: &str, separator: char) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '[' | '(' | '{') => depth += 1,
            (None, ']' | ')' | '}') => depth = depth.saturating_sub(1),
            (None, c) if c == separator && depth == 0 => offsets.push(i),
            _ => {}
        }
    }
    offsets
}

/// Split on top-level `separator`. Items are trimmed; a blank final item is
/// dropped so `(1,)` has one element.
fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut items = Vec::new();
    let mut start = 0;

    for offset in top_level_separators(text, separator) {
        items.push(text[start..offset].trim());
        start = offset + separator.len_utf8();
    }

    let last = text[start..].trim();
    if !last.is_empty() {
        items.push(last);
    }
    items
}

/// Split a dict entry at its first top-level colon
fn split_entry(entry: &str) -> Option<(&str, &str)> {
    let offset = *top_level_separators(entry, ':').first()?;
    let key = entry[..offset].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, entry[offset + 1..].trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_respects_nesting_and_quotes() {
        assert_eq!(
            split_top_level("(1, 2), [3, 4], 'a, b', {5: 6}", ','),
            vec!["(1, 2)", "[3, 4]", "'a, b'", "{5: 6}"]
        );
    }

    #[test]
    fn test_split_skips_escaped_quotes() {
        assert_eq!(
            split_top_level(r"'it\'s, ok', 'tail\\', 2", ','),
            vec![r"'it\'s, ok'", r"'tail\\'", "2"]
        );
    }

    #[test]
    fn test_quoted_string_unescapes() {
        let engine = CastEngine::new();
        let caster = QuotedStringCaster;
        assert_eq!(
            caster.convert(r#"'it\'s \"x\"'"#, &engine).unwrap(),
            Value::from("it's \"x\"")
        );
        assert_eq!(caster.convert(r"'a\\n'", &engine).unwrap(), Value::from("a\\n"));
        assert_eq!(caster.convert(r"'C:\dir'", &engine).unwrap(), Value::from("C:\\dir"));
    }

    #[test]
    fn test_split_keeps_inner_blanks() {
        assert_eq!(split_top_level("1,,2", ','), vec!["1", "", "2"]);
        assert_eq!(split_top_level("1,", ','), vec!["1"]);
        assert!(split_top_level("  ", ',').is_empty());
    }

    #[test]
    fn test_split_entry() {
        assert_eq!(split_entry("'a': Vec(1, 2)"), Some(("'a'", "Vec(1, 2)")));
        assert_eq!(split_entry("'a:b': 1"), Some(("'a:b'", "1")));
        assert_eq!(split_entry("novalue"), None);
        assert_eq!(split_entry(": 1"), None);
    }

    #[test]
    fn test_is_constructor() {
        assert!(is_constructor("Vec(1, 2)", "Vec"));
        assert!(!is_constructor("Vector(1, 2)", "Vec"));
        assert!(!is_constructor("vec(1, 2)", "Vec"));
        assert!(!is_constructor("Vec", "Vec"));
    }

    #[test]
    fn test_keyword_case_insensitive() {
        let caster = KeywordCaster::new("none", Value::None);
        assert!(caster.accepted("NONE"));
        assert!(!caster.accepted("nones"));
    }

    #[test]
    fn test_quoted_single_char_not_accepted() {
        assert!(!QuotedStringCaster.accepted("'"));
        assert!(QuotedStringCaster.accepted("''"));
        assert!(!QuotedStringCaster.accepted("'a\""));
    }
}
