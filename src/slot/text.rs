//! Slot text codec: render a slot structure as source text and parse it back.
//!
//! Rendering rules:
//! - code atoms are written trimmed
//! - `.` is written tight, `,` is followed by a space
//! - an operator with an empty left operand (unary use) hugs its right operand;
//!   keyword operators still keep one space on their right
//! - every other operator is surrounded by single spaces
//! - no trailing space is written before an empty final operand
//!
//! Parsing tokenises operators (longest match first, keyword operators only on
//! word boundaries), brackets and quotes, and produces a normalised structure.
//! For any structure produced by [`parse`], `parse(render(s)) == s`.

use std::fmt;

use super::{BracketKind, FieldSlot, OperatorSlot, QuoteKind, SlotStructure};

/// Word operators, recognised only on identifier boundaries
pub const KEYWORD_OPERATORS: &[&str] = &["and", "or", "not", "in", "is"];

/// Symbolic operators, longest first so prefixes never shadow longer matches
pub const SYMBOL_OPERATORS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "**", "//", "==", "!=", "<=", ">=", "+=", "-=", "*=", "/=", "%=",
    "&=", "|=", "^=", "@=", "->", "<<", ">>", ":=", "+", "-", "*", "/", "%", "@", "&", "|", "^",
    "~", "<", ">", "=", ".", ",", ":",
];

/// Why a piece of slot text could not be turned into a structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotParseError {
    UnterminatedString { offset: usize },
    UnexpectedClosingBracket { offset: usize },
    UnclosedBracket { offset: usize },
}

impl fmt::Display for SlotParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotParseError::UnterminatedString { offset } => {
                write!(f, "unterminated string starting at byte {}", offset)
            }
            SlotParseError::UnexpectedClosingBracket { offset } => {
                write!(f, "unexpected closing bracket at byte {}", offset)
            }
            SlotParseError::UnclosedBracket { offset } => {
                write!(f, "bracket opened at byte {} is never closed", offset)
            }
        }
    }
}

impl std::error::Error for SlotParseError {}

/// Render a structure as source text
pub fn render(structure: &SlotStructure) -> String {
    let mut out = String::new();
    render_into(structure, &mut out);
    out
}

/// Pending render work: emit a field, or close a bracket and carry on after it
enum RenderStep<'a> {
    Field(&'a SlotStructure, usize),
    Close(&'a SlotStructure, usize, BracketKind),
}

fn render_into(structure: &SlotStructure, out: &mut String) {
    let mut stack = vec![RenderStep::Field(structure, 0)];
    while let Some(step) = stack.pop() {
        match step {
            RenderStep::Field(s, i) => {
                let Some(field) = s.fields.get(i) else {
                    continue;
                };
                match field {
                    FieldSlot::Code { code } => out.push_str(code.trim()),
                    FieldSlot::Str { quote, content } => {
                        out.push_str(quote.as_str());
                        out.push_str(content);
                        out.push_str(quote.as_str());
                    }
                    FieldSlot::Bracketed { bracket, inner } => {
                        out.push_str(bracket.opening());
                        stack.push(RenderStep::Close(s, i, *bracket));
                        stack.push(RenderStep::Field(inner, 0));
                        continue;
                    }
                }
                render_operator_after(s, i, out);
                stack.push(RenderStep::Field(s, i + 1));
            }
            RenderStep::Close(s, i, bracket) => {
                out.push_str(bracket.closing());
                render_operator_after(s, i, out);
                stack.push(RenderStep::Field(s, i + 1));
            }
        }
    }
}

/// Operator following field `i`, if any
fn render_operator_after(structure: &SlotStructure, i: usize, out: &mut String) {
    let Some(op) = structure.operators.get(i) else {
        return;
    };
    let left_empty = !structure.fields[i].is_populated();
    let last = structure.fields.len().saturating_sub(1);
    let trailing = i + 1 == last
        && structure
            .fields
            .get(i + 1)
            .is_some_and(|f| !f.is_populated());
    render_operator(&op.code, left_empty, trailing, out);
}

fn render_operator(op: &str, left_empty: bool, trailing: bool, out: &mut String) {
    match op {
        "" => {}
        "." => out.push('.'),
        "," => {
            out.push(',');
            if !trailing {
                out.push(' ');
            }
        }
        _ => {
            let keyword = is_keyword_operator(op);
            if left_empty {
                out.push_str(op);
                if keyword && !trailing {
                    out.push(' ');
                }
            } else {
                out.push(' ');
                out.push_str(op);
                if !trailing {
                    out.push(' ');
                }
            }
        }
    }
}

fn is_keyword_operator(op: &str) -> bool {
    KEYWORD_OPERATORS.contains(&op)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Render a raw-text label (comments): the single code field verbatim
pub fn render_raw(structure: &SlotStructure) -> String {
    structure
        .fields
        .iter()
        .filter_map(FieldSlot::as_code)
        .collect()
}

/// Parse raw-text label content: the whole text becomes one code field
pub fn parse_raw(text: &str) -> SlotStructure {
    SlotStructure::code(text)
}

/// Parse slot text into a normalised structure
pub fn parse(text: &str) -> Result<SlotStructure, SlotParseError> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    parse_chars(text, &chars)
}

/// Parse then re-render: the canonical text form of `text`
pub fn canonical_text(text: &str) -> Result<String, SlotParseError> {
    parse(text).map(|s| render(&s))
}

/// Canonical form of an arbitrary structure, as it would be after a save and
/// reload. Fails when a code atom holds a stray bracket or quote.
pub fn canonicalize(structure: &SlotStructure) -> Result<SlotStructure, SlotParseError> {
    parse(&render(structure))
}

enum Item {
    Field(FieldSlot),
    Operator(&'static str),
}

/// One bracket nesting level being parsed
#[derive(Default)]
struct Level {
    items: Vec<Item>,
    code: String,
    /// Bracket that closes this level and the byte offset it was opened at
    opened: Option<(BracketKind, usize)>,
}

fn parse_chars(text: &str, chars: &[(usize, char)]) -> Result<SlotStructure, SlotParseError> {
    let mut stack = vec![Level::default()];
    let mut pos = 0;

    while pos < chars.len() {
        let (offset, c) = chars[pos];
        let Some(level) = stack.last_mut() else {
            break;
        };

        if let Some(quote) = QuoteKind::from_char(c) {
            flush_code(&mut level.code, &mut level.items);
            pos += 1;
            let mut content = String::new();
            loop {
                let Some(&(_, ch)) = chars.get(pos) else {
                    return Err(SlotParseError::UnterminatedString { offset });
                };
                if ch == '\\' {
                    content.push(ch);
                    if let Some(&(_, escaped)) = chars.get(pos + 1) {
                        content.push(escaped);
                    }
                    pos += 2;
                    continue;
                }
                pos += 1;
                if ch == c {
                    break;
                }
                content.push(ch);
            }
            level.items.push(Item::Field(FieldSlot::string(quote, content)));
        } else if let Some(bracket) = BracketKind::from_opening(c) {
            flush_code(&mut level.code, &mut level.items);
            pos += 1;
            stack.push(Level {
                opened: Some((bracket, offset)),
                ..Level::default()
            });
        } else if let Some(bracket) = BracketKind::from_closing(c) {
            if !matches!(level.opened, Some((expected, _)) if expected == bracket) {
                return Err(SlotParseError::UnexpectedClosingBracket { offset });
            }
            let Some(mut closed) = stack.pop() else {
                break;
            };
            flush_code(&mut closed.code, &mut closed.items);
            pos += 1;
            let inner = build(closed.items);
            match stack.last_mut() {
                Some(outer) => outer
                    .items
                    .push(Item::Field(FieldSlot::bracketed(bracket, inner))),
                None => return Err(SlotParseError::UnexpectedClosingBracket { offset }),
            }
        } else if let Some(op) = match_operator(text, offset) {
            flush_code(&mut level.code, &mut level.items);
            level.items.push(Item::Operator(op));
            pos += op.chars().count();
        } else {
            level.code.push(c);
            pos += 1;
        }
    }

    let Some(mut top) = stack.pop() else {
        return Ok(SlotStructure::empty());
    };
    if let Some((_, offset)) = top.opened {
        return Err(SlotParseError::UnclosedBracket { offset });
    }
    flush_code(&mut top.code, &mut top.items);
    Ok(build(top.items))
}

fn match_operator(text: &str, offset: usize) -> Option<&'static str> {
    let rest = &text[offset..];
    if let Some(op) = SYMBOL_OPERATORS.iter().find(|op| rest.starts_with(**op)) {
        return Some(op);
    }

    let starts_word = text[..offset]
        .chars()
        .next_back()
        .map_or(true, |prev| !is_ident_char(prev));
    if !starts_word {
        return None;
    }
    KEYWORD_OPERATORS.iter().copied().find(|kw| {
        rest.starts_with(kw)
            && rest[kw.len()..]
                .chars()
                .next()
                .map_or(true, |next| !is_ident_char(next))
    })
}

fn flush_code(code: &mut String, items: &mut Vec<Item>) {
    let trimmed = code.trim();
    if !trimmed.is_empty() {
        items.push(Item::Field(FieldSlot::code(trimmed)));
    }
    code.clear();
}

fn build(items: Vec<Item>) -> SlotStructure {
    let mut fields = Vec::new();
    let mut operators = Vec::new();
    let mut expect_field = true;

    for item in items {
        match item {
            Item::Field(field) => {
                if !expect_field {
                    operators.push(OperatorSlot::empty());
                }
                fields.push(field);
                expect_field = false;
            }
            Item::Operator(op) => {
                if expect_field {
                    fields.push(FieldSlot::code(""));
                }
                operators.push(OperatorSlot::new(op));
                expect_field = true;
            }
        }
    }
    if expect_field {
        fields.push(FieldSlot::code(""));
    }

    let mut structure = SlotStructure { fields, operators };
    structure.normalize_level();
    structure
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(text: &str) -> String {
        render(&parse(text).expect("parses"))
    }

    #[test]
    fn test_parse_binary_expression() {
        let s = parse("12+34").unwrap();
        assert_eq!(
            s,
            SlotStructure::from_parts(
                vec![FieldSlot::code("12"), FieldSlot::code("34")],
                vec![OperatorSlot::new("+")]
            )
            .unwrap()
        );
        assert_eq!(render(&s), "12 + 34");
    }

    #[test]
    fn test_longest_operator_wins() {
        let s = parse("a**b").unwrap();
        assert_eq!(s.operators, vec![OperatorSlot::new("**")]);
        let s = parse("a <= b").unwrap();
        assert_eq!(s.operators, vec![OperatorSlot::new("<=")]);
    }

    #[test]
    fn test_keyword_operators_need_word_boundaries() {
        let s = parse("band or candy").unwrap();
        assert_eq!(s.operators, vec![OperatorSlot::new("or")]);
        assert_eq!(s.fields[0], FieldSlot::code("band"));
        assert_eq!(s.fields[1], FieldSlot::code("candy"));
    }

    #[test]
    fn test_unary_operators_render_tight() {
        assert_eq!(roundtrip("a * - b"), "a * -b");
        assert_eq!(roundtrip("not   x"), "not x");
        assert_eq!(roundtrip("a not in b"), "a not in b");
    }

    #[test]
    fn test_function_call_with_string() {
        let s = parse("print(\"Hello, world\", x)").unwrap();
        assert!(s.is_normalized());
        assert_eq!(s.fields.len(), 3);
        assert_eq!(render(&s), "print(\"Hello, world\", x)");
    }

    #[test]
    fn test_escaped_quote_stays_inside_string() {
        let s = parse(r#"'it\'s'"#).unwrap();
        assert_eq!(s.fields[1], FieldSlot::string(QuoteKind::Single, r"it\'s"));
        assert_eq!(render(&s), r#"'it\'s'"#);
    }

    #[test]
    fn test_nested_brackets() {
        let s = parse("d[k](1, [2])").unwrap();
        assert_eq!(render(&s), "d[k](1, [2])");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse("\"abc"),
            Err(SlotParseError::UnterminatedString { offset: 0 })
        );
        assert_eq!(
            parse("a)"),
            Err(SlotParseError::UnexpectedClosingBracket { offset: 1 })
        );
        assert_eq!(
            parse("f(a]"),
            Err(SlotParseError::UnexpectedClosingBracket { offset: 3 })
        );
        assert_eq!(parse("f(a"), Err(SlotParseError::UnclosedBracket { offset: 1 }));
    }

    #[test]
    fn test_trailing_operator_has_no_trailing_space() {
        assert_eq!(roundtrip("x +"), "x +");
        assert_eq!(roundtrip("x, "), "x,");
        assert_eq!(roundtrip("x and"), "x and");
    }

    #[test]
    fn test_render_is_stable_after_one_pass() {
        for text in [
            "a+b*c",
            "f (x)",
            "  spaced   out  ",
            "obj.method(1.5, key=\"v\")",
            "-(a)",
            "[]",
            "x if y else z",
            "a<<=b>>c",
            "lambda: 0",
        ] {
            let once = roundtrip(text);
            assert_eq!(roundtrip(&once), once, "unstable for {:?}", text);
            assert_eq!(parse(&once).unwrap(), parse(text).unwrap());
        }
    }

    #[test]
    fn test_canonicalize_splits_code_atoms() {
        let s = SlotStructure::code("a+b");
        let c = canonicalize(&s).unwrap();
        assert_eq!(c.fields.len(), 2);
        assert!(canonicalize(&SlotStructure::code("f(")).is_err());
    }

    #[test]
    fn test_bracket_errors_report_offsets() {
        assert_eq!(
            parse("f(a, [b"),
            Err(SlotParseError::UnclosedBracket { offset: 5 })
        );
        assert_eq!(
            parse("a)"),
            Err(SlotParseError::UnexpectedClosingBracket { offset: 1 })
        );
        assert_eq!(
            parse("(a]"),
            Err(SlotParseError::UnexpectedClosingBracket { offset: 2 })
        );
    }

    #[test]
    fn test_deep_nesting_parses_and_renders() {
        let depth = 3_000;
        let text = format!("{}x{}", "(".repeat(depth), ")".repeat(depth));
        let s = parse(&text).unwrap();
        assert!(s.is_normalized());
        assert_eq!(render(&s), text);
    }

    #[test]
    fn test_raw_text_is_verbatim() {
        let s = parse_raw("  keep (this) as \"is");
        assert_eq!(render_raw(&s), "  keep (this) as \"is");
    }
}
