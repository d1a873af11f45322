//! Slot structures: the editable expression content of one frame label.
//!
//! A label's content is a [`SlotStructure`]: fields interleaved with operators,
//! always with exactly one more field than operators. A field is either a code
//! atom, a quoted string, or a bracketed nested structure.
//!
//! # Normal form
//!
//! Bracketed and quoted fields are always padded by code fields so the first
//! and last positions of a structure hold code, and two non-code fields are
//! never joined by an empty operator. Adjacent code fields joined by an empty
//! operator are merged. [`SlotStructure::normalize`] restores this form after
//! arbitrary construction; the text parser produces it directly.

pub mod address;
pub mod text;

use serde::{Deserialize, Serialize};

pub use address::{
    flatten, for_each_unit, FlatSlotUnit, FlatUnitKind, ResolvedSlot, SlotId, UnitClass,
};

/// Matched bracket pairs a bracketed field can use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BracketKind {
    Round,
    Square,
    Curly,
}

impl BracketKind {
    pub const ALL: [BracketKind; 3] = [BracketKind::Round, BracketKind::Square, BracketKind::Curly];

    pub const fn opening(self) -> &'static str {
        match self {
            BracketKind::Round => "(",
            BracketKind::Square => "[",
            BracketKind::Curly => "{",
        }
    }

    pub const fn closing(self) -> &'static str {
        match self {
            BracketKind::Round => ")",
            BracketKind::Square => "]",
            BracketKind::Curly => "}",
        }
    }

    pub fn from_opening(c: char) -> Option<Self> {
        match c {
            '(' => Some(BracketKind::Round),
            '[' => Some(BracketKind::Square),
            '{' => Some(BracketKind::Curly),
            _ => None,
        }
    }

    pub fn from_closing(c: char) -> Option<Self> {
        match c {
            ')' => Some(BracketKind::Round),
            ']' => Some(BracketKind::Square),
            '}' => Some(BracketKind::Curly),
            _ => None,
        }
    }
}

/// Quote character delimiting a string field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteKind {
    Double,
    Single,
}

impl QuoteKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            QuoteKind::Double => "\"",
            QuoteKind::Single => "'",
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '"' => Some(QuoteKind::Double),
            '\'' => Some(QuoteKind::Single),
            _ => None,
        }
    }
}

/// An operator between two fields. Empty code means "no operator here".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorSlot {
    pub code: String,
}

impl OperatorSlot {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }
}

/// One operand position of a slot structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldSlot {
    /// Plain code atom (identifier, literal, keyword argument name...)
    Code { code: String },
    /// Quoted string literal; the content is opaque text
    Str { quote: QuoteKind, content: String },
    /// Bracketed nested structure
    Bracketed {
        bracket: BracketKind,
        inner: SlotStructure,
    },
}

impl FieldSlot {
    pub fn code(code: impl Into<String>) -> Self {
        FieldSlot::Code { code: code.into() }
    }

    pub fn string(quote: QuoteKind, content: impl Into<String>) -> Self {
        FieldSlot::Str {
            quote,
            content: content.into(),
        }
    }

    pub fn bracketed(bracket: BracketKind, inner: SlotStructure) -> Self {
        FieldSlot::Bracketed { bracket, inner }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, FieldSlot::Code { .. })
    }

    /// Text of a code atom, `None` for strings and brackets
    pub fn as_code(&self) -> Option<&str> {
        match self {
            FieldSlot::Code { code } => Some(code),
            _ => None,
        }
    }

    /// A field is populated when it carries any user content.
    /// Strings and brackets always count, even when their interior is empty.
    pub fn is_populated(&self) -> bool {
        match self {
            FieldSlot::Code { code } => !code.trim().is_empty(),
            FieldSlot::Str { .. } | FieldSlot::Bracketed { .. } => true,
        }
    }
}

/// The nested operator/field tree of one label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotStructure {
    pub fields: Vec<FieldSlot>,
    pub operators: Vec<OperatorSlot>,
}

impl Default for SlotStructure {
    fn default() -> Self {
        Self::empty()
    }
}

impl SlotStructure {
    /// A structure holding a single empty code field
    pub fn empty() -> Self {
        Self::code("")
    }

    /// A structure holding a single code field
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldSlot::code(code)],
            operators: Vec::new(),
        }
    }

    /// Build from parts, rejecting a field/operator count mismatch at any level
    pub fn from_parts(fields: Vec<FieldSlot>, operators: Vec<OperatorSlot>) -> Option<Self> {
        let structure = Self { fields, operators };
        structure.is_well_formed().then_some(structure)
    }

    /// Append an operator followed by a field
    pub fn push(&mut self, operator: impl Into<String>, field: FieldSlot) -> &mut Self {
        self.operators.push(OperatorSlot::new(operator));
        self.fields.push(field);
        self
    }

    /// True when the structure holds no content at all
    pub fn is_empty(&self) -> bool {
        self.operators.iter().all(OperatorSlot::is_empty)
            && self.fields.iter().all(|f| !f.is_populated())
    }

    /// Check `len(fields) == len(operators) + 1` at every nesting level
    pub fn is_well_formed(&self) -> bool {
        let mut stack = vec![self];
        while let Some(s) = stack.pop() {
            if s.fields.len() != s.operators.len() + 1 {
                return false;
            }
            for field in &s.fields {
                if let FieldSlot::Bracketed { inner, .. } = field {
                    stack.push(inner);
                }
            }
        }
        true
    }

    /// Check the padding rules described in the module docs, at every level
    pub fn is_normalized(&self) -> bool {
        if !self.is_well_formed() {
            return false;
        }
        let mut stack = vec![self];
        while let Some(s) = stack.pop() {
            let (Some(first), Some(last)) = (s.fields.first(), s.fields.last()) else {
                return false;
            };
            if !first.is_code() || !last.is_code() {
                return false;
            }
            for (i, op) in s.operators.iter().enumerate() {
                let (left, right) = (&s.fields[i], &s.fields[i + 1]);
                if op.is_empty() && left.is_code() == right.is_code() {
                    return false;
                }
            }
            for field in &s.fields {
                if let FieldSlot::Bracketed { inner, .. } = field {
                    stack.push(inner);
                }
            }
        }
        true
    }

    /// Rewrite into normal form. Malformed input (count mismatch) is repaired
    /// by dropping surplus operators or padding missing fields with empty code.
    pub fn normalize(&mut self) {
        let mut stack: Vec<&mut SlotStructure> = vec![self];
        while let Some(structure) = stack.pop() {
            structure.normalize_level();
            for field in structure.fields.iter_mut() {
                if let FieldSlot::Bracketed { inner, .. } = field {
                    stack.push(inner);
                }
            }
        }
    }

    /// Normalise this level only; bracketed fields are left as they are
    pub(crate) fn normalize_level(&mut self) {
        let fields = std::mem::take(&mut self.fields);
        let mut operators = std::mem::take(&mut self.operators).into_iter();

        let mut out_fields: Vec<FieldSlot> = Vec::with_capacity(fields.len() + 2);
        let mut out_ops: Vec<OperatorSlot> = Vec::with_capacity(fields.len() + 1);

        for (i, field) in fields.into_iter().enumerate() {
            let op = if i == 0 {
                None
            } else {
                Some(operators.next().unwrap_or_default())
            };
            push_normalized(&mut out_fields, &mut out_ops, op, field);
        }

        if out_fields.is_empty() {
            out_fields.push(FieldSlot::code(""));
        }
        if !out_fields.last().is_some_and(FieldSlot::is_code) {
            out_ops.push(OperatorSlot::empty());
            out_fields.push(FieldSlot::code(""));
        }

        self.fields = out_fields;
        self.operators = out_ops;
    }

    /// Normalised copy
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Render as source text (see [`text::render`])
    pub fn to_code(&self) -> String {
        text::render(self)
    }
}

fn push_normalized(
    fields: &mut Vec<FieldSlot>,
    ops: &mut Vec<OperatorSlot>,
    op: Option<OperatorSlot>,
    field: FieldSlot,
) {
    let Some(last_is_code) = fields.last().map(FieldSlot::is_code) else {
        if !field.is_code() {
            fields.push(FieldSlot::code(""));
            ops.push(OperatorSlot::empty());
        }
        fields.push(field);
        return;
    };

    let op = op.unwrap_or_default();
    if op.is_empty() {
        if last_is_code {
            if let FieldSlot::Code { code: right } = &field {
                if let Some(FieldSlot::Code { code: left }) = fields.last_mut() {
                    left.push_str(right);
                }
                return;
            }
        } else if !field.is_code() {
            ops.push(OperatorSlot::empty());
            fields.push(FieldSlot::code(""));
        }
    }
    ops.push(op);
    fields.push(field);
}
