//! Flat addressing of slot structures.
//!
//! A [`SlotId`] holds one zero-based index per nesting level and is written as
//! a comma-separated string (`"1,0,2"`). Fields and the operator that follows
//! them share an index; [`UnitClass`] says which of the two is meant.
//!
//! Flattening walks a structure field-then-operator, left to right, entering
//! bracketed fields depth-first. Quoted fields are opaque. Operators are only
//! emitted when they hold text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{BracketKind, FieldSlot, OperatorSlot, QuoteKind, SlotStructure};

/// Hierarchical address of a field or operator inside a slot structure
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct SlotId(Vec<usize>);

impl SlotId {
    /// The empty prefix (the top level of a label)
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_indices(indices: impl Into<Vec<usize>>) -> Self {
        Self(indices.into())
    }

    /// Parse a comma-separated identifier. Anything not matching
    /// `^\d+(,\d+)*$` yields `None`.
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() {
            return None;
        }
        s.split(',')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    None
                } else {
                    part.parse::<usize>().ok()
                }
            })
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Index at the deepest level
    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    /// Address of the enclosing bracketed field, `None` at top level
    pub fn parent(&self) -> Option<SlotId> {
        if self.0.len() <= 1 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Address one level deeper
    pub fn child(&self, index: usize) -> SlotId {
        let mut indices = Vec::with_capacity(self.0.len() + 1);
        indices.extend_from_slice(&self.0);
        indices.push(index);
        Self(indices)
    }

    /// Same level, different last index
    pub fn with_last(&self, index: usize) -> SlotId {
        let mut indices = self.0.clone();
        match indices.last_mut() {
            Some(last) => *last = index,
            None => indices.push(index),
        }
        Self(indices)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", index)?;
        }
        Ok(())
    }
}

impl FromStr for SlotId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Malformed slot identifier: {:?}", s))
    }
}

impl From<SlotId> for String {
    fn from(id: SlotId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for SlotId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Whether an identifier designates a field or the operator after it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitClass {
    Field,
    Operator,
}

/// Content-kind tag of a flattened unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlatUnitKind {
    Code,
    String,
    Operator,
    OpeningBracket(BracketKind),
    ClosingBracket(BracketKind),
    OpeningQuote(QuoteKind),
    ClosingQuote(QuoteKind),
}

impl FlatUnitKind {
    /// Editable units are the ones a caret can sit in
    pub fn is_editable(self) -> bool {
        matches!(self, FlatUnitKind::Code | FlatUnitKind::String)
    }

    pub fn class(self) -> UnitClass {
        match self {
            FlatUnitKind::Operator => UnitClass::Operator,
            _ => UnitClass::Field,
        }
    }
}

/// One addressable unit produced by flattening
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatSlotUnit<'a> {
    pub id: SlotId,
    pub kind: FlatUnitKind,
    pub text: &'a str,
}

/// A field or operator resolved from an identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedSlot<'a> {
    Field(&'a FieldSlot),
    Operator(&'a OperatorSlot),
}

impl<'a> ResolvedSlot<'a> {
    /// The unit this resolution corresponds to in a flattened sequence.
    /// Bracketed and quoted fields map to their opening marker.
    pub fn kind(&self) -> FlatUnitKind {
        match self {
            ResolvedSlot::Operator(_) => FlatUnitKind::Operator,
            ResolvedSlot::Field(FieldSlot::Code { .. }) => FlatUnitKind::Code,
            ResolvedSlot::Field(FieldSlot::Str { .. }) => FlatUnitKind::String,
            ResolvedSlot::Field(FieldSlot::Bracketed { bracket, .. }) => {
                FlatUnitKind::OpeningBracket(*bracket)
            }
        }
    }

    /// Editable text of the unit; bracketed fields give their opening marker
    pub fn text(&self) -> &'a str {
        match *self {
            ResolvedSlot::Operator(op) => &op.code,
            ResolvedSlot::Field(FieldSlot::Code { code }) => code,
            ResolvedSlot::Field(FieldSlot::Str { content, .. }) => content,
            ResolvedSlot::Field(FieldSlot::Bracketed { bracket, .. }) => bracket.opening(),
        }
    }
}

enum Step<'a> {
    Field {
        structure: &'a SlotStructure,
        prefix: SlotId,
        index: usize,
    },
    Operator {
        structure: &'a SlotStructure,
        prefix: SlotId,
        index: usize,
    },
    Closing {
        bracket: BracketKind,
        id: SlotId,
    },
}

/// Stream every addressable unit of `structure` to `visit`, without building
/// an intermediate collection. `prefix` is prepended to every identifier.
pub fn for_each_unit<'a, F>(structure: &'a SlotStructure, prefix: &SlotId, mut visit: F)
where
    F: FnMut(FlatSlotUnit<'a>),
{
    let mut stack = vec![Step::Field {
        structure,
        prefix: prefix.clone(),
        index: 0,
    }];

    while let Some(step) = stack.pop() {
        match step {
            Step::Field {
                structure,
                prefix,
                index,
            } => {
                let Some(field) = structure.fields.get(index) else {
                    continue;
                };
                let id = prefix.child(index);
                match field {
                    FieldSlot::Code { code } => {
                        visit(FlatSlotUnit {
                            id,
                            kind: FlatUnitKind::Code,
                            text: code,
                        });
                        stack.push(Step::Operator {
                            structure,
                            prefix,
                            index,
                        });
                    }
                    FieldSlot::Str { quote, content } => {
                        visit(FlatSlotUnit {
                            id: id.clone(),
                            kind: FlatUnitKind::OpeningQuote(*quote),
                            text: quote.as_str(),
                        });
                        visit(FlatSlotUnit {
                            id: id.clone(),
                            kind: FlatUnitKind::String,
                            text: content,
                        });
                        visit(FlatSlotUnit {
                            id,
                            kind: FlatUnitKind::ClosingQuote(*quote),
                            text: quote.as_str(),
                        });
                        stack.push(Step::Operator {
                            structure,
                            prefix,
                            index,
                        });
                    }
                    FieldSlot::Bracketed { bracket, inner } => {
                        visit(FlatSlotUnit {
                            id: id.clone(),
                            kind: FlatUnitKind::OpeningBracket(*bracket),
                            text: bracket.opening(),
                        });
                        stack.push(Step::Operator {
                            structure,
                            prefix,
                            index,
                        });
                        stack.push(Step::Closing {
                            bracket: *bracket,
                            id: id.clone(),
                        });
                        stack.push(Step::Field {
                            structure: inner,
                            prefix: id,
                            index: 0,
                        });
                    }
                }
            }
            Step::Operator {
                structure,
                prefix,
                index,
            } => {
                if let Some(op) = structure.operators.get(index) {
                    if !op.is_empty() {
                        visit(FlatSlotUnit {
                            id: prefix.child(index),
                            kind: FlatUnitKind::Operator,
                            text: &op.code,
                        });
                    }
                }
                stack.push(Step::Field {
                    structure,
                    prefix,
                    index: index + 1,
                });
            }
            Step::Closing { bracket, id } => visit(FlatSlotUnit {
                id,
                kind: FlatUnitKind::ClosingBracket(bracket),
                text: bracket.closing(),
            }),
        }
    }
}

/// Collect the flattened units of a structure
pub fn flatten<'a>(structure: &'a SlotStructure, prefix: &SlotId) -> Vec<FlatSlotUnit<'a>> {
    let mut units = Vec::new();
    for_each_unit(structure, prefix, |unit| units.push(unit));
    units
}

impl SlotStructure {
    /// Resolve an identifier to a field or operator. Returns `None` for any
    /// index that does not exist or descends through a non-bracketed field.
    pub fn resolve(&self, id: &SlotId, class: UnitClass) -> Option<ResolvedSlot<'_>> {
        let (last, path) = id.indices().split_last()?;
        let structure = self.descend(path)?;
        match class {
            UnitClass::Field => structure.fields.get(*last).map(ResolvedSlot::Field),
            UnitClass::Operator => structure.operators.get(*last).map(ResolvedSlot::Operator),
        }
    }

    /// String-level resolution; malformed identifiers resolve to `None`
    pub fn resolve_str(&self, id: &str, class: UnitClass) -> Option<ResolvedSlot<'_>> {
        SlotId::parse(id).and_then(|id| self.resolve(&id, class))
    }

    /// Resolve a flattened unit back to its field or operator
    pub fn resolve_unit(&self, unit: &FlatSlotUnit<'_>) -> Option<ResolvedSlot<'_>> {
        self.resolve(&unit.id, unit.kind.class())
    }

    pub fn field_mut(&mut self, id: &SlotId) -> Option<&mut FieldSlot> {
        let (last, path) = id.indices().split_last()?;
        self.descend_mut(path)?.fields.get_mut(*last)
    }

    pub fn operator_mut(&mut self, id: &SlotId) -> Option<&mut OperatorSlot> {
        let (last, path) = id.indices().split_last()?;
        self.descend_mut(path)?.operators.get_mut(*last)
    }

    /// The structure that directly contains the unit at `id`
    pub fn containing_structure(&self, id: &SlotId) -> Option<&SlotStructure> {
        let (_, path) = id.indices().split_last()?;
        self.descend(path)
    }

    fn descend(&self, path: &[usize]) -> Option<&SlotStructure> {
        let mut current = self;
        for index in path {
            match current.fields.get(*index)? {
                FieldSlot::Bracketed { inner, .. } => current = inner,
                _ => return None,
            }
        }
        Some(current)
    }

    fn descend_mut(&mut self, path: &[usize]) -> Option<&mut SlotStructure> {
        let mut current = self;
        for index in path {
            match current.fields.get_mut(*index)? {
                FieldSlot::Bracketed { inner, .. } => current = inner,
                _ => return None,
            }
        }
        Some(current)
    }
}
