//! Frame-type capability table
//!
//! Every frame points at a static [`FrameTypeDef`] describing its labels,
//! whether it owns a body, which joint chain it belongs to and where it may
//! be placed.

use serde::{Deserialize, Serialize};

/// Every construct the editor knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameType {
    Root,
    ImportsSection,
    DefsSection,
    MainSection,
    If,
    Elif,
    Else,
    For,
    While,
    Try,
    Except,
    Finally,
    With,
    FuncDef,
    ClassDef,
    Import,
    FromImport,
    VarAssign,
    FuncCall,
    Return,
    Global,
    Raise,
    Break,
    Continue,
    Comment,
}

/// One label of a frame: literal prefix text, optionally followed by a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelDef {
    pub prefix: &'static str,
    pub has_slot: bool,
    /// Empty content is acceptable
    pub optional: bool,
    /// Content is kept as verbatim text, not parsed into an expression
    pub raw_text: bool,
    pub accepts_autocomplete: bool,
}

impl LabelDef {
    const fn slot(prefix: &'static str) -> Self {
        Self {
            prefix,
            has_slot: true,
            optional: false,
            raw_text: false,
            accepts_autocomplete: true,
        }
    }

    const fn fixed(prefix: &'static str) -> Self {
        Self {
            prefix,
            has_slot: false,
            optional: true,
            raw_text: false,
            accepts_autocomplete: false,
        }
    }

    const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    const fn raw(mut self) -> Self {
        self.raw_text = true;
        self.accepts_autocomplete = false;
        self
    }

    const fn no_autocomplete(mut self) -> Self {
        self.accepts_autocomplete = false;
        self
    }
}

/// Static capability descriptor of a frame type
#[derive(Debug, PartialEq, Eq)]
pub struct FrameTypeDef {
    pub frame_type: FrameType,
    /// Leading keyword used to recognise the frame in saved text ("" for
    /// plain statements)
    pub keyword: &'static str,
    pub labels: &'static [LabelDef],
    pub allow_children: bool,
    /// Chain heads this frame may follow as a joint frame
    pub joint_heads: &'static [FrameType],
    pub is_section: bool,
}

impl FrameTypeDef {
    pub fn is_joint(&self) -> bool {
        !self.joint_heads.is_empty()
    }

    /// Whether this frame type can head a joint chain
    pub fn is_joint_head(&self) -> bool {
        matches!(
            self.frame_type,
            FrameType::If | FrameType::For | FrameType::While | FrameType::Try
        )
    }

    /// Indices of labels carrying a slot
    pub fn slot_labels(&self) -> impl Iterator<Item = (usize, &'static LabelDef)> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, label)| label.has_slot)
    }
}

const fn def(
    frame_type: FrameType,
    keyword: &'static str,
    labels: &'static [LabelDef],
    allow_children: bool,
) -> FrameTypeDef {
    FrameTypeDef {
        frame_type,
        keyword,
        labels,
        allow_children,
        joint_heads: &[],
        is_section: false,
    }
}

const fn joint(mut d: FrameTypeDef, heads: &'static [FrameType]) -> FrameTypeDef {
    d.joint_heads = heads;
    d
}

const fn section(frame_type: FrameType) -> FrameTypeDef {
    FrameTypeDef {
        frame_type,
        keyword: "",
        labels: &[],
        allow_children: true,
        joint_heads: &[],
        is_section: true,
    }
}

static ROOT: FrameTypeDef = section(FrameType::Root);
static IMPORTS: FrameTypeDef = section(FrameType::ImportsSection);
static DEFS: FrameTypeDef = section(FrameType::DefsSection);
static MAIN: FrameTypeDef = section(FrameType::MainSection);

static IF: FrameTypeDef = def(FrameType::If, "if", &[LabelDef::slot("if ")], true);
static ELIF: FrameTypeDef = joint(
    def(FrameType::Elif, "elif", &[LabelDef::slot("elif ")], true),
    &[FrameType::If],
);
static ELSE: FrameTypeDef = joint(
    def(FrameType::Else, "else", &[LabelDef::fixed("else")], true),
    &[FrameType::If, FrameType::For, FrameType::While, FrameType::Try],
);
static FOR: FrameTypeDef = def(
    FrameType::For,
    "for",
    &[LabelDef::slot("for "), LabelDef::slot(" in ")],
    true,
);
static WHILE: FrameTypeDef = def(FrameType::While, "while", &[LabelDef::slot("while ")], true);
static TRY: FrameTypeDef = def(FrameType::Try, "try", &[LabelDef::fixed("try")], true);
static EXCEPT: FrameTypeDef = joint(
    def(
        FrameType::Except,
        "except",
        &[LabelDef::slot("except ").optional()],
        true,
    ),
    &[FrameType::Try],
);
static FINALLY: FrameTypeDef = joint(
    def(FrameType::Finally, "finally", &[LabelDef::fixed("finally")], true),
    &[FrameType::Try],
);
static WITH: FrameTypeDef = def(
    FrameType::With,
    "with",
    &[LabelDef::slot("with "), LabelDef::slot(" as ").no_autocomplete()],
    true,
);
static FUNC_DEF: FrameTypeDef = def(
    FrameType::FuncDef,
    "def",
    &[
        LabelDef::slot("def ").no_autocomplete(),
        LabelDef::slot("(").optional().no_autocomplete(),
        LabelDef::fixed(")"),
    ],
    true,
);
static CLASS_DEF: FrameTypeDef = def(
    FrameType::ClassDef,
    "class",
    &[LabelDef::slot("class ").no_autocomplete()],
    true,
);
static IMPORT: FrameTypeDef = def(FrameType::Import, "import", &[LabelDef::slot("import ")], false);
static FROM_IMPORT: FrameTypeDef = def(
    FrameType::FromImport,
    "from",
    &[LabelDef::slot("from "), LabelDef::slot(" import ")],
    false,
);
static VAR_ASSIGN: FrameTypeDef = def(
    FrameType::VarAssign,
    "",
    &[LabelDef::slot(""), LabelDef::slot(" = ")],
    false,
);
static FUNC_CALL: FrameTypeDef = def(FrameType::FuncCall, "", &[LabelDef::slot("")], false);
static RETURN: FrameTypeDef = def(
    FrameType::Return,
    "return",
    &[LabelDef::slot("return ").optional()],
    false,
);
static GLOBAL: FrameTypeDef = def(FrameType::Global, "global", &[LabelDef::slot("global ")], false);
static RAISE: FrameTypeDef = def(
    FrameType::Raise,
    "raise",
    &[LabelDef::slot("raise ").optional()],
    false,
);
static BREAK: FrameTypeDef = def(FrameType::Break, "break", &[LabelDef::fixed("break")], false);
static CONTINUE: FrameTypeDef = def(
    FrameType::Continue,
    "continue",
    &[LabelDef::fixed("continue")],
    false,
);
static COMMENT: FrameTypeDef = def(
    FrameType::Comment,
    "#",
    &[LabelDef::slot("#").optional().raw()],
    false,
);

impl FrameType {
    /// Statement and block types a user can create, in keyword-detection order
    pub const USER_TYPES: [FrameType; 21] = [
        FrameType::If,
        FrameType::Elif,
        FrameType::Else,
        FrameType::For,
        FrameType::While,
        FrameType::Try,
        FrameType::Except,
        FrameType::Finally,
        FrameType::With,
        FrameType::FuncDef,
        FrameType::ClassDef,
        FrameType::Import,
        FrameType::FromImport,
        FrameType::Return,
        FrameType::Global,
        FrameType::Raise,
        FrameType::Break,
        FrameType::Continue,
        FrameType::Comment,
        FrameType::VarAssign,
        FrameType::FuncCall,
    ];

    pub fn definition(self) -> &'static FrameTypeDef {
        match self {
            FrameType::Root => &ROOT,
            FrameType::ImportsSection => &IMPORTS,
            FrameType::DefsSection => &DEFS,
            FrameType::MainSection => &MAIN,
            FrameType::If => &IF,
            FrameType::Elif => &ELIF,
            FrameType::Else => &ELSE,
            FrameType::For => &FOR,
            FrameType::While => &WHILE,
            FrameType::Try => &TRY,
            FrameType::Except => &EXCEPT,
            FrameType::Finally => &FINALLY,
            FrameType::With => &WITH,
            FrameType::FuncDef => &FUNC_DEF,
            FrameType::ClassDef => &CLASS_DEF,
            FrameType::Import => &IMPORT,
            FrameType::FromImport => &FROM_IMPORT,
            FrameType::VarAssign => &VAR_ASSIGN,
            FrameType::FuncCall => &FUNC_CALL,
            FrameType::Return => &RETURN,
            FrameType::Global => &GLOBAL,
            FrameType::Raise => &RAISE,
            FrameType::Break => &BREAK,
            FrameType::Continue => &CONTINUE,
            FrameType::Comment => &COMMENT,
        }
    }

    pub fn is_joint(self) -> bool {
        self.definition().is_joint()
    }

    pub fn allows_children(self) -> bool {
        self.definition().allow_children
    }

    pub fn is_section(self) -> bool {
        self.definition().is_section
    }

    /// Short lowercase name used in logs and dumps
    pub fn name(self) -> &'static str {
        match self {
            FrameType::Root => "root",
            FrameType::ImportsSection => "imports",
            FrameType::DefsSection => "definitions",
            FrameType::MainSection => "main",
            FrameType::If => "if",
            FrameType::Elif => "elif",
            FrameType::Else => "else",
            FrameType::For => "for",
            FrameType::While => "while",
            FrameType::Try => "try",
            FrameType::Except => "except",
            FrameType::Finally => "finally",
            FrameType::With => "with",
            FrameType::FuncDef => "funcdef",
            FrameType::ClassDef => "classdef",
            FrameType::Import => "import",
            FrameType::FromImport => "fromimport",
            FrameType::VarAssign => "varassign",
            FrameType::FuncCall => "funccall",
            FrameType::Return => "return",
            FrameType::Global => "global",
            FrameType::Raise => "raise",
            FrameType::Break => "break",
            FrameType::Continue => "continue",
            FrameType::Comment => "comment",
        }
    }

    /// Whether a frame of this type may be a structural child of `parent`.
    /// Only the direct-parent rule; enclosing-loop/function requirements are
    /// checked by the store, which can walk ancestors.
    pub fn placeable_in(self, parent: FrameType) -> bool {
        use FrameType::*;
        if self.is_joint() || self.is_section() {
            return false;
        }
        match parent {
            Root => false,
            ImportsSection => matches!(self, Import | FromImport | Comment),
            DefsSection => matches!(self, FuncDef | ClassDef | Comment),
            ClassDef => !matches!(self, Import | FromImport | ClassDef),
            FuncDef => !matches!(self, Import | FromImport | ClassDef),
            p if p.allows_children() => !matches!(self, Import | FromImport | FuncDef | ClassDef),
            _ => false,
        }
    }
}

/// Joint types that may directly follow `last` in a chain headed by `head`.
/// `last` is `None` when the chain is still empty (only the head exists).
pub fn allowed_joint_successors(head: FrameType, last: Option<FrameType>) -> &'static [FrameType] {
    use FrameType::*;
    match (head, last) {
        (If, None) | (If, Some(Elif)) => &[Elif, Else],
        (For, None) | (While, None) => &[Else],
        (Try, None) => &[Except, Finally],
        (Try, Some(Except)) => &[Except, Else, Finally],
        (Try, Some(Else)) => &[Finally],
        _ => &[],
    }
}

/// Whether `next` may directly follow `prev` (or the head, when `prev` is
/// `None`) in a chain headed by `head`
pub fn joint_may_follow(head: FrameType, prev: Option<FrameType>, next: FrameType) -> bool {
    allowed_joint_successors(head, prev).contains(&next)
}
