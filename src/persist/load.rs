//! Reading `.spy` text back into a store
//!
//! The whole file is decoded into a fresh [`FrameStore`]. Nothing is handed
//! back unless every line was understood, so a caller's live store is never
//! left half-loaded.

use super::{
    checksum, parse_directive, Document, DocumentHeaders, LoadError, APP_NAME, CHECKSUM_KEY,
    DEFS_SECTION, DIRECTIVE_PREFIX, DISABLED_KEY, FORMAT_VERSION, FRAME_STATE_KEY,
    IMPORTS_SECTION, INDENT, MAIN_SECTION, SECTION_KEY,
};
use crate::frame::{CollapsedState, FrameId, FrameType, FrameTypeDef, FrozenState};
use crate::slot::{text, SlotStructure};
use crate::store::{FrameStore, InsertTarget};
use crate::validation::{self, LineFrameMap};

/// A decoded frame line
#[derive(Debug)]
struct ParsedLine {
    frame_type: FrameType,
    labels: Vec<(usize, SlotStructure)>,
}

/// Characters that may follow a keyword for it to count as one
fn keyword_boundary(rest: &str) -> bool {
    matches!(rest.chars().next(), None | Some(' ') | Some(':') | Some('('))
}

/// Byte offset of the first occurrence of `needle` outside brackets and
/// string literals
fn find_top_level(haystack: &str, needle: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in haystack.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        if depth == 0 && haystack[i..].starts_with(needle) {
            return Some(i);
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

fn parse_slot(raw: bool, content: &str) -> Option<SlotStructure> {
    if raw {
        Some(text::parse_raw(content))
    } else {
        text::parse(content).ok()
    }
}

/// Split `body` along the label prefixes of `def`
fn split_labels(def: &FrameTypeDef, body: &str) -> Option<Vec<(usize, SlotStructure)>> {
    let labels = def.labels;
    let first = labels.first()?;
    let mut rest = match body.strip_prefix(first.prefix) {
        Some(rest) => rest,
        // `return` written without the trailing space of an empty slot
        None if body == first.prefix.trim_end() => "",
        None => return None,
    };

    let mut out = Vec::new();
    for (index, label) in labels.iter().enumerate() {
        if index > 0 {
            rest = rest.strip_prefix(label.prefix)?;
        }
        let content = match labels.get(index + 1) {
            Some(next) => {
                let end = find_top_level(rest, next.prefix)?;
                let (content, remaining) = rest.split_at(end);
                rest = remaining;
                content
            }
            None => std::mem::take(&mut rest),
        };
        if label.has_slot {
            out.push((index, parse_slot(label.raw_text, content)?));
        } else if !content.is_empty() {
            return None;
        }
    }
    Some(out)
}

fn parse_comment(content: &str) -> Option<ParsedLine> {
    let rest = content.strip_prefix('#')?;
    let rest = rest.strip_prefix(' ').unwrap_or(rest);
    Some(ParsedLine {
        frame_type: FrameType::Comment,
        labels: vec![(0, text::parse_raw(rest))],
    })
}

fn parse_keyword_frame(content: &str) -> Option<ParsedLine> {
    FrameType::USER_TYPES.iter().find_map(|&ty| {
        let def = ty.definition();
        if def.keyword.is_empty() || ty == FrameType::Comment {
            return None;
        }
        let after = content.strip_prefix(def.keyword)?;
        if !keyword_boundary(after) {
            return None;
        }
        let body = if def.allow_children {
            content.strip_suffix(" :")?
        } else {
            content
        };
        Some(ParsedLine {
            frame_type: ty,
            labels: split_labels(def, body)?,
        })
    })
}

fn parse_statement(content: &str) -> Option<ParsedLine> {
    match find_top_level(content, " = ") {
        Some(at) => Some(ParsedLine {
            frame_type: FrameType::VarAssign,
            labels: vec![
                (0, text::parse(&content[..at]).ok()?),
                (1, text::parse(&content[at + 3..]).ok()?),
            ],
        }),
        None => Some(ParsedLine {
            frame_type: FrameType::FuncCall,
            labels: vec![(0, text::parse(content).ok()?)],
        }),
    }
}

/// Decode one frame line (indentation and directives already stripped)
fn parse_frame_line(content: &str) -> Option<ParsedLine> {
    if content.starts_with('#') {
        return parse_comment(content);
    }
    parse_keyword_frame(content).or_else(|| parse_statement(content))
}

fn parse_version_header(line: &str) -> Result<DocumentHeaders, LoadError> {
    let rest = line
        .strip_prefix(DIRECTIVE_PREFIX)
        .ok_or(LoadError::MissingHeader)?;
    let mut parts = rest.splitn(3, ':');
    let (Some(app), Some(version), Some(platform)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(LoadError::MissingHeader);
    };
    if app != APP_NAME {
        return Err(LoadError::MissingHeader);
    }
    let found: u32 = version.parse().map_err(|_| LoadError::Malformed {
        line: 0,
        reason: format!("bad version {:?}", version),
    })?;
    if found > FORMAT_VERSION {
        return Err(LoadError::UnsupportedVersion { found });
    }
    Ok(DocumentHeaders {
        platform: platform.to_string(),
        entries: Vec::new(),
    })
}

fn parse_frame_state(line: usize, value: &str) -> Result<(CollapsedState, FrozenState), LoadError> {
    let malformed = || LoadError::Malformed {
        line,
        reason: format!("bad frame state {:?}", value),
    };
    let (collapsed, frozen) = value.split_once(';').ok_or_else(malformed)?;
    Ok((
        CollapsedState::from_name(collapsed).ok_or_else(malformed)?,
        FrozenState::from_name(frozen).ok_or_else(malformed)?,
    ))
}

/// Split leading indentation into a depth and the remaining content
fn split_indent(line: &str) -> (usize, &str) {
    let mut depth = 0;
    let mut rest = line;
    while let Some(stripped) = rest.strip_prefix(INDENT) {
        depth += 1;
        rest = stripped;
    }
    (depth, rest)
}

/// Builds the tree while lines stream in
struct TreeBuilder {
    store: FrameStore,
    /// `containers[d]` receives frames written at depth `d`
    containers: Vec<FrameId>,
    /// Last frame written at each depth, for attaching joint frames
    last_at_depth: Vec<Option<FrameId>>,
    pending_state: Option<(CollapsedState, FrozenState)>,
    line_map: LineFrameMap,
}

impl TreeBuilder {
    fn new() -> Self {
        let mut store = FrameStore::new();
        // Validation runs once at the end instead of per frame
        store.set_empty_slot_checks(false);
        Self {
            store,
            containers: Vec::new(),
            last_at_depth: Vec::new(),
            pending_state: None,
            line_map: LineFrameMap::new(),
        }
    }

    fn enter_section(&mut self, section: FrameId) {
        self.containers = vec![section];
        self.last_at_depth = vec![None];
        self.pending_state = None;
    }

    fn add(&mut self, line: usize, depth: usize, disabled: bool, parsed: ParsedLine) -> Result<(), LoadError> {
        let structure = |reason: String| LoadError::Structure { line, reason };

        if depth >= self.containers.len() {
            return Err(structure(format!("unexpected indentation (depth {})", depth)));
        }
        self.containers.truncate(depth + 1);
        self.last_at_depth.truncate(depth + 1);

        let ty = parsed.frame_type;
        let target = if ty.is_joint() {
            let previous = self.last_at_depth[depth]
                .ok_or_else(|| structure(format!("{} without a preceding block", ty.name())))?;
            let head = self.store.chain_head(previous);
            InsertTarget::Joint {
                head,
                index: self.store.joints_of(head).len(),
            }
        } else {
            let parent = self.containers[depth];
            InsertTarget::Child {
                parent,
                index: self.store.children_of(parent).len(),
            }
        };

        let id = self
            .store
            .add_frame(target, ty)
            .ok_or_else(|| structure(format!("{} is not allowed here", ty.name())))?;

        if let Some(frame) = self.store.get_mut(id) {
            for (index, content) in parsed.labels {
                frame.labels.insert(index, content);
            }
            frame.disabled = disabled;
            if let Some((collapsed, frozen)) = self.pending_state.take() {
                if collapsed == CollapsedState::Collapsed && !frame.allows_children() {
                    return Err(structure(format!("{} cannot be collapsed", ty.name())));
                }
                frame.collapsed = collapsed;
                frame.frozen = frozen;
            }
        }

        self.last_at_depth[depth] = Some(id);
        if ty.allows_children() {
            self.containers.push(id);
            self.last_at_depth.push(None);
        }
        self.line_map.insert(line, id);
        Ok(())
    }
}

/// Decode a complete `.spy` text into a new document
pub fn load(source: &str) -> Result<Document, LoadError> {
    let mut lines: Vec<&str> = source.split('\n').collect();
    if source.ends_with('\n') {
        lines.pop();
    }

    let first = lines.first().ok_or(LoadError::MissingHeader)?;
    let mut headers = parse_version_header(first)?;

    // Headers up to the checksum
    let mut index = 1;
    let expected = loop {
        let line = lines.get(index).ok_or(LoadError::MissingChecksum)?;
        let (key, value) = parse_directive(line).ok_or(LoadError::MissingChecksum)?;
        index += 1;
        if key == CHECKSUM_KEY {
            break value.to_string();
        }
        if key == SECTION_KEY {
            return Err(LoadError::MissingChecksum);
        }
        headers.entries.push((key.to_string(), value.to_string()));
    };

    let mut body = String::new();
    for line in &lines[index..] {
        body.push_str(line);
        body.push('\n');
    }
    let actual = checksum(&body);
    if !actual.eq_ignore_ascii_case(&expected) {
        return Err(LoadError::ChecksumMismatch { expected, actual });
    }

    let mut builder = TreeBuilder::new();
    let mut sections = [
        (IMPORTS_SECTION, FrameId::IMPORTS),
        (DEFS_SECTION, FrameId::DEFS),
        (MAIN_SECTION, FrameId::MAIN),
    ]
    .into_iter();
    let mut in_section = false;

    for (line_no, line) in lines.iter().enumerate().skip(index) {
        if let Some((SECTION_KEY, name)) = parse_directive(line) {
            match sections.next() {
                Some((expected_name, id)) if expected_name == name => {
                    builder.enter_section(id);
                    in_section = true;
                    continue;
                }
                _ => {
                    return Err(LoadError::Structure {
                        line: line_no,
                        reason: format!("unexpected section {:?}", name),
                    })
                }
            }
        }
        if !in_section {
            return Err(LoadError::Structure {
                line: line_no,
                reason: "content before the first section".to_string(),
            });
        }

        let (depth, content) = split_indent(line);
        let (disabled, content) = match parse_directive(content) {
            Some((FRAME_STATE_KEY, value)) => {
                builder.pending_state = Some(parse_frame_state(line_no, value)?);
                continue;
            }
            Some((DISABLED_KEY, _)) => (true, &content[DIRECTIVE_PREFIX.len() + DISABLED_KEY.len() + 1..]),
            Some((key, _)) => {
                return Err(LoadError::Malformed {
                    line: line_no,
                    reason: format!("unknown directive {:?}", key),
                })
            }
            None => (false, content),
        };

        let parsed = parse_frame_line(content).ok_or_else(|| LoadError::Malformed {
            line: line_no,
            reason: format!("cannot read frame {:?}", content),
        })?;
        builder.add(line_no, depth, disabled, parsed)?;
    }

    if sections.next().is_some() {
        return Err(LoadError::Structure {
            line: lines.len(),
            reason: "missing section".to_string(),
        });
    }

    let mut store = builder.store;
    store.set_empty_slot_checks(true);
    validation::validate_all(&mut store);
    Ok(Document {
        store,
        headers,
        line_map: builder.line_map,
    })
}

/// Load into existing state. On failure both `store` and `headers` are left
/// exactly as they were and `false` is returned.
pub fn load_into(store: &mut FrameStore, headers: &mut DocumentHeaders, source: &str) -> bool {
    match load(source) {
        Ok(document) => {
            *store = document.store;
            *headers = document.headers;
            true
        }
        Err(err) => {
            tracing::warn!(%err, "load failed; keeping current program");
            false
        }
    }
}
