//! Writing a program as `.spy` text

use super::{
    checksum, directive, DocumentHeaders, APP_NAME, CHECKSUM_KEY, DEFS_SECTION, DIRECTIVE_PREFIX,
    DISABLED_KEY, FORMAT_VERSION, FRAME_STATE_KEY, IMPORTS_SECTION, INDENT, MAIN_SECTION,
    SECTION_KEY,
};
use crate::frame::{CollapsedState, Frame, FrameId, FrozenState};
use crate::slot::text;
use crate::store::FrameStore;
use crate::validation::LineFrameMap;

/// Saved text and where each frame ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutput {
    pub text: String,
    pub line_map: LineFrameMap,
}

/// The single source line of a frame, without indentation or directives
pub fn frame_line(frame: &Frame) -> String {
    let mut line = String::new();
    for (index, label) in frame.definition().labels.iter().enumerate() {
        line.push_str(label.prefix);
        if !label.has_slot {
            continue;
        }
        let Some(structure) = frame.label(index) else {
            continue;
        };
        if label.raw_text {
            let content = text::render_raw(structure);
            if !content.is_empty() {
                line.push(' ');
                line.push_str(&content);
            }
        } else {
            line.push_str(&text::render(structure));
        }
    }
    if frame.allows_children() {
        line.push_str(" :");
    }
    line
}

fn frame_state_value(frame: &Frame) -> Option<String> {
    if frame.collapsed == CollapsedState::Visible && frame.frozen == FrozenState::Unfrozen {
        return None;
    }
    Some(format!("{};{}", frame.collapsed.as_str(), frame.frozen.as_str()))
}

/// Encode the whole store. Line numbers in the returned map count every
/// line of the file, headers included.
pub fn save(store: &FrameStore, headers: &DocumentHeaders) -> SaveOutput {
    let mut head = vec![format!(
        "{}{}:{}:{}",
        DIRECTIVE_PREFIX, APP_NAME, FORMAT_VERSION, headers.platform
    )];
    for (key, value) in &headers.entries {
        head.push(directive(key, value));
    }

    // Body lines, numbered from the line after the checksum
    let body_start = head.len() + 1;
    let mut body: Vec<String> = Vec::new();
    let mut line_map = LineFrameMap::new();

    for (section, name) in [
        (FrameId::IMPORTS, IMPORTS_SECTION),
        (FrameId::DEFS, DEFS_SECTION),
        (FrameId::MAIN, MAIN_SECTION),
    ] {
        body.push(directive(SECTION_KEY, name));

        let mut stack: Vec<(FrameId, usize)> = store
            .children_of(section)
            .iter()
            .rev()
            .map(|&id| (id, 0))
            .collect();
        while let Some((id, depth)) = stack.pop() {
            let Some(frame) = store.get(id) else {
                continue;
            };
            let indent = INDENT.repeat(depth);

            if let Some(state) = frame_state_value(frame) {
                body.push(format!("{}{}", indent, directive(FRAME_STATE_KEY, &state)));
            }
            let line = frame_line(frame);
            line_map.insert(body_start + body.len(), id);
            if frame.disabled {
                body.push(format!("{}{}", indent, directive(DISABLED_KEY, &line)));
            } else {
                body.push(format!("{}{}", indent, line));
            }

            // Joint frames follow the head's body at the head's depth
            for &joint in frame.joint_children.iter().rev() {
                stack.push((joint, depth));
            }
            for &child in frame.children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
    }

    let mut body_text = String::new();
    for line in &body {
        body_text.push_str(line);
        body_text.push('\n');
    }

    let mut text = String::new();
    for line in &head {
        text.push_str(line);
        text.push('\n');
    }
    text.push_str(&directive(CHECKSUM_KEY, &checksum(&body_text)));
    text.push('\n');
    text.push_str(&body_text);

    tracing::debug!(lines = head.len() + 1 + body.len(), frames = line_map.len(), "saved store");
    SaveOutput { text, line_map }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{CaretPosition, FrameType};
    use crate::store::InsertTarget;

    #[test]
    fn test_empty_program() {
        let output = save(&FrameStore::new(), &DocumentHeaders::default());
        let lines: Vec<&str> = output.text.lines().collect();
        assert_eq!(lines[0], "#(=> Strype:1:std");
        assert!(lines[1].starts_with("#(=> Checksum:"));
        assert_eq!(
            &lines[2..],
            &["#(=> Section:Imports", "#(=> Section:Definitions", "#(=> Section:Main"]
        );
        assert!(output.line_map.is_empty());
    }

    #[test]
    fn test_frame_lines() {
        let mut store = FrameStore::new();
        let f = store
            .add_frame(
                InsertTarget::Child {
                    parent: FrameId::DEFS,
                    index: 0,
                },
                FrameType::FuncDef,
            )
            .unwrap();
        store.set_slot_text(f, 0, "area");
        store.set_slot_text(f, 1, "w,h");
        assert_eq!(frame_line(store.get(f).unwrap()), "def area(w, h) :");

        let c = store
            .add_frame(
                InsertTarget::Child {
                    parent: FrameId::MAIN,
                    index: 0,
                },
                FrameType::Comment,
            )
            .unwrap();
        assert_eq!(frame_line(store.get(c).unwrap()), "#");
        store.set_slot_text(c, 0, "note");
        assert_eq!(frame_line(store.get(c).unwrap()), "# note");
    }

    #[test]
    fn test_joint_frames_at_head_depth_and_line_map() {
        let mut store = FrameStore::new();
        let w = store
            .add_frame(
                InsertTarget::Child {
                    parent: FrameId::MAIN,
                    index: 0,
                },
                FrameType::While,
            )
            .unwrap();
        store.set_slot_text(w, 0, "True");
        let brk = store
            .add_frame_at_caret(w, CaretPosition::Body, FrameType::Break)
            .unwrap();
        let els = store
            .add_frame_at_caret(w, CaretPosition::Below, FrameType::Else)
            .unwrap();
        store.set_disabled(brk, true);

        let output = save(&store, &DocumentHeaders::default());
        let lines: Vec<&str> = output.text.lines().collect();
        assert_eq!(
            &lines[5..],
            &["while True :", "    #(=> Disabled:break", "else :"]
        );
        assert_eq!(output.line_map.frame_at(5), Some(w));
        assert_eq!(output.line_map.frame_at(6), Some(brk));
        assert_eq!(output.line_map.frame_at(7), Some(els));
    }

    #[test]
    fn test_checksum_covers_body() {
        let output = save(&FrameStore::new(), &DocumentHeaders::default());
        let (_, body) = output.text.split_once("\n#(=> Section").unwrap();
        let body = format!("#(=> Section{}", body);
        assert!(output.text.contains(&checksum(&body)));
    }
}
