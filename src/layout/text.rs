use crate::config::{NodeStyleConfig, NodeStylesConfig};
use crate::ir::{Node, NodeKind};

use super::{LayoutMode, NodeGeometry, NodeShape, TextBlock};

/// Estimates the wrapped label block for `text`.
///
/// Lines break on spaces once `max_width` is exceeded; a single word longer
/// than the limit stays on its own line.
pub(crate) fn measure_label(text: &str, font_size: f32, max_width: f32, line_height: f32) -> TextBlock {
    let mut lines = Vec::new();
    for raw in text.split('\n') {
        lines.extend(wrap_line(raw.trim_end(), font_size, max_width));
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    let width = lines
        .iter()
        .map(|line| text_width(line, font_size))
        .fold(0.0, f32::max);
    let height = lines.len() as f32 * font_size * line_height;
    TextBlock {
        lines,
        width,
        height,
    }
}

pub(crate) fn node_shape(kind: NodeKind, mode: LayoutMode) -> NodeShape {
    match kind {
        NodeKind::Domain => NodeShape::RoundRect,
        _ if mode.is_tree() => NodeShape::RoundRect,
        NodeKind::Feature => NodeShape::Ellipse,
        NodeKind::External => NodeShape::Diamond,
    }
}

pub(crate) fn node_geometry(node: &Node, mode: LayoutMode, styles: &NodeStylesConfig) -> NodeGeometry {
    let style = style_for(node.kind, styles);
    let wrap = match mode {
        LayoutMode::Free => style.wrap_free,
        LayoutMode::TreeHorizontal => style.wrap_tree,
        LayoutMode::TreeFile => style.wrap_file_tree,
    };
    let label = measure_label(node.display_text(), style.font_size, wrap, styles.line_height);
    let width = (label.width + style.padding * 2.0).max(style.min_width);
    let height = (label.height + style.padding * 2.0).max(style.min_height);
    NodeGeometry {
        width,
        height,
        shape: node_shape(node.kind, mode),
        label,
    }
}

fn style_for(kind: NodeKind, styles: &NodeStylesConfig) -> &NodeStyleConfig {
    match kind {
        NodeKind::Domain => &styles.domain,
        NodeKind::Feature => &styles.feature,
        NodeKind::External => &styles.external,
    }
}

fn wrap_line(line: &str, font_size: f32, max_width: f32) -> Vec<String> {
    if text_width(line, font_size) <= max_width {
        return vec![line.to_string()];
    }
    let mut out = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if text_width(&candidate, font_size) <= max_width {
            current = candidate;
        } else {
            out.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_factor).sum::<f32>() * font_size
}

fn char_width_factor(ch: char) -> f32 {
    match ch {
        ' ' => 0.306,
        '.' | ',' | ':' | ';' | '|' | '!' | '(' | ')' | '[' | ']' | '{' | '}' | '\'' => 0.321,
        'i' | 'j' | 'l' | 'I' => 0.24,
        'f' | 't' | 'r' => 0.34,
        'm' | 'w' => 0.84,
        'M' | 'W' => 0.93,
        '_' | '-' => 0.45,
        c if c.is_ascii_uppercase() => 0.66,
        c if c.is_ascii_digit() => 0.56,
        c if c.is_ascii() => 0.56,
        // CJK and other wide scripts.
        c if c as u32 >= 0x2E80 => 1.0,
        _ => 0.6,
    }
}
