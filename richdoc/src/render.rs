//! Document tree to view tree.
//!
//! A single dispatch over [`Node`]; every node kind maps to exactly one view
//! shape, and nesting is preserved one-to-one except for unknown nodes, which
//! collapse into a fragment of their rendered children.

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;

use serde_json::Value;

use crate::node::{Mark, Node};
use crate::view::{Tag, View};

/// Text shown when a message body is neither a string nor a document.
pub const UNSUPPORTED_PLACEHOLDER: &str = "[unsupported message]";

/// Render a raw message body.
///
/// A JSON string renders as literal text, a `doc` object renders as its
/// blocks, and any other shape renders [`UNSUPPORTED_PLACEHOLDER`].
#[must_use]
pub fn render_value(value: &Value) -> View {
    if let Value::String(text) = value {
        return View::text(text.as_str());
    }
    match Node::parse_document(value) {
        Ok(doc) => render_node(&doc),
        Err(_) => View::text(UNSUPPORTED_PLACEHOLDER),
    }
}

/// Render one node and its subtree.
#[must_use]
pub fn render_node(node: &Node) -> View {
    match node {
        Node::Doc(content) | Node::Unknown { content, .. } => View::fragment(render_all(content)),
        Node::Paragraph(content) => View::element(Tag::Paragraph, render_all(content)),
        Node::Heading { level, content } => View::element(Tag::Heading { level: *level }, render_all(content)),
        Node::Blockquote(content) => View::element(Tag::Blockquote, render_all(content)),
        Node::HorizontalRule => View::element(Tag::HorizontalRule, Vec::new()),
        Node::CodeBlock { language, .. } => {
            View::element(Tag::Pre { language: language.clone() }, vec![View::text(node.text_content())])
        }
        Node::BulletList(content) => View::element(Tag::BulletList, render_all(content)),
        Node::OrderedList { start, content } => View::element(Tag::OrderedList { start: *start }, render_all(content)),
        Node::ListItem(content) => View::element(Tag::ListItem, render_all(content)),
        Node::Text { text, marks } => render_text(text, marks),
        Node::HardBreak => View::element(Tag::LineBreak, Vec::new()),
        Node::Emoji { name, emoji } => match (emoji, name) {
            (Some(glyph), _) => View::text(glyph.as_str()),
            (None, Some(name)) => View::text(format!(":{name}:")),
            (None, None) => View::fragment(Vec::new()),
        },
    }
}

fn render_all(nodes: &[Node]) -> Vec<View> {
    nodes.iter().map(render_node).collect()
}

fn render_text(text: &str, marks: &[Mark]) -> View {
    marks.iter().rev().fold(View::text(text), |inner, mark| View::element(mark_tag(mark), vec![inner]))
}

fn mark_tag(mark: &Mark) -> Tag {
    match mark {
        Mark::Bold => Tag::Strong,
        Mark::Italic => Tag::Emphasis,
        Mark::Code => Tag::Code,
        Mark::Strike => Tag::Strike,
        Mark::Underline => Tag::Underline,
        Mark::Link { href } => Tag::Link { href: href.clone() },
    }
}
