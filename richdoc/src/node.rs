//! Rich-document node model and JSON parsing.
//!
//! Documents arrive as editor JSON (`{"type": "doc", "content": [...]}`).
//! Parsing of child nodes is total: anything that is not a recognised node
//! becomes [`Node::Unknown`] carrying whatever children it had, so rendering
//! can degrade instead of failing. Only the document root is checked strictly.

#[cfg(test)]
#[path = "node_test.rs"]
mod tests;

use serde_json::Value;

/// Error returned by [`Node::parse_document`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The root value is not a JSON object.
    #[error("document root is not an object")]
    NotAnObject,
    /// The root object has no string `type` field.
    #[error("document root has no type")]
    MissingType,
    /// The root object is a node, but not a `doc`.
    #[error("unexpected document root type: {0}")]
    UnexpectedRoot(String),
}

/// Inline style applied to a text node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    Bold,
    Italic,
    Code,
    Strike,
    Underline,
    Link { href: String },
}

impl Mark {
    /// Parse a single mark object. Unsupported mark types, and links whose
    /// target fails [`is_safe_href`], yield `None`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let kind = value.get("type")?.as_str()?;
        match kind {
            "bold" => Some(Self::Bold),
            "italic" => Some(Self::Italic),
            "code" => Some(Self::Code),
            "strike" => Some(Self::Strike),
            "underline" => Some(Self::Underline),
            "link" => {
                let href = attr_str(value, "href").filter(|h| is_safe_href(h))?;
                Some(Self::Link { href: href.trim().to_owned() })
            }
            _ => None,
        }
    }
}

/// URL schemes a link may use. Scheme-less (relative) targets are allowed.
const LINK_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

/// Whether `href` may be emitted as a link target.
///
/// A scheme is whatever precedes the first `:` when no `/`, `?` or `#`
/// comes before it. Empty targets are rejected.
#[must_use]
pub fn is_safe_href(href: &str) -> bool {
    let href = href.trim();
    if href.is_empty() {
        return false;
    }
    let Some(colon) = href.find(':') else {
        return true;
    };
    let scheme = &href[..colon];
    if scheme.contains(['/', '?', '#']) {
        return true;
    }
    LINK_SCHEMES.iter().any(|allowed| scheme.eq_ignore_ascii_case(allowed))
}

/// A node of the rich-document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Doc(Vec<Node>),
    Paragraph(Vec<Node>),
    /// Heading level is always within `1..=6`.
    Heading {
        level: u8,
        content: Vec<Node>,
    },
    Blockquote(Vec<Node>),
    HorizontalRule,
    CodeBlock {
        language: Option<String>,
        content: Vec<Node>,
    },
    BulletList(Vec<Node>),
    OrderedList {
        start: u32,
        content: Vec<Node>,
    },
    ListItem(Vec<Node>),
    /// Marks are kept in document order; the first mark wraps outermost.
    Text {
        text: String,
        marks: Vec<Mark>,
    },
    HardBreak,
    Emoji {
        name: Option<String>,
        emoji: Option<String>,
    },
    /// Any node type this model does not know. `kind` is empty when the
    /// source had no usable `type`.
    Unknown {
        kind: String,
        content: Vec<Node>,
    },
}

impl Node {
    /// Parse a document root. The root must be an object whose `type` is
    /// `"doc"`; a missing `content` array is treated as an empty document.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] when the root shape is not a document.
    pub fn parse_document(value: &Value) -> Result<Self, ParseError> {
        if !value.is_object() {
            return Err(ParseError::NotAnObject);
        }
        let kind = value.get("type").and_then(Value::as_str).ok_or(ParseError::MissingType)?;
        if kind != "doc" {
            return Err(ParseError::UnexpectedRoot(kind.to_owned()));
        }
        Ok(Self::Doc(parse_children(value)))
    }

    /// Parse any node. Never fails; unrecognised shapes become [`Node::Unknown`].
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(kind) = value.get("type").and_then(Value::as_str) else {
            return Self::Unknown { kind: String::new(), content: parse_children(value) };
        };

        match kind {
            "doc" => Self::Doc(parse_children(value)),
            "paragraph" => Self::Paragraph(parse_children(value)),
            "heading" => Self::Heading { level: heading_level(value), content: parse_children(value) },
            "blockquote" => Self::Blockquote(parse_children(value)),
            "horizontalRule" => Self::HorizontalRule,
            "codeBlock" => Self::CodeBlock {
                language: attr_str(value, "language").filter(|l| !l.is_empty()).map(str::to_owned),
                content: parse_children(value),
            },
            "bulletList" => Self::BulletList(parse_children(value)),
            "orderedList" => Self::OrderedList { start: list_start(value), content: parse_children(value) },
            "listItem" => Self::ListItem(parse_children(value)),
            "text" => Self::Text {
                text: value.get("text").and_then(Value::as_str).unwrap_or_default().to_owned(),
                marks: parse_marks(value),
            },
            "hardBreak" => Self::HardBreak,
            "emoji" => Self::Emoji {
                name: attr_str(value, "name").map(str::to_owned),
                emoji: attr_str(value, "emoji").map(str::to_owned),
            },
            other => Self::Unknown { kind: other.to_owned(), content: parse_children(value) },
        }
    }

    /// Child nodes, empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        match self {
            Self::Doc(content)
            | Self::Paragraph(content)
            | Self::Blockquote(content)
            | Self::BulletList(content)
            | Self::ListItem(content)
            | Self::Heading { content, .. }
            | Self::CodeBlock { content, .. }
            | Self::OrderedList { content, .. }
            | Self::Unknown { content, .. } => content.as_slice(),
            Self::HorizontalRule | Self::Text { .. } | Self::HardBreak | Self::Emoji { .. } => &[],
        }
    }

    /// Concatenated text of this node and its descendants, ignoring marks.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(node: &Node, out: &mut String) {
    match node {
        Node::Text { text, .. } => out.push_str(text),
        Node::HardBreak => out.push('\n'),
        other => {
            for child in other.children() {
                collect_text(child, out);
            }
        }
    }
}

fn parse_children(value: &Value) -> Vec<Node> {
    value
        .get("content")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(Node::from_value).collect())
        .unwrap_or_default()
}

fn parse_marks(value: &Value) -> Vec<Mark> {
    value
        .get("marks")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Mark::from_value).collect())
        .unwrap_or_default()
}

fn attr_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get("attrs")?.get(key)?.as_str()
}

fn heading_level(value: &Value) -> u8 {
    let raw = value.get("attrs").and_then(|a| a.get("level")).and_then(Value::as_u64).unwrap_or(1);
    u8::try_from(raw.clamp(1, 6)).unwrap_or(1)
}

fn list_start(value: &Value) -> u32 {
    value
        .get("attrs")
        .and_then(|a| a.get("start"))
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(1)
}
