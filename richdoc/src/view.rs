//! View tree produced by the renderer, plus HTML and plain-text output.

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;

use std::fmt::Write;

use pulldown_cmark_escape::{escape_href, escape_html};
use serde::Serialize;

use crate::node::is_safe_href;

/// Element kind in the view tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tag", rename_all = "snake_case")]
pub enum Tag {
    Paragraph,
    Heading { level: u8 },
    Blockquote,
    HorizontalRule,
    Pre { language: Option<String> },
    BulletList,
    OrderedList { start: u32 },
    ListItem,
    Strong,
    Emphasis,
    Code,
    Strike,
    Underline,
    Link { href: String },
    LineBreak,
}

impl Tag {
    fn html_name(&self) -> String {
        match self {
            Self::Paragraph => "p".into(),
            Self::Heading { level } => format!("h{level}"),
            Self::Blockquote => "blockquote".into(),
            Self::HorizontalRule => "hr".into(),
            Self::Pre { .. } => "pre".into(),
            Self::BulletList => "ul".into(),
            Self::OrderedList { .. } => "ol".into(),
            Self::ListItem => "li".into(),
            Self::Strong => "strong".into(),
            Self::Emphasis => "em".into(),
            Self::Code => "code".into(),
            Self::Strike => "s".into(),
            Self::Underline => "u".into(),
            Self::Link { .. } => "a".into(),
            Self::LineBreak => "br".into(),
        }
    }

    fn is_void(&self) -> bool {
        matches!(self, Self::HorizontalRule | Self::LineBreak)
    }
}

/// Rendered output. `Fragment` groups siblings without adding structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum View {
    Text { text: String },
    Element { tag: Tag, children: Vec<View> },
    Fragment { children: Vec<View> },
}

impl View {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    #[must_use]
    pub fn element(tag: Tag, children: Vec<View>) -> Self {
        Self::Element { tag, children }
    }

    #[must_use]
    pub fn fragment(children: Vec<View>) -> Self {
        Self::Fragment { children }
    }

    /// Serialize to HTML. Text and attribute values are escaped; a link whose
    /// target fails [`is_safe_href`] is written as its children only.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_html(self, &mut out);
        out
    }

    /// Flatten to terminal-friendly text: one line per block, list markers,
    /// `>` prefixes for quotes and `#` prefixes for headings.
    #[must_use]
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        write_plain(self, &mut out, 0);
        out.trim_end_matches('\n').to_owned()
    }
}

// =============================================================================
// HTML
// =============================================================================

fn write_html(view: &View, out: &mut String) {
    match view {
        View::Text { text } => {
            let _ = escape_html(&mut *out, text);
        }
        View::Fragment { children } => {
            for child in children {
                write_html(child, out);
            }
        }
        View::Element { tag: Tag::Link { href }, children } if !is_safe_href(href) => {
            for child in children {
                write_html(child, out);
            }
        }
        View::Element { tag, children } => {
            let name = tag.html_name();
            let _ = write!(out, "<{name}");
            match tag {
                Tag::Link { href } => {
                    out.push_str(r#" href=""#);
                    let _ = escape_href(&mut *out, href.trim());
                    out.push_str(r#"" target="_blank" rel="noopener noreferrer""#);
                }
                Tag::OrderedList { start } if *start != 1 => {
                    let _ = write!(out, r#" start="{start}""#);
                }
                _ => {}
            }
            out.push('>');
            if tag.is_void() {
                return;
            }
            if let Tag::Pre { language } = tag {
                match language {
                    Some(lang) => {
                        out.push_str(r#"<code class="language-"#);
                        let _ = escape_html(&mut *out, lang);
                        out.push_str(r#"">"#);
                    }
                    None => out.push_str("<code>"),
                }
            }
            for child in children {
                write_html(child, out);
            }
            if matches!(tag, Tag::Pre { .. }) {
                out.push_str("</code>");
            }
            let _ = write!(out, "</{name}>");
        }
    }
}

// =============================================================================
// PLAIN TEXT
// =============================================================================

fn write_plain(view: &View, out: &mut String, depth: usize) {
    match view {
        View::Text { text } => out.push_str(text),
        View::Fragment { children } => write_plain_children(children, out, depth),
        View::Element { tag, children } => match tag {
            Tag::Paragraph | Tag::Pre { .. } => {
                write_plain_children(children, out, depth);
                end_block(out);
            }
            Tag::Heading { level } => {
                out.push_str(&"#".repeat(usize::from(*level)));
                out.push(' ');
                write_plain_children(children, out, depth);
                end_block(out);
            }
            Tag::Blockquote => {
                let mut inner = String::new();
                write_plain_children(children, &mut inner, depth);
                for line in inner.trim_end_matches('\n').lines() {
                    out.push_str("> ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
            Tag::HorizontalRule => {
                end_block(out);
                out.push_str("---\n");
            }
            Tag::BulletList => write_plain_items(children, out, depth, |_| "- ".to_owned()),
            Tag::OrderedList { start } => {
                let start = *start as usize;
                write_plain_items(children, out, depth, |i| format!("{}. ", start + i));
            }
            Tag::LineBreak => out.push('\n'),
            Tag::ListItem
            | Tag::Strong
            | Tag::Emphasis
            | Tag::Code
            | Tag::Strike
            | Tag::Underline
            | Tag::Link { .. } => write_plain_children(children, out, depth),
        },
    }
}

fn write_plain_children(children: &[View], out: &mut String, depth: usize) {
    for child in children {
        write_plain(child, out, depth);
    }
}

fn write_plain_items(children: &[View], out: &mut String, depth: usize, marker: impl Fn(usize) -> String) {
    end_block(out);
    for (i, item) in children.iter().enumerate() {
        let mut body = String::new();
        write_plain(item, &mut body, depth + 1);
        out.push_str(&"  ".repeat(depth));
        out.push_str(&marker(i));
        out.push_str(body.trim_end_matches('\n'));
        out.push('\n');
    }
}

fn end_block(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}
