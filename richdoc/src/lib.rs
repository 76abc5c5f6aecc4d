//! Rich-text message documents and their rendering.
//!
//! Chat messages carry either plain text or an editor document tree. This
//! crate parses that tree ([`node`]), renders it into a view tree
//! ([`render`]), and serializes views to HTML or plain text ([`view`]).

pub mod node;
pub mod render;
pub mod view;

pub use node::{Mark, Node, ParseError, is_safe_href};
pub use render::{UNSUPPORTED_PLACEHOLDER, render_node, render_value};
pub use view::{Tag, View};
