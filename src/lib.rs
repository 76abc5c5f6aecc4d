//! Client-side state core for the operations desk: editable order and invoice
//! tables, and the chat panel's optimistic message store over a realtime
//! record backend.

pub mod chat;
pub mod config;
pub mod store;
pub mod table;
