//! Editable data tables (orders, invoices, pending orders).

pub mod controller;
pub mod row;

pub use controller::{CellEvent, ChangeHandler, EditableTableController, EditingCell, Key};
pub use row::{Column, FieldKind, FieldValue, Row, RowId};
