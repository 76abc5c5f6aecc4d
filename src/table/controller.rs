//! Single-cell inline editing over a list of rows.
//!
//! DESIGN
//! ======
//! The controller owns a working copy of the caller's rows. Edits land in
//! that copy immediately; the caller only sees them through the change
//! handler, which fires on commit (blur or Enter). Escape restores the value
//! captured when the edit began and never notifies.
//!
//! At most one cell is edited at a time. The cell and its original value live
//! together in one `Option<EditSession>`, so "original value present" and
//! "a cell is being edited" can never disagree.

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;

use tracing::debug;

use super::row::{Column, FieldKind, FieldValue, Row, RowId};

/// The cell currently in edit mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditingCell {
    pub item_id: RowId,
    pub field: String,
}

#[derive(Debug, Clone)]
struct EditSession {
    cell: EditingCell,
    /// `None` when the field did not exist on the row when editing began.
    original: Option<FieldValue>,
}

/// Keys the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Other,
}

/// UI events routed into the controller by the table view.
#[derive(Debug, Clone, PartialEq)]
pub enum CellEvent {
    DoubleClick { item_id: RowId, field: String },
    Input { item_id: RowId, field: String, value: FieldValue },
    Blur,
    KeyDown(Key),
}

/// Callback receiving the full row list on every commit.
pub type ChangeHandler = Box<dyn FnMut(&[Row]) + Send>;

pub struct EditableTableController {
    columns: Vec<Column>,
    rows: Vec<Row>,
    session: Option<EditSession>,
    on_change: ChangeHandler,
}

impl EditableTableController {
    pub fn new(columns: Vec<Column>, rows: Vec<Row>, on_change: impl FnMut(&[Row]) + Send + 'static) -> Self {
        Self { columns, rows, session: None, on_change: Box::new(on_change) }
    }

    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn row(&self, item_id: &RowId) -> Option<&Row> {
        self.rows.iter().find(|row| &row.id == item_id)
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The cell in edit mode, if any.
    #[must_use]
    pub fn editing(&self) -> Option<&EditingCell> {
        self.session.as_ref().map(|s| &s.cell)
    }

    #[must_use]
    pub fn is_editing(&self, item_id: &RowId, field: &str) -> bool {
        self.editing().is_some_and(|cell| &cell.item_id == item_id && cell.field == field)
    }

    /// Put a cell into edit mode. Returns `false` and leaves state unchanged
    /// when no row has `item_id`.
    ///
    /// Starting an edit while another is active replaces that session; its
    /// buffered value stays in the working copy and goes out with the next
    /// commit.
    pub fn start_edit(&mut self, item_id: &RowId, field: &str) -> bool {
        let Some(row) = self.row(item_id) else {
            debug!(%item_id, field, "start_edit ignored; row not found");
            return false;
        };
        let original = row.get(field).cloned();
        self.session = Some(EditSession { cell: EditingCell { item_id: item_id.clone(), field: field.to_owned() }, original });
        debug!(%item_id, field, "edit started");
        true
    }

    /// Update one field of one row in the working copy, coerced to the
    /// column's declared kind. Works whether or not the cell is being edited.
    /// Returns `false` when no row has `item_id`.
    pub fn set_value(&mut self, item_id: &RowId, field: &str, value: impl Into<FieldValue>) -> bool {
        let value = value.into();
        let value = match self.column_kind(field) {
            Some(kind) => value.coerce(kind),
            None => value,
        };
        self.write_field(item_id, field, Some(value))
    }

    /// Close the active edit (if any) and hand the full working copy to the
    /// change handler. Fires exactly once per call, even with nothing edited.
    pub fn commit(&mut self) {
        if let Some(session) = self.session.take() {
            debug!(item_id = %session.cell.item_id, field = %session.cell.field, "edit committed");
        }
        (self.on_change)(&self.rows);
    }

    /// Restore the pre-edit value and close the session without notifying.
    pub fn cancel(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let EditSession { cell, original } = session;
        self.write_field(&cell.item_id, &cell.field, original);
        debug!(item_id = %cell.item_id, field = %cell.field, "edit cancelled");
    }

    /// Replace the working copy with a fresh collection from the caller.
    /// Any in-progress edit is abandoned without notification.
    pub fn sync_rows(&mut self, rows: Vec<Row>) {
        if let Some(session) = self.session.take() {
            debug!(item_id = %session.cell.item_id, field = %session.cell.field, "edit abandoned by resync");
        }
        self.rows = rows;
    }

    /// Route a view event to the matching operation.
    pub fn dispatch(&mut self, event: CellEvent) {
        match event {
            CellEvent::DoubleClick { item_id, field } => {
                self.start_edit(&item_id, &field);
            }
            CellEvent::Input { item_id, field, value } => {
                self.set_value(&item_id, &field, value);
            }
            CellEvent::Blur | CellEvent::KeyDown(Key::Enter) => self.commit(),
            CellEvent::KeyDown(Key::Escape) => self.cancel(),
            CellEvent::KeyDown(Key::Other) => {}
        }
    }

    fn column_kind(&self, field: &str) -> Option<FieldKind> {
        self.columns.iter().find(|c| c.field == field).map(|c| c.kind)
    }

    fn write_field(&mut self, item_id: &RowId, field: &str, value: Option<FieldValue>) -> bool {
        let Some(row) = self.rows.iter_mut().find(|row| &row.id == item_id) else {
            return false;
        };
        row.put(field, value);
        true
    }
}

impl std::fmt::Debug for EditableTableController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditableTableController")
            .field("columns", &self.columns)
            .field("rows", &self.rows)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
