use super::*;

// =============================================================================
// FieldValue::coerce
// =============================================================================

#[test]
fn coerce_number_parses_numeric_text() {
    assert_eq!(FieldValue::from(" 12.5 ").coerce(FieldKind::Number), FieldValue::Number(12.5));
    assert_eq!(FieldValue::from("-3").coerce(FieldKind::Number), FieldValue::Number(-3.0));
}

#[test]
fn coerce_number_non_numeric_becomes_zero() {
    assert_eq!(FieldValue::from("twelve").coerce(FieldKind::Number), FieldValue::Number(0.0));
    assert_eq!(FieldValue::from("").coerce(FieldKind::Number), FieldValue::Number(0.0));
    assert_eq!(FieldValue::from("NaN").coerce(FieldKind::Number), FieldValue::Number(0.0));
    assert_eq!(FieldValue::Number(f64::INFINITY).coerce(FieldKind::Number), FieldValue::Number(0.0));
}

#[test]
fn coerce_text_formats_numbers() {
    assert_eq!(FieldValue::Number(42.0).coerce(FieldKind::Text), FieldValue::from("42"));
    assert_eq!(FieldValue::Number(1.5).coerce(FieldKind::Text), FieldValue::from("1.5"));
    assert_eq!(FieldValue::from("as is").coerce(FieldKind::Text), FieldValue::from("as is"));
}

#[test]
fn accessors_match_variant() {
    assert_eq!(FieldValue::from(3).as_number(), Some(3.0));
    assert_eq!(FieldValue::from(3).as_text(), None);
    assert_eq!(FieldValue::from("x").as_text(), Some("x"));
    assert_eq!(FieldValue::from("x").as_number(), None);
}

// =============================================================================
// Row
// =============================================================================

#[test]
fn row_put_none_removes_field() {
    let mut row = Row::new(1).with("notes", "rush");
    row.put("notes", None);
    assert!(row.get("notes").is_none());
    row.put("notes", Some("later".into()));
    assert_eq!(row.get("notes"), Some(&FieldValue::from("later")));
}

#[test]
fn row_serializes_flat() {
    let row = Row::new("PO-17").with("customer", "Acme").with("qty", 3);
    let json = serde_json::to_value(&row).unwrap();
    assert_eq!(json, serde_json::json!({"id": "PO-17", "customer": "Acme", "qty": 3.0}));

    let parsed: Row = serde_json::from_value(serde_json::json!({"id": 9, "qty": 2, "customer": "Zed"})).unwrap();
    assert_eq!(parsed.id, RowId::Int(9));
    assert_eq!(parsed.get("qty"), Some(&FieldValue::Number(2.0)));
    assert_eq!(parsed.get("customer"), Some(&FieldValue::from("Zed")));
}

#[test]
fn row_id_display() {
    assert_eq!(RowId::from(12).to_string(), "12");
    assert_eq!(RowId::from("INV-3").to_string(), "INV-3");
}
