mod common;

use common::*;
use serde_json::json;
use ttd_core::{
    DumpError, Scalar, TemplateNode, TextImportOptions, TypeRegistry, ValueKind, ValueNode,
    export_json, export_json_string, export_text, import_json, import_json_str, json_to_bytes,
    text_to_bytes, to_bytes, write_value,
};

fn hero_json() -> serde_json::Value {
    json!({
        "m_GameObject": { "m_FileID": 0, "m_PathID": -7 },
        "m_Enabled": 1,
        "m_Name": "Hero",
        "m_Items": { "Array": [ { "id": 1, "weight": 0.5 } ] },
        "m_Blob": { "Array": [7, 8] }
    })
}

#[test]
fn export_follows_template_order() {
    let t = base_template();
    let v = base_value(&t, "Hero", &[(1, 0.5)], &[7, 8]);
    let out = export_json(&v).unwrap();
    assert_eq!(out, hero_json());

    let keys: Vec<&str> = out.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["m_GameObject", "m_Enabled", "m_Name", "m_Items", "m_Blob"]
    );
}

#[test]
fn import_reproduces_encoder_bytes() {
    let t = base_template();
    let v = base_value(&t, "Hero", &[(1, 0.5)], &[7, 8]);
    let bytes = json_to_bytes(&t, &hero_json(), &TypeRegistry::new()).unwrap();
    assert_eq!(bytes, to_bytes(&v).unwrap());
}

#[test]
fn pretty_string_imports_back() {
    let t = base_template();
    let v = base_value(&t, "Hero", &[(1, 0.5), (2, 1.25)], &[1, 2, 3]);
    let text = export_json_string(&v).unwrap();
    assert!(text.contains('\n'));

    let mut sink = CountingSink::default();
    import_json_str(&t, &text, &TypeRegistry::new(), &mut sink).unwrap();
    assert_eq!(sink.inner.as_bytes(), to_bytes(&v).unwrap().as_slice());
}

#[test]
fn double_wrapped_arrays_accept_plain_json_arrays() {
    let t = base_template();
    let v = base_value(&t, "Hero", &[(1, 0.5)], &[7, 8]);
    let flat = json!({
        "m_GameObject": { "m_FileID": 0, "m_PathID": -7 },
        "m_Enabled": 1,
        "m_Name": "Hero",
        "m_Items": [ { "id": 1, "weight": 0.5 } ],
        "m_Blob": [7, 8]
    });
    let bytes = json_to_bytes(&t, &flat, &TypeRegistry::new()).unwrap();
    assert_eq!(bytes, to_bytes(&v).unwrap());
}

#[test]
fn skipped_wrapper_still_applies_its_own_alignment() {
    let t = std::sync::Arc::new(TemplateNode::structure(
        "Root",
        "Base",
        vec![
            TemplateNode::structure(
                "vector",
                "m_Bytes",
                vec![TemplateNode::array(scalar("UInt8", "data", ValueKind::UInt8))],
            )
            .aligned(),
        ],
    ));
    let wrapped = json_to_bytes(&t, &json!({ "m_Bytes": { "Array": [5] } }), &TypeRegistry::new())
        .unwrap();
    let plain = json_to_bytes(&t, &json!({ "m_Bytes": [5] }), &TypeRegistry::new()).unwrap();
    assert_eq!(wrapped, vec![1, 0, 0, 0, 5, 0, 0, 0]);
    assert_eq!(plain, wrapped);
}

#[test]
fn missing_field_names_parent() {
    let t = base_template();
    let mut doc = hero_json();
    doc.as_object_mut().unwrap().remove("m_Name");
    let err = json_to_bytes(&t, &doc, &TypeRegistry::new()).unwrap_err();
    match err {
        DumpError::MissingField {
            field,
            parent_type,
            parent_field,
        } => {
            assert_eq!(field, "m_Name");
            assert_eq!(parent_type, "MonoBehaviour");
            assert_eq!(parent_field, "Base");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn wrong_json_types_are_rejected() {
    let t = base_template();

    let mut doc = hero_json();
    doc["m_Enabled"] = json!(300);
    assert!(matches!(
        json_to_bytes(&t, &doc, &TypeRegistry::new()),
        Err(DumpError::InvalidJsonValue { ref field, .. }) if field == "m_Enabled"
    ));

    let mut doc = hero_json();
    doc["m_Blob"] = json!({ "Array": [1, -2] });
    assert!(matches!(
        json_to_bytes(&t, &doc, &TypeRegistry::new()),
        Err(DumpError::InvalidJsonValue { .. })
    ));
}

#[test]
fn null_string_imports_as_empty() {
    let t = base_template();
    let v = base_value(&t, "", &[(1, 0.5)], &[7, 8]);
    let mut doc = hero_json();
    doc["m_Name"] = serde_json::Value::Null;
    let bytes = json_to_bytes(&t, &doc, &TypeRegistry::new()).unwrap();
    assert_eq!(bytes, to_bytes(&v).unwrap());
}

#[test]
fn large_byte_array_matches_in_every_form() {
    let t = base_template();
    let blob: Vec<u8> = (0..1000).map(|i| (i % 256) as u8).collect();
    let v = base_value(&t, "Hero", &[], &blob);
    let expected = to_bytes(&v).unwrap();

    let dump = export_text(&v, None).unwrap();
    assert_eq!(dump.matches("0 UInt8 data = ").count(), 1000);
    assert!(dump.contains(" 1 Array Array (1000 items)\n"));
    assert_eq!(
        text_to_bytes(&dump, TextImportOptions::default()).unwrap(),
        expected
    );

    let doc = export_json(&v).unwrap();
    assert_eq!(doc["m_Blob"]["Array"].as_array().unwrap().len(), 1000);
    assert_eq!(json_to_bytes(&t, &doc, &TypeRegistry::new()).unwrap(), expected);
}

#[test]
fn float_survives_json_round_trip() {
    let t = base_template();
    let v = base_value(&t, "Hero", &[(1, 0.1)], &[]);
    let doc = export_json(&v).unwrap();
    assert_eq!(doc["m_Items"]["Array"][0]["weight"], json!(0.1));
    assert_eq!(json_to_bytes(&t, &doc, &TypeRegistry::new()).unwrap(), to_bytes(&v).unwrap());
}

#[test]
fn non_finite_floats_cannot_export() {
    let t = base_template();
    let v = base_value(&t, "Hero", &[(1, f32::NAN)], &[]);
    assert!(matches!(
        export_json(&v),
        Err(DumpError::NonFiniteFloat { ref field }) if field == "weight"
    ));
}

#[test]
fn json_import_aligns_like_the_encoder() {
    let t = base_template();
    let v = base_value(&t, "Hero", &[(1, 0.5), (2, 2.0)], &[7, 8, 9]);

    let mut encoded = CountingSink::default();
    write_value(&v, &mut encoded).unwrap();
    let mut imported = CountingSink::default();
    import_json(&t, &export_json(&v).unwrap(), &TypeRegistry::new(), &mut imported).unwrap();

    // m_Enabled, m_Name, both arrays
    assert_eq!(encoded.aligns, 4);
    assert_eq!(imported.align_positions, encoded.align_positions);
    assert_eq!(imported.inner.as_bytes(), encoded.inner.as_bytes());
}

#[test]
fn bool_and_wide_integers_import() {
    let t = std::sync::Arc::new(TemplateNode::structure(
        "Root",
        "Base",
        vec![
            scalar("bool", "on", ValueKind::Bool),
            scalar("UInt64", "big", ValueKind::UInt64),
            scalar("double", "ratio", ValueKind::Double),
        ],
    ));
    let v = ValueNode::with_children(
        &t,
        vec![
            leaf(&t, "on", Scalar::Bool(true)),
            leaf(&t, "big", Scalar::U64(u64::MAX)),
            leaf(&t, "ratio", Scalar::F64(-2.5)),
        ],
    );
    let doc = export_json(&v).unwrap();
    assert_eq!(doc, json!({ "on": true, "big": u64::MAX, "ratio": -2.5 }));
    assert_eq!(json_to_bytes(&t, &doc, &TypeRegistry::new()).unwrap(), to_bytes(&v).unwrap());
}
