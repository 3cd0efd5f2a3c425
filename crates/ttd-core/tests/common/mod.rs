#![allow(dead_code)]

use std::sync::Arc;

use ttd_core::{
    BinarySink, ByteWriter, ManagedReferencesRegistry, ReferencedObject, Scalar, TemplateNode,
    TypeReference, TypeRegistry, ValueKind, ValueNode,
};

/// Byte sink that also counts `align()` calls.
#[derive(Default)]
pub struct CountingSink {
    pub inner: ByteWriter,
    pub aligns: usize,
    pub align_positions: Vec<usize>,
}

impl BinarySink for CountingSink {
    fn write_u8(&mut self, v: u8) {
        self.inner.write_u8(v);
    }
    fn write_bytes(&mut self, data: &[u8]) {
        self.inner.write_bytes(data);
    }
    fn align(&mut self) {
        self.aligns += 1;
        self.align_positions.push(self.inner.position());
        self.inner.align();
    }
    fn position(&self) -> usize {
        self.inner.position()
    }
}

pub fn scalar(type_name: &str, field: &str, kind: ValueKind) -> TemplateNode {
    TemplateNode::new(type_name, field, kind)
}

pub fn string_field(field: &str) -> TemplateNode {
    TemplateNode::new("string", field, ValueKind::String)
}

/// `vector field` wrapping an aligned `Array Array` of `element`.
pub fn vector(field: &str, element: TemplateNode) -> TemplateNode {
    TemplateNode::structure("vector", field, vec![TemplateNode::array(element).aligned()])
}

pub fn child(t: &Arc<TemplateNode>, name: &str) -> Arc<TemplateNode> {
    match t.child(name) {
        Some(c) => Arc::clone(c),
        None => panic!("template {} has no field {}", t.field_name, name),
    }
}

pub fn leaf(t: &Arc<TemplateNode>, name: &str, v: Scalar) -> ValueNode {
    ValueNode::scalar(&child(t, name), v)
}

/// MonoBehaviour-like schema used by most tests:
///
/// ```text
/// Base
///   PPtr<GameObject> m_GameObject { int m_FileID, SInt64 m_PathID }
///   UInt8 m_Enabled (aligned)
///   string m_Name
///   vector m_Items > Array Array of Item { int id, float weight }
///   vector m_Blob  > Array Array of UInt8 (byte array)
/// ```
pub fn base_template() -> Arc<TemplateNode> {
    let pptr = TemplateNode::structure(
        "PPtr<GameObject>",
        "m_GameObject",
        vec![
            scalar("int", "m_FileID", ValueKind::Int32),
            scalar("SInt64", "m_PathID", ValueKind::Int64),
        ],
    );
    let item = TemplateNode::structure(
        "Item",
        "data",
        vec![
            scalar("int", "id", ValueKind::Int32),
            scalar("float", "weight", ValueKind::Float),
        ],
    );
    let blob = TemplateNode::structure(
        "vector",
        "m_Blob",
        vec![TemplateNode::byte_array().aligned()],
    );
    Arc::new(TemplateNode::structure(
        "MonoBehaviour",
        "Base",
        vec![
            pptr,
            scalar("UInt8", "m_Enabled", ValueKind::UInt8).aligned(),
            string_field("m_Name"),
            vector("m_Items", item),
            blob,
        ],
    ))
}

pub fn base_value(t: &Arc<TemplateNode>, name: &str, items: &[(i32, f32)], blob: &[u8]) -> ValueNode {
    let pptr_t = child(t, "m_GameObject");
    let pptr = ValueNode::with_children(
        &pptr_t,
        vec![
            leaf(&pptr_t, "m_FileID", Scalar::I32(0)),
            leaf(&pptr_t, "m_PathID", Scalar::I64(-7)),
        ],
    );

    let items_t = child(t, "m_Items");
    let arr_t = Arc::clone(&items_t.children[0]);
    let item_t = Arc::clone(&arr_t.children[1]);
    let elements = items
        .iter()
        .map(|(id, w)| {
            ValueNode::with_children(
                &item_t,
                vec![
                    leaf(&item_t, "id", Scalar::I32(*id)),
                    leaf(&item_t, "weight", Scalar::F32(*w)),
                ],
            )
        })
        .collect();
    let items_v =
        ValueNode::with_children(&items_t, vec![ValueNode::with_children(&arr_t, elements)]);

    let blob_t = child(t, "m_Blob");
    let blob_v = ValueNode::with_children(
        &blob_t,
        vec![ValueNode::bytes(&blob_t.children[0], blob.to_vec())],
    );

    ValueNode::with_children(
        t,
        vec![
            pptr,
            leaf(t, "m_Enabled", Scalar::U8(1)),
            leaf(t, "m_Name", Scalar::String(name.to_string())),
            items_v,
            blob_v,
        ],
    )
}

pub fn weapon_type() -> TypeReference {
    TypeReference::new("Weapon", "Game.Items", "Assembly-CSharp")
}

pub fn shield_type() -> TypeReference {
    TypeReference::new("Shield", "Game.Items", "Assembly-CSharp")
}

/// Resolver with `Weapon { int damage, string label }` and `Shield { float armor }`.
pub fn managed_types() -> TypeRegistry {
    let mut reg = TypeRegistry::new();
    reg.insert(
        weapon_type(),
        TemplateNode::structure(
            "Weapon",
            "data",
            vec![scalar("int", "damage", ValueKind::Int32), string_field("label")],
        ),
    );
    reg.insert(
        shield_type(),
        TemplateNode::structure("Shield", "data", vec![scalar("float", "armor", ValueKind::Float)]),
    );
    reg
}

/// `Holder { UInt8 m_Flag (aligned), ManagedReferencesRegistry references }`.
pub fn holder_template() -> Arc<TemplateNode> {
    Arc::new(TemplateNode::structure(
        "Holder",
        "Base",
        vec![
            scalar("UInt8", "m_Flag", ValueKind::UInt8).aligned(),
            scalar(
                "ManagedReferencesRegistry",
                "references",
                ValueKind::ManagedReferencesRegistry,
            ),
        ],
    ))
}

pub fn weapon(reg: &TypeRegistry, rid: i64, damage: i32, label: &str) -> ReferencedObject {
    use ttd_core::TypeResolver;
    let t = reg.resolve(&weapon_type()).expect("weapon template");
    let data = ValueNode::with_children(
        &t,
        vec![
            leaf(&t, "damage", Scalar::I32(damage)),
            leaf(&t, "label", Scalar::String(label.to_string())),
        ],
    );
    ReferencedObject {
        rid,
        type_ref: weapon_type(),
        data: Some(data),
    }
}

pub fn shield(reg: &TypeRegistry, rid: i64, armor: f32) -> ReferencedObject {
    use ttd_core::TypeResolver;
    let t = reg.resolve(&shield_type()).expect("shield template");
    let data = ValueNode::with_children(&t, vec![leaf(&t, "armor", Scalar::F32(armor))]);
    ReferencedObject {
        rid,
        type_ref: shield_type(),
        data: Some(data),
    }
}

pub fn holder_value(t: &Arc<TemplateNode>, version: i32, references: Vec<ReferencedObject>) -> ValueNode {
    let registry_t = child(t, "references");
    ValueNode::with_children(
        t,
        vec![
            leaf(t, "m_Flag", Scalar::U8(3)),
            ValueNode::registry(
                &registry_t,
                ManagedReferencesRegistry {
                    version,
                    references,
                },
            ),
        ],
    )
}
