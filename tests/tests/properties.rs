use std::sync::OnceLock;

use proptest::prelude::*;
use serde_json::{Map, Value};
use tests::{natality_batch, registry};
use vbac_features::{DesignMatrix, EncoderOptions, FieldBinding, OfflineEncoder, OnlineEncoder};
use vbac_schema::{FieldKind, SchemaRegistry};

fn fixture() -> &'static (SchemaRegistry, DesignMatrix) {
    static FIXTURE: OnceLock<(SchemaRegistry, DesignMatrix)> = OnceLock::new();
    FIXTURE.get_or_init(|| {
        let registry = registry();
        let design = OfflineEncoder::new(&registry, EncoderOptions::default())
            .encode(&natality_batch(300, 11))
            .unwrap();
        (registry, design)
    })
}

/// One arbitrary value per registry field; variant 0 leaves the field out
type Draw = (u8, f64, String, usize);

fn record_from(registry: &SchemaRegistry, draws: &[Draw]) -> (Value, Vec<String>) {
    let mut map = Map::new();
    let mut absent = Vec::new();
    for (field, (variant, x, s, pick)) in registry.fields().iter().zip(draws) {
        let value = match variant {
            0 => {
                absent.push(field.name.clone());
                continue;
            }
            1 => serde_json::json!(x),
            2 => Value::String(s.clone()),
            3 => Value::Bool(*pick % 2 == 0),
            4 => Value::Null,
            _ => match &field.kind {
                FieldKind::Numeric(_) => Value::String(format!("{x}")),
                FieldKind::BinaryFlag(spec) => Value::String(if *pick % 2 == 0 {
                    spec.true_label.clone()
                } else {
                    spec.false_label.clone()
                }),
                FieldKind::CategoricalCode(spec) => {
                    let labels = spec.labels();
                    Value::String(labels[*pick % labels.len()].to_string())
                }
            },
        };
        if value.is_null() {
            absent.push(field.name.clone());
        }
        map.insert(field.name.clone(), value);
    }
    (Value::Object(map), absent)
}

fn draws() -> impl Strategy<Value = Vec<Draw>> {
    proptest::collection::vec(
        (0u8..6, -100.0f64..100.0, "[A-Za-z /-]{0,10}", 0usize..16),
        26,
    )
}

proptest! {
    #[test]
    fn vector_length_matches_manifest(draws in draws()) {
        let (registry, design) = fixture();
        let (record, _) = record_from(registry, &draws);
        let encoded = OnlineEncoder::new(&design.manifest).encode_json(&record).unwrap();
        prop_assert_eq!(encoded.vector.len(), design.manifest.len());
    }

    #[test]
    fn absent_fields_encode_as_zero(draws in draws()) {
        let (registry, design) = fixture();
        let (record, absent) = record_from(registry, &draws);
        let encoded = OnlineEncoder::new(&design.manifest).encode_json(&record).unwrap();
        for name in &absent {
            let binding = design.manifest.binding(name).unwrap();
            for col in binding.columns() {
                prop_assert_eq!(encoded.vector.as_slice()[col], 0.0);
            }
        }
    }

    #[test]
    fn encoding_is_bit_identical_on_repeat(draws in draws()) {
        let (registry, design) = fixture();
        let (record, _) = record_from(registry, &draws);
        let encoder = OnlineEncoder::new(&design.manifest);
        let a = encoder.encode_json(&record).unwrap();
        let b = encoder.encode_json(&record).unwrap();
        let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        prop_assert_eq!(bits(a.vector.as_slice()), bits(b.vector.as_slice()));
        prop_assert_eq!(a.diagnostics, b.diagnostics);
    }

    #[test]
    fn at_most_one_indicator_per_categorical_field(draws in draws()) {
        let (registry, design) = fixture();
        let (record, _) = record_from(registry, &draws);
        let encoded = OnlineEncoder::new(&design.manifest).encode_json(&record).unwrap();
        for (_, binding) in design.manifest.bindings() {
            if let FieldBinding::Categorical { indicators, .. } = binding {
                let set = indicators
                    .iter()
                    .filter(|(_, c)| encoded.vector.as_slice()[*c] != 0.0)
                    .count();
                prop_assert!(set <= 1);
            }
        }
    }
}
