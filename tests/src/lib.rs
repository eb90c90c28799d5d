//! Shared fixtures: synthetic natality batches and their request-side records.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Number, Value};
use vbac_features::{EncoderOptions, OfflineEncoder, RawTable};
use vbac_model::{train, ModelArtifact, TrainingOptions};
use vbac_schema::{FieldKind, SchemaRegistry};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn registry() -> SchemaRegistry {
    SchemaRegistry::natality().unwrap()
}

/// Header row: every registry field followed by the outcome column
pub fn headers(registry: &SchemaRegistry) -> Vec<String> {
    let mut h: Vec<String> = registry.fields().iter().map(|f| f.name.clone()).collect();
    h.push(registry.outcome().name.clone());
    h
}

const RACE_CODES: [&str; 7] = ["1", "2", "3", "4", "5", "6", "7"];
const EDUCATION_CODES: [&str; 8] = ["1", "2", "3", "4", "5", "6", "7", "8"];
const PAYMENT_CODES: [&str; 7] = ["1", "2", "3", "4", "5", "6", "8"];

fn flag(rng: &mut StdRng, p: f64) -> String {
    let code = if rng.gen_bool(p) { "Y" } else { "N" };
    code.to_string()
}

/// A clean synthetic batch with no sentinel or unmapped codes; the outcome
/// depends on age, prior cesareans, prior live births and BMI.
pub fn natality_batch(rows: usize, seed: u64) -> RawTable {
    let registry = registry();
    let mut table = RawTable::new(headers(&registry));
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..rows {
        let age: u32 = rng.gen_range(18..45);
        let living: u32 = rng.gen_range(0..5);
        let dead: u32 = if rng.gen_bool(0.05) { 1 } else { 0 };
        let interval: u32 = rng.gen_range(12..120);
        let visits: u32 = rng.gen_range(4..20);
        let smokes = rng.gen_bool(0.1);
        let cig_before: u32 = if smokes { rng.gen_range(1..20) } else { 0 };
        let tri = |rng: &mut StdRng| -> u32 {
            if smokes && rng.gen_bool(0.5) {
                rng.gen_range(1..10)
            } else {
                0
            }
        };
        let (t1, t2, t3) = (tri(&mut rng), tri(&mut rng), tri(&mut rng));
        let bmi: f64 = (rng.gen_range(180..450) as f64) / 10.0;
        let gain: u32 = rng.gen_range(0..60);
        let cesareans: u32 = rng.gen_range(1..4);
        let estimate: u32 = rng.gen_range(34..42);

        let mut row = vec![
            age.to_string(),
            living.to_string(),
            dead.to_string(),
            interval.to_string(),
            visits.to_string(),
            cig_before.to_string(),
            t1.to_string(),
            t2.to_string(),
            t3.to_string(),
            format!("{bmi:.1}"),
            gain.to_string(),
            cesareans.to_string(),
            estimate.to_string(),
        ];
        for p in [0.02, 0.08, 0.03, 0.07, 0.1, 0.01, 0.01, 0.03, 0.01, 0.01] {
            row.push(flag(&mut rng, p));
        }
        row.push(RACE_CODES[rng.gen_range(0..RACE_CODES.len())].to_string());
        row.push(EDUCATION_CODES[rng.gen_range(0..EDUCATION_CODES.len())].to_string());
        row.push(PAYMENT_CODES[rng.gen_range(0..PAYMENT_CODES.len())].to_string());

        let z = 1.2 - 0.06 * (age as f64 - 30.0) - 0.9 * (cesareans as f64 - 1.0)
            + 0.4 * living as f64
            - 0.05 * (bmi - 27.0);
        let p = 1.0 / (1.0 + (-z).exp());
        row.push(if rng.gen_bool(p) { "2" } else { "4" }.to_string());

        table.push_row(row).unwrap();
    }
    table
}

/// Request body equivalent to a batch row: numbers for numeric fields and
/// labels for flags and categories.
pub fn request_for_row(registry: &SchemaRegistry, table: &RawTable, row: usize) -> Value {
    let mut map = Map::new();
    for field in registry.fields() {
        let col = table.column_index(&field.name).unwrap();
        let Some(cell) = table.cell(row, col) else {
            continue;
        };
        let value = match &field.kind {
            FieldKind::Numeric(_) => {
                Value::Number(Number::from_f64(cell.parse::<f64>().unwrap()).unwrap())
            }
            FieldKind::BinaryFlag(spec) => {
                let label = if cell == spec.true_code {
                    &spec.true_label
                } else {
                    &spec.false_label
                };
                Value::String(label.clone())
            }
            FieldKind::CategoricalCode(spec) => {
                Value::String(spec.label_for(cell).unwrap().to_string())
            }
        };
        map.insert(field.name.clone(), value);
    }
    Value::Object(map)
}

/// Encode a fixture batch and fit the default logistic model on it
pub fn trained_artifact() -> ModelArtifact {
    let registry = registry();
    let design = OfflineEncoder::new(&registry, EncoderOptions::default())
        .encode(&natality_batch(400, 7))
        .unwrap();
    train(&design, &TrainingOptions::default()).unwrap().artifact
}
