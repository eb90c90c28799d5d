use std::fs;

use pretty_assertions::assert_eq;
use tempfile::tempdir;
use tests::{headers, natality_batch, registry, request_for_row, trained_artifact};
use vbac_features::{EncoderOptions, OfflineEncoder, RawTable};
use vbac_model::{ArtifactError, ModelArtifact};

#[test]
fn csv_batch_round_trips_through_a_file() {
    let registry = registry();
    let table = natality_batch(60, 4);
    let dir = tempdir().unwrap();
    let path = dir.path().join("natality.csv");

    let mut csv = headers(&registry)
        .iter()
        .map(|h| format!("\"{h}\""))
        .collect::<Vec<_>>()
        .join(",");
    csv.push('\n');
    for row in table.rows() {
        csv.push_str(&row.join(","));
        csv.push('\n');
    }
    fs::write(&path, csv).unwrap();

    let loaded = RawTable::from_csv_path(&path).unwrap();
    assert_eq!(loaded.headers(), table.headers());
    assert_eq!(loaded.rows(), table.rows());
}

#[test]
fn served_artifact_scores_like_the_trained_one() {
    let registry = registry();
    let artifact = trained_artifact();
    let dir = tempdir().unwrap();
    let path = dir.path().join("models/vbac_model.json");
    artifact.save(&path).unwrap();

    let loaded = ModelArtifact::load_validated(&path, &registry).unwrap();
    assert_eq!(loaded.manifest(), artifact.manifest());

    let table = natality_batch(5, 99);
    for row in 0..table.len() {
        let request = request_for_row(&registry, &table, row);
        let a = artifact.encoder().encode_json(&request).unwrap();
        let b = loaded.encoder().encode_json(&request).unwrap();
        assert_eq!(a.vector, b.vector);
        assert_eq!(
            artifact.assess(&a.vector).unwrap(),
            loaded.assess(&b.vector).unwrap()
        );
    }
}

#[test]
fn artifact_without_manifest_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.json");
    trained_artifact().save(&path).unwrap();

    let mut doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    doc.as_object_mut().unwrap().remove("manifest");
    fs::write(&path, doc.to_string()).unwrap();

    assert!(matches!(
        ModelArtifact::load_validated(&path, &registry()),
        Err(ArtifactError::Decode(_))
    ));
}

#[test]
fn corrupt_artifact_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.json");
    fs::write(&path, "{\"metadata\": ").unwrap();
    assert!(matches!(
        ModelArtifact::load(&path),
        Err(ArtifactError::Decode(_))
    ));
}

#[test]
fn out_of_range_binding_is_rejected_at_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.json");
    let mut doc = serde_json::to_value(trained_artifact()).unwrap();
    doc["manifest"]["bindings"]["Mother's Age"]["column"] = serde_json::json!(999);
    fs::write(&path, doc.to_string()).unwrap();

    assert!(matches!(
        ModelArtifact::load_validated(&path, &registry()),
        Err(ArtifactError::Decode(_))
    ));
}

#[test]
fn manifest_is_validated_against_the_registry() {
    let registry = registry();
    let design = OfflineEncoder::new(&registry, EncoderOptions::default())
        .encode(&natality_batch(200, 8))
        .unwrap();
    assert!(design.manifest.validate_against(&registry).is_ok());
}
