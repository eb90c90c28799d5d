use approx::assert_abs_diff_eq;
use pretty_assertions::assert_eq;
use serde_json::json;
use tests::{headers, init_logger, natality_batch, registry, request_for_row};
use vbac_features::{
    Diagnostic, EncodeError, EncoderOptions, FieldBinding, OfflineEncoder, OnlineEncoder, RawTable,
    UnmappedCodePolicy,
};
use vbac_model::{train, ClassifierKind, ProbabilisticClassifier, TrainingOptions};
use vbac_schema::FieldKindTag;

#[test]
fn online_vector_matches_offline_row_for_every_field_kind() {
    init_logger();
    let registry = registry();
    let table = natality_batch(300, 11);
    let design = OfflineEncoder::new(&registry, EncoderOptions::default())
        .encode(&table)
        .unwrap();
    assert_eq!(design.report.rows_kept, 300);

    // every kind is represented in the final layout
    let kinds: Vec<FieldKindTag> = design
        .manifest
        .bindings()
        .filter(|(_, b)| !b.columns().is_empty())
        .map(|(_, b)| b.tag())
        .collect();
    for kind in [
        FieldKindTag::Numeric,
        FieldKindTag::BinaryFlag,
        FieldKindTag::CategoricalCode,
    ] {
        assert!(kinds.contains(&kind), "no bound {kind} field");
    }

    let encoder = OnlineEncoder::new(&design.manifest);
    for row in [0, 1, 57, 299] {
        let request = request_for_row(&registry, &table, row);
        let encoded = encoder.encode_json(&request).unwrap();
        assert!(encoded.diagnostics.is_empty(), "{:?}", encoded.diagnostics);
        assert_eq!(encoded.vector.len(), design.manifest.len());
        for (online, offline) in encoded.vector.as_slice().iter().zip(&design.rows[row]) {
            assert_abs_diff_eq!(*online, *offline, epsilon = 1e-9);
        }
    }
}

#[test]
fn scenario_record_against_natality_manifest() {
    let registry = registry();
    let design = OfflineEncoder::new(&registry, EncoderOptions::default())
        .encode(&natality_batch(300, 3))
        .unwrap();
    let manifest = &design.manifest;
    assert_eq!(manifest.index_of("Mothers_Race_Other"), None);

    let encoded = OnlineEncoder::new(manifest)
        .encode_json(&json!({
            "Mother's Age": 30,
            "Previous Preterm Birth": "No",
            "Mother's Race": "White"
        }))
        .unwrap();
    let v = encoded.vector.as_slice();
    let preterm = manifest.index_of("Previous_Preterm_Birth").unwrap();
    let white = manifest.index_of("Mothers_Race_White").unwrap();
    let age = manifest.index_of("Mothers_Age").unwrap();
    assert_eq!(v[preterm], 0.0);
    assert_eq!(v[white], 1.0);
    assert_eq!(v[age], 30.0);
    // nothing else in the race group is set
    let Some(FieldBinding::Categorical { indicators, .. }) = manifest.binding("Mother's Race")
    else {
        panic!("Mother's Race is not bound as categorical");
    };
    let set: Vec<&str> = indicators
        .iter()
        .filter(|(_, c)| v[*c] == 1.0)
        .map(|(l, _)| l.as_str())
        .collect();
    assert_eq!(set, ["White"]);
}

#[test]
fn encoding_is_deterministic() {
    let registry = registry();
    let table = natality_batch(250, 5);
    let encoder = OfflineEncoder::new(&registry, EncoderOptions::default());
    let a = encoder.encode(&table).unwrap();
    let b = encoder.encode(&table).unwrap();
    assert_eq!(a.manifest, b.manifest);
    assert_eq!(a.rows, b.rows);
}

#[test]
fn empty_batch_produces_no_manifest() {
    let registry = registry();
    let table = RawTable::new(headers(&registry));
    let err = OfflineEncoder::new(&registry, EncoderOptions::default())
        .encode(&table)
        .unwrap_err();
    assert!(matches!(err, EncodeError::EmptyBatch));
}

#[test]
fn constant_numeric_column_is_excluded() {
    let registry = registry();
    let mut table = natality_batch(200, 9);
    let col = table.column_index("Obstetric Estimate").unwrap();
    let mut constant = RawTable::new(table.headers().to_vec());
    for row in table.rows() {
        let mut row = row.clone();
        row[col] = "39".to_string();
        constant.push_row(row).unwrap();
    }
    table = constant;

    let design = OfflineEncoder::new(&registry, EncoderOptions::default())
        .encode(&table)
        .unwrap();
    assert_eq!(design.manifest.index_of("Obstetric_Estimate"), None);
    assert!(design
        .report
        .degenerate_columns
        .contains(&"Obstetric_Estimate".to_string()));
    assert!(matches!(
        design.manifest.binding("Obstetric Estimate"),
        Some(FieldBinding::Numeric { column: None, .. })
    ));
}

#[test]
fn unmapped_codes_dropped_or_bucketed() {
    let registry = registry();
    let table = natality_batch(120, 21);
    let race = table.column_index("Mother's Race").unwrap();
    let mut with_unknown = RawTable::new(table.headers().to_vec());
    for (i, row) in table.rows().iter().enumerate() {
        let mut row = row.clone();
        if i % 10 == 0 {
            row[race] = "8".to_string(); // not stated
        }
        with_unknown.push_row(row).unwrap();
    }

    let dropped = OfflineEncoder::new(&registry, EncoderOptions::default())
        .encode(&with_unknown)
        .unwrap();
    assert_eq!(dropped.report.rows_dropped_unmapped, 12);
    assert_eq!(dropped.n_rows(), 108);

    let options = EncoderOptions {
        unmapped_codes: UnmappedCodePolicy::Bucket,
        ..EncoderOptions::default()
    };
    let bucketed = OfflineEncoder::new(&registry, options)
        .encode(&with_unknown)
        .unwrap();
    assert_eq!(bucketed.n_rows(), 120);
    assert_eq!(bucketed.report.bucketed_cells, 12);
    let col = bucketed.manifest.index_of("Mothers_Race_Unmapped").unwrap();
    assert_eq!(bucketed.rows[0][col], 1.0);
    assert_eq!(bucketed.rows[1][col], 0.0);
}

#[test]
fn numeric_sentinels_do_not_shift_the_median() {
    let registry = registry();
    let table = natality_batch(101, 13);
    let bmi = table.column_index("Pre-pregnancy BMI").unwrap();
    let mut patched = RawTable::new(table.headers().to_vec());
    for (i, row) in table.rows().iter().enumerate() {
        let mut row = row.clone();
        row[bmi] = match i {
            0 => "99.9",
            1 => "31.0",
            _ => "25.0",
        }
        .to_string();
        patched.push_row(row).unwrap();
    }
    let design = OfflineEncoder::new(&registry, EncoderOptions::default())
        .encode(&patched)
        .unwrap();
    let imputed = &design.report.imputed["Pre-pregnancy BMI"];
    assert_eq!(imputed.cells, 1);
    assert_eq!(imputed.median, 25.0);
    let col = design.manifest.index_of("Pre_pregnancy_BMI").unwrap();
    assert_eq!(design.rows[0][col], 25.0);
}

#[test]
fn numeric_sentinels_are_not_stated_online() {
    init_logger();
    let registry = registry();
    let design = OfflineEncoder::new(&registry, EncoderOptions::default())
        .encode(&natality_batch(300, 3))
        .unwrap();
    let interval = design
        .manifest
        .index_of("Interval_Since_Last_Live_Birth")
        .unwrap();
    let encoder = OnlineEncoder::new(&design.manifest);
    for code in [json!(888), json!(999), json!("888")] {
        let encoded = encoder
            .encode_json(&json!({ "Interval Since Last Live Birth": code }))
            .unwrap();
        assert_eq!(encoded.vector.as_slice()[interval], 0.0);
        assert!(matches!(
            encoded.diagnostics.as_slice(),
            [Diagnostic::SentinelCode { field, .. }] if field == "Interval Since Last Live Birth"
        ));
    }
    let bmi = design.manifest.index_of("Pre_pregnancy_BMI").unwrap();
    let encoded = encoder
        .encode_json(&json!({ "Pre-pregnancy BMI": 99.9 }))
        .unwrap();
    assert_eq!(encoded.vector.as_slice()[bmi], 0.0);
    assert_eq!(encoded.diagnostics.len(), 1);
}

#[test]
fn single_outcome_class_is_degenerate() {
    let registry = registry();
    let table = natality_batch(50, 1);
    let outcome = table.column_index("Delivery Method").unwrap();
    let mut one_class = RawTable::new(table.headers().to_vec());
    for row in table.rows() {
        let mut row = row.clone();
        row[outcome] = "2".to_string();
        one_class.push_row(row).unwrap();
    }
    let err = OfflineEncoder::new(&registry, EncoderOptions::default())
        .encode(&one_class)
        .unwrap_err();
    assert!(matches!(err, EncodeError::DegenerateOutcome { classes: 1, .. }));
}

#[test]
fn missing_registry_column_is_a_schema_mismatch() {
    let registry = registry();
    let mut h = headers(&registry);
    h.retain(|name| name != "Hep C");
    let mut table = RawTable::new(h);
    table
        .push_row(vec!["0".to_string(); table.headers().len()])
        .unwrap();
    let err = OfflineEncoder::new(&registry, EncoderOptions::default())
        .encode(&table)
        .unwrap_err();
    assert!(matches!(err, EncodeError::MissingColumn(ref c) if c == "Hep C"));
}

#[test]
fn logistic_and_mlp_train_on_encoded_batch() {
    init_logger();
    let registry = registry();
    let design = OfflineEncoder::new(&registry, EncoderOptions::default())
        .encode(&natality_batch(500, 17))
        .unwrap();

    let logistic = train(&design, &TrainingOptions::default()).unwrap();
    assert_eq!(logistic.evaluation.train_rows + logistic.evaluation.test_rows, 500);
    assert!(logistic.evaluation.auroc > 0.6, "{:?}", logistic.evaluation);
    assert_eq!(logistic.artifact.manifest(), &design.manifest);

    let mut options = TrainingOptions {
        classifier: ClassifierKind::Mlp,
        ..TrainingOptions::default()
    };
    options.mlp.epochs = 20;
    options.mlp.batch_size = 64;
    let mlp = train(&design, &options).unwrap();
    assert_eq!(mlp.artifact.classifier().kind(), "multilayer_perceptron");
    assert_eq!(
        mlp.artifact.classifier().n_features(),
        design.manifest.len()
    );
    let p = mlp.artifact.predict(&vbac_features::FeatureVector::zeros(design.manifest.len()));
    assert!((0.0..=1.0).contains(&p.unwrap()));
}
