//! Hand-authored registry for the cleaned natality corpus.
//!
//! Codes follow the public-use natality file layout. Sentinel codes mark
//! "unknown / not stated" values; ingestion normally removes those rows already.

use crate::error::SchemaError;
use crate::field::FieldDescriptor;
use crate::registry::{OutcomeSpec, SchemaRegistry};

/// Version recorded in every feature manifest built from this registry
pub const NATALITY_SCHEMA_VERSION: &str = "natality-2017-2023.1";

pub const OUTCOME_FIELD: &str = "Delivery Method";
/// Delivery method code for vaginal birth (after cesarean)
pub const VBAC_CODE: &str = "2";
/// Delivery method code for repeat cesarean
pub const REPEAT_CESAREAN_CODE: &str = "4";

const NUMERIC_FIELDS: &[(&str, &[&str])] = &[
    ("Mother's Age", &[]),
    ("Prior Births Now Living", &["99"]),
    ("Prior Births Now Dead", &["99"]),
    ("Interval Since Last Live Birth", &["888", "999"]),
    ("Number of Prenatal Visits", &["99"]),
    ("Cigarettes Before Pregnancy", &["99"]),
    ("1st Tri Cigarettes", &["99"]),
    ("2nd Tri Cigarettes", &["99"]),
    ("3rd Tri Cigarettes", &["99"]),
    ("Pre-pregnancy BMI", &["99.9"]),
    ("Weight Gain", &["99"]),
    ("Number of Previous Cesareans", &["99"]),
    ("Obstetric Estimate", &["99"]),
];

const FLAG_FIELDS: &[&str] = &[
    "Pre-pregnancy Diabetes",
    "Gestational Diabetes",
    "Pre-pregnancy HTN",
    "Gestational HTN",
    "Previous Preterm Birth",
    "Gonorrhea",
    "Syphilis",
    "Chlamydia",
    "Hep B",
    "Hep C",
];

const RACE_CODES: &[(&str, &str)] = &[
    ("1", "White"),
    ("2", "Black"),
    ("3", "AIAN"),
    ("4", "Asian"),
    ("5", "NHOPI"),
    ("6", "Other"),
    ("7", "Hispanic"),
];

const EDUCATION_CODES: &[(&str, &str)] = &[
    ("1", "8th Grade or Less"),
    ("2", "Some High School"),
    ("3", "High School/GED"),
    ("4", "College Credit"),
    ("5", "Associate"),
    ("6", "Bachelors"),
    ("7", "Masters"),
    ("8", "Doctorate"),
];

const PAYMENT_CODES: &[(&str, &str)] = &[
    ("1", "Medicaid"),
    ("2", "Private Insurance"),
    ("3", "Self-Pay"),
    ("4", "Indian Health Service"),
    ("5", "CHAMPUS/TRICARE"),
    ("6", "Other Government"),
    ("8", "Other"),
];

impl SchemaRegistry {
    /// The registry shared by training and serving
    pub fn natality() -> Result<Self, SchemaError> {
        let mut fields = Vec::with_capacity(NUMERIC_FIELDS.len() + FLAG_FIELDS.len() + 3);
        for (name, sentinels) in NUMERIC_FIELDS {
            fields.push(FieldDescriptor::numeric(name, sentinels));
        }
        for name in FLAG_FIELDS {
            fields.push(FieldDescriptor::flag(name));
        }
        fields.push(FieldDescriptor::categorical(
            "Mother's Race",
            RACE_CODES,
            "Other",
            &["8"],
        ));
        fields.push(FieldDescriptor::categorical(
            "Mother's Education",
            EDUCATION_CODES,
            "8th Grade or Less",
            &["9"],
        ));
        fields.push(FieldDescriptor::categorical(
            "Payment Method",
            PAYMENT_CODES,
            "Private Insurance",
            &["9"],
        ));

        SchemaRegistry::new(
            NATALITY_SCHEMA_VERSION,
            fields,
            OutcomeSpec {
                name: OUTCOME_FIELD.into(),
                positive_code: VBAC_CODE.into(),
                negative_codes: vec![REPEAT_CESAREAN_CODE.into()],
            },
        )
    }
}
