//! Schema registry for the VBAC prediction pipeline.
//!
//! Describes every raw natality field the pipeline understands: its kind (numeric,
//! coded categorical, yes/no flag), its literal code vocabulary, sentinel codes and the
//! feature-column names it derives. The registry is static configuration; both the
//! offline and online encoders read the same instance.
//!
//! ```
//! use vbac_schema::{FieldKindTag, SchemaRegistry};
//! let registry = SchemaRegistry::natality().unwrap();
//! let race = registry.get("Mother's Race").unwrap();
//! assert_eq!(race.tag(), FieldKindTag::CategoricalCode);
//! assert!(registry.get("Father's Age").is_none());
//! ```

pub mod error;
pub mod field;
pub mod naming;
pub mod natality;
pub mod registry;

pub use error::SchemaError;
pub use field::{
    CategoricalSpec, CodeLabel, FieldDescriptor, FieldKind, FieldKindTag, FlagSpec, NumericSpec,
};
pub use naming::{column_name, indicator_name};
pub use natality::NATALITY_SCHEMA_VERSION;
pub use registry::{OutcomeSpec, SchemaRegistry};
