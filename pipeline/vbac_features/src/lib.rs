//! Feature encoding for VBAC prediction.
//!
//! Two encoders share one contract, the [`FeatureManifest`]:
//! - [`OfflineEncoder`] turns a batch of raw natality rows into a design matrix and
//!   produces the manifest (ordered column names plus explicit field bindings).
//! - [`OnlineEncoder`] turns one request record into a vector laid out by that same
//!   manifest, without any access to the training batch.
//!
//! ```
//! use serde_json::json;
//! use vbac_features::{EncoderOptions, OfflineEncoder, OnlineEncoder, RawTable};
//! use vbac_schema::SchemaRegistry;
//!
//! let registry = SchemaRegistry::natality().unwrap();
//! let mut header: Vec<String> = registry.fields().iter().map(|f| f.name.clone()).collect();
//! header.push("Delivery Method".into());
//! let mut table = RawTable::new(header);
//! let rows = [
//!     ["30", "1", "0", "24", "12", "0", "0", "0", "0", "25.1", "20", "1", "39",
//!      "N", "N", "N", "N", "N", "N", "N", "N", "N", "N", "1", "6", "3", "2"],
//!     ["35", "2", "0", "36", "10", "5", "0", "0", "0", "31.0", "12", "2", "38",
//!      "Y", "N", "Y", "N", "Y", "N", "N", "N", "N", "N", "2", "3", "1", "4"],
//! ];
//! for row in rows {
//!     table.push_row(row.iter().map(|s| s.to_string()).collect()).unwrap();
//! }
//! let design = OfflineEncoder::new(&registry, EncoderOptions::default())
//!     .encode(&table)
//!     .unwrap();
//! let encoded = OnlineEncoder::new(&design.manifest)
//!     .encode_json(&json!({ "Mother's Age": 30, "Mother's Race": "White" }))
//!     .unwrap();
//! assert_eq!(encoded.vector.len(), design.manifest.len());
//! ```

pub mod error;
pub mod manifest;
pub mod offline;
pub mod online;
pub mod raw;
mod stats;

pub use error::{EncodeError, ManifestError};
pub use manifest::{FeatureManifest, FieldBinding};
pub use offline::{
    CorrelatedDrop, DesignMatrix, EncoderOptions, EncodingReport, Imputation, OfflineEncoder,
    UnmappedCodePolicy, DEFAULT_CORRELATION_THRESHOLD, UNMAPPED_LABEL,
};
pub use online::{absent, Diagnostic, Encoded, FeatureVector, OnlineEncoder};
pub use raw::{RawRecord, RawTable, RawValue};
