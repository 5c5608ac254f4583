pub mod classifier;
pub mod html;
pub mod normalizer;
pub mod schema;
pub mod table;

pub use classifier::{classify, strip_bom, Classification, NoDataReason};
pub use normalizer::{normalize, normalize_header};
pub use schema::{schema_for, CanonicalField, SourceSchema};
pub use table::{extract_table, TABLE_COLUMNS};
