//! Data layer: schema, loading, filtering and aggregation.
//!
//! Architecture:
//! ```text
//!  .parquet / .csv / .json
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  resolve columns (schema) → coerce cells → Vec<Record>
//!   └──────────┘
//!        │
//!        ▼
//!   ┌────────────┐
//!   │ DelayTable  │  immutable rows + station / category indices
//!   └────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  hour range ∧ origin ∧ category → FilteredTable (row indices)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ aggregate  │  stations · throughput · delay rates · hourly histogram
//!   └───────────┘
//! ```

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod schema;
