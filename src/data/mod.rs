/// Data layer for the site-options dashboard: types, loading, selection, costs.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → OptionTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │  OptionTable  │  Vec<DevelopmentOption>, name index
///   └──────────────┘
///        │  select(name)
///        ▼
///   ┌──────────┐   ┌──────────┐
///   │ metrics   │   │  cost     │  formatted values / derived cost split
///   └──────────┘   └──────────┘
/// ```

pub mod cost;
pub mod loader;
pub mod metrics;
pub mod model;
