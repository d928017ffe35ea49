/// Lap-time comparison: fetch, aggregate, chart, serve.
///
/// ```text
///  LapConfig (races × seasons × drivers)
///        │
///        ▼
///   ┌────────────┐
///   │ telemetry   │  LapSource → Vec<LapRecord>   (OpenF1 + disk cache)
///   └────────────┘
///        │  one blocking call per race per season
///        ▼
///   ┌────────────┐
///   │ aggregate   │  LapAggregation, per-race failures kept as markers
///   └────────────┘
///        │
///        ▼
///   ┌────────────┐      ┌────────────┐
///   │  render     │ ───► │  server     │  dropdown → render → export
///   └────────────┘      └────────────┘
/// ```

pub mod aggregate;
pub mod config;
pub mod model;
pub mod render;
pub mod server;
pub mod telemetry;
