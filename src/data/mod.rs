/// Data layer: core types, loading, filtering and analysis.
///
/// Architecture:
/// ```text
///  .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  stations + date interval → FilteredView ──► export
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ analysis  │  smoothing · stats · threshold per AnalysisRequest
///   └──────────┘
/// ```

pub mod analysis;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod smoothing;
pub mod stats;
pub mod threshold;
