/// Data layer: core types, loading, labelling and grouping.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv        SQL query (db)
///        │                             │
///        ▼                             ▼
///   ┌──────────┐               ┌──────────────┐
///   │  loader   │──────────────▶│   Dataset     │  Vec<Observation>, column order
///   └──────────┘               └──────────────┘
///                                   │       │
///                     ┌─────────────┘       └────────────┐
///                     ▼                                  ▼
///               ┌──────────┐                      ┌───────────┐
///               │  label    │  viewing status      │ partition  │ → GroupSample per label
///               └──────────┘                      └───────────┘
///                                                        │
///                                                        ▼
///                                                  ┌──────────┐
///                                                  │ summary   │  histogram bins, counts
///                                                  └──────────┘
/// ```

pub mod label;
pub mod loader;
pub mod model;
pub mod partition;
pub mod summary;
