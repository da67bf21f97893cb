// Feature pipeline
// Per-video activation extraction with an on-disk cache, followed by
// standardized principal-component reduction.

pub mod extract;
pub mod reduce;
