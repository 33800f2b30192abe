// Geocoder post-processing — mentions, per-place weights and the
// origin -> place edge graph.

pub mod edges;
pub mod mentions;
pub mod signals;
