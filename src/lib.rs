// Strata: time-bucketed topic and place signals for corpus visualization
//
// This is the library root. Annotator output comes in through the topic and
// place modules, gets bucketed by year, aggregated, summarized, and leaves
// through output as a cache snapshot plus a rendering payload.

pub mod batch;
pub mod buckets;
pub mod config;
pub mod corpus;
pub mod output;
pub mod pipeline;
pub mod places;
pub mod topics;
