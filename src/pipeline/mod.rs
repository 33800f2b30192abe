// Pipelines — file-level wiring of the topic and place passes.

pub mod places;
pub mod topics;
