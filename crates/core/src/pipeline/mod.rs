//! The request pipeline: one stream request in, a ranked stream list out.

mod resolve;

pub use resolve::{PipelineConfig, StreamPipeline};
