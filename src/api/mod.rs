pub mod pipeline;

pub use pipeline::LandmarkPipeline;
