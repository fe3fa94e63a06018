pub mod batch;
pub mod detector;
pub mod landmark;
pub mod video;
