pub mod detection;
pub mod geometry;
pub mod gstreamer;
pub mod image_frame;
pub mod keys;
pub mod session;
