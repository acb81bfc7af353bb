pub mod camera;
pub mod detection;
pub mod errors;
pub mod upload;
pub mod report;
