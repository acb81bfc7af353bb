pub mod api;
pub mod http;
pub mod render;
pub mod terminal;
pub mod v4l2;
