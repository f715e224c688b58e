pub mod display;
pub mod render;
