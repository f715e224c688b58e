//! Headless run monitor shell: wires the monitor state machine to the
//! calculation engine, the lease registry and a terminal display.
mod platform;

pub use platform::*;
