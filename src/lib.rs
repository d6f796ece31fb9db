#![warn(clippy::pedantic, clippy::nursery)]
pub mod core;
