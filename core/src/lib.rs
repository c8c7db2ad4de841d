pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod self_check;
pub mod util;
pub mod youtube;
