pub mod batch;
pub mod catalog;
pub mod config;
pub mod duration;
pub mod error;
pub mod projection;
pub mod types;

#[cfg(test)]
mod tests;

pub use batch::*;
pub use catalog::*;
pub use config::*;
pub use duration::*;
pub use error::*;
pub use projection::*;
pub use types::*;
