pub mod chunking;
pub mod config;
pub mod error;
pub mod filter;
pub mod geo;
pub mod params;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
