pub mod schema;
pub mod index;
pub mod query;
pub mod search;
pub mod autocomplete;

pub use index::JobTextIndex;
