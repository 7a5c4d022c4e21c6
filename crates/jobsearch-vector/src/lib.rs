pub mod schema;
pub mod table;
pub mod prefilter;
pub mod writer;
pub mod decode;
pub mod store;
pub mod index_build;

pub use store::LanceJobStore;
pub use writer::JobWriter;
