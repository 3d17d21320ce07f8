pub mod ingest;
pub mod serve;
pub mod top_operators;

pub use ingest::{DataFiles, handle_ingest};
pub use serve::handle_serve;
pub use top_operators::handle_top_operators;
