pub mod summary;

pub use summary::{write_result, write_summary, BatchSummary};
