pub mod batch;
pub mod pool;

pub use batch::{evaluate_catalog, evaluate_catalog_sequential, explain_catalog};
pub use pool::WorkerPool;
