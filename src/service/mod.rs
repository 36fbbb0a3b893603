pub mod batch;
pub mod executor;
pub mod scheduler;
pub mod statement;
