pub mod job_failed;

pub use job_failed::*;
