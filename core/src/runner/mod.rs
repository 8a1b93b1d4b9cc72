//! Producer/consumer orchestration: generation, verification, counting
//! and termination for one run.

pub mod cancel;
pub mod parallelism;
pub mod pipeline;
pub mod publisher;

pub use cancel::CancelToken;
pub use parallelism::ParallelismProfile;
pub use pipeline::{RunHandle, Runner};
pub use publisher::{CrackResult, ResultPublisher};
