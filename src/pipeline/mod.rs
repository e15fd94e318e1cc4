// Write path: recording actions and committing them to the store.

pub mod approval;
pub mod retry;

pub use approval::{ApprovalPipeline, ApprovalRecord, DailyStats, RecordedAction};
pub use retry::RetryPolicy;
