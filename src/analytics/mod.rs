// Comment analytics — event recording and the pure snapshot aggregator.
//
// Nothing in here touches the store or the clock; the approval pipeline
// supplies both.

pub mod aggregator;
pub mod event;
pub mod preferences;
pub mod snapshot;

pub use aggregator::{apply, roll_forward};
pub use event::{record, CommentEvent, Outcome, RawAction, VariantType};
pub use preferences::UserPreferences;
pub use snapshot::{AnalyticsSnapshot, DayEntry};
