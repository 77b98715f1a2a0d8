mod agent;
mod diff;
mod phase;
mod review;
mod task;
mod ticket;
mod workflow;

pub use agent::*;
pub use diff::*;
pub use phase::*;
pub use review::*;
pub use task::*;
pub use ticket::*;
pub use workflow::*;

use chrono::{DateTime, Utc};

pub(crate) fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}

pub(crate) fn datetime_to_timestamp(dt: DateTime<Utc>) -> i64 {
    dt.timestamp()
}
