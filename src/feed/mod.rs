//! Push channel carrying live system metrics.

pub mod protocol;
mod socket;

pub use protocol::{FeedEvent, PerformanceSample};
pub use socket::PushChannel;
