//! Box reconciliation engine: label parsing, the difference metric, the
//! per-box classifier, frame reconciliation, rate selection and tallying.

pub mod classifier;
pub mod labels;
pub mod metric;
pub mod rates;
pub mod reconciler;
pub mod tally;

pub use classifier::{AfterPool, BoxClassifier, Classification, Verdict};
pub use labels::{DEFAULT_STRIP_TAIL, LineFormat};
pub use metric::{BoxDelta, offset_ratio, percentage_diff};
pub use rates::{FrameRates, RateSchedule};
pub use reconciler::{ChargeEvent, FrameReconciler};
pub use tally::CostAccumulator;

#[cfg(test)]
mod tests;
