//! Rate-limited paginated aggregation: page planning, throttled dispatch,
//! index-addressed result assembly, and progress reporting.

pub mod planner;
pub mod progress;
pub mod run;
pub mod slots;
pub mod throttle;
