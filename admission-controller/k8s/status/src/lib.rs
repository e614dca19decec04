#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod metrics;
mod sink;
mod writer;

#[cfg(test)]
mod tests;

pub use self::{
    metrics::StatusMetrics,
    sink::KubeStatusSink,
    writer::{StatusWriter, WriteOutcome},
};
