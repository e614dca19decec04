#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use lb_admission_core as core;
pub use lb_admission_k8s_api as k8s;
pub use lb_admission_k8s_index as index;
pub use lb_admission_k8s_status as status;

mod args;
pub mod change_filter;
pub mod control_plane;
pub mod metrics;
pub mod pipeline;
pub mod process;
pub mod queue;
pub mod resolver;
mod resource;
pub mod secrets;
pub mod validate;


pub use self::{args::Args, resource::Resource};
