// sysperf - fixed-cadence system performance sampler
// Library surface so integration tests can drive the loop directly

pub mod cli;
pub mod config;
pub mod metrics;
pub mod observability;
pub mod sampler;
pub mod signals;
pub mod sink;
