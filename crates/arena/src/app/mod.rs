mod autopilot;
mod bootstrap;
mod loop_runner;
mod metrics;
mod observer;
mod report;

pub(crate) use bootstrap::build_app;
pub(crate) use loop_runner::run;
