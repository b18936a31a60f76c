pub(crate) mod bootstrap;
mod headless;
pub(crate) mod loop_runner;
mod metrics;
mod scenarios;
