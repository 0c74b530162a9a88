//! Scenario interpretation
//!
//! A scenario is a scripted sequence of expected interactions with the
//! subject pair, including receiver disconnect/reconnect handling. This
//! module loads scenario files into directives and drives one scenario
//! run end to end.

mod directive;
mod runner;

pub use directive::{Directive, Scenario};
pub use runner::{run_scenario, ScenarioReport};
