#![cfg(test)]

pub mod config_startup_tests;
pub mod scenario_tests;
