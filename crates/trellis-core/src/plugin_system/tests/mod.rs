pub mod common;
pub mod descriptor_tests;
pub mod graph_tests;
