// Cross-module test suites for the ballot engine

pub mod support;

pub mod state_machine_tests;
