// Integration tests for metamig

pub mod cli;
pub mod helpers;
pub mod integration;
