//! Flowspec CLI library: command implementations shared by the `flowspec`
//! binary and its integration tests.

pub mod commands;
