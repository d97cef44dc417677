//! End-to-end tests that drive the `crossforge` binary against a stand-in
//! `go` executable.

mod common;

#[cfg(unix)]
mod build_tests;
mod groups_tests;
