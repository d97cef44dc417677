//! crossforge-lib: cross-target build orchestration for Go programs
//!
//! A session moves through four stages:
//! - `resolve`: a platform specification and group lists become a `PlatformSet`
//! - `toolchain`: the host is probed once for C compilers and the Android NDK
//! - `session::plan`: each platform becomes a `BuildTarget` with its derived
//!   environment, or a skip with a reason
//! - `dispatch`: targets are compiled concurrently, failures are retried
//!   sequentially, and results stream out as they finish

pub mod catalog;
pub mod config;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod groups;
pub mod platform;
pub mod resolve;
pub mod session;
pub mod target;
pub mod toolchain;
pub mod util;
