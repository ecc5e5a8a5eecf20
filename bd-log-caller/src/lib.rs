// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

//! Caller metadata for structured logs
//! ===================================
//!
//! [`CallerHook`] is installed into a logging pipeline and, once per emitted record, figures out
//! which function issued the log call. It writes up to four fields into the record: `func`, `pkg`,
//! `file` and `line`.
//!
//! Symbolizing a frame is expensive compared to emitting a log line, so the fully-qualified
//! function name is memoized per call site in a [`CallerCache`]. The set of call sites is bounded
//! by the amount of code that logs, so the cache is never evicted.

#![deny(
  clippy::expect_used,
  clippy::panic,
  clippy::todo,
  clippy::unimplemented,
  clippy::unreachable,
  clippy::unwrap_used
)]

#[cfg(test)]
#[ctor::ctor]
fn test_global_init() {
  bd_test_helpers::test_global_init();
}


pub mod cache;
pub mod fields;
pub mod hook;
pub mod name;
pub mod resolve;

pub use cache::{CallSite, CallerCache};
pub use fields::{CallerFields, FieldSink, FieldValue};
pub use hook::{CallerHook, DEFAULT_PIPELINE_FRAMES, HOOK_FRAMES, Hook};
pub use resolve::{BacktraceWalker, Location, ResolvedCaller, Resolver, StackWalker};

//
// Error
//

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
  #[error("unknown caller field: {0:?}")]
  UnknownField(String),
}

pub type Result<T> = std::result::Result<T, Error>;
