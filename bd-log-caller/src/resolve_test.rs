// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#![allow(clippy::unwrap_used)]

use super::{BacktraceWalker, Location, ResolvedCaller, Resolver, StackWalker};
use crate::cache::{CallSite, CallerCache};
use crate::name::{QualifiedName, file_name};
use crate::test::{FakeFrame, FakeWalker};
use pretty_assertions::assert_eq;
use std::hint::black_box;
use std::sync::Arc;

fn handler_frame() -> FakeFrame {
  FakeFrame::new(
    0x4000,
    "my_service::handler::serve::{{closure}}",
    "/build/my_service/src/handler.rs",
    42,
  )
}

#[test]
fn miss_then_hit() {
  let walker = FakeWalker::new(handler_frame());
  let counters = walker.counters();
  let cache = Arc::new(CallerCache::new());
  let resolver = Resolver::new(walker, Some(cache.clone()), 3);

  let first = resolver.resolve(false).unwrap();
  assert_eq!(
    first,
    ResolvedCaller {
      call_site: CallSite::new(0x4000),
      name: "my_service/handler.serve".into(),
      location: None,
    }
  );
  assert_eq!(counters.symbolized(), 1);
  assert_eq!(counters.last_skip(), 3);
  assert_eq!(
    cache.lookup(CallSite::new(0x4000)).as_deref(),
    Some("my_service/handler.serve")
  );

  let second = resolver.resolve(false).unwrap();
  assert_eq!(first, second);
  assert_eq!(counters.walks(), 2);
  assert_eq!(counters.symbolized(), 1);
  assert_eq!(cache.len(), 1);
}

#[test]
fn cache_does_not_change_result() {
  let cached = Resolver::new(
    FakeWalker::new(handler_frame()),
    Some(Arc::new(CallerCache::new())),
    0,
  );
  let uncached_walker = FakeWalker::new(handler_frame());
  let uncached_counters = uncached_walker.counters();
  let uncached = Resolver::new(uncached_walker, None, 0);

  for _ in 0 .. 3 {
    assert_eq!(cached.resolve(true), uncached.resolve(true));
  }
  assert_eq!(uncached_counters.symbolized(), 3);

  // Clearing only costs another symbolization.
  cached.cache().unwrap().clear();
  assert_eq!(cached.resolve(true), uncached.resolve(true));
  assert_eq!(cached.cache().unwrap().len(), 1);
}

#[test]
fn no_frames() {
  let walker = FakeWalker::empty();
  let counters = walker.counters();
  let cache = Arc::new(CallerCache::new());
  let resolver = Resolver::new(walker, Some(cache.clone()), 4);

  assert!(resolver.resolve(true).is_none());
  assert_eq!(counters.walks(), 1);
  assert_eq!(counters.symbolized(), 0);
  assert_eq!(counters.located(), 0);
  assert!(cache.is_empty());
}

#[test]
fn location_only_on_request() {
  let walker = FakeWalker::new(handler_frame());
  let counters = walker.counters();
  let resolver = Resolver::new(walker, Some(Arc::new(CallerCache::new())), 0);

  assert!(resolver.resolve(false).unwrap().location.is_none());
  assert_eq!(counters.located(), 0);

  // The location is re-derived on each call even though the name is cached.
  for _ in 0 .. 2 {
    assert_eq!(
      resolver.resolve(true).unwrap().location,
      Some(Location {
        file: "/build/my_service/src/handler.rs".to_string(),
        line: 42,
      })
    );
  }
  assert_eq!(counters.located(), 2);
  assert_eq!(counters.symbolized(), 1);
}

#[test]
fn unknown_symbol() {
  let walker = FakeWalker::new(FakeFrame {
    ip: 0x10,
    symbol: None,
    location: None,
  });
  let resolver = Resolver::new(walker, Some(Arc::new(CallerCache::new())), 0);

  let caller = resolver.resolve(true).unwrap();
  assert_eq!(&*caller.name, "");
  assert_eq!(
    caller.qualified_name(),
    QualifiedName {
      package: "",
      function: "",
    }
  );
  assert!(caller.location.is_none());
}

#[inline(never)]
fn function_name_of_caller(skip: usize) -> Option<String> {
  let walker = BacktraceWalker::new();
  let frame = walker.caller_frame(skip)?;
  walker.function_name(&frame)
}

#[inline(never)]
fn resolve_from_here(resolver: &Resolver) -> Option<ResolvedCaller> {
  black_box(resolver.resolve(true))
}

#[test]
fn backtrace_walker_calibrates() {
  assert!(BacktraceWalker::new().is_calibrated());
  assert!(function_name_of_caller(0).is_some());
}

#[test]
fn backtrace_walker_skip() {
  let own = function_name_of_caller(0).unwrap();
  assert!(own.ends_with("resolve_test::function_name_of_caller"), "{own}");

  let caller = function_name_of_caller(1).unwrap();
  assert!(caller.ends_with("resolve_test::backtrace_walker_skip"), "{caller}");
}

#[test]
fn backtrace_walker_too_deep() {
  assert!(function_name_of_caller(100_000).is_none());
}

#[test]
fn backtrace_resolver() {
  let cache = Arc::new(CallerCache::new());
  let resolver = Resolver::new(BacktraceWalker::new(), Some(cache.clone()), 1);

  let caller = resolve_from_here(&resolver).unwrap();
  assert_eq!(
    caller.qualified_name(),
    QualifiedName {
      package: "resolve_test",
      function: "resolve_from_here",
    }
  );
  let location = caller.location.unwrap();
  assert_eq!(file_name(&location.file), "resolve_test.rs");
  assert!(location.line > 0);
  assert_eq!(cache.lookup(caller.call_site), Some(caller.name.clone()));

  // Same call site, same answer.
  let again = resolve_from_here(&resolver).unwrap();
  assert_eq!(again.call_site, caller.call_site);
  assert_eq!(again.name, caller.name);
  assert_eq!(cache.len(), 1);
}
