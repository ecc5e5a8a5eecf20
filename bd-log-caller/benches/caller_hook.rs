// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use bd_log_caller::{CallerFields, CallerHook};
use bd_test_helpers::RecordingPipeline;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::panic::Location;

#[inline(never)]
fn log_site(pipeline: &RecordingPipeline) {
  black_box(pipeline.info("bench"));
}

// What the compiler hands out for free: file and line, but no function name.
#[track_caller]
fn track_caller_location() -> (&'static str, u32) {
  let location = Location::caller();
  (location.file(), location.line())
}

// A hook that cannot walk the stack adds nothing, which would make the numbers meaningless.
fn assert_emits(pipeline: &RecordingPipeline) {
  log_site(pipeline);
  let records = pipeline.take_records();
  assert!(
    records.iter().all(|record| !record.fields.is_empty()),
    "caller hook emitted no fields"
  );
}

fn caller_hook(c: &mut Criterion) {
  let mut group = c.benchmark_group("caller_hook");

  group.bench_function("track_caller", |b| {
    b.iter(|| black_box(track_caller_location()));
  });

  for (name, fields) in [
    ("cached_name_only", CallerFields::new(true, false, false, true)),
    ("cached_all", CallerFields::ALL),
  ] {
    let pipeline = RecordingPipeline::with_hook(CallerHook::new(fields));
    assert_emits(&pipeline);
    group.bench_function(name, |b| {
      b.iter(|| {
        log_site(&pipeline);
        pipeline.take_records();
      });
    });
  }

  let pipeline =
    RecordingPipeline::with_hook(CallerHook::builder(CallerFields::ALL).uncached().build());
  assert_emits(&pipeline);
  group.bench_function("uncached_all", |b| {
    b.iter(|| {
      log_site(&pipeline);
      pipeline.take_records();
    });
  });

  group.finish();
}

criterion_group!(benches, caller_hook);
criterion_main!(benches);
