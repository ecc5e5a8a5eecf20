// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./hook_test.rs"]
mod hook_test;

use crate::cache::CallerCache;
use crate::fields::{CallerFields, FieldSink};
use crate::resolve::{BacktraceWalker, Resolver, StackWalker};
use log::Level;
use std::sync::Arc;

/// Frames owned by the hook between the stack walk and the pipeline: [`Resolver::resolve`] and
/// [`CallerHook::run`](Hook::run).
pub const HOOK_FRAMES: usize = 2;

/// Frames the pipeline is expected to place between the logging call site and the hook: a level
/// method such as `info()` and the dispatch loop that runs hooks. A pipeline with a different
/// shape must say so via [`CallerHookBuilder::pipeline_frames`], otherwise records are attributed
/// to pipeline internals instead of the code that logged.
pub const DEFAULT_PIPELINE_FRAMES: usize = 2;

//
// Hook
//

/// Extension point run by a logging pipeline exactly once for every record it emits, before the
/// record is finalized.
pub trait Hook: Send + Sync {
  fn run(&self, fields: &mut dyn FieldSink, level: Level, message: &str);
}

//
// CallerHook
//

/// Adds the caller's function, package, file and line to each record.
pub struct CallerHook<W: StackWalker = BacktraceWalker> {
  fields: CallerFields,
  resolver: Resolver<W>,
}

impl CallerHook {
  /// Creates a hook with its own cache and the default pipeline depth.
  #[must_use]
  pub fn new(fields: CallerFields) -> Self {
    Self::builder(fields).build()
  }

  #[must_use]
  pub fn builder(fields: CallerFields) -> CallerHookBuilder<BacktraceWalker> {
    CallerHookBuilder {
      walker: BacktraceWalker::new(),
      fields,
      cache: Some(Arc::default()),
      pipeline_frames: DEFAULT_PIPELINE_FRAMES,
    }
  }
}

impl<W: StackWalker> CallerHook<W> {
  #[must_use]
  pub fn fields(&self) -> CallerFields {
    self.fields
  }

  #[must_use]
  pub fn cache(&self) -> Option<&Arc<CallerCache>> {
    self.resolver.cache()
  }
}

impl<W: StackWalker> Hook for CallerHook<W> {
  #[inline(never)]
  fn run(&self, fields: &mut dyn FieldSink, _level: Level, _message: &str) {
    if self.fields.is_empty() {
      return;
    }

    if let Some(caller) = self.resolver.resolve(self.fields.needs_location()) {
      self.fields.emit(&caller, fields);
    }
  }
}

//
// CallerHookBuilder
//

pub struct CallerHookBuilder<W: StackWalker> {
  walker: W,
  fields: CallerFields,
  cache: Option<Arc<CallerCache>>,
  pipeline_frames: usize,
}

impl<W: StackWalker> CallerHookBuilder<W> {
  #[must_use]
  pub fn walker<V: StackWalker>(self, walker: V) -> CallerHookBuilder<V> {
    CallerHookBuilder {
      walker,
      fields: self.fields,
      cache: self.cache,
      pipeline_frames: self.pipeline_frames,
    }
  }

  /// Shares a cache between hooks, for example one per logger that all log from the same code.
  #[must_use]
  pub fn cache(mut self, cache: Arc<CallerCache>) -> Self {
    self.cache = Some(cache);
    self
  }

  /// Symbolizes on every record. Only useful for measuring what the cache saves.
  #[must_use]
  pub fn uncached(mut self) -> Self {
    self.cache = None;
    self
  }

  #[must_use]
  pub fn pipeline_frames(mut self, pipeline_frames: usize) -> Self {
    self.pipeline_frames = pipeline_frames;
    self
  }

  #[must_use]
  pub fn build(self) -> CallerHook<W> {
    log::debug!(
      "caller hook: fields={} cached={} pipeline_frames={}",
      self.fields,
      self.cache.is_some(),
      self.pipeline_frames
    );

    CallerHook {
      fields: self.fields,
      resolver: Resolver::new(
        self.walker,
        self.cache,
        HOOK_FRAMES + self.pipeline_frames,
      ),
    }
  }
}
