// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./resolve_test.rs"]
mod resolve_test;

use crate::cache::{CallSite, CallerCache};
use crate::name::{QualifiedName, normalize_symbol};
use std::ffi::c_void;
use std::sync::{Arc, OnceLock};

//
// Location
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
  /// Source path as recorded in debug info. This may be absolute or relative to the build root.
  pub file: String,
  pub line: u32,
}

//
// ResolvedCaller
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCaller {
  pub call_site: CallSite,
  /// Normalized fully-qualified name, see [`normalize_symbol`].
  pub name: Arc<str>,
  pub location: Option<Location>,
}

impl ResolvedCaller {
  #[must_use]
  pub fn qualified_name(&self) -> QualifiedName<'_> {
    QualifiedName::split(&self.name)
  }
}

//
// StackWalker
//

/// Access to the stack of the current thread.
pub trait StackWalker: Send + Sync {
  type Frame;

  /// Captures a frame of the calling thread. A `skip` of zero is the function that called
  /// `caller_frame`, one is its caller and so on. Returns `None` if the stack is not that deep or
  /// cannot be walked at all.
  fn caller_frame(&self, skip: usize) -> Option<Self::Frame>;

  fn call_site(&self, frame: &Self::Frame) -> CallSite;

  /// Symbolizes the frame into a demangled function name. This is the expensive operation that
  /// the cache exists to avoid.
  fn function_name(&self, frame: &Self::Frame) -> Option<String>;

  fn location(&self, frame: &Self::Frame) -> Option<Location>;
}

//
// BacktraceWalker
//

/// A [`StackWalker`] backed by the `backtrace` crate.
///
/// The unwinder contributes a platform dependent number of frames of its own before reaching our
/// code. That depth is measured once per process by tracing from a non-inlined marker function and
/// looking for it in the captured frames.
#[derive(Clone, Copy, Debug)]
pub struct BacktraceWalker {
  depth: Option<usize>,
}

impl Default for BacktraceWalker {
  fn default() -> Self {
    Self::new()
  }
}

impl BacktraceWalker {
  #[must_use]
  pub fn new() -> Self {
    static DEPTH: OnceLock<Option<usize>> = OnceLock::new();

    let depth = *DEPTH.get_or_init(|| {
      let depth = calibrate();
      if depth.is_none() {
        log::warn!("unable to locate stack walker frame, caller fields will not be emitted");
      }
      depth
    });

    Self { depth }
  }

  /// Whether the unwinder's own frames could be measured. An uncalibrated walker never returns a
  /// frame, so hooks built on it add no fields.
  #[must_use]
  pub fn is_calibrated(&self) -> bool {
    self.depth.is_some()
  }
}

impl StackWalker for BacktraceWalker {
  type Frame = backtrace::Frame;

  #[inline(never)]
  fn caller_frame(&self, skip: usize) -> Option<backtrace::Frame> {
    // Past `walk` and this method is the function that called us.
    let target = self.depth? + 2 + skip;
    let mut index = 0;
    let mut found = None;
    walk(&mut |frame| {
      if index == target {
        found = Some(frame.clone());
        return false;
      }
      index += 1;
      true
    });
    found
  }

  fn call_site(&self, frame: &backtrace::Frame) -> CallSite {
    CallSite::new(frame.ip() as usize)
  }

  fn function_name(&self, frame: &backtrace::Frame) -> Option<String> {
    // Inlined functions are reported innermost first, which is the code that made the call.
    let mut name = None;
    backtrace::resolve_frame(frame, |symbol| {
      if name.is_none() {
        name = symbol.name().map(|name| format!("{name:#}"));
      }
    });
    name
  }

  fn location(&self, frame: &backtrace::Frame) -> Option<Location> {
    let mut location = None;
    backtrace::resolve_frame(frame, |symbol| {
      if location.is_none() {
        location = symbol
          .filename()
          .zip(symbol.lineno())
          .map(|(file, line)| Location {
            file: file.to_string_lossy().into_owned(),
            line,
          });
      }
    });
    location
  }
}

// Every trace goes through here so the unwinder's own frames are the same for calibration and for
// real captures. The frame count is consumed after the trace returns so the call into the unwinder
// is never a tail call, which would drop this frame from the stack in optimized builds.
#[inline(never)]
fn walk(visit: &mut dyn FnMut(&backtrace::Frame) -> bool) {
  let mut visited = 0usize;
  backtrace::trace(|frame| {
    visited += 1;
    visit(frame)
  });
  std::hint::black_box(visited);
}

#[inline(never)]
fn calibrate() -> Option<usize> {
  let marker = walk as *const () as usize;
  let mut index = 0;
  let mut depth = None;
  walk(&mut |frame| {
    if is_marker(frame, marker) {
      depth = Some(index);
      return false;
    }
    index += 1;
    true
  });
  depth
}

fn is_marker(frame: &backtrace::Frame, marker: usize) -> bool {
  // Some unwinders only report the instruction pointer here, in which case fall back to the
  // symbol table.
  if frame.symbol_address() as usize == marker {
    return true;
  }

  let mut found = false;
  backtrace::resolve_frame(frame, |symbol| {
    found |= symbol.addr().map(|addr: *mut c_void| addr as usize) == Some(marker);
  });
  found
}

//
// Resolver
//

/// Resolves the caller of a fixed position in the call chain, consulting the cache for the
/// function name.
pub struct Resolver<W: StackWalker = BacktraceWalker> {
  walker: W,
  cache: Option<Arc<CallerCache>>,
  skip: usize,
}

impl<W: StackWalker> Resolver<W> {
  /// `skip` counts frames above [`Resolver::resolve`]: zero attributes to `resolve` itself and one
  /// to whatever called it. A resolver without a cache symbolizes on every call.
  pub fn new(walker: W, cache: Option<Arc<CallerCache>>, skip: usize) -> Self {
    Self {
      walker,
      cache,
      skip,
    }
  }

  #[must_use]
  pub fn cache(&self) -> Option<&Arc<CallerCache>> {
    self.cache.as_ref()
  }

  #[must_use]
  pub fn skip(&self) -> usize {
    self.skip
  }

  /// Returns `None` when the stack has no frame at the configured depth. The source location is
  /// only symbolized when asked for since it is not cached.
  #[inline(never)]
  pub fn resolve(&self, with_location: bool) -> Option<ResolvedCaller> {
    let frame = self.walker.caller_frame(self.skip)?;
    let call_site = self.walker.call_site(&frame);

    let name = match self.cache.as_ref().and_then(|cache| cache.lookup(call_site)) {
      Some(name) => name,
      None => {
        let name: Arc<str> = self
          .walker
          .function_name(&frame)
          .map(|symbol| normalize_symbol(&symbol))
          .unwrap_or_default()
          .into();
        match &self.cache {
          Some(cache) => cache.store(call_site, name),
          None => name,
        }
      },
    };

    let location = if with_location {
      self.walker.location(&frame)
    } else {
      None
    };

    Some(ResolvedCaller {
      call_site,
      name,
      location,
    })
  }
}
