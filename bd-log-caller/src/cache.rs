// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./cache_test.rs"]
mod cache_test;

use dashmap::DashMap;
use std::sync::Arc;

//
// CallSite
//

/// Identifies one static call location in compiled code. This is the instruction pointer of the
/// frame that issued the log call and is only ever used as a map key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallSite(usize);

impl CallSite {
  #[must_use]
  pub const fn new(address: usize) -> Self {
    Self(address)
  }

  #[must_use]
  pub const fn address(self) -> usize {
    self.0
  }
}

//
// CallerCache
//

/// Memoizes the fully-qualified function name resolved for each call site. Entries are written
/// once and never evicted: the code of a running process does not change, so a stored name is
/// always correct and racing writers can only ever store the same value.
#[derive(Default, Debug)]
pub struct CallerCache {
  names: DashMap<CallSite, Arc<str>>,
}

impl CallerCache {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  pub fn lookup(&self, call_site: CallSite) -> Option<Arc<str>> {
    self.names.get(&call_site).map(|name| name.value().clone())
  }

  /// Stores the name for a call site if one is not already present, returning the name that ends
  /// up in the cache.
  pub fn store(&self, call_site: CallSite, name: Arc<str>) -> Arc<str> {
    self.names.entry(call_site).or_insert(name).value().clone()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.names.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }

  pub fn clear(&self) {
    self.names.clear();
  }
}
