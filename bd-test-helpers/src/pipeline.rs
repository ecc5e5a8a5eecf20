// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use bd_log_caller::Hook;
use log::Level;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;

//
// Record
//

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
  pub level: Level,
  pub message: String,
  pub fields: Map<String, Value>,
}

//
// RecordingPipeline
//

/// A stand-in for a structured logger. Each level method dispatches to the installed hooks with a
/// fresh JSON field map and keeps the finished record.
///
/// The call chain from the logging call site to a hook is the level method followed by
/// `dispatch`, which matches `bd_log_caller::DEFAULT_PIPELINE_FRAMES`. Both are kept out of line
/// and the level methods do work after dispatching, so neither frame can be inlined or turned into
/// a tail call.
#[derive(Default)]
pub struct RecordingPipeline {
  hooks: Vec<Arc<dyn Hook>>,
  records: Mutex<Vec<Record>>,
}

impl RecordingPipeline {
  #[must_use]
  pub fn new(hooks: Vec<Arc<dyn Hook>>) -> Self {
    Self {
      hooks,
      records: Mutex::default(),
    }
  }

  #[must_use]
  pub fn with_hook(hook: impl Hook + 'static) -> Self {
    let hook: Arc<dyn Hook> = Arc::new(hook);
    Self::new(vec![hook])
  }

  #[inline(never)]
  pub fn debug(&self, message: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    self.dispatch(&mut fields, Level::Debug, message);
    self.record(Level::Debug, message, &fields);
    fields
  }

  #[inline(never)]
  pub fn info(&self, message: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    self.dispatch(&mut fields, Level::Info, message);
    self.record(Level::Info, message, &fields);
    fields
  }

  #[inline(never)]
  pub fn warn(&self, message: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    self.dispatch(&mut fields, Level::Warn, message);
    self.record(Level::Warn, message, &fields);
    fields
  }

  #[inline(never)]
  pub fn error(&self, message: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    self.dispatch(&mut fields, Level::Error, message);
    self.record(Level::Error, message, &fields);
    fields
  }

  #[inline(never)]
  fn dispatch(&self, fields: &mut Map<String, Value>, level: Level, message: &str) {
    for hook in &self.hooks {
      hook.run(fields, level, message);
    }
  }

  fn record(&self, level: Level, message: &str, fields: &Map<String, Value>) {
    self.records.lock().push(Record {
      level,
      message: message.to_string(),
      fields: fields.clone(),
    });
  }

  #[must_use]
  pub fn records(&self) -> Vec<Record> {
    self.records.lock().clone()
  }

  pub fn take_records(&self) -> Vec<Record> {
    std::mem::take(&mut *self.records.lock())
  }
}
