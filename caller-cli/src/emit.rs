// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./emit_test.rs"]
mod emit_test;

use bd_log_caller::Hook;
use log::Level;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::io::Write;

//
// JsonPipeline
//

// Writes one JSON object per line: the level, whatever the hooks add, then the message. The level
// methods and `dispatch` are the two frames `DEFAULT_PIPELINE_FRAMES` accounts for; the level
// methods keep working after dispatch returns so the optimizer cannot fold them into a tail call.
pub struct JsonPipeline<W: Write + Send> {
  hooks: Vec<Box<dyn Hook>>,
  writer: Mutex<W>,
}

impl<W: Write + Send> JsonPipeline<W> {
  pub fn new(writer: W) -> Self {
    Self {
      hooks: Vec::new(),
      writer: Mutex::new(writer),
    }
  }

  #[must_use]
  pub fn hook(mut self, hook: impl Hook + 'static) -> Self {
    self.hooks.push(Box::new(hook));
    self
  }

  #[inline(never)]
  pub fn info(&self, message: &str) -> anyhow::Result<()> {
    let mut fields = Map::new();
    self.dispatch(&mut fields, Level::Info, message);
    self.write(fields, message)
  }

  #[inline(never)]
  pub fn warn(&self, message: &str) -> anyhow::Result<()> {
    let mut fields = Map::new();
    self.dispatch(&mut fields, Level::Warn, message);
    self.write(fields, message)
  }

  #[inline(never)]
  fn dispatch(&self, fields: &mut Map<String, Value>, level: Level, message: &str) {
    fields.insert("level".to_string(), level.as_str().to_lowercase().into());
    for hook in &self.hooks {
      hook.run(fields, level, message);
    }
  }

  fn write(&self, mut fields: Map<String, Value>, message: &str) -> anyhow::Result<()> {
    fields.insert("message".to_string(), message.into());
    let line = serde_json::to_string(&Value::Object(fields))?;
    let mut writer = self.writer.lock();
    writeln!(writer, "{line}")?;
    Ok(())
  }

  pub fn into_inner(self) -> W {
    self.writer.into_inner()
  }
}
