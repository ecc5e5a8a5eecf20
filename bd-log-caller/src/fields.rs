// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./fields_test.rs"]
mod fields_test;

use crate::name::file_name;
use crate::resolve::ResolvedCaller;
use crate::{Error, Result};
use std::fmt::Display;
use std::str::FromStr;

pub const FIELD_FUNCTION: &str = "func";
pub const FIELD_PACKAGE: &str = "pkg";
pub const FIELD_FILE: &str = "file";
pub const FIELD_LINE: &str = "line";

//
// FieldValue
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
  Str(&'a str),
  Int(i64),
}

//
// FieldSink
//

/// The mutable field set of a log record that is being built.
pub trait FieldSink {
  fn add_str(&mut self, key: &'static str, value: &str);

  fn add_int(&mut self, key: &'static str, value: i64);

  fn add(&mut self, key: &'static str, value: FieldValue<'_>) {
    match value {
      FieldValue::Str(value) => self.add_str(key, value),
      FieldValue::Int(value) => self.add_int(key, value),
    }
  }
}

impl FieldSink for serde_json::Map<String, serde_json::Value> {
  fn add_str(&mut self, key: &'static str, value: &str) {
    self.insert(key.to_string(), value.into());
  }

  fn add_int(&mut self, key: &'static str, value: i64) {
    self.insert(key.to_string(), value.into());
  }
}

//
// CallerFields
//

/// Selects which caller fields are written into each record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallerFields {
  pub function: bool,
  pub file: bool,
  pub line: bool,
  pub package: bool,
}

impl CallerFields {
  pub const ALL: Self = Self::new(true, true, true, true);
  pub const NONE: Self = Self::new(false, false, false, false);

  #[must_use]
  pub const fn new(function: bool, file: bool, line: bool, package: bool) -> Self {
    Self {
      function,
      file,
      line,
      package,
    }
  }

  #[must_use]
  pub const fn is_empty(self) -> bool {
    !(self.function || self.file || self.line || self.package)
  }

  /// Whether the source location has to be symbolized in addition to the function name.
  #[must_use]
  pub const fn needs_location(self) -> bool {
    self.file || self.line
  }

  /// The enabled fields for a resolved caller, in a stable order: `func`, `pkg`, `file`, `line`.
  /// File and line are omitted when the frame has no debug info.
  pub fn fields(
    self,
    caller: &ResolvedCaller,
  ) -> impl Iterator<Item = (&'static str, FieldValue<'_>)> {
    let name = caller.qualified_name();
    let location = caller.location.as_ref();

    [
      self
        .function
        .then_some((FIELD_FUNCTION, FieldValue::Str(name.function))),
      self
        .package
        .then_some((FIELD_PACKAGE, FieldValue::Str(name.package))),
      location
        .filter(|_| self.file)
        .map(|location| (FIELD_FILE, FieldValue::Str(file_name(&location.file)))),
      location
        .filter(|_| self.line)
        .map(|location| (FIELD_LINE, FieldValue::Int(i64::from(location.line)))),
    ]
    .into_iter()
    .flatten()
  }

  pub fn emit(self, caller: &ResolvedCaller, sink: &mut dyn FieldSink) {
    for (key, value) in self.fields(caller) {
      sink.add(key, value);
    }
  }
}

impl FromStr for CallerFields {
  type Err = Error;

  /// Parses a comma separated list of field names, or `all` / `none`.
  fn from_str(s: &str) -> Result<Self> {
    let mut fields = Self::NONE;
    for name in s.split(',').map(str::trim).filter(|name| !name.is_empty()) {
      match name {
        "all" => fields = Self::ALL,
        "none" => {},
        FIELD_FUNCTION | "function" => fields.function = true,
        FIELD_PACKAGE | "package" => fields.package = true,
        FIELD_FILE => fields.file = true,
        FIELD_LINE => fields.line = true,
        other => return Err(Error::UnknownField(other.to_string())),
      }
    }
    Ok(fields)
  }
}

impl Display for CallerFields {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    if self.is_empty() {
      return f.write_str("none");
    }

    let names = [
      (self.function, FIELD_FUNCTION),
      (self.package, FIELD_PACKAGE),
      (self.file, FIELD_FILE),
      (self.line, FIELD_LINE),
    ];
    let mut first = true;
    for (_, name) in names.iter().filter(|(enabled, _)| *enabled) {
      if !first {
        f.write_str(",")?;
      }
      f.write_str(name)?;
      first = false;
    }
    Ok(())
  }
}
