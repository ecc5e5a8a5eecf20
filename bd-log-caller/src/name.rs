// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

#[cfg(test)]
#[path = "./name_test.rs"]
mod name_test;

const LEGACY_CLOSURE_SEGMENT: &str = "::{{closure}}";

//
// QualifiedName
//

/// A fully-qualified function name split into its package and bare function name.
///
/// Only the last `/` separated segment is considered, and it is split once at its last `.`:
/// `a/b/c.Foo` is package `c` and function `Foo`, while `a/b/c.Type.Method` is package `c.Type`
/// and function `Method`. A segment without a `.` is all function and no package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualifiedName<'a> {
  pub package: &'a str,
  pub function: &'a str,
}

impl<'a> QualifiedName<'a> {
  #[must_use]
  pub fn split(name: &'a str) -> Self {
    let last = name.rsplit_once('/').map_or(name, |(_, last)| last);
    match last.rsplit_once('.') {
      Some((package, function)) => Self { package, function },
      None => Self {
        package: "",
        function: last,
      },
    }
  }
}

/// Converts a demangled Rust symbol such as `my_crate::server::handle::{{closure}}` into the
/// `my_crate/server.handle` form understood by [`QualifiedName::split`]. Closures are attributed
/// to their enclosing function and anything nested in `<...>` is left untouched. Names without a
/// top level `::` are returned as is.
///
/// A method keeps its module next to the type, so `my_crate::billing::Invoice::total` becomes
/// `my_crate/billing.Invoice.total` with package `billing.Invoice`. Types are told apart from
/// modules by their leading upper case letter.
#[must_use]
pub fn normalize_symbol(symbol: &str) -> String {
  let mut symbol = symbol;
  while let Some(stripped) = strip_closure(symbol) {
    symbol = stripped;
  }

  let separators = top_level_separators(symbol);
  let Some((&last, rest)) = separators.split_last() else {
    return symbol.to_string();
  };

  let type_separator = rest
    .last()
    .copied()
    .filter(|&index| symbol[index + 2 .. last].starts_with(|c: char| c.is_ascii_uppercase()));

  let mut normalized = String::with_capacity(symbol.len());
  let mut start = 0;
  for &index in rest {
    normalized.push_str(&symbol[start .. index]);
    normalized.push(if Some(index) == type_separator { '.' } else { '/' });
    start = index + 2;
  }
  normalized.push_str(&symbol[start .. last]);
  normalized.push('.');
  normalized.push_str(&symbol[last + 2 ..]);
  normalized
}

// Removes one trailing closure segment, either the legacy `::{{closure}}` or the `::{closure#N}`
// form used by v0 mangling and debug info.
fn strip_closure(symbol: &str) -> Option<&str> {
  if let Some(stripped) = symbol.strip_suffix(LEGACY_CLOSURE_SEGMENT) {
    return Some(stripped);
  }

  let (parent, last) = symbol.rsplit_once("::")?;
  let index = last.strip_prefix("{closure#")?.strip_suffix('}')?;
  (!index.is_empty() && index.bytes().all(|b| b.is_ascii_digit())).then_some(parent)
}

// Byte offsets of every `::` that is not nested inside generic brackets.
fn top_level_separators(symbol: &str) -> Vec<usize> {
  let bytes = symbol.as_bytes();
  let mut separators = Vec::new();
  let mut depth = 0usize;
  let mut i = 0;
  while i < bytes.len() {
    match bytes[i] {
      b'<' => depth += 1,
      // `->` inside a function pointer type does not close a bracket.
      b'>' if i == 0 || bytes[i - 1] != b'-' => depth = depth.saturating_sub(1),
      b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
        separators.push(i);
        i += 2;
        continue;
      },
      _ => {},
    }
    i += 1;
  }
  separators
}

/// Returns the final component of a source path. Debug info may carry paths from either platform
/// family so both separators are honored.
#[must_use]
pub fn file_name(path: &str) -> &str {
  path.rfind(['/', '\\']).map_or(path, |index| &path[index + 1 ..])
}
