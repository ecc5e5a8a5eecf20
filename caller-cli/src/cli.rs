// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use bd_log_caller::{CallerFields, DEFAULT_PIPELINE_FRAMES};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(version, about = "Emit JSON log lines enriched with caller fields", long_about = None)]
pub struct Options {
  /// Caller fields to attach: a comma separated list of func, pkg, file and line, or all / none
  #[clap(env = "BD_LOG_CALLER", long, default_value = "all")]
  pub fields: CallerFields,

  /// Number of records each thread emits
  #[clap(long, default_value = "3")]
  pub count: usize,

  /// Number of threads emitting concurrently
  #[clap(long, default_value = "1")]
  pub threads: usize,

  /// Frames between the logging call site and the hook
  #[clap(long, default_value_t = DEFAULT_PIPELINE_FRAMES)]
  pub pipeline_frames: usize,

  /// Symbolize every record instead of caching function names per call site
  #[clap(long)]
  pub uncached: bool,

  /// RUST_LOG style rules for the tool's own diagnostics
  #[clap(long)]
  pub log_filter: Option<String>,
}
