// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

pub mod pipeline;

pub use pipeline::{Record, RecordingPipeline};

pub fn test_global_init() {
  bd_log::SwapLogger::initialize();
}
