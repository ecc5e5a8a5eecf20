// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt

use crate::cli::Options;
use crate::emit::JsonPipeline;
use bd_log_caller::CallerHook;
use clap::Parser;
use std::io::Stdout;

mod cli;
mod emit;

fn main() -> anyhow::Result<()> {
  bd_log::SwapLogger::initialize();
  let options = Options::parse();
  if let Some(rules) = &options.log_filter {
    bd_log::SwapLogger::swap(rules)?;
  }

  let mut builder = CallerHook::builder(options.fields).pipeline_frames(options.pipeline_frames);
  if options.uncached {
    builder = builder.uncached();
  }
  let hook = builder.build();
  let cache = hook.cache().cloned();

  let pipeline = JsonPipeline::new(std::io::stdout()).hook(hook);
  std::thread::scope(|scope| {
    let workers: Vec<_> = (0 .. options.threads.max(1))
      .map(|worker| {
        let pipeline = &pipeline;
        scope.spawn(move || run_worker(pipeline, worker, options.count))
      })
      .collect();
    workers.into_iter().try_for_each(|worker| {
      worker
        .join()
        .map_err(|_| anyhow::anyhow!("worker thread panicked"))?
    })
  })?;

  match cache {
    Some(cache) => log::info!("emitted records from {} cached call sites", cache.len()),
    None => log::info!("emitted records without a call site cache"),
  }

  Ok(())
}

#[inline(never)]
fn run_worker(pipeline: &JsonPipeline<Stdout>, worker: usize, count: usize) -> anyhow::Result<()> {
  for i in 0 .. count {
    if i + 1 == count {
      pipeline.warn(&format!("worker {worker} finished"))?;
    } else {
      pipeline.info(&format!("worker {worker} record {i}"))?;
    }
  }
  Ok(())
}
