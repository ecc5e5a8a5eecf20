// shared-core - bitdrift's common client/server libraries
// Copyright Bitdrift, Inc. All rights reserved.
//
// Use of this source code is governed by a source available license that can be found in the
// LICENSE file or at:
// https://polyformproject.org/wp-content/uploads/2020/06/PolyForm-Shield-1.0.0.txt


use parking_lot::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::reload::Handle as ReloadHandle;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

const DEFAULT_FILTER_RULES: &str = "info";

//
// SwapLogger
//

// Process wide diagnostics logging. `log` records are bridged into the tracing registry so both
// facades end up on stderr, and the filter can be swapped at runtime.
#[derive(Default)]
pub struct SwapLogger {
  handle: Mutex<Option<ReloadHandle<EnvFilter, Registry>>>,
}

impl SwapLogger {
  const fn new() -> Self {
    Self {
      handle: parking_lot::const_mutex(None),
    }
  }

  fn get() -> &'static Self {
    static LOGGER: SwapLogger = SwapLogger::new();

    &LOGGER
  }

  // Install the logger using RUST_LOG (or the default rules) as the initial filter. Subsequent
  // calls, or calls made after another global subscriber was installed, are ignored.
  pub fn initialize() {
    let mut handle = Self::get().handle.lock();
    if handle.is_some() {
      return;
    }

    // ANSI output is opt in via BD_LOG_ANSI so that logs captured by a collector stay plain.
    let stderr = tracing_subscriber::fmt::layer()
      .with_writer(std::io::stderr)
      .with_ansi(std::env::var("BD_LOG_ANSI").is_ok())
      .with_line_number(true)
      .compact();

    let filter = EnvFilter::try_from_default_env()
      .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER_RULES));

    let (filter, reload_handle) = tracing_subscriber::reload::Layer::new(filter);
    if Registry::default()
      .with(filter)
      .with(stderr)
      .try_init()
      .is_ok()
    {
      *handle = Some(reload_handle);
    }
  }

  #[must_use]
  pub fn is_initialized() -> bool {
    Self::get().handle.lock().is_some()
  }

  // Replace the active filter with new RUST_LOG style rules.
  pub fn swap(rules: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(rules)?;
    let handle = Self::get().handle.lock();
    let Some(handle) = handle.as_ref() else {
      anyhow::bail!("logger has not been initialized");
    };
    handle.reload(filter)?;

    // The `log` max level is captured when the bridge is installed and is not updated by reloads.
    log::set_max_level(tracing_log::AsLog::as_log(
      &tracing_subscriber::filter::LevelFilter::current(),
    ));

    Ok(())
  }
}
