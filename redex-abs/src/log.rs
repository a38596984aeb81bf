/*!

The rest of the workspace never names `tracing` directly. This module is the single seam: if we ever wanted
to swap tracing for another framework, only this file would change.

*/

pub use tracing::{debug, error, info, trace, warn};

/// Installs a `tracing_subscriber` that writes to stderr, honoring `RUST_LOG`. Intended to be called once by
/// a host binary or test harness; the library itself never installs a subscriber on its own.
pub fn init_default_subscriber() {
  use tracing_subscriber::{fmt, EnvFilter};

  let _ = fmt()
      .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
      .with_target(false)
      .try_init();
}
