//! Process-wide log setup for the desktop binary.
//!
//! The library only emits `tracing` events; this installs the fmt
//! subscriber that prints them. Filter with `CROP_STUDIO_LOG`, e.g.
//! `CROP_STUDIO_LOG=crop_studio=debug`.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "CROP_STUDIO_LOG";

/// Installs the subscriber. Calling it again is a no-op.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_twice_is_harmless() {
        super::init();
        super::init();
        tracing::info!("still logging");
    }
}
