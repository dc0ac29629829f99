// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone, Debug)]
pub struct LogConfig {
    /// Directive used when `RUST_LOG` is unset, e.g. "info" or "rubik_render_vk=debug".
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_filter: "info".to_owned(),
        }
    }
}

/// `RUST_LOG` wins over the configured directive; an unparsable directive falls back to "info".
pub fn env_filter(cfg: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init_tracing(cfg: &LogConfig) {
    let _ = fmt()
        .with_env_filter(env_filter(cfg))
        .with_target(false)
        .compact()
        .try_init();
}
