//! Process-wide settings of the polynomial engine.
//!
//! The settings are read from the environment the first time they are accessed
//! and can be replaced at any time with [`Settings::set`]:
//!
//! - `POLYSERIES_PARALLEL_THRESHOLD`: the number of term pairs from which a
//!   product is computed in parallel,
//! - `POLYSERIES_SEGMENT_BITS`: the base-2 logarithm of the number of segments
//!   of the term table of a parallel product,
//! - `POLYSERIES_THREADS`: the number of worker threads.

use std::env;
use std::sync::RwLock;

use once_cell::sync::{Lazy, OnceCell};
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

static SETTINGS: Lazy<RwLock<Settings>> = Lazy::new(|| RwLock::new(Settings::from_env()));
static THREAD_POOL: OnceCell<ThreadPool> = OnceCell::new();

/// The maximum number of table segments is `2^MAX_SEGMENT_BITS`.
pub const MAX_SEGMENT_BITS: u32 = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Products with at least this many term pairs are computed in parallel.
    pub parallel_threshold: usize,
    /// Base-2 logarithm of the number of table segments used by a parallel product.
    pub segment_bits: u32,
    /// The number of worker threads, or `None` to let rayon decide.
    pub num_threads: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            parallel_threshold: 1 << 16,
            segment_bits: 4,
            num_threads: None,
        }
    }
}

impl Settings {
    /// Build the settings from the environment, falling back to the defaults
    /// for missing or malformed variables.
    pub fn from_env() -> Settings {
        let mut settings = Settings::default();

        if let Some(t) = parse_var::<usize>("POLYSERIES_PARALLEL_THRESHOLD") {
            settings.parallel_threshold = t;
        }

        if let Some(b) = parse_var::<u32>("POLYSERIES_SEGMENT_BITS") {
            settings.segment_bits = b.min(MAX_SEGMENT_BITS);
        }

        if let Some(n) = parse_var::<usize>("POLYSERIES_THREADS") {
            settings.num_threads = if n == 0 { None } else { Some(n) };
        }

        trace!(?settings, "loaded settings");
        settings
    }

    /// Get a copy of the current settings.
    pub fn get() -> Settings {
        SETTINGS
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the current settings.
    ///
    /// The thread count is only used when the worker pool is first created.
    pub fn set(mut settings: Settings) {
        settings.segment_bits = settings.segment_bits.min(MAX_SEGMENT_BITS);
        *SETTINGS
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = settings;
    }

    /// Get the worker pool used for parallel products.
    pub(crate) fn thread_pool() -> &'static ThreadPool {
        THREAD_POOL.get_or_init(|| {
            let mut builder = rayon::ThreadPoolBuilder::new();
            if let Some(n) = Settings::get().num_threads {
                builder = builder.num_threads(n);
            }

            builder.build().unwrap_or_else(|e| {
                warn!("could not create a worker pool ({}), using a single thread", e);
                rayon::ThreadPoolBuilder::new()
                    .num_threads(1)
                    .build()
                    .expect("a single-threaded pool can always be built")
            })
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let value = env::var(name).ok()?;
    match value.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("ignoring malformed value '{}' for {}", value, name);
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::Settings;

    #[test]
    fn defaults() {
        let s = Settings::default();
        assert!(s.parallel_threshold > 0);
        assert!(s.segment_bits <= super::MAX_SEGMENT_BITS);
    }
}
