// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Subscriber setup for applications and tests.
//!
//! The crates emit [`tracing`] events; nothing is printed until a subscriber is
//! installed. [`init`] installs one, once per process. `RUST_LOG` overrides the
//! profile's default filter.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Output style of [`init`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output at debug level.
    Development,
    /// JSON lines at info level.
    Production,
    /// Human-readable output at debug level, routed through the test harness capture.
    Test,
}

impl Profile {
    /// The filter used when `RUST_LOG` is unset.
    #[must_use]
    pub const fn default_filter(self) -> &'static str {
        match self {
            Self::Development | Self::Test => {
                "understory_element=debug,understory_work_queue=debug"
            }
            Self::Production => "understory_element=info,understory_work_queue=info",
        }
    }

    fn filter(self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_filter()))
    }
}

static INIT: Once = Once::new();

/// Installs the global subscriber for `profile`.
///
/// Only the first call has an effect. If another subscriber was installed elsewhere, it
/// is left in place.
///
/// ```
/// use understory_element::logging::{Profile, init};
///
/// init(Profile::Development);
/// ```
pub fn init(profile: Profile) {
    INIT.call_once(|| {
        let installed = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_env_filter(profile.filter())
                .try_init(),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_env_filter(profile.filter())
                .try_init(),
            Profile::Test => tracing_subscriber::fmt()
                .with_env_filter(profile.filter())
                .with_test_writer()
                .try_init(),
        };
        if installed.is_ok() {
            tracing::debug!(?profile, "logging initialized");
        }
    });
}
