//! Exit codes for the CLI

use liftoff_core::LiftoffError;

/// Success
pub const SUCCESS: u8 = 0;

/// General error
pub const ERROR: u8 = 1;

/// Configuration error (bad config, reserved target, unversionable package)
pub const CONFIG_ERROR: u8 = 2;

/// Error reported by the hosting platform
pub const REMOTE_ERROR: u8 = 3;

/// Version error
pub const VERSION_ERROR: u8 = 4;

/// Exit code for a failed run
pub fn for_error(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<LiftoffError>() {
        Some(LiftoffError::Config(_)) => CONFIG_ERROR,
        Some(LiftoffError::Remote(_)) => REMOTE_ERROR,
        Some(LiftoffError::Version(_)) => VERSION_ERROR,
        _ => ERROR,
    }
}
