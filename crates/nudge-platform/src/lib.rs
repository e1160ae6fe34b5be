//! Host platform details for nudge: where per-application state lives on
//! disk and what the running device looks like.

mod device;
mod paths;

pub use device::{DeviceInfo, normalize_locale};
pub use paths::{AppPaths, AppPathsError};
