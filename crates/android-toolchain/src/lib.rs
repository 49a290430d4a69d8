//! Android Toolchain
//!
//! Wrappers around the Android SDK command line tools:
//! - API target listing
//! - Project skeleton generation
//! - `ant` builds with streamed output

pub mod sdk;
pub mod targets;

pub use sdk::{filter_error_log, java_package_dir, scrape_tag, AndroidSdk, SdkError, SdkRunner, MIN_API_LEVEL};
pub use targets::{AndroidTarget, AndroidTargets};

