//! Build Engine
//!
//! Turns one generated Android project into a package per ABI: native
//! library toggling, version codes, output renaming and the sequential
//! build loop tying them together.

pub mod abi;
pub mod abi_loop;
pub mod apk;
pub mod toggle;
pub mod version_code;

pub use abi::{common_word_size, expand_targets, Abi, AbiError, SHARED_ABI};
pub use abi_loop::{AbiBuildLoop, BuildLoopError, BuildTool, ToolError};
pub use apk::{abify_apk_name, output_suffix, remove_unaligned, PackageError};
pub use toggle::{NativeLibs, ToggleError, LIBS_DIR, NATIVE_LIBS};
pub use version_code::{abi_code, VersionCodeError};
