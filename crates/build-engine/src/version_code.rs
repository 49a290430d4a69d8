//! Package Version Codes
//!
//! `android:versionCode` is laid out as `ammiiccc`: ABI code, then major,
//! minor and micro of the app version. Missing leading parts count as 0,
//! so codes grow with every release of the same ABI.

use crate::abi::SHARED_ABI;

/// Version code errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionCodeError {
    #[error("Unsupported ABI code '{0}'")]
    UnsupportedAbi(String),
    #[error("Invalid app version '{0}'")]
    InvalidAppVersion(String),
}

/// Leading digit for an ABI name
pub fn abi_code(abi: &str) -> Option<u32> {
    match abi {
        // Same as ARM
        SHARED_ABI => Some(2),
        "armeabi-v7a" => Some(2),
        "arm64-v8a" => Some(3),
        "x86" => Some(6),
        "x86_64" => Some(7),
        _ => None,
    }
}

/// Version code for `app_version` (`[major.][minor.]micro`) built for `abi`
pub fn generate(app_version: &str, abi: &str) -> Result<String, VersionCodeError> {
    let code = abi_code(abi).ok_or_else(|| VersionCodeError::UnsupportedAbi(abi.to_string()))?;
    let invalid = || VersionCodeError::InvalidAppVersion(app_version.to_string());

    let parts: Vec<&str> = app_version.split('.').collect();
    if parts.len() > 3 {
        return Err(invalid());
    }

    // micro, minor, major
    let widths = [3, 2, 2];
    let mut fields = Vec::with_capacity(3);
    let mut reversed = parts.iter().rev();
    for width in widths {
        let field = match reversed.next() {
            Some(part) => {
                if part.is_empty() || part.len() > width || !part.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(invalid());
                }
                format!("{:0>width$}", part, width = width)
            }
            None => "0".repeat(width),
        };
        fields.push(field);
    }
    fields.reverse();

    Ok(format!("{}{}", code, fields.concat()))
}
