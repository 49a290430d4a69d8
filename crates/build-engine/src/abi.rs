//! Target ABIs
//!
//! The Android ABIs a runtime release ships native libraries for, and the
//! matching rules used by `create --targets`.

use std::fmt;
use std::str::FromStr;

/// Pseudo ABI of projects linking against a shared runtime installation
pub const SHARED_ABI: &str = "shared";

/// ABI errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    #[error("Unsupported ABI '{0}'")]
    Unsupported(String),
    #[error("No ABI matches '{0}'")]
    NoMatch(String),
    #[error("Projects can only be created for same-size ABIs ({0})")]
    MixedWordSize(String),
}

/// Android target ABI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Abi {
    ArmeabiV7a,
    Arm64V8a,
    X86,
    X86_64,
}

impl Abi {
    pub fn as_str(&self) -> &'static str {
        match self {
            Abi::ArmeabiV7a => "armeabi-v7a",
            Abi::Arm64V8a => "arm64-v8a",
            Abi::X86 => "x86",
            Abi::X86_64 => "x86_64",
        }
    }

    /// Native word size in bits
    pub fn word_size(&self) -> u32 {
        match self {
            Abi::ArmeabiV7a | Abi::X86 => 32,
            Abi::Arm64V8a | Abi::X86_64 => 64,
        }
    }

    pub fn all() -> &'static [Abi] {
        &[Abi::ArmeabiV7a, Abi::Arm64V8a, Abi::X86, Abi::X86_64]
    }

    /// ABIs matching `key`: an exact name, otherwise every ABI the key
    /// is a prefix of, or whose word size equals the key
    pub fn matching(key: &str) -> Vec<Abi> {
        if let Ok(abi) = key.parse::<Abi>() {
            return vec![abi];
        }
        if key.is_empty() {
            return Vec::new();
        }
        Abi::all()
            .iter()
            .copied()
            .filter(|abi| abi.as_str().starts_with(key) || abi.word_size().to_string() == key)
            .collect()
    }
}

impl fmt::Display for Abi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Abi {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Abi::all()
            .iter()
            .copied()
            .find(|abi| abi.as_str() == s)
            .ok_or_else(|| AbiError::Unsupported(s.to_string()))
    }
}

/// Expand requested target keys into ABIs, keeping request order and
/// dropping duplicates
pub fn expand_targets<S: AsRef<str>>(keys: &[S]) -> Result<Vec<Abi>, AbiError> {
    let mut abis = Vec::new();
    for key in keys {
        let key = key.as_ref();
        let matched = Abi::matching(key);
        if matched.is_empty() {
            return Err(AbiError::NoMatch(key.to_string()));
        }
        for abi in matched {
            if !abis.contains(&abi) {
                abis.push(abi);
            }
        }
    }
    Ok(abis)
}

/// Common word size of `abis`, `None` when empty
pub fn common_word_size(abis: &[Abi]) -> Result<Option<u32>, AbiError> {
    let Some(first) = abis.first() else {
        return Ok(None);
    };
    if abis.iter().any(|abi| abi.word_size() != first.word_size()) {
        let names: Vec<&str> = abis.iter().map(Abi::as_str).collect();
        return Err(AbiError::MixedWordSize(names.join(",")));
    }
    Ok(Some(first.word_size()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching() {
        assert_eq!(Abi::matching("x86"), vec![Abi::X86]);
        assert_eq!(Abi::matching("arm"), vec![Abi::ArmeabiV7a, Abi::Arm64V8a]);
        assert_eq!(Abi::matching("64"), vec![Abi::Arm64V8a, Abi::X86_64]);
        assert_eq!(Abi::matching("32"), vec![Abi::ArmeabiV7a, Abi::X86]);
        assert!(Abi::matching("mips").is_empty());
        assert!(Abi::matching("").is_empty());
    }

    #[test]
    fn test_expand_targets() {
        let abis = expand_targets(&["x86", "32"]).unwrap();
        assert_eq!(abis, vec![Abi::X86, Abi::ArmeabiV7a]);

        assert_eq!(
            expand_targets(&["mips"]),
            Err(AbiError::NoMatch("mips".into()))
        );
    }

    #[test]
    fn test_word_size() {
        assert_eq!(common_word_size(&[]), Ok(None));
        assert_eq!(common_word_size(&[Abi::Arm64V8a, Abi::X86_64]), Ok(Some(64)));

        let err = common_word_size(&[Abi::ArmeabiV7a, Abi::X86_64]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Projects can only be created for same-size ABIs (armeabi-v7a,x86_64)"
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!("arm64-v8a".parse::<Abi>(), Ok(Abi::Arm64V8a));
        assert!("shared".parse::<Abi>().is_err());
    }
}
