//! Android API Targets
//!
//! Parses the output of `android list target`:
//!
//! ```text
//! ----------
//! id: 2 or "android-19"
//!      Name: Android 4.4.2
//!      API level: 19
//!  Tag/ABIs : default/armeabi-v7a, default/x86
//! ----------
//! ```

use regex::Regex;

const ABI_LINE: &str = " Tag/ABIs : ";
const SEPARATOR: &str = "----------";
const NO_ABIS: &str = " no ABIs.";

/// One installed API target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AndroidTarget {
    /// Target name, e.g. "android-19"
    pub name: String,
    /// Raw ABI list, e.g. " default/armeabi-v7a, default/x86"
    pub abis: String,
}

impl AndroidTarget {
    /// API level from the target name
    pub fn api_level(&self) -> Option<u32> {
        self.name.split('-').nth(1).and_then(|level| level.parse().ok())
    }

    pub fn has_abis(&self) -> bool {
        self.abis != NO_ABIS
    }
}

/// Targets in listing order
#[derive(Debug, Clone, Default)]
pub struct AndroidTargets {
    targets: Vec<AndroidTarget>,
}

impl AndroidTargets {
    /// Parse the listing. With `only_with_abis`, targets without system
    /// images are left out.
    pub fn parse(listing: &str, only_with_abis: bool) -> Self {
        let id_line = Regex::new(r#"^id: .*"([^"]+)""#).expect("valid target regex");

        let mut targets = Vec::new();
        let mut current: Option<String> = None;

        for line in listing.split('\n') {
            if let Some(caps) = id_line.captures(line) {
                current = Some(caps[1].to_string());
            }

            if let Some(name) = &current {
                if let Some(rest) = line.strip_prefix(ABI_LINE) {
                    let abis = format!(" {}", rest);
                    if abis != NO_ABIS || !only_with_abis {
                        targets.push(AndroidTarget {
                            name: name.clone(),
                            abis,
                        });
                        current = None;
                    }
                }
            }

            if line == SEPARATOR {
                current = None;
            }
        }

        Self { targets }
    }

    pub fn targets(&self) -> &[AndroidTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Lowest target with at least `min_api_level`
    pub fn pick_lowest(&self, min_api_level: u32) -> Option<&AndroidTarget> {
        self.targets
            .iter()
            .filter_map(|t| t.api_level().map(|level| (level, t)))
            .filter(|(level, _)| *level >= min_api_level)
            .min_by_key(|(level, _)| *level)
            .map(|(_, t)| t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "Available Android targets:
----------
id: 1 or \"android-18\"
     Name: Android 4.3.1
     Type: Platform
     API level: 18
     Revision: 3
 Tag/ABIs : no ABIs.
----------
id: 2 or \"android-19\"
     Name: Android 4.4.2
     Type: Platform
     API level: 19
     Revision: 4
 Tag/ABIs : default/armeabi-v7a, default/x86
----------
id: 3 or \"android-21\"
     Name: Android 5.0
     Type: Platform
     API level: 21
     Revision: 1
 Tag/ABIs : no ABIs.
----------
id: 4 or \"android-23\"
     Name: Android 6.0
     Type: Platform
     API level: 23
     Revision: 2
 Tag/ABIs : android-tv/armeabi-v7a";

    #[test]
    fn test_parse() {
        let all = AndroidTargets::parse(LISTING, false);
        assert_eq!(all.len(), 4);
        assert_eq!(all.targets()[1].name, "android-19");
        assert_eq!(all.targets()[1].abis, " default/armeabi-v7a, default/x86");
        assert!(!all.targets()[0].has_abis());

        let with_abis = AndroidTargets::parse(LISTING, true);
        assert_eq!(with_abis.len(), 2);
    }

    #[test]
    fn test_pick_lowest() {
        let targets = AndroidTargets::parse(LISTING, false);
        assert_eq!(targets.pick_lowest(14).unwrap().name, "android-18");
        assert_eq!(targets.pick_lowest(21).unwrap().name, "android-21");
        assert_eq!(targets.pick_lowest(22).unwrap().name, "android-23");
        assert!(targets.pick_lowest(30).is_none());
    }

    #[test]
    fn test_empty_listing() {
        let targets = AndroidTargets::parse("", false);
        assert!(targets.is_empty());
        assert!(targets.pick_lowest(21).is_none());
    }
}
