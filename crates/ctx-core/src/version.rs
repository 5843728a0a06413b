//! Version constraints for skill dependencies.
//!
//! The accepted grammar is deliberately small:
//!
//! ```text
//! ^MAJOR.MINOR.PATCH    caret: compatible within the leftmost non-zero part
//! ~MAJOR.MINOR.PATCH    tilde: same major.minor, patch may move forward
//! >=MAJOR.MINOR.PATCH   at least
//! MAJOR.MINOR.PATCH     exactly this version
//! latest                whatever the highest installed version is
//! ```
//!
//! Note that a bare `x.y.z` means *exact*, unlike cargo's caret default, so
//! requirement matching is implemented here and `semver` supplies only
//! version parsing and ordering.

use semver::Version;

use crate::errors::{CoreError, Result};

/// A parsed version constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    Caret(Version),
    Tilde(Version),
    AtLeast(Version),
    Exact(Version),
    Latest,
}

impl VersionSpec {
    /// Does `candidate` satisfy this constraint?
    pub fn matches(&self, candidate: &Version) -> bool {
        match self {
            VersionSpec::Latest => true,
            VersionSpec::Exact(want) => candidate == want,
            VersionSpec::AtLeast(min) => candidate >= min,
            VersionSpec::Tilde(base) => {
                candidate.major == base.major
                    && candidate.minor == base.minor
                    && candidate >= base
            }
            VersionSpec::Caret(base) => {
                if candidate < base {
                    return false;
                }
                if base.major != 0 {
                    candidate.major == base.major
                } else if base.minor != 0 {
                    candidate.major == 0 && candidate.minor == base.minor
                } else {
                    candidate.major == 0
                        && candidate.minor == 0
                        && candidate.patch == base.patch
                }
            }
        }
    }

    /// Pick the highest version in `available` satisfying this constraint.
    pub fn select<'a>(&self, available: &'a [Version]) -> Option<&'a Version> {
        available.iter().filter(|v| self.matches(v)).max()
    }
}

impl std::str::FromStr for VersionSpec {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let parse_version = |s: &str| -> Result<Version> {
            Version::parse(s.trim()).map_err(|err| CoreError::VersionSpec {
                spec: raw.to_string(),
                reason: err.to_string(),
            })
        };

        if raw.eq_ignore_ascii_case("latest") {
            Ok(VersionSpec::Latest)
        } else if let Some(rest) = raw.strip_prefix(">=") {
            Ok(VersionSpec::AtLeast(parse_version(rest)?))
        } else if let Some(rest) = raw.strip_prefix('^') {
            Ok(VersionSpec::Caret(parse_version(rest)?))
        } else if let Some(rest) = raw.strip_prefix('~') {
            Ok(VersionSpec::Tilde(parse_version(rest)?))
        } else if raw.is_empty() {
            Err(CoreError::VersionSpec {
                spec: raw.to_string(),
                reason: "empty version spec".to_string(),
            })
        } else {
            Ok(VersionSpec::Exact(parse_version(raw)?))
        }
    }
}

impl std::fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionSpec::Caret(v) => write!(f, "^{v}"),
            VersionSpec::Tilde(v) => write!(f, "~{v}"),
            VersionSpec::AtLeast(v) => write!(f, ">={v}"),
            VersionSpec::Exact(v) => write!(f, "{v}"),
            VersionSpec::Latest => f.write_str("latest"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn spec(s: &str) -> VersionSpec {
        s.parse().unwrap()
    }

    #[test]
    fn grammar_round_trips() {
        for raw in ["^1.2.3", "~0.4.1", ">=2.0.0", "1.0.0", "latest"] {
            assert_eq!(spec(raw).to_string(), raw);
        }
    }

    #[test]
    fn exact_matches_only_itself() {
        let s = spec("1.2.3");
        assert!(s.matches(&v("1.2.3")));
        assert!(!s.matches(&v("1.2.4")));
    }

    #[test]
    fn caret_allows_compatible_upgrades() {
        let s = spec("^1.2.3");
        assert!(s.matches(&v("1.2.3")));
        assert!(s.matches(&v("1.9.0")));
        assert!(!s.matches(&v("2.0.0")));
        assert!(!s.matches(&v("1.2.2")));
    }

    #[test]
    fn caret_is_strict_below_one() {
        let s = spec("^0.2.3");
        assert!(s.matches(&v("0.2.9")));
        assert!(!s.matches(&v("0.3.0")));

        let s = spec("^0.0.3");
        assert!(s.matches(&v("0.0.3")));
        assert!(!s.matches(&v("0.0.4")));
    }

    #[test]
    fn tilde_pins_minor() {
        let s = spec("~1.4.2");
        assert!(s.matches(&v("1.4.9")));
        assert!(!s.matches(&v("1.5.0")));
        assert!(!s.matches(&v("1.4.1")));
    }

    #[test]
    fn at_least_is_open_ended() {
        let s = spec(">=1.0.0");
        assert!(s.matches(&v("4.0.0")));
        assert!(!s.matches(&v("0.9.9")));
    }

    #[test]
    fn select_prefers_highest_match() {
        let available = vec![v("1.0.0"), v("1.4.0"), v("1.9.2"), v("2.0.0")];
        assert_eq!(spec("^1.0.0").select(&available), Some(&v("1.9.2")));
        assert_eq!(spec("latest").select(&available), Some(&v("2.0.0")));
        assert_eq!(spec("^3.0.0").select(&available), None);
    }

    #[test]
    fn malformed_specs_are_parse_errors() {
        assert!("abc".parse::<VersionSpec>().is_err());
        assert!("^1.x".parse::<VersionSpec>().is_err());
        assert!("".parse::<VersionSpec>().is_err());
    }
}
