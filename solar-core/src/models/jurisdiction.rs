use std::fmt;

use serde::{Deserialize, Serialize};

/// Australian state or territory used to select incentive parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Jurisdiction {
    Nsw,
    Vic,
    Qld,
    Sa,
    Wa,
    Tas,
    Act,
    Nt,
}

impl Jurisdiction {
    pub const ALL: [Jurisdiction; 8] = [
        Self::Nsw,
        Self::Vic,
        Self::Qld,
        Self::Sa,
        Self::Wa,
        Self::Tas,
        Self::Act,
        Self::Nt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nsw => "NSW",
            Self::Vic => "VIC",
            Self::Qld => "QLD",
            Self::Sa => "SA",
            Self::Wa => "WA",
            Self::Tas => "TAS",
            Self::Act => "ACT",
            Self::Nt => "NT",
        }
    }

    pub fn long_name(&self) -> &'static str {
        match self {
            Self::Nsw => "New South Wales",
            Self::Vic => "Victoria",
            Self::Qld => "Queensland",
            Self::Sa => "South Australia",
            Self::Wa => "Western Australia",
            Self::Tas => "Tasmania",
            Self::Act => "Australian Capital Territory",
            Self::Nt => "Northern Territory",
        }
    }

    /// Parses a short code (`"NSW"`, `"vic"`, ...). Case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        let code = s.trim();
        Self::ALL
            .into_iter()
            .find(|j| j.as_str().eq_ignore_ascii_case(code))
    }

    /// Interprets a geocoder region field, which may carry either the
    /// full state name or its abbreviation.
    pub fn from_region_name(region: &str) -> Option<Self> {
        let region = region.trim();
        Self::parse(region).or_else(|| {
            Self::ALL
                .into_iter()
                .find(|j| j.long_name().eq_ignore_ascii_case(region))
        })
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_accepts_codes_case_insensitively() {
        assert_eq!(Jurisdiction::parse("NSW"), Some(Jurisdiction::Nsw));
        assert_eq!(Jurisdiction::parse(" tas "), Some(Jurisdiction::Tas));
        assert_eq!(Jurisdiction::parse("DEFAULT"), None);
    }

    #[test]
    fn region_name_matches_long_and_short_forms() {
        assert_eq!(
            Jurisdiction::from_region_name("Victoria"),
            Some(Jurisdiction::Vic)
        );
        assert_eq!(
            Jurisdiction::from_region_name("australian capital territory"),
            Some(Jurisdiction::Act)
        );
        assert_eq!(Jurisdiction::from_region_name("QLD"), Some(Jurisdiction::Qld));
        assert_eq!(Jurisdiction::from_region_name("Auckland"), None);
    }

    #[test]
    fn display_uses_short_code() {
        assert_eq!(Jurisdiction::Wa.to_string(), "WA");
    }
}
