use std::str::FromStr;

use crate::VersionError;

/// A product version of the form `v<N>`, where `N >= 1`.
///
/// Versions start at `v1` for a newly announced product and increment by one
/// for each subsequent mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductVersion(u64);

impl ProductVersion {
    /// Returns the first version (`v1`).
    pub fn first() -> Self {
        Self(1)
    }

    /// Returns the next version, or `None` on overflow.
    pub fn checked_next(&self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }

    /// Returns the numeric part.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Parses a `v<N>` string.
    ///
    /// Only ASCII digits are accepted after the `v`; signs, whitespace and
    /// suffixes such as `v1.0.0` are rejected.
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let digits = input
            .strip_prefix('v')
            .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()))
            .ok_or_else(|| VersionError::Malformed(input.to_string()))?;

        let value: u64 = digits
            .parse()
            .map_err(|_| VersionError::Overflow(input.to_string()))?;
        if value == 0 {
            return Err(VersionError::Malformed(input.to_string()));
        }
        Ok(Self(value))
    }
}

impl Default for ProductVersion {
    fn default() -> Self {
        Self::first()
    }
}

impl std::fmt::Display for ProductVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl FromStr for ProductVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Derives the version that follows `current`.
///
/// An empty input yields `v1`. Malformed input also yields `v1`, but the
/// fallback is logged at `warn` so that it does not go unnoticed.
pub fn next_version(current: &str) -> String {
    if current.is_empty() {
        return ProductVersion::first().to_string();
    }

    match ProductVersion::parse(current).and_then(|v| {
        v.checked_next()
            .ok_or_else(|| VersionError::Overflow(current.to_string()))
    }) {
        Ok(next) => next.to_string(),
        Err(error) => {
            tracing::warn!(%error, current, "unparsable product version, restarting at v1");
            ProductVersion::first().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_of_empty_is_v1() {
        assert_eq!(next_version(""), "v1");
    }

    #[test]
    fn next_increments_numeric_part() {
        assert_eq!(next_version("v1"), "v2");
        assert_eq!(next_version("v7"), "v8");
        assert_eq!(next_version("v9"), "v10");
        assert_eq!(next_version("v99"), "v100");
    }

    #[test]
    fn malformed_input_degrades_to_v1() {
        assert_eq!(next_version("banana"), "v1");
        assert_eq!(next_version("1.0.0"), "v1");
        assert_eq!(next_version("v1.0.0"), "v1");
        assert_eq!(next_version("v"), "v1");
        assert_eq!(next_version("v-3"), "v1");
        assert_eq!(next_version("v0"), "v1");
    }

    #[test]
    fn overflow_degrades_to_v1() {
        let max = format!("v{}", u64::MAX);
        assert_eq!(next_version(&max), "v1");
        assert_eq!(next_version("v99999999999999999999999"), "v1");
    }

    #[test]
    fn parse_accepts_only_v_prefixed_digits() {
        assert_eq!(ProductVersion::parse("v3").unwrap().as_u64(), 3);
        assert!(matches!(
            ProductVersion::parse(" v3"),
            Err(VersionError::Malformed(_))
        ));
        assert!(matches!(
            ProductVersion::parse("V3"),
            Err(VersionError::Malformed(_))
        ));
        assert!(matches!(
            ProductVersion::parse("v+3"),
            Err(VersionError::Malformed(_))
        ));
    }

    #[test]
    fn display_and_ordering() {
        let v1 = ProductVersion::first();
        let v2 = v1.checked_next().unwrap();
        assert!(v1 < v2);
        assert_eq!(v2.to_string(), "v2");
        assert_eq!("v2".parse::<ProductVersion>().unwrap(), v2);
    }
}
