//! Regional size codes and the size buckets they resolve to.
//!
//! Shoppers pick a numeric size in their own region's system (EU 39, UK 5).
//! The cart stores the resolved bucket so the same product/size pair is
//! recognised whatever region it was added from.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sizing system the shopper chose a numeric size from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeRegion {
    EU,
    US,
    UK,
}

/// Size bucket stored on cart lines and order items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SizeCategory {
    S,
    M,
    L,
    XL,
    XXL,
    XXXL,
}

/// Lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizeError {
    #[error("unknown size region: {0}")]
    UnknownRegion(String),
    #[error("size {code} is not offered in region {region:?}")]
    UnknownCode { region: SizeRegion, code: i32 },
    #[error("unknown size: {0}")]
    UnknownSize(String),
    #[error("size table is inconsistent: {0}")]
    InvalidTable(String),
}

/// Every valid `(region, code)` pair and the bucket it maps to.
pub const SIZE_TABLE: [(SizeRegion, i32, SizeCategory); 18] = [
    (SizeRegion::EU, 38, SizeCategory::S),
    (SizeRegion::EU, 39, SizeCategory::M),
    (SizeRegion::EU, 40, SizeCategory::L),
    (SizeRegion::EU, 41, SizeCategory::XL),
    (SizeRegion::EU, 42, SizeCategory::XXL),
    (SizeRegion::EU, 43, SizeCategory::XXXL),
    (SizeRegion::US, 5, SizeCategory::S),
    (SizeRegion::US, 6, SizeCategory::M),
    (SizeRegion::US, 7, SizeCategory::L),
    (SizeRegion::US, 8, SizeCategory::XL),
    (SizeRegion::US, 9, SizeCategory::XXL),
    (SizeRegion::US, 10, SizeCategory::XXXL),
    (SizeRegion::UK, 4, SizeCategory::S),
    (SizeRegion::UK, 5, SizeCategory::M),
    (SizeRegion::UK, 6, SizeCategory::L),
    (SizeRegion::UK, 7, SizeCategory::XL),
    (SizeRegion::UK, 8, SizeCategory::XXL),
    (SizeRegion::UK, 9, SizeCategory::XXXL),
];

impl SizeRegion {
    /// All regions in table order.
    pub const ALL: [Self; 3] = [Self::EU, Self::US, Self::UK];
}

impl SizeCategory {
    /// All buckets, smallest first.
    pub const ALL: [Self; 6] = [Self::S, Self::M, Self::L, Self::XL, Self::XXL, Self::XXXL];

    /// Display label, identical to the serialized form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
            Self::XL => "XL",
            Self::XXL => "XXL",
            Self::XXXL => "XXXL",
        }
    }
}

impl std::fmt::Display for SizeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SizeRegion {
    type Err = SizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EU" => Ok(Self::EU),
            "US" => Ok(Self::US),
            "UK" => Ok(Self::UK),
            _ => Err(SizeError::UnknownRegion(s.to_owned())),
        }
    }
}

impl std::str::FromStr for SizeCategory {
    type Err = SizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|size| size.as_str() == s)
            .ok_or_else(|| SizeError::UnknownSize(s.to_owned()))
    }
}

/// Resolve a regional numeric size to its bucket.
///
/// # Errors
///
/// Returns `SizeError::UnknownCode` if the pair is not in [`SIZE_TABLE`].
pub fn resolve_size(region: SizeRegion, code: i32) -> Result<SizeCategory, SizeError> {
    SIZE_TABLE
        .iter()
        .find(|(r, c, _)| *r == region && *c == code)
        .map(|(_, _, size)| *size)
        .ok_or(SizeError::UnknownCode { region, code })
}

/// Check that every region maps each bucket exactly once through distinct codes.
///
/// Called once at startup so a bad edit to [`SIZE_TABLE`] fails fast.
///
/// # Errors
///
/// Returns `SizeError::InvalidTable` describing the first inconsistency.
pub fn validate_size_table() -> Result<(), SizeError> {
    for region in SizeRegion::ALL {
        let rows: Vec<_> = SIZE_TABLE.iter().filter(|(r, _, _)| *r == region).collect();

        for size in SizeCategory::ALL {
            let count = rows.iter().filter(|(_, _, s)| *s == size).count();
            if count != 1 {
                return Err(SizeError::InvalidTable(format!(
                    "{region:?} maps {size} {count} times"
                )));
            }
        }

        for (i, (_, code, _)) in rows.iter().enumerate() {
            if rows.iter().skip(i + 1).any(|(_, other, _)| other == code) {
                return Err(SizeError::InvalidTable(format!(
                    "{region:?} code {code} is duplicated"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_valid() {
        validate_size_table().unwrap();
    }

    #[test]
    fn test_every_table_pair_resolves() {
        for (region, code, size) in SIZE_TABLE {
            assert_eq!(resolve_size(region, code).unwrap(), size);
        }
    }

    #[test]
    fn test_eu_39_is_medium() {
        assert_eq!(resolve_size(SizeRegion::EU, 39).unwrap(), SizeCategory::M);
    }

    #[test]
    fn test_codes_outside_table_fail() {
        assert_eq!(
            resolve_size(SizeRegion::EU, 99),
            Err(SizeError::UnknownCode {
                region: SizeRegion::EU,
                code: 99
            })
        );
        // 10 is valid in the US but not in the UK
        assert!(resolve_size(SizeRegion::UK, 10).is_err());
        assert!(resolve_size(SizeRegion::US, 4).is_err());
    }

    #[test]
    fn test_same_code_differs_by_region() {
        assert_eq!(resolve_size(SizeRegion::US, 5).unwrap(), SizeCategory::S);
        assert_eq!(resolve_size(SizeRegion::UK, 5).unwrap(), SizeCategory::M);
    }

    #[test]
    fn test_parse_region_and_size() {
        assert_eq!("UK".parse::<SizeRegion>().unwrap(), SizeRegion::UK);
        assert!("FR".parse::<SizeRegion>().is_err());
        assert_eq!("XXL".parse::<SizeCategory>().unwrap(), SizeCategory::XXL);
        assert!("xl".parse::<SizeCategory>().is_err());
    }
}
