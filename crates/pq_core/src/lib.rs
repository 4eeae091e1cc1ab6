//! pq_core: value types shared by every podium crate.
//!
//! This crate is **I/O-free**. It defines:
//! - `Subject`: anything that can be ranked, identified by its string form
//! - `OwnerId`: the contest participant a prediction belongs to
//! - `Score` / `ScoreType`: homogeneous, totally ordered table scores
//! - `SortDirection`: ascending or descending tables
//! - `Schedule`: rank position → points
//!
//! Serialization derives are gated behind the `serde` feature.

#![forbid(unsafe_code)]

pub mod errors {
    use core::fmt;

    /// Minimal error set for core-domain validation & parsing.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub enum CoreError {
        InvalidToken,
        UnknownScoreType,
        UnknownDirection,
        DomainOutOfRange(&'static str),
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::InvalidToken => write!(f, "invalid token"),
                CoreError::UnknownScoreType => write!(f, "unknown score type"),
                CoreError::UnknownDirection => write!(f, "unknown sort direction"),
                CoreError::DomainOutOfRange(k) => write!(f, "domain out of range: {k}"),
            }
        }
    }

    impl std::error::Error for CoreError {}
}

pub mod tokens {
    //! `Subject` and `OwnerId`.

    use crate::errors::CoreError;
    use core::fmt;
    use core::str::FromStr;

    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    /// A ranked entity (driver, team, race, raw answer).
    ///
    /// Identity and natural order are both the string representation; two
    /// subjects that print the same are the same subject.
    #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct Subject(String);

    impl Subject {
        pub fn new(s: impl Into<String>) -> Self { Self(s.into()) }

        /// Subject for any displayable value, e.g. `Subject::of(&7)` for a numeric answer.
        pub fn of<T: fmt::Display + ?Sized>(v: &T) -> Self { Self(v.to_string()) }

        pub fn as_str(&self) -> &str { &self.0 }
    }

    impl fmt::Display for Subject {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.pad(&self.0) }
    }

    impl From<&str> for Subject {
        fn from(s: &str) -> Self { Self(s.to_string()) }
    }

    impl From<String> for Subject {
        fn from(s: String) -> Self { Self(s) }
    }

    fn is_owner_token(s: &str) -> bool {
        let n = s.chars().count();
        (1..=128).contains(&n)
            && s.trim() == s
            && !s.chars().any(char::is_control)
    }

    /// Contest participant name. Non-empty, no surrounding whitespace, no control chars.
    #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
    pub struct OwnerId(String);

    impl OwnerId {
        pub fn as_str(&self) -> &str { &self.0 }
    }

    impl fmt::Display for OwnerId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.pad(&self.0) }
    }

    impl FromStr for OwnerId {
        type Err = CoreError;
        fn from_str(s: &str) -> Result<Self, Self::Err> {
            if is_owner_token(s) { Ok(Self(s.to_string())) } else { Err(CoreError::InvalidToken) }
        }
    }

    impl TryFrom<String> for OwnerId {
        type Error = CoreError;
        fn try_from(s: String) -> Result<Self, Self::Error> {
            if is_owner_token(&s) { Ok(Self(s)) } else { Err(CoreError::InvalidToken) }
        }
    }

    impl From<OwnerId> for String {
        fn from(o: OwnerId) -> Self { o.0 }
    }

    /// Owners rank alongside real-world subjects in result tables.
    impl From<&OwnerId> for Subject {
        fn from(o: &OwnerId) -> Self { Subject(o.0.clone()) }
    }
}

pub mod score {
    //! Table scores: one declared type per table, total order within a type.

    use crate::errors::CoreError;
    use core::cmp::Ordering;
    use core::fmt;
    use core::str::FromStr;

    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
    pub enum ScoreType {
        Int,
        Float,
        Text,
    }

    impl ScoreType {
        pub fn as_str(&self) -> &'static str {
            match self {
                ScoreType::Int => "int",
                ScoreType::Float => "float",
                ScoreType::Text => "text",
            }
        }
    }

    impl fmt::Display for ScoreType {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
    }

    impl FromStr for ScoreType {
        type Err = CoreError;
        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "int" => Ok(ScoreType::Int),
                "float" => Ok(ScoreType::Float),
                "text" | "str" => Ok(ScoreType::Text),
                _ => Err(CoreError::UnknownScoreType),
            }
        }
    }

    /// A row score. Comparisons across variants order by variant (Int < Float < Text);
    /// tables never mix variants.
    #[derive(Clone, Debug)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "serde", serde(untagged))]
    pub enum Score {
        Int(i64),
        Float(f64),
        Text(String),
    }

    impl Score {
        pub fn score_type(&self) -> ScoreType {
            match self {
                Score::Int(_) => ScoreType::Int,
                Score::Float(_) => ScoreType::Float,
                Score::Text(_) => ScoreType::Text,
            }
        }

        /// Numeric view; `None` for text scores.
        pub fn as_f64(&self) -> Option<f64> {
            match self {
                Score::Int(v) => Some(*v as f64),
                Score::Float(v) => Some(*v),
                Score::Text(_) => None,
            }
        }

        fn variant_rank(&self) -> u8 {
            match self {
                Score::Int(_) => 0,
                Score::Float(_) => 1,
                Score::Text(_) => 2,
            }
        }
    }

    impl Ord for Score {
        fn cmp(&self, other: &Self) -> Ordering {
            match (self, other) {
                (Score::Int(a), Score::Int(b)) => a.cmp(b),
                // 0.0 == -0.0 ties; everything else (NaN included) follows total_cmp.
                (Score::Float(a), Score::Float(b)) if a == b => Ordering::Equal,
                (Score::Float(a), Score::Float(b)) => a.total_cmp(b),
                (Score::Text(a), Score::Text(b)) => a.cmp(b),
                _ => self.variant_rank().cmp(&other.variant_rank()),
            }
        }
    }

    impl PartialOrd for Score {
        fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
    }

    impl PartialEq for Score {
        fn eq(&self, other: &Self) -> bool { self.cmp(other) == Ordering::Equal }
    }

    impl Eq for Score {}

    impl fmt::Display for Score {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Score::Int(v) => fmt::Display::fmt(v, f),
                Score::Float(v) => fmt::Display::fmt(v, f),
                Score::Text(s) => f.pad(s),
            }
        }
    }

    impl From<i64> for Score {
        fn from(v: i64) -> Self { Score::Int(v) }
    }

    impl From<f64> for Score {
        fn from(v: f64) -> Self { Score::Float(v) }
    }

    impl From<&str> for Score {
        fn from(v: &str) -> Self { Score::Text(v.to_string()) }
    }

    /// Table sort direction. Descending (highest score first) is the default.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
    pub enum SortDirection {
        Ascending,
        #[default]
        Descending,
    }

    impl SortDirection {
        pub fn as_str(self) -> &'static str {
            match self {
                SortDirection::Ascending => "ascending",
                SortDirection::Descending => "descending",
            }
        }

        /// Orient an ascending comparison.
        #[inline]
        pub fn apply(self, ord: Ordering) -> Ordering {
            match self {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        }
    }

    impl FromStr for SortDirection {
        type Err = CoreError;
        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "ascending" | "asc" => Ok(SortDirection::Ascending),
                "descending" | "desc" => Ok(SortDirection::Descending),
                _ => Err(CoreError::UnknownDirection),
            }
        }
    }
}

pub mod schedule {
    //! Points schedules (rank position → points).

    use crate::errors::CoreError;
    use std::collections::BTreeMap;

    #[cfg(feature = "serde")]
    use serde::{Deserialize, Serialize};

    /// Mapping from 1-based rank to points. Need not be total; unmapped ranks score 0.
    /// Negative points (penalties) are allowed.
    #[derive(Clone, Debug, Default, Eq, PartialEq)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "serde", serde(try_from = "BTreeMap<u32, i64>", into = "BTreeMap<u32, i64>"))]
    pub struct Schedule {
        points: BTreeMap<u32, i64>,
    }

    impl Schedule {
        pub fn new<I: IntoIterator<Item = (u32, i64)>>(pairs: I) -> Result<Self, CoreError> {
            let mut points = BTreeMap::new();
            for (rank, pts) in pairs {
                if rank == 0 {
                    return Err(CoreError::DomainOutOfRange("schedule rank must be >= 1"));
                }
                points.insert(rank, pts);
            }
            Ok(Self { points })
        }

        /// Championship points: 25-18-15-12-10-8-6-4-2-1, zero down to 20th.
        pub fn f1() -> Self {
            Self::dense(&[25, 18, 15, 12, 10, 8, 6, 4, 2, 1], 20)
        }

        /// Sprint points: 8 down to 1, zero down to 20th.
        pub fn sprint() -> Self {
            Self::dense(&[8, 7, 6, 5, 4, 3, 2, 1], 20)
        }

        /// Built-in schedules by name.
        pub fn builtin(name: &str) -> Option<Self> {
            match name {
                "f1" => Some(Self::f1()),
                "sprint" => Some(Self::sprint()),
                _ => None,
            }
        }

        fn dense(top: &[i64], through: u32) -> Self {
            let points = (1..=through)
                .map(|rank| (rank, top.get(rank as usize - 1).copied().unwrap_or(0)))
                .collect();
            Self { points }
        }

        /// Explicitly mapped points for `rank`.
        #[inline]
        pub fn get(&self, rank: u32) -> Option<i64> { self.points.get(&rank).copied() }

        /// Points for `rank`, 0 when unmapped.
        #[inline]
        pub fn points_at(&self, rank: u32) -> i64 { self.get(rank).unwrap_or(0) }

        /// Entries in ascending rank order.
        pub fn iter(&self) -> impl Iterator<Item = (u32, i64)> + '_ {
            self.points.iter().map(|(r, p)| (*r, *p))
        }

        pub fn len(&self) -> usize { self.points.len() }

        pub fn is_empty(&self) -> bool { self.points.is_empty() }

        /// Highest rank mapped, if any.
        pub fn max_rank(&self) -> Option<u32> { self.points.keys().next_back().copied() }
    }

    impl TryFrom<BTreeMap<u32, i64>> for Schedule {
        type Error = CoreError;
        fn try_from(m: BTreeMap<u32, i64>) -> Result<Self, Self::Error> { Self::new(m) }
    }

    impl From<Schedule> for BTreeMap<u32, i64> {
        fn from(s: Schedule) -> Self { s.points }
    }
}

pub use errors::CoreError;
pub use schedule::Schedule;
pub use score::{Score, ScoreType, SortDirection};
pub use tokens::{OwnerId, Subject};

/* ---------------------------------- Tests --------------------------------- */
