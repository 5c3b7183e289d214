use std::fmt;
use std::ops::Range;

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApprovalTypeId(pub String);

/// Escalation level of an approval type. Ordering follows escalation: `A < B < C`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ApprovalLevel {
    A,
    B,
    C,
}

impl ApprovalLevel {
    pub const ALL: [ApprovalLevel; 3] = [Self::A, Self::B, Self::C];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        }
    }

    /// Rank band handed to the remote service. Upper bound is exclusive and the
    /// bands never overlap, so any draw keeps `A < B < C`.
    pub fn rank_band(self) -> Range<u32> {
        match self {
            Self::A => 1..100,
            Self::B => 100..200,
            Self::C => 200..300,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            _ => None,
        }
    }
}

impl fmt::Display for ApprovalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approval type as sent to the approval integration service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewApprovalType {
    pub level: ApprovalLevel,
    pub rank: u32,
}

impl NewApprovalType {
    pub fn with_random_rank<R: Rng + ?Sized>(level: ApprovalLevel, rng: &mut R) -> Self {
        Self { level, rank: rng.gen_range(level.rank_band()) }
    }

    pub fn name(&self) -> &'static str {
        self.level.as_str()
    }

    pub fn description(&self) -> String {
        format!("Approval type {}", self.level)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalType {
    pub id: ApprovalTypeId,
    pub level: ApprovalLevel,
    pub rank: u32,
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{ApprovalLevel, NewApprovalType};

    #[test]
    fn random_ranks_stay_inside_their_band() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            let a = NewApprovalType::with_random_rank(ApprovalLevel::A, &mut rng);
            let b = NewApprovalType::with_random_rank(ApprovalLevel::B, &mut rng);
            let c = NewApprovalType::with_random_rank(ApprovalLevel::C, &mut rng);

            assert!((1..100).contains(&a.rank));
            assert!((100..200).contains(&b.rank));
            assert!((200..300).contains(&c.rank));
            assert!(a.rank < b.rank && b.rank < c.rank);
        }
    }

    #[test]
    fn name_is_the_level_letter() {
        let approval_type = NewApprovalType { level: ApprovalLevel::B, rank: 150 };
        assert_eq!(approval_type.name(), "B");
        assert_eq!(approval_type.description(), "Approval type B");
    }

    #[test]
    fn parse_accepts_lowercase_levels() {
        assert_eq!(ApprovalLevel::parse("c"), Some(ApprovalLevel::C));
        assert_eq!(ApprovalLevel::parse(" a "), Some(ApprovalLevel::A));
        assert_eq!(ApprovalLevel::parse("D"), None);
    }
}
