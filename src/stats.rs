// 📊 Membership Statistics - Count, revenue, per-year breakdown
//
// Operates on whatever record slice it is given, normally the current
// filtered view. Unrecognized year labels (possible via import) count
// toward the totals but are excluded from the per-year breakdown.

use serde::Serialize;

use crate::member::{Member, YearLevel};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MembershipStats {
    #[serde(rename = "totalMembers")]
    pub total_members: usize,

    #[serde(rename = "totalRevenue")]
    pub total_revenue: f64,

    #[serde(rename = "firstYearCount")]
    pub first_year: usize,

    #[serde(rename = "secondYearCount")]
    pub second_year: usize,

    #[serde(rename = "thirdYearCount")]
    pub third_year: usize,

    #[serde(rename = "fourthYearCount")]
    pub fourth_year: usize,
}

impl MembershipStats {
    /// Single pass over the given records.
    pub fn calculate(members: &[Member]) -> Self {
        let mut stats = MembershipStats {
            total_members: members.len(),
            ..Default::default()
        };

        for member in members {
            stats.total_revenue += member.membership_fee;

            match member.year_level() {
                Some(YearLevel::First) => stats.first_year += 1,
                Some(YearLevel::Second) => stats.second_year += 1,
                Some(YearLevel::Third) => stats.third_year += 1,
                Some(YearLevel::Fourth) => stats.fourth_year += 1,
                None => {}
            }
        }

        stats
    }

    pub fn count_for(&self, year: YearLevel) -> usize {
        match year {
            YearLevel::First => self.first_year,
            YearLevel::Second => self.second_year,
            YearLevel::Third => self.third_year,
            YearLevel::Fourth => self.fourth_year,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
