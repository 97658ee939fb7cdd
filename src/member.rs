// 🎓 Member Record - Stable identity with display values
//
// "Member name is a VALUE (can change), member UUID is IDENTITY (never changes)"
//
// The control number is also immutable after registration: it is the
// human-facing registration code and survives edits, but not deletion
// (deleted numbers return to the reclaim pool).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// YEAR LEVEL
// ============================================================================

/// The four recognized year levels.
///
/// Stored on the record as a plain label so that imported data with an
/// unrecognized label is tolerated; the enum is the validation and
/// aggregation vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YearLevel {
    First,
    Second,
    Third,
    Fourth,
}

impl YearLevel {
    pub const ALL: [YearLevel; 4] = [
        YearLevel::First,
        YearLevel::Second,
        YearLevel::Third,
        YearLevel::Fourth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            YearLevel::First => "1st Year",
            YearLevel::Second => "2nd Year",
            YearLevel::Third => "3rd Year",
            YearLevel::Fourth => "4th Year",
        }
    }

    /// Parse a stored label. Returns None for anything outside the four
    /// recognized values.
    pub fn parse(label: &str) -> Option<YearLevel> {
        match label {
            "1st Year" => Some(YearLevel::First),
            "2nd Year" => Some(YearLevel::Second),
            "3rd Year" => Some(YearLevel::Third),
            "4th Year" => Some(YearLevel::Fourth),
            _ => None,
        }
    }
}

// ============================================================================
// MEMBER ENTITY
// ============================================================================

/// Member record.
///
/// Identity: UUID (never changes)
/// Immutable after registration: control_number, registration_date
/// Values: name, student_number, school_year, membership_fee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// Stable identity (UUID) - NEVER changes
    pub id: String,

    /// Display name
    pub name: String,

    /// External student number (e.g., "2021-0001")
    /// Unique among active records; reusable after deletion
    #[serde(rename = "studentNumber")]
    pub student_number: String,

    /// Year-level label ("1st Year" .. "4th Year")
    #[serde(rename = "schoolYear")]
    pub school_year: String,

    /// Membership fee, non-negative
    #[serde(rename = "membershipFee")]
    pub membership_fee: f64,

    /// Human-facing registration code, format PREFIX-MM-DD-NNN
    #[serde(rename = "controlNumber")]
    pub control_number: String,

    /// Calendar date of registration
    #[serde(rename = "registrationDate")]
    pub registration_date: NaiveDate,
}

impl Member {
    /// Create a new member with a fresh UUID identity.
    pub fn new(
        draft: MemberDraft,
        control_number: String,
        registration_date: NaiveDate,
    ) -> Self {
        Member {
            id: uuid::Uuid::new_v4().to_string(),
            name: draft.name,
            student_number: draft.student_number,
            school_year: draft.school_year,
            membership_fee: draft.membership_fee,
            control_number,
            registration_date,
        }
    }

    /// Year level, when the stored label is one of the recognized four.
    pub fn year_level(&self) -> Option<YearLevel> {
        YearLevel::parse(&self.school_year)
    }
}

// ============================================================================
// REGISTRATION DRAFT & UPDATE PATCH
// ============================================================================

/// Candidate for registration: everything the user supplies.
/// Identity, control number and date are assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDraft {
    pub name: String,
    #[serde(rename = "studentNumber")]
    pub student_number: String,
    #[serde(rename = "schoolYear")]
    pub school_year: String,
    #[serde(rename = "membershipFee")]
    pub membership_fee: f64,
}

/// Update payload. Identity and control number are immutable, so the
/// patch carries only the editable values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberPatch {
    pub name: String,
    #[serde(rename = "studentNumber")]
    pub student_number: String,
    #[serde(rename = "schoolYear")]
    pub school_year: String,
    #[serde(rename = "membershipFee")]
    pub membership_fee: f64,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_draft() -> MemberDraft {
        MemberDraft {
            name: "Ana Cruz".to_string(),
            student_number: "2021-0001".to_string(),
            school_year: "1st Year".to_string(),
            membership_fee: 20.0,
        }
    }

    #[test]
    fn test_member_creation() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let member = Member::new(create_test_draft(), "ICSO-03-15-001".to_string(), date);

        assert!(!member.id.is_empty());
        assert_eq!(member.name, "Ana Cruz");
        assert_eq!(member.student_number, "2021-0001");
        assert_eq!(member.school_year, "1st Year");
        assert_eq!(member.membership_fee, 20.0);
        assert_eq!(member.control_number, "ICSO-03-15-001");
        assert_eq!(member.registration_date, date);
    }

    #[test]
    fn test_member_ids_are_unique() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let a = Member::new(create_test_draft(), "ICSO-03-15-001".to_string(), date);
        let b = Member::new(create_test_draft(), "ICSO-03-15-002".to_string(), date);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_year_level_labels() {
        assert_eq!(YearLevel::First.as_str(), "1st Year");
        assert_eq!(YearLevel::Fourth.as_str(), "4th Year");

        assert_eq!(YearLevel::parse("2nd Year"), Some(YearLevel::Second));
        assert_eq!(YearLevel::parse("3rd Year"), Some(YearLevel::Third));
        assert_eq!(YearLevel::parse("5th Year"), None);
        assert_eq!(YearLevel::parse(""), None);
    }

    #[test]
    fn test_member_year_level_unrecognized() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let mut member = Member::new(create_test_draft(), "ICSO-03-15-001".to_string(), date);
        assert_eq!(member.year_level(), Some(YearLevel::First));

        member.school_year = "Alumni".to_string();
        assert_eq!(member.year_level(), None);
    }

    #[test]
    fn test_member_serde_wire_names() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let member = Member::new(create_test_draft(), "ICSO-03-15-001".to_string(), date);

        let json = serde_json::to_value(&member).unwrap();
        assert_eq!(json["studentNumber"], "2021-0001");
        assert_eq!(json["schoolYear"], "1st Year");
        assert_eq!(json["membershipFee"], 20.0);
        assert_eq!(json["controlNumber"], "ICSO-03-15-001");
        assert_eq!(json["registrationDate"], "2024-03-15");

        let back: Member = serde_json::from_value(json).unwrap();
        assert_eq!(back.id, member.id);
        assert_eq!(back.registration_date, date);
    }
}
