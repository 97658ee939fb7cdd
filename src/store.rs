// 🗃️ Member Store - Authoritative collection + reclaim pool
//
// Owns every active record and mediates all mutations. Reads return
// records in insertion order. Deleted records are gone; only their
// control numbers survive, in the allocator's reclaim pool.

use chrono::{Local, NaiveDate};

use crate::allocator::ControlNumberAllocator;
use crate::member::{Member, MemberDraft, MemberPatch};

// ============================================================================
// STORE ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Missing/invalid field or duplicate student number. Nothing applied.
    Validation { field: String, message: String },

    /// Operation targeted an id with no active record.
    NotFound { id: String },

    /// Every sequence number 001-999 is taken for the day.
    SequenceExhausted,

    /// A register/update submission is already in progress.
    SubmissionInProgress,
}

impl StoreError {
    fn validation(field: &str, message: &str) -> Self {
        StoreError::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Validation { field, message } => write!(f, "{}: {}", field, message),
            StoreError::NotFound { id } => write!(f, "Member not found: {}", id),
            StoreError::SequenceExhausted => {
                write!(f, "Control number sequence exhausted (001-999) for this date")
            }
            StoreError::SubmissionInProgress => write!(f, "A submission is already in progress"),
        }
    }
}

impl std::error::Error for StoreError {}

// ============================================================================
// FILTER CRITERIA
// ============================================================================

/// Read-side filter. Clauses AND together; the free-text clause ORs
/// across name, student number and control number.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    /// Case-insensitive substring match; empty string disables the clause
    pub search: String,

    /// Exact year-level label match
    pub year: Option<String>,

    /// Inclusive lower bound on registration date
    pub date_from: Option<NaiveDate>,

    /// Inclusive upper bound on registration date
    pub date_to: Option<NaiveDate>,
}

impl FilterCriteria {
    pub fn matches(&self, member: &Member) -> bool {
        if !self.search.is_empty() {
            let term = self.search.to_lowercase();
            let hit = member.name.to_lowercase().contains(&term)
                || member.student_number.to_lowercase().contains(&term)
                || member.control_number.to_lowercase().contains(&term);
            if !hit {
                return false;
            }
        }

        if let Some(year) = &self.year {
            if &member.school_year != year {
                return false;
            }
        }

        if let Some(from) = self.date_from {
            if member.registration_date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if member.registration_date > to {
                return false;
            }
        }

        true
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty()
            && self.year.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }
}

// ============================================================================
// MEMBER STORE
// ============================================================================

pub struct MemberStore {
    /// Active records, insertion order
    members: Vec<Member>,

    allocator: ControlNumberAllocator,

    /// Double-submit guard around register/update. Advisory: the runtime
    /// model is synchronous, this only refuses re-entry.
    in_flight: bool,
}

impl MemberStore {
    /// Create an empty store with the default control-number prefix.
    pub fn new() -> Self {
        MemberStore {
            members: Vec::new(),
            allocator: ControlNumberAllocator::new(),
            in_flight: false,
        }
    }

    pub fn with_prefix(prefix: &str) -> Self {
        MemberStore {
            members: Vec::new(),
            allocator: ControlNumberAllocator::with_prefix(prefix),
            in_flight: false,
        }
    }

    // ========================================================================
    // READS
    // ========================================================================

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Control numbers waiting for reuse, in reuse order.
    pub fn reclaimed_numbers(&self) -> &[String] {
        self.allocator.reclaimed()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight
    }

    /// Pure read: records matching all of the criteria's clauses, in
    /// insertion order. Does not mutate the store.
    pub fn filter(&self, criteria: &FilterCriteria) -> Vec<Member> {
        self.members
            .iter()
            .filter(|m| criteria.matches(m))
            .cloned()
            .collect()
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Register a candidate, stamping today's (local) date.
    pub fn register(&mut self, draft: MemberDraft) -> Result<Member, StoreError> {
        self.register_on(draft, Local::now().date_naive())
    }

    /// Register a candidate with an explicit registration date.
    pub fn register_on(
        &mut self,
        draft: MemberDraft,
        date: NaiveDate,
    ) -> Result<Member, StoreError> {
        if self.in_flight {
            return Err(StoreError::SubmissionInProgress);
        }
        self.in_flight = true;
        let result = self.do_register(draft, date);
        self.in_flight = false;
        result
    }

    fn do_register(&mut self, draft: MemberDraft, date: NaiveDate) -> Result<Member, StoreError> {
        let student_number = draft.student_number.trim().to_string();
        if student_number.is_empty() {
            return Err(StoreError::validation(
                "studentNumber",
                "Student number is required",
            ));
        }

        if self
            .members
            .iter()
            .any(|m| m.student_number == student_number)
        {
            return Err(StoreError::validation(
                "studentNumber",
                "Student number already exists",
            ));
        }

        let name = draft.name.trim().to_string();
        if name.is_empty() {
            return Err(StoreError::validation("name", "Name is required"));
        }

        if draft.school_year.trim().is_empty() {
            return Err(StoreError::validation("schoolYear", "Year level is required"));
        }

        if draft.membership_fee.is_nan() || draft.membership_fee < 0.0 {
            return Err(StoreError::validation(
                "membershipFee",
                "Membership fee must be a non-negative number",
            ));
        }

        // Allocate last: a validation failure must not consume a pooled number
        let control_number = self.allocator.allocate(date, &self.members)?;

        let member = Member::new(
            MemberDraft {
                name,
                student_number,
                school_year: draft.school_year,
                membership_fee: draft.membership_fee,
            },
            control_number,
            date,
        );

        self.members.push(member.clone());
        Ok(member)
    }

    /// Merge a patch into an existing record. Identity and control number
    /// are immutable and survive the merge untouched.
    pub fn update(&mut self, id: &str, patch: MemberPatch) -> Result<Member, StoreError> {
        if self.in_flight {
            return Err(StoreError::SubmissionInProgress);
        }
        self.in_flight = true;
        let result = self.do_update(id, patch);
        self.in_flight = false;
        result
    }

    fn do_update(&mut self, id: &str, patch: MemberPatch) -> Result<Member, StoreError> {
        let index = self
            .members
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        let student_number = patch.student_number.trim().to_string();
        if student_number.is_empty() {
            return Err(StoreError::validation(
                "studentNumber",
                "Student number is required",
            ));
        }

        // Collision only counts against a *different* record
        if self
            .members
            .iter()
            .any(|m| m.student_number == student_number && m.id != id)
        {
            return Err(StoreError::validation(
                "studentNumber",
                "Student number already exists",
            ));
        }

        let name = patch.name.trim().to_string();
        if name.is_empty() {
            return Err(StoreError::validation("name", "Name is required"));
        }

        if patch.school_year.trim().is_empty() {
            return Err(StoreError::validation("schoolYear", "Year level is required"));
        }

        if patch.membership_fee.is_nan() || patch.membership_fee < 0.0 {
            return Err(StoreError::validation(
                "membershipFee",
                "Membership fee must be a non-negative number",
            ));
        }

        let member = &mut self.members[index];
        member.name = name;
        member.student_number = student_number;
        member.school_year = patch.school_year;
        member.membership_fee = patch.membership_fee;

        Ok(member.clone())
    }

    /// Remove a record and return its control number to the reclaim pool.
    pub fn delete(&mut self, id: &str) -> Result<Member, StoreError> {
        let index = self
            .members
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;

        let removed = self.members.remove(index);
        self.allocator.reclaim(removed.control_number.clone());
        Ok(removed)
    }

    /// Clear the collection and the reclaim pool unconditionally.
    pub fn delete_all(&mut self) {
        self.members.clear();
        self.allocator.clear();
    }

    /// Wholesale state swap (startup load, JSON import).
    pub fn replace_state(&mut self, members: Vec<Member>, reclaimed: Vec<String>) {
        self.members = members;
        self.allocator.restore(reclaimed);
    }
}

impl Default for MemberStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn create_test_draft(number: &str) -> MemberDraft {
        MemberDraft {
            name: "Ana Cruz".to_string(),
            student_number: number.to_string(),
            school_year: "1st Year".to_string(),
            membership_fee: 20.0,
        }
    }

    fn create_test_patch(member: &Member) -> MemberPatch {
        MemberPatch {
            name: member.name.clone(),
            student_number: member.student_number.clone(),
            school_year: member.school_year.clone(),
            membership_fee: member.membership_fee,
        }
    }

    #[test]
    fn test_register_assigns_identity_and_control_number() {
        let mut store = MemberStore::new();
        let member = store
            .register_on(create_test_draft("2021-0001"), test_date())
            .unwrap();

        assert!(!member.id.is_empty());
        assert_eq!(member.control_number, "ICSO-03-15-001");
        assert_eq!(member.registration_date, test_date());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_register_sequences_control_numbers() {
        let mut store = MemberStore::new();
        let a = store
            .register_on(create_test_draft("2021-0001"), test_date())
            .unwrap();
        let b = store
            .register_on(create_test_draft("2021-0002"), test_date())
            .unwrap();

        assert_eq!(a.control_number, "ICSO-03-15-001");
        assert_eq!(b.control_number, "ICSO-03-15-002");
    }

    #[test]
    fn test_delete_then_register_reuses_control_number() {
        // Ana registers, is deleted, Ben reuses her number the same day
        let mut store = MemberStore::new();
        let ana = store
            .register_on(create_test_draft("2021-0001"), test_date())
            .unwrap();
        assert_eq!(ana.control_number, "ICSO-03-15-001");

        store.delete(&ana.id).unwrap();

        let mut draft = create_test_draft("2021-0002");
        draft.name = "Ben Reyes".to_string();
        draft.school_year = "2nd Year".to_string();
        let ben = store.register_on(draft, test_date()).unwrap();

        assert_eq!(ben.control_number, "ICSO-03-15-001");
        assert!(store.reclaimed_numbers().is_empty());
    }

    #[test]
    fn test_reuse_prefers_lexicographically_smallest() {
        let mut store = MemberStore::new();
        let mut ids = Vec::new();
        for n in 1..=3 {
            let member = store
                .register_on(create_test_draft(&format!("2021-000{}", n)), test_date())
                .unwrap();
            ids.push(member.id);
        }

        // Delete 003 first, then 001: pool is sorted, not FIFO
        store.delete(&ids[2]).unwrap();
        store.delete(&ids[0]).unwrap();
        assert_eq!(
            store.reclaimed_numbers(),
            &[
                "ICSO-03-15-001".to_string(),
                "ICSO-03-15-003".to_string()
            ]
        );

        let next = store
            .register_on(create_test_draft("2021-0004"), test_date())
            .unwrap();
        assert_eq!(next.control_number, "ICSO-03-15-001");
    }

    #[test]
    fn test_register_duplicate_student_number_rejected() {
        let mut store = MemberStore::new();
        store
            .register_on(create_test_draft("2021-0001"), test_date())
            .unwrap();

        let result = store.register_on(create_test_draft("2021-0001"), test_date());
        assert!(matches!(result, Err(StoreError::Validation { .. })));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_register_blank_fields_rejected() {
        let mut store = MemberStore::new();

        let mut draft = create_test_draft("  ");
        assert!(store.register_on(draft, test_date()).is_err());

        draft = create_test_draft("2021-0001");
        draft.name = "   ".to_string();
        assert!(store.register_on(draft, test_date()).is_err());

        draft = create_test_draft("2021-0001");
        draft.school_year = String::new();
        assert!(store.register_on(draft, test_date()).is_err());

        assert!(store.is_empty());
    }

    #[test]
    fn test_register_fee_validation() {
        let mut store = MemberStore::new();

        let mut draft = create_test_draft("2021-0001");
        draft.membership_fee = -5.0;
        assert!(store.register_on(draft, test_date()).is_err());

        draft = create_test_draft("2021-0001");
        draft.membership_fee = f64::NAN;
        assert!(store.register_on(draft, test_date()).is_err());

        // Zero is a valid non-negative fee
        draft = create_test_draft("2021-0001");
        draft.membership_fee = 0.0;
        let member = store.register_on(draft, test_date()).unwrap();
        assert_eq!(member.membership_fee, 0.0);
    }

    #[test]
    fn test_register_trims_whitespace() {
        let mut store = MemberStore::new();
        let mut draft = create_test_draft("  2021-0001  ");
        draft.name = "  Ana Cruz  ".to_string();

        let member = store.register_on(draft, test_date()).unwrap();
        assert_eq!(member.name, "Ana Cruz");
        assert_eq!(member.student_number, "2021-0001");
    }

    #[test]
    fn test_failed_validation_leaves_pool_untouched() {
        let mut store = MemberStore::new();
        let ana = store
            .register_on(create_test_draft("2021-0001"), test_date())
            .unwrap();
        store.delete(&ana.id).unwrap();
        assert_eq!(store.reclaimed_numbers().len(), 1);

        // Blank name fails before allocation; the pooled number stays put
        let mut draft = create_test_draft("2021-0002");
        draft.name = String::new();
        assert!(store.register_on(draft, test_date()).is_err());
        assert_eq!(store.reclaimed_numbers().len(), 1);
    }

    #[test]
    fn test_update_merges_values_keeps_identity() {
        let mut store = MemberStore::new();
        let member = store
            .register_on(create_test_draft("2021-0001"), test_date())
            .unwrap();

        let mut patch = create_test_patch(&member);
        patch.name = "Ana C. Cruz".to_string();
        patch.school_year = "2nd Year".to_string();
        patch.membership_fee = 25.0;

        let updated = store.update(&member.id, patch).unwrap();
        assert_eq!(updated.id, member.id);
        assert_eq!(updated.control_number, member.control_number);
        assert_eq!(updated.name, "Ana C. Cruz");
        assert_eq!(updated.school_year, "2nd Year");
        assert_eq!(updated.membership_fee, 25.0);
        assert_eq!(updated.registration_date, member.registration_date);
    }

    #[test]
    fn test_update_nonexistent_fails() {
        let mut store = MemberStore::new();
        let member = store
            .register_on(create_test_draft("2021-0001"), test_date())
            .unwrap();
        let patch = create_test_patch(&member);

        let result = store.update("no-such-id", patch);
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_update_duplicate_number_rejected() {
        let mut store = MemberStore::new();
        let ana = store
            .register_on(create_test_draft("2021-0001"), test_date())
            .unwrap();
        let ben = store
            .register_on(create_test_draft("2021-0002"), test_date())
            .unwrap();

        // Stealing Ana's number fails
        let mut patch = create_test_patch(&ben);
        patch.student_number = "2021-0001".to_string();
        assert!(store.update(&ben.id, patch).is_err());

        // Keeping your own number is not a collision
        let patch = create_test_patch(&ana);
        assert!(store.update(&ana.id, patch).is_ok());
    }

    #[test]
    fn test_update_validates_fields() {
        let mut store = MemberStore::new();
        let member = store
            .register_on(create_test_draft("2021-0001"), test_date())
            .unwrap();

        let mut patch = create_test_patch(&member);
        patch.student_number = "  ".to_string();
        assert!(store.update(&member.id, patch).is_err());

        let mut patch = create_test_patch(&member);
        patch.name = String::new();
        assert!(store.update(&member.id, patch).is_err());

        let mut patch = create_test_patch(&member);
        patch.membership_fee = -1.0;
        assert!(store.update(&member.id, patch).is_err());

        // Record unchanged after rejected patches
        assert_eq!(store.get(&member.id).unwrap().name, "Ana Cruz");
    }

    #[test]
    fn test_delete_returns_record_and_pools_number() {
        let mut store = MemberStore::new();
        let member = store
            .register_on(create_test_draft("2021-0001"), test_date())
            .unwrap();

        let removed = store.delete(&member.id).unwrap();
        assert_eq!(removed.id, member.id);
        assert!(store.is_empty());
        assert_eq!(store.reclaimed_numbers(), &["ICSO-03-15-001".to_string()]);
    }

    #[test]
    fn test_delete_nonexistent_fails() {
        let mut store = MemberStore::new();
        let result = store.delete("no-such-id");
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_delete_frees_student_number_for_reuse() {
        let mut store = MemberStore::new();
        let ana = store
            .register_on(create_test_draft("2021-0001"), test_date())
            .unwrap();
        store.delete(&ana.id).unwrap();

        // Same external number is registrable again after deletion
        assert!(store
            .register_on(create_test_draft("2021-0001"), test_date())
            .is_ok());
    }

    #[test]
    fn test_delete_all_clears_records_and_pool() {
        let mut store = MemberStore::new();
        let a = store
            .register_on(create_test_draft("2021-0001"), test_date())
            .unwrap();
        store
            .register_on(create_test_draft("2021-0002"), test_date())
            .unwrap();
        store.delete(&a.id).unwrap();
        assert_eq!(store.reclaimed_numbers().len(), 1);

        store.delete_all();
        assert!(store.is_empty());
        assert!(store.reclaimed_numbers().is_empty());
    }

    #[test]
    fn test_filter_search_or_across_fields() {
        let mut store = MemberStore::new();
        let mut draft = create_test_draft("2021-0001");
        draft.name = "Ana Cruz".to_string();
        store.register_on(draft, test_date()).unwrap();

        let mut draft = create_test_draft("2021-0002");
        draft.name = "Ben Reyes".to_string();
        store.register_on(draft, test_date()).unwrap();

        // By name, case-insensitive
        let criteria = FilterCriteria {
            search: "ana".to_string(),
            ..Default::default()
        };
        assert_eq!(store.filter(&criteria).len(), 1);

        // By student number
        let criteria = FilterCriteria {
            search: "0002".to_string(),
            ..Default::default()
        };
        assert_eq!(store.filter(&criteria)[0].name, "Ben Reyes");

        // By control number
        let criteria = FilterCriteria {
            search: "icso-03-15-001".to_string(),
            ..Default::default()
        };
        assert_eq!(store.filter(&criteria)[0].name, "Ana Cruz");

        // No match
        let criteria = FilterCriteria {
            search: "zzz".to_string(),
            ..Default::default()
        };
        assert!(store.filter(&criteria).is_empty());
    }

    #[test]
    fn test_filter_year_and_date_range() {
        let mut store = MemberStore::new();
        store
            .register_on(create_test_draft("2021-0001"), test_date())
            .unwrap();

        let mut draft = create_test_draft("2021-0002");
        draft.school_year = "2nd Year".to_string();
        store
            .register_on(draft, NaiveDate::from_ymd_opt(2024, 3, 20).unwrap())
            .unwrap();

        let criteria = FilterCriteria {
            year: Some("2nd Year".to_string()),
            ..Default::default()
        };
        assert_eq!(store.filter(&criteria).len(), 1);

        // Inclusive bounds
        let criteria = FilterCriteria {
            date_from: Some(test_date()),
            date_to: Some(test_date()),
            ..Default::default()
        };
        let hits = store.filter(&criteria);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].student_number, "2021-0001");

        let criteria = FilterCriteria {
            date_from: Some(NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()),
            ..Default::default()
        };
        assert_eq!(store.filter(&criteria)[0].student_number, "2021-0002");
    }

    #[test]
    fn test_filter_clauses_combine_with_and() {
        let mut store = MemberStore::new();
        store
            .register_on(create_test_draft("2021-0001"), test_date())
            .unwrap();

        let mut draft = create_test_draft("2021-0002");
        draft.name = "Ana Santos".to_string();
        draft.school_year = "2nd Year".to_string();
        store.register_on(draft, test_date()).unwrap();

        let criteria = FilterCriteria {
            search: "ana".to_string(),
            year: Some("2nd Year".to_string()),
            ..Default::default()
        };
        let hits = store.filter(&criteria);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Ana Santos");
    }

    #[test]
    fn test_filter_preserves_insertion_order_and_store() {
        let mut store = MemberStore::new();
        for n in 1..=5 {
            store
                .register_on(create_test_draft(&format!("2021-000{}", n)), test_date())
                .unwrap();
        }

        let all = store.filter(&FilterCriteria::default());
        assert_eq!(all.len(), 5);
        for (i, member) in all.iter().enumerate() {
            assert_eq!(member.student_number, format!("2021-000{}", i + 1));
        }
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_identity_and_control_number_stay_unique() {
        // Interleaved register/delete churn never duplicates an id or an
        // active control number
        let mut store = MemberStore::new();
        let mut next_number = 0;

        for round in 0..10 {
            for _ in 0..3 {
                next_number += 1;
                store
                    .register_on(
                        create_test_draft(&format!("2021-{:04}", next_number)),
                        test_date(),
                    )
                    .unwrap();
            }
            if round % 2 == 0 {
                let victim = store.members()[0].id.clone();
                store.delete(&victim).unwrap();
            }

            let ids: HashSet<&str> = store.members().iter().map(|m| m.id.as_str()).collect();
            assert_eq!(ids.len(), store.len());

            let numbers: HashSet<&str> = store
                .members()
                .iter()
                .map(|m| m.control_number.as_str())
                .collect();
            assert_eq!(numbers.len(), store.len());
        }
    }

    #[test]
    fn test_submission_guard_refuses_reentry() {
        let mut store = MemberStore::new();
        store.in_flight = true;

        let result = store.register_on(create_test_draft("2021-0001"), test_date());
        assert!(matches!(result, Err(StoreError::SubmissionInProgress)));

        let result = store.update("any-id", create_test_patch(&Member::new(
            create_test_draft("2021-0001"),
            "ICSO-03-15-001".to_string(),
            test_date(),
        )));
        assert!(matches!(result, Err(StoreError::SubmissionInProgress)));

        store.in_flight = false;
        assert!(store
            .register_on(create_test_draft("2021-0001"), test_date())
            .is_ok());
    }

    #[test]
    fn test_submission_guard_released_after_error() {
        let mut store = MemberStore::new();
        let mut draft = create_test_draft("2021-0001");
        draft.name = String::new();
        assert!(store.register_on(draft, test_date()).is_err());
        assert!(!store.is_submitting());

        assert!(store
            .register_on(create_test_draft("2021-0001"), test_date())
            .is_ok());
    }

    #[test]
    fn test_replace_state() {
        let mut store = MemberStore::new();
        store
            .register_on(create_test_draft("2021-0001"), test_date())
            .unwrap();

        let members = vec![Member::new(
            create_test_draft("2022-0009"),
            "ICSO-01-01-001".to_string(),
            test_date(),
        )];
        store.replace_state(members, vec!["ICSO-01-01-002".to_string()]);

        assert_eq!(store.len(), 1);
        assert_eq!(store.members()[0].student_number, "2022-0009");
        assert_eq!(store.reclaimed_numbers(), &["ICSO-01-01-002".to_string()]);
    }
}
