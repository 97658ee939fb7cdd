// 📤 Export / Import - CSV snapshots and the JSON interchange envelope
//
// CSV carries the current filtered view for spreadsheets; JSON carries the
// complete store state (records + reclaim pool) for backup and transfer.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use csv::{QuoteStyle, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::member::Member;
use crate::store::MemberStore;

/// CSV column order, fixed.
pub const CSV_HEADERS: [&str; 6] = [
    "Control Number",
    "Name",
    "Student Number",
    "School Year",
    "Membership Fee",
    "Registration Date",
];

// ============================================================================
// CSV EXPORT
// ============================================================================

/// Default export filename, stamped with the given date.
pub fn default_csv_filename(date: NaiveDate) -> String {
    format!("student_members_{}.csv", date)
}

/// Write the given records as CSV, in the order supplied. Every field is
/// double-quote-wrapped, internal quotes doubled. An empty sequence is an
/// error, not an empty file.
pub fn write_csv<W: Write>(writer: W, members: &[Member]) -> Result<()> {
    if members.is_empty() {
        bail!("No data to export");
    }

    let mut csv_writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(writer);

    csv_writer.write_record(CSV_HEADERS)?;

    for member in members {
        csv_writer.write_record([
            member.control_number.as_str(),
            member.name.as_str(),
            member.student_number.as_str(),
            member.school_year.as_str(),
            &member.membership_fee.to_string(),
            &member.registration_date.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn export_csv_file(path: &Path, members: &[Member]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    write_csv(file, members)
}

// ============================================================================
// JSON ENVELOPE
// ============================================================================

/// Complete store state plus export metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportEnvelope {
    pub students: Vec<Member>,

    #[serde(rename = "deletedControlNumbers", default)]
    pub deleted_control_numbers: Vec<String>,

    #[serde(rename = "exportedAt")]
    pub exported_at: String,

    pub count: usize,
}

impl ExportEnvelope {
    pub fn from_store(store: &MemberStore) -> Self {
        let students = store.members().to_vec();
        ExportEnvelope {
            count: students.len(),
            students,
            deleted_control_numbers: store.reclaimed_numbers().to_vec(),
            exported_at: Local::now().to_rfc3339(),
        }
    }

    /// Replace the store's entire state with this envelope's contents.
    /// The caller is responsible for confirming with the user first.
    pub fn apply(self, store: &mut MemberStore) {
        store.replace_state(self.students, self.deleted_control_numbers);
    }
}

pub fn export_json_file(path: &Path, store: &MemberStore) -> Result<()> {
    let envelope = ExportEnvelope::from_store(store);
    let json = serde_json::to_string_pretty(&envelope)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write JSON export: {}", path.display()))?;
    Ok(())
}

// ============================================================================
// JSON IMPORT
// ============================================================================

/// Parse an import file. `students` must be array-shaped; any malformed
/// input is rejected whole, nothing partially applied.
pub fn parse_import(data: &str) -> Result<ExportEnvelope> {
    let value: serde_json::Value =
        serde_json::from_str(data).context("Import file is not valid JSON")?;

    let students = value
        .get("students")
        .ok_or_else(|| anyhow!("Import file has no \"students\" field"))?;
    if !students.is_array() {
        bail!("Import file \"students\" field is not an array");
    }

    let envelope: ExportEnvelope =
        serde_json::from_value(value).context("Import file has malformed records")?;
    Ok(envelope)
}

pub fn import_json_file(path: &Path) -> Result<ExportEnvelope> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read import file: {}", path.display()))?;
    parse_import(&data)
}

// ============================================================================
// TESTS
// ============================================================================
