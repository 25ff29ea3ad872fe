use diesel::prelude::*;
use diesel::PgConnection;
use thiserror::Error;

use crate::schema::document_counters;

/// Filing codes a document may be registered under. Creation requests carrying
/// a type outside this list are rejected before anything is written.
pub const DOCUMENT_TYPES: &[&str] = &[
    "อว.01619.05(2).01",
    "อว.01619.05(2).02",
    "อว.01619.05(2).03",
    "อว.01619.05(2).04",
];

pub const STATUSES: &[&str] = &["pending", "approved", "revised", "other"];

pub const DEFAULT_STATUS: &str = "pending";

const MIN_SEQUENCE_DIGITS: usize = 3;

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("invalid document type: {0}")]
    InvalidDocumentType(String),
    #[error(transparent)]
    Database(#[from] diesel::result::Error),
}

pub fn is_known_type(document_type: &str) -> bool {
    DOCUMENT_TYPES.iter().any(|known| *known == document_type)
}

pub fn is_known_status(status: &str) -> bool {
    STATUSES.iter().any(|known| *known == status)
}

/// Renders `<type>-<seq>` with the sequence zero-padded to three digits.
/// Sequences past 999 keep their natural width.
pub fn format_reference(document_type: &str, sequence: i64) -> String {
    format!("{document_type}-{sequence:0width$}", width = MIN_SEQUENCE_DIGITS)
}

/// Numeric suffix of `id`, provided it carries the given type prefix.
pub fn sequence_of(id: &str, document_type: &str) -> Option<i64> {
    let suffix = id.strip_prefix(document_type)?.strip_prefix('-')?;
    suffix.parse().ok()
}

/// Reserves the next reference number for `document_type`.
///
/// The per-type counter row is bumped with a single upsert, so concurrent
/// writers reserving the same type are serialized by the database and never
/// observe the same sequence. Callers run this inside the transaction that
/// inserts the document row.
pub fn reserve_reference(
    conn: &mut PgConnection,
    document_type: &str,
) -> Result<String, ReferenceError> {
    if !is_known_type(document_type) {
        return Err(ReferenceError::InvalidDocumentType(
            document_type.to_string(),
        ));
    }

    let sequence: i64 = diesel::insert_into(document_counters::table)
        .values((
            document_counters::document_type.eq(document_type),
            document_counters::last_seq.eq(1_i64),
        ))
        .on_conflict(document_counters::document_type)
        .do_update()
        .set(document_counters::last_seq.eq(document_counters::last_seq + 1))
        .returning(document_counters::last_seq)
        .get_result(conn)?;

    Ok(format_reference(document_type, sequence))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_sequence_to_three_digits() {
        assert_eq!(
            format_reference("อว.01619.05(2).01", 1),
            "อว.01619.05(2).01-001"
        );
        assert_eq!(
            format_reference("อว.01619.05(2).01", 42),
            "อว.01619.05(2).01-042"
        );
    }

    #[test]
    fn sequence_width_grows_past_three_digits() {
        assert_eq!(
            format_reference("อว.01619.05(2).01", 1000),
            "อว.01619.05(2).01-1000"
        );
    }

    #[test]
    fn parses_sequence_back_out_of_a_reference() {
        let id = format_reference("อว.01619.05(2).02", 7);
        assert_eq!(sequence_of(&id, "อว.01619.05(2).02"), Some(7));
        assert_eq!(sequence_of("อว.01619.05(2).01-1000", "อว.01619.05(2).01"), Some(1000));
    }

    #[test]
    fn rejects_a_foreign_type_prefix() {
        assert_eq!(sequence_of("อว.01619.05(2).01-001", "อว.01619.05(2).02"), None);
        assert_eq!(sequence_of("อว.01619.05(2).01", "อว.01619.05(2).01"), None);
    }

    #[test]
    fn vocabularies_are_closed() {
        assert!(is_known_type("อว.01619.05(2).01"));
        assert!(!is_known_type("กค.0001"));
        assert!(!is_known_type(""));
        assert!(is_known_status("pending"));
        assert!(is_known_status("other"));
        assert!(!is_known_status("archived"));
    }
}
