use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate};
use tracing::warn;

use crate::models::{PendingRequest, SelectionRecord, TrackingRow};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Monday-anchored start of the week containing `date`. Two dates in the
/// same Monday-to-Sunday span normalize to the same value.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Parse raw tracking rows into selection records. Rows with an
/// unparseable date or a non-numeric reminder counter are skipped with a
/// warning; a bad row never fails the batch. Returns the records and the
/// number of rows skipped.
pub fn parse_tracking_rows(rows: &[TrackingRow]) -> (Vec<SelectionRecord>, usize) {
    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;

    for row in rows {
        let date_selected = match NaiveDate::parse_from_str(row.date_selected.trim(), DATE_FORMAT) {
            Ok(date) => date,
            Err(_) => {
                warn!(
                    row_id = %row.id,
                    date = %row.date_selected,
                    "skipping tracking row with malformed date_selected"
                );
                skipped += 1;
                continue;
            }
        };

        let reminders_field = row.reminders_sent.trim();
        let reminders_sent = if reminders_field.is_empty() {
            0
        } else {
            match reminders_field.parse::<u32>() {
                Ok(count) => count,
                Err(_) => {
                    warn!(
                        row_id = %row.id,
                        counter = %row.reminders_sent,
                        "skipping tracking row with non-numeric reminder counter"
                    );
                    skipped += 1;
                    continue;
                }
            }
        };

        let date_completed = {
            let field = row.date_completed.trim();
            if field.is_empty() {
                None
            } else {
                NaiveDate::parse_from_str(field, DATE_FORMAT).ok()
            }
        };

        records.push(SelectionRecord {
            row_id: row.id,
            email: row.email.trim().to_string(),
            team: row.team.trim().to_lowercase(),
            date_selected,
            form_completed: row.form_completed.trim().eq_ignore_ascii_case("TRUE"),
            reminders_sent,
            date_completed,
        });
    }

    (records, skipped)
}

/// Identities selected within the trailing cooldown window. This is a
/// flat calendar-day cutoff (`today - weeks * 7`, inclusive), not aligned
/// to week boundaries; the pending view below uses different, Monday-
/// aligned semantics on purpose.
pub fn recent_emails(
    records: &[SelectionRecord],
    today: NaiveDate,
    weeks: i64,
) -> HashSet<String> {
    let cutoff = today - Duration::weeks(weeks);
    records
        .iter()
        .filter(|r| r.date_selected >= cutoff)
        .map(|r| r.email.to_lowercase())
        .collect()
}

/// Identities selected in the same Monday-anchored week as `today` that
/// have not completed the form. Records from prior weeks are lapsed, not
/// pending, even if still incomplete.
pub fn pending_requests(records: &[SelectionRecord], today: NaiveDate) -> Vec<PendingRequest> {
    let current_week = week_start(today);
    records
        .iter()
        .filter(|r| !r.form_completed && week_start(r.date_selected) == current_week)
        .map(|r| PendingRequest {
            email: r.email.clone(),
            team: r.team.clone(),
            reminders_sent: r.reminders_sent,
        })
        .collect()
}

/// The current week's open (uncompleted) record for an identity, if any.
/// Target of reminder-counter increments.
pub fn open_row<'a>(
    records: &'a [SelectionRecord],
    email: &str,
    today: NaiveDate,
) -> Option<&'a SelectionRecord> {
    let current_week = week_start(today);
    let email = email.to_lowercase();
    records.iter().find(|r| {
        !r.form_completed
            && r.email.to_lowercase() == email
            && week_start(r.date_selected) == current_week
    })
}

/// The current week's record for an identity regardless of completion
/// state. Target of mark-completed, which must stay idempotent.
pub fn current_week_row<'a>(
    records: &'a [SelectionRecord],
    email: &str,
    today: NaiveDate,
) -> Option<&'a SelectionRecord> {
    let current_week = week_start(today);
    let email = email.to_lowercase();
    records.iter().find(|r| {
        r.email.to_lowercase() == email && week_start(r.date_selected) == current_week
    })
}

/// What marking an identity completed should do this week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// No record exists for this identity in the current week.
    NoRecord,
    /// The record is already completed; carries the date set by the
    /// first completion. No write happens.
    AlreadyCompleted(Option<NaiveDate>),
    /// An open record should be marked completed now.
    CompleteRow(uuid::Uuid),
}

/// Decide the mark-completed action for an identity. Idempotent: a
/// record completed by an earlier call is left untouched, so its
/// `date_completed` survives repeat calls in the same week.
pub fn completion_outcome(
    records: &[SelectionRecord],
    email: &str,
    today: NaiveDate,
) -> CompletionOutcome {
    match current_week_row(records, email, today) {
        None => CompletionOutcome::NoRecord,
        Some(row) if row.form_completed => CompletionOutcome::AlreadyCompleted(row.date_completed),
        Some(row) => CompletionOutcome::CompleteRow(row.row_id),
    }
}
