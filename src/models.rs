use chrono::NaiveDate;
use uuid::Uuid;

/// One active roster row. Team labels are lowercased at ingestion;
/// inactive members are filtered out before they reach the core.
#[derive(Debug, Clone)]
pub struct Member {
    pub name: String,
    pub email: String,
    pub team: String,
}

/// A person under consideration for (or produced by) a selection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub email: String,
    pub team: String,
}

/// Raw tracking row as stored: every data column is text. The ledger
/// module owns all interpretation.
#[derive(Debug, Clone)]
pub struct TrackingRow {
    pub id: Uuid,
    pub email: String,
    pub team: String,
    pub date_selected: String,
    pub form_completed: String,
    pub reminders_sent: String,
    pub date_completed: String,
}

/// Parsed tracking row: one person's feedback obligation for one week.
#[derive(Debug, Clone)]
pub struct SelectionRecord {
    pub row_id: Uuid,
    pub email: String,
    pub team: String,
    pub date_selected: NaiveDate,
    pub form_completed: bool,
    pub reminders_sent: u32,
    pub date_completed: Option<NaiveDate>,
}

/// An identity selected this week that has not completed the form yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub email: String,
    pub team: String,
    pub reminders_sent: u32,
}
