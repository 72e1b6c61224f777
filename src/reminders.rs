use crate::models::PendingRequest;

/// Escalation stage for a pending identity. Two reminders maximum; after
/// that the record waits for manual follow-up or lapses at the week
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderStage {
    First,
    Final,
}

/// A reminder the caller should deliver. The driver only computes
/// intent; the caller increments the ledger counter after a successful
/// send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderAction {
    pub email: String,
    pub team: String,
    pub stage: ReminderStage,
}

pub fn stage_for(reminders_sent: u32) -> Option<ReminderStage> {
    match reminders_sent {
        0 => Some(ReminderStage::First),
        1 => Some(ReminderStage::Final),
        _ => None,
    }
}

pub fn plan_reminders(pending: &[PendingRequest]) -> Vec<ReminderAction> {
    pending
        .iter()
        .filter_map(|p| {
            stage_for(p.reminders_sent).map(|stage| ReminderAction {
                email: p.email.clone(),
                team: p.team.clone(),
                stage,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_follow_counter_boundaries() {
        assert_eq!(stage_for(0), Some(ReminderStage::First));
        assert_eq!(stage_for(1), Some(ReminderStage::Final));
        assert_eq!(stage_for(2), None);
        assert_eq!(stage_for(3), None);
    }

    #[test]
    fn fully_escalated_identities_get_no_action() {
        let pending = vec![
            PendingRequest {
                email: "aarav@example.com".to_string(),
                team: "software".to_string(),
                reminders_sent: 0,
            },
            PendingRequest {
                email: "neha@example.com".to_string(),
                team: "design".to_string(),
                reminders_sent: 1,
            },
            PendingRequest {
                email: "done@example.com".to_string(),
                team: "data".to_string(),
                reminders_sent: 2,
            },
        ];
        let actions = plan_reminders(&pending);
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].stage, ReminderStage::First);
        assert_eq!(actions[1].stage, ReminderStage::Final);
    }
}
