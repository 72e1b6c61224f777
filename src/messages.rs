//! Direct-message templates for the selection DM and the two reminder
//! stages. The form URL comes from configuration; nothing here reads
//! global state.

use crate::reminders::ReminderStage;

pub fn render_initial(name: &str, team: &str, form_url: &str) -> String {
    format!(
        "Hey {name}! You were randomly selected from the {team} team to share quick feedback this week.\n\
         It takes less than 30 seconds. Please fill this by Friday 5pm:\n\n\
         {form_url}\n\n\
         React with a thumbs-up to this message after you're done so the bot can check you off.\n\n\
         You won't be selected again until your whole team has done it. Thanks!",
        name = name,
        team = display_team(team),
        form_url = form_url,
    )
}

pub fn render_reminder(stage: ReminderStage, team: &str, form_url: &str) -> String {
    match stage {
        ReminderStage::First => format!(
            "Friendly reminder for {} feedback -- could you fill this by Friday 5pm?\n{}",
            display_team(team),
            form_url
        ),
        ReminderStage::Final => format!(
            "Final reminder -- today is the deadline for this week's {} feedback.\n{}\nAppreciate your help!",
            display_team(team),
            form_url
        ),
    }
}

/// Team labels are stored lowercase; capitalize the first letter for
/// display.
fn display_team(team: &str) -> String {
    let mut chars = team.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
