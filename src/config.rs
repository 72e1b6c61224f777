use std::collections::HashMap;

use anyhow::Context;

pub const DEFAULT_COOLDOWN_WEEKS: i64 = 4;
pub const DEFAULT_FORM_URL: &str = "https://forms.gle/f9SyxU3MzenqkVie7";

/// Per-team selection quotas. Teams listed in `per_team` are the
/// distinguished teams with an elevated default; everyone else gets
/// `default_quota`.
#[derive(Debug, Clone)]
pub struct TeamQuotas {
    per_team: HashMap<String, usize>,
    default_quota: usize,
}

impl TeamQuotas {
    pub fn new(per_team: HashMap<String, usize>, default_quota: usize) -> Self {
        let per_team = per_team
            .into_iter()
            .map(|(team, count)| (team.to_lowercase(), count))
            .collect();
        Self {
            per_team,
            default_quota,
        }
    }

    pub fn is_distinguished(&self, team: &str) -> bool {
        self.per_team.contains_key(&team.to_lowercase())
    }

    pub fn quota_for(&self, team: &str) -> usize {
        self.per_team
            .get(&team.to_lowercase())
            .copied()
            .unwrap_or(self.default_quota)
    }
}

impl Default for TeamQuotas {
    fn default() -> Self {
        let mut per_team = HashMap::new();
        per_team.insert("software".to_string(), 3);
        per_team.insert("data".to_string(), 3);
        Self {
            per_team,
            default_quota: 1,
        }
    }
}

/// All runtime settings, loaded once in `main` and passed down explicitly.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub slack_bot_token: String,
    pub cooldown_weeks: i64,
    pub form_url: String,
    pub quotas: TeamQuotas,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .context("DATABASE_URL must be set to a Postgres instance")?;
        let slack_bot_token = std::env::var("SLACK_BOT_TOKEN").unwrap_or_default();

        let cooldown_weeks = match std::env::var("COOLDOWN_WEEKS") {
            Ok(raw) => raw
                .parse::<i64>()
                .context("COOLDOWN_WEEKS must be an integer number of weeks")?,
            Err(_) => DEFAULT_COOLDOWN_WEEKS,
        };

        let form_url =
            std::env::var("FEEDBACK_FORM_URL").unwrap_or_else(|_| DEFAULT_FORM_URL.to_string());

        let per_team: HashMap<String, usize> = match std::env::var("TEAM_QUOTAS") {
            Ok(raw) => serde_json::from_str(&raw)
                .context("TEAM_QUOTAS must be a JSON object of team -> count")?,
            Err(_) => HashMap::from([("software".to_string(), 3), ("data".to_string(), 3)]),
        };
        let default_quota = match std::env::var("DEFAULT_TEAM_QUOTA") {
            Ok(raw) => raw
                .parse::<usize>()
                .context("DEFAULT_TEAM_QUOTA must be a non-negative integer")?,
            Err(_) => 1,
        };

        Ok(Self {
            database_url,
            slack_bot_token,
            cooldown_weeks,
            form_url,
            quotas: TeamQuotas::new(per_team, default_quota),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_quotas_distinguish_software_and_data() {
        let quotas = TeamQuotas::default();
        assert!(quotas.is_distinguished("software"));
        assert!(quotas.is_distinguished("data"));
        assert!(!quotas.is_distinguished("marketing"));
        assert_eq!(quotas.quota_for("software"), 3);
        assert_eq!(quotas.quota_for("data"), 3);
        assert_eq!(quotas.quota_for("marketing"), 1);
    }

    #[test]
    fn team_lookup_is_case_insensitive() {
        let quotas = TeamQuotas::new(HashMap::from([("Software".to_string(), 3)]), 1);
        assert!(quotas.is_distinguished("SOFTWARE"));
        assert_eq!(quotas.quota_for("software"), 3);
    }
}
