use std::collections::{BTreeMap, HashSet};

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::config::TeamQuotas;
use crate::models::{Candidate, Member};

/// Group active roster members by team label. Pure grouping: no dedup,
/// no filtering. BTreeMap keeps team processing order stable, which the
/// final dedup pass depends on.
pub fn group_by_team(roster: &[Member]) -> BTreeMap<String, Vec<Candidate>> {
    let mut teams: BTreeMap<String, Vec<Candidate>> = BTreeMap::new();
    for member in roster {
        teams
            .entry(member.team.clone())
            .or_default()
            .push(Candidate {
                name: member.name.clone(),
                email: member.email.clone(),
                team: member.team.clone(),
            });
    }
    teams
}

/// Drop members whose email (case-insensitive) is in the recent set.
pub fn filter_eligible(members: &[Candidate], recent: &HashSet<String>) -> Vec<Candidate> {
    members
        .iter()
        .filter(|c| !recent.contains(&c.email.to_lowercase()))
        .cloned()
        .collect()
}

/// How many people this team should contribute this cycle, before
/// clamping to the eligible count. Priority table; the small-team rule
/// short-circuits regardless of team identity.
pub fn desired_picks(quotas: &TeamQuotas, team: &str, eligible_count: usize) -> usize {
    if eligible_count <= 3 {
        return 1;
    }
    let desired = quotas.quota_for(team);
    if eligible_count >= 12 && !quotas.is_distinguished(team) {
        // Very large ad-hoc teams get a boosted floor of 2.
        return desired.max(2);
    }
    desired
}

/// Uniform sample without replacement of `min(quota, eligible)` members.
pub fn select_from_team<R: Rng + ?Sized>(
    rng: &mut R,
    quotas: &TeamQuotas,
    team: &str,
    eligible: &[Candidate],
) -> Vec<Candidate> {
    if eligible.is_empty() {
        return Vec::new();
    }
    let count = desired_picks(quotas, team, eligible.len()).min(eligible.len());
    eligible.choose_multiple(rng, count).cloned().collect()
}

/// Full selection run: partition the roster, apply the cooldown filter
/// (falling back to the whole team when the pool is exhausted), draw per
/// team, then dedup globally by lowercased email, first occurrence wins.
pub fn run_full_selection<R: Rng + ?Sized>(
    rng: &mut R,
    quotas: &TeamQuotas,
    roster: &[Member],
    recent: &HashSet<String>,
) -> Vec<Candidate> {
    let teams = group_by_team(roster);
    let mut picks: Vec<Candidate> = Vec::new();

    for (team, members) in &teams {
        let mut eligible = filter_eligible(members, recent);
        if eligible.is_empty() {
            // Whole team is on cooldown: reset the pool rather than
            // letting the team go silent forever.
            eligible = members.clone();
        }
        picks.extend(select_from_team(rng, quotas, team, &eligible));
    }

    let mut seen: HashSet<String> = HashSet::new();
    picks.retain(|c| seen.insert(c.email.to_lowercase()));
    picks
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn member(name: &str, email: &str, team: &str) -> Member {
        Member {
            name: name.to_string(),
            email: email.to_string(),
            team: team.to_string(),
        }
    }

    fn roster_of(team: &str, n: usize) -> Vec<Member> {
        (0..n)
            .map(|i| member(&format!("Person {i}"), &format!("p{i}@example.com"), team))
            .collect()
    }

    #[test]
    fn grouping_preserves_duplicates_and_splits_teams() {
        let roster = vec![
            member("Aarav Shah", "aarav@example.com", "software"),
            member("Neha Rao", "neha@example.com", "design"),
            member("Aarav Shah", "aarav@example.com", "software"),
        ];
        let teams = group_by_team(&roster);
        assert_eq!(teams["software"].len(), 2);
        assert_eq!(teams["design"].len(), 1);
    }

    #[test]
    fn eligibility_filter_is_case_insensitive() {
        let members = vec![
            Candidate {
                name: "Aarav Shah".to_string(),
                email: "Aarav@Example.com".to_string(),
                team: "software".to_string(),
            },
            Candidate {
                name: "Neha Rao".to_string(),
                email: "neha@example.com".to_string(),
                team: "software".to_string(),
            },
        ];
        let recent = HashSet::from(["aarav@example.com".to_string()]);
        let eligible = filter_eligible(&members, &recent);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].email, "neha@example.com");
    }

    #[test]
    fn small_teams_always_resolve_to_one() {
        let quotas = TeamQuotas::default();
        for count in 1..=3 {
            assert_eq!(desired_picks(&quotas, "software", count), 1);
            assert_eq!(desired_picks(&quotas, "design", count), 1);
        }
    }

    #[test]
    fn large_ad_hoc_teams_get_boosted_floor() {
        let quotas = TeamQuotas::default();
        assert_eq!(desired_picks(&quotas, "marketing", 12), 2);
        assert_eq!(desired_picks(&quotas, "marketing", 30), 2);
        // Distinguished teams keep their configured count even when huge.
        assert_eq!(desired_picks(&quotas, "software", 20), 3);
    }

    #[test]
    fn mid_size_teams_use_configured_quota() {
        let quotas = TeamQuotas::default();
        assert_eq!(desired_picks(&quotas, "software", 5), 3);
        assert_eq!(desired_picks(&quotas, "data", 8), 3);
        assert_eq!(desired_picks(&quotas, "design", 7), 1);
    }

    #[test]
    fn selector_never_exceeds_eligible_count() {
        let quotas = TeamQuotas::default();
        let mut rng = StdRng::seed_from_u64(7);
        for n in 0..6 {
            let roster = roster_of("software", n);
            let teams = group_by_team(&roster);
            let eligible = teams.get("software").cloned().unwrap_or_default();
            let picks = select_from_team(&mut rng, &quotas, "software", &eligible);
            let quota = if n == 0 {
                0
            } else {
                desired_picks(&quotas, "software", n)
            };
            assert!(picks.len() <= quota.min(n));
            if n == 0 {
                assert!(picks.is_empty());
            }
        }
    }

    #[test]
    fn selection_has_no_duplicate_emails_across_teams() {
        // Same person listed under two teams with different casing.
        let roster = vec![
            member("Aarav Shah", "aarav@example.com", "software"),
            member("Aarav Shah", "AARAV@example.com", "community"),
        ];
        let quotas = TeamQuotas::default();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picks = run_full_selection(&mut rng, &quotas, &roster, &HashSet::new());
            let mut emails: Vec<String> =
                picks.iter().map(|c| c.email.to_lowercase()).collect();
            emails.sort();
            emails.dedup();
            assert_eq!(emails.len(), picks.len());
        }
    }

    #[test]
    fn pool_exhaustion_falls_back_to_whole_team() {
        let roster = roster_of("design", 2);
        let recent: HashSet<String> = roster.iter().map(|m| m.email.to_lowercase()).collect();
        let quotas = TeamQuotas::default();
        let mut rng = StdRng::seed_from_u64(3);
        let picks = run_full_selection(&mut rng, &quotas, &roster, &recent);
        // Everyone was recent, so the full team is eligible again and the
        // small-team rule still yields exactly one pick.
        assert_eq!(picks.len(), 1);
    }

    #[test]
    fn five_software_members_yield_three_picks() {
        let roster = roster_of("software", 5);
        let quotas = TeamQuotas::default();
        let mut rng = StdRng::seed_from_u64(11);
        let picks = run_full_selection(&mut rng, &quotas, &roster, &HashSet::new());
        assert_eq!(picks.len(), 3);
        let unique: HashSet<&str> = picks.iter().map(|c| c.email.as_str()).collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn two_design_members_yield_one_pick() {
        let roster = roster_of("design", 2);
        let quotas = TeamQuotas::default();
        let mut rng = StdRng::seed_from_u64(13);
        let picks = run_full_selection(&mut rng, &quotas, &roster, &HashSet::new());
        assert_eq!(picks.len(), 1);
    }

    #[test]
    fn fifteen_marketing_members_yield_two_picks() {
        let roster = roster_of("marketing", 15);
        let quotas = TeamQuotas::default();
        let mut rng = StdRng::seed_from_u64(17);
        let picks = run_full_selection(&mut rng, &quotas, &roster, &HashSet::new());
        assert_eq!(picks.len(), 2);
    }

    #[test]
    fn every_eligible_member_can_be_drawn() {
        let roster = roster_of("design", 3);
        let quotas = TeamQuotas::default();
        let mut drawn: HashSet<String> = HashSet::new();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            for pick in run_full_selection(&mut rng, &quotas, &roster, &HashSet::new()) {
                drawn.insert(pick.email);
            }
        }
        assert_eq!(drawn.len(), 3);
    }
}
