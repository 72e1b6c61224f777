use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{Member, TrackingRow};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let members = vec![
        ("Aarav Shah", "aarav.shah@northeastern.edu", "software", "Active"),
        ("Neha Rao", "neha.rao@husky.neu.edu", "software", "Active"),
        ("Maya Chen", "maya.chen@northeastern.edu", "software", "Active"),
        ("Leo Tran", "leo.tran@northeastern.edu", "software", "Active"),
        ("Priya Nair", "priya.nair@northeastern.edu", "software", "Active"),
        ("Omar Haddad", "omar.haddad@northeastern.edu", "data", "Active"),
        ("Sofia Reyes", "sofia.reyes@northeastern.edu", "data", "Active"),
        ("Ethan Park", "ethan.park@northeastern.edu", "data", "Active"),
        ("Ivy Okafor", "ivy.okafor@northeastern.edu", "data", "Active"),
        ("Lucas Meyer", "lucas.meyer@northeastern.edu", "design", "Active"),
        ("Amara Diallo", "amara.diallo@northeastern.edu", "design", "Active"),
        ("Noah Fischer", "noah.fischer@northeastern.edu", "marketing", "Active"),
        ("Zara Ahmed", "zara.ahmed@northeastern.edu", "marketing", "Active"),
        ("Dan Kovacs", "dan.kovacs@northeastern.edu", "marketing", "Inactive"),
    ];

    for (name, email, team, status) in members {
        sqlx::query(
            r#"
            INSERT INTO feedback_rotation.roster (id, full_name, email, team, status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name, team = EXCLUDED.team, status = EXCLUDED.status
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(team)
        .bind(status)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Active roster rows, team labels lowercased at ingestion.
pub async fn fetch_roster(pool: &PgPool) -> anyhow::Result<Vec<Member>> {
    let rows = sqlx::query(
        "SELECT full_name, email, team \
         FROM feedback_rotation.roster \
         WHERE status = 'Active' \
         ORDER BY team, full_name",
    )
    .fetch_all(pool)
    .await
    .context("failed to read roster")?;

    let mut members = Vec::with_capacity(rows.len());
    for row in rows {
        let team: String = row.get("team");
        members.push(Member {
            name: row.get("full_name"),
            email: row.get("email"),
            team: team.trim().to_lowercase(),
        });
    }
    Ok(members)
}

/// Raw tracking rows in insertion order. The ledger module parses and
/// interprets them; the store keeps every data column as text.
pub async fn fetch_tracking_rows(pool: &PgPool) -> anyhow::Result<Vec<TrackingRow>> {
    let rows = sqlx::query(
        "SELECT id, email, team, date_selected, form_completed, reminders_sent, date_completed \
         FROM feedback_rotation.tracking \
         ORDER BY created_at",
    )
    .fetch_all(pool)
    .await
    .context("failed to read tracking log")?;

    let tracking = rows
        .into_iter()
        .map(|row| TrackingRow {
            id: row.get("id"),
            email: row.get("email"),
            team: row.get("team"),
            date_selected: row.get("date_selected"),
            form_completed: row.get("form_completed"),
            reminders_sent: row.get("reminders_sent"),
            date_completed: row.get("date_completed"),
        })
        .collect();
    Ok(tracking)
}

/// Append a fresh selection record: not completed, zero reminders.
pub async fn append_selection(
    pool: &PgPool,
    email: &str,
    team: &str,
    date_selected: NaiveDate,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO feedback_rotation.tracking
        (id, email, team, date_selected, form_completed, reminders_sent, date_completed)
        VALUES ($1, $2, $3, $4, 'FALSE', '0', '')
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(team)
    .bind(date_selected.format(DATE_FORMAT).to_string())
    .execute(pool)
    .await
    .context("failed to append selection record")?;
    Ok(())
}

/// Overwrite the reminder counter of one row. The caller locates the
/// row via the ledger's current-week scan and passes its id.
pub async fn set_reminders_sent(pool: &PgPool, row_id: Uuid, count: u32) -> anyhow::Result<()> {
    sqlx::query("UPDATE feedback_rotation.tracking SET reminders_sent = $2 WHERE id = $1")
        .bind(row_id)
        .bind(count.to_string())
        .execute(pool)
        .await
        .context("failed to update reminder counter")?;
    Ok(())
}

/// Mark one row completed with the given date.
pub async fn complete_row(pool: &PgPool, row_id: Uuid, completed_on: NaiveDate) -> anyhow::Result<()> {
    sqlx::query(
        "UPDATE feedback_rotation.tracking \
         SET form_completed = 'TRUE', date_completed = $2 \
         WHERE id = $1",
    )
    .bind(row_id)
    .bind(completed_on.format(DATE_FORMAT).to_string())
    .execute(pool)
    .await
    .context("failed to mark record completed")?;
    Ok(())
}
