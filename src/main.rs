use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod ledger;
mod messages;
mod models;
mod reminders;
mod selection;
mod slack;

use config::AppConfig;
use slack::{DryRunMessenger, Messenger, SlackClient};

#[derive(Parser)]
#[command(name = "feedback-rotation")]
#[command(about = "Weekly feedback rotation: selection, tracking, reminders", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic roster seed data
    Seed,
    /// Run the weekly selection and DM each pick
    Select {
        /// Print messages instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
    /// Sweep this week's pending responses and send staged reminders
    Remind {
        #[arg(long)]
        dry_run: bool,
    },
    /// Mark the current week's record completed for one person
    Complete {
        #[arg(long)]
        email: String,
    },
    /// Show who is still pending a response this week
    Pending,
    /// Show the cooldown set for the configured window
    Recent,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&cfg.database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed roster inserted.");
        }
        Commands::Select { dry_run } => {
            if dry_run {
                run_selection(&pool, &cfg, &DryRunMessenger).await?;
            } else {
                run_selection(&pool, &cfg, &SlackClient::new(cfg.slack_bot_token.clone())).await?;
            }
        }
        Commands::Remind { dry_run } => {
            if dry_run {
                run_reminders(&pool, &cfg, &DryRunMessenger).await?;
            } else {
                run_reminders(&pool, &cfg, &SlackClient::new(cfg.slack_bot_token.clone())).await?;
            }
        }
        Commands::Complete { email } => {
            mark_completed(&pool, &email).await?;
        }
        Commands::Pending => {
            show_pending(&pool).await?;
        }
        Commands::Recent => {
            show_recent(&pool, &cfg).await?;
        }
    }

    Ok(())
}

/// One full selection cycle: build the cooldown set, draw this week's
/// picks, DM each pick, and log every delivered selection as a new
/// ledger row. Rows are written as sends succeed, not as one batch, so
/// a partial run is recoverable: logged identities join the next
/// cycle's recent set.
async fn run_selection<M: Messenger>(
    pool: &PgPool,
    cfg: &AppConfig,
    messenger: &M,
) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let roster = db::fetch_roster(pool).await?;
    let (records, skipped) = ledger::parse_tracking_rows(&db::fetch_tracking_rows(pool).await?);
    if skipped > 0 {
        warn!(skipped, "ignored malformed tracking rows");
    }

    let recent = ledger::recent_emails(&records, today, cfg.cooldown_weeks);
    let picks = selection::run_full_selection(&mut rand::rng(), &cfg.quotas, &roster, &recent);

    let mut sent = 0usize;
    for pick in &picks {
        let user_id = match messenger.lookup_user(&pick.email).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                println!("[skip] No messaging account for {}", pick.email);
                continue;
            }
            Err(err) => {
                warn!(email = %pick.email, error = %format!("{err:#}"), "identity lookup failed");
                continue;
            }
        };

        let text = messages::render_initial(&pick.name, &pick.team, &cfg.form_url);
        match messenger.send_dm(&user_id, &text).await {
            Ok(()) => match db::append_selection(pool, &pick.email, &pick.team, today).await {
                Ok(()) => {
                    sent += 1;
                    println!("[ok] DM sent to {} <{}>", pick.name, pick.email);
                }
                Err(err) => {
                    warn!(email = %pick.email, error = %format!("{err:#}"), "failed to log selection");
                }
            },
            Err(err) => {
                println!("[fail] DM failed for {} <{}>", pick.name, pick.email);
                warn!(email = %pick.email, error = %format!("{err:#}"), "initial DM failed");
            }
        }
    }

    println!("Done. Selected {}, sent {} DMs.", picks.len(), sent);
    Ok(())
}

/// Reminder sweep over this week's pending responses. The stage driver
/// only computes intent; the counter is incremented here, once per
/// successfully delivered reminder, on the current week's open row.
async fn run_reminders<M: Messenger>(
    pool: &PgPool,
    cfg: &AppConfig,
    messenger: &M,
) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let (records, skipped) = ledger::parse_tracking_rows(&db::fetch_tracking_rows(pool).await?);
    if skipped > 0 {
        warn!(skipped, "ignored malformed tracking rows");
    }

    let pending = ledger::pending_requests(&records, today);
    let actions = reminders::plan_reminders(&pending);

    let mut sent = 0usize;
    for action in &actions {
        let user_id = match messenger.lookup_user(&action.email).await {
            Ok(Some(id)) => id,
            Ok(None) => {
                println!("[skip] No messaging account for {}", action.email);
                continue;
            }
            Err(err) => {
                warn!(email = %action.email, error = %format!("{err:#}"), "identity lookup failed");
                continue;
            }
        };

        let text = messages::render_reminder(action.stage, &action.team, &cfg.form_url);
        if let Err(err) = messenger.send_dm(&user_id, &text).await {
            println!("[fail] Reminder failed for <{}>", action.email);
            warn!(email = %action.email, error = %format!("{err:#}"), "reminder DM failed");
            continue;
        }

        match ledger::open_row(&records, &action.email, today) {
            Some(row) => {
                match db::set_reminders_sent(pool, row.row_id, row.reminders_sent + 1).await {
                    Ok(()) => {
                        sent += 1;
                        println!("[ok] Reminder {} sent to <{}>", row.reminders_sent + 1, action.email);
                    }
                    Err(err) => {
                        warn!(email = %action.email, error = %format!("{err:#}"), "failed to bump reminder counter");
                    }
                }
            }
            // No open row means the record was completed or lapsed
            // between the read and the send; nothing to increment.
            None => {
                warn!(email = %action.email, "no open record for delivered reminder");
            }
        }
    }

    println!("Done. Sent {sent} reminders.");
    Ok(())
}

/// Mark the current week's record completed. Idempotent: an already
/// completed record is left untouched, keeping the date_completed set
/// by the first call.
async fn mark_completed(pool: &PgPool, email: &str) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let (records, _) = ledger::parse_tracking_rows(&db::fetch_tracking_rows(pool).await?);

    match ledger::completion_outcome(&records, email, today) {
        ledger::CompletionOutcome::NoRecord => {
            println!("No selection record for {email} this week.");
        }
        ledger::CompletionOutcome::AlreadyCompleted(Some(date)) => {
            println!("{email} already completed this week's form on {date}.");
        }
        ledger::CompletionOutcome::AlreadyCompleted(None) => {
            println!("{email} is already marked completed this week.");
        }
        ledger::CompletionOutcome::CompleteRow(row_id) => {
            db::complete_row(pool, row_id, today).await?;
            println!("Marked {email} completed.");
        }
    }
    Ok(())
}

async fn show_pending(pool: &PgPool) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let (records, _) = ledger::parse_tracking_rows(&db::fetch_tracking_rows(pool).await?);
    let pending = ledger::pending_requests(&records, today);

    if pending.is_empty() {
        println!("Nobody is pending this week.");
        return Ok(());
    }
    println!("Pending this week:");
    for p in pending {
        println!("- {} ({}) reminders sent: {}", p.email, p.team, p.reminders_sent);
    }
    Ok(())
}

async fn show_recent(pool: &PgPool, cfg: &AppConfig) -> anyhow::Result<()> {
    let today = Utc::now().date_naive();
    let (records, _) = ledger::parse_tracking_rows(&db::fetch_tracking_rows(pool).await?);
    let mut recent: Vec<String> = ledger::recent_emails(&records, today, cfg.cooldown_weeks)
        .into_iter()
        .collect();
    recent.sort();

    if recent.is_empty() {
        println!("Nobody selected in the last {} weeks.", cfg.cooldown_weeks);
        return Ok(());
    }
    println!("On cooldown ({} week window):", cfg.cooldown_weeks);
    for email in recent {
        println!("- {email}");
    }
    Ok(())
}
