//! Messaging transport collaborator. The core only needs two
//! capabilities: resolve an email to a messaging identity and deliver a
//! direct message. `SlackClient` wraps the Slack Web API; the dry-run
//! implementation prints instead of sending.

use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

const SLACK_API_BASE: &str = "https://slack.com/api";
const LOOKUP_RETRIES: usize = 3;
const RETRY_DELAY: Duration = Duration::from_millis(1500);

/// The two academic domains treated as aliases of the same person.
const ALIAS_DOMAINS: (&str, &str) = ("northeastern.edu", "husky.neu.edu");

pub trait Messenger {
    /// Resolve an email to an opaque messaging identity, or `None` when
    /// no account exists for it (including any alias variation).
    async fn lookup_user(&self, email: &str) -> anyhow::Result<Option<String>>;

    /// Deliver a direct message. Never retried by callers: a failure is
    /// surfaced rather than risking a duplicate send.
    async fn send_dm(&self, user_id: &str, text: &str) -> anyhow::Result<()>;
}

/// Email spellings to try when resolving an identity: the address as
/// given, plus the swapped form for the known alias domain pair. Only
/// the domain is rewritten; the local part keeps its spelling.
pub fn email_variations(email: &str) -> Vec<String> {
    let mut variations = vec![email.to_string()];
    if let Some((local, domain)) = email.rsplit_once('@') {
        let (a, b) = ALIAS_DOMAINS;
        if domain.eq_ignore_ascii_case(a) {
            variations.push(format!("{local}@{b}"));
        } else if domain.eq_ignore_ascii_case(b) {
            variations.push(format!("{local}@{a}"));
        }
    }
    variations
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    ok: bool,
    user: Option<SlackUser>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SlackUser {
    id: String,
    #[serde(default)]
    deleted: bool,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
}

pub struct SlackClient {
    client: reqwest::Client,
    token: String,
}

impl SlackClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
        }
    }

    async fn lookup_once(&self, email: &str) -> anyhow::Result<Option<String>> {
        let mut last_err = None;
        for _ in 0..LOOKUP_RETRIES {
            let result = self
                .client
                .get(format!("{SLACK_API_BASE}/users.lookupByEmail"))
                .bearer_auth(&self.token)
                .query(&[("email", email)])
                .send()
                .await;
            match result {
                Ok(response) => {
                    let body: LookupResponse = response
                        .json()
                        .await
                        .context("malformed users.lookupByEmail response")?;
                    if !body.ok {
                        // users_not_found and friends are a definitive
                        // miss for this spelling, not a transient fault.
                        warn!(
                            email,
                            error = body.error.as_deref().unwrap_or("unknown"),
                            "users.lookupByEmail miss"
                        );
                        return Ok(None);
                    }
                    return Ok(body
                        .user
                        .filter(|user| !user.deleted)
                        .map(|user| user.id));
                }
                Err(err) => {
                    last_err = Some(err);
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }
        Err(last_err
            .map(anyhow::Error::from)
            .unwrap_or_else(|| anyhow::anyhow!("users.lookupByEmail failed")))
    }
}

impl Messenger for SlackClient {
    async fn lookup_user(&self, email: &str) -> anyhow::Result<Option<String>> {
        for variation in email_variations(email) {
            if let Some(user_id) = self.lookup_once(&variation).await? {
                return Ok(Some(user_id));
            }
        }
        Ok(None)
    }

    async fn send_dm(&self, user_id: &str, text: &str) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "channel": user_id,
            "text": text,
        });
        let response: PostMessageResponse = self
            .client
            .post(format!("{SLACK_API_BASE}/chat.postMessage"))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .context("chat.postMessage request failed")?
            .json()
            .await
            .context("malformed chat.postMessage response")?;

        if !response.ok {
            anyhow::bail!(
                "chat.postMessage rejected: {}",
                response.error.unwrap_or_else(|| "unknown error".to_string())
            );
        }
        Ok(())
    }
}

/// Prints every message instead of delivering it. Lookups always
/// succeed so a dry run exercises the full pipeline.
pub struct DryRunMessenger;

impl Messenger for DryRunMessenger {
    async fn lookup_user(&self, email: &str) -> anyhow::Result<Option<String>> {
        Ok(Some(format!("dry-run:{}", email.to_lowercase())))
    }

    async fn send_dm(&self, user_id: &str, text: &str) -> anyhow::Result<()> {
        println!("--- would DM {user_id} ---\n{text}\n");
        Ok(())
    }
}
