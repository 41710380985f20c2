//! Pass predicates, one per check
//!
//! Each predicate returns `Ok(detail)` on pass and `Err(CheckFailure)` on a
//! miss. Details list every number and flag the predicate looked at. A body
//! of the wrong shape is a `Decode` failure, never a panic.

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::CheckFailure;

// Parity Report
pub const MIN_DEMO_FRIENDS: u64 = 5;
pub const MIN_DEMO_RSVPS: u64 = 3;
pub const MIN_DEMO_INTERACTIONS: u64 = 3;

// Runtime Info
pub const MIN_USERS: u64 = 10;
pub const MIN_ITEMS: u64 = 40;
pub const MIN_EVENTS: u64 = 20;
pub const MIN_RSVPS: u64 = 10;
pub const MIN_FRIENDSHIPS: u64 = 5;

// Feed endpoints
pub const MIN_CLUBS: usize = 5;
pub const MIN_FEED_EVENTS: usize = 10;
pub const MIN_FRIENDS: usize = 3;
pub const MIN_MAP_MARKERS: usize = 20;

/// Name the frontend uses when a friend's profile could not be resolved
pub const PLACEHOLDER_FIRST_NAME: &str = "?";

fn decode<T: DeserializeOwned>(body: &Value, what: &str) -> Result<T, CheckFailure> {
    T::deserialize(body)
        .map_err(|e| CheckFailure::decode(format!("Unexpected {} shape: {}", what, e)))
}

fn verdict(pass: bool, detail: String) -> Result<String, CheckFailure> {
    if pass {
        Ok(detail)
    } else {
        Err(CheckFailure::threshold(detail))
    }
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "unknown".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Loose truthiness as the app's own frontend applies it: null, false, 0,
/// NaN and "" are false, everything else (including `[]` and `{}`) is true.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn array_len(body: &Value, key: &str) -> usize {
    body.get(key).and_then(Value::as_array).map_or(0, Vec::len)
}

fn as_list<'a>(body: &'a Value, what: &str) -> Result<&'a Vec<Value>, CheckFailure> {
    body.as_array()
        .ok_or_else(|| CheckFailure::decode(format!("Expected a JSON array of {}", what)))
}

// ============================================================================
// Parity Report
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParityReport {
    demo_user: DemoUser,
    #[serde(default)]
    database_fingerprint: Option<DatabaseFingerprint>,
    #[serde(default)]
    node_env: Option<Value>,
    #[serde(default)]
    is_published: Option<Value>,
    #[serde(default)]
    demo_mode_flags: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DemoUser {
    exists: bool,
    has_profile: bool,
    friend_count: u64,
    rsvp_count: u64,
    interaction_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatabaseFingerprint {
    #[serde(default)]
    host: Option<Value>,
    #[serde(default)]
    db_name: Option<Value>,
}

pub fn parity_report(body: &Value) -> Result<String, CheckFailure> {
    let report: ParityReport = decode(body, "parity report")?;
    let du = &report.demo_user;

    let pass = du.exists
        && du.has_profile
        && du.friend_count >= MIN_DEMO_FRIENDS
        && du.rsvp_count >= MIN_DEMO_RSVPS
        && du.interaction_count >= MIN_DEMO_INTERACTIONS;

    let (host, db_name) = match &report.database_fingerprint {
        Some(fp) => (
            display_value(fp.host.as_ref()),
            display_value(fp.db_name.as_ref()),
        ),
        None => ("unknown".to_string(), "unknown".to_string()),
    };
    let bypass_flag = report
        .demo_mode_flags
        .as_ref()
        .and_then(|flags| flags.get("DEMO_BYPASS_AUTH"));

    verdict(
        pass,
        format!(
            "DemoUser={} Profile={} Friends={} RSVPs={} Interactions={} | DB={}/{} | ENV={} | Published={} | DEMO_BYPASS={}",
            du.exists,
            du.has_profile,
            du.friend_count,
            du.rsvp_count,
            du.interaction_count,
            host,
            db_name,
            display_value(report.node_env.as_ref()),
            display_value(report.is_published.as_ref()),
            display_value(bypass_flag),
        ),
    )
}

// ============================================================================
// Auth Status
// ============================================================================

/// Subject ids are strings from our own store, but other auth backends
/// serve numeric ids.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SubjectId {
    Text(String),
    Number(serde_json::Number),
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubjectId::Text(s) => f.write_str(s),
            SubjectId::Number(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthUser {
    id: SubjectId,
    #[serde(default)]
    first_name: Option<Value>,
    #[serde(default)]
    last_name: Option<Value>,
}

fn name_part(value: Option<&Value>) -> String {
    match value {
        Some(v) => display_value(Some(v)),
        None => "-".to_string(),
    }
}

/// Passes on any decodable identity: no threshold applies to this check.
pub fn auth_status(body: &Value) -> Result<String, CheckFailure> {
    if body.is_null() {
        return Err(CheckFailure::decode("No identity in response"));
    }
    let user: AuthUser = decode(body, "identity")?;
    Ok(format!(
        "Logged in as {} {} ({})",
        name_part(user.first_name.as_ref()),
        name_part(user.last_name.as_ref()),
        user.id
    ))
}

// ============================================================================
// Runtime Info
// ============================================================================

#[derive(Debug, Deserialize)]
struct RuntimeInfo {
    counts: RuntimeCounts,
}

#[derive(Debug, Deserialize)]
struct RuntimeCounts {
    users: u64,
    items: u64,
    events: u64,
    rsvps: u64,
    friendships: u64,
    #[serde(default)]
    profiles: Option<u64>,
}

pub fn runtime_info(body: &Value) -> Result<String, CheckFailure> {
    let info: RuntimeInfo = decode(body, "runtime info")?;
    let c = &info.counts;

    let pass = c.users >= MIN_USERS
        && c.items >= MIN_ITEMS
        && c.events >= MIN_EVENTS
        && c.rsvps >= MIN_RSVPS
        && c.friendships >= MIN_FRIENDSHIPS;

    verdict(
        pass,
        format!(
            "Users={} Items={} Events={} RSVPs={} Friends={} Profiles={}",
            c.users,
            c.items,
            c.events,
            c.rsvps,
            c.friendships,
            c.profiles
                .map(|p| p.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        ),
    )
}

// ============================================================================
// Feeds
// ============================================================================

pub fn clubs_api(body: &Value) -> Result<String, CheckFailure> {
    if !body.is_object() {
        return Err(CheckFailure::decode(
            "Expected an object with a recommendations list",
        ));
    }
    let recommendations = body
        .get("recommendations")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let count = recommendations.len();
    let unique_images: BTreeSet<String> = recommendations
        .iter()
        .map(|r| display_value(r.get("imageUrl")))
        .collect();

    verdict(
        count >= MIN_CLUBS,
        format!("{} clubs, {} unique images", count, unique_images.len()),
    )
}

pub fn events_api(body: &Value) -> Result<String, CheckFailure> {
    let count = as_list(body, "events")?.len();
    verdict(
        count >= MIN_FEED_EVENTS,
        format!("{} events returned", count),
    )
}

fn has_real_first_name(friend: &Value) -> bool {
    friend
        .get("firstName")
        .is_some_and(|name| is_truthy(name) && name.as_str() != Some(PLACEHOLDER_FIRST_NAME))
}

pub fn friends_api(body: &Value) -> Result<String, CheckFailure> {
    let friends = as_list(body, "friends")?;
    let count = friends.len();
    let names_valid = friends.iter().all(has_real_first_name);

    verdict(
        count >= MIN_FRIENDS && names_valid,
        format!("{} friends, names valid: {}", count, names_valid),
    )
}

pub fn map_data(body: &Value) -> Result<String, CheckFailure> {
    if !body.is_object() {
        return Err(CheckFailure::decode(
            "Expected an object with events and clubs lists",
        ));
    }
    let total = array_len(body, "events") + array_len(body, "clubs");
    verdict(
        total >= MIN_MAP_MARKERS,
        format!("{} total map markers", total),
    )
}

// ============================================================================
// Profile Data
// ============================================================================

pub fn profile_data(body: &Value) -> Result<String, CheckFailure> {
    if body.is_null() {
        return Err(CheckFailure::threshold("No taste profile found"));
    }

    let flag = body.get("onboardingComplete");
    let onboarding = match flag {
        Some(value) => display_value(Some(value)),
        None => "false".to_string(),
    };
    if !flag.is_some_and(is_truthy) {
        return Err(CheckFailure::threshold(format!(
            "Onboarding not complete (onboardingComplete={})",
            onboarding
        )));
    }

    let clusters: Vec<String> = body
        .get("topClusters")
        .and_then(Value::as_array)
        .map(|list| list.iter().map(|c| display_value(Some(c))).collect())
        .unwrap_or_default();

    Ok(format!(
        "Onboarding: {}, clusters: {}",
        onboarding,
        clusters.join(", ")
    ))
}
