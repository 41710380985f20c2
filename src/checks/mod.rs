//! Check roster
//!
//! The ordered list of check definitions is the iteration authority for a
//! run: checks execute in this order and results are displayed in this order.
//! Thresholds live in `predicates` as fixed constants.

pub mod predicates;

use serde::Serialize;
use serde_json::Value;

use crate::error::CheckFailure;

pub const PARITY_REPORT: &str = "Parity Report";
pub const AUTH_STATUS: &str = "Auth Status";
pub const RUNTIME_INFO: &str = "Runtime Info";
pub const CLUBS_API: &str = "Clubs API";
pub const EVENTS_API: &str = "Events API";
pub const FRIENDS_API: &str = "Friends API";
pub const MAP_DATA: &str = "Map Data";
pub const PROFILE_DATA: &str = "Profile Data";

/// Endpoints of the deployment under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    ParityReport,
    AuthUser,
    Runtime,
    AcademicRecommendations,
    EventsForYou,
    Friends,
    MapData,
    TasteProfile,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::ParityReport => "/api/debug/parity-report",
            Endpoint::AuthUser => "/api/auth/user",
            Endpoint::Runtime => "/api/debug/runtime",
            Endpoint::AcademicRecommendations => "/api/recommendations/academic",
            Endpoint::EventsForYou => "/api/events/for-you",
            Endpoint::Friends => "/api/friends",
            Endpoint::MapData => "/api/explore/map-data",
            Endpoint::TasteProfile => "/api/taste-profile",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Whether ambient session credentials (cookies) are attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Credentials {
    Include,
    Omit,
}

/// Maps a decoded body to a pass detail, or a failure carrying the detail
pub type Predicate = fn(&Value) -> Result<String, CheckFailure>;

/// One named check: endpoint, credential mode and pass predicate
#[derive(Clone, Copy)]
pub struct CheckDefinition {
    pub name: &'static str,
    pub endpoint: Endpoint,
    pub credentials: Credentials,
    pub predicate: Predicate,
    /// Detail shown while the check is running
    pub progress_detail: &'static str,
    /// Prefix for non-2xx failures ("Auth" -> "Auth returned 401")
    pub status_label: Option<&'static str>,
    /// Prefix for transport failures ("Auth" -> "Auth error: <msg>")
    pub transport_label: Option<&'static str>,
    /// Keep the decoded body as the run's diagnostic snapshot
    pub retain_body: bool,
}

impl std::fmt::Debug for CheckDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckDefinition")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials)
            .field("retain_body", &self.retain_body)
            .finish()
    }
}

impl CheckDefinition {
    fn new(name: &'static str, endpoint: Endpoint, predicate: Predicate) -> Self {
        Self {
            name,
            endpoint,
            credentials: Credentials::Include,
            predicate,
            progress_detail: "Checking...",
            status_label: None,
            transport_label: None,
            retain_body: false,
        }
    }

    fn without_credentials(mut self) -> Self {
        self.credentials = Credentials::Omit;
        self
    }

    fn status_labelled(mut self, label: &'static str) -> Self {
        self.status_label = Some(label);
        self
    }

    fn transport_labelled(mut self, label: &'static str) -> Self {
        self.transport_label = Some(label);
        self
    }

    pub fn evaluate(&self, body: &Value) -> Result<String, CheckFailure> {
        (self.predicate)(body)
    }

    /// Detail string for a failed check
    pub fn describe_failure(&self, failure: &CheckFailure) -> String {
        match failure {
            CheckFailure::HttpStatus(code) => match self.status_label {
                Some(label) => format!("{} returned {}", label, code),
                None => failure.to_string(),
            },
            CheckFailure::Transport(msg) => match self.transport_label {
                Some(label) => format!("{} error: {}", label, msg),
                None => msg.clone(),
            },
            _ => failure.to_string(),
        }
    }
}

/// The fixed, ordered check roster
pub fn roster() -> Vec<CheckDefinition> {
    vec![
        CheckDefinition {
            progress_detail: "Fetching...",
            retain_body: true,
            ..CheckDefinition::new(PARITY_REPORT, Endpoint::ParityReport, predicates::parity_report)
                .without_credentials()
        },
        CheckDefinition::new(AUTH_STATUS, Endpoint::AuthUser, predicates::auth_status)
            .status_labelled("Auth")
            .transport_labelled("Auth"),
        CheckDefinition::new(RUNTIME_INFO, Endpoint::Runtime, predicates::runtime_info)
            .without_credentials()
            .status_labelled("Runtime"),
        CheckDefinition::new(
            CLUBS_API,
            Endpoint::AcademicRecommendations,
            predicates::clubs_api,
        ),
        CheckDefinition::new(EVENTS_API, Endpoint::EventsForYou, predicates::events_api),
        CheckDefinition::new(FRIENDS_API, Endpoint::Friends, predicates::friends_api),
        CheckDefinition::new(MAP_DATA, Endpoint::MapData, predicates::map_data),
        CheckDefinition::new(PROFILE_DATA, Endpoint::TasteProfile, predicates::profile_data),
    ]
}
