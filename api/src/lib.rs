pub mod client;
pub mod envelope;
pub mod normalize;
pub mod purchase;
pub mod scoring;
pub mod services;
pub mod session;
pub mod storage;

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Domain types: the lenient superset the client assumes of the backend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    #[default]
    Player,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Player => "player",
            Role::Admin => "admin",
        }
    }

    /// Path segment used by the `/auth/{role}/...` endpoints.
    pub fn auth_segment(is_admin: bool) -> &'static str {
        if is_admin { "admin" } else { "player" }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        if s.trim().eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::Player
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_owned()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(alias = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

/// Number of teams drawn onto one ticket. Always within 3..=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TeamsPerTicket(u8);

impl TeamsPerTicket {
    pub const MIN: u8 = 3;
    pub const MAX: u8 = 6;
    pub const ALL: [TeamsPerTicket; 4] =
        [TeamsPerTicket(3), TeamsPerTicket(4), TeamsPerTicket(5), TeamsPerTicket(6)];

    pub fn new(n: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&n).then_some(Self(n))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn next(self) -> Self {
        Self::new(self.0 + 1).unwrap_or(self)
    }

    pub fn prev(self) -> Self {
        Self::new(self.0.saturating_sub(1)).unwrap_or(self)
    }
}

impl Default for TeamsPerTicket {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<u8> for TeamsPerTicket {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::new(n).ok_or_else(|| format!("teams per ticket must be 3..=6, got {n}"))
    }
}

impl From<TeamsPerTicket> for u8 {
    fn from(t: TeamsPerTicket) -> Self {
        t.0
    }
}

impl fmt::Display for TeamsPerTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    #[serde(alias = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_rounds")]
    pub rounds: u32,
    #[serde(default, deserialize_with = "lenient_teams_per_ticket")]
    pub teams_per_ticket: TeamsPerTicket,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub announcement_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: bool,
}

fn default_rounds() -> u32 {
    1
}

fn lenient_teams_per_ticket<'de, D>(deserializer: D) -> Result<TeamsPerTicket, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(raw
        .as_u64()
        .and_then(|n| u8::try_from(n).ok())
        .and_then(TeamsPerTicket::new)
        .unwrap_or_default())
}

fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer).unwrap_or(None);
    Ok(raw
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc)))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected seed, got {other}"))),
    }
}

/// Points arrive as integers, floats or numeric strings. Fractions are rounded
/// and negatives floored at zero rather than rejecting the record.
fn lenient_points<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    let value = match &raw {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        serde_json::Value::Null => Some(0.0),
        _ => None,
    };
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return Err(serde::de::Error::custom(format!("expected points, got {raw}")));
    };
    if value.fract() != 0.0 || value < 0.0 {
        warn!("rounding points value {value}");
    }
    Ok(value.round().clamp(0.0, f64::from(u32::MAX)) as u32)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    #[serde(alias = "_id", default)]
    pub id: String,
    #[serde(alias = "seed", deserialize_with = "string_or_number")]
    pub seed_number: String,
    #[serde(default, alias = "name")]
    pub team_name: Option<String>,
    #[serde(default)]
    pub conference: String,
}

impl Team {
    /// Teams are "seed-only" until the official field is announced.
    pub fn is_seed_only(&self) -> bool {
        self.team_name.as_deref().map(str::trim).unwrap_or("").is_empty()
    }

    pub fn label(&self) -> String {
        match self.team_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => format!("({}) {name}", self.seed_number),
            _ => format!("Seed {}", self.seed_number),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    #[default]
    Active,
    Reserved,
    Paid,
    Free,
    Inactive,
}

impl TicketStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Some(TicketStatus::Active),
            "reserved" => Some(TicketStatus::Reserved),
            "paid" => Some(TicketStatus::Paid),
            "free" => Some(TicketStatus::Free),
            "inactive" => Some(TicketStatus::Inactive),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TicketStatus::Active => "active",
            TicketStatus::Reserved => "reserved",
            TicketStatus::Paid => "paid",
            TicketStatus::Free => "free",
            TicketStatus::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    #[default]
    Completed,
    Refunded,
    Failed,
}

impl PaymentStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(PaymentStatus::Pending),
            "completed" | "succeeded" | "paid" => Some(PaymentStatus::Completed),
            "refunded" => Some(PaymentStatus::Refunded),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    #[serde(default)]
    pub tournament_id: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default = "default_rounds")]
    pub round_number: u32,
    #[serde(default, deserialize_with = "lenient_points")]
    pub points: u32,
    #[serde(default)]
    pub eliminated: bool,
}

/// Leaderboard entry as returned by `/leaderboard`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    #[serde(default, alias = "rank")]
    pub position: u32,
    #[serde(default, alias = "ticketNumber")]
    pub ticket: String,
    #[serde(default, alias = "playerName", alias = "name")]
    pub player: String,
    #[serde(default, alias = "points", deserialize_with = "lenient_points")]
    pub total_points: u32,
}

// ---------------------------------------------------------------------------
// Display records produced by the normalizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TicketKind {
    Free,
    Reserved,
    #[default]
    Paid,
}

impl TicketKind {
    pub fn label(&self) -> &'static str {
        match self {
            TicketKind::Free => "Free",
            TicketKind::Reserved => "Reserved",
            TicketKind::Paid => "Paid",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketRow {
    pub id: String,
    pub number: String,
    pub teams: Vec<String>,
    pub kind: TicketKind,
    pub status: String,
    pub owner: String,
    pub created: String,
    pub tournament: String,
    pub access_code: String,
    pub exchanges_left: u8,
    pub total_points: f64,
}

impl TicketRow {
    pub fn can_exchange(&self) -> bool {
        self.exchanges_left > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentRow {
    pub id: String,
    pub transaction_id: String,
    pub user: String,
    pub amount: f64,
    pub method: String,
    pub status: String,
    pub date: String,
    pub ticket_id: String,
}

impl PaymentRow {
    /// Free tickets carry no money to give back.
    pub fn is_refundable(&self) -> bool {
        self.amount > 0.0 && self.status == PaymentStatus::Completed.label()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub tickets: u32,
    pub status: String,
    pub joined: String,
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn score_accepts_fractional_and_string_points() {
        let score: Score =
            serde_json::from_value(json!({"teamId": "a", "roundNumber": 2, "points": 2.5})).unwrap();
        assert_eq!(score.points, 3);
        assert_eq!(score.round_number, 2);

        let score: Score = serde_json::from_value(json!({"teamId": "a", "points": "7"})).unwrap();
        assert_eq!(score.points, 7);

        let entry: LeaderboardEntry =
            serde_json::from_value(json!({"rank": 1, "ticketNumber": "T-1", "points": 40.0})).unwrap();
        assert_eq!(entry.total_points, 40);
    }

    #[test]
    fn fractional_points_keep_the_record_in_a_list() {
        let scores: Vec<Score> = envelope::decode_list(
            json!({"scores": [{"teamId": "a", "points": 2.5}, {"teamId": "b", "points": 4}]}),
            "scores",
        );
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].points, 3);
    }
}
