//! Coerce loosely-shaped backend records into display rows.
//!
//! Every function here is a pure function of `(raw, index)`: no I/O, never
//! fails, and missing or renamed fields fall back to fixed defaults. `index`
//! is the record's position in its listing and seeds placeholder identifiers.

use crate::{PaymentRow, PaymentStatus, TicketKind, TicketRow, TicketStatus, UserRow};
use serde_json::Value;

pub const DEFAULT_EXCHANGES: u8 = 5;
const PLACEHOLDER_BASE: usize = 10_000;

pub fn normalize_ticket(raw: &Value, index: usize) -> TicketRow {
    let status = text(raw, &["status"])
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_else(|| TicketStatus::Active.label().to_owned());
    let kind = match TicketStatus::parse(&status) {
        Some(TicketStatus::Free) => TicketKind::Free,
        Some(TicketStatus::Reserved) => TicketKind::Reserved,
        _ => TicketKind::Paid,
    };

    let teams = raw
        .get("teams")
        .and_then(Value::as_array)
        .map(|teams| teams.iter().map(team_label).collect())
        .unwrap_or_default();

    TicketRow {
        id: text(raw, &["_id", "id"]).unwrap_or_else(|| format!("ticket-{index}")),
        number: text(raw, &["ticketNumber", "number"])
            .unwrap_or_else(|| format!("T-{}", PLACEHOLDER_BASE + index)),
        teams,
        kind,
        status,
        owner: nested_name(raw, &["owner", "user", "player"])
            .or_else(|| text(raw, &["ownerName", "playerName", "owner"]))
            .unwrap_or_else(|| "Unknown".into()),
        created: date(raw, &["createdAt", "purchaseDate", "created"]),
        tournament: nested_name(raw, &["tournament"])
            .or_else(|| text(raw, &["tournamentName", "tournament"]))
            .unwrap_or_else(|| "N/A".into()),
        access_code: text(raw, &["accessCode", "code"]).unwrap_or_default(),
        exchanges_left: number(raw, &["exchangesLeft", "exchangesRemaining"])
            .map(|n| n.clamp(0.0, f64::from(DEFAULT_EXCHANGES)) as u8)
            .unwrap_or(DEFAULT_EXCHANGES),
        total_points: number(raw, &["totalPoints", "points"])
            .map(|n| n.max(0.0))
            .unwrap_or(0.0),
    }
}

/// Team entries arrive as bare strings or as objects; prefer the seed.
fn team_label(team: &Value) -> String {
    match team {
        Value::String(s) if !s.trim().is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Object(_) => text(team, &["seed", "seedNumber", "name", "teamName"])
            .unwrap_or_else(|| "Unknown Team".into()),
        _ => "Unknown Team".into(),
    }
}

pub fn normalize_payment(raw: &Value, index: usize) -> PaymentRow {
    let amount = number(raw, &["amount", "total"])
        .map(|n| n.max(0.0))
        .unwrap_or(0.0);
    let method = if amount == 0.0 {
        "Free".to_owned()
    } else {
        text(raw, &["method", "paymentMethod", "provider"])
            .map(|m| title_case(&m))
            .unwrap_or_else(|| "Card".into())
    };
    let status = text(raw, &["status"])
        .and_then(|s| PaymentStatus::parse(&s))
        .unwrap_or(PaymentStatus::Pending);

    PaymentRow {
        id: text(raw, &["_id", "id"]).unwrap_or_else(|| format!("payment-{index}")),
        transaction_id: text(raw, &["transactionId", "paymentIntentId", "orderId"])
            .unwrap_or_else(|| format!("TXN-{}", PLACEHOLDER_BASE + index)),
        user: nested_name(raw, &["user", "player"])
            .or_else(|| text(raw, &["userName", "playerName", "user"]))
            .unwrap_or_else(|| "Unknown".into()),
        amount,
        method,
        status: status.label().to_owned(),
        date: date(raw, &["date", "createdAt"]),
        ticket_id: raw
            .get("ticket")
            .filter(|t| t.is_object())
            .and_then(|t| text(t, &["_id", "id"]))
            .or_else(|| text(raw, &["ticketId", "ticket"]))
            .unwrap_or_default(),
    }
}

pub fn normalize_user(raw: &Value, index: usize) -> UserRow {
    let name = text(raw, &["name", "fullName"])
        .or_else(|| {
            let first = text(raw, &["firstName"]).unwrap_or_default();
            let last = text(raw, &["lastName"]).unwrap_or_default();
            let full = format!("{first} {last}").trim().to_owned();
            (!full.is_empty()).then_some(full)
        })
        .unwrap_or_else(|| "Unknown User".into());

    let tickets = number(raw, &["ticketCount", "ticketsCount"])
        .or_else(|| match raw.get("tickets") {
            Some(Value::Array(items)) => Some(items.len() as f64),
            _ => number(raw, &["tickets"]),
        })
        .map(|n| n.max(0.0) as u32)
        .unwrap_or(0);

    let status = match raw.get("isActive").and_then(Value::as_bool) {
        Some(false) => "Inactive".to_owned(),
        _ => text(raw, &["status"])
            .map(|s| title_case(&s))
            .unwrap_or_else(|| "Active".into()),
    };

    let role = match text(raw, &["role"]).map(|r| r.to_ascii_lowercase()).as_deref() {
        Some("admin") => "admin",
        _ => "player",
    };

    UserRow {
        id: text(raw, &["_id", "id"]).unwrap_or_else(|| format!("user-{index}")),
        name,
        email: text(raw, &["email"]).unwrap_or_default(),
        phone: text(raw, &["phone", "phoneNumber"]).unwrap_or_else(|| "N/A".into()),
        tickets,
        status,
        joined: date(raw, &["createdAt", "joined", "joinedAt"]),
        role: role.to_owned(),
    }
}

pub fn normalize_tickets(raw: &[Value]) -> Vec<TicketRow> {
    raw.iter().enumerate().map(|(i, r)| normalize_ticket(r, i)).collect()
}

pub fn normalize_payments(raw: &[Value]) -> Vec<PaymentRow> {
    raw.iter().enumerate().map(|(i, r)| normalize_payment(r, i)).collect()
}

pub fn normalize_users(raw: &[Value]) -> Vec<UserRow> {
    raw.iter().enumerate().map(|(i, r)| normalize_user(r, i)).collect()
}

// ---------------------------------------------------------------------------
// Field access helpers
// ---------------------------------------------------------------------------

/// First non-empty string (or number rendered as string) among `keys`.
fn text(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match raw.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// First finite number (or numeric string) among `keys`.
fn number(raw: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|key| match raw.get(*key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|n| n.is_finite())
}

/// `name` of the first embedded object among `keys`.
fn nested_name(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let inner = raw.get(*key).filter(|v| v.is_object())?;
        text(inner, &["name", "fullName", "email"])
    })
}

/// Calendar date part of an ISO timestamp.
fn date(raw: &Value, keys: &[&str]) -> String {
    text(raw, keys)
        .map(|s| s.chars().take(10).collect())
        .unwrap_or_else(|| "N/A".into())
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
    }
}
