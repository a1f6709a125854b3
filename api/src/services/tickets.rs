use crate::client::{ApiResult, FundApi};
use crate::envelope::{unwrap_item, unwrap_list};
use serde_json::Value;

/// Optional listing filters for `/tickets`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub tournament_id: Option<String>,
    pub player_id: Option<String>,
}

impl TicketFilter {
    pub fn for_tournament(id: impl Into<String>) -> Self {
        Self { tournament_id: Some(id.into()), ..Default::default() }
    }

    pub fn for_player(id: impl Into<String>) -> Self {
        Self { player_id: Some(id.into()), ..Default::default() }
    }
}

impl FundApi {
    /// Raw ticket records; run them through [`crate::normalize`] for display.
    pub async fn list_tickets(&self, filter: &TicketFilter) -> ApiResult<Vec<Value>> {
        let mut query = Vec::new();
        if let Some(id) = filter.tournament_id.as_deref() {
            query.push(("tournamentId", id));
        }
        if let Some(id) = filter.player_id.as_deref() {
            query.push(("playerId", id));
        }
        let body = self.get("/tickets", &query).await?;
        Ok(unwrap_list(body, "tickets"))
    }

    pub async fn get_ticket(&self, id: &str) -> ApiResult<Value> {
        let body = self.get(&format!("/tickets/{id}"), &[]).await?;
        Ok(unwrap_item(body, "ticket"))
    }

    /// `POST /tickets/create`. Returns every ticket the backend reports
    /// created, whether it answered with a list or a single record.
    pub async fn create_tickets(&self, payload: &Value) -> ApiResult<Vec<Value>> {
        let body = self.post("/tickets/create", payload).await?;
        let created = unwrap_list(body.clone(), "tickets");
        if !created.is_empty() {
            return Ok(created);
        }
        Ok(match unwrap_item(body, "ticket") {
            item @ Value::Object(_) => vec![item],
            _ => Vec::new(),
        })
    }

    pub async fn update_ticket(&self, id: &str, changes: &Value) -> ApiResult<Value> {
        let body = self.put(&format!("/tickets/{id}"), changes).await?;
        Ok(unwrap_item(body, "ticket"))
    }

    pub async fn delete_ticket(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/tickets/{id}")).await.map(|_| ())
    }
}
