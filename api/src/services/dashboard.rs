use crate::Tournament;
use crate::client::{ApiResult, FundApi};
use crate::envelope::{decode_list, unwrap_list};
use serde_json::Value;

impl FundApi {
    pub async fn recent_players(&self) -> ApiResult<Vec<Value>> {
        let body = self.get("/dashboard/players/recent", &[]).await?;
        Ok(unwrap_list(body, "players"))
    }

    pub async fn recent_tournaments(&self) -> ApiResult<Vec<Tournament>> {
        let body = self.get("/dashboard/tournaments/recent", &[]).await?;
        Ok(decode_list(body, "tournaments"))
    }

    pub async fn recent_tickets(&self) -> ApiResult<Vec<Value>> {
        let body = self.get("/dashboard/tickets/recent", &[]).await?;
        Ok(unwrap_list(body, "tickets"))
    }
}
