use crate::client::{ApiError, ApiResult, FundApi};
use crate::envelope::{decode_list, unwrap_item};
use crate::{LeaderboardEntry, Score};

impl FundApi {
    pub async fn list_scores(&self, tournament_id: &str) -> ApiResult<Vec<Score>> {
        let body = self.get("/scores", &[("tournamentId", tournament_id)]).await?;
        Ok(decode_list(body, "scores"))
    }

    /// Create or overwrite the score for one `(team, round)`.
    pub async fn save_score(&self, score: &Score) -> ApiResult<Score> {
        let payload = serde_json::to_value(score)
            .map_err(|e| ApiError::Other(format!("serialize score failed: {e}")))?;
        let body = self.post("/scores", &payload).await?;
        match unwrap_item(body, "score") {
            serde_json::Value::Null => Ok(score.clone()),
            item => serde_json::from_value(item)
                .map_err(|e| ApiError::Parsing(e.to_string(), "/scores".into())),
        }
    }

    pub async fn leaderboard(&self, tournament_id: &str) -> ApiResult<Vec<LeaderboardEntry>> {
        let body = self
            .get("/leaderboard", &[("tournamentId", tournament_id)])
            .await?;
        Ok(decode_list(body, "leaderboard"))
    }
}
