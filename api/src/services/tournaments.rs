use crate::client::{ApiError, ApiResult, FundApi};
use crate::envelope::{decode_list, unwrap_item};
use crate::{Team, TeamsPerTicket, Tournament};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentDraft {
    pub name: String,
    pub rounds: u32,
    pub teams_per_ticket: TeamsPerTicket,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announcement_date: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl TournamentDraft {
    pub fn validate(&self) -> ApiResult<()> {
        if self.name.trim().is_empty() {
            return Err(ApiError::Other("Tournament name is required".into()));
        }
        if self.rounds == 0 {
            return Err(ApiError::Other("A tournament needs at least one round".into()));
        }
        Ok(())
    }
}

impl From<&Tournament> for TournamentDraft {
    fn from(t: &Tournament) -> Self {
        Self {
            name: t.name.clone(),
            rounds: t.rounds,
            teams_per_ticket: t.teams_per_ticket,
            announcement_date: t.announcement_date,
            is_active: t.is_active,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDraft {
    pub seed_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    pub conference: String,
}

impl TeamDraft {
    /// Seeds are required and unique within a tournament.
    pub fn validate(&self, existing: &[Team], editing_id: Option<&str>) -> ApiResult<()> {
        let seed = self.seed_number.trim();
        if seed.is_empty() {
            return Err(ApiError::Other("Seed number is required".into()));
        }
        let taken = existing
            .iter()
            .filter(|t| Some(t.id.as_str()) != editing_id)
            .any(|t| t.seed_number.trim().eq_ignore_ascii_case(seed));
        if taken {
            return Err(ApiError::Other(format!("Seed {seed} is already used in this tournament")));
        }
        Ok(())
    }
}

fn decode_item<T: DeserializeOwned>(body: Value, resource: &str, path: &str) -> ApiResult<T> {
    serde_json::from_value(unwrap_item(body, resource))
        .map_err(|e| ApiError::Parsing(e.to_string(), path.to_owned()))
}

fn to_body<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::Other(format!("serialize request failed: {e}")))
}

impl FundApi {
    pub async fn list_tournaments(&self) -> ApiResult<Vec<Tournament>> {
        let body = self.get("/tournaments", &[]).await?;
        Ok(decode_list(body, "tournaments"))
    }

    pub async fn get_tournament(&self, id: &str) -> ApiResult<Tournament> {
        let path = format!("/tournaments/{id}");
        let body = self.get(&path, &[]).await?;
        decode_item(body, "tournament", &path)
    }

    pub async fn create_tournament(&self, draft: &TournamentDraft) -> ApiResult<Tournament> {
        draft.validate()?;
        let body = self.post("/tournaments", &to_body(draft)?).await?;
        decode_item(body, "tournament", "/tournaments")
    }

    pub async fn update_tournament(&self, id: &str, draft: &TournamentDraft) -> ApiResult<Tournament> {
        draft.validate()?;
        let path = format!("/tournaments/{id}");
        let body = self.put(&path, &to_body(draft)?).await?;
        decode_item(body, "tournament", &path)
    }

    pub async fn delete_tournament(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/tournaments/{id}")).await.map(|_| ())
    }

    pub async fn list_teams(&self, tournament_id: &str) -> ApiResult<Vec<Team>> {
        let body = self
            .get("/tournaments/teams/list", &[("tournamentId", tournament_id)])
            .await?;
        Ok(decode_list(body, "teams"))
    }

    pub async fn create_team(&self, tournament_id: &str, draft: &TeamDraft) -> ApiResult<Team> {
        let mut payload = to_body(draft)?;
        if let Value::Object(map) = &mut payload {
            map.insert("tournamentId".into(), Value::String(tournament_id.to_owned()));
        }
        let body = self.post("/tournaments/teams", &payload).await?;
        decode_item(body, "team", "/tournaments/teams")
    }

    pub async fn update_team(&self, id: &str, draft: &TeamDraft) -> ApiResult<Team> {
        let path = format!("/tournaments/teams/{id}");
        let body = self.put(&path, &to_body(draft)?).await?;
        decode_item(body, "team", &path)
    }

    pub async fn delete_team(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/tournaments/teams/{id}")).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::temp_storage;
    use mockito::Matcher;
    use serde_json::json;

    fn team(id: &str, seed: &str) -> Team {
        Team { id: id.into(), seed_number: seed.into(), ..Default::default() }
    }

    #[test]
    fn team_seed_is_required_and_unique() {
        let existing = vec![team("a", "1"), team("b", "2")];
        let draft = |seed: &str| TeamDraft { seed_number: seed.into(), ..Default::default() };

        assert!(draft("  ").validate(&existing, None).is_err());
        assert!(draft("2").validate(&existing, None).is_err());
        assert!(draft("2").validate(&existing, Some("b")).is_ok());
        assert!(draft("3").validate(&existing, None).is_ok());
    }

    #[test]
    fn tournament_draft_needs_name_and_rounds() {
        let mut draft = TournamentDraft { name: "Spring".into(), rounds: 6, ..Default::default() };
        assert!(draft.validate().is_ok());
        draft.rounds = 0;
        assert!(draft.validate().is_err());
        draft.rounds = 1;
        draft.name = " ".into();
        assert!(draft.validate().is_err());
    }

    #[tokio::test]
    async fn list_tournaments_accepts_wrapped_payload() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tournaments")
            .with_status(200)
            .with_body(
                r#"{"data": {"tournaments": [
                    {"_id": "t1", "name": "March Fund", "rounds": 6, "teamsPerTicket": 4, "isActive": true,
                     "announcementDate": "2026-03-15T18:00:00Z"},
                    {"_id": "t2", "name": "Legacy", "teamsPerTicket": 9}
                ]}}"#,
            )
            .create_async()
            .await;

        let api = FundApi::new(server.url(), temp_storage("tournaments-list"));
        let tournaments = api.list_tournaments().await.unwrap();
        assert_eq!(tournaments.len(), 2);
        assert_eq!(tournaments[0].teams_per_ticket.get(), 4);
        assert!(tournaments[0].announcement_date.is_some());
        assert_eq!(tournaments[1].teams_per_ticket, TeamsPerTicket::default());
        assert_eq!(tournaments[1].rounds, 1);
    }

    #[tokio::test]
    async fn list_teams_filters_by_tournament() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/tournaments/teams/list".into()))
            .match_query(Matcher::UrlEncoded("tournamentId".into(), "t1".into()))
            .with_status(200)
            .with_body(r#"[{"_id": "x", "seedNumber": "1", "teamName": null, "conference": "East"}]"#)
            .create_async()
            .await;

        let api = FundApi::new(server.url(), temp_storage("tournaments-teams"));
        let teams = api.list_teams("t1").await.unwrap();
        assert_eq!(teams.len(), 1);
        assert!(teams[0].is_seed_only());
        assert_eq!(teams[0].label(), "Seed 1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_team_sends_tournament_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/tournaments/teams")
            .match_body(Matcher::PartialJson(json!({"tournamentId": "t1", "seedNumber": "3"})))
            .with_status(201)
            .with_body(r#"{"team": {"_id": "n", "seedNumber": "3", "teamName": "Owls"}}"#)
            .create_async()
            .await;

        let api = FundApi::new(server.url(), temp_storage("tournaments-create-team"));
        let draft = TeamDraft { seed_number: "3".into(), team_name: Some("Owls".into()), ..Default::default() };
        let team = api.create_team("t1", &draft).await.unwrap();
        assert_eq!(team.label(), "(3) Owls");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected_before_any_request() {
        let server = mockito::Server::new_async().await;
        let api = FundApi::new(server.url(), temp_storage("tournaments-invalid"));
        let err = api.create_tournament(&TournamentDraft::default()).await.unwrap_err();
        assert_eq!(err.message(), "Tournament name is required");
    }
}
