use crate::Role;
use crate::client::{ApiError, ApiResult, FundApi};
use crate::envelope::{AuthPayload, unwrap_auth};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl FundApi {
    /// `POST /auth/{admin|player}/login`.
    pub async fn login(&self, email: &str, password: &str, is_admin: bool) -> ApiResult<AuthPayload> {
        let path = format!("/auth/{}/login", Role::auth_segment(is_admin));
        let body = self
            .post(&path, &json!({ "email": email, "password": password }))
            .await?;
        unwrap_auth(body).ok_or_else(|| {
            ApiError::Parsing("login response carried no user record".into(), path)
        })
    }

    /// `POST /auth/{admin|player}/register`.
    pub async fn register(&self, registration: &Registration, is_admin: bool) -> ApiResult<AuthPayload> {
        let path = format!("/auth/{}/register", Role::auth_segment(is_admin));
        let payload = serde_json::to_value(registration)
            .map_err(|e| ApiError::Other(format!("serialize registration failed: {e}")))?;
        let body = self.post(&path, &payload).await?;
        unwrap_auth(body).ok_or_else(|| {
            ApiError::Parsing("register response carried no user record".into(), path)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::temp_storage;
    use mockito::Matcher;

    #[tokio::test]
    async fn admin_login_hits_admin_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/admin/login")
            .match_body(Matcher::PartialJson(json!({"email": "a@x.io", "password": "pw"})))
            .with_status(200)
            .with_body(r#"{"admin": {"_id": "a1", "name": "Root", "role": "admin"}, "token": "tok"}"#)
            .create_async()
            .await;

        let api = FundApi::new(server.url(), temp_storage("auth-admin-login"));
        let payload = api.login("a@x.io", "pw", true).await.unwrap();
        assert_eq!(payload.identity.id, "a1");
        assert_eq!(payload.identity.role, Role::Admin);
        assert_eq!(payload.token.as_deref(), Some("tok"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn player_register_posts_registration() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/player/register")
            .match_body(Matcher::PartialJson(json!({"name": "Kim", "email": "k@x.io"})))
            .with_status(201)
            .with_body(r#"{"player": {"id": "p1", "name": "Kim", "email": "k@x.io"}}"#)
            .create_async()
            .await;

        let api = FundApi::new(server.url(), temp_storage("auth-register"));
        let registration = Registration {
            name: "Kim".into(),
            email: "k@x.io".into(),
            password: "secret".into(),
            phone: None,
        };
        let payload = api.register(&registration, false).await.unwrap();
        assert_eq!(payload.identity.role, Role::Player);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn login_without_user_record_is_a_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth/player/login")
            .with_status(200)
            .with_body(r#"{"ok": true}"#)
            .create_async()
            .await;

        let api = FundApi::new(server.url(), temp_storage("auth-no-user"));
        let err = api.login("p@x.io", "pw", false).await.unwrap_err();
        assert!(matches!(err, ApiError::Parsing(..)));
    }
}
