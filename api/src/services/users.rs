use crate::client::{ApiResult, FundApi};
use crate::envelope::unwrap_list;
use serde_json::Value;

impl FundApi {
    /// Raw user records; run them through [`crate::normalize`] for display.
    pub async fn list_users(&self) -> ApiResult<Vec<Value>> {
        let body = self.get("/users", &[]).await?;
        Ok(unwrap_list(body, "users"))
    }

    pub async fn delete_user(&self, id: &str) -> ApiResult<()> {
        self.delete(&format!("/users/{id}")).await.map(|_| ())
    }
}
