use super::super::types::User;
use super::DatabaseError;
use super::DatabaseService;

impl DatabaseService {
    pub(crate) async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, DatabaseError> {
        let response = self
            .client
            .from("users")
            .select("*")
            .eq("user_id", user_id.to_string())
            .single()
            .execute()
            .await
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        if response.status() == 406 {
            // No rows found
            return Ok(None);
        }

        let user: User = response
            .json()
            .await
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        Ok(Some(user))
    }

    // Create the user row on first interaction; rank and cumulative deposit
    // start at their schema defaults and are maintained by settlement.
    pub(crate) async fn create_user(
        &self,
        user_id: i64,
        username: Option<&str>,
    ) -> Result<User, DatabaseError> {
        let user = User::new(user_id, username.map(|s| s.to_string()));

        let _response = self
            .client
            .from("users")
            .insert(
                serde_json::to_string(&user)
                    .map_err(|e| DatabaseError::QueryError(e.to_string()))?,
            )
            .execute()
            .await
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        Ok(user)
    }
}
