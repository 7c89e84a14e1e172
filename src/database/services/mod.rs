use super::errors::DatabaseError;
use crate::configuration::require_env;
use postgrest::Postgrest;

mod request;
mod user;

/// Supabase-backed implementation of [`crate::database::RequestStore`].
pub struct DatabaseService {
    pub(crate) client: Postgrest,
}

impl DatabaseService {
    pub fn new() -> Result<Self, DatabaseError> {
        let url =
            require_env("SUPABASE_URL").map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;
        let service_key =
            require_env("SUPABASE_KEY").map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        let rest_url = format!("{}/rest/v1", url);
        let client = Postgrest::new(&rest_url)
            .insert_header("apikey", &service_key)
            .insert_header("Authorization", &format!("Bearer {}", service_key));

        Ok(Self { client })
    }
}
