//! User API client

use crate::errors::ConnectError;
use crate::http::client::HttpClient;
use crate::models::user::User;

impl HttpClient {
    /// Get the user owning the API key
    pub async fn current_user(&self) -> Result<User, ConnectError> {
        self.get(&["user"]).await
    }
}
