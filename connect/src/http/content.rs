//! Content API client

use openapi_client::models::ContentListQuery;

use crate::errors::ConnectError;
use crate::http::client::HttpClient;
use crate::models::content::{Content, ContentUpdate, NewContent};

impl HttpClient {
    /// List content visible to the caller
    pub async fn list_content(&self, query: &ContentListQuery) -> Result<Vec<Content>, ConnectError> {
        self.get_with_query(&["content"], &query.pairs()).await
    }

    /// Create a content item
    pub async fn create_content(&self, content: &NewContent) -> Result<Content, ConnectError> {
        self.post(&["content"], content).await
    }

    /// Get a content item by guid
    pub async fn get_content(&self, guid: &str) -> Result<Content, ConnectError> {
        self.get(&["content", guid]).await
    }

    /// Patch the editable fields of a content item
    pub async fn update_content(
        &self,
        guid: &str,
        update: &ContentUpdate,
    ) -> Result<Content, ConnectError> {
        self.patch(&["content", guid], update).await
    }

    /// Delete a content item
    pub async fn delete_content(&self, guid: &str) -> Result<(), ConnectError> {
        self.delete(&["content", guid]).await
    }
}
