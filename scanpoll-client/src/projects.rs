//! Project API endpoints

use crate::ScanCodeClient;
use crate::error::{ClientError, Result};
use scanpoll_core::domain::project::ProjectSnapshot;
use tracing::debug;

impl ScanCodeClient {
    // =============================================================================
    // Projects
    // =============================================================================

    /// URL of a project's detail resource
    pub fn project_url(&self, project_uuid: &str) -> String {
        format!("{}/api/projects/{}/", self.base_url, project_uuid)
    }

    /// Fetch a project with its runs
    ///
    /// # Arguments
    /// * `project_uuid` - The project UUID
    ///
    /// # Returns
    /// The full project snapshot as returned by the service
    pub async fn get_project(&self, project_uuid: &str) -> Result<ProjectSnapshot> {
        let url = self.project_url(project_uuid);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;

        let body = self.handle_response(response).await?;
        ProjectSnapshot::from_value(body).map_err(|e| ClientError::ParseError(e.to_string()))
    }
}
