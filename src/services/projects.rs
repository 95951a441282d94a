use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::contracts::{Page, Project, Store};
use crate::errors::ApiError;
use crate::validation::project::{NewProject, ProjectPatch};
use crate::validation::ListOptions;

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn Store>,
}

impl ProjectService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: NewProject) -> Result<Project, ApiError> {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: input.name.into_inner(),
            created_at: now,
            updated_at: now,
        };

        let project = self.store.insert_project(project).await?;
        info!(project_id = %project.id, "project created");
        Ok(project)
    }

    pub async fn get(&self, id: Uuid) -> Result<Project, ApiError> {
        self.store
            .get_project(id)
            .await?
            .ok_or_else(|| ApiError::not_found("project", id.to_string()))
    }

    pub async fn list(&self, options: ListOptions<()>) -> Result<Page<Project>, ApiError> {
        self.store.list_projects(&options.sort, &options.page).await
    }

    pub async fn update(&self, id: Uuid, patch: ProjectPatch) -> Result<Project, ApiError> {
        let mut project = self.get(id).await?;

        if let Some(name) = patch.name {
            project.name = name.into_inner();
        }
        project.updated_at = Utc::now();

        self.store.update_project(project).await
    }

    /// Hard delete; the store cascades to every owned child entity.
    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        if !self.store.delete_project(id).await? {
            return Err(ApiError::not_found("project", id.to_string()));
        }
        info!(project_id = %id, "project deleted with all owned entities");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::create_memory_store;
    use crate::requests::{CreateProjectRequest, UpdateProjectRequest};
    use crate::validation;

    fn service() -> ProjectService {
        ProjectService::new(create_memory_store())
    }

    fn new_project(name: &str) -> NewProject {
        validation::project::create(&CreateProjectRequest {
            name: Some(name.to_string()),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let svc = service();
        let created = svc.create(new_project("Test Project")).await.unwrap();
        assert_eq!(created.name, "Test Project");

        let fetched = svc.get(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let svc = service();
        let err = svc.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_bumps_updated_at() {
        let svc = service();
        let created = svc.create(new_project("Before")).await.unwrap();

        let patch = validation::project::update(&UpdateProjectRequest {
            name: Some("After".to_string()),
        })
        .unwrap();
        let updated = svc.update(created.id, patch).await.unwrap();

        assert_eq!(updated.name, "After");
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let svc = service();
        let created = svc.create(new_project("Doomed")).await.unwrap();

        svc.delete(created.id).await.unwrap();
        assert!(matches!(
            svc.get(created.id).await.unwrap_err(),
            ApiError::NotFound { .. }
        ));
        assert!(matches!(
            svc.delete(created.id).await.unwrap_err(),
            ApiError::NotFound { .. }
        ));
    }
}
