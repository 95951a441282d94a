use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::contracts::{Page, Sprint, SprintFilter, SprintItem, SprintWithItems, Store};
use crate::errors::ApiError;
use crate::types::TransitionPolicy;
use crate::validation::sprint::{self, NewSprint, NewSprintItem, SprintPatch};
use crate::validation::ListOptions;

#[derive(Clone)]
pub struct SprintService {
    store: Arc<dyn Store>,
    transitions: Arc<dyn TransitionPolicy>,
}

impl SprintService {
    pub fn new(store: Arc<dyn Store>, transitions: Arc<dyn TransitionPolicy>) -> Self {
        Self { store, transitions }
    }

    fn materialize_items(
        sprint_id: Uuid,
        items: Vec<NewSprintItem>,
        now: DateTime<Utc>,
    ) -> Vec<SprintItem> {
        items
            .into_iter()
            .map(|item| SprintItem {
                id: Uuid::new_v4(),
                sprint_id,
                text: item.text,
                checked: item.checked,
                position: item.position,
                created_at: now,
                updated_at: now,
            })
            .collect()
    }

    pub async fn create(&self, input: NewSprint) -> Result<SprintWithItems, ApiError> {
        if self.store.get_project(input.project_id).await?.is_none() {
            return Err(ApiError::not_found(
                "project",
                input.project_id.to_string(),
            ));
        }

        if self
            .store
            .find_sprint_by_code(input.project_id, input.code.as_str())
            .await?
            .is_some()
        {
            return Err(ApiError::conflict(
                "sprint",
                "sprintId",
                input.code.into_inner(),
            ));
        }

        // Both dates passed schema checks individually; ordering is the
        // domain rule and reports as a 422-class failure.
        sprint::check_date_range(input.start_date, input.end_date)?;

        let now = Utc::now();
        let sprint_id = Uuid::new_v4();
        let row = Sprint {
            id: sprint_id,
            project_id: input.project_id,
            sprint_code: input.code.into_inner(),
            name: input.name.into_inner(),
            status: input.status,
            start_date: input.start_date,
            end_date: input.end_date,
            created_at: now,
            updated_at: now,
        };
        let items = Self::materialize_items(sprint_id, input.items, now);

        let created = self.store.insert_sprint(row, items).await?;
        info!(
            sprint_id = %created.sprint.id,
            code = %created.sprint.sprint_code,
            items = created.items.len(),
            "sprint created"
        );
        Ok(created)
    }

    pub async fn get(&self, id: Uuid) -> Result<SprintWithItems, ApiError> {
        let sprint = self
            .store
            .get_sprint(id)
            .await?
            .ok_or_else(|| ApiError::not_found("sprint", id.to_string()))?;
        let items = self.store.get_sprint_items(id).await?;
        Ok(SprintWithItems { sprint, items })
    }

    pub async fn list(&self, options: ListOptions<SprintFilter>) -> Result<Page<Sprint>, ApiError> {
        self.store
            .list_sprints(&options.filter, &options.sort, &options.page)
            .await
    }

    /// Update algorithm: load, re-check a changed code against its project
    /// scope, recompute the date invariant from the merged old and new
    /// values, then write the row plus any replacement item set atomically.
    pub async fn update(&self, id: Uuid, patch: SprintPatch) -> Result<SprintWithItems, ApiError> {
        let mut sprint = self
            .store
            .get_sprint(id)
            .await?
            .ok_or_else(|| ApiError::not_found("sprint", id.to_string()))?;

        if let Some(code) = &patch.code {
            if code.as_str() != sprint.sprint_code {
                if let Some(existing) = self
                    .store
                    .find_sprint_by_code(sprint.project_id, code.as_str())
                    .await?
                {
                    if existing.id != id {
                        return Err(ApiError::conflict(
                            "sprint",
                            "sprintId",
                            code.as_str().to_string(),
                        ));
                    }
                }
            }
        }

        let merged_start = patch.start_date.or(sprint.start_date);
        let merged_end = patch.end_date.or(sprint.end_date);
        sprint::check_date_range(merged_start, merged_end)?;

        if let Some(status) = patch.status {
            if !self
                .transitions
                .allows(sprint.status.as_str(), status.as_str())
            {
                return Err(ApiError::domain(format!(
                    "status transition {} -> {} is not allowed",
                    sprint.status, status
                )));
            }
            sprint.status = status;
        }

        if let Some(code) = patch.code {
            sprint.sprint_code = code.into_inner();
        }
        if let Some(name) = patch.name {
            sprint.name = name.into_inner();
        }
        sprint.start_date = merged_start;
        sprint.end_date = merged_end;
        let now = Utc::now();
        sprint.updated_at = now;

        let replacement = patch
            .items
            .map(|items| Self::materialize_items(id, items, now));

        self.store.update_sprint(sprint, replacement).await
    }

    /// Nested bulk mutation: replace the entire item set, atomically with a
    /// timestamp bump on the sprint row.
    pub async fn replace_items(
        &self,
        id: Uuid,
        items: Vec<NewSprintItem>,
    ) -> Result<SprintWithItems, ApiError> {
        let mut sprint = self
            .store
            .get_sprint(id)
            .await?
            .ok_or_else(|| ApiError::not_found("sprint", id.to_string()))?;

        let now = Utc::now();
        sprint.updated_at = now;
        let replacement = Self::materialize_items(id, items, now);

        self.store.update_sprint(sprint, Some(replacement)).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        if !self.store.delete_sprint(id).await? {
            return Err(ApiError::not_found("sprint", id.to_string()));
        }
        info!(sprint_id = %id, "sprint deleted with its items");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::Project;
    use crate::memory_store::create_memory_store;
    use crate::requests::{CreateSprintRequest, SprintItemInput, UpdateSprintRequest};
    use crate::types::{AllowAllTransitions, SprintStatus};
    use crate::validation;

    async fn setup() -> (SprintService, Project) {
        let store = create_memory_store();
        let now = Utc::now();
        let project = store
            .insert_project(Project {
                id: Uuid::new_v4(),
                name: "Test Project".to_string(),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        (
            SprintService::new(store, Arc::new(AllowAllTransitions)),
            project,
        )
    }

    fn item(text: &str) -> SprintItemInput {
        SprintItemInput {
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    fn create_request(project_id: Uuid, code: &str) -> CreateSprintRequest {
        CreateSprintRequest {
            project_id: Some(project_id.to_string()),
            sprint_code: Some(code.to_string()),
            name: Some(format!("Sprint {code}")),
            items: Some(vec![item("first"), item("second")]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_with_items() {
        let (svc, project) = setup().await;
        let input = validation::sprint::create(&create_request(project.id, "SPR-001")).unwrap();

        let created = svc.create(input).await.unwrap();
        assert_eq!(created.sprint.status, SprintStatus::Planned);
        assert_eq!(created.items.len(), 2);
        assert_eq!(created.items[0].position, 0);
        assert_eq!(created.items[1].position, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_inverted_dates() {
        let (svc, project) = setup().await;
        let mut request = create_request(project.id, "SPR-002");
        request.start_date = Some("2026-03-01T00:00:00Z".to_string());
        request.end_date = Some("2026-02-01T00:00:00Z".to_string());

        let input = validation::sprint::create(&request).unwrap();
        let err = svc.create(input).await.unwrap_err();
        assert!(matches!(err, ApiError::DomainValidation { .. }));
    }

    #[tokio::test]
    async fn test_update_merges_dates_with_existing_values() {
        let (svc, project) = setup().await;
        let mut request = create_request(project.id, "SPR-003");
        request.start_date = Some("2026-02-01T00:00:00Z".to_string());
        let created = svc
            .create(validation::sprint::create(&request).unwrap())
            .await
            .unwrap();

        // The new end date lands before the existing start date: the merged
        // pair violates the invariant even though the patch parses cleanly.
        let patch = validation::sprint::update(&UpdateSprintRequest {
            end_date: Some("2026-01-15T00:00:00Z".to_string()),
            ..Default::default()
        })
        .unwrap();
        let err = svc.update(created.sprint.id, patch).await.unwrap_err();
        assert!(matches!(err, ApiError::DomainValidation { .. }));

        let patch = validation::sprint::update(&UpdateSprintRequest {
            end_date: Some("2026-02-15T00:00:00Z".to_string()),
            ..Default::default()
        })
        .unwrap();
        let updated = svc.update(created.sprint.id, patch).await.unwrap();
        assert!(updated.sprint.end_date.is_some());
    }

    #[tokio::test]
    async fn test_update_with_items_replaces_the_set() {
        let (svc, project) = setup().await;
        let created = svc
            .create(validation::sprint::create(&create_request(project.id, "SPR-004")).unwrap())
            .await
            .unwrap();

        let patch = validation::sprint::update(&UpdateSprintRequest {
            name: Some("Renamed".to_string()),
            items: Some(vec![item("only")]),
            ..Default::default()
        })
        .unwrap();
        let updated = svc.update(created.sprint.id, patch).await.unwrap();

        assert_eq!(updated.sprint.name, "Renamed");
        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.items[0].text, "only");

        let fetched = svc.get(created.sprint.id).await.unwrap();
        assert_eq!(fetched.items.len(), 1);
    }

    #[tokio::test]
    async fn test_replace_items_endpoint_path() {
        let (svc, project) = setup().await;
        let created = svc
            .create(validation::sprint::create(&create_request(project.id, "SPR-005")).unwrap())
            .await
            .unwrap();

        let items = validation::sprint::replace_items(&crate::requests::ReplaceSprintItemsRequest {
            items: Some(vec![item("a"), item("b"), item("c")]),
        })
        .unwrap();
        let replaced = svc.replace_items(created.sprint.id, items).await.unwrap();
        assert_eq!(replaced.items.len(), 3);
        assert!(replaced.sprint.updated_at >= created.sprint.updated_at);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_items() {
        let (svc, project) = setup().await;
        let created = svc
            .create(validation::sprint::create(&create_request(project.id, "SPR-006")).unwrap())
            .await
            .unwrap();

        svc.delete(created.sprint.id).await.unwrap();
        assert!(matches!(
            svc.get(created.sprint.id).await.unwrap_err(),
            ApiError::NotFound { .. }
        ));
    }
}
