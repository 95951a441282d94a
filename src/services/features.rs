use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::contracts::{Feature, FeatureFilter, Page, Store};
use crate::errors::ApiError;
use crate::types::TransitionPolicy;
use crate::validation::feature::{FeaturePatch, NewFeature};
use crate::validation::ListOptions;

#[derive(Clone)]
pub struct FeatureService {
    store: Arc<dyn Store>,
    transitions: Arc<dyn TransitionPolicy>,
}

impl FeatureService {
    pub fn new(store: Arc<dyn Store>, transitions: Arc<dyn TransitionPolicy>) -> Self {
        Self { store, transitions }
    }

    pub async fn create(&self, input: NewFeature) -> Result<Feature, ApiError> {
        if self.store.get_project(input.project_id).await?.is_none() {
            return Err(ApiError::not_found(
                "project",
                input.project_id.to_string(),
            ));
        }

        if self
            .store
            .find_feature_by_code(input.project_id, input.code.as_str())
            .await?
            .is_some()
        {
            return Err(ApiError::conflict(
                "feature",
                "featureId",
                input.code.into_inner(),
            ));
        }

        let now = Utc::now();
        let feature = Feature {
            id: Uuid::new_v4(),
            project_id: input.project_id,
            feature_code: input.code.into_inner(),
            title: input.title.into_inner(),
            version: input.version.into_inner(),
            status: input.status,
            area: input.area,
            created_at: now,
            updated_at: now,
        };

        let feature = self.store.insert_feature(feature).await?;
        info!(feature_id = %feature.id, code = %feature.feature_code, "feature created");
        Ok(feature)
    }

    pub async fn get(&self, id: Uuid) -> Result<Feature, ApiError> {
        self.store
            .get_feature(id)
            .await?
            .ok_or_else(|| ApiError::not_found("feature", id.to_string()))
    }

    pub async fn list(
        &self,
        options: ListOptions<FeatureFilter>,
    ) -> Result<Page<Feature>, ApiError> {
        self.store
            .list_features(&options.filter, &options.sort, &options.page)
            .await
    }

    pub async fn update(&self, id: Uuid, patch: FeaturePatch) -> Result<Feature, ApiError> {
        let mut feature = self.get(id).await?;

        if let Some(code) = &patch.code {
            if code.as_str() != feature.feature_code {
                if let Some(existing) = self
                    .store
                    .find_feature_by_code(feature.project_id, code.as_str())
                    .await?
                {
                    if existing.id != id {
                        return Err(ApiError::conflict(
                            "feature",
                            "featureId",
                            code.as_str().to_string(),
                        ));
                    }
                }
            }
        }

        if let Some(status) = patch.status {
            if !self
                .transitions
                .allows(feature.status.as_str(), status.as_str())
            {
                return Err(ApiError::domain(format!(
                    "status transition {} -> {} is not allowed",
                    feature.status, status
                )));
            }
            feature.status = status;
        }

        if let Some(code) = patch.code {
            feature.feature_code = code.into_inner();
        }
        if let Some(title) = patch.title {
            feature.title = title.into_inner();
        }
        if let Some(version) = patch.version {
            feature.version = version.into_inner();
        }
        if let Some(area) = patch.area {
            feature.area = area;
        }
        feature.updated_at = Utc::now();

        self.store.update_feature(feature).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        if !self.store.delete_feature(id).await? {
            return Err(ApiError::not_found("feature", id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::Project;
    use crate::memory_store::create_memory_store;
    use crate::requests::{CreateFeatureRequest, FeatureListQuery, UpdateFeatureRequest};
    use crate::types::{AllowAllTransitions, FeatureStatus};
    use crate::validation;

    async fn setup() -> (FeatureService, Project) {
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
            FeatureService::new(store, Arc::new(AllowAllTransitions)),
            project,
        )
    }

    fn create_request(project_id: Uuid, code: &str, area: Option<&str>) -> CreateFeatureRequest {
        CreateFeatureRequest {
            project_id: Some(project_id.to_string()),
            feature_code: Some(code.to_string()),
            title: Some(format!("Feature {code}")),
            area: area.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_code_is_conflict() {
        let (svc, project) = setup().await;
        let first =
            validation::feature::create(&create_request(project.id, "FEAT-001", None)).unwrap();
        svc.create(first).await.unwrap();

        let dup =
            validation::feature::create(&create_request(project.id, "FEAT-001", None)).unwrap();
        let err = svc.create(dup).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict { field: "featureId", .. }));
    }

    #[tokio::test]
    async fn test_status_update_allowed_by_default_policy() {
        let (svc, project) = setup().await;
        let feature = svc
            .create(
                validation::feature::create(&create_request(project.id, "FEAT-002", None)).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(feature.status, FeatureStatus::Planned);

        let patch = validation::feature::update(&UpdateFeatureRequest {
            status: Some("completed".to_string()),
            ..Default::default()
        })
        .unwrap();
        let updated = svc.update(feature.id, patch).await.unwrap();
        assert_eq!(updated.status, FeatureStatus::Completed);

        // Terminal-to-initial is accepted as-is until a policy forbids it.
        let back = validation::feature::update(&UpdateFeatureRequest {
            status: Some("planned".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(svc.update(feature.id, back).await.is_ok());
    }

    struct NoResurrection;

    impl TransitionPolicy for NoResurrection {
        fn allows(&self, from: &str, to: &str) -> bool {
            !(from == "completed" && to == "planned")
        }
    }

    #[tokio::test]
    async fn test_custom_policy_turns_transition_into_domain_failure() {
        let store = create_memory_store();
        let now = Utc::now();
        let project = store
            .insert_project(Project {
                id: Uuid::new_v4(),
                name: "Guarded".to_string(),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        let svc = FeatureService::new(store, Arc::new(NoResurrection));

        let feature = svc
            .create(
                validation::feature::create(&create_request(project.id, "FEAT-003", None)).unwrap(),
            )
            .await
            .unwrap();

        let to_completed = validation::feature::update(&UpdateFeatureRequest {
            status: Some("completed".to_string()),
            ..Default::default()
        })
        .unwrap();
        svc.update(feature.id, to_completed).await.unwrap();

        let resurrect = validation::feature::update(&UpdateFeatureRequest {
            status: Some("planned".to_string()),
            ..Default::default()
        })
        .unwrap();
        let err = svc.update(feature.id, resurrect).await.unwrap_err();
        assert!(matches!(err, ApiError::DomainValidation { .. }));
    }

    #[tokio::test]
    async fn test_area_filter_is_case_insensitive_substring() {
        let (svc, project) = setup().await;
        for (code, area) in [
            ("FEAT-001", "Backend API"),
            ("FEAT-002", "frontend"),
            ("FEAT-003", "backend storage"),
        ] {
            svc.create(
                validation::feature::create(&create_request(project.id, code, Some(area)))
                    .unwrap(),
            )
            .await
            .unwrap();
        }

        let options = validation::feature::list(&FeatureListQuery {
            area: Some("BACKEND".to_string()),
            ..Default::default()
        })
        .unwrap();
        let page = svc.list(options).await.unwrap();
        assert_eq!(page.total, 2);
    }
}
