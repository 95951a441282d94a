// In-Memory Store
// A Store implementation backed by process memory, used by the test suite and
// by deployments that run with `memory:` as the store URL. All writes happen
// under one write lock, so multi-step sprint writes are atomic by
// construction and unique-key races resolve to exactly one winner.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::contracts::{
    Document, DocumentFilter, Feature, FeatureFilter, Page, PageSpec, Project, SortSpec, Sprint,
    SprintFilter, SprintItem, SprintWithItems, Store,
};
use crate::errors::ApiError;
use crate::types::SortOrder;

#[derive(Default)]
struct MemoryInner {
    projects: HashMap<Uuid, Project>,
    documents: HashMap<Uuid, Document>,
    features: HashMap<Uuid, Feature>,
    sprints: HashMap<Uuid, Sprint>,
    items: HashMap<Uuid, SprintItem>,
}

pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryInner::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Factory used by the server binary and the tests.
pub fn create_memory_store() -> Arc<dyn Store> {
    Arc::new(MemoryStore::new())
}

fn apply_order(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

fn paginate<T>(mut items: Vec<T>, page: &PageSpec) -> Page<T> {
    let total = items.len() as u64;
    let start = (page.offset as usize).min(items.len());
    let end = (start + page.limit as usize).min(items.len());
    let items = items.drain(start..end).collect();

    Page {
        items,
        total,
        limit: page.limit,
        offset: page.offset,
    }
}

fn sorted_items(inner: &MemoryInner, sprint_id: Uuid) -> Vec<SprintItem> {
    let mut items: Vec<SprintItem> = inner
        .items
        .values()
        .filter(|item| item.sprint_id == sprint_id)
        .cloned()
        .collect();
    items.sort_by(|a, b| a.position.cmp(&b.position).then(a.id.cmp(&b.id)));
    items
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), ApiError> {
        Ok(())
    }

    // Projects

    async fn insert_project(&self, project: Project) -> Result<Project, ApiError> {
        let mut inner = self.inner.write().await;
        inner.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>, ApiError> {
        Ok(self.inner.read().await.projects.get(&id).cloned())
    }

    async fn list_projects(
        &self,
        sort: &SortSpec,
        page: &PageSpec,
    ) -> Result<Page<Project>, ApiError> {
        let inner = self.inner.read().await;
        let mut projects: Vec<Project> = inner.projects.values().cloned().collect();

        projects.sort_by(|a, b| {
            let ordering = match sort.field.as_str() {
                "name" => a.name.cmp(&b.name),
                "updatedAt" => a.updated_at.cmp(&b.updated_at),
                _ => a.created_at.cmp(&b.created_at),
            };
            apply_order(ordering.then(a.id.cmp(&b.id)), sort.order)
        });

        Ok(paginate(projects, page))
    }

    async fn update_project(&self, project: Project) -> Result<Project, ApiError> {
        let mut inner = self.inner.write().await;
        if !inner.projects.contains_key(&project.id) {
            return Err(ApiError::not_found("project", project.id.to_string()));
        }
        inner.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool, ApiError> {
        let mut inner = self.inner.write().await;
        if inner.projects.remove(&id).is_none() {
            return Ok(false);
        }

        inner.documents.retain(|_, doc| doc.project_id != id);
        inner.features.retain(|_, feature| feature.project_id != id);

        let sprint_ids: Vec<Uuid> = inner
            .sprints
            .values()
            .filter(|sprint| sprint.project_id == id)
            .map(|sprint| sprint.id)
            .collect();
        inner.sprints.retain(|_, sprint| sprint.project_id != id);
        inner
            .items
            .retain(|_, item| !sprint_ids.contains(&item.sprint_id));

        Ok(true)
    }

    // Documents

    async fn insert_document(&self, document: Document) -> Result<Document, ApiError> {
        let mut inner = self.inner.write().await;

        // Race guard: the service checked uniqueness already, but a
        // concurrent writer may have landed between its check and this write.
        let taken = inner
            .documents
            .values()
            .any(|d| d.project_id == document.project_id && d.slug == document.slug);
        if taken {
            return Err(ApiError::conflict("document", "slug", document.slug));
        }

        inner.documents.insert(document.id, document.clone());
        Ok(document)
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, ApiError> {
        Ok(self.inner.read().await.documents.get(&id).cloned())
    }

    async fn find_document_by_slug(
        &self,
        project_id: Uuid,
        slug: &str,
    ) -> Result<Option<Document>, ApiError> {
        let inner = self.inner.read().await;
        Ok(inner
            .documents
            .values()
            .find(|d| d.project_id == project_id && d.slug == slug)
            .cloned())
    }

    async fn list_documents(
        &self,
        filter: &DocumentFilter,
        sort: &SortSpec,
        page: &PageSpec,
    ) -> Result<Page<Document>, ApiError> {
        let inner = self.inner.read().await;
        let mut documents: Vec<Document> = inner
            .documents
            .values()
            .filter(|d| filter.project_id.map_or(true, |p| d.project_id == p))
            .filter(|d| filter.kind.map_or(true, |k| d.kind == k))
            .cloned()
            .collect();

        documents.sort_by(|a, b| {
            let ordering = match sort.field.as_str() {
                "title" => a.title.cmp(&b.title),
                "kind" => a.kind.as_str().cmp(b.kind.as_str()),
                "slug" => a.slug.cmp(&b.slug),
                "updatedAt" => a.updated_at.cmp(&b.updated_at),
                _ => a.created_at.cmp(&b.created_at),
            };
            apply_order(ordering.then(a.id.cmp(&b.id)), sort.order)
        });

        Ok(paginate(documents, page))
    }

    async fn update_document(&self, document: Document) -> Result<Document, ApiError> {
        let mut inner = self.inner.write().await;
        if !inner.documents.contains_key(&document.id) {
            return Err(ApiError::not_found("document", document.id.to_string()));
        }

        let taken = inner.documents.values().any(|d| {
            d.id != document.id && d.project_id == document.project_id && d.slug == document.slug
        });
        if taken {
            return Err(ApiError::conflict("document", "slug", document.slug));
        }

        inner.documents.insert(document.id, document.clone());
        Ok(document)
    }

    async fn delete_document(&self, id: Uuid) -> Result<bool, ApiError> {
        Ok(self.inner.write().await.documents.remove(&id).is_some())
    }

    // Features

    async fn insert_feature(&self, feature: Feature) -> Result<Feature, ApiError> {
        let mut inner = self.inner.write().await;

        let taken = inner
            .features
            .values()
            .any(|f| f.project_id == feature.project_id && f.feature_code == feature.feature_code);
        if taken {
            return Err(ApiError::conflict(
                "feature",
                "featureId",
                feature.feature_code,
            ));
        }

        inner.features.insert(feature.id, feature.clone());
        Ok(feature)
    }

    async fn get_feature(&self, id: Uuid) -> Result<Option<Feature>, ApiError> {
        Ok(self.inner.read().await.features.get(&id).cloned())
    }

    async fn find_feature_by_code(
        &self,
        project_id: Uuid,
        code: &str,
    ) -> Result<Option<Feature>, ApiError> {
        let inner = self.inner.read().await;
        Ok(inner
            .features
            .values()
            .find(|f| f.project_id == project_id && f.feature_code == code)
            .cloned())
    }

    async fn list_features(
        &self,
        filter: &FeatureFilter,
        sort: &SortSpec,
        page: &PageSpec,
    ) -> Result<Page<Feature>, ApiError> {
        let inner = self.inner.read().await;
        let area_needle = filter.area.as_deref().map(str::to_lowercase);

        let mut features: Vec<Feature> = inner
            .features
            .values()
            .filter(|f| filter.project_id.map_or(true, |p| f.project_id == p))
            .filter(|f| filter.status.map_or(true, |s| f.status == s))
            .filter(|f| {
                area_needle
                    .as_deref()
                    .map_or(true, |needle| f.area.to_lowercase().contains(needle))
            })
            .cloned()
            .collect();

        features.sort_by(|a, b| {
            let ordering = match sort.field.as_str() {
                "title" => a.title.cmp(&b.title),
                "featureId" => a.feature_code.cmp(&b.feature_code),
                "status" => a.status.as_str().cmp(b.status.as_str()),
                "area" => a.area.cmp(&b.area),
                "updatedAt" => a.updated_at.cmp(&b.updated_at),
                _ => a.created_at.cmp(&b.created_at),
            };
            apply_order(ordering.then(a.id.cmp(&b.id)), sort.order)
        });

        Ok(paginate(features, page))
    }

    async fn update_feature(&self, feature: Feature) -> Result<Feature, ApiError> {
        let mut inner = self.inner.write().await;
        if !inner.features.contains_key(&feature.id) {
            return Err(ApiError::not_found("feature", feature.id.to_string()));
        }

        let taken = inner.features.values().any(|f| {
            f.id != feature.id
                && f.project_id == feature.project_id
                && f.feature_code == feature.feature_code
        });
        if taken {
            return Err(ApiError::conflict(
                "feature",
                "featureId",
                feature.feature_code,
            ));
        }

        inner.features.insert(feature.id, feature.clone());
        Ok(feature)
    }

    async fn delete_feature(&self, id: Uuid) -> Result<bool, ApiError> {
        Ok(self.inner.write().await.features.remove(&id).is_some())
    }

    // Sprints

    async fn insert_sprint(
        &self,
        sprint: Sprint,
        items: Vec<SprintItem>,
    ) -> Result<SprintWithItems, ApiError> {
        let mut inner = self.inner.write().await;

        let taken = inner
            .sprints
            .values()
            .any(|s| s.project_id == sprint.project_id && s.sprint_code == sprint.sprint_code);
        if taken {
            return Err(ApiError::conflict("sprint", "sprintId", sprint.sprint_code));
        }

        // Sprint row plus items land under the same write lock: either the
        // whole set becomes visible or nothing does.
        inner.sprints.insert(sprint.id, sprint.clone());
        for item in &items {
            inner.items.insert(item.id, item.clone());
        }

        let items = sorted_items(&inner, sprint.id);
        Ok(SprintWithItems { sprint, items })
    }

    async fn get_sprint(&self, id: Uuid) -> Result<Option<Sprint>, ApiError> {
        Ok(self.inner.read().await.sprints.get(&id).cloned())
    }

    async fn get_sprint_items(&self, sprint_id: Uuid) -> Result<Vec<SprintItem>, ApiError> {
        let inner = self.inner.read().await;
        Ok(sorted_items(&inner, sprint_id))
    }

    async fn find_sprint_by_code(
        &self,
        project_id: Uuid,
        code: &str,
    ) -> Result<Option<Sprint>, ApiError> {
        let inner = self.inner.read().await;
        Ok(inner
            .sprints
            .values()
            .find(|s| s.project_id == project_id && s.sprint_code == code)
            .cloned())
    }

    async fn list_sprints(
        &self,
        filter: &SprintFilter,
        sort: &SortSpec,
        page: &PageSpec,
    ) -> Result<Page<Sprint>, ApiError> {
        let inner = self.inner.read().await;
        let mut sprints: Vec<Sprint> = inner
            .sprints
            .values()
            .filter(|s| filter.project_id.map_or(true, |p| s.project_id == p))
            .filter(|s| filter.status.map_or(true, |st| s.status == st))
            .cloned()
            .collect();

        sprints.sort_by(|a, b| {
            let ordering = match sort.field.as_str() {
                "name" => a.name.cmp(&b.name),
                "sprintId" => a.sprint_code.cmp(&b.sprint_code),
                "status" => a.status.as_str().cmp(b.status.as_str()),
                "startDate" => a.start_date.cmp(&b.start_date),
                "endDate" => a.end_date.cmp(&b.end_date),
                "updatedAt" => a.updated_at.cmp(&b.updated_at),
                _ => a.created_at.cmp(&b.created_at),
            };
            apply_order(ordering.then(a.id.cmp(&b.id)), sort.order)
        });

        Ok(paginate(sprints, page))
    }

    async fn update_sprint(
        &self,
        sprint: Sprint,
        replacement_items: Option<Vec<SprintItem>>,
    ) -> Result<SprintWithItems, ApiError> {
        let mut inner = self.inner.write().await;
        if !inner.sprints.contains_key(&sprint.id) {
            return Err(ApiError::not_found("sprint", sprint.id.to_string()));
        }

        let taken = inner.sprints.values().any(|s| {
            s.id != sprint.id
                && s.project_id == sprint.project_id
                && s.sprint_code == sprint.sprint_code
        });
        if taken {
            return Err(ApiError::conflict("sprint", "sprintId", sprint.sprint_code));
        }

        inner.sprints.insert(sprint.id, sprint.clone());

        if let Some(items) = replacement_items {
            // Delete-all then reinsert, still inside the single write lock.
            inner.items.retain(|_, item| item.sprint_id != sprint.id);
            for item in items {
                inner.items.insert(item.id, item);
            }
        }

        let items = sorted_items(&inner, sprint.id);
        Ok(SprintWithItems { sprint, items })
    }

    async fn delete_sprint(&self, id: Uuid) -> Result<bool, ApiError> {
        let mut inner = self.inner.write().await;
        if inner.sprints.remove(&id).is_none() {
            return Ok(false);
        }
        inner.items.retain(|_, item| item.sprint_id != id);
        Ok(true)
    }
}
