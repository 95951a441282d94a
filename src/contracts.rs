// Contract-First Design
// Entity records, list filters, and the Store trait every persistence backend
// implements. Services depend on this interface only; the backing store is
// constructed at process start and injected, never reached through a global.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::types::{DocumentKind, FeatureStatus, SortOrder, SprintStatus};

/// Root of all scoping. Owns documents, features, and sprints exclusively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub project_id: Uuid,
    pub kind: DocumentKind,
    pub title: String,
    /// Unique within the owning project, never globally.
    pub slug: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: Uuid,
    pub project_id: Uuid,
    /// Natural key in `FEAT-<digits>` form, unique within the project.
    #[serde(rename = "featureId")]
    pub feature_code: String,
    pub title: String,
    pub version: String,
    pub status: FeatureStatus,
    pub area: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    pub id: Uuid,
    pub project_id: Uuid,
    /// Natural key in `SPR-<digits>` form, unique within the project.
    #[serde(rename = "sprintId")]
    pub sprint_code: String,
    pub name: String,
    pub status: SprintStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wholly owned by its sprint: bulk updates replace the entire set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintItem {
    pub id: Uuid,
    pub sprint_id: Uuid,
    pub text: String,
    pub checked: bool,
    /// Stable display order within the sprint.
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A sprint plus its items, the shape returned by sprint reads and writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintWithItems {
    #[serde(flatten)]
    pub sprint: Sprint,
    pub items: Vec<SprintItem>,
}

/// One page of a listing. `total` is always the full count matching the
/// filter, independent of the pagination window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub limit: u32,
    pub offset: u64,
}

/// Caller-chosen ordering. `field` has already been checked against the
/// entity's sortable-field whitelist by the validation layer.
#[derive(Debug, Clone)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: "createdAt".to_string(),
            order: SortOrder::Desc,
        }
    }
}

/// Offset/limit window, already validated against the [1,100] limit contract.
#[derive(Debug, Clone, Copy)]
pub struct PageSpec {
    pub limit: u32,
    pub offset: u64,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            limit: crate::types::ValidatedLimit::DEFAULT,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub project_id: Option<Uuid>,
    pub kind: Option<DocumentKind>,
}

#[derive(Debug, Clone, Default)]
pub struct FeatureFilter {
    pub project_id: Option<Uuid>,
    pub status: Option<FeatureStatus>,
    /// Case-insensitive substring match.
    pub area: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SprintFilter {
    pub project_id: Option<Uuid>,
    pub status: Option<SprintStatus>,
}

/// Persistence interface for all five entities.
///
/// Uniqueness and referential checks run in the services before any write,
/// but implementations must still surface `Conflict` when two writers race on
/// the same natural key: exactly one wins, the loser gets the error.
#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap reachability probe used by the readiness endpoints.
    async fn ping(&self) -> Result<(), ApiError>;

    // Projects

    async fn insert_project(&self, project: Project) -> Result<Project, ApiError>;
    async fn get_project(&self, id: Uuid) -> Result<Option<Project>, ApiError>;
    async fn list_projects(
        &self,
        sort: &SortSpec,
        page: &PageSpec,
    ) -> Result<Page<Project>, ApiError>;
    async fn update_project(&self, project: Project) -> Result<Project, ApiError>;

    /// Hard delete. Cascades to every owned document, feature, sprint, and
    /// sprint item. Returns false when the id did not resolve.
    async fn delete_project(&self, id: Uuid) -> Result<bool, ApiError>;

    // Documents

    async fn insert_document(&self, document: Document) -> Result<Document, ApiError>;
    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, ApiError>;
    async fn find_document_by_slug(
        &self,
        project_id: Uuid,
        slug: &str,
    ) -> Result<Option<Document>, ApiError>;
    async fn list_documents(
        &self,
        filter: &DocumentFilter,
        sort: &SortSpec,
        page: &PageSpec,
    ) -> Result<Page<Document>, ApiError>;
    async fn update_document(&self, document: Document) -> Result<Document, ApiError>;
    async fn delete_document(&self, id: Uuid) -> Result<bool, ApiError>;

    // Features

    async fn insert_feature(&self, feature: Feature) -> Result<Feature, ApiError>;
    async fn get_feature(&self, id: Uuid) -> Result<Option<Feature>, ApiError>;
    async fn find_feature_by_code(
        &self,
        project_id: Uuid,
        code: &str,
    ) -> Result<Option<Feature>, ApiError>;
    async fn list_features(
        &self,
        filter: &FeatureFilter,
        sort: &SortSpec,
        page: &PageSpec,
    ) -> Result<Page<Feature>, ApiError>;
    async fn update_feature(&self, feature: Feature) -> Result<Feature, ApiError>;
    async fn delete_feature(&self, id: Uuid) -> Result<bool, ApiError>;

    // Sprints

    /// Insert the sprint row and all of its items atomically.
    ///
    /// # Postconditions
    /// - Either the sprint and every item are committed, or nothing is;
    ///   a failed item insert rolls back the sprint row as well.
    async fn insert_sprint(
        &self,
        sprint: Sprint,
        items: Vec<SprintItem>,
    ) -> Result<SprintWithItems, ApiError>;
    async fn get_sprint(&self, id: Uuid) -> Result<Option<Sprint>, ApiError>;
    async fn get_sprint_items(&self, sprint_id: Uuid) -> Result<Vec<SprintItem>, ApiError>;
    async fn find_sprint_by_code(
        &self,
        project_id: Uuid,
        code: &str,
    ) -> Result<Option<Sprint>, ApiError>;
    async fn list_sprints(
        &self,
        filter: &SprintFilter,
        sort: &SortSpec,
        page: &PageSpec,
    ) -> Result<Page<Sprint>, ApiError>;

    /// Update the sprint row; when `replacement_items` is present, delete the
    /// existing item set and insert the replacement in the same transaction.
    /// A failure anywhere rolls back the field updates too.
    async fn update_sprint(
        &self,
        sprint: Sprint,
        replacement_items: Option<Vec<SprintItem>>,
    ) -> Result<SprintWithItems, ApiError>;

    /// Hard delete, cascading to the sprint's items.
    async fn delete_sprint(&self, id: Uuid) -> Result<bool, ApiError>;
}

impl<T> Page<T> {
    /// Map the page contents while preserving the pagination envelope.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            limit: self.limit,
            offset: self.offset,
        }
    }
}
