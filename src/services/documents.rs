use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::contracts::{Document, DocumentFilter, Page, Store};
use crate::errors::ApiError;
use crate::validation::document::{DocumentPatch, NewDocument};
use crate::validation::ListOptions;

#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn Store>,
}

impl DocumentService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create algorithm: parent must resolve, then the slug must be free
    /// within that project, then the row is persisted.
    pub async fn create(&self, input: NewDocument) -> Result<Document, ApiError> {
        if self.store.get_project(input.project_id).await?.is_none() {
            return Err(ApiError::not_found(
                "project",
                input.project_id.to_string(),
            ));
        }

        if self
            .store
            .find_document_by_slug(input.project_id, input.slug.as_str())
            .await?
            .is_some()
        {
            return Err(ApiError::conflict(
                "document",
                "slug",
                input.slug.into_inner(),
            ));
        }

        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4(),
            project_id: input.project_id,
            kind: input.kind,
            title: input.title.into_inner(),
            slug: input.slug.into_inner(),
            content: input.content,
            created_at: now,
            updated_at: now,
        };

        let document = self.store.insert_document(document).await?;
        info!(document_id = %document.id, slug = %document.slug, "document created");
        Ok(document)
    }

    pub async fn get(&self, id: Uuid) -> Result<Document, ApiError> {
        self.store
            .get_document(id)
            .await?
            .ok_or_else(|| ApiError::not_found("document", id.to_string()))
    }

    pub async fn list(
        &self,
        options: ListOptions<DocumentFilter>,
    ) -> Result<Page<Document>, ApiError> {
        self.store
            .list_documents(&options.filter, &options.sort, &options.page)
            .await
    }

    pub async fn update(&self, id: Uuid, patch: DocumentPatch) -> Result<Document, ApiError> {
        let mut document = self.get(id).await?;

        // A changed slug is re-checked against the project scope, excluding
        // this document's own row.
        if let Some(slug) = &patch.slug {
            if slug.as_str() != document.slug {
                if let Some(existing) = self
                    .store
                    .find_document_by_slug(document.project_id, slug.as_str())
                    .await?
                {
                    if existing.id != id {
                        return Err(ApiError::conflict(
                            "document",
                            "slug",
                            slug.as_str().to_string(),
                        ));
                    }
                }
            }
        }

        if let Some(kind) = patch.kind {
            document.kind = kind;
        }
        if let Some(title) = patch.title {
            document.title = title.into_inner();
        }
        if let Some(slug) = patch.slug {
            document.slug = slug.into_inner();
        }
        if let Some(content) = patch.content {
            document.content = content;
        }
        document.updated_at = Utc::now();

        self.store.update_document(document).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        if !self.store.delete_document(id).await? {
            return Err(ApiError::not_found("document", id.to_string()));
        }
        Ok(())
    }
}
