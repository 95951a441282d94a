// Postgres Store
// Store implementation over sqlx. Uniqueness lives in partial unique
// constraints scoped per project, child ownership in ON DELETE CASCADE
// foreign keys, and multi-step sprint writes in explicit transactions so a
// failed item insert rolls the sprint row back too.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::sync::Arc;
use uuid::Uuid;

use crate::contracts::{
    Document, DocumentFilter, Feature, FeatureFilter, Page, PageSpec, Project, SortSpec, Sprint,
    SprintFilter, SprintItem, SprintWithItems, Store,
};
use crate::errors::ApiError;
use crate::types::SortOrder;

const SCHEMA_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS projects (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS documents (
        id UUID PRIMARY KEY,
        project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        kind TEXT NOT NULL,
        title TEXT NOT NULL,
        slug TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        UNIQUE (project_id, slug)
    )",
    "CREATE TABLE IF NOT EXISTS features (
        id UUID PRIMARY KEY,
        project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        feature_code TEXT NOT NULL,
        title TEXT NOT NULL,
        version TEXT NOT NULL,
        status TEXT NOT NULL,
        area TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        UNIQUE (project_id, feature_code)
    )",
    "CREATE TABLE IF NOT EXISTS sprints (
        id UUID PRIMARY KEY,
        project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        sprint_code TEXT NOT NULL,
        name TEXT NOT NULL,
        status TEXT NOT NULL,
        start_date TIMESTAMPTZ,
        end_date TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        UNIQUE (project_id, sprint_code)
    )",
    "CREATE TABLE IF NOT EXISTS sprint_items (
        id UUID PRIMARY KEY,
        sprint_id UUID NOT NULL REFERENCES sprints(id) ON DELETE CASCADE,
        text TEXT NOT NULL,
        checked BOOLEAN NOT NULL,
        ordinal INTEGER NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
];

pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and bootstrap the schema.
    pub async fn connect(url: &str) -> Result<Self, ApiError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
            .map_err(internal)?;

        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(internal)?;
        }

        Ok(Self { pool })
    }
}

/// Factory used by the server binary.
pub async fn create_postgres_store(url: &str) -> Result<Arc<dyn Store>, ApiError> {
    Ok(Arc::new(PostgresStore::connect(url).await?))
}

fn internal(err: sqlx::Error) -> ApiError {
    ApiError::Internal(anyhow::Error::new(err))
}

/// Map a write error, turning a unique-constraint violation raised by a
/// racing writer into the same Conflict the pre-check would have produced.
fn write_error(
    resource: &'static str,
    field: &'static str,
    value: &str,
    err: sqlx::Error,
) -> ApiError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            ApiError::conflict(resource, field, value.to_string())
        }
        _ => internal(err),
    }
}

fn order_sql(sort: &SortSpec, column_of: fn(&str) -> &'static str) -> String {
    let direction = match sort.order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    format!("ORDER BY {} {direction}, id ASC", column_of(&sort.field))
}

fn page_sql(page: &PageSpec) -> String {
    // Both values already passed numeric validation; they are never
    // caller-controlled strings.
    format!("LIMIT {} OFFSET {}", page.limit, page.offset)
}

fn project_column(field: &str) -> &'static str {
    match field {
        "name" => "name",
        "updatedAt" => "updated_at",
        _ => "created_at",
    }
}

fn document_column(field: &str) -> &'static str {
    match field {
        "title" => "title",
        "kind" => "kind",
        "slug" => "slug",
        "updatedAt" => "updated_at",
        _ => "created_at",
    }
}

fn feature_column(field: &str) -> &'static str {
    match field {
        "title" => "title",
        "featureId" => "feature_code",
        "status" => "status",
        "area" => "area",
        "updatedAt" => "updated_at",
        _ => "created_at",
    }
}

fn sprint_column(field: &str) -> &'static str {
    match field {
        "name" => "name",
        "sprintId" => "sprint_code",
        "status" => "status",
        "startDate" => "start_date",
        "endDate" => "end_date",
        "updatedAt" => "updated_at",
        _ => "created_at",
    }
}

fn project_from_row(row: &PgRow) -> Result<Project, ApiError> {
    Ok(Project {
        id: row.try_get("id").map_err(internal)?,
        name: row.try_get("name").map_err(internal)?,
        created_at: row.try_get("created_at").map_err(internal)?,
        updated_at: row.try_get("updated_at").map_err(internal)?,
    })
}

fn document_from_row(row: &PgRow) -> Result<Document, ApiError> {
    let kind: String = row.try_get("kind").map_err(internal)?;
    Ok(Document {
        id: row.try_get("id").map_err(internal)?,
        project_id: row.try_get("project_id").map_err(internal)?,
        kind: kind.parse().map_err(ApiError::Internal)?,
        title: row.try_get("title").map_err(internal)?,
        slug: row.try_get("slug").map_err(internal)?,
        content: row.try_get("content").map_err(internal)?,
        created_at: row.try_get("created_at").map_err(internal)?,
        updated_at: row.try_get("updated_at").map_err(internal)?,
    })
}

fn feature_from_row(row: &PgRow) -> Result<Feature, ApiError> {
    let status: String = row.try_get("status").map_err(internal)?;
    Ok(Feature {
        id: row.try_get("id").map_err(internal)?,
        project_id: row.try_get("project_id").map_err(internal)?,
        feature_code: row.try_get("feature_code").map_err(internal)?,
        title: row.try_get("title").map_err(internal)?,
        version: row.try_get("version").map_err(internal)?,
        status: status.parse().map_err(ApiError::Internal)?,
        area: row.try_get("area").map_err(internal)?,
        created_at: row.try_get("created_at").map_err(internal)?,
        updated_at: row.try_get("updated_at").map_err(internal)?,
    })
}

fn sprint_from_row(row: &PgRow) -> Result<Sprint, ApiError> {
    let status: String = row.try_get("status").map_err(internal)?;
    Ok(Sprint {
        id: row.try_get("id").map_err(internal)?,
        project_id: row.try_get("project_id").map_err(internal)?,
        sprint_code: row.try_get("sprint_code").map_err(internal)?,
        name: row.try_get("name").map_err(internal)?,
        status: status.parse().map_err(ApiError::Internal)?,
        start_date: row.try_get("start_date").map_err(internal)?,
        end_date: row.try_get("end_date").map_err(internal)?,
        created_at: row.try_get("created_at").map_err(internal)?,
        updated_at: row.try_get("updated_at").map_err(internal)?,
    })
}

fn item_from_row(row: &PgRow) -> Result<SprintItem, ApiError> {
    Ok(SprintItem {
        id: row.try_get("id").map_err(internal)?,
        sprint_id: row.try_get("sprint_id").map_err(internal)?,
        text: row.try_get("text").map_err(internal)?,
        checked: row.try_get("checked").map_err(internal)?,
        position: row.try_get("ordinal").map_err(internal)?,
        created_at: row.try_get("created_at").map_err(internal)?,
        updated_at: row.try_get("updated_at").map_err(internal)?,
    })
}

async fn count(pool: &PgPool, sql: &str, binds: Vec<BindValue>) -> Result<u64, ApiError> {
    let mut query = sqlx::query(sql);
    for bind in binds {
        query = bind.apply(query);
    }
    let row = query.fetch_one(pool).await.map_err(internal)?;
    let total: i64 = row.try_get(0).map_err(internal)?;
    Ok(total.max(0) as u64)
}

/// Owned bind values for dynamically assembled filters.
enum BindValue {
    Id(Uuid),
    Text(String),
}

impl BindValue {
    fn apply<'q>(
        self,
        query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    ) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
        match self {
            BindValue::Id(id) => query.bind(id),
            BindValue::Text(text) => query.bind(text),
        }
    }
}

fn document_filter_sql(filter: &DocumentFilter) -> (String, Vec<BindValue>) {
    let mut clauses = Vec::new();
    let mut binds = Vec::new();

    if let Some(project_id) = filter.project_id {
        binds.push(BindValue::Id(project_id));
        clauses.push(format!("project_id = ${}", binds.len()));
    }
    if let Some(kind) = filter.kind {
        binds.push(BindValue::Text(kind.as_str().to_string()));
        clauses.push(format!("kind = ${}", binds.len()));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    (where_sql, binds)
}

fn feature_filter_sql(filter: &FeatureFilter) -> (String, Vec<BindValue>) {
    let mut clauses = Vec::new();
    let mut binds = Vec::new();

    if let Some(project_id) = filter.project_id {
        binds.push(BindValue::Id(project_id));
        clauses.push(format!("project_id = ${}", binds.len()));
    }
    if let Some(status) = filter.status {
        binds.push(BindValue::Text(status.as_str().to_string()));
        clauses.push(format!("status = ${}", binds.len()));
    }
    if let Some(area) = &filter.area {
        binds.push(BindValue::Text(format!("%{area}%")));
        clauses.push(format!("area ILIKE ${}", binds.len()));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    (where_sql, binds)
}

fn sprint_filter_sql(filter: &SprintFilter) -> (String, Vec<BindValue>) {
    let mut clauses = Vec::new();
    let mut binds = Vec::new();

    if let Some(project_id) = filter.project_id {
        binds.push(BindValue::Id(project_id));
        clauses.push(format!("project_id = ${}", binds.len()));
    }
    if let Some(status) = filter.status {
        binds.push(BindValue::Text(status.as_str().to_string()));
        clauses.push(format!("status = ${}", binds.len()));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    (where_sql, binds)
}

async fn insert_items_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    items: &[SprintItem],
) -> Result<(), sqlx::Error> {
    for item in items {
        sqlx::query(
            "INSERT INTO sprint_items (id, sprint_id, text, checked, ordinal, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(item.id)
        .bind(item.sprint_id)
        .bind(&item.text)
        .bind(item.checked)
        .bind(item.position)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl Store for PostgresStore {
    async fn ping(&self) -> Result<(), ApiError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        Ok(())
    }

    // Projects

    async fn insert_project(&self, project: Project) -> Result<Project, ApiError> {
        sqlx::query(
            "INSERT INTO projects (id, name, created_at, updated_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(project.id)
        .bind(&project.name)
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await
        .map_err(internal)?;
        Ok(project)
    }

    async fn get_project(&self, id: Uuid) -> Result<Option<Project>, ApiError> {
        let row = sqlx::query("SELECT * FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(project_from_row).transpose()
    }

    async fn list_projects(
        &self,
        sort: &SortSpec,
        page: &PageSpec,
    ) -> Result<Page<Project>, ApiError> {
        let total = count(&self.pool, "SELECT COUNT(*) FROM projects", Vec::new()).await?;

        let sql = format!(
            "SELECT * FROM projects {} {}",
            order_sql(sort, project_column),
            page_sql(page)
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?;
        let items = rows
            .iter()
            .map(project_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total,
            limit: page.limit,
            offset: page.offset,
        })
    }

    async fn update_project(&self, project: Project) -> Result<Project, ApiError> {
        let result = sqlx::query("UPDATE projects SET name = $2, updated_at = $3 WHERE id = $1")
            .bind(project.id)
            .bind(&project.name)
            .bind(project.updated_at)
            .execute(&self.pool)
            .await
            .map_err(internal)?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("project", project.id.to_string()));
        }
        Ok(project)
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool, ApiError> {
        // Children go with the row via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        Ok(result.rows_affected() > 0)
    }

    // Documents

    async fn insert_document(&self, document: Document) -> Result<Document, ApiError> {
        sqlx::query(
            "INSERT INTO documents (id, project_id, kind, title, slug, content, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(document.id)
        .bind(document.project_id)
        .bind(document.kind.as_str())
        .bind(&document.title)
        .bind(&document.slug)
        .bind(&document.content)
        .bind(document.created_at)
        .bind(document.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| write_error("document", "slug", &document.slug, err))?;
        Ok(document)
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, ApiError> {
        let row = sqlx::query("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(document_from_row).transpose()
    }

    async fn find_document_by_slug(
        &self,
        project_id: Uuid,
        slug: &str,
    ) -> Result<Option<Document>, ApiError> {
        let row = sqlx::query("SELECT * FROM documents WHERE project_id = $1 AND slug = $2")
            .bind(project_id)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(document_from_row).transpose()
    }

    async fn list_documents(
        &self,
        filter: &DocumentFilter,
        sort: &SortSpec,
        page: &PageSpec,
    ) -> Result<Page<Document>, ApiError> {
        let (where_sql, binds) = document_filter_sql(filter);

        let count_sql = format!("SELECT COUNT(*) FROM documents {where_sql}");
        let (_, count_binds) = document_filter_sql(filter);
        let total = count(&self.pool, &count_sql, count_binds).await?;

        let sql = format!(
            "SELECT * FROM documents {where_sql} {} {}",
            order_sql(sort, document_column),
            page_sql(page)
        );
        let mut query = sqlx::query(&sql);
        for bind in binds {
            query = bind.apply(query);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(internal)?;
        let items = rows
            .iter()
            .map(document_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total,
            limit: page.limit,
            offset: page.offset,
        })
    }

    async fn update_document(&self, document: Document) -> Result<Document, ApiError> {
        let result = sqlx::query(
            "UPDATE documents SET kind = $2, title = $3, slug = $4, content = $5, updated_at = $6
             WHERE id = $1",
        )
        .bind(document.id)
        .bind(document.kind.as_str())
        .bind(&document.title)
        .bind(&document.slug)
        .bind(&document.content)
        .bind(document.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| write_error("document", "slug", &document.slug, err))?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("document", document.id.to_string()));
        }
        Ok(document)
    }

    async fn delete_document(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        Ok(result.rows_affected() > 0)
    }

    // Features

    async fn insert_feature(&self, feature: Feature) -> Result<Feature, ApiError> {
        sqlx::query(
            "INSERT INTO features (id, project_id, feature_code, title, version, status, area, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(feature.id)
        .bind(feature.project_id)
        .bind(&feature.feature_code)
        .bind(&feature.title)
        .bind(&feature.version)
        .bind(feature.status.as_str())
        .bind(&feature.area)
        .bind(feature.created_at)
        .bind(feature.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| write_error("feature", "featureId", &feature.feature_code, err))?;
        Ok(feature)
    }

    async fn get_feature(&self, id: Uuid) -> Result<Option<Feature>, ApiError> {
        let row = sqlx::query("SELECT * FROM features WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(feature_from_row).transpose()
    }

    async fn find_feature_by_code(
        &self,
        project_id: Uuid,
        code: &str,
    ) -> Result<Option<Feature>, ApiError> {
        let row = sqlx::query("SELECT * FROM features WHERE project_id = $1 AND feature_code = $2")
            .bind(project_id)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(feature_from_row).transpose()
    }

    async fn list_features(
        &self,
        filter: &FeatureFilter,
        sort: &SortSpec,
        page: &PageSpec,
    ) -> Result<Page<Feature>, ApiError> {
        let (where_sql, binds) = feature_filter_sql(filter);

        let count_sql = format!("SELECT COUNT(*) FROM features {where_sql}");
        let (_, count_binds) = feature_filter_sql(filter);
        let total = count(&self.pool, &count_sql, count_binds).await?;

        let sql = format!(
            "SELECT * FROM features {where_sql} {} {}",
            order_sql(sort, feature_column),
            page_sql(page)
        );
        let mut query = sqlx::query(&sql);
        for bind in binds {
            query = bind.apply(query);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(internal)?;
        let items = rows
            .iter()
            .map(feature_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total,
            limit: page.limit,
            offset: page.offset,
        })
    }

    async fn update_feature(&self, feature: Feature) -> Result<Feature, ApiError> {
        let result = sqlx::query(
            "UPDATE features SET feature_code = $2, title = $3, version = $4, status = $5, area = $6, updated_at = $7
             WHERE id = $1",
        )
        .bind(feature.id)
        .bind(&feature.feature_code)
        .bind(&feature.title)
        .bind(&feature.version)
        .bind(feature.status.as_str())
        .bind(&feature.area)
        .bind(feature.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| write_error("feature", "featureId", &feature.feature_code, err))?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("feature", feature.id.to_string()));
        }
        Ok(feature)
    }

    async fn delete_feature(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM features WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        Ok(result.rows_affected() > 0)
    }

    // Sprints

    async fn insert_sprint(
        &self,
        sprint: Sprint,
        items: Vec<SprintItem>,
    ) -> Result<SprintWithItems, ApiError> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        sqlx::query(
            "INSERT INTO sprints (id, project_id, sprint_code, name, status, start_date, end_date, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(sprint.id)
        .bind(sprint.project_id)
        .bind(&sprint.sprint_code)
        .bind(&sprint.name)
        .bind(sprint.status.as_str())
        .bind(sprint.start_date)
        .bind(sprint.end_date)
        .bind(sprint.created_at)
        .bind(sprint.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|err| write_error("sprint", "sprintId", &sprint.sprint_code, err))?;

        insert_items_tx(&mut tx, &items).await.map_err(internal)?;

        tx.commit().await.map_err(internal)?;

        let mut items = items;
        items.sort_by_key(|item| item.position);
        Ok(SprintWithItems { sprint, items })
    }

    async fn get_sprint(&self, id: Uuid) -> Result<Option<Sprint>, ApiError> {
        let row = sqlx::query("SELECT * FROM sprints WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(sprint_from_row).transpose()
    }

    async fn get_sprint_items(&self, sprint_id: Uuid) -> Result<Vec<SprintItem>, ApiError> {
        let rows = sqlx::query(
            "SELECT * FROM sprint_items WHERE sprint_id = $1 ORDER BY ordinal ASC, id ASC",
        )
        .bind(sprint_id)
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;
        rows.iter().map(item_from_row).collect()
    }

    async fn find_sprint_by_code(
        &self,
        project_id: Uuid,
        code: &str,
    ) -> Result<Option<Sprint>, ApiError> {
        let row = sqlx::query("SELECT * FROM sprints WHERE project_id = $1 AND sprint_code = $2")
            .bind(project_id)
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;
        row.as_ref().map(sprint_from_row).transpose()
    }

    async fn list_sprints(
        &self,
        filter: &SprintFilter,
        sort: &SortSpec,
        page: &PageSpec,
    ) -> Result<Page<Sprint>, ApiError> {
        let (where_sql, binds) = sprint_filter_sql(filter);

        let count_sql = format!("SELECT COUNT(*) FROM sprints {where_sql}");
        let (_, count_binds) = sprint_filter_sql(filter);
        let total = count(&self.pool, &count_sql, count_binds).await?;

        let sql = format!(
            "SELECT * FROM sprints {where_sql} {} {}",
            order_sql(sort, sprint_column),
            page_sql(page)
        );
        let mut query = sqlx::query(&sql);
        for bind in binds {
            query = bind.apply(query);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(internal)?;
        let items = rows
            .iter()
            .map(sprint_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            total,
            limit: page.limit,
            offset: page.offset,
        })
    }

    async fn update_sprint(
        &self,
        sprint: Sprint,
        replacement_items: Option<Vec<SprintItem>>,
    ) -> Result<SprintWithItems, ApiError> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        let result = sqlx::query(
            "UPDATE sprints SET sprint_code = $2, name = $3, status = $4, start_date = $5, end_date = $6, updated_at = $7
             WHERE id = $1",
        )
        .bind(sprint.id)
        .bind(&sprint.sprint_code)
        .bind(&sprint.name)
        .bind(sprint.status.as_str())
        .bind(sprint.start_date)
        .bind(sprint.end_date)
        .bind(sprint.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|err| write_error("sprint", "sprintId", &sprint.sprint_code, err))?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("sprint", sprint.id.to_string()));
        }

        if let Some(items) = &replacement_items {
            sqlx::query("DELETE FROM sprint_items WHERE sprint_id = $1")
                .bind(sprint.id)
                .execute(&mut *tx)
                .await
                .map_err(internal)?;
            insert_items_tx(&mut tx, items).await.map_err(internal)?;
        }

        tx.commit().await.map_err(internal)?;

        let items = self.get_sprint_items(sprint.id).await?;
        Ok(SprintWithItems { sprint, items })
    }

    async fn delete_sprint(&self, id: Uuid) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM sprints WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        Ok(result.rows_affected() > 0)
    }
}
