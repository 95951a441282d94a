// Validation Layer
// Turns raw request shapes into normalized, typed inputs or a structured
// failure listing every violated field. Both the REST handlers and the
// gateway tools run through these functions, so the two process boundaries
// validate identically and cannot drift.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::contracts::{DocumentFilter, FeatureFilter, PageSpec, SortSpec, SprintFilter};
use crate::errors::ApiError;
use crate::requests::*;
use crate::types::{
    DocumentKind, FeatureCode, FeatureStatus, SemverString, Slug, SortOrder, SprintCode,
    SprintStatus, ValidatedLimit, ValidatedName, ValidatedTitle,
};

pub const MAX_ITEM_TEXT_LENGTH: usize = 1000;
pub const MAX_AREA_LENGTH: usize = 100;

pub const DEFAULT_FEATURE_VERSION: &str = "0.1.0";
pub const DEFAULT_FEATURE_AREA: &str = "general";

/// Accumulates one message per violated field so callers get the whole
/// picture in a single round-trip.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        // First violation per field wins; later checks depend on earlier ones.
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    /// Record a constructor failure under `field`, passing the value through
    /// on success.
    pub fn capture<T>(&mut self, field: &str, result: anyhow::Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.add(field, err.to_string());
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::SchemaValidation {
                errors: self.errors,
            })
        }
    }

    /// Resolve to `value` only when no field failed. The value is built from
    /// `Option`s populated during capture, so it is only safe to unwrap them
    /// after this check; callers pass a closure to keep that ordering.
    pub fn finish_with<T>(self, build: impl FnOnce() -> T) -> Result<T, ApiError> {
        self.finish().map(|_| build())
    }
}

fn required<'a>(errors: &mut FieldErrors, field: &str, value: &'a Option<String>) -> Option<&'a str> {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => Some(v),
        _ => {
            errors.add(field, "is required");
            None
        }
    }
}

fn parse_uuid(errors: &mut FieldErrors, field: &str, value: &str) -> Option<Uuid> {
    match Uuid::parse_str(value) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, "must be a valid UUID");
            None
        }
    }
}

fn parse_datetime(errors: &mut FieldErrors, field: &str, value: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(value) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(_) => {
            errors.add(field, "must be an RFC 3339 timestamp");
            None
        }
    }
}

fn pagination(
    errors: &mut FieldErrors,
    limit: &Option<String>,
    offset: &Option<String>,
) -> PageSpec {
    let mut page = PageSpec::default();

    if let Some(raw) = limit.as_deref() {
        match raw.parse::<u32>() {
            Ok(value) => {
                if let Some(validated) = errors.capture("limit", ValidatedLimit::new(value)) {
                    page.limit = validated.get();
                }
            }
            Err(_) => errors.add(
                "limit",
                format!(
                    "must be an integer between {} and {}",
                    ValidatedLimit::MIN,
                    ValidatedLimit::MAX
                ),
            ),
        }
    }

    if let Some(raw) = offset.as_deref() {
        match raw.parse::<u64>() {
            Ok(value) => page.offset = value,
            Err(_) => errors.add("offset", "must be a non-negative integer"),
        }
    }

    page
}

fn sorting(
    errors: &mut FieldErrors,
    sort_by: &Option<String>,
    sort_order: &Option<String>,
    sortable: &[&str],
) -> SortSpec {
    let mut sort = SortSpec::default();

    if let Some(field) = sort_by.as_deref() {
        if sortable.contains(&field) {
            sort.field = field.to_string();
        } else {
            errors.add(
                "sortBy",
                format!("must be one of: {}", sortable.join(", ")),
            );
        }
    }

    if let Some(order) = sort_order.as_deref() {
        if let Some(parsed) = errors.capture("sortOrder", order.parse::<SortOrder>()) {
            sort.order = parsed;
        }
    }

    sort
}

/// Normalized list options for one entity.
#[derive(Debug, Clone)]
pub struct ListOptions<F> {
    pub filter: F,
    pub sort: SortSpec,
    pub page: PageSpec,
}

pub mod project {
    use super::*;

    pub const SORTABLE: &[&str] = &["name", "createdAt", "updatedAt"];

    #[derive(Debug, Clone)]
    pub struct NewProject {
        pub name: ValidatedName,
    }

    #[derive(Debug, Clone, Default)]
    pub struct ProjectPatch {
        pub name: Option<ValidatedName>,
    }

    pub fn create(req: &CreateProjectRequest) -> Result<NewProject, ApiError> {
        let mut errors = FieldErrors::new();

        let name = required(&mut errors, "name", &req.name)
            .and_then(|raw| errors.capture("name", ValidatedName::new(raw)));

        errors.finish_with(|| NewProject {
            name: name.expect("validated"),
        })
    }

    pub fn update(req: &UpdateProjectRequest) -> Result<ProjectPatch, ApiError> {
        let mut errors = FieldErrors::new();

        let name = req
            .name
            .as_deref()
            .and_then(|raw| errors.capture("name", ValidatedName::new(raw)));

        errors.finish_with(|| ProjectPatch { name })
    }

    pub fn list(query: &ProjectListQuery) -> Result<ListOptions<()>, ApiError> {
        let mut errors = FieldErrors::new();
        let page = pagination(&mut errors, &query.limit, &query.offset);
        let sort = sorting(&mut errors, &query.sort_by, &query.sort_order, SORTABLE);

        errors.finish_with(|| ListOptions {
            filter: (),
            sort,
            page,
        })
    }
}

pub mod document {
    use super::*;

    pub const SORTABLE: &[&str] = &["title", "kind", "slug", "createdAt", "updatedAt"];

    #[derive(Debug, Clone)]
    pub struct NewDocument {
        pub project_id: Uuid,
        pub kind: DocumentKind,
        pub title: ValidatedTitle,
        pub slug: Slug,
        pub content: String,
    }

    #[derive(Debug, Clone, Default)]
    pub struct DocumentPatch {
        pub kind: Option<DocumentKind>,
        pub title: Option<ValidatedTitle>,
        pub slug: Option<Slug>,
        pub content: Option<String>,
    }

    pub fn create(req: &CreateDocumentRequest) -> Result<NewDocument, ApiError> {
        let mut errors = FieldErrors::new();

        let project_id = required(&mut errors, "projectId", &req.project_id)
            .and_then(|raw| parse_uuid(&mut errors, "projectId", raw));
        let kind = required(&mut errors, "kind", &req.kind)
            .and_then(|raw| errors.capture("kind", raw.parse::<DocumentKind>()));
        let title = required(&mut errors, "title", &req.title)
            .and_then(|raw| errors.capture("title", ValidatedTitle::new(raw)));

        // An explicit slug is validated as-is; otherwise it derives from the
        // title once the title itself has passed.
        let slug = match req.slug.as_deref() {
            Some(raw) => errors.capture("slug", Slug::new(raw)),
            None => title
                .as_ref()
                .and_then(|t| errors.capture("slug", Slug::from_title(t.as_str()))),
        };

        let content = req.content.clone().unwrap_or_default();

        errors.finish_with(|| NewDocument {
            project_id: project_id.expect("validated"),
            kind: kind.expect("validated"),
            title: title.expect("validated"),
            slug: slug.expect("validated"),
            content,
        })
    }

    pub fn update(req: &UpdateDocumentRequest) -> Result<DocumentPatch, ApiError> {
        let mut errors = FieldErrors::new();

        let kind = req
            .kind
            .as_deref()
            .and_then(|raw| errors.capture("kind", raw.parse::<DocumentKind>()));
        let title = req
            .title
            .as_deref()
            .and_then(|raw| errors.capture("title", ValidatedTitle::new(raw)));
        let slug = req
            .slug
            .as_deref()
            .and_then(|raw| errors.capture("slug", Slug::new(raw)));

        let content = req.content.clone();

        errors.finish_with(|| DocumentPatch {
            kind,
            title,
            slug,
            content,
        })
    }

    pub fn list(query: &DocumentListQuery) -> Result<ListOptions<DocumentFilter>, ApiError> {
        let mut errors = FieldErrors::new();

        let project_id = query
            .project_id
            .as_deref()
            .and_then(|raw| parse_uuid(&mut errors, "projectId", raw));
        let kind = query
            .kind
            .as_deref()
            .and_then(|raw| errors.capture("kind", raw.parse::<DocumentKind>()));

        let page = pagination(&mut errors, &query.limit, &query.offset);
        let sort = sorting(&mut errors, &query.sort_by, &query.sort_order, SORTABLE);

        errors.finish_with(|| ListOptions {
            filter: DocumentFilter { project_id, kind },
            sort,
            page,
        })
    }
}

pub mod feature {
    use super::*;

    pub const SORTABLE: &[&str] = &[
        "title",
        "featureId",
        "status",
        "area",
        "createdAt",
        "updatedAt",
    ];

    #[derive(Debug, Clone)]
    pub struct NewFeature {
        pub project_id: Uuid,
        pub code: FeatureCode,
        pub title: ValidatedTitle,
        pub version: SemverString,
        pub status: FeatureStatus,
        pub area: String,
    }

    #[derive(Debug, Clone, Default)]
    pub struct FeaturePatch {
        pub code: Option<FeatureCode>,
        pub title: Option<ValidatedTitle>,
        pub version: Option<SemverString>,
        pub status: Option<FeatureStatus>,
        pub area: Option<String>,
    }

    fn validate_area(errors: &mut FieldErrors, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            errors.add("area", "cannot be empty");
            return None;
        }
        if trimmed.len() > MAX_AREA_LENGTH {
            errors.add(
                "area",
                format!("exceeds maximum length of {MAX_AREA_LENGTH} characters"),
            );
            return None;
        }
        Some(trimmed.to_string())
    }

    pub fn create(req: &CreateFeatureRequest) -> Result<NewFeature, ApiError> {
        let mut errors = FieldErrors::new();

        let project_id = required(&mut errors, "projectId", &req.project_id)
            .and_then(|raw| parse_uuid(&mut errors, "projectId", raw));
        let code = required(&mut errors, "featureId", &req.feature_code)
            .and_then(|raw| errors.capture("featureId", FeatureCode::new(raw)));
        let title = required(&mut errors, "title", &req.title)
            .and_then(|raw| errors.capture("title", ValidatedTitle::new(raw)));

        let version = match req.version.as_deref() {
            Some(raw) => errors.capture("version", SemverString::new(raw)),
            None => Some(SemverString::new(DEFAULT_FEATURE_VERSION).expect("default is valid")),
        };
        let status = match req.status.as_deref() {
            Some(raw) => errors.capture("status", raw.parse::<FeatureStatus>()),
            None => Some(FeatureStatus::Planned),
        };
        let area = match req.area.as_deref() {
            Some(raw) => validate_area(&mut errors, raw),
            None => Some(DEFAULT_FEATURE_AREA.to_string()),
        };

        errors.finish_with(|| NewFeature {
            project_id: project_id.expect("validated"),
            code: code.expect("validated"),
            title: title.expect("validated"),
            version: version.expect("validated"),
            status: status.expect("validated"),
            area: area.expect("validated"),
        })
    }

    pub fn update(req: &UpdateFeatureRequest) -> Result<FeaturePatch, ApiError> {
        let mut errors = FieldErrors::new();

        let code = req
            .feature_code
            .as_deref()
            .and_then(|raw| errors.capture("featureId", FeatureCode::new(raw)));
        let title = req
            .title
            .as_deref()
            .and_then(|raw| errors.capture("title", ValidatedTitle::new(raw)));
        let version = req
            .version
            .as_deref()
            .and_then(|raw| errors.capture("version", SemverString::new(raw)));
        let status = req
            .status
            .as_deref()
            .and_then(|raw| errors.capture("status", raw.parse::<FeatureStatus>()));
        let area = req
            .area
            .as_deref()
            .and_then(|raw| validate_area(&mut errors, raw));

        errors.finish_with(|| FeaturePatch {
            code,
            title,
            version,
            status,
            area,
        })
    }

    pub fn list(query: &FeatureListQuery) -> Result<ListOptions<FeatureFilter>, ApiError> {
        let mut errors = FieldErrors::new();

        let project_id = query
            .project_id
            .as_deref()
            .and_then(|raw| parse_uuid(&mut errors, "projectId", raw));
        let status = query
            .status
            .as_deref()
            .and_then(|raw| errors.capture("status", raw.parse::<FeatureStatus>()));
        let area = query.area.as_deref().map(|raw| raw.trim().to_string());

        let page = pagination(&mut errors, &query.limit, &query.offset);
        let sort = sorting(&mut errors, &query.sort_by, &query.sort_order, SORTABLE);

        errors.finish_with(|| ListOptions {
            filter: FeatureFilter {
                project_id,
                status,
                area: area.filter(|a| !a.is_empty()),
            },
            sort,
            page,
        })
    }
}

pub mod sprint {
    use super::*;

    pub const SORTABLE: &[&str] = &[
        "name",
        "sprintId",
        "status",
        "startDate",
        "endDate",
        "createdAt",
        "updatedAt",
    ];

    #[derive(Debug, Clone)]
    pub struct NewSprintItem {
        pub text: String,
        pub checked: bool,
        pub position: i32,
    }

    #[derive(Debug, Clone)]
    pub struct NewSprint {
        pub project_id: Uuid,
        pub code: SprintCode,
        pub name: ValidatedName,
        pub status: SprintStatus,
        pub start_date: Option<DateTime<Utc>>,
        pub end_date: Option<DateTime<Utc>>,
        pub items: Vec<NewSprintItem>,
    }

    #[derive(Debug, Clone, Default)]
    pub struct SprintPatch {
        pub code: Option<SprintCode>,
        pub name: Option<ValidatedName>,
        pub status: Option<SprintStatus>,
        pub start_date: Option<DateTime<Utc>>,
        pub end_date: Option<DateTime<Utc>>,
        pub items: Option<Vec<NewSprintItem>>,
    }

    fn validate_items(
        errors: &mut FieldErrors,
        items: &[SprintItemInput],
    ) -> Vec<NewSprintItem> {
        let mut validated = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let field = |name: &str| format!("items[{index}].{name}");

            let text = match item.text.as_deref().map(str::trim) {
                Some(t) if !t.is_empty() => {
                    if t.len() > MAX_ITEM_TEXT_LENGTH {
                        errors.add(
                            &field("text"),
                            format!("exceeds maximum length of {MAX_ITEM_TEXT_LENGTH} characters"),
                        );
                        continue;
                    }
                    t.to_string()
                }
                _ => {
                    errors.add(&field("text"), "is required");
                    continue;
                }
            };

            let position = match item.position.as_deref() {
                Some(raw) => match raw.parse::<i32>() {
                    Ok(p) => p,
                    Err(_) => {
                        errors.add(&field("position"), "must be an integer");
                        continue;
                    }
                },
                None => index as i32,
            };

            validated.push(NewSprintItem {
                text,
                checked: item.checked.unwrap_or(false),
                position,
            });
        }

        validated
    }

    pub fn create(req: &CreateSprintRequest) -> Result<NewSprint, ApiError> {
        let mut errors = FieldErrors::new();

        let project_id = required(&mut errors, "projectId", &req.project_id)
            .and_then(|raw| parse_uuid(&mut errors, "projectId", raw));
        let code = required(&mut errors, "sprintId", &req.sprint_code)
            .and_then(|raw| errors.capture("sprintId", SprintCode::new(raw)));
        let name = required(&mut errors, "name", &req.name)
            .and_then(|raw| errors.capture("name", ValidatedName::new(raw)));

        let status = match req.status.as_deref() {
            Some(raw) => errors.capture("status", raw.parse::<SprintStatus>()),
            None => Some(SprintStatus::Planned),
        };
        let start_date = req
            .start_date
            .as_deref()
            .and_then(|raw| parse_datetime(&mut errors, "startDate", raw));
        let end_date = req
            .end_date
            .as_deref()
            .and_then(|raw| parse_datetime(&mut errors, "endDate", raw));

        let items = match req.items.as_deref() {
            Some(list) => validate_items(&mut errors, list),
            None => Vec::new(),
        };

        errors.finish_with(|| NewSprint {
            project_id: project_id.expect("validated"),
            code: code.expect("validated"),
            name: name.expect("validated"),
            status: status.expect("validated"),
            start_date,
            end_date,
            items,
        })
    }

    pub fn update(req: &UpdateSprintRequest) -> Result<SprintPatch, ApiError> {
        let mut errors = FieldErrors::new();

        let code = req
            .sprint_code
            .as_deref()
            .and_then(|raw| errors.capture("sprintId", SprintCode::new(raw)));
        let name = req
            .name
            .as_deref()
            .and_then(|raw| errors.capture("name", ValidatedName::new(raw)));
        let status = req
            .status
            .as_deref()
            .and_then(|raw| errors.capture("status", raw.parse::<SprintStatus>()));
        let start_date = req
            .start_date
            .as_deref()
            .and_then(|raw| parse_datetime(&mut errors, "startDate", raw));
        let end_date = req
            .end_date
            .as_deref()
            .and_then(|raw| parse_datetime(&mut errors, "endDate", raw));

        let items = req
            .items
            .as_deref()
            .map(|list| validate_items(&mut errors, list));

        errors.finish_with(|| SprintPatch {
            code,
            name,
            status,
            start_date,
            end_date,
            items,
        })
    }

    /// The nested bulk-mutation path: the item list itself is required.
    pub fn replace_items(
        req: &ReplaceSprintItemsRequest,
    ) -> Result<Vec<NewSprintItem>, ApiError> {
        let mut errors = FieldErrors::new();

        let items = match req.items.as_deref() {
            Some(list) => validate_items(&mut errors, list),
            None => {
                errors.add("items", "is required");
                Vec::new()
            }
        };

        errors.finish_with(|| items)
    }

    /// Domain rule shared by create and update: when both dates are present,
    /// the end must be strictly after the start. Reported as a 422-class
    /// failure, distinct from plain schema validation.
    pub fn check_date_range(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<(), ApiError> {
        if let (Some(start), Some(end)) = (start, end) {
            if end <= start {
                return Err(ApiError::domain("endDate must be after startDate"));
            }
        }
        Ok(())
    }

    pub fn list(query: &SprintListQuery) -> Result<ListOptions<SprintFilter>, ApiError> {
        let mut errors = FieldErrors::new();

        let project_id = query
            .project_id
            .as_deref()
            .and_then(|raw| parse_uuid(&mut errors, "projectId", raw));
        let status = query
            .status
            .as_deref()
            .and_then(|raw| errors.capture("status", raw.parse::<SprintStatus>()));

        let page = pagination(&mut errors, &query.limit, &query.offset);
        let sort = sorting(&mut errors, &query.sort_by, &query.sort_order, SORTABLE);

        errors.finish_with(|| ListOptions {
            filter: SprintFilter { project_id, status },
            sort,
            page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiError;

    #[test]
    fn test_project_create_requires_name() {
        let err = project::create(&CreateProjectRequest { name: None }).unwrap_err();
        match err {
            ApiError::SchemaValidation { errors } => {
                assert_eq!(errors["name"], "is required");
            }
            other => panic!("expected schema validation, got {other:?}"),
        }
    }

    #[test]
    fn test_document_create_reports_every_violation() {
        let req = CreateDocumentRequest {
            project_id: Some("not-a-uuid".to_string()),
            kind: Some("chapter".to_string()),
            title: None,
            slug: None,
            content: None,
        };

        match document::create(&req).unwrap_err() {
            ApiError::SchemaValidation { errors } => {
                assert!(errors.contains_key("projectId"));
                assert!(errors.contains_key("kind"));
                assert!(errors.contains_key("title"));
                // The slug cannot be derived without a title, but that is the
                // title's failure to report, not the slug's.
                assert!(!errors.contains_key("slug"));
            }
            other => panic!("expected schema validation, got {other:?}"),
        }
    }

    #[test]
    fn test_document_slug_derived_from_title() {
        let req = CreateDocumentRequest {
            project_id: Some(Uuid::new_v4().to_string()),
            kind: Some("freeform".to_string()),
            title: Some("Test & Document!".to_string()),
            slug: None,
            content: Some("body".to_string()),
        };

        let input = document::create(&req).unwrap();
        assert_eq!(input.slug.as_str(), "test-document");
    }

    #[test]
    fn test_feature_code_pattern_is_schema_failure() {
        let req = CreateFeatureRequest {
            project_id: Some(Uuid::new_v4().to_string()),
            feature_code: Some("FT-1".to_string()),
            title: Some("Login".to_string()),
            ..Default::default()
        };

        match feature::create(&req).unwrap_err() {
            ApiError::SchemaValidation { errors } => {
                assert!(errors["featureId"].contains("FEAT-<digits>"));
            }
            other => panic!("expected schema validation, got {other:?}"),
        }

        let ok = CreateFeatureRequest {
            project_id: Some(Uuid::new_v4().to_string()),
            feature_code: Some("FEAT-001".to_string()),
            title: Some("Login".to_string()),
            ..Default::default()
        };
        let input = feature::create(&ok).unwrap();
        assert_eq!(input.code.as_str(), "FEAT-001");
        assert_eq!(input.version.as_str(), DEFAULT_FEATURE_VERSION);
        assert_eq!(input.status, FeatureStatus::Planned);
        assert_eq!(input.area, DEFAULT_FEATURE_AREA);
    }

    #[test]
    fn test_sprint_dates_parse_independently_of_ordering() {
        let req = CreateSprintRequest {
            project_id: Some(Uuid::new_v4().to_string()),
            sprint_code: Some("SPR-001".to_string()),
            name: Some("Sprint One".to_string()),
            start_date: Some("2026-02-01T00:00:00Z".to_string()),
            end_date: Some("2026-01-01T00:00:00Z".to_string()),
            ..Default::default()
        };

        // Both fields individually pass schema checks; the ordering is a
        // domain rule applied by the service.
        let input = sprint::create(&req).unwrap();
        assert!(sprint::check_date_range(input.start_date, input.end_date).is_err());

        match sprint::check_date_range(input.start_date, input.end_date).unwrap_err() {
            ApiError::DomainValidation { detail } => {
                assert!(detail.contains("endDate"));
            }
            other => panic!("expected domain validation, got {other:?}"),
        }
    }

    #[test]
    fn test_sprint_item_defaults() {
        let req = CreateSprintRequest {
            project_id: Some(Uuid::new_v4().to_string()),
            sprint_code: Some("SPR-002".to_string()),
            name: Some("Sprint Two".to_string()),
            items: Some(vec![
                SprintItemInput {
                    text: Some("write tests".to_string()),
                    ..Default::default()
                },
                SprintItemInput {
                    text: Some("ship".to_string()),
                    checked: Some(true),
                    position: Some("7".to_string()),
                },
            ]),
            ..Default::default()
        };

        let input = sprint::create(&req).unwrap();
        assert_eq!(input.items.len(), 2);
        assert_eq!(input.items[0].position, 0);
        assert!(!input.items[0].checked);
        assert_eq!(input.items[1].position, 7);
        assert!(input.items[1].checked);
    }

    #[test]
    fn test_sprint_item_errors_are_indexed() {
        let req = ReplaceSprintItemsRequest {
            items: Some(vec![
                SprintItemInput {
                    text: Some("fine".to_string()),
                    ..Default::default()
                },
                SprintItemInput {
                    text: None,
                    ..Default::default()
                },
            ]),
        };

        match sprint::replace_items(&req).unwrap_err() {
            ApiError::SchemaValidation { errors } => {
                assert_eq!(errors["items[1].text"], "is required");
            }
            other => panic!("expected schema validation, got {other:?}"),
        }
    }

    #[test]
    fn test_pagination_bounds() {
        let query = DocumentListQuery {
            limit: Some("0".to_string()),
            offset: Some("-3".to_string()),
            ..Default::default()
        };

        match document::list(&query).unwrap_err() {
            ApiError::SchemaValidation { errors } => {
                assert!(errors.contains_key("limit"));
                assert!(errors.contains_key("offset"));
            }
            other => panic!("expected schema validation, got {other:?}"),
        }

        let query = DocumentListQuery {
            limit: Some("100".to_string()),
            offset: Some("40".to_string()),
            sort_by: Some("updatedAt".to_string()),
            sort_order: Some("asc".to_string()),
            ..Default::default()
        };
        let options = document::list(&query).unwrap();
        assert_eq!(options.page.limit, 100);
        assert_eq!(options.page.offset, 40);
        assert_eq!(options.sort.field, "updatedAt");
        assert_eq!(options.sort.order, SortOrder::Asc);
    }

    #[test]
    fn test_sort_field_whitelist() {
        let query = FeatureListQuery {
            sort_by: Some("content".to_string()),
            ..Default::default()
        };

        match feature::list(&query).unwrap_err() {
            ApiError::SchemaValidation { errors } => {
                assert!(errors["sortBy"].contains("featureId"));
            }
            other => panic!("expected schema validation, got {other:?}"),
        }
    }
}
