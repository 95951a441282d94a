// DevPlan - Project Planning Backend
// Root library module

pub mod config;
pub mod contracts;
pub mod errors;
pub mod http_server;
pub mod idempotency;
pub mod mcp;
pub mod memory_store;
pub mod metrics;
pub mod observability;
pub mod postgres_store;
pub mod rate_limit;
pub mod requests;
pub mod services;
pub mod types;
pub mod validation;

// Re-export key types
pub use observability::{init_logging, init_stderr_logging};

pub use contracts::{
    Document, DocumentFilter, Feature, FeatureFilter, Page, PageSpec, Project, SortSpec, Sprint,
    SprintFilter, SprintItem, SprintWithItems, Store,
};

pub use errors::{ApiError, ProblemDetails};

// Re-export validated types
pub use types::{
    slugify, AllowAllTransitions, DocumentKind, FeatureCode, FeatureStatus, SemverString, Slug,
    SortOrder, SprintCode, SprintStatus, TransitionPolicy, ValidatedLimit, ValidatedName,
    ValidatedTitle,
};

// Re-export store implementations
pub use memory_store::{create_memory_store, MemoryStore};
pub use postgres_store::{create_postgres_store, PostgresStore};

// Re-export the service layer and HTTP surface
pub use http_server::{create_router, start_server, AppState};
pub use services::Services;
