// Validated Types
// Strongly-typed wrappers that cannot be constructed with invalid data, plus
// the closed enumerations shared by the REST layer and the gateway.

use anyhow::{ensure, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static FEATURE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^FEAT-\d+$").expect("feature code pattern is valid"));
static SPRINT_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^SPR-\d+$").expect("sprint code pattern is valid"));
static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("slug pattern is valid"));
static VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+\.\d+\.\d+(-[0-9A-Za-z.\-]+)?$").expect("version pattern is valid")
});

/// A non-empty project or sprint name with enforced length limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedName {
    inner: String,
}

impl ValidatedName {
    pub const MAX_LENGTH: usize = 200;

    /// Create a new validated name
    ///
    /// # Invariants
    /// - Non-empty after trimming
    /// - Length <= 200 characters
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let trimmed = name.trim();

        ensure!(!trimmed.is_empty(), "name cannot be empty");
        ensure!(
            trimmed.len() <= Self::MAX_LENGTH,
            "name exceeds maximum length of {} characters",
            Self::MAX_LENGTH
        );

        Ok(Self {
            inner: trimmed.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn into_inner(self) -> String {
        self.inner
    }
}

impl fmt::Display for ValidatedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// A non-empty document or feature title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedTitle {
    inner: String,
}

impl ValidatedTitle {
    pub const MAX_LENGTH: usize = 500;

    pub fn new(title: impl Into<String>) -> Result<Self> {
        let title = title.into();
        let trimmed = title.trim();

        ensure!(!trimmed.is_empty(), "title cannot be empty");
        ensure!(
            trimmed.len() <= Self::MAX_LENGTH,
            "title exceeds maximum length of {} characters",
            Self::MAX_LENGTH
        );

        Ok(Self {
            inner: trimmed.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn into_inner(self) -> String {
        self.inner
    }
}

impl fmt::Display for ValidatedTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// Derive a URL-safe slug from a free-form title.
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single hyphen, and strips leading/trailing hyphens. `"Test & Document!"`
/// becomes `"test-document"`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// A URL-safe document slug, unique within its project
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slug {
    inner: String,
}

impl Slug {
    pub const MAX_LENGTH: usize = 200;

    /// Accept a caller-provided slug
    ///
    /// # Invariants
    /// - Matches `[a-z0-9]+(-[a-z0-9]+)*`
    /// - Length <= 200 characters
    pub fn new(slug: impl Into<String>) -> Result<Self> {
        let slug = slug.into();

        ensure!(!slug.is_empty(), "slug cannot be empty");
        ensure!(
            slug.len() <= Self::MAX_LENGTH,
            "slug exceeds maximum length of {} characters",
            Self::MAX_LENGTH
        );
        ensure!(
            SLUG_RE.is_match(&slug),
            "slug must be lowercase alphanumerics separated by single hyphens"
        );

        Ok(Self { inner: slug })
    }

    /// Derive a slug from a title, truncating to the length limit
    pub fn from_title(title: &str) -> Result<Self> {
        let mut derived = slugify(title);
        derived.truncate(Self::MAX_LENGTH);
        let derived = derived.trim_end_matches('-').to_string();

        ensure!(
            !derived.is_empty(),
            "title contains no characters usable in a slug"
        );

        Ok(Self { inner: derived })
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn into_inner(self) -> String {
        self.inner
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// A feature code matching `FEAT-<digits>`, unique within its project
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureCode {
    inner: String,
}

impl FeatureCode {
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        ensure!(
            FEATURE_CODE_RE.is_match(&code),
            "feature code must match FEAT-<digits>"
        );
        Ok(Self { inner: code })
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn into_inner(self) -> String {
        self.inner
    }
}

impl fmt::Display for FeatureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// A sprint code matching `SPR-<digits>`, unique within its project
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SprintCode {
    inner: String,
}

impl SprintCode {
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        ensure!(
            SPRINT_CODE_RE.is_match(&code),
            "sprint code must match SPR-<digits>"
        );
        Ok(Self { inner: code })
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn into_inner(self) -> String {
        self.inner
    }
}

impl fmt::Display for SprintCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// A semantic version string (`major.minor.patch` with optional pre-release)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemverString {
    inner: String,
}

impl SemverString {
    pub const MAX_LENGTH: usize = 50;

    pub fn new(version: impl Into<String>) -> Result<Self> {
        let version = version.into();
        ensure!(
            version.len() <= Self::MAX_LENGTH,
            "version exceeds maximum length of {} characters",
            Self::MAX_LENGTH
        );
        ensure!(
            VERSION_RE.is_match(&version),
            "version must be a semantic version like 1.2.3"
        );
        Ok(Self { inner: version })
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn into_inner(self) -> String {
        self.inner
    }
}

/// Document kinds form a fixed catalog shared by the REST API and the
/// gateway's `devplan://documents/kinds` resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    #[serde(rename = "prd")]
    Prd,
    #[serde(rename = "tech-overview")]
    TechOverview,
    #[serde(rename = "sprint-overview")]
    SprintOverview,
    #[serde(rename = "sprint")]
    Sprint,
    #[serde(rename = "freeform")]
    Freeform,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Prd => "prd",
            DocumentKind::TechOverview => "tech-overview",
            DocumentKind::SprintOverview => "sprint-overview",
            DocumentKind::Sprint => "sprint",
            DocumentKind::Freeform => "freeform",
        }
    }

    pub fn all() -> &'static [DocumentKind] {
        &[
            DocumentKind::Prd,
            DocumentKind::TechOverview,
            DocumentKind::SprintOverview,
            DocumentKind::Sprint,
            DocumentKind::Freeform,
        ]
    }
}

impl FromStr for DocumentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "prd" => Ok(DocumentKind::Prd),
            "tech-overview" => Ok(DocumentKind::TechOverview),
            "sprint-overview" => Ok(DocumentKind::SprintOverview),
            "sprint" => Ok(DocumentKind::Sprint),
            "freeform" => Ok(DocumentKind::Freeform),
            other => anyhow::bail!(
                "unknown document kind '{}' (expected one of: prd, tech-overview, sprint-overview, sprint, freeform)",
                other
            ),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Feature lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureStatus {
    #[serde(rename = "planned")]
    Planned,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl FeatureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureStatus::Planned => "planned",
            FeatureStatus::InProgress => "in-progress",
            FeatureStatus::Completed => "completed",
            FeatureStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for FeatureStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "planned" => Ok(FeatureStatus::Planned),
            "in-progress" => Ok(FeatureStatus::InProgress),
            "completed" => Ok(FeatureStatus::Completed),
            "cancelled" => Ok(FeatureStatus::Cancelled),
            other => anyhow::bail!(
                "unknown feature status '{}' (expected one of: planned, in-progress, completed, cancelled)",
                other
            ),
        }
    }
}

impl fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sprint lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SprintStatus {
    #[serde(rename = "planned")]
    Planned,
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "done")]
    Done,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl SprintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SprintStatus::Planned => "planned",
            SprintStatus::Active => "active",
            SprintStatus::Done => "done",
            SprintStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for SprintStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "planned" => Ok(SprintStatus::Planned),
            "active" => Ok(SprintStatus::Active),
            "done" => Ok(SprintStatus::Done),
            "cancelled" => Ok(SprintStatus::Cancelled),
            other => anyhow::bail!(
                "unknown sprint status '{}' (expected one of: planned, active, done, cancelled)",
                other
            ),
        }
    }
}

impl fmt::Display for SprintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sort direction for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "asc")]
    Asc,
    #[serde(rename = "desc")]
    Desc,
}

impl FromStr for SortOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => anyhow::bail!("unknown sort order '{}' (expected asc or desc)", other),
        }
    }
}

/// A page size clamped to the [1, 100] contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedLimit {
    inner: u32,
}

impl ValidatedLimit {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 100;
    pub const DEFAULT: u32 = 20;

    pub fn new(limit: u32) -> Result<Self> {
        ensure!(
            (Self::MIN..=Self::MAX).contains(&limit),
            "limit must be between {} and {}",
            Self::MIN,
            Self::MAX
        );
        Ok(Self { inner: limit })
    }

    pub fn get(&self) -> u32 {
        self.inner
    }
}

impl Default for ValidatedLimit {
    fn default() -> Self {
        Self {
            inner: Self::DEFAULT,
        }
    }
}

/// Hook for restricting status transitions on update.
///
/// Every transition between enumeration members is accepted today; installing
/// a policy that returns false turns the transition into a domain-validation
/// failure.
pub trait TransitionPolicy: Send + Sync {
    fn allows(&self, from: &str, to: &str) -> bool;
}

/// Default policy: every transition between enumeration members is legal.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllTransitions;

impl TransitionPolicy for AllowAllTransitions {
    fn allows(&self, _from: &str, _to: &str) -> bool {
        true
    }
}
