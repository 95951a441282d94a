// Entity Services
// One service per domain object, each implementing the shared
// create/get/list/update/delete algorithm against the injected store:
// validate, check the referenced parent, check the natural key, apply the
// domain rules, then persist.

pub mod documents;
pub mod features;
pub mod projects;
pub mod sprints;

pub use documents::DocumentService;
pub use features::FeatureService;
pub use projects::ProjectService;
pub use sprints::SprintService;

use std::sync::Arc;

use crate::contracts::Store;
use crate::types::{AllowAllTransitions, TransitionPolicy};

/// The full service set, built once at startup around a single store handle.
#[derive(Clone)]
pub struct Services {
    pub projects: ProjectService,
    pub documents: DocumentService,
    pub features: FeatureService,
    pub sprints: SprintService,
}

impl Services {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_transition_policy(store, Arc::new(AllowAllTransitions))
    }

    /// Install a custom status-transition policy; the default accepts every
    /// enumeration member.
    pub fn with_transition_policy(
        store: Arc<dyn Store>,
        transitions: Arc<dyn TransitionPolicy>,
    ) -> Self {
        Self {
            projects: ProjectService::new(store.clone()),
            documents: DocumentService::new(store.clone()),
            features: FeatureService::new(store.clone(), transitions.clone()),
            sprints: SprintService::new(store, transitions),
        }
    }
}
