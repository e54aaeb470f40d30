//! Core blocking-policy engine for AreaBlock.
//! This crate is the single source of truth for rule resolution, shared by
//! the editor app, the call-directory extension and the message filter.

pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod model;
pub mod phone;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{EngineConfig, AREA_CODE_RULES_KEY, BLOCKED_NUMBERS_KEY};
pub use engine::cache::ClassificationCache;
pub use engine::call_directory::{
    run_call_directory_request, CallDirectoryError, CallDirectorySink, RequestMode,
    RequestOutcome, RequestSummary, SinkRejection,
};
pub use engine::classifier::{
    classify_sender, Classification, FilterAction, MessageClassifier, RecordNumber,
};
pub use engine::enumerator::{enumerate, EnumerationError, EnumerationPlan};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::area_code::{AreaCodeRule, RuleId};
pub use model::blocked_number::{BlockSource, BlockedNumber, BlockedNumberId};
pub use model::policy::PolicySnapshot;
pub use model::{now_epoch_ms, PolicyValidationError};
pub use phone::normalize::{normalize, E164Number, NationalNumber, PhoneError};
pub use repo::policy_repo::{PolicyRepository, RepoError, RepoResult};
pub use service::policy_service::{PolicyService, PolicyServiceError, ServiceResult};
pub use store::{MemoryPolicyStore, PolicyStore, SqlitePolicyStore, StoreError, StoreResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
