//! FFI use-case API for the editor app and the blocking extensions.
//!
//! # Responsibility
//! - Expose stable, use-case-level functions to the host via FRB.
//! - Translate core errors into envelopes the UI can render directly.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Message classification always answers; any failure answers `allow`.

use areablock_core::config::DEFAULT_TEXT_CACHE_TTL_MS;
use areablock_core::db::open_db;
use areablock_core::{
    core_version as core_version_inner, enumerate, init_logging as init_logging_inner,
    now_epoch_ms, ping as ping_inner, AreaCodeRule, BlockSource, BlockedNumber,
    ClassificationCache, EngineConfig, FilterAction, MessageClassifier, PolicyRepository,
    PolicyService, PolicyServiceError, RequestMode, SqlitePolicyStore,
};
use log::warn;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use uuid::Uuid;

const POLICY_DB_FILE_NAME: &str = "areablock_policy.sqlite3";
static POLICY_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

// Survives between filter invocations while the extension process is alive.
static MESSAGE_FILTER_CACHE: Mutex<ClassificationCache> =
    Mutex::new(ClassificationCache::new(DEFAULT_TEXT_CACHE_TTL_MS));

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes core logging once per process.
///
/// Returns an empty string on success and an error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One area-code rule as shown in the editor list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaCodeItem {
    pub id: String,
    pub code: String,
    pub block_calls: bool,
    pub block_texts: bool,
    pub created_at_ms: i64,
}

/// One individually blocked number as shown in the blocked-numbers list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedNumberItem {
    pub id: String,
    /// Ten digits without country code.
    pub national_number: String,
    /// `(NPA) NXX-XXXX` display form.
    pub formatted: String,
    pub area_code: String,
    /// `call|text|manual`.
    pub source: String,
    pub blocked_at_ms: i64,
}

/// List envelope for the area-code editor view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaCodeListResponse {
    pub ok: bool,
    pub items: Vec<AreaCodeItem>,
    pub message: String,
}

/// List envelope for the blocked-numbers view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedNumberListResponse {
    pub ok: bool,
    pub items: Vec<BlockedNumberItem>,
    pub message: String,
}

/// Generic action envelope for editor mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyActionResponse {
    pub ok: bool,
    /// Id of the created or updated record, when there is one.
    pub id: Option<String>,
    pub message: String,
}

impl PolicyActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

/// Size of the call-directory expansion for the current policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallDirectorySummary {
    pub ok: bool,
    pub area_codes: u32,
    pub single_numbers: u32,
    pub total_entries: u64,
    pub message: String,
}

/// Lists rules sorted by code.
#[flutter_rust_bridge::frb(sync)]
pub fn area_codes_list() -> AreaCodeListResponse {
    let (ok, items, message) = list_response(
        with_policy_service(|service| service.list_area_codes()),
        to_area_code_item,
        "area_codes_list",
    );
    AreaCodeListResponse { ok, items, message }
}

/// Adds a rule; rejects malformed codes, duplicates and rules blocking nothing.
#[flutter_rust_bridge::frb(sync)]
pub fn area_code_add(code: String, block_calls: bool, block_texts: bool) -> PolicyActionResponse {
    match with_policy_service(|service| service.add_area_code(&code, block_calls, block_texts)) {
        Ok(rule) => PolicyActionResponse::success(
            format!("Area code {} added.", rule.code),
            Some(rule.id.to_string()),
        ),
        Err(err) => PolicyActionResponse::failure(format!("area_code_add failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn area_code_remove(id: String) -> PolicyActionResponse {
    rule_action("area_code_remove", &id, |service, id| {
        service.remove_area_code(id).map(|()| None)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn area_code_toggle_calls(id: String) -> PolicyActionResponse {
    rule_action("area_code_toggle_calls", &id, |service, id| {
        service.toggle_calls(id).map(Some)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn area_code_toggle_texts(id: String) -> PolicyActionResponse {
    rule_action("area_code_toggle_texts", &id, |service, id| {
        service.toggle_texts(id).map(Some)
    })
}

/// Lists blocked numbers, most recent first.
#[flutter_rust_bridge::frb(sync)]
pub fn blocked_numbers_list() -> BlockedNumberListResponse {
    let (ok, items, message) = list_response(
        with_policy_service(|service| service.list_blocked_numbers()),
        to_blocked_number_item,
        "blocked_numbers_list",
    );
    BlockedNumberListResponse { ok, items, message }
}

/// Manually blocks one number; repeated calls for the same number are no-ops.
#[flutter_rust_bridge::frb(sync)]
pub fn blocked_number_add(raw: String) -> PolicyActionResponse {
    match with_policy_service(|service| service.block_number(&raw, BlockSource::Manual)) {
        Ok((number, true)) => PolicyActionResponse::success(
            format!("{} blocked.", number.national_number.formatted()),
            Some(number.id.to_string()),
        ),
        Ok((number, false)) => PolicyActionResponse::success(
            format!("{} was already blocked.", number.national_number.formatted()),
            Some(number.id.to_string()),
        ),
        Err(err) => PolicyActionResponse::failure(format!("blocked_number_add failed: {err}")),
    }
}

/// Removes one blocked number; unknown ids succeed without changes.
#[flutter_rust_bridge::frb(sync)]
pub fn blocked_number_remove(id: String) -> PolicyActionResponse {
    let Ok(number_id) = Uuid::parse_str(id.trim()) else {
        return PolicyActionResponse::failure(format!("blocked_number_remove failed: invalid id `{id}`"));
    };
    match with_policy_service(|service| service.remove_blocked_number(number_id)) {
        Ok(()) => PolicyActionResponse::success("Number removed.", None),
        Err(err) => PolicyActionResponse::failure(format!("blocked_number_remove failed: {err}")),
    }
}

/// Drops every individually blocked number; area-code rules stay.
#[flutter_rust_bridge::frb(sync)]
pub fn blocked_numbers_clear() -> PolicyActionResponse {
    match with_policy_service(|service| service.clear_blocked_numbers()) {
        Ok(()) => PolicyActionResponse::success("Blocked numbers cleared.", None),
        Err(err) => PolicyActionResponse::failure(format!("blocked_numbers_clear failed: {err}")),
    }
}

/// Drops every rule and every blocked number.
#[flutter_rust_bridge::frb(sync)]
pub fn policy_clear_all() -> PolicyActionResponse {
    match with_policy_service(|service| service.clear_all()) {
        Ok(()) => PolicyActionResponse::success("Policy cleared.", None),
        Err(err) => PolicyActionResponse::failure(format!("policy_clear_all failed: {err}")),
    }
}

/// One page of the ascending call-directory entry stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallDirectoryBatch {
    pub ok: bool,
    /// Host must drop every previously loaded entry before adding these.
    pub reset: bool,
    /// E.164 integers, strictly ascending and above every earlier batch.
    pub entries: Vec<u64>,
    /// No further batch follows this one.
    pub done: bool,
    pub message: String,
}

/// Returns batch `batch_index` of the call-directory entry stream.
///
/// `mode` is `full` or `incremental`. Batch 0 of an incremental request
/// carries `reset = true`. The policy is re-read on every call, so a host
/// that sees an edit mid-stream must restart from batch 0. An unreadable
/// store yields an empty final batch.
#[flutter_rust_bridge::frb(sync)]
pub fn call_directory_batch(mode: String, batch_index: u32) -> CallDirectoryBatch {
    let Some(mode) = RequestMode::parse(&mode) else {
        return CallDirectoryBatch {
            ok: false,
            reset: false,
            entries: Vec::new(),
            done: true,
            message: format!("call_directory_batch failed: unknown mode `{mode}`"),
        };
    };
    let reset = mode == RequestMode::Incremental && batch_index == 0;
    let config = EngineConfig::default();
    let index = usize::try_from(batch_index).unwrap_or(usize::MAX);

    let snapshot = match with_policy_service(|service| {
        service
            .repository()
            .load_snapshot()
            .map_err(PolicyServiceError::from)
    }) {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!(
                "event=call_directory_batch module=ffi status=degraded error_code=store_unavailable mode={} error={err}",
                mode.as_str()
            );
            return CallDirectoryBatch {
                ok: true,
                reset,
                entries: Vec::new(),
                done: true,
                message: "Policy unavailable; nothing to block.".to_string(),
            };
        }
    };

    match enumerate(&snapshot, &config) {
        Ok(plan) => {
            let entries = plan.batch(index, config.batch_size);
            let emitted_through = (index as u64)
                .saturating_mul(config.batch_size as u64)
                .saturating_add(entries.len() as u64);
            let done = emitted_through >= plan.total_entries();
            CallDirectoryBatch {
                ok: true,
                reset,
                message: format!("{} entries.", entries.len()),
                entries,
                done,
            }
        }
        Err(err) => CallDirectoryBatch {
            ok: false,
            reset: false,
            entries: Vec::new(),
            done: true,
            message: format!("call_directory_batch failed: {err}"),
        },
    }
}

/// Reports how many call-directory entries the current policy expands to.
#[flutter_rust_bridge::frb(sync)]
pub fn call_directory_summary() -> CallDirectorySummary {
    let failure = |message: String| CallDirectorySummary {
        ok: false,
        area_codes: 0,
        single_numbers: 0,
        total_entries: 0,
        message,
    };

    let snapshot = match with_policy_service(|service| {
        service
            .repository()
            .load_snapshot()
            .map_err(PolicyServiceError::from)
    }) {
        Ok(snapshot) => snapshot,
        Err(err) => return failure(format!("call_directory_summary failed: {err}")),
    };

    match enumerate(&snapshot, &EngineConfig::default()) {
        Ok(plan) => CallDirectorySummary {
            ok: true,
            area_codes: saturating_u32(plan.area_codes().len()),
            single_numbers: saturating_u32(plan.single_numbers().len()),
            total_entries: plan.total_entries(),
            message: format!("{} entries.", plan.total_entries()),
        },
        Err(err) => failure(format!("call_directory_summary failed: {err}")),
    }
}

/// Classifies one inbound message sender for the message-filter extension.
///
/// Returns `allow` or `junk`. Message bodies are not inspected.
#[flutter_rust_bridge::frb(sync)]
pub fn message_filter_classify(sender: Option<String>) -> String {
    let conn = match open_db(resolve_policy_db_path()) {
        Ok(conn) => conn,
        Err(err) => {
            warn!("event=classify module=ffi status=degraded error_code=db_open_failed error={err}");
            return FilterAction::Allow.as_str().to_string();
        }
    };

    let mut cache = MESSAGE_FILTER_CACHE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let store = SqlitePolicyStore::new(&conn);
    let mut classifier = MessageClassifier::new(PolicyRepository::new(store), &mut cache);
    classifier
        .handle(sender.as_deref(), now_epoch_ms())
        .as_str()
        .to_string()
}

fn resolve_policy_db_path() -> PathBuf {
    POLICY_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("AREABLOCK_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(POLICY_DB_FILE_NAME)
        })
        .clone()
}

fn with_policy_service<T>(
    f: impl FnOnce(&PolicyService<SqlitePolicyStore<'_>>) -> Result<T, PolicyServiceError>,
) -> Result<T, String> {
    let conn = open_db(resolve_policy_db_path())
        .map_err(|err| format!("policy DB open failed: {err}"))?;
    let service = PolicyService::new(PolicyRepository::new(SqlitePolicyStore::new(&conn)));
    f(&service).map_err(|err| err.to_string())
}

fn rule_action(
    name: &str,
    id: &str,
    f: impl FnOnce(
        &PolicyService<SqlitePolicyStore<'_>>,
        Uuid,
    ) -> Result<Option<AreaCodeRule>, PolicyServiceError>,
) -> PolicyActionResponse {
    let Ok(rule_id) = Uuid::parse_str(id.trim()) else {
        return PolicyActionResponse::failure(format!("{name} failed: invalid id `{id}`"));
    };
    match with_policy_service(|service| f(service, rule_id)) {
        Ok(Some(rule)) => PolicyActionResponse::success(
            format!(
                "Area code {}: calls {}, texts {}.",
                rule.code,
                channel_label(rule.block_calls),
                channel_label(rule.block_texts)
            ),
            Some(rule.id.to_string()),
        ),
        Ok(None) => PolicyActionResponse::success("Area code removed.", None),
        Err(err) => PolicyActionResponse::failure(format!("{name} failed: {err}")),
    }
}

fn list_response<R, T>(
    result: Result<Vec<R>, String>,
    map: impl Fn(R) -> T,
    name: &str,
) -> (bool, Vec<T>, String) {
    match result {
        Ok(records) => {
            let items = records.into_iter().map(map).collect::<Vec<_>>();
            let message = if items.is_empty() {
                "Nothing blocked.".to_string()
            } else {
                format!("{} item(s).", items.len())
            };
            (true, items, message)
        }
        Err(err) => (false, Vec::new(), format!("{name} failed: {err}")),
    }
}

fn to_area_code_item(rule: AreaCodeRule) -> AreaCodeItem {
    AreaCodeItem {
        id: rule.id.to_string(),
        code: rule.code,
        block_calls: rule.block_calls,
        block_texts: rule.block_texts,
        created_at_ms: rule.created_at,
    }
}

fn to_blocked_number_item(number: BlockedNumber) -> BlockedNumberItem {
    BlockedNumberItem {
        id: number.id.to_string(),
        formatted: number.national_number.formatted(),
        national_number: number.national_number.to_string(),
        area_code: number.area_code,
        source: number.source.as_str().to_string(),
        blocked_at_ms: number.blocked_at,
    }
}

fn channel_label(blocked: bool) -> &'static str {
    if blocked {
        "blocked"
    } else {
        "allowed"
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
