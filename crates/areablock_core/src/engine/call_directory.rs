//! Call-directory request driver.
//!
//! # Responsibility
//! - Run one host request end to end: read the snapshot once, plan, then feed
//!   the sink in ascending batches.
//! - Map store, budget and host failures to the documented outcomes.
//!
//! # Invariants
//! - `add_blocking_entry` is only ever called with strictly ascending values.
//! - Nothing is added when the plan exceeds the budget.
//! - Incremental requests reset the host list and re-emit everything.

use crate::config::{ConfigError, EngineConfig};
use crate::engine::enumerator::{enumerate, EnumerationError};
use crate::phone::normalize::E164Number;
use crate::repo::policy_repo::PolicyRepository;
use crate::store::PolicyStore;
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// How the host asked for the entry list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Host list starts empty.
    Full,
    /// Host keeps its previous list; treated as reset plus full reload.
    Incremental,
}

impl RequestMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
        }
    }

    /// Parses `full` or `incremental`, ignoring case and surrounding blanks.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "full" => Some(Self::Full),
            "incremental" => Some(Self::Incremental),
            _ => None,
        }
    }
}

/// Host-side refusal of one sink call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkRejection(pub String);

impl Display for SinkRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for SinkRejection {}

/// Call-blocking host contract.
pub trait CallDirectorySink {
    /// Drops every entry the host holds from previous requests.
    fn remove_all_entries(&mut self) -> Result<(), SinkRejection>;

    /// Appends the next entry; must be greater than the previous one.
    fn add_blocking_entry(&mut self, number: E164Number) -> Result<(), SinkRejection>;

    /// Called after each batch; hosts with time budgets can yield here.
    fn batch_completed(&mut self, _emitted: u64) -> Result<(), SinkRejection> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallDirectoryError {
    Config(ConfigError),
    Enumeration(EnumerationError),
    /// Host refused a call; the request is dead and must be rerun from zero.
    ProviderRejected { emitted: u64, reason: SinkRejection },
    /// Internal ordering violation caught before reaching the host.
    OutOfOrder {
        previous: E164Number,
        next: E164Number,
    },
}

impl Display for CallDirectoryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Enumeration(err) => write!(f, "{err}"),
            Self::ProviderRejected { emitted, reason } => write!(
                f,
                "call-directory host rejected the request after {emitted} entries: {reason}"
            ),
            Self::OutOfOrder { previous, next } => {
                write!(f, "entry {next} does not follow {previous} in ascending order")
            }
        }
    }
}

impl Error for CallDirectoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Enumeration(err) => Some(err),
            Self::ProviderRejected { reason, .. } => Some(reason),
            Self::OutOfOrder { .. } => None,
        }
    }
}

impl From<EnumerationError> for CallDirectoryError {
    fn from(value: EnumerationError) -> Self {
        Self::Enumeration(value)
    }
}

impl From<ConfigError> for CallDirectoryError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

/// How a successful request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Completed,
    /// Store could not be read; completed with no entries.
    StoreUnavailable,
}

/// Result metadata for one completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSummary {
    pub mode: RequestMode,
    pub outcome: RequestOutcome,
    pub area_codes: usize,
    pub single_numbers: usize,
    pub entries_emitted: u64,
}

/// Runs one call-directory request against `sink`.
///
/// # Errors
/// - `Enumeration` when the plan exceeds `config.max_entries`; no sink call
///   has been made.
/// - `ProviderRejected` when the host refuses any call.
pub fn run_call_directory_request<S: PolicyStore, K: CallDirectorySink + ?Sized>(
    repo: &PolicyRepository<S>,
    sink: &mut K,
    mode: RequestMode,
    config: &EngineConfig,
) -> Result<RequestSummary, CallDirectoryError> {
    config.validate()?;
    let started_at = Instant::now();
    info!(
        "event=call_directory_request module=engine status=start mode={}",
        mode.as_str()
    );

    let snapshot = match repo.load_snapshot() {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            warn!(
                "event=call_directory_request module=engine status=degraded mode={} error_code=store_unavailable error={err}",
                mode.as_str()
            );
            None
        }
    };

    let plan = match &snapshot {
        Some(snapshot) => match enumerate(snapshot, config) {
            Ok(plan) => Some(plan),
            Err(err) => {
                error!(
                    "event=call_directory_request module=engine status=error mode={} error_code=budget_exceeded error={err}",
                    mode.as_str()
                );
                return Err(err.into());
            }
        },
        None => None,
    };

    if mode == RequestMode::Incremental {
        sink.remove_all_entries()
            .map_err(|reason| rejected(mode, 0, reason))?;
    }

    let Some(plan) = plan else {
        return Ok(RequestSummary {
            mode,
            outcome: RequestOutcome::StoreUnavailable,
            area_codes: 0,
            single_numbers: 0,
            entries_emitted: 0,
        });
    };

    let mut emitted: u64 = 0;
    let mut previous: Option<E164Number> = None;
    for batch in plan.batches(config.batch_size) {
        for number in batch {
            if let Some(previous) = previous {
                if number <= previous {
                    error!(
                        "event=call_directory_request module=engine status=error mode={} error_code=out_of_order emitted={emitted}",
                        mode.as_str()
                    );
                    return Err(CallDirectoryError::OutOfOrder {
                        previous,
                        next: number,
                    });
                }
            }
            sink.add_blocking_entry(number)
                .map_err(|reason| rejected(mode, emitted, reason))?;
            previous = Some(number);
            emitted += 1;
        }
        sink.batch_completed(emitted)
            .map_err(|reason| rejected(mode, emitted, reason))?;
        debug!("event=call_directory_batch module=engine status=ok emitted={emitted}");
    }

    info!(
        "event=call_directory_request module=engine status=ok mode={} area_codes={} single_numbers={} entries={emitted} duration_ms={}",
        mode.as_str(),
        plan.area_codes().len(),
        plan.single_numbers().len(),
        started_at.elapsed().as_millis()
    );

    Ok(RequestSummary {
        mode,
        outcome: RequestOutcome::Completed,
        area_codes: plan.area_codes().len(),
        single_numbers: plan.single_numbers().len(),
        entries_emitted: emitted,
    })
}

fn rejected(mode: RequestMode, emitted: u64, reason: SinkRejection) -> CallDirectoryError {
    error!(
        "event=call_directory_request module=engine status=error mode={} error_code=provider_rejected emitted={emitted} error={reason}",
        mode.as_str()
    );
    CallDirectoryError::ProviderRejected { emitted, reason }
}
