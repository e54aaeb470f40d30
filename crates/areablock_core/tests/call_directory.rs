use areablock_core::{
    normalize, run_call_directory_request, AreaCodeRule, BlockSource, CallDirectoryError,
    CallDirectorySink, E164Number, EngineConfig, EnumerationError, MemoryPolicyStore,
    PolicyRepository, PolicySnapshot, PolicyStore, RequestMode, RequestOutcome, SinkRejection,
    StoreError, StoreResult,
};

/// Host double that enforces the ascending contract the real host applies.
#[derive(Default)]
struct RecordingSink {
    entries: Vec<E164Number>,
    resets: usize,
    batches: usize,
    reject_after: Option<usize>,
}

impl CallDirectorySink for RecordingSink {
    fn remove_all_entries(&mut self) -> Result<(), SinkRejection> {
        self.entries.clear();
        self.resets += 1;
        Ok(())
    }

    fn add_blocking_entry(&mut self, number: E164Number) -> Result<(), SinkRejection> {
        if self.reject_after == Some(self.entries.len()) {
            return Err(SinkRejection("maximum entries reached".to_string()));
        }
        if let Some(last) = self.entries.last() {
            if number <= *last {
                return Err(SinkRejection(format!("{number} out of order")));
            }
        }
        self.entries.push(number);
        Ok(())
    }

    fn batch_completed(&mut self, _emitted: u64) -> Result<(), SinkRejection> {
        self.batches += 1;
        Ok(())
    }
}

struct UnavailableStore;

impl PolicyStore for UnavailableStore {
    fn load(&self, _key: &str) -> StoreResult<Option<Vec<u8>>> {
        Err(StoreError::Unavailable("app group container missing".to_string()))
    }

    fn save(&self, _key: &str, _value: &[u8]) -> StoreResult<()> {
        Err(StoreError::Unavailable("app group container missing".to_string()))
    }
}

fn small_config() -> EngineConfig {
    EngineConfig {
        batch_size: 2,
        ..EngineConfig::default()
    }
}

fn repo_with_numbers(raws: &[&str]) -> PolicyRepository<MemoryPolicyStore> {
    let snapshot = raws.iter().fold(PolicySnapshot::default(), |snapshot, raw| {
        snapshot
            .add_number(&normalize(raw).unwrap(), BlockSource::Manual, 0)
            .0
    });
    let repo = PolicyRepository::new(MemoryPolicyStore::new());
    repo.save_snapshot(&snapshot).unwrap();
    repo
}

#[test]
fn full_request_emits_every_entry_in_batches() {
    let repo = repo_with_numbers(&["3125550100", "2125550100", "4155550100"]);
    let mut sink = RecordingSink::default();

    let summary =
        run_call_directory_request(&repo, &mut sink, RequestMode::Full, &small_config()).unwrap();

    assert_eq!(summary.outcome, RequestOutcome::Completed);
    assert_eq!(summary.entries_emitted, 3);
    assert_eq!(summary.single_numbers, 3);
    assert_eq!(sink.resets, 0);
    assert_eq!(sink.batches, 2);
    assert_eq!(
        sink.entries,
        vec![12_125_550_100, 13_125_550_100, 14_155_550_100]
    );
}

#[test]
fn incremental_request_resets_then_reloads_everything() {
    let repo = repo_with_numbers(&["2125550100"]);
    let mut sink = RecordingSink {
        entries: vec![10_000_000_001, 19_999_999_999],
        ..RecordingSink::default()
    };

    let summary =
        run_call_directory_request(&repo, &mut sink, RequestMode::Incremental, &small_config())
            .unwrap();

    assert_eq!(summary.mode, RequestMode::Incremental);
    assert_eq!(sink.resets, 1);
    assert_eq!(sink.entries, vec![12_125_550_100]);
}

#[test]
fn store_failure_completes_without_entries() {
    let repo = PolicyRepository::new(UnavailableStore);
    let mut sink = RecordingSink::default();

    let summary =
        run_call_directory_request(&repo, &mut sink, RequestMode::Full, &small_config()).unwrap();

    assert_eq!(summary.outcome, RequestOutcome::StoreUnavailable);
    assert_eq!(summary.entries_emitted, 0);
    assert!(sink.entries.is_empty());
}

#[test]
fn host_rejection_is_fatal_for_the_request() {
    let repo = repo_with_numbers(&["3125550100", "2125550100", "4155550100"]);
    let mut sink = RecordingSink {
        reject_after: Some(2),
        ..RecordingSink::default()
    };

    let err = run_call_directory_request(&repo, &mut sink, RequestMode::Full, &small_config())
        .unwrap_err();
    match err {
        CallDirectoryError::ProviderRejected { emitted, reason } => {
            assert_eq!(emitted, 2);
            assert_eq!(reason.0, "maximum entries reached");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn budget_overflow_fails_before_touching_the_host() {
    let repo = PolicyRepository::new(MemoryPolicyStore::new());
    repo.save_rules(&[
        AreaCodeRule::new("206", true, false, 0).unwrap(),
        AreaCodeRule::new("212", true, false, 0).unwrap(),
    ])
    .unwrap();
    let config = EngineConfig {
        max_entries: 15_000_000,
        ..EngineConfig::default()
    };
    let mut sink = RecordingSink {
        entries: vec![12_125_550_100],
        ..RecordingSink::default()
    };

    let err = run_call_directory_request(&repo, &mut sink, RequestMode::Incremental, &config)
        .unwrap_err();
    assert_eq!(
        err,
        CallDirectoryError::Enumeration(EnumerationError::BudgetExceeded {
            required: 20_000_000,
            budget: 15_000_000,
        })
    );
    assert_eq!(sink.resets, 0);
    assert_eq!(sink.entries, vec![12_125_550_100]);
}

#[test]
fn invalid_config_is_rejected() {
    let repo = PolicyRepository::new(MemoryPolicyStore::new());
    let mut sink = RecordingSink::default();
    let config = EngineConfig {
        batch_size: 0,
        ..EngineConfig::default()
    };
    let err = run_call_directory_request(&repo, &mut sink, RequestMode::Full, &config)
        .unwrap_err();
    assert!(matches!(err, CallDirectoryError::Config(_)));
}

#[test]
fn request_modes_parse_from_host_strings() {
    assert_eq!(RequestMode::parse("full"), Some(RequestMode::Full));
    assert_eq!(RequestMode::parse(" Incremental "), Some(RequestMode::Incremental));
    assert_eq!(RequestMode::parse("partial"), None);
    assert_eq!(RequestMode::Incremental.as_str(), "incremental");
}
