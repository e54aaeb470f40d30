use areablock_core::db::open_db_in_memory;
use areablock_core::{
    AreaCodeRule, BlockSource, Classification, ClassificationCache, FilterAction,
    MemoryPolicyStore, MessageClassifier, PolicyRepository, PolicyService, PolicyStore,
    SqlitePolicyStore, StoreError, StoreResult,
};

const TTL_MS: i64 = 60_000;
const T0: i64 = 1_700_000_000_000;

/// Reads succeed, writes fail.
struct ReadOnlyStore(MemoryPolicyStore);

impl PolicyStore for ReadOnlyStore {
    fn load(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.0.load(key)
    }

    fn save(&self, _key: &str, _value: &[u8]) -> StoreResult<()> {
        Err(StoreError::Unavailable("read-only container".to_string()))
    }
}

struct UnavailableStore;

impl PolicyStore for UnavailableStore {
    fn load(&self, _key: &str) -> StoreResult<Option<Vec<u8>>> {
        Err(StoreError::Unavailable("no container".to_string()))
    }

    fn save(&self, _key: &str, _value: &[u8]) -> StoreResult<()> {
        Err(StoreError::Unavailable("no container".to_string()))
    }
}

fn text_rule(code: &str) -> AreaCodeRule {
    AreaCodeRule::new(code, false, true, 0).unwrap()
}

#[test]
fn blocked_sender_is_junked_and_recorded_once() {
    let conn = open_db_in_memory().unwrap();
    let store = SqlitePolicyStore::new(&conn);
    let repo = PolicyRepository::new(&store);
    repo.save_rules(&[text_rule("206")]).unwrap();

    let mut cache = ClassificationCache::new(TTL_MS);
    let mut classifier = MessageClassifier::new(PolicyRepository::new(&store), &mut cache);

    assert_eq!(classifier.handle(Some("12065551234"), T0), FilterAction::Junk);
    assert_eq!(classifier.handle(Some("12065551234"), T0 + 1), FilterAction::Junk);

    let numbers = repo.load_numbers().unwrap();
    assert_eq!(numbers.len(), 1);
    assert_eq!(numbers[0].national_number.as_str(), "2065551234");
    assert_eq!(numbers[0].area_code, "206");
    assert_eq!(numbers[0].source, BlockSource::Text);
    assert_eq!(numbers[0].blocked_at, T0);
}

#[test]
fn unparseable_sender_is_allowed_without_side_effects() {
    let store = MemoryPolicyStore::new();
    let repo = PolicyRepository::new(&store);
    repo.save_rules(&[text_rule("123")]).unwrap();

    let mut cache = ClassificationCache::new(TTL_MS);
    let mut classifier = MessageClassifier::new(PolicyRepository::new(&store), &mut cache);

    assert_eq!(classifier.classify(Some("123"), T0), Classification::Allow);
    assert_eq!(classifier.handle(Some("123"), T0), FilterAction::Allow);
    assert_eq!(classifier.handle(None, T0), FilterAction::Allow);
    assert!(repo.load_numbers().unwrap().is_empty());
}

#[test]
fn call_only_rules_do_not_block_texts() {
    let store = MemoryPolicyStore::new();
    let repo = PolicyRepository::new(&store);
    repo.save_rules(&[AreaCodeRule::new("206", true, false, 0).unwrap()])
        .unwrap();

    let mut cache = ClassificationCache::new(TTL_MS);
    let mut classifier = MessageClassifier::new(PolicyRepository::new(&store), &mut cache);
    assert_eq!(classifier.handle(Some("2065551234"), T0), FilterAction::Allow);
}

#[test]
fn policy_change_is_observed_only_after_ttl() {
    let store = MemoryPolicyStore::new();
    let service = PolicyService::new(PolicyRepository::new(&store));
    service.add_area_code("206", false, true).unwrap();

    let mut cache = ClassificationCache::new(TTL_MS);
    {
        let mut classifier = MessageClassifier::new(PolicyRepository::new(&store), &mut cache);
        assert_eq!(classifier.handle(Some("4155550100"), T0), FilterAction::Allow);
    }

    service.add_area_code("415", false, true).unwrap();

    let mut classifier = MessageClassifier::new(PolicyRepository::new(&store), &mut cache);
    let stale = classifier.handle(Some("4155550100"), T0 + TTL_MS - 1_000);
    assert_eq!(stale, FilterAction::Allow);

    let fresh = classifier.handle(Some("4155550100"), T0 + TTL_MS + 1_000);
    assert_eq!(fresh, FilterAction::Junk);
}

#[test]
fn record_write_failure_keeps_junk_decision() {
    let inner = MemoryPolicyStore::new();
    PolicyRepository::new(&inner)
        .save_rules(&[text_rule("206")])
        .unwrap();
    let store = ReadOnlyStore(inner);

    let mut cache = ClassificationCache::new(TTL_MS);
    let mut classifier = MessageClassifier::new(PolicyRepository::new(&store), &mut cache);
    assert_eq!(classifier.handle(Some("2065551234"), T0), FilterAction::Junk);
    assert!(PolicyRepository::new(&store.0)
        .load_numbers()
        .unwrap()
        .is_empty());
}

#[test]
fn unavailable_store_fails_open() {
    let mut cache = ClassificationCache::new(TTL_MS);
    let mut classifier = MessageClassifier::new(PolicyRepository::new(UnavailableStore), &mut cache);
    assert_eq!(classifier.handle(Some("2065551234"), T0), FilterAction::Allow);
    assert_eq!(cache.cached_at_ms(), None);
}
