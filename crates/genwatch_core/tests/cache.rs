use std::sync::{Arc, Mutex};

use genwatch_core::{
    CacheKey, CacheObserver, CacheStore, CacheTarget, CachedValue, Job, JobId, JobStatus,
};

#[derive(Default)]
struct Recorder {
    keys: Mutex<Vec<CacheKey>>,
}

impl CacheObserver for Recorder {
    fn changed(&self, key: &CacheKey) {
        self.keys.lock().unwrap().push(key.clone());
    }
}

fn history(page: u32) -> CacheKey {
    CacheKey::GenerationHistory { page, limit: 20 }
}

#[test]
fn invalidation_marks_whole_family_stale() {
    let cache = CacheStore::new();
    cache.put(history(1), CachedValue::Jobs(Vec::new()));
    cache.put(history(2), CachedValue::Jobs(Vec::new()));
    cache.put(CacheKey::Transactions, CachedValue::Json(serde_json::json!([])));

    let touched = cache.invalidate(&CacheTarget::GenerationHistory);

    assert_eq!(touched, 2);
    assert!(cache.get(&history(1)).unwrap().stale);
    assert!(cache.get(&history(2)).unwrap().stale);
    assert!(!cache.get(&CacheKey::Transactions).unwrap().stale);
}

#[test]
fn generation_target_matches_only_its_job() {
    let cache = CacheStore::new();
    let job = Job::new(JobId::from("a"), JobStatus::Pending);
    cache.put(CacheKey::Generation(JobId::from("a")), CachedValue::Job(job.clone()));
    cache.put(CacheKey::Generation(JobId::from("b")), CachedValue::Job(job));

    cache.invalidate(&CacheTarget::Generation(JobId::from("a")));

    assert!(cache.get(&CacheKey::Generation(JobId::from("a"))).unwrap().stale);
    assert!(!cache.get(&CacheKey::Generation(JobId::from("b"))).unwrap().stale);
}

#[test]
fn observers_hear_writes_and_invalidations() {
    let cache = CacheStore::new();
    let recorder = Arc::new(Recorder::default());
    cache.subscribe(recorder.clone());

    cache.put(CacheKey::ActiveGeneration, CachedValue::ActiveGeneration(None));
    cache.invalidate(&CacheTarget::ActiveGeneration);

    assert_eq!(
        *recorder.keys.lock().unwrap(),
        vec![CacheKey::ActiveGeneration, CacheKey::ActiveGeneration]
    );
}

#[test]
fn readers_keep_their_snapshot_across_writes() {
    let cache = CacheStore::new();
    let first = Job::new(JobId::from("a"), JobStatus::Pending);
    cache.put(CacheKey::Generation(JobId::from("a")), CachedValue::Job(first.clone()));
    let snapshot = cache.get(&CacheKey::Generation(JobId::from("a"))).unwrap();

    let second = Job::new(JobId::from("a"), JobStatus::Completed);
    cache.put(CacheKey::Generation(JobId::from("a")), CachedValue::Job(second.clone()));

    assert_eq!(*snapshot.value, CachedValue::Job(first));
    assert_eq!(
        *cache.get(&CacheKey::Generation(JobId::from("a"))).unwrap().value,
        CachedValue::Job(second)
    );
}

#[test]
fn fill_that_raced_an_invalidation_is_dropped() {
    let cache = CacheStore::new();
    let seen = cache.version(&history(1));

    cache.invalidate(&CacheTarget::GenerationHistory);

    assert!(!cache.fill(history(1), CachedValue::Jobs(Vec::new()), seen));
    assert!(cache.get(&history(1)).is_none());

    let seen = cache.version(&history(1));
    assert!(cache.fill(history(1), CachedValue::Jobs(Vec::new()), seen));
    assert!(!cache.get(&history(1)).unwrap().stale);
}
