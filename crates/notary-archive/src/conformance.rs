//! Behaviour every `ArchiveStore` backend must share; each backend's test
//! module runs these against a fresh instance.

use std::sync::Arc;
use std::thread;

use chrono::{Duration, TimeZone, Utc};
use notary_types::{
    Fingerprint, Identifier, NewArchiveEntry, NewVerification, Timestamp,
};

use crate::error::{ArchiveError, UniqueKey};
use crate::traits::ArchiveStore;

pub(crate) fn at(seconds: i64) -> Timestamp {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap() + Duration::seconds(seconds)
}

pub(crate) fn fingerprint(a: u8, b: u8) -> Fingerprint {
    let mut bytes = [0u8; 32];
    bytes[0] = a;
    bytes[1] = b;
    Fingerprint::from_digest(bytes)
}

pub(crate) fn entry(n: u8, submitted: i64) -> NewArchiveEntry {
    NewArchiveEntry {
        filename: format!("doc-{n}.pdf"),
        fingerprint: fingerprint(n, 0),
        identifier: Identifier::from_topic_number(100_000 + u64::from(n)),
        submitted_at: at(submitted),
        size_bytes: 1024 * u64::from(n),
        file_type: "pdf".into(),
        submitted_by: "alice".into(),
    }
}

fn check(archive_id: Option<i64>, n: u8, outcome: bool) -> NewVerification {
    NewVerification {
        archive_entry_id: archive_id,
        identifier: Identifier::from_topic_number(100_000 + u64::from(n)),
        outcome,
        computed_fingerprint: fingerprint(n, if outcome { 0 } else { 1 }),
        verified_by: "bob".into(),
        verified_at: at(1000 + i64::from(n)),
    }
}

pub(crate) fn insert_and_find(store: &dyn ArchiveStore) {
    let stored = store.insert(entry(1, 0)).unwrap();
    assert!(stored.id > 0);

    let by_id = store
        .find_by_identifier(&stored.identifier)
        .unwrap()
        .expect("entry should be found by identifier");
    assert_eq!(by_id, stored);

    let by_fp = store
        .find_by_fingerprint(&stored.fingerprint)
        .unwrap()
        .expect("entry should be found by fingerprint");
    assert_eq!(by_fp, stored);

    let missing = Identifier::new("0.0.1").unwrap();
    assert!(store.find_by_identifier(&missing).unwrap().is_none());
}

pub(crate) fn duplicate_fingerprint_rejected(store: &dyn ArchiveStore) {
    store.insert(entry(1, 0)).unwrap();

    let mut again = entry(2, 5);
    again.fingerprint = fingerprint(1, 0);
    let err = store.insert(again).unwrap_err();
    assert!(matches!(err, ArchiveError::DuplicateKey(UniqueKey::Fingerprint)));
    assert_eq!(store.list_all().unwrap().len(), 1);
}

pub(crate) fn duplicate_identifier_rejected(store: &dyn ArchiveStore) {
    store.insert(entry(1, 0)).unwrap();

    let mut again = entry(2, 5);
    again.identifier = entry(1, 0).identifier;
    let err = store.insert(again).unwrap_err();
    assert!(matches!(err, ArchiveError::DuplicateKey(UniqueKey::Identifier)));
    assert_eq!(store.stats().unwrap().total_archived, 1);
}

pub(crate) fn list_is_newest_first(store: &dyn ArchiveStore) {
    store.insert(entry(1, 10)).unwrap();
    store.insert(entry(2, 30)).unwrap();
    store.insert(entry(3, 20)).unwrap();
    // Same timestamp as entry 2: higher key sorts first.
    store.insert(entry(4, 30)).unwrap();

    let names: Vec<String> = store
        .list_all()
        .unwrap()
        .into_iter()
        .map(|e| e.filename)
        .collect();
    assert_eq!(names, ["doc-4.pdf", "doc-2.pdf", "doc-3.pdf", "doc-1.pdf"]);
}

pub(crate) fn verifications_and_stats(store: &dyn ArchiveStore) {
    let a = store.insert(entry(1, 0)).unwrap();
    let b = store.insert(entry(2, 1)).unwrap();

    store.record_verification(check(Some(a.id), 1, true)).unwrap();
    store.record_verification(check(Some(a.id), 1, false)).unwrap();
    let last = store.record_verification(check(Some(b.id), 2, true)).unwrap();
    assert_eq!(last.archive_entry_id, Some(b.id));
    assert!(last.outcome);

    let history = store.verifications_for(a.id).unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].outcome);
    assert!(!history[1].outcome);
    assert_eq!(history[0].verified_by, "bob");

    let stats = store.stats().unwrap();
    assert_eq!(stats.total_archived, 2);
    assert_eq!(stats.total_verifications, 3);
    assert_eq!(stats.successful_verifications, 2);
    assert_eq!(stats.total_archived, store.list_all().unwrap().len() as u64);
}

pub(crate) fn unlinked_verification_is_counted(store: &dyn ArchiveStore) {
    let stored = store.record_verification(check(None, 9, false)).unwrap();
    assert_eq!(stored.archive_entry_id, None);
    assert_eq!(stored.identifier.as_str(), "0.0.100009");

    let stats = store.stats().unwrap();
    assert_eq!(stats.total_verifications, 1);
    assert_eq!(stats.successful_verifications, 0);
}

pub(crate) fn verification_for_unknown_archive_rejected(store: &dyn ArchiveStore) {
    let err = store.record_verification(check(Some(42), 1, true)).unwrap_err();
    assert!(matches!(err, ArchiveError::UnknownArchive(42)));
    assert_eq!(store.stats().unwrap().total_verifications, 0);
}

pub(crate) fn concurrent_inserts<S: ArchiveStore + 'static>(store: Arc<S>) {
    let handles: Vec<_> = (0..4u8)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..25u8 {
                    let mut e = entry(i, i64::from(i));
                    e.fingerprint = fingerprint(t, i);
                    e.identifier = Identifier::from_topic_number(u64::from(t) * 1000 + u64::from(i));
                    store.insert(e).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().expect("thread should not panic");
    }

    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 100);
    let mut ids: Vec<i64> = all.iter().map(|e| e.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 100);
    for e in &all {
        assert_eq!(
            store.find_by_fingerprint(&e.fingerprint).unwrap().as_ref(),
            Some(e)
        );
    }
}
