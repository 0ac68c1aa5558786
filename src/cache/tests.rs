//! Contract tests for `CompatCache` over the bundled stores

use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use crate::cache::*;

fn memory_cache(default_timeout: Option<u64>) -> CompatCache {
    CompatCache::new(
        Arc::new(MemoryStore::new()),
        KeyBuilder::default(),
        default_timeout,
    )
}

fn fanout_cache(default_timeout: Option<u64>) -> (TempDir, CompatCache) {
    let dir = tempfile::tempdir().unwrap();
    let store = FanoutStore::open(dir.path(), 4, Duration::from_millis(25), &BTreeMap::new())
        .unwrap();
    let cache = CompatCache::new(Arc::new(store), KeyBuilder::default(), default_timeout);
    (dir, cache)
}

/// Runs a scenario against both stores
macro_rules! both_stores {
    ($name:ident, $default:expr, |$cache:ident| $body:block) => {
        mod $name {
            use super::*;

            #[tokio::test]
            async fn memory() {
                let $cache = memory_cache($default);
                $body
            }

            #[tokio::test]
            async fn fanout() {
                let (_dir, $cache) = fanout_cache($default);
                $body
            }
        }
    };
}

both_stores!(round_trip, Some(300), |cache| {
    for (key, value) in [("a", b"1".to_vec()), ("b", Vec::new()), ("c", vec![0, 255])] {
        assert!(cache.set(key, value.clone(), SetOptions::default().version(4)).await.unwrap());
        assert_eq!(cache.get_value(key, Some(4)).await.unwrap(), Some(value));
    }
});

both_stores!(version_isolation, Some(300), |cache| {
    cache.set("k", b"v1".to_vec(), SetOptions::default().version(1)).await.unwrap();
    cache.set("k", b"v2".to_vec(), SetOptions::default().version(2)).await.unwrap();
    assert_eq!(cache.get_value("k", Some(1)).await.unwrap(), Some(b"v1".to_vec()));
    assert_eq!(cache.get_value("k", Some(2)).await.unwrap(), Some(b"v2".to_vec()));
    assert!(!cache.has_key("k", Some(3)).await.unwrap());
});

both_stores!(zero_timeout_is_immediate_miss, Some(300), |cache| {
    cache
        .set("k", b"v".to_vec(), SetOptions::default().timeout(Timeout::Zero))
        .await
        .unwrap();
    let fetched = cache
        .get("k", Some(b"fallback".to_vec()), GetOptions::default())
        .await
        .unwrap();
    assert_eq!(fetched.unwrap().into_value().unwrap(), b"fallback".to_vec());
    assert!(!cache.has_key("k", None).await.unwrap());
});

both_stores!(zero_default_timeout_is_immediate_miss, Some(0), |cache| {
    cache.set("k", b"v".to_vec(), SetOptions::default()).await.unwrap();
    assert_eq!(cache.get_value("k", None).await.unwrap(), None);
});

both_stores!(never_timeout_has_no_expiration, Some(1), |cache| {
    cache
        .set("k", b"v".to_vec(), SetOptions::default().timeout(Timeout::Never))
        .await
        .unwrap();
    let fetched = cache
        .get("k", None, GetOptions::default().with_expire_time())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched.expire_time, Some(Expiration::Never));
});

both_stores!(add_only_when_absent, Some(300), |cache| {
    assert!(cache.add("k", b"v1".to_vec(), SetOptions::default()).await.unwrap());
    assert!(!cache.add("k", b"v2".to_vec(), SetOptions::default()).await.unwrap());
    assert_eq!(cache.get_value("k", None).await.unwrap(), Some(b"v1".to_vec()));
    // a different version is a different key
    assert!(cache.add("k", b"v3".to_vec(), SetOptions::default().version(2)).await.unwrap());
});

both_stores!(add_replaces_expired_entry, Some(300), |cache| {
    cache
        .set("k", b"old".to_vec(), SetOptions::default().timeout(Timeout::Zero))
        .await
        .unwrap();
    assert!(cache.add("k", b"new".to_vec(), SetOptions::default()).await.unwrap());
    assert_eq!(cache.get_value("k", None).await.unwrap(), Some(b"new".to_vec()));
});

both_stores!(delete_is_idempotent, Some(300), |cache| {
    cache.delete("missing", None).await.unwrap();
    cache.set("k", b"v".to_vec(), SetOptions::default()).await.unwrap();
    cache.delete("k", None).await.unwrap();
    cache.delete("k", None).await.unwrap();
    assert!(!cache.has_key("k", None).await.unwrap());
});

both_stores!(clear_removes_every_version, Some(300), |cache| {
    for version in 1..=3 {
        for key in ["a", "b"] {
            cache
                .set(key, b"v".to_vec(), SetOptions::default().version(version).tag("t"))
                .await
                .unwrap();
        }
    }
    cache.clear().await.unwrap();
    for version in 1..=3 {
        for key in ["a", "b"] {
            assert!(!cache.has_key(key, Some(version)).await.unwrap());
        }
    }
});

both_stores!(metadata_only_when_requested, Some(300), |cache| {
    cache
        .set("k", b"v".to_vec(), SetOptions::default().tag("group"))
        .await
        .unwrap();

    let plain = cache.get("k", None, GetOptions::default()).await.unwrap().unwrap();
    assert_eq!(plain.expire_time, None);
    assert_eq!(plain.tag, None);

    let full = cache
        .get("k", None, GetOptions::default().with_expire_time().with_tag())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(full.expire_time, Some(Expiration::At(_))));
    assert_eq!(full.tag.as_deref(), Some("group"));

    let default = cache
        .get("missing", Some(b"d".to_vec()), GetOptions::default().with_tag())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(default.tag, None);
    assert_eq!(default.into_value().unwrap(), b"d".to_vec());
});

both_stores!(closed_cache_fails_loudly, Some(300), |cache| {
    cache.close().await.unwrap();
    cache.close().await.unwrap();
    assert!(matches!(cache.get_value("k", None).await, Err(CacheError::Closed)));
    assert!(matches!(
        cache.set("k", Vec::new(), SetOptions::default()).await,
        Err(CacheError::Closed)
    ));
    assert!(matches!(cache.has_key("k", None).await, Err(CacheError::Closed)));
});

both_stores!(default_timeout_resolution, Some(120), |cache| {
    cache.set("implicit", b"v".to_vec(), SetOptions::default()).await.unwrap();
    cache
        .set(
            "explicit",
            b"v".to_vec(),
            SetOptions::default().timeout(Timeout::Seconds(120)),
        )
        .await
        .unwrap();

    let options = GetOptions::default().with_expire_time();
    let expire = |fetched: Option<Fetched>| {
        fetched
            .and_then(|f| f.expire_time)
            .and_then(|expire| expire.timestamp())
            .expect("an expiration instant")
    };
    let implicit = expire(cache.get("implicit", None, options).await.unwrap());
    let explicit = expire(cache.get("explicit", None, options).await.unwrap());

    let gap = explicit.duration_since(implicit).abs();
    assert!(gap < jiff::SignedDuration::from_secs(2));
});

both_stores!(concurrent_add_keeps_one_value, Some(300), |cache| {
    let (first, second) = tokio::join!(
        cache.add("k", b"one".to_vec(), SetOptions::default()),
        cache.add("k", b"two".to_vec(), SetOptions::default()),
    );
    assert!(first.unwrap() || second.unwrap());
    let value = cache.get_value("k", None).await.unwrap().unwrap();
    assert!(value == b"one".to_vec() || value == b"two".to_vec());
});

both_stores!(read_flag_streams_values, Some(300), |cache| {
    let reader = Box::new(Cursor::new(b"streamed".to_vec()));
    assert!(cache.set_from_reader("k", reader, SetOptions::default()).await.unwrap());

    let fetched = cache
        .get("k", None, GetOptions::default().with_read())
        .await
        .unwrap()
        .unwrap();
    let FetchedValue::Reader(mut reader) = fetched.value else {
        panic!("expected a reader");
    };
    let mut body = String::new();
    reader.read_to_string(&mut body).unwrap();
    assert_eq!(body, "streamed");

    // without the flag the same entry comes back as bytes
    let plain = cache.get("k", None, GetOptions::default()).await.unwrap().unwrap();
    assert!(matches!(plain.value, FetchedValue::Bytes(ref bytes) if bytes.as_slice() == b"streamed"));

    // a default is returned as given
    let default = cache
        .get("missing", Some(b"d".to_vec()), GetOptions::default().with_read())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(default.value, FetchedValue::Bytes(ref bytes) if bytes.as_slice() == b"d"));

    let empty = Box::new(std::io::empty());
    assert!(!cache.add_from_reader("k", empty, SetOptions::default()).await.unwrap());
    let fresh = Box::new(Cursor::new(b"added".to_vec()));
    assert!(cache.add_from_reader("other", fresh, SetOptions::default()).await.unwrap());
    assert_eq!(cache.get_value("other", None).await.unwrap(), Some(b"added".to_vec()));
});

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_adds_on_one_shard() {
    let dir = tempfile::tempdir().unwrap();
    let store = FanoutStore::open(dir.path(), 1, Duration::from_millis(25), &BTreeMap::new())
        .unwrap();
    let cache = CompatCache::new(Arc::new(store), KeyBuilder::default(), Some(300));

    let tasks = (0..200)
        .map(|i| {
            let cache = cache.clone();
            tokio::spawn(async move {
                let key = format!("k{i}");
                let added = cache.add(&key, vec![i as u8], SetOptions::default()).await?;
                let present = cache.has_key(&key, None).await?;
                Ok::<_, CacheError>((added, present))
            })
        })
        .collect::<Vec<_>>();

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), (true, true));
    }
    cache.close().await.unwrap();
}

#[tokio::test]
async fn test_store_sees_fully_qualified_keys() {
    let cache = CompatCache::new(Arc::new(MemoryStore::new()), KeyBuilder::new("app", 5), None);
    assert_eq!(cache.keys().prefix(), "app");
    assert_eq!(cache.keys().default_version(), 5);
    cache.set("k", b"v".to_vec(), SetOptions::default()).await.unwrap();

    assert!(cache.store().contains("app:5:k").await.unwrap());
    assert!(!cache.store().contains("k").await.unwrap());
}
