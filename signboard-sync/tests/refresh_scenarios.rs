use chrono::{DateTime, Duration, TimeZone, Utc};
use signboard_core::{
    resolve_index, CacheSnapshot, LiveRegistry, NoticeRecord, RenderableNotice,
};
use signboard_sync::{
    pipeline::load_from_cache_at,
    refresh,
    testing::{Failure, StaticSource},
    FallbackResult, NoticeCache, NoticeSource, RefreshOutcome, SyncError,
};
use tempfile::TempDir;

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()
}

fn record(minute: u32, content: &str) -> NoticeRecord {
    NoticeRecord::new(at(minute), "News", format!("author{minute}"), content)
}

fn records(n: u32) -> Vec<NoticeRecord> {
    (0..n).map(|i| record(i, &format!("notice number {i}"))).collect()
}

fn seeded_registry(n: u32) -> LiveRegistry {
    let registry = LiveRegistry::new();
    registry.replace(
        (0..n)
            .map(|i| RenderableNotice::from_record(&record(59 - i, "previous")))
            .collect(),
    );
    registry
}

async fn run(
    source: &dyn NoticeSource,
    cache: &mut NoticeCache,
    registry: &LiveRegistry,
    max_count: u32,
) -> RefreshOutcome {
    refresh(Some(source), cache, registry, max_count)
        .await
        .expect("refresh with a source never errors")
}

// ---------------------------------------------------------------------------
// Successful pulls
// ---------------------------------------------------------------------------

#[tokio::test]
async fn three_remote_notices_with_max_five_is_a_partial_pull() {
    let home = TempDir::new().unwrap();
    let mut cache = NoticeCache::open_at(home.path()).unwrap();
    let registry = LiveRegistry::new();
    let source = StaticSource::new(records(3));

    let outcome = run(&source, &mut cache, &registry, 5).await;

    let RefreshOutcome::Pulled(report) = outcome else {
        panic!("expected a pull, got {outcome:?}");
    };
    assert_eq!(report.stored, 3);
    assert_eq!(report.available, 3);
    assert!(report.is_degraded());
    assert!(report.cache_saved);
    assert_eq!(registry.len(), 3);
    assert_eq!(source.connect_count(), 1);
    assert_eq!(source.close_count(), 1);
    assert_eq!(source.fetch_limits(), vec![3]);

    let snapshot = NoticeCache::open_at(home.path())
        .unwrap()
        .read_snapshot()
        .unwrap()
        .expect("snapshot written");
    assert_eq!(snapshot.items.len(), 3);
}

#[tokio::test]
async fn stored_count_is_min_of_max_and_total() {
    for (max_count, total) in [(0u32, 4u32), (1, 4), (4, 4), (5, 4), (10, 1), (3, 50)] {
        let home = TempDir::new().unwrap();
        let mut cache = NoticeCache::open_at(home.path()).unwrap();
        let registry = seeded_registry(2);
        let source = StaticSource::new(records(total));

        let outcome = run(&source, &mut cache, &registry, max_count).await;

        assert!(matches!(outcome, RefreshOutcome::Pulled(_)), "{outcome:?}");
        assert_eq!(
            registry.len(),
            max_count.min(total) as usize,
            "max={max_count} total={total}"
        );
    }
}

#[tokio::test]
async fn registry_is_ordered_newest_first() {
    let home = TempDir::new().unwrap();
    let mut cache = NoticeCache::open_at(home.path()).unwrap();
    let registry = LiveRegistry::new();
    let shuffled = vec![record(10, "b"), record(30, "d"), record(5, "a"), record(20, "c")];
    let source = StaticSource::new(shuffled);

    run(&source, &mut cache, &registry, 5).await;

    let headers: Vec<String> = registry
        .snapshot()
        .iter()
        .map(|n| n.line(0).unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        headers,
        ["[News] author30", "[News] author20", "[News] author10", "[News] author5"]
    );

    let cached = cache.read_snapshot().unwrap().unwrap().items;
    for pair in cached.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
}

#[tokio::test]
async fn cache_holds_unconverted_records() {
    let home = TempDir::new().unwrap();
    let mut cache = NoticeCache::open_at(home.path()).unwrap();
    let registry = LiveRegistry::new();
    let long = "this content is much longer than thirty characters";
    let source = StaticSource::new(vec![record(1, long)]);

    run(&source, &mut cache, &registry, 5).await;

    let cached = cache.read_snapshot().unwrap().unwrap();
    assert_eq!(cached.items[0].content, long);
    let shown = registry.get(0).unwrap();
    assert!(shown.lines().iter().all(|line| !line.contains("thirty")));
}

// ---------------------------------------------------------------------------
// Empty remote
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_remote_clears_registry_and_caches_empty_snapshot() {
    let home = TempDir::new().unwrap();
    let mut cache = NoticeCache::open_at(home.path()).unwrap();
    let registry = seeded_registry(4);
    let source = StaticSource::new(vec![]);

    let before = Utc::now().timestamp_millis();
    let outcome = run(&source, &mut cache, &registry, 5).await;

    assert!(matches!(outcome, RefreshOutcome::Emptied { cache_saved: true }));
    assert!(registry.is_empty());
    assert!(source.fetch_limits().is_empty(), "no fetch after a zero count");
    assert_eq!(source.close_count(), 1);
    let snapshot = cache.read_snapshot().unwrap().expect("empty snapshot");
    assert!(snapshot.items.is_empty());
    assert!(snapshot.last_update_ms >= before);
}

// ---------------------------------------------------------------------------
// Failures and cache fallback
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_configuration_touches_nothing() {
    let home = TempDir::new().unwrap();
    let mut cache = NoticeCache::open_at(home.path()).unwrap();
    cache
        .write_snapshot(&CacheSnapshot::new(records(2)))
        .unwrap();
    let registry = seeded_registry(3);

    let err = refresh(None, &mut cache, &registry, 5).await.unwrap_err();

    assert!(matches!(err, SyncError::ConfigurationMissing));
    assert_eq!(registry.len(), 3, "cache must not be consulted");
}

#[tokio::test]
async fn unreachable_remote_loads_hour_old_cache() {
    let home = TempDir::new().unwrap();
    let mut cache = NoticeCache::open_at(home.path()).unwrap();
    let snapshot = CacheSnapshot::taken_at(records(2), Utc::now() - Duration::hours(1));
    cache.write_snapshot(&snapshot).unwrap();
    let written = std::fs::read_to_string(cache.path()).unwrap();
    let registry = seeded_registry(5);

    let outcome = run(&StaticSource::failing(Failure::Unreachable), &mut cache, &registry, 5).await;

    match outcome {
        RefreshOutcome::Fallback {
            cause: SyncError::RemoteUnavailable(_),
            result: FallbackResult::Loaded { count: 2, .. },
        } => {}
        other => panic!("expected cache load, got {other:?}"),
    }
    assert_eq!(registry.len(), 2);
    assert_eq!(
        std::fs::read_to_string(cache.path()).unwrap(),
        written,
        "fallback must not write the cache"
    );
}

#[tokio::test]
async fn unreachable_remote_with_no_cache_leaves_registry_untouched() {
    let home = TempDir::new().unwrap();
    let mut cache = NoticeCache::open_at(home.path()).unwrap();
    let registry = seeded_registry(4);
    let before = registry.snapshot();

    let outcome = run(&StaticSource::failing(Failure::Unreachable), &mut cache, &registry, 5).await;

    assert!(matches!(
        outcome,
        RefreshOutcome::Fallback {
            result: FallbackResult::Rejected(SyncError::CacheStale { .. }),
            ..
        }
    ));
    assert_eq!(registry.snapshot(), before);
}

#[tokio::test]
async fn unreachable_remote_with_fresh_empty_cache_leaves_registry_untouched() {
    let home = TempDir::new().unwrap();
    let mut cache = NoticeCache::open_at(home.path()).unwrap();
    cache
        .write_snapshot(&CacheSnapshot::taken_at(vec![], Utc::now() - Duration::hours(1)))
        .unwrap();
    let registry = seeded_registry(3);
    let before = registry.snapshot();

    let outcome = run(&StaticSource::failing(Failure::Unreachable), &mut cache, &registry, 5).await;

    match &outcome {
        RefreshOutcome::Fallback {
            cause: SyncError::RemoteUnavailable(_),
            result: FallbackResult::Rejected(SyncError::CacheStale { reason }),
        } => assert_eq!(reason, "no cached notices"),
        other => panic!("expected a rejected fallback, got {other:?}"),
    }
    assert!(!outcome.registry_updated());
    assert_eq!(registry.len(), 3);
    assert_eq!(registry.snapshot(), before);
}

#[tokio::test]
async fn driver_failure_also_falls_back() {
    let home = TempDir::new().unwrap();
    let mut cache = NoticeCache::open_at(home.path()).unwrap();
    cache.write_snapshot(&CacheSnapshot::new(records(1))).unwrap();
    let registry = LiveRegistry::new();

    let outcome =
        run(&StaticSource::failing(Failure::DriverMissing), &mut cache, &registry, 5).await;

    assert!(matches!(
        outcome,
        RefreshOutcome::Fallback {
            cause: SyncError::DriverUnavailable(_),
            result: FallbackResult::Loaded { count: 1, .. },
        }
    ));
}

#[tokio::test]
async fn query_failure_mid_pull_keeps_previous_registry_when_cache_is_stale() {
    for failure in [Failure::CountFails, Failure::FetchFails] {
        let home = TempDir::new().unwrap();
        let mut cache = NoticeCache::open_at(home.path()).unwrap();
        cache
            .write_snapshot(&CacheSnapshot::taken_at(
                records(1),
                Utc::now() - Duration::days(2),
            ))
            .unwrap();
        let registry = seeded_registry(3);
        let before = registry.snapshot();
        let source = StaticSource::new(records(6)).with_failure(failure);

        let outcome = run(&source, &mut cache, &registry, 5).await;

        assert!(
            matches!(
                outcome,
                RefreshOutcome::Fallback {
                    cause: SyncError::RemoteQueryFailed(_),
                    result: FallbackResult::Rejected(_),
                }
            ),
            "{failure:?}: {outcome:?}"
        );
        assert_eq!(registry.snapshot(), before, "{failure:?}");
        assert_eq!(source.close_count(), 1, "{failure:?}: session closed after failure");
    }
}

#[tokio::test]
async fn corrupt_cache_is_swallowed() {
    let home = TempDir::new().unwrap();
    let path = signboard_core::config::cache_path_at(home.path());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(
        &path,
        format!(
            r#"{{"lastUpdate":{},"newsItems":"not a list"}}"#,
            Utc::now().timestamp_millis()
        ),
    )
    .unwrap();
    let mut cache = NoticeCache::open(&path).unwrap();
    let registry = seeded_registry(2);

    let outcome = run(&StaticSource::failing(Failure::Unreachable), &mut cache, &registry, 5).await;

    assert!(matches!(
        outcome,
        RefreshOutcome::Fallback {
            result: FallbackResult::Rejected(SyncError::CacheCorrupt(_)),
            ..
        }
    ));
    assert_eq!(registry.len(), 2);
}

#[test]
fn freshness_boundary_is_exactly_one_day() {
    let home = TempDir::new().unwrap();
    let now = DateTime::<Utc>::from_timestamp_millis(1_714_564_800_000).unwrap();
    let day = Duration::hours(24);

    let mut cache = NoticeCache::open_at(home.path()).unwrap();
    cache
        .write_snapshot(&CacheSnapshot::taken_at(
            records(2),
            now - day + Duration::milliseconds(1),
        ))
        .unwrap();
    let registry = LiveRegistry::new();
    assert!(matches!(
        load_from_cache_at(&cache, &registry, now),
        FallbackResult::Loaded { count: 2, .. }
    ));

    cache
        .write_snapshot(&CacheSnapshot::taken_at(
            records(3),
            now - day - Duration::milliseconds(1),
        ))
        .unwrap();
    assert!(matches!(
        load_from_cache_at(&cache, &registry, now),
        FallbackResult::Rejected(SyncError::CacheStale { .. })
    ));
    assert_eq!(registry.len(), 2, "stale cache must not clear the registry");
}

// ---------------------------------------------------------------------------
// Renderer path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn marker_two_resolves_to_second_newest_notice() {
    let home = TempDir::new().unwrap();
    let mut cache = NoticeCache::open_at(home.path()).unwrap();
    let registry = LiveRegistry::new();
    run(&StaticSource::new(records(5)), &mut cache, &registry, 5).await;

    let number = resolve_index(&["[Notice]", "2", "", "SyncSign"]);
    assert_eq!(number, 2);
    let notice = registry.lookup_by_number(number, 5).expect("second notice");
    assert_eq!(notice.line(0), Some("[News] author3"));
}
