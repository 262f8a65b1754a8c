//! End-to-end pagination tests against the in-memory store.
//!
//! Coverage:
//! - the canonical tied-scores walk (votes [100, 90, 90, 80, 70])
//! - duplicate-free, gap-free traversal for every strategy
//! - cursor/strategy binding and malformed-cursor rejection
//! - rising recency window and discussed comment floor
//! - derived-score fallback reachability and degraded-page ranking

mod common;

use chrono::{DateTime, Duration, Utc};
use common::MemoryFeedStore;
use ranked_feed::{
    FeedQueryError, FeedSourceConfig, PaginationConfig, RankableItem, RankedFeedRequest,
    RankedPagePlanner, ScoreModel, SortStrategy,
};
use std::collections::HashSet;
use uuid::Uuid;

/// Cursors carry whole-second timestamps, so fixtures are created on
/// whole-second boundaries too.
fn clip(id: u128, age_hours: i64, votes: i64) -> RankableItem {
    let created =
        DateTime::<Utc>::from_timestamp(Utc::now().timestamp() - age_hours * 3600, 0).unwrap();
    RankableItem {
        id: Uuid::from_u128(id),
        created_at: created,
        vote_score: votes,
        view_count: 0,
        comment_count: 0,
        favorite_count: 0,
        trending_score: None,
        popularity_index: None,
        hot_score: None,
        engagement_count: None,
    }
}

fn planner() -> RankedPagePlanner {
    RankedPagePlanner::new(
        FeedSourceConfig::default(),
        ScoreModel::with_defaults(),
        PaginationConfig::default(),
    )
}

fn request(strategy: SortStrategy, cursor: Option<String>, page_size: i64) -> RankedFeedRequest {
    RankedFeedRequest {
        strategy,
        filter: None,
        cursor,
        page_size,
    }
}

/// Five clips, B and C tied at 90 votes with B created after C. Walking
/// `top` with page size 2 must yield [A, B], [C, D], [E] and stop.
#[tokio::test]
async fn top_walk_with_tied_scores() {
    let a = clip(0xA, 10, 100);
    let b = clip(0xB, 1, 90); // tied with C, created later
    let c = clip(0xC, 5, 90);
    let d = clip(0xD, 3, 80);
    let e = clip(0xE, 2, 70);
    let store = MemoryFeedStore::new(vec![
        e.clone(),
        c.clone(),
        a.clone(),
        d.clone(),
        b.clone(),
    ]);
    let planner = planner();

    let page1 = planner
        .paginate(&store, request(SortStrategy::Top, None, 2))
        .await
        .unwrap();
    assert_eq!(ids(&page1.items), vec![a.id, b.id]);
    let cursor1 = page1.next_cursor.expect("full page mints a cursor");

    let page2 = planner
        .paginate(&store, request(SortStrategy::Top, Some(cursor1), 2))
        .await
        .unwrap();
    assert_eq!(ids(&page2.items), vec![c.id, d.id]);
    let cursor2 = page2.next_cursor.expect("full page mints a cursor");

    let page3 = planner
        .paginate(&store, request(SortStrategy::Top, Some(cursor2), 2))
        .await
        .unwrap();
    assert_eq!(ids(&page3.items), vec![e.id]);
    assert!(page3.next_cursor.is_none(), "short page ends the listing");
}

/// Paging any strategy over a fixed snapshot until the cursor runs out
/// must visit every eligible item exactly once.
#[tokio::test]
async fn traversal_has_no_duplicates_and_no_gaps() {
    let mut items = Vec::new();
    for i in 0..23u128 {
        let mut item = clip(i + 1, (i as i64 * 3) % 40, ((i as i64 * 7) % 13) - 3);
        item.view_count = (i as i64 * 31) % 500;
        // At least one comment so the discussed floor excludes nothing.
        item.comment_count = (i as i64 * 5) % 9 + 1;
        item.favorite_count = (i as i64) % 4;
        item.trending_score = Some(((i as i64 * 11) % 17) as f64);
        item.popularity_index = Some(((i as i64 * 13) % 19) as f64);
        items.push(item);
    }
    let store = MemoryFeedStore::new(items.clone());
    let planner = planner();

    for strategy in SortStrategy::ALL {
        let mut seen = HashSet::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0;

        loop {
            let page = planner
                .paginate(&store, request(strategy, cursor.clone(), 5))
                .await
                .unwrap_or_else(|e| panic!("{strategy}: {e}"));
            for item in &page.items {
                assert!(
                    seen.insert(item.id),
                    "{strategy}: item {} returned twice",
                    item.id
                );
            }
            pages += 1;
            assert!(pages < 50, "{strategy}: runaway pagination");
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        // Every strategy except rising covers the full snapshot; rising
        // only covers items inside its recency window.
        let expected: usize = match strategy {
            SortStrategy::Rising => items
                .iter()
                .filter(|i| Utc::now() - i.created_at < Duration::hours(48))
                .count(),
            _ => items.len(),
        };
        assert_eq!(seen.len(), expected, "{strategy}: gap in traversal");
    }
}

#[tokio::test]
async fn cursor_is_bound_to_its_strategy() {
    let store = MemoryFeedStore::new(vec![clip(1, 1, 10), clip(2, 2, 20)]);
    let planner = planner();

    let page = planner
        .paginate(&store, request(SortStrategy::Top, None, 2))
        .await
        .unwrap();
    let top_cursor = page.next_cursor.unwrap();

    let err = planner
        .paginate(&store, request(SortStrategy::New, Some(top_cursor), 2))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedQueryError::CursorStrategyMismatch { .. }));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn malformed_cursor_is_a_client_error() {
    let store = MemoryFeedStore::new(vec![clip(1, 1, 10)]);
    let err = planner()
        .paginate(
            &store,
            request(SortStrategy::Top, Some("@@not-a-cursor@@".into()), 2),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, FeedQueryError::InvalidCursor(_)));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn discussed_feed_skips_undiscussed_clips() {
    let mut quiet = clip(1, 1, 50);
    quiet.comment_count = 0;
    let mut loud = clip(2, 2, 1);
    loud.comment_count = 7;

    let store = MemoryFeedStore::new(vec![quiet, loud.clone()]);
    let page = planner()
        .paginate(&store, request(SortStrategy::Discussed, None, 10))
        .await
        .unwrap();
    assert_eq!(ids(&page.items), vec![loud.id]);
}

/// A clip whose popularity_index was never materialized must still be
/// reachable through the cursor walk: the keyset compares against its
/// engagement fallback, not against NULL.
#[tokio::test]
async fn popular_walk_includes_clips_without_materialized_index() {
    let mut high = clip(1, 4, 0);
    high.popularity_index = Some(10.0);
    let mut mid = clip(2, 3, 0);
    mid.popularity_index = Some(5.0);
    // No index; engagement proxy is 2 * vote_score = 2.
    let unscored = clip(3, 2, 1);

    let store = MemoryFeedStore::new(vec![unscored.clone(), high.clone(), mid.clone()]);
    let planner = planner();

    let mut visited = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = planner
            .paginate(&store, request(SortStrategy::Popular, cursor, 1))
            .await
            .unwrap();
        visited.extend(ids(&page.items));
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    assert_eq!(visited, vec![high.id, mid.id, unscored.id]);
}

/// Rising must surface the highest-velocity clip first even though its
/// store scan walks the creation-time keyset.
#[tokio::test]
async fn rising_page_orders_by_velocity_not_recency() {
    let fresh_zero = clip(1, 1, 0);
    let mut older_hot = clip(2, 2, 1000);
    older_hot.view_count = 50_000;

    let store = MemoryFeedStore::new(vec![fresh_zero.clone(), older_hot.clone()]);
    let page = planner()
        .paginate(&store, request(SortStrategy::Rising, None, 10))
        .await
        .unwrap();
    assert_eq!(ids(&page.items), vec![older_hot.id, fresh_zero.id]);
}

#[tokio::test]
async fn rising_feed_ignores_stale_clips() {
    let fresh = clip(1, 2, 5);
    let stale = clip(2, 72, 500); // huge score, too old to qualify
    let store = MemoryFeedStore::new(vec![fresh.clone(), stale]);

    let page = planner()
        .paginate(&store, request(SortStrategy::Rising, None, 10))
        .await
        .unwrap();
    assert_eq!(ids(&page.items), vec![fresh.id]);
}

/// An item inserted between page fetches that sorts ahead of the cursor
/// simply lands on an already-consumed page; later pages are unaffected.
#[tokio::test]
async fn concurrent_insert_before_cursor_does_not_disturb_later_pages() {
    let a = clip(0xA, 10, 100);
    let b = clip(0xB, 5, 90);
    let c = clip(0xC, 3, 80);
    let planner = planner();

    let store = MemoryFeedStore::new(vec![a.clone(), b.clone(), c.clone()]);
    let page1 = planner
        .paginate(&store, request(SortStrategy::Top, None, 2))
        .await
        .unwrap();
    assert_eq!(ids(&page1.items), vec![a.id, b.id]);

    // A new high-scoring clip lands while the caller holds the cursor.
    let newcomer = clip(0xF, 0, 500);
    let store = MemoryFeedStore::new(vec![a, b, c.clone(), newcomer]);
    let page2 = planner
        .paginate(
            &store,
            request(SortStrategy::Top, page1.next_cursor, 2),
        )
        .await
        .unwrap();
    assert_eq!(ids(&page2.items), vec![c.id]);
}

fn ids(items: &[RankableItem]) -> Vec<Uuid> {
    items.iter().map(|i| i.id).collect()
}
