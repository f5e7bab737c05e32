//! Row buffer behaviour against a scripted source

mod common;

use std::sync::Arc;

use common::{Call, ScriptedSource};
use ledgerscope::pager::{LoadOutcome, NavError, Operator, RowBuffer, SortOrder, Window};

fn buffer(source: &Arc<ScriptedSource>, page_size: usize, max_limit: usize) -> RowBuffer<ScriptedSource> {
    RowBuffer::new(Arc::clone(source), page_size, max_limit)
}

fn assert_start_in_bounds(window: &Window<u64>) {
    assert!(
        window.start_index <= window.rows.len(),
        "start_index {} beyond {} rows",
        window.start_index,
        window.rows.len()
    );
}

#[tokio::test]
async fn test_end_to_end_paging_over_23_rows() {
    let source = ScriptedSource::with_rows(23);
    let buffer = buffer(&source, 10, 50);

    let outcome = buffer.move_to_page(1, None).await.unwrap();
    assert_eq!(outcome, LoadOutcome::Committed);
    assert_eq!(buffer.page_rows(), (14..=23).rev().collect::<Vec<_>>());
    assert!(!buffer.window().drained);

    buffer.move_to_page(3, None).await.unwrap();
    let window = buffer.window();
    assert_eq!(window.rows, (1..=23).rev().collect::<Vec<_>>());
    assert!(window.drained);
    assert_eq!(window.start_index, 20);
    assert_eq!(window.page_rows(), &[3, 2, 1]);
    assert_eq!(window.current_page(), 3);
    assert_eq!(window.total_row_count(50), 23);
}

#[tokio::test]
async fn test_move_is_idempotent() {
    let source = ScriptedSource::with_rows(40);
    let buffer = buffer(&source, 10, 50);

    buffer.move_to_page(2, None).await.unwrap();
    let first = buffer.window();
    buffer.move_to_page(2, None).await.unwrap();
    assert_eq!(buffer.window(), first);
}

#[tokio::test]
async fn test_abort_discards_in_flight_load() {
    let source = ScriptedSource::with_rows(23);
    let buffer = Arc::new(buffer(&source, 10, 50));
    buffer.move_to_page(1, None).await.unwrap();
    let before = buffer.window();

    source.close_gate();
    let task = {
        let buffer = Arc::clone(&buffer);
        tokio::spawn(async move { buffer.move_to_page(2, None).await })
    };
    while source.calls().len() < 2 {
        tokio::task::yield_now().await;
    }

    buffer.abort();
    source.release(1);
    let outcome = task.await.unwrap().unwrap();

    assert_eq!(outcome, LoadOutcome::Discarded);
    assert_eq!(buffer.window(), before);
    assert_eq!(buffer.discarded_count(), 1);
}

#[tokio::test]
async fn test_later_move_wins_over_earlier_one() {
    let source = ScriptedSource::with_rows(60);
    let buffer = Arc::new(buffer(&source, 10, 50));
    buffer.move_to_page(1, None).await.unwrap();

    source.close_gate();
    let slow = {
        let buffer = Arc::clone(&buffer);
        tokio::spawn(async move { buffer.move_to_page(3, None).await })
    };
    while source.calls().len() < 2 {
        tokio::task::yield_now().await;
    }

    // a newer intent, no network needed
    buffer.abort();
    let outcome = buffer.move_to_page(1, None).await.unwrap();
    assert_eq!(outcome, LoadOutcome::Committed);

    source.release(1);
    assert_eq!(slow.await.unwrap().unwrap(), LoadOutcome::Discarded);
    assert_eq!(buffer.window().current_page(), 1);
    assert_eq!(buffer.page_rows().first(), Some(&60));
}

#[tokio::test]
async fn test_page_beyond_row_range_is_rejected() {
    let source = ScriptedSource::with_rows(23);
    let buffer = buffer(&source, 10, 50);
    buffer.move_to_page(1, None).await.unwrap();
    let before = buffer.window();

    let err = buffer.move_to_page(usize::MAX, None).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<NavError>(),
        Some(&NavError::InvalidPage(usize::MAX.to_string()))
    );
    let err = buffer.move_to_page(usize::MAX, Some(&18)).await.unwrap_err();
    assert!(err.downcast_ref::<NavError>().is_some());

    assert_eq!(buffer.window(), before);
    assert_eq!(source.calls().len(), 1);
}

#[tokio::test]
async fn test_total_row_count_grows_until_drained() {
    let source = ScriptedSource::with_rows(47);
    let buffer = buffer(&source, 10, 50);

    let mut totals = Vec::new();
    for page in 1..=5 {
        buffer.move_to_page(page, None).await.unwrap();
        let window = buffer.window();
        assert_start_in_bounds(&window);
        totals.push((window.total_row_count(20), window.drained));
    }

    let undrained: Vec<usize> = totals
        .iter()
        .filter(|(_, drained)| !drained)
        .map(|(total, _)| *total)
        .collect();
    assert!(undrained.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(totals.last(), Some(&(47, true)));
}

#[tokio::test]
async fn test_invariants_hold_across_operations() {
    let source = ScriptedSource::with_rows(35);
    let buffer = buffer(&source, 6, 8);

    let mut drained = false;
    for page in [1, 4, 2, 7, 9, 3, 1] {
        buffer.move_to_page(page, None).await.unwrap();
        let window = buffer.window();
        assert_start_in_bounds(&window);
        assert!(window.drained || !drained, "drained flipped back on page {page}");
        drained = window.drained;
    }
    // past the end: clamped to the last page
    buffer.move_to_page(9, None).await.unwrap();
    assert_eq!(buffer.page_rows(), vec![5, 4, 3, 2, 1]);
    assert_eq!(buffer.window().current_page(), 6);
}

#[tokio::test]
async fn test_refresh_stitches_new_rows() {
    let source = ScriptedSource::with_rows(23);
    let buffer = buffer(&source, 10, 50);
    buffer.refresh().await.unwrap();
    assert_eq!(buffer.page_rows().first(), Some(&23));

    source.push(24);
    source.push(25);
    buffer.refresh().await.unwrap();

    let window = buffer.window();
    assert_eq!(&window.rows[..4], &[25, 24, 23, 22]);
    assert_eq!(window.rows.len(), 12);
    assert_eq!(window.start_index, 0);
    assert_eq!(window.shadow_row_count, 0);
}

#[tokio::test]
async fn test_refresh_replaces_window_when_runs_do_not_meet() {
    let source = ScriptedSource::with_rows(23);
    let buffer = buffer(&source, 5, 5);
    buffer.refresh().await.unwrap();

    for row in 24..=31 {
        source.push(row);
    }
    buffer.refresh().await.unwrap();

    let window = buffer.window();
    assert_eq!(window.rows, vec![31, 30, 29, 28, 27]);
    assert_eq!(window.shadow_row_count, 0);
    assert_eq!(window.start_index, 0);
    assert!(!window.drained);
}

#[tokio::test]
async fn test_loads_are_chunked_by_max_limit() {
    let source = ScriptedSource::with_rows(30);
    let buffer = buffer(&source, 10, 4);

    buffer.move_to_page(1, None).await.unwrap();
    assert_eq!(buffer.page_rows(), (21..=30).rev().collect::<Vec<_>>());
    assert_eq!(
        source.calls(),
        vec![
            Call {
                key: None,
                operator: Operator::Lt,
                order: SortOrder::Desc,
                limit: 4
            },
            Call {
                key: Some(27),
                operator: Operator::Lt,
                order: SortOrder::Desc,
                limit: 4
            },
            Call {
                key: Some(23),
                operator: Operator::Lt,
                order: SortOrder::Desc,
                limit: 2
            },
        ]
    );
}

#[tokio::test]
async fn test_anchored_move_starts_at_key_inclusive() {
    let source = ScriptedSource::with_rows(23);
    let buffer = buffer(&source, 5, 50);

    buffer.move_to_page(2, Some(&15)).await.unwrap();

    let window = buffer.window();
    assert_eq!(window.rows, vec![15, 14, 13, 12, 11]);
    assert_eq!(window.shadow_row_count, 5);
    assert_eq!(window.start_index, 0);
    assert_eq!(window.current_page(), 2);
    assert_eq!(source.calls()[0].operator, Operator::Lte);
    assert_eq!(source.calls()[0].key, Some(15));
}

#[tokio::test]
async fn test_head_move_with_uneven_shadow() {
    let source = ScriptedSource::with_rows(23);
    let buffer = buffer(&source, 5, 50);
    buffer.move_to_page(3, Some(&13)).await.unwrap();
    assert_eq!(buffer.window().shadow_row_count, 10);

    buffer.set_page_size(4);
    source.clear_calls();
    buffer.move_to_page(2, None).await.unwrap();

    let window = buffer.window();
    assert_eq!(window.shadow_row_count, 4);
    assert_eq!(window.page_rows(), &[19, 18, 17, 16]);
    assert_eq!(window.current_page(), 2);
    assert_eq!(
        source.calls(),
        vec![Call {
            key: Some(13),
            operator: Operator::Gt,
            order: SortOrder::Asc,
            limit: 6
        }]
    );
}

#[tokio::test]
async fn test_short_head_load_reaches_newest_row() {
    let source = ScriptedSource::with_rows(23);
    let buffer = buffer(&source, 5, 50);
    // anchor one row off a page boundary: only 9 rows precede it
    buffer.move_to_page(3, Some(&14)).await.unwrap();

    buffer.move_to_page(1, None).await.unwrap();

    let window = buffer.window();
    assert_eq!(window.shadow_row_count, 0);
    assert_eq!(window.page_rows(), &[23, 22, 21, 20, 19]);
    assert_eq!(window.rows.len(), 14);
    assert_eq!(window.current_page(), 1);
}

#[tokio::test]
async fn test_failed_load_leaves_window_untouched() {
    let source = ScriptedSource::with_rows(23);
    let buffer = buffer(&source, 10, 50);
    buffer.move_to_page(1, None).await.unwrap();
    let before = buffer.window();

    source.set_failing(true);
    assert!(buffer.move_to_page(3, None).await.is_err());
    assert!(buffer.refresh().await.is_err());
    assert_eq!(buffer.window(), before);
}

#[tokio::test]
async fn test_unanswerable_source_reads_as_empty() {
    let source = ScriptedSource::with_rows(23);
    source.set_null(true);
    let buffer = buffer(&source, 10, 50);

    let outcome = buffer.move_to_page(1, None).await.unwrap();
    assert_eq!(outcome, LoadOutcome::Committed);
    let window = buffer.window();
    assert!(window.rows.is_empty());
    assert!(window.drained);
    assert_eq!(window.total_row_count(50), 0);
}

#[tokio::test]
async fn test_clear_resets_window_and_notifies() {
    let source = ScriptedSource::with_rows(23);
    let buffer = buffer(&source, 10, 50);
    let mut rx = buffer.subscribe();
    buffer.move_to_page(2, None).await.unwrap();
    assert!(rx.has_changed().unwrap());
    rx.borrow_and_update();

    buffer.clear();
    assert!(rx.has_changed().unwrap());
    assert_eq!(*rx.borrow_and_update(), Window::new(10));
}
