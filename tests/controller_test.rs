//! Controller, pagination and auto-refresh strategies

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Call, ScriptedSource};
use ledgerscope::pager::{
    LoadOutcome, NavError, NavParams, NavStore, Operator, PagerConfig, PagerMode, QueryState,
    SortOrder, TableController,
};

fn config(page_size: usize) -> PagerConfig {
    PagerConfig {
        page_size,
        max_limit: 50,
        presumed_row_count: 50,
        update_period: Duration::from_secs(1),
        max_auto_update_count: 3,
    }
}

fn controller(
    source: &Arc<ScriptedSource>,
    config: PagerConfig,
    nav: &Arc<QueryState>,
) -> TableController<ScriptedSource> {
    TableController::new(
        Arc::clone(source),
        config,
        Arc::clone(nav) as Arc<dyn NavStore>,
        NavParams::default(),
    )
}

#[tokio::test]
async fn test_mount_without_state_goes_live() {
    let source = ScriptedSource::with_rows(23);
    let nav = Arc::new(QueryState::new());
    let mut controller = controller(&source, config(10), &nav);

    controller.mount().await.unwrap();

    assert_eq!(controller.mode(), PagerMode::AutoRefresh);
    assert_eq!(controller.rows(), (14..=23).rev().collect::<Vec<_>>());
    assert_eq!(controller.current_page(), 1);
    assert!(nav.is_empty());
    controller.unmount();
}

#[tokio::test]
async fn test_mount_with_page_and_key_paginates() {
    let source = ScriptedSource::with_rows(23);
    let nav = Arc::new(QueryState::parse("p=2&k=13"));
    let mut controller = controller(&source, config(10), &nav);

    controller.mount().await.unwrap();

    assert_eq!(controller.mode(), PagerMode::Pagination);
    assert_eq!(controller.current_page(), 2);
    assert_eq!(controller.rows(), (4..=13).rev().collect::<Vec<_>>());
    assert_eq!(controller.total_row_count(), 50);
    assert_eq!(
        source.calls(),
        vec![Call {
            key: Some(13),
            operator: Operator::Lte,
            order: SortOrder::Desc,
            limit: 10
        }]
    );
}

#[tokio::test]
async fn test_malformed_page_falls_back_to_live() {
    let source = ScriptedSource::with_rows(23);
    let nav = Arc::new(QueryState::parse("p=zero&k=13"));
    let mut controller = controller(&source, config(10), &nav);

    controller.mount().await.unwrap();
    assert_eq!(controller.mode(), PagerMode::AutoRefresh);
    assert_eq!(nav.get("p"), None);
    controller.unmount();
}

#[tokio::test]
async fn test_goto_page_records_page_and_first_key() {
    let source = ScriptedSource::with_rows(23);
    let nav = Arc::new(QueryState::new());
    let mut controller = controller(&source, config(10), &nav);
    controller.mount().await.unwrap();

    controller.goto_page(2).await.unwrap();

    assert_eq!(controller.mode(), PagerMode::Pagination);
    assert_eq!(nav.get("p").as_deref(), Some("2"));
    assert_eq!(nav.get("k").as_deref(), Some("13"));
    let state = controller.nav_state();
    assert_eq!(state.page, Some(2));
    assert!(state.is_anchored());
}

#[tokio::test]
async fn test_earlier_move_cannot_overtake_later_one() {
    let source = ScriptedSource::with_rows(60);
    let nav = Arc::new(QueryState::new());
    let mut controller = controller(&source, config(10), &nav);
    let pagination = controller.paginate();

    let earlier = pagination.begin_goto(2).unwrap();
    let later = pagination.begin_goto(3).unwrap();

    // run the superseded move last
    assert_eq!(later.await.unwrap(), LoadOutcome::Committed);
    assert_eq!(earlier.await.unwrap(), LoadOutcome::Discarded);

    assert_eq!(controller.current_page(), 3);
    assert_eq!(controller.rows().first(), Some(&40));
    assert_eq!(controller.buffer().discarded_count(), 1);
    assert_eq!(nav.get("p").as_deref(), Some("3"));
    assert_eq!(nav.get("k").as_deref(), Some("40"));
}

#[tokio::test]
async fn test_page_zero_is_rejected() {
    let source = ScriptedSource::with_rows(23);
    let nav = Arc::new(QueryState::new());
    let mut controller = controller(&source, config(10), &nav);

    let err = controller.goto_page(0).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<NavError>(),
        Some(&NavError::InvalidPage("0".to_string()))
    );
}

#[tokio::test]
async fn test_leaving_live_view_reuses_retained_rows() {
    let source = ScriptedSource::with_rows(23);
    let nav = Arc::new(QueryState::new());
    let mut controller = controller(&source, config(10), &nav);
    controller.mount().await.unwrap();
    source.clear_calls();

    let outcome = controller.next_page().await.unwrap();

    assert_eq!(outcome, LoadOutcome::Committed);
    assert_eq!(controller.rows(), (4..=13).rev().collect::<Vec<_>>());
    assert_eq!(
        source.calls(),
        vec![Call {
            key: Some(14),
            operator: Operator::Lt,
            order: SortOrder::Desc,
            limit: 10
        }]
    );

    controller.previous_page().await.unwrap();
    assert_eq!(controller.current_page(), 1);
    assert_eq!(source.calls().len(), 1);
}

#[tokio::test]
async fn test_back_to_live_clears_navigation() {
    let source = ScriptedSource::with_rows(23);
    let nav = Arc::new(QueryState::parse("p=3&k=3"));
    let mut controller = controller(&source, config(10), &nav);
    controller.mount().await.unwrap();
    assert_eq!(controller.mode(), PagerMode::Pagination);

    controller.start_live().await.unwrap();

    assert_eq!(controller.mode(), PagerMode::AutoRefresh);
    assert!(nav.is_empty());
    assert_eq!(controller.rows().first(), Some(&23));
    assert_eq!(controller.toggle_pause(), Some(true));
    assert_eq!(controller.toggle_pause(), Some(false));
    controller.unmount();
}

#[tokio::test]
async fn test_pause_is_only_for_live_view() {
    let source = ScriptedSource::with_rows(23);
    let nav = Arc::new(QueryState::new());
    let mut controller = controller(&source, config(10), &nav);
    controller.goto_page(1).await.unwrap();

    assert_eq!(controller.toggle_pause(), None);
    assert_eq!(controller.auto_refresh_status(), None);
}

#[tokio::test]
async fn test_page_size_change_keeps_first_row_visible() {
    let source = ScriptedSource::with_rows(23);
    let nav = Arc::new(QueryState::new());
    let mut controller = controller(&source, config(5), &nav);
    controller.goto_page(3).await.unwrap();
    assert_eq!(controller.rows().first(), Some(&13));

    controller.set_page_size(4).await.unwrap();

    assert_eq!(controller.current_page(), 3);
    assert!(controller.rows().contains(&13));
    assert_eq!(nav.get("p").as_deref(), Some("3"));
}

#[tokio::test]
async fn test_replace_source_restarts_on_first_page() {
    let source = ScriptedSource::with_rows(23);
    let nav = Arc::new(QueryState::new());
    let mut controller = controller(&source, config(5), &nav);
    controller.goto_page(3).await.unwrap();

    let filtered = ScriptedSource::with_rows(7);
    controller.replace_source(Arc::clone(&filtered)).await.unwrap();

    assert_eq!(controller.mode(), PagerMode::Pagination);
    assert_eq!(controller.rows(), vec![7, 6, 5, 4, 3]);
    assert_eq!(nav.get("p").as_deref(), Some("1"));
    assert_eq!(nav.get("k").as_deref(), Some("7"));
}

#[tokio::test(start_paused = true)]
async fn test_auto_refresh_pauses_itself() {
    let source = ScriptedSource::with_rows(23);
    let nav = Arc::new(QueryState::new());
    let mut controller = controller(&source, config(10), &nav);
    controller.mount().await.unwrap();

    source.push(24);
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(controller.rows().first(), Some(&24));

    tokio::time::sleep(Duration::from_secs(5)).await;
    let status = controller.auto_refresh_status().unwrap();
    assert!(status.paused);
    assert_eq!(status.update_count, 3);

    // no more timer refreshes while paused
    source.push(25);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(controller.rows().first(), Some(&24));

    controller.resume();
    let status = controller.auto_refresh_status().unwrap();
    assert!(!status.paused);
    assert_eq!(status.update_count, 0);

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(controller.rows().first(), Some(&25));
    assert_eq!(controller.auto_refresh_status().unwrap().update_count, 1);
    controller.unmount();
}

#[tokio::test(start_paused = true)]
async fn test_failed_ticks_keep_the_timer_running() {
    let source = ScriptedSource::with_rows(23);
    let nav = Arc::new(QueryState::new());
    let mut controller = controller(
        &source,
        PagerConfig {
            max_auto_update_count: 0,
            ..config(10)
        },
        &nav,
    );
    controller.mount().await.unwrap();
    let before = controller.window();

    source.set_failing(true);
    tokio::time::sleep(Duration::from_millis(4_500)).await;

    let status = controller.auto_refresh_status().unwrap();
    assert!(!status.paused);
    assert_eq!(status.update_count, 4);
    assert_eq!(controller.window(), before);

    source.set_failing(false);
    source.push(24);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(controller.rows().first(), Some(&24));
    controller.unmount();
}

#[tokio::test]
async fn test_unmount_stops_strategy_and_clears_rows() {
    let source = ScriptedSource::with_rows(23);
    let nav = Arc::new(QueryState::new());
    let mut controller = controller(&source, config(10), &nav);
    controller.mount().await.unwrap();

    controller.unmount();

    assert_eq!(controller.mode(), PagerMode::Unmounted);
    assert!(controller.rows().is_empty());
    assert_eq!(controller.refresh().await.unwrap(), LoadOutcome::Discarded);
}
