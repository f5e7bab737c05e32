//! Worker thread driven through the runtime bridge, over the demo ledger

use std::thread;
use std::time::{Duration, Instant};

use ledgerscope::domain::{EntityId, TableFilter, TableKind};
use ledgerscope::infrastructure::{
    Backend, PageSnapshot, RuntimeBridge, RuntimeCommand, RuntimeEvent, WorkerSettings,
};
use ledgerscope::pager::{Link, PagerConfig, PagerMode};

fn settings(table: TableKind, link: Option<Link>) -> WorkerSettings {
    WorkerSettings {
        backend: Backend::Demo,
        pager: PagerConfig {
            page_size: 10,
            ..PagerConfig::default()
        },
        table,
        link,
    }
}

/// Poll until a page matching `accept` arrives
fn wait_for_page(bridge: &RuntimeBridge, accept: impl Fn(&PageSnapshot) -> bool) -> PageSnapshot {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        for event in bridge.poll_events() {
            match event {
                RuntimeEvent::Page(page) if accept(&page) => return page,
                RuntimeEvent::Error { message } => panic!("worker error: {message}"),
                _ => {}
            }
        }
        thread::sleep(Duration::from_millis(20));
    }
    panic!("no matching page within the deadline");
}

#[test]
fn test_live_view_then_paging() {
    let bridge = RuntimeBridge::new(settings(TableKind::Tokens, None)).unwrap();

    let live = wait_for_page(&bridge, |page| page.mode == PagerMode::AutoRefresh && !page.rows.is_empty());
    assert_eq!(live.table, TableKind::Tokens);
    assert_eq!(live.rows.len(), 10);
    assert_eq!(live.keys.first().map(String::as_str), Some("0.0.5035"));

    bridge.send(RuntimeCommand::NextPage).unwrap();
    let second = wait_for_page(&bridge, |page| page.page == 2);
    assert_eq!(second.mode, PagerMode::Pagination);
    assert_eq!(second.keys.first().map(String::as_str), Some("0.0.5025"));
    assert!(second.link.starts_with("ledgerscope://tokens?"));
    assert!(second.link.contains("p=2"));

    bridge.send(RuntimeCommand::GotoPage { page: 4 }).unwrap();
    let last = wait_for_page(&bridge, |page| page.page == 4);
    assert!(last.drained);
    assert_eq!(last.total_row_count, 35);
    assert_eq!(last.rows.len(), 5);
}

#[test]
fn test_link_reopens_page() {
    let link = Link::parse("ledgerscope://tokens?p=3&k=0.0.5015").unwrap();
    let bridge = RuntimeBridge::new(settings(TableKind::Transactions, Some(link))).unwrap();

    let page = wait_for_page(&bridge, |page| page.table == TableKind::Tokens);
    assert_eq!(page.page, 3);
    assert_eq!(page.mode, PagerMode::Pagination);
    assert_eq!(page.keys.first().map(String::as_str), Some("0.0.5015"));
}

#[test]
fn test_holders_follow_token_filter() {
    let bridge = RuntimeBridge::new(settings(TableKind::Holders, None)).unwrap();

    let empty = wait_for_page(&bridge, |page| page.mode == PagerMode::AutoRefresh);
    assert!(empty.rows.is_empty());
    assert!(empty.drained);

    let filter = TableFilter {
        account: None,
        token: Some(EntityId::new(0, 0, 5_006)),
    };
    bridge
        .send(RuntimeCommand::SetFilter {
            filter: filter.clone(),
        })
        .unwrap();
    let filtered = wait_for_page(&bridge, |page| !page.rows.is_empty());
    assert_eq!(filtered.filter, filter);
    assert!(filtered.link.contains("token=0.0.5006"));
}
