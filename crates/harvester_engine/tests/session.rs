use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use harvester_core::{FeedItemRecord, HarvestConfig, HarvestView, SessionState};
use harvester_engine::{
    session_channel, BatchSink, FeedHost, MemorySink, Session, SessionError, SinkError,
};
use pretty_assertions::assert_eq;

const THUMB_777: &str = "https://pbs.twimg.com/ext_tw_video_thumb/777/pu/img/poster.jpg";
const VIDEO_777: &str = "https://video.twimg.com/ext_tw_video/777/pu/vid/avc1/640x360/v.mp4";

/// Feed that reveals one more item on every scroll, up to what it holds.
#[derive(Debug, Default)]
struct FakeFeed {
    items: Vec<String>,
    visible: usize,
    scrolls: Vec<u64>,
}

impl FakeFeed {
    fn new(items: Vec<String>, visible: usize) -> Self {
        Self {
            visible: visible.min(items.len()),
            items,
            scrolls: Vec::new(),
        }
    }
}

impl FeedHost for FakeFeed {
    fn scroll_by(&mut self, distance: u64) {
        self.scrolls.push(distance);
        self.visible = (self.visible + 1).min(self.items.len());
    }

    fn scroll_height(&self) -> u64 {
        self.visible as u64 * 100
    }

    fn snapshot(&self) -> String {
        format!(
            "<html><body><main>{}</main></body></html>",
            self.items[..self.visible].concat()
        )
    }
}

/// Fails the first `failures` writes, then accepts everything.
#[derive(Debug, Default)]
struct FlakySink {
    failures: usize,
    batches: Vec<(u64, Vec<String>)>,
}

impl BatchSink for FlakySink {
    fn write_batch(&mut self, batch_index: u64, records: &[FeedItemRecord]) -> Result<(), SinkError> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(SinkError::Rejected("disk full".to_string()));
        }
        let ids = records.iter().map(|r| r.id.clone()).collect();
        self.batches.push((batch_index, ids));
        Ok(())
    }
}

fn article(id: &str, media: &str) -> String {
    format!(
        r#"<article data-testid="tweet"><div data-testid="User-Name"><span>user{id}</span></div><a href="/user{id}/status/{id}"><time datetime="2024-05-01T00:00:00.000Z">May 1</time></a><div data-testid="tweetText">post {id}</div>{media}</article>"#
    )
}

fn plain(id: &str) -> String {
    article(id, "")
}

fn with_video_thumb(id: &str) -> String {
    article(
        id,
        &format!(
            r#"<div data-testid="tweetPhoto"><img src="{THUMB_777}"><video src="blob:https://x.com/9a"></video></div>"#
        ),
    )
}

fn config(batch_size: usize) -> HarvestConfig {
    HarvestConfig {
        batch_size,
        ..HarvestConfig::default()
    }
}

fn batch_ids(sink: &MemorySink) -> Vec<(u64, Vec<&str>)> {
    sink.batches
        .iter()
        .map(|(index, records)| (*index, records.iter().map(|r| r.id.as_str()).collect()))
        .collect()
}

#[test]
fn invalid_origin_is_rejected() {
    let config = HarvestConfig {
        origin: "not a url".to_string(),
        ..HarvestConfig::default()
    };
    let err = Session::new(config, FakeFeed::default(), MemorySink::default())
        .err()
        .expect("origin must parse");
    assert!(matches!(err, SessionError::InvalidOrigin { .. }));
}

#[test]
fn tick_captures_and_flushes_at_batch_size() {
    engine_logging::initialize_for_tests();
    let feed = FakeFeed::new(vec![plain("30"), plain("20"), plain("10")], 1);
    let mut session = Session::new(config(3), feed, MemorySink::default()).unwrap();

    session.tick();
    assert_eq!(session.state().pending().len(), 2);
    assert!(session.sink().batches.is_empty());

    session.tick();
    assert_eq!(batch_ids(session.sink()), vec![(1, vec!["30", "20", "10"])]);
    assert!(session.state().pending().is_empty());
    assert_eq!(session.state().batch_index(), 2);

    let record = &session.sink().batches[0].1[0];
    assert_eq!(record.author.as_deref(), Some("user30"));
    assert_eq!(record.permalink_url, "https://x.com/user30/status/30");
}

#[test]
fn rescans_never_duplicate() {
    let feed = FakeFeed::new(vec![plain("2"), plain("1")], 2);
    let mut session = Session::new(config(100), feed, MemorySink::default()).unwrap();

    session.scan();
    session.scan();
    session.tick();
    assert_eq!(session.state().known().seen_count(), 2);
    assert_eq!(session.state().pending().len(), 2);
}

#[test]
fn failed_flush_keeps_records_and_retries_same_index() {
    let feed = FakeFeed::new(vec![plain("2"), plain("1")], 2);
    let sink = FlakySink {
        failures: 1,
        ..FlakySink::default()
    };
    let mut session = Session::new(config(2), feed, sink).unwrap();

    session.tick();
    assert_eq!(session.state().pending().len(), 2);
    assert_eq!(session.state().batch_index(), 1);
    assert_eq!(session.report().flush_failures.len(), 1);

    session.tick();
    assert_eq!(
        session.sink().batches,
        vec![(1, vec!["2".to_string(), "1".to_string()])]
    );
    assert_eq!(session.state().batch_index(), 2);
}

#[test]
fn stop_flushes_once_and_is_idempotent() {
    let feed = FakeFeed::new(vec![plain("2"), plain("1")], 2);
    let mut session = Session::new(config(100), feed, MemorySink::default()).unwrap();
    session.scan();

    session.stop();
    session.stop();
    assert!(session.is_stopped());
    assert!(!session.is_timer_active());
    assert!(!session.is_subscribed());
    assert_eq!(batch_ids(session.sink()), vec![(1, vec!["2", "1"])]);

    session.tick();
    session.on_mutation(&[plain("3")]);
    assert_eq!(session.report().ticks, 0);
    assert_eq!(session.state().known().seen_count(), 2);
    assert_eq!(session.sink().batches.len(), 1);
}

#[test]
fn stop_with_nothing_pending_writes_nothing() {
    let mut session =
        Session::new(config(100), FakeFeed::default(), MemorySink::default()).unwrap();
    session.stop();
    assert!(session.is_stopped());
    assert!(session.sink().batches.is_empty());
}

#[test]
fn failed_final_flush_is_reported_as_unflushed() {
    let feed = FakeFeed::new(vec![plain("1")], 1);
    let sink = MemorySink {
        fail_with: Some("read-only".to_string()),
        ..MemorySink::default()
    };
    let mut session = Session::new(config(100), feed, sink).unwrap();
    session.scan();
    session.stop();

    let report = session.report();
    assert_eq!(report.batches_written, 0);
    assert_eq!(report.flush_failures[0].reason, "sink rejected batch: read-only");
    assert_eq!(report.unflushed.len(), 1);
}

#[test]
fn stop_id_halts_before_capturing_it_or_anything_older() {
    let feed = FakeFeed::new(vec![plain("30"), plain("20"), plain("10")], 3);
    let config = HarvestConfig {
        stop_at_id: Some("20".to_string()),
        ..config(100)
    };
    let mut session = Session::new(config, feed, MemorySink::default()).unwrap();

    session.tick();
    assert!(session.is_stopped());
    assert_eq!(batch_ids(session.sink()), vec![(1, vec!["30"])]);
}

#[test]
fn skip_ids_are_never_captured() {
    let feed = FakeFeed::new(vec![plain("3"), plain("2"), plain("1")], 3);
    let config = HarvestConfig {
        skip_ids: vec!["2".to_string()],
        ..config(100)
    };
    let mut session = Session::new(config, feed, MemorySink::default()).unwrap();
    session.scan();
    session.stop();
    assert_eq!(batch_ids(session.sink()), vec![(1, vec!["3", "1"])]);
}

#[test]
fn stalled_feed_escalates_the_jump() {
    let feed = FakeFeed::new(vec![plain("1")], 1);
    let mut session = Session::new(config(100), feed, MemorySink::default()).unwrap();

    for _ in 0..3 {
        session.tick();
    }
    assert_eq!(session.host().scrolls, vec![800, 800, 800, 2_400]);
}

#[test]
fn video_seen_in_traffic_first_is_attached_at_capture() {
    let feed = FakeFeed::new(vec![with_video_thumb("5")], 1);
    let mut session = Session::new(config(100), feed, MemorySink::default()).unwrap();

    session.on_request(VIDEO_777);
    session.on_request("https://abs.twimg.com/responsive-web/client-web/main.js");
    session.scan();

    let record = &session.state().pending()[0];
    assert_eq!(record.videos.iter().collect::<Vec<_>>(), vec![VIDEO_777]);
}

#[test]
fn late_video_upgrades_pending_record_on_mutation() {
    let feed = FakeFeed::new(vec![with_video_thumb("5")], 1);
    let mut session = Session::new(config(100), feed, MemorySink::default()).unwrap();

    session.scan();
    assert!(session.state().pending()[0].videos.is_empty());

    session.on_request(VIDEO_777);
    session.on_mutation(&[with_video_thumb("5")]);
    assert_eq!(
        session.state().pending()[0].videos.iter().collect::<Vec<_>>(),
        vec![VIDEO_777]
    );

    session.stop();
    assert!(session.sink().batches[0].1[0].videos.contains(VIDEO_777));
}

#[test]
fn mutation_outside_items_triggers_full_scan() {
    let feed = FakeFeed::new(vec![plain("8")], 1);
    let mut session = Session::new(config(100), feed, MemorySink::default()).unwrap();

    session.on_mutation(&["<div class=\"spinner\"></div>".to_string()]);
    assert_eq!(session.state().known().seen_count(), 1);
}

#[test]
fn observer_sees_progress_and_final_state() {
    let views: Rc<RefCell<Vec<HarvestView>>> = Rc::default();
    let sink_views = Rc::clone(&views);
    let feed = FakeFeed::new(vec![plain("2"), plain("1")], 2);
    let mut session = Session::new(config(100), feed, MemorySink::default())
        .unwrap()
        .with_observer(move |view: &HarvestView| sink_views.borrow_mut().push(view.clone()));

    session.scan();
    session.stop();

    let views = views.borrow();
    assert_eq!(
        views.first(),
        Some(&HarvestView {
            session: SessionState::Running,
            batch_index: 1,
            pending: 2,
            captured_total: 2,
        })
    );
    assert_eq!(
        views.last(),
        Some(&HarvestView {
            session: SessionState::Stopped,
            batch_index: 2,
            pending: 0,
            captured_total: 2,
        })
    );
}

#[tokio::test(start_paused = true)]
async fn run_ticks_until_stop_id_is_reached() {
    let items = vec![plain("50"), plain("40"), plain("30"), plain("20"), plain("10")];
    let feed = FakeFeed::new(items, 1);
    let config = HarvestConfig {
        stop_at_id: Some("20".to_string()),
        ..config(100)
    };
    let mut session = Session::new(config, feed, MemorySink::default()).unwrap();
    let (handle, inbox) = session_channel();

    let report = session.run(inbox).await;

    assert_eq!(report.ticks, 3);
    assert_eq!(report.batches_written, 1);
    assert!(report.unflushed.is_empty());
    assert!(handle.is_stopping());
    assert_eq!(batch_ids(session.sink()), vec![(1, vec!["50", "40", "30"])]);
}

#[tokio::test(start_paused = true)]
async fn run_handles_events_and_external_stop() {
    let feed = FakeFeed::new(vec![with_video_thumb("5"), plain("4"), plain("3")], 1);
    let mut session = Session::new(config(100), feed, MemorySink::default()).unwrap();
    let (handle, inbox) = session_channel();
    handle.notify_request(VIDEO_777);

    let stopper = handle.clone();
    let (report, ()) = tokio::join!(session.run(inbox), async move {
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        stopper.stop();
    });

    assert_eq!(report.ticks, 2);
    assert_eq!(report.records_captured, 3);
    let batch = &session.sink().batches[0].1;
    assert_eq!(batch.len(), 3);
    assert!(batch[0].videos.contains(VIDEO_777));
}
