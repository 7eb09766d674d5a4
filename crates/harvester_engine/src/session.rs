use std::collections::VecDeque;
use std::time::Duration;

use engine_logging::{engine_debug, engine_error, engine_info, engine_trace};
use harvester_core::{
    reconcile, update, Effect, FeedItemRecord, FlushOutcome, HarvestConfig, HarvestState,
    HarvestView, Msg, SideChannelObserver,
};
use scraper::Html;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::extract::DomItem;
use crate::mutation::{feed_items, MutationListener, Rescope};
use crate::sink::BatchSink;

/// The page the session scrolls and reads.
pub trait FeedHost {
    fn scroll_by(&mut self, distance: u64);
    /// Total scrollable height right now.
    fn scroll_height(&self) -> u64;
    /// Markup of everything currently rendered.
    fn snapshot(&self) -> String;
}

/// Display-only view of session progress. Its absence changes nothing.
pub trait StatusObserver {
    fn on_status(&mut self, view: &HarvestView);

    /// The session stopped and will not report again.
    fn released(&mut self) {}
}

impl<F: FnMut(&HarvestView)> StatusObserver for F {
    fn on_status(&mut self, view: &HarvestView) {
        self(view)
    }
}

/// Notifications a host delivers while the session runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Items changed; each fragment is one item's outer markup.
    Mutated { fragments: Vec<String> },
    /// The page issued an outbound request.
    Request { url: String },
}

/// Cloneable link into a running session, safe to hand to other threads.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    events: mpsc::UnboundedSender<HostEvent>,
    stop: CancellationToken,
}

impl SessionHandle {
    /// Requests termination. Calling it again is harmless.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    pub fn is_stopping(&self) -> bool {
        self.stop.is_cancelled()
    }

    pub fn notify_mutation(&self, fragments: Vec<String>) {
        let _ = self.events.send(HostEvent::Mutated { fragments });
    }

    pub fn notify_request(&self, url: impl Into<String>) {
        let _ = self.events.send(HostEvent::Request { url: url.into() });
    }
}

impl SideChannelObserver for SessionHandle {
    fn on_request(&mut self, url: &str) {
        self.notify_request(url);
    }
}

/// Receiving end of a [`SessionHandle`], consumed by [`Session::run`].
#[derive(Debug)]
pub struct SessionInbox {
    events: mpsc::UnboundedReceiver<HostEvent>,
    stop: CancellationToken,
}

impl SessionInbox {
    /// Takes the next queued event without waiting.
    pub fn try_next(&mut self) -> Option<HostEvent> {
        self.events.try_recv().ok()
    }
}

pub fn session_channel() -> (SessionHandle, SessionInbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    let stop = CancellationToken::new();
    (
        SessionHandle {
            events: tx,
            stop: stop.clone(),
        },
        SessionInbox { events: rx, stop },
    )
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid origin {origin:?}: {source}")]
    InvalidOrigin {
        origin: String,
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushFailure {
    pub batch_index: u64,
    pub records: usize,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionReport {
    pub ticks: u64,
    pub batches_written: u64,
    pub records_captured: usize,
    pub flush_failures: Vec<FlushFailure>,
    /// Records still pending, e.g. because the final flush failed.
    pub unflushed: Vec<FeedItemRecord>,
}

/// One harvesting session: owns the state, the host, and the sink.
///
/// Every entry point runs to completion before the next one starts; the
/// async [`Session::run`] loop only decides which entry point goes next.
pub struct Session<H, S> {
    state: HarvestState,
    origin: Url,
    host: H,
    sink: S,
    listener: MutationListener,
    observer: Option<Box<dyn StatusObserver>>,
    timer_active: bool,
    ticks: u64,
    batches_written: u64,
    flush_failures: Vec<FlushFailure>,
}

impl<H: FeedHost, S: BatchSink> Session<H, S> {
    pub fn new(config: HarvestConfig, host: H, sink: S) -> Result<Self, SessionError> {
        let origin = Url::parse(&config.origin).map_err(|source| SessionError::InvalidOrigin {
            origin: config.origin.clone(),
            source,
        })?;
        engine_info!(
            "Session start: step={} interval={}ms batch_size={} stop_at={:?} skip_ids={}",
            config.scroll_step,
            config.scroll_interval_ms,
            config.batch_size,
            config.stop_at_id,
            config.skip_ids.len()
        );
        Ok(Self {
            state: HarvestState::new(config),
            origin,
            host,
            sink,
            listener: MutationListener::new(),
            observer: None,
            timer_active: true,
            ticks: 0,
            batches_written: 0,
            flush_failures: Vec::new(),
        })
    }

    pub fn with_observer(mut self, observer: impl StatusObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn state(&self) -> &HarvestState {
        &self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn is_stopped(&self) -> bool {
        self.state.is_stopped()
    }

    pub fn is_timer_active(&self) -> bool {
        self.timer_active
    }

    pub fn is_subscribed(&self) -> bool {
        self.listener.is_subscribed()
    }

    /// One scroll-driver tick: advance, rescan, then stall and flush checks.
    pub fn tick(&mut self) {
        if !self.timer_active || self.state.is_stopped() {
            return;
        }
        self.ticks += 1;
        engine_logging::set_scroll_tick(self.ticks);

        let height_before = self.host.scroll_height();
        self.host.scroll_by(self.state.config().scroll_step);
        let height_after = self.host.scroll_height();
        engine_trace!("Scroll height {} -> {}", height_before, height_after);

        self.scan();
        let effects = self.dispatch(Msg::ScrollAdvanced {
            height_before,
            height_after,
        });
        self.apply(effects);
    }

    /// Reconciles every item in the host's current markup.
    pub fn scan(&mut self) {
        if self.state.is_stopped() {
            return;
        }
        let doc = Html::parse_document(&self.host.snapshot());
        let origin = self.origin.clone();
        let items = feed_items(&doc, &origin);
        let effects = self.reconcile_items(items);
        self.apply(effects);
    }

    /// Structural-change entry point; reconciles only the touched items.
    pub fn on_mutation(&mut self, fragments: &[String]) {
        match self.listener.rescope(fragments) {
            Rescope::Ignored => {}
            Rescope::FullScan => self.scan(),
            Rescope::Items(docs) => {
                let origin = self.origin.clone();
                let items: Vec<DomItem<'_>> = docs
                    .iter()
                    .flat_map(|doc| feed_items(doc, &origin))
                    .collect();
                let effects = self.reconcile_items(items);
                self.apply(effects);
            }
        }
    }

    pub fn on_request(&mut self, url: &str) {
        let effects = self.dispatch(Msg::RequestObserved {
            url: url.to_string(),
        });
        self.apply(effects);
    }

    /// Cancels the timer, unsubscribes, and flushes what is left. Idempotent.
    pub fn stop(&mut self) {
        let effects = self.dispatch(Msg::StopRequested);
        self.apply(effects);
    }

    pub fn handle_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::Mutated { fragments } => self.on_mutation(&fragments),
            HostEvent::Request { url } => self.on_request(&url),
        }
    }

    /// Drives the session on the current task until it stops.
    ///
    /// Meant for a current-thread runtime: the timer, host events, and the
    /// stop token are interleaved, never run in parallel.
    pub async fn run(&mut self, inbox: SessionInbox) -> SessionReport {
        let SessionInbox { mut events, stop } = inbox;
        let period = Duration::from_millis(self.state.config().scroll_interval_ms.max(1));
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut events_open = true;

        // Items already rendered at start never produce a mutation.
        self.scan();
        while !self.state.is_stopped() {
            tokio::select! {
                biased;
                _ = stop.cancelled() => self.stop(),
                event = events.recv(), if events_open => match event {
                    Some(event) => self.handle_event(event),
                    None => events_open = false,
                },
                _ = ticker.tick(), if self.timer_active => self.tick(),
            }
        }

        // Handles observe the stop even when the stop id ended the session.
        stop.cancel();
        self.report()
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            ticks: self.ticks,
            batches_written: self.batches_written,
            records_captured: self.state.known().seen_count(),
            flush_failures: self.flush_failures.clone(),
            unflushed: self.state.pending().to_vec(),
        }
    }

    fn dispatch(&mut self, msg: Msg) -> Vec<Effect> {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        effects
    }

    fn reconcile_items(&mut self, items: Vec<DomItem<'_>>) -> Vec<Effect> {
        let seen = items.len();
        let state = std::mem::take(&mut self.state);
        let (state, effects) = reconcile(state, items);
        self.state = state;
        engine_debug!(
            "Reconciled {} items; {} pending, {} captured",
            seen,
            self.state.pending().len(),
            self.state.known().seen_count()
        );
        effects
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        let mut queue = VecDeque::from(effects);
        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::ScrollBy { distance } => {
                    engine_debug!("Feed stalled; jumping {}", distance);
                    self.host.scroll_by(distance);
                }
                Effect::Flush {
                    batch_index,
                    records,
                } => {
                    let outcome = self.flush(batch_index, &records);
                    queue.extend(self.dispatch(Msg::FlushFinished {
                        batch_index,
                        flushed: records.len(),
                        outcome,
                    }));
                }
                Effect::CancelTimer => {
                    engine_info!("Stopping after {} ticks", self.ticks);
                    self.timer_active = false;
                }
                Effect::Unsubscribe => self.listener.unsubscribe(),
                Effect::ReleaseUi => {
                    // Final status goes out before the observer is let go.
                    self.publish_status();
                    if let Some(observer) = self.observer.as_mut() {
                        observer.released();
                    }
                }
            }
        }
        self.publish_status();
    }

    fn flush(&mut self, batch_index: u64, records: &[FeedItemRecord]) -> FlushOutcome {
        match self.sink.write_batch(batch_index, records) {
            Ok(()) => {
                self.batches_written += 1;
                FlushOutcome::Written
            }
            Err(err) => {
                engine_error!(
                    "Flush of batch {} ({} records) failed: {}",
                    batch_index,
                    records.len(),
                    err
                );
                self.flush_failures.push(FlushFailure {
                    batch_index,
                    records: records.len(),
                    reason: err.to_string(),
                });
                FlushOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    fn publish_status(&mut self) {
        if !self.state.consume_dirty() {
            return;
        }
        if let Some(observer) = self.observer.as_mut() {
            observer.on_status(&self.state.view());
        }
    }
}

impl<H: FeedHost, S: BatchSink> SideChannelObserver for Session<H, S> {
    fn on_request(&mut self, url: &str) {
        Session::on_request(self, url);
    }
}
