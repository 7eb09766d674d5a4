//! Harvester core: DOM-free record model and the pure reconciliation state machine.
mod batch;
mod config;
mod effect;
mod item;
mod known;
mod media;
mod msg;
mod record;
mod scroll;
mod state;
mod update;
mod view_model;

pub use batch::PendingBatch;
pub use config::{
    HarvestConfig, DEFAULT_BATCH_SIZE, DEFAULT_ORIGIN, DEFAULT_SCROLL_INTERVAL_MS,
    DEFAULT_SCROLL_STEP,
};
pub use effect::Effect;
pub use item::ItemHandle;
pub use known::KnownIdentifierSet;
pub use media::{
    network_media_id, thumbnail_media_id, MediaCorrelationTable, MediaCorrelator,
    SideChannelObserver,
};
pub use msg::{FlushOutcome, Msg};
pub use record::{FeedItemRecord, Interactions, MediaCapture};
pub use scroll::{StallTracker, ESCALATION_FACTOR, STALL_LIMIT};
pub use state::{HarvestState, SessionState};
pub use update::{reconcile, update};
pub use view_model::HarvestView;
