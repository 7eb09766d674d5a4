//! Harvester engine: markup extraction, the session runtime, and batch export.
mod decode;
mod extract;
mod labels;
mod mutation;
mod persist;
mod replay;
mod session;
mod sink;

pub use decode::{decode_snapshot, DecodedSnapshot};
pub use extract::{status_id, DomItem};
pub use labels::{is_interaction_label, parse_interactions, parse_number_string};
pub use mutation::{feed_items, item_fragments, MutationListener, Rescope};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use replay::{parse_request_log, ReplayError, ReplayFrame, ReplayHost};
pub use session::{
    session_channel, FeedHost, FlushFailure, HostEvent, Session, SessionError, SessionHandle,
    SessionInbox, SessionReport, StatusObserver,
};
pub use sink::{load_known_ids, BatchSink, JsonBatchSink, MemorySink, ResumeError, SinkError};
