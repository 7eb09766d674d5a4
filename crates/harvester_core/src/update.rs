use crate::scroll::ESCALATION_FACTOR;
use crate::{Effect, FlushOutcome, HarvestState, ItemHandle, Msg, SessionState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: HarvestState, msg: Msg) -> (HarvestState, Vec<Effect>) {
    let effects = match msg {
        Msg::ScrollAdvanced {
            height_before,
            height_after,
        } => {
            if state.is_stopped() {
                return (state, Vec::new());
            }
            let mut effects = Vec::new();
            if state.stall.record(height_before, height_after) {
                effects.push(Effect::ScrollBy {
                    distance: state.config.scroll_step.saturating_mul(ESCALATION_FACTOR),
                });
            }
            if !state.batch.is_empty() && state.batch.len() >= state.config.batch_size {
                effects.push(flush_effect(&state));
            }
            effects
        }
        Msg::RequestObserved { url } => {
            if !state.is_stopped() {
                state.correlator.observe(&url);
            }
            Vec::new()
        }
        Msg::FlushFinished {
            batch_index,
            flushed,
            outcome,
        } => {
            // A result for an index we already moved past is stale.
            if batch_index == state.batch.batch_index() {
                if let FlushOutcome::Written = outcome {
                    state.batch.commit_flush(flushed);
                    state.mark_dirty();
                }
            }
            Vec::new()
        }
        Msg::StopRequested => begin_stop(&mut state),
    };

    (state, effects)
}

/// Runs identifier-first reconciliation over `items`, in the order given.
///
/// Whatever triggered the pass (a scroll-tick scan or a mutation rescope),
/// the logic is the same. Hitting the stop id halts the remaining items.
pub fn reconcile<I>(mut state: HarvestState, items: I) -> (HarvestState, Vec<Effect>)
where
    I: IntoIterator,
    I::Item: ItemHandle,
{
    let mut effects = Vec::new();
    for item in items {
        if state.is_stopped() {
            break;
        }
        let Some(id) = item.identifier() else {
            continue;
        };

        if state.config.stop_at_id.as_deref() == Some(id.as_str()) {
            effects.extend(begin_stop(&mut state));
            break;
        }

        if state.known.contains(&id) {
            let media = state.correlator.table();
            let Some(record) = state.batch.find_mut(&id) else {
                continue;
            };
            if record.images.is_empty() || record.videos.is_empty() {
                let capture = item.extract_media(media);
                if record.absorb_media(capture) {
                    state.mark_dirty();
                }
            }
            continue;
        }

        let Some(record) = item.extract(&id, state.correlator.table()) else {
            continue;
        };
        state.known.mark_seen(id);
        state.batch.push(record);
        state.mark_dirty();
    }
    (state, effects)
}

fn begin_stop(state: &mut HarvestState) -> Vec<Effect> {
    if state.is_stopped() {
        return Vec::new();
    }
    state.session = SessionState::Stopped;
    state.mark_dirty();

    let mut effects = vec![Effect::CancelTimer, Effect::Unsubscribe];
    if !state.batch.is_empty() {
        effects.push(flush_effect(state));
    }
    effects.push(Effect::ReleaseUi);
    effects
}

fn flush_effect(state: &HarvestState) -> Effect {
    Effect::Flush {
        batch_index: state.batch.batch_index(),
        records: state.batch.records().to_vec(),
    }
}
