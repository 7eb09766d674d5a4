use anyhow::{Context, Result};
use chrono::Local;
use engine_logging::{engine_debug, engine_info, engine_warn};
use harvester_core::{HarvestView, SessionState};
use harvester_engine::{
    ensure_output_dir, session_channel, JsonBatchSink, ReplayHost, Session, SessionReport,
    StatusObserver,
};

use super::persistence;
use crate::cli::Args;

pub fn run(args: Args) -> Result<SessionReport> {
    let mut config = persistence::load_config(args.config.as_deref())?;
    args.apply_overrides(&mut config);

    if args.dump_config {
        println!("{}", persistence::render_config(&config)?);
        return Ok(SessionReport::default());
    }

    if args.resume {
        let exported = persistence::resume_ids(&args.output, &args.resume_prefix())?;
        config.skip_ids.extend(exported);
    }

    ensure_output_dir(&args.output)
        .with_context(|| format!("preparing {}", args.output.display()))?;
    let prefix = format!(
        "{}{}",
        args.resume_prefix(),
        Local::now().format("%Y%m%d_%H%M%S")
    );

    let (handle, inbox) = session_channel();
    let mut host = ReplayHost::load(&args.frames, args.requests.as_deref(), args.frame_span)
        .context("loading snapshots")?;
    host.attach(handle, args.linger);

    let sink = JsonBatchSink::new(args.output.clone(), prefix);
    let mut session = Session::new(config, host, sink)
        .context("starting session")?
        .with_observer(StatusLog::default());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("building runtime")?;
    let report = runtime.block_on(session.run(inbox));

    engine_info!(
        "Done: {} ticks, {} records, {} batches in {:?}",
        report.ticks,
        report.records_captured,
        report.batches_written,
        args.output
    );
    for failure in &report.flush_failures {
        engine_warn!(
            "Batch {} ({} records) failed once: {}",
            failure.batch_index,
            failure.records,
            failure.reason
        );
    }
    Ok(report)
}

/// Logs progress whenever the captured total moves.
#[derive(Debug, Default)]
struct StatusLog {
    last_total: usize,
}

impl StatusObserver for StatusLog {
    fn on_status(&mut self, view: &HarvestView) {
        if view.captured_total != self.last_total {
            self.last_total = view.captured_total;
            engine_info!(
                "Captured {} ({} pending for batch {})",
                view.captured_total,
                view.pending,
                view.batch_index
            );
        } else if view.session == SessionState::Stopped {
            engine_debug!("Final status: {:?}", view);
        }
    }

    fn released(&mut self) {
        engine_info!("Session released after {} items", self.last_total);
    }
}
