//! Replays saved feed snapshots as a scrollable host.
//!
//! A replay is a directory of rendered HTML snapshots ("frames") taken while
//! scrolling a real feed, plus an optional request log with one
//! `<frame> <url>` pair per line. Scrolling past a frame boundary reveals the
//! next frame: its requests go to the session first, then a mutation for its
//! items, the same order a live page produces them in.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine_logging::{engine_debug, engine_info};

use crate::decode::decode_snapshot;
use crate::mutation::item_fragments;
use crate::session::{FeedHost, SessionHandle};

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("io error reading {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("no .html frames in {0:?}")]
    NoFrames(PathBuf),
    #[error("request log line {line}: expected `<frame> <url>`, got {content:?}")]
    BadRequestLine { line: usize, content: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReplayFrame {
    pub html: String,
    pub requests: Vec<String>,
}

#[derive(Debug)]
pub struct ReplayHost {
    frames: Vec<ReplayFrame>,
    frame_span: u64,
    position: u64,
    revealed: usize,
    handle: Option<SessionHandle>,
    linger: u32,
    idle_scrolls: u32,
}

impl ReplayHost {
    /// `frame_span` is how far one must scroll to reveal the next frame.
    pub fn new(frames: Vec<ReplayFrame>, frame_span: u64) -> Self {
        let revealed = usize::from(!frames.is_empty());
        Self {
            frames,
            frame_span: frame_span.max(1),
            position: 0,
            revealed,
            handle: None,
            linger: 0,
            idle_scrolls: 0,
        }
    }

    pub fn load(
        dir: &Path,
        request_log: Option<&Path>,
        frame_span: u64,
    ) -> Result<Self, ReplayError> {
        let read_err = |path: &Path, source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut paths: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|e| read_err(dir, e))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("html" | "htm")
                )
            })
            .collect();
        if paths.is_empty() {
            return Err(ReplayError::NoFrames(dir.to_path_buf()));
        }
        paths.sort();

        let mut frames = Vec::with_capacity(paths.len());
        for path in &paths {
            let bytes = fs::read(path).map_err(|e| read_err(path, e))?;
            let decoded = decode_snapshot(&bytes);
            if decoded.lossy {
                engine_debug!("Frame {:?} had invalid {} bytes", path, decoded.encoding_label);
            }
            frames.push(ReplayFrame {
                html: decoded.html,
                requests: Vec::new(),
            });
        }

        if let Some(log_path) = request_log {
            let text = fs::read_to_string(log_path).map_err(|e| read_err(log_path, e))?;
            for (frame, url) in parse_request_log(&text)? {
                // Requests past the last frame belong to content never shown.
                if let Some(target) = frames.get_mut(frame) {
                    target.requests.push(url);
                }
            }
        }

        engine_info!("Loaded {} replay frames from {:?}", frames.len(), dir);
        Ok(Self::new(frames, frame_span))
    }

    /// Connects the host to a session and replays the requests of frames
    /// already on screen.
    ///
    /// Once every frame is revealed, `linger` further scrolls are allowed
    /// before the host asks the session to stop.
    pub fn attach(&mut self, handle: SessionHandle, linger: u32) {
        for frame in &self.frames[..self.revealed] {
            for url in &frame.requests {
                handle.notify_request(url.clone());
            }
        }
        self.handle = Some(handle);
        self.linger = linger;
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn revealed(&self) -> usize {
        self.revealed
    }

    fn reveal(&self, index: usize) {
        let Some(handle) = &self.handle else {
            return;
        };
        let frame = &self.frames[index];
        for url in &frame.requests {
            handle.notify_request(url.clone());
        }
        handle.notify_mutation(item_fragments(&frame.html));
    }
}

impl FeedHost for ReplayHost {
    fn scroll_by(&mut self, distance: u64) {
        self.position += distance;
        let reachable = usize::try_from(self.position / self.frame_span)
            .unwrap_or(usize::MAX)
            .saturating_add(1);
        let target = reachable.min(self.frames.len());

        if target > self.revealed {
            for index in self.revealed..target {
                self.reveal(index);
            }
            self.revealed = target;
            self.idle_scrolls = 0;
            return;
        }

        if self.revealed == self.frames.len() {
            self.idle_scrolls += 1;
            if self.idle_scrolls > self.linger {
                if let Some(handle) = &self.handle {
                    if !handle.is_stopping() {
                        engine_info!("Replay exhausted; requesting stop");
                    }
                    handle.stop();
                }
            }
        }
    }

    fn scroll_height(&self) -> u64 {
        self.revealed as u64 * self.frame_span
    }

    fn snapshot(&self) -> String {
        self.revealed
            .checked_sub(1)
            .and_then(|last| self.frames.get(last))
            .map(|frame| frame.html.clone())
            .unwrap_or_default()
    }
}

/// Parses `<frame> <url>` lines; blank lines and `#` comments are skipped.
pub fn parse_request_log(text: &str) -> Result<Vec<(usize, String)>, ReplayError> {
    let mut entries = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let bad_line = || ReplayError::BadRequestLine {
            line: number + 1,
            content: trimmed.to_string(),
        };
        let mut parts = trimmed.split_whitespace();
        let frame = parts
            .next()
            .and_then(|raw| raw.parse::<usize>().ok())
            .ok_or_else(bad_line)?;
        let url = parts.next().ok_or_else(bad_line)?;
        if parts.next().is_some() {
            return Err(bad_line());
        }
        entries.push((frame, url.to_string()));
    }
    Ok(entries)
}
