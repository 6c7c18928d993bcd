use std::time::Duration;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::flow::{flow_score, KeystrokeHistory, DEFAULT_FLOW_WINDOW};
use crate::history::SessionSummary;
use crate::metrics::{
    compute_accuracy, compute_wpm, elapsed_minutes, is_complete, normalize_line_endings,
    progress_percent,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Completes the session once this much time has passed since the first keystroke
    pub time_limit: Option<Duration>,
    pub track_flow: bool,
    /// Keystroke intervals retained for the flow score
    pub flow_window: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_limit: None,
            track_flow: false,
            flow_window: DEFAULT_FLOW_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    Active,
    Completed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CompletionReason {
    Matched,
    TimeExpired,
}

impl CompletionReason {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "matched" => Some(CompletionReason::Matched),
            "time_expired" => Some(CompletionReason::TimeExpired),
            _ => None,
        }
    }
}

/// Derived values, always recomputed from input, target and elapsed time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionMetrics {
    pub wpm: u32,
    pub accuracy: u32,
    pub flow: u32,
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self {
            wpm: 0,
            accuracy: 100,
            flow: 0,
        }
    }
}

/// One attempt at reproducing `target`, from first keystroke to completion or reset.
///
/// Timestamps are milliseconds from whatever [`crate::clock::Clock`] the caller
/// drives the session with. The session never reads the clock itself, which
/// keeps every transition reproducible.
#[derive(Debug, Clone)]
pub struct TypingSession {
    target: String,
    input: String,
    started_at: Option<u64>,
    completed_at: Option<u64>,
    completion: Option<CompletionReason>,
    keystrokes: Option<KeystrokeHistory>,
    metrics: SessionMetrics,
    config: SessionConfig,
}

impl TypingSession {
    pub fn new(target: impl Into<String>, config: SessionConfig) -> Self {
        let keystrokes = config
            .track_flow
            .then(|| KeystrokeHistory::new(config.flow_window));
        Self {
            target: normalize_line_endings(&target.into()).into_owned(),
            input: String::new(),
            started_at: None,
            completed_at: None,
            completion: None,
            keystrokes,
            metrics: SessionMetrics::default(),
            config,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn metrics(&self) -> SessionMetrics {
        self.metrics
    }

    pub fn started_at(&self) -> Option<u64> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<u64> {
        self.completed_at
    }

    pub fn completion(&self) -> Option<CompletionReason> {
        self.completion
    }

    pub fn keystrokes(&self) -> Option<&KeystrokeHistory> {
        self.keystrokes.as_ref()
    }

    pub fn phase(&self) -> SessionPhase {
        match (self.started_at, self.completed_at) {
            (_, Some(_)) => SessionPhase::Completed,
            (Some(_), None) => SessionPhase::Active,
            (None, None) => SessionPhase::NotStarted,
        }
    }

    pub fn chars_typed(&self) -> usize {
        self.input.chars().count()
    }

    pub fn progress(&self) -> u32 {
        progress_percent(&self.target, &self.input)
    }

    /// Time spent typing so far; frozen at completion.
    pub fn elapsed_ms(&self, now: u64) -> u64 {
        match self.started_at {
            Some(start) => self.completed_at.unwrap_or(now).saturating_sub(start),
            None => 0,
        }
    }

    /// Time left before the limit expires, if the session has one.
    pub fn remaining(&self, now: u64) -> Option<Duration> {
        let limit = self.config.time_limit?;
        Some(limit.saturating_sub(Duration::from_millis(self.elapsed_ms(now))))
    }

    /// Handles a change of the whole typed text (insert, delete or paste).
    ///
    /// Ignored once completed. The first non-empty input starts the clock.
    /// Repeating an event with the same text and time leaves metrics unchanged.
    pub fn on_input_change(&mut self, new_input: &str, now: u64) -> SessionMetrics {
        if self.phase() == SessionPhase::Completed {
            return self.metrics;
        }

        // a keystroke arriving after the limit ends the session without being counted
        if self.limit_reached(now) {
            self.refresh(now);
            self.finish(now, CompletionReason::TimeExpired);
            return self.metrics;
        }

        let new_input = normalize_line_endings(new_input);
        let changed = *new_input != *self.input;
        if changed {
            self.input.clear();
            self.input.push_str(&new_input);
        }

        if self.started_at.is_none() {
            if self.input.is_empty() {
                return self.metrics;
            }
            info!(target_len = self.target.chars().count(), "session started");
            self.started_at = Some(now);
        }

        if changed {
            if let Some(history) = self.keystrokes.as_mut() {
                history.record(now);
            }
        }

        self.refresh(now);

        if let Some(history) = &self.keystrokes {
            if let Some(score) =
                flow_score(&history.intervals(), self.metrics.wpm, self.metrics.accuracy)
            {
                self.metrics.flow = score;
            }
        }

        if is_complete(&self.target, &self.input) {
            self.finish(now, CompletionReason::Matched);
        }

        self.metrics
    }

    /// Periodic refresh while active; also enforces the time limit.
    pub fn on_tick(&mut self, now: u64) -> SessionMetrics {
        if self.phase() != SessionPhase::Active {
            return self.metrics;
        }

        self.refresh(now);

        if self.limit_reached(now) {
            self.finish(now, CompletionReason::TimeExpired);
        }

        self.metrics
    }

    /// Ends an active session because an external timer ran out.
    pub fn expire(&mut self, now: u64) {
        if self.phase() == SessionPhase::Active {
            self.refresh(now);
            self.finish(now, CompletionReason::TimeExpired);
        }
    }

    /// Back to a fresh, unstarted attempt at the same target.
    pub fn reset(&mut self) {
        debug!("session reset");
        self.input.clear();
        self.started_at = None;
        self.completed_at = None;
        self.completion = None;
        if let Some(history) = self.keystrokes.as_mut() {
            history.clear();
        }
        self.metrics = SessionMetrics::default();
    }

    /// Record of a completed session, `None` until then.
    pub fn summary(&self, category: &str, item: &str) -> Option<SessionSummary> {
        let completion = self.completion?;
        let completed_at = self.completed_at?;
        Some(SessionSummary {
            category: category.to_string(),
            item: item.to_string(),
            wpm: self.metrics.wpm,
            accuracy: self.metrics.accuracy,
            flow: self.config.track_flow.then_some(self.metrics.flow),
            elapsed_ms: self.elapsed_ms(completed_at),
            chars_typed: self.chars_typed(),
            completion,
            finished_at: Local::now(),
        })
    }

    fn refresh(&mut self, now: u64) {
        let minutes = self
            .started_at
            .map_or(0.0, |start| elapsed_minutes(start, now));
        self.metrics.wpm = compute_wpm(self.chars_typed(), minutes);
        self.metrics.accuracy = compute_accuracy(&self.target, &self.input);
    }

    fn limit_reached(&self, now: u64) -> bool {
        match (self.started_at, self.config.time_limit) {
            (Some(_), Some(limit)) => self.elapsed_ms(now) >= limit.as_millis() as u64,
            _ => false,
        }
    }

    fn finish(&mut self, now: u64, reason: CompletionReason) {
        self.completed_at = Some(now);
        self.completion = Some(reason);
        info!(
            wpm = self.metrics.wpm,
            accuracy = self.metrics.accuracy,
            flow = self.metrics.flow,
            reason = %reason,
            "session completed"
        );
    }
}
