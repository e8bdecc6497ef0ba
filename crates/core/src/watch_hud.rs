//! Watch HUD overlay text.
//!
//! The overlay lists the debugger's watch expressions with their current
//! values. Updates are driven by emulator notifications and throttled to one
//! every [`UPDATE_INTERVAL`]; the overlay is only rewritten when the text
//! changes.

use crate::logging::{log, LogCategory, LogLevel};
use crate::settings::DebuggerConfig;
use std::time::{Duration, Instant};

/// Minimum time between two unforced updates
pub const UPDATE_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchValue {
    pub expression: String,
    pub value: String,
}

impl WatchValue {
    pub fn new(expression: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            value: value.into(),
        }
    }
}

/// Evaluates the watch list of the running game's main CPU
pub trait WatchSource {
    fn has_entries(&self) -> bool;

    /// Current values; `previous` is the last result, used to flag changes
    fn watch_values(&mut self, previous: &[WatchValue]) -> Vec<WatchValue>;
}

/// Where the overlay text ends up
pub trait HudSink {
    fn set_text(&mut self, text: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HudNotification {
    GameLoaded,
    FrameDone,
    EmulationStopped,
    BeforeEmulationStop,
    /// Anything the HUD does not react to
    Other,
}

#[derive(Debug)]
pub struct WatchHud {
    last_update: Option<Instant>,
    previous: Vec<WatchValue>,
    last_text: String,
    cleared: bool,
}

/// `expr = value` lines, blank expressions skipped, at most `max_entries`
/// lines when positive
pub fn format_watch_text(values: &[WatchValue], max_entries: i32) -> String {
    let limit = usize::try_from(max_entries)
        .ok()
        .filter(|&n| n > 0)
        .unwrap_or(usize::MAX);

    values
        .iter()
        .filter(|entry| !entry.expression.trim().is_empty())
        .take(limit)
        .map(|entry| format!("{} = {}", entry.expression, entry.value))
        .collect::<Vec<_>>()
        .join("\n")
}

impl Default for WatchHud {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchHud {
    pub fn new() -> Self {
        Self {
            last_update: None,
            previous: Vec::new(),
            last_text: String::new(),
            cleared: true,
        }
    }

    pub fn text(&self) -> &str {
        &self.last_text
    }

    pub fn process<S, H>(
        &mut self,
        notification: HudNotification,
        config: &DebuggerConfig,
        source: &mut S,
        sink: &mut H,
        now: Instant,
    ) where
        S: WatchSource + ?Sized,
        H: HudSink + ?Sized,
    {
        if !config.show_watch_hud {
            self.clear(sink);
            return;
        }

        match notification {
            HudNotification::GameLoaded => {
                self.previous.clear();
                self.update(true, config, source, sink, now);
            }
            HudNotification::FrameDone => self.update(false, config, source, sink, now),
            HudNotification::EmulationStopped | HudNotification::BeforeEmulationStop => {
                self.clear(sink)
            }
            HudNotification::Other => {}
        }
    }

    /// Blank the overlay unless it already is
    pub fn clear<H: HudSink + ?Sized>(&mut self, sink: &mut H) {
        if self.cleared {
            return;
        }
        sink.set_text("");
        self.last_text.clear();
        self.cleared = true;
        log(LogCategory::WatchHud, LogLevel::Trace, || "Watch HUD cleared".to_string());
    }

    fn update<S, H>(
        &mut self,
        force: bool,
        config: &DebuggerConfig,
        source: &mut S,
        sink: &mut H,
        now: Instant,
    ) where
        S: WatchSource + ?Sized,
        H: HudSink + ?Sized,
    {
        if !force {
            if let Some(last) = self.last_update {
                if now.saturating_duration_since(last) < UPDATE_INTERVAL {
                    return;
                }
            }
        }
        self.last_update = Some(now);

        if !source.has_entries() {
            self.clear(sink);
            return;
        }

        let values = source.watch_values(&self.previous);
        let text = format_watch_text(&values, config.watch_hud_max_entries);
        self.previous = values;

        if !force && text == self.last_text {
            return;
        }

        sink.set_text(&text);
        log(LogCategory::WatchHud, LogLevel::Trace, || {
            format!("Watch HUD updated ({} bytes)", text.len())
        });
        self.cleared = text.is_empty();
        self.last_text = text;
    }
}
