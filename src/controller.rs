//! Feed controller state machine.
//!
//! All mutation goes through [`reduce`], a pure `(state, command)` transition
//! that returns the next state plus the side effects the transition asked
//! for. [`FeedController`] wraps it and hands effects to the collaborators.

use crate::clock;
use crate::model::FeedItem;
use crate::notify::{AdImpression, ImpressionSink, Notice, Notifier};

/// Everything the feed view needs to render, owned by the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    items: Vec<FeedItem>,
    current_index: usize,
    is_loading: bool,
    is_playing: bool,
    is_muted: bool,
    current_time: f64,
    duration: f64,
    progress: f64,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current_index: 0,
            is_loading: true,
            is_playing: false,
            is_muted: false,
            current_time: 0.0,
            duration: 0.0,
            progress: 0.0,
        }
    }
}

impl FeedState {
    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_muted(&self) -> bool {
        self.is_muted
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// The item being shown, or `None` while loading or for an empty feed.
    pub fn current_item(&self) -> Option<&FeedItem> {
        if self.is_loading {
            return None;
        }
        self.items.get(self.current_index)
    }

    pub fn is_next_disabled(&self) -> bool {
        self.current_index + 1 >= self.items.len()
    }

    pub fn is_previous_disabled(&self) -> bool {
        self.current_index == 0
    }

    /// Logical position in the feed; changes only on load and navigation.
    fn position(&self) -> Option<usize> {
        self.current_item().map(|_| self.current_index)
    }

    fn reset_clock(&mut self) {
        self.current_time = 0.0;
        self.progress = 0.0;
    }

    fn go_to(&mut self, index: usize) {
        self.current_index = index;
        self.is_playing = true;
        self.reset_clock();
    }
}

/// Closed set of inputs to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load(Vec<FeedItem>),
    TogglePlay,
    ToggleMute,
    TimeUpdate { current_time: f64, duration: f64 },
    MetadataLoaded { duration: f64 },
    Ended,
    Next,
    Previous,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Load(_) => "load",
            Command::TogglePlay => "toggle_play",
            Command::ToggleMute => "toggle_mute",
            Command::TimeUpdate { .. } => "time_update",
            Command::MetadataLoaded { .. } => "metadata_loaded",
            Command::Ended => "ended",
            Command::Next => "next",
            Command::Previous => "previous",
        }
    }
}

/// Side effects requested by a transition, delivered after it completes.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Notify(Notice),
    Impression(AdImpression),
}

/// Apply one command. Never panics; invalid commands leave the state as is.
pub fn reduce(mut state: FeedState, command: Command) -> (FeedState, Vec<Effect>) {
    let mut effects = Vec::new();
    let before = state.position();

    if state.is_loading && !matches!(command, Command::Load(_)) {
        tracing::debug!("Ignoring {} while the feed is loading", command.name());
        return (state, effects);
    }

    match command {
        Command::Load(items) => {
            if !state.is_loading {
                tracing::warn!("Feed already loaded, ignoring second load");
                return (state, effects);
            }
            tracing::info!("Feed loaded with {} items", items.len());
            state.items = items;
            state.current_index = 0;
            state.is_loading = false;
            state.duration = 0.0;
            state.reset_clock();
        }
        Command::TogglePlay => state.is_playing = !state.is_playing,
        Command::ToggleMute => state.is_muted = !state.is_muted,
        Command::TimeUpdate {
            current_time,
            duration,
        } => {
            state.current_time = clock::sanitize_seconds(current_time);
            state.duration = clock::sanitize_seconds(duration);
            state.progress = clock::progress_percent(state.current_time, state.duration);
        }
        Command::MetadataLoaded { duration } => {
            state.duration = clock::sanitize_seconds(duration);
            state.progress = clock::progress_percent(state.current_time, state.duration);
        }
        Command::Next => {
            if state.is_next_disabled() {
                effects.push(Effect::Notify(Notice::end_of_content()));
            } else {
                let index = state.current_index + 1;
                state.go_to(index);
            }
        }
        Command::Ended => {
            if state.is_next_disabled() {
                state.is_playing = false;
                effects.push(Effect::Notify(Notice::end_of_content()));
            } else {
                let index = state.current_index + 1;
                state.go_to(index);
            }
        }
        Command::Previous => {
            if !state.is_previous_disabled() {
                let index = state.current_index - 1;
                state.go_to(index);
            }
        }
    }

    let after = state.position();
    if after != before {
        tracing::debug!("Feed position {:?} -> {:?}", before, after);
        if let Some(ad) = state.current_item().and_then(FeedItem::as_ad) {
            effects.push(Effect::Impression(AdImpression {
                id: ad.id.clone(),
                title: ad.title.clone(),
            }));
        }
    }

    (state, effects)
}

/// Owner of the feed state; forwards transition effects to collaborators.
pub struct FeedController {
    state: FeedState,
    notifier: Box<dyn Notifier>,
    impressions: Box<dyn ImpressionSink>,
}

impl FeedController {
    pub fn new(notifier: impl Notifier + 'static, impressions: impl ImpressionSink + 'static) -> Self {
        Self {
            state: FeedState::default(),
            notifier: Box::new(notifier),
            impressions: Box::new(impressions),
        }
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn dispatch(&mut self, command: Command) {
        let state = std::mem::take(&mut self.state);
        let (next, effects) = reduce(state, command);
        self.state = next;

        for effect in effects {
            match effect {
                Effect::Notify(notice) => self.notifier.notify(&notice),
                Effect::Impression(impression) => self.impressions.record(&impression),
            }
        }
    }

    pub fn load(&mut self, items: Vec<FeedItem>) {
        self.dispatch(Command::Load(items));
    }

    pub fn toggle_play(&mut self) {
        self.dispatch(Command::TogglePlay);
    }

    pub fn toggle_mute(&mut self) {
        self.dispatch(Command::ToggleMute);
    }

    pub fn report_time_update(&mut self, current_time: f64, duration: f64) {
        self.dispatch(Command::TimeUpdate {
            current_time,
            duration,
        });
    }

    pub fn report_metadata_loaded(&mut self, duration: f64) {
        self.dispatch(Command::MetadataLoaded { duration });
    }

    pub fn report_ended(&mut self) {
        self.dispatch(Command::Ended);
    }

    pub fn next(&mut self) {
        self.dispatch(Command::Next);
    }

    pub fn previous(&mut self) {
        self.dispatch(Command::Previous);
    }

    pub fn current_item(&self) -> Option<&FeedItem> {
        self.state.current_item()
    }

    pub fn is_next_disabled(&self) -> bool {
        self.state.is_next_disabled()
    }

    pub fn is_previous_disabled(&self) -> bool {
        self.state.is_previous_disabled()
    }
}
