//! Media surface adapter.
//!
//! Owns one [`MediaElement`] and reconciles the controller's declared intent
//! (source, playing, muted) against the element's imperative API. Element
//! lifecycle events come back out as controller [`Command`]s.

use crate::controller::{Command, FeedState};
use crate::model::ItemId;
use thiserror::Error;
use tokio::sync::oneshot;

/// Category of a playback failure, following the HTML media error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaErrorKind {
    Aborted,
    Network,
    Decode,
    FormatUnsupported,
    Unknown,
}

impl MediaErrorKind {
    pub const CODE_ABORTED: u16 = 1;
    pub const CODE_NETWORK: u16 = 2;
    pub const CODE_DECODE: u16 = 3;
    pub const CODE_SRC_NOT_SUPPORTED: u16 = 4;

    pub fn from_code(code: Option<u16>) -> Self {
        match code {
            Some(Self::CODE_ABORTED) => MediaErrorKind::Aborted,
            Some(Self::CODE_NETWORK) => MediaErrorKind::Network,
            Some(Self::CODE_DECODE) => MediaErrorKind::Decode,
            Some(Self::CODE_SRC_NOT_SUPPORTED) => MediaErrorKind::FormatUnsupported,
            _ => MediaErrorKind::Unknown,
        }
    }

    /// Message shown in the media pane.
    pub fn message(&self) -> &'static str {
        match self {
            MediaErrorKind::Aborted => "Video playback was aborted.",
            MediaErrorKind::Network => "A network error caused the video download to fail.",
            MediaErrorKind::Decode => "The video could not be decoded.",
            MediaErrorKind::FormatUnsupported => "This video format is not supported.",
            MediaErrorKind::Unknown => "An unknown error occurred while playing the video.",
        }
    }
}

/// A playback error raised by the element or by a rejected play request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .kind.message())]
pub struct MediaError {
    pub kind: MediaErrorKind,
    /// Raw detail from the underlying element, if any.
    pub detail: Option<String>,
}

impl MediaError {
    pub fn new(kind: MediaErrorKind, detail: Option<String>) -> Self {
        Self { kind, detail }
    }
}

/// Why a play request did not start playback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlayRejection {
    /// The runtime refused autoplay; the user has to start playback.
    #[error("playback requires user interaction")]
    NotAllowed,
    #[error(transparent)]
    Media(#[from] MediaError),
}

/// Outcome of a play request, resolved whenever the element knows it.
pub type PlayOutcome = oneshot::Receiver<Result<(), PlayRejection>>;

/// Build an outcome that is already settled.
pub fn settled(result: Result<(), PlayRejection>) -> PlayOutcome {
    let (tx, rx) = oneshot::channel();
    let _ = tx.send(result);
    rx
}

/// Lifecycle events reported by an element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementEvent {
    TimeUpdate { current_time: f64, duration: f64 },
    LoadedMetadata { duration: f64 },
    Ended,
    Error { code: Option<u16>, detail: Option<String> },
}

/// The platform primitive decoding and rendering one video at a time.
pub trait MediaElement {
    /// Replace the current source, stopping the old one. Playback position
    /// returns to zero.
    fn set_source(&mut self, source: &str);
    fn play(&mut self) -> PlayOutcome;
    fn pause(&mut self);
    fn set_muted(&mut self, muted: bool);
    /// Next pending lifecycle event, if any.
    fn poll_event(&mut self) -> Option<ElementEvent>;
}

/// Declared playback intent derived from controller state.
#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub source: Option<(ItemId, String)>,
    pub playing: bool,
    pub muted: bool,
}

impl Intent {
    pub fn from_state(state: &FeedState) -> Self {
        Self {
            source: state
                .current_item()
                .map(|item| (item.id().clone(), item.source().to_string())),
            playing: state.is_playing(),
            muted: state.is_muted(),
        }
    }
}

type ErrorCallback = Box<dyn FnMut(&MediaError)>;

/// Adapter between the controller and a [`MediaElement`].
pub struct MediaSurface<E: MediaElement> {
    element: E,
    source: Option<ItemId>,
    playing: bool,
    muted: Option<bool>,
    pending_play: Option<PlayOutcome>,
    error: Option<MediaError>,
    on_error: Option<ErrorCallback>,
}

impl<E: MediaElement> MediaSurface<E> {
    pub fn new(element: E) -> Self {
        Self {
            element,
            source: None,
            playing: false,
            muted: None,
            pending_play: None,
            error: None,
            on_error: None,
        }
    }

    /// Register the upward error callback.
    pub fn on_error(&mut self, callback: impl FnMut(&MediaError) + 'static) {
        self.on_error = Some(Box::new(callback));
    }

    /// Playback error currently on display, if any.
    pub fn error(&self) -> Option<&MediaError> {
        self.error.as_ref()
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut E {
        &mut self.element
    }

    /// Push declared intent down to the element, issuing only the calls
    /// needed to close the gap.
    pub fn sync(&mut self, intent: &Intent) {
        let source_changed = match (&self.source, &intent.source) {
            (Some(current), Some((id, _))) => current != id,
            (None, Some(_)) => true,
            _ => false,
        };

        if self.muted != Some(intent.muted) {
            self.element.set_muted(intent.muted);
            self.muted = Some(intent.muted);
        }

        if source_changed {
            if let Some((id, source)) = &intent.source {
                tracing::debug!("Media source changed to {} ({})", id, source);
                let stale = std::iter::from_fn(|| self.element.poll_event()).count();
                if stale > 0 {
                    tracing::debug!("Discarded {} events from the previous source", stale);
                }
                self.element.set_source(source);
                self.source = Some(id.clone());
                self.error = None;
                self.pending_play = None;
                self.playing = intent.playing;
                if intent.playing {
                    self.request_play();
                }
            }
            return;
        }

        if intent.playing != self.playing {
            self.playing = intent.playing;
            if intent.playing {
                self.request_play();
            } else {
                self.pending_play = None;
                self.element.pause();
            }
        }
    }

    fn request_play(&mut self) {
        self.pending_play = Some(self.element.play());
    }

    /// Drain element events and settled play requests into commands for
    /// the controller. Draining stops after `Ended`; anything the element
    /// queued behind it belongs to the finished source.
    pub fn poll(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();

        if let Some(outcome) = self.pending_play.as_mut() {
            match outcome.try_recv() {
                Ok(Ok(())) => self.pending_play = None,
                Ok(Err(rejection)) => {
                    self.pending_play = None;
                    if let Some(command) = self.handle_rejection(rejection) {
                        commands.push(command);
                    }
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    tracing::debug!("Play request dropped without an outcome");
                    self.pending_play = None;
                }
            }
        }

        while let Some(event) = self.element.poll_event() {
            match event {
                ElementEvent::TimeUpdate {
                    current_time,
                    duration,
                } => commands.push(Command::TimeUpdate {
                    current_time,
                    duration,
                }),
                ElementEvent::LoadedMetadata { duration } => {
                    self.error = None;
                    commands.push(Command::MetadataLoaded { duration });
                }
                ElementEvent::Ended => {
                    commands.push(Command::Ended);
                    break;
                }
                ElementEvent::Error { code, detail } => {
                    let error = MediaError::new(MediaErrorKind::from_code(code), detail);
                    tracing::warn!("Media element error: {} ({:?})", error, error.detail);
                    self.raise(error);
                }
            }
        }

        commands
    }

    /// Resync declared playing state with the paused element. Returns the
    /// correcting command, issued at most once per rejected request.
    fn handle_rejection(&mut self, rejection: PlayRejection) -> Option<Command> {
        match &rejection {
            PlayRejection::NotAllowed => {
                tracing::info!("Autoplay was blocked, waiting for user interaction");
            }
            PlayRejection::Media(error) => {
                tracing::warn!("Play request failed: {}", error);
                self.raise(error.clone());
            }
        }

        if !self.playing {
            return None;
        }
        self.playing = false;
        Some(Command::TogglePlay)
    }

    fn raise(&mut self, error: MediaError) {
        if let Some(callback) = self.on_error.as_mut() {
            callback(&error);
        }
        self.error = Some(error);
    }
}

impl<E: MediaElement> Drop for MediaSurface<E> {
    fn drop(&mut self) {
        if self.playing {
            self.element.pause();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Probe {
        calls: Vec<String>,
        events: VecDeque<ElementEvent>,
        next_play: Option<Result<(), PlayRejection>>,
    }

    impl MediaElement for Probe {
        fn set_source(&mut self, source: &str) {
            self.calls.push(format!("source {}", source));
        }

        fn play(&mut self) -> PlayOutcome {
            self.calls.push("play".into());
            settled(self.next_play.take().unwrap_or(Ok(())))
        }

        fn pause(&mut self) {
            self.calls.push("pause".into());
        }

        fn set_muted(&mut self, muted: bool) {
            self.calls.push(format!("muted {}", muted));
        }

        fn poll_event(&mut self) -> Option<ElementEvent> {
            self.events.pop_front()
        }
    }

    fn intent(id: &str, playing: bool, muted: bool) -> Intent {
        Intent {
            source: Some((ItemId::new(id), format!("{}.mp4", id))),
            playing,
            muted,
        }
    }

    #[test]
    fn maps_error_codes() {
        assert_eq!(MediaErrorKind::from_code(Some(1)), MediaErrorKind::Aborted);
        assert_eq!(MediaErrorKind::from_code(Some(2)), MediaErrorKind::Network);
        assert_eq!(MediaErrorKind::from_code(Some(3)), MediaErrorKind::Decode);
        assert_eq!(
            MediaErrorKind::from_code(Some(4)),
            MediaErrorKind::FormatUnsupported
        );
        assert_eq!(MediaErrorKind::from_code(Some(42)), MediaErrorKind::Unknown);
        assert_eq!(MediaErrorKind::from_code(None), MediaErrorKind::Unknown);
    }

    #[test]
    fn sync_only_issues_needed_calls() {
        let mut surface = MediaSurface::new(Probe::default());
        surface.sync(&intent("a", false, false));
        surface.sync(&intent("a", false, false));
        surface.sync(&intent("a", true, false));
        surface.sync(&intent("a", true, true));
        surface.sync(&intent("a", false, true));

        assert_eq!(
            surface.element().calls,
            vec!["muted false", "source a.mp4", "play", "muted true", "pause"]
        );
    }

    #[test]
    fn new_source_plays_when_intent_is_playing() {
        let mut surface = MediaSurface::new(Probe::default());
        surface.sync(&intent("a", true, false));
        surface.sync(&intent("b", true, false));

        assert_eq!(
            surface.element().calls,
            vec!["muted false", "source a.mp4", "play", "source b.mp4", "play"]
        );
    }

    #[test]
    fn permission_rejection_resyncs_without_error() {
        let mut surface = MediaSurface::new(Probe {
            next_play: Some(Err(PlayRejection::NotAllowed)),
            ..Probe::default()
        });
        surface.sync(&intent("a", true, false));

        assert_eq!(surface.poll(), vec![Command::TogglePlay]);
        assert!(surface.error().is_none());
        assert!(surface.poll().is_empty());
    }

    #[test]
    fn media_rejection_records_error() {
        let mut surface = MediaSurface::new(Probe {
            next_play: Some(Err(MediaError::new(MediaErrorKind::Network, None).into())),
            ..Probe::default()
        });
        surface.sync(&intent("a", true, false));

        assert_eq!(surface.poll(), vec![Command::TogglePlay]);
        assert_eq!(surface.error().unwrap().kind, MediaErrorKind::Network);
    }

    #[test]
    fn metadata_clears_error() {
        let mut surface = MediaSurface::new(Probe::default());
        surface.sync(&intent("a", false, false));
        surface.element_mut().events.push_back(ElementEvent::Error {
            code: Some(3),
            detail: Some("bad frame".into()),
        });
        assert!(surface.poll().is_empty());
        assert_eq!(surface.error().unwrap().kind, MediaErrorKind::Decode);

        surface
            .element_mut()
            .events
            .push_back(ElementEvent::LoadedMetadata { duration: 12.0 });
        assert_eq!(
            surface.poll(),
            vec![Command::MetadataLoaded { duration: 12.0 }]
        );
        assert!(surface.error().is_none());
    }

    #[test]
    fn polling_stops_after_ended() {
        let mut surface = MediaSurface::new(Probe::default());
        surface.sync(&intent("a", true, false));
        surface.element_mut().events.extend([
            ElementEvent::Ended,
            ElementEvent::TimeUpdate {
                current_time: 40.0,
                duration: 40.0,
            },
        ]);

        assert_eq!(surface.poll(), vec![Command::Ended]);
        assert_eq!(surface.element().events.len(), 1);
    }

    #[test]
    fn source_change_discards_events_of_previous_source() {
        let mut surface = MediaSurface::new(Probe::default());
        surface.sync(&intent("a", true, false));
        surface
            .element_mut()
            .events
            .push_back(ElementEvent::TimeUpdate {
                current_time: 40.0,
                duration: 40.0,
            });

        surface.sync(&intent("b", true, false));
        assert!(surface.element().events.is_empty());
        assert!(surface.poll().is_empty());
    }
}
