//! Read-only view models for the two feed panes.
//!
//! Both panes are built from controller state on every render and never
//! mutate it. `Display` gives a plain-text rendering used by the headless
//! binary and the logs.

use crate::clock::format_time;
use crate::controller::FeedState;
use crate::model::{AdItem, ContentItem, FeedItem};
use crate::surface::MediaError;
use std::fmt;

/// Left pane: metadata of the current item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetailsPane<'a> {
    Loading,
    /// Loaded, but the feed had nothing in it.
    Empty,
    Content(&'a ContentItem),
    Ad(&'a AdItem),
}

impl<'a> DetailsPane<'a> {
    pub fn new(state: &'a FeedState) -> Self {
        match state.current_item() {
            Some(FeedItem::Content(item)) => DetailsPane::Content(item),
            Some(FeedItem::Ad(item)) => DetailsPane::Ad(item),
            None if state.is_loading() => DetailsPane::Loading,
            None => DetailsPane::Empty,
        }
    }

    /// Accessible name of the pane region.
    pub fn aria_label(&self) -> &'static str {
        match self {
            DetailsPane::Content(_) => "Content Details",
            DetailsPane::Ad(_) => "Advertisement Details",
            DetailsPane::Loading | DetailsPane::Empty => "Content loading",
        }
    }
}

impl fmt::Display for DetailsPane<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.aria_label())?;
        match self {
            DetailsPane::Loading => writeln!(f, "Loading..."),
            DetailsPane::Empty => writeln!(f, "No content available."),
            DetailsPane::Content(item) => {
                writeln!(f, "{}", item.title)?;
                if item.creator.role.is_empty() {
                    writeln!(f, "by {}", item.creator.name)?;
                } else {
                    writeln!(f, "by {} ({})", item.creator.name, item.creator.role)?;
                }
                writeln!(f, "{}", item.description)?;
                if !item.tags.is_empty() {
                    let tags: Vec<String> = item.tags.iter().map(|t| format!("#{}", t)).collect();
                    writeln!(f, "{}", tags.join(" "))?;
                }
                if !item.resources.is_empty() {
                    writeln!(f, "Resources:")?;
                    for resource in &item.resources {
                        writeln!(f, "  - {} <{}>", resource.title, resource.url)?;
                    }
                }
                Ok(())
            }
            DetailsPane::Ad(item) => {
                writeln!(f, "Sponsored by {}", item.advertiser)?;
                writeln!(f, "{}", item.title)?;
                writeln!(f, "{}", item.description)?;
                if !item.notes.is_empty() {
                    writeln!(f, "Note: {}", item.notes)?;
                }
                writeln!(f, "[{}] <{}>", item.cta.primary.label, item.cta.primary.url)?;
                writeln!(f, "[{}] <{}>", item.cta.secondary.label, item.cta.secondary.url)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavButton {
    pub label: &'static str,
    pub disabled: bool,
}

/// Play/mute controls and the clock readout.
#[derive(Debug, Clone, PartialEq)]
pub struct Transport {
    pub progress: f64,
    pub play_label: &'static str,
    pub mute_label: &'static str,
    pub time: String,
}

/// Right pane: transport controls around the media surface.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaPane {
    /// Hidden while a playback error is shown or there is nothing to play.
    pub transport: Option<Transport>,
    pub error: Option<String>,
    pub previous: NavButton,
    pub next: NavButton,
}

impl MediaPane {
    pub fn new(state: &FeedState, error: Option<&MediaError>) -> Self {
        let transport = match (state.current_item(), error) {
            (Some(_), None) => Some(Transport {
                progress: state.progress(),
                play_label: if state.is_playing() { "Pause" } else { "Play" },
                mute_label: if state.is_muted() { "Unmute" } else { "Mute" },
                time: format!(
                    "{} / {}",
                    format_time(state.current_time()),
                    format_time(state.duration())
                ),
            }),
            _ => None,
        };

        Self {
            transport,
            error: error.map(|e| e.to_string()),
            previous: NavButton {
                label: "Previous",
                disabled: state.is_previous_disabled(),
            },
            next: NavButton {
                label: "Next",
                disabled: state.is_next_disabled(),
            },
        }
    }
}

const BAR_WIDTH: usize = 20;

impl fmt::Display for NavButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.disabled {
            write!(f, "({})", self.label)
        } else {
            write!(f, "[{}]", self.label)
        }
    }
}

impl fmt::Display for MediaPane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(error) = &self.error {
            writeln!(f, "! {}", error)?;
        }
        if let Some(transport) = &self.transport {
            let filled = ((transport.progress / 100.0) * BAR_WIDTH as f64).round() as usize;
            let filled = filled.min(BAR_WIDTH);
            writeln!(
                f,
                "|{}{}| {}  [{}] [{}]",
                "#".repeat(filled),
                "-".repeat(BAR_WIDTH - filled),
                transport.time,
                transport.play_label,
                transport.mute_label
            )?;
        }
        writeln!(f, "{} {}", self.previous, self.next)
    }
}
