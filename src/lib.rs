//! WiseUp sequential media feed.
//!
//! A linear feed of lessons and advertisements played one video at a time,
//! with keyboard navigation, ad impression tracking and a playback clock.

pub mod api;
pub mod clock;
pub mod config;
pub mod controller;
pub mod keyboard;
pub mod model;
pub mod notify;
pub mod panes;
pub mod surface;
pub mod view;

#[cfg(feature = "player")]
pub mod gst_element;
#[cfg(feature = "player")]
pub mod renderer;

pub use clock::{format_time, progress_percent};
pub use controller::{reduce, Command, Effect, FeedController, FeedState};
pub use keyboard::{Key, KeyEvent, KeyboardHub, ListenerGuard};
pub use model::{AdItem, ContentItem, FeedItem, ItemId, ItemKind};
pub use notify::{AdImpression, ImpressionSink, Notice, Notifier};
pub use panes::{DetailsPane, MediaPane};
pub use surface::{
    ElementEvent, MediaElement, MediaError, MediaErrorKind, MediaSurface, PlayOutcome,
    PlayRejection,
};
pub use view::FeedView;
