//! GStreamer-backed media element.
//!
//! Wraps a `playbin` whose video sink is an appsink, so decoded frames can
//! be drawn by the SDL renderer. Bus messages and position queries are
//! translated into [`ElementEvent`]s.

use crate::surface::{settled, ElementEvent, MediaElement, MediaError, MediaErrorKind, PlayOutcome};
use anyhow::{Context, Result};
use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Interval between time updates while playing.
const TIME_UPDATE_INTERVAL: Duration = Duration::from_millis(250);

/// Video frame extracted from the pipeline.
#[derive(Clone)]
pub struct VideoFrame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub struct GstElement {
    playbin: gst::Element,
    bus: gst::Bus,
    current_frame: Arc<Mutex<Option<VideoFrame>>>,
    pending: VecDeque<ElementEvent>,
    metadata_sent: bool,
    last_time_update: Option<Instant>,
}

impl GstElement {
    /// Initialize GStreamer (call once at startup).
    pub fn init() -> Result<()> {
        gst::init().context("Failed to initialize GStreamer")?;
        tracing::info!("GStreamer initialized: {}", gst::version_string());
        Ok(())
    }

    pub fn new() -> Result<Self> {
        let playbin = gst::ElementFactory::make("playbin")
            .name("feed-player")
            .build()
            .context("Failed to create playbin")?;

        // App sink for extracting frames
        let appsink = gst_app::AppSink::builder()
            .name("sink")
            .caps(
                &gst_video::VideoCapsBuilder::new()
                    .format(gst_video::VideoFormat::Rgba)
                    .build(),
            )
            .build();

        let current_frame = Arc::new(Mutex::new(None::<VideoFrame>));
        let frame_slot = current_frame.clone();

        appsink.set_callbacks(
            gst_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let sample = appsink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                    let buffer = sample.buffer().ok_or(gst::FlowError::Error)?;
                    let caps = sample.caps().ok_or(gst::FlowError::Error)?;

                    let video_info =
                        gst_video::VideoInfo::from_caps(caps).map_err(|_| gst::FlowError::Error)?;
                    let map = buffer.map_readable().map_err(|_| gst::FlowError::Error)?;

                    let frame = VideoFrame {
                        pixels: map.as_slice().to_vec(),
                        width: video_info.width(),
                        height: video_info.height(),
                    };

                    if let Ok(mut guard) = frame_slot.lock() {
                        *guard = Some(frame);
                    }

                    Ok(gst::FlowSuccess::Ok)
                })
                .build(),
        );

        playbin.set_property("video-sink", appsink.upcast_ref::<gst::Element>());

        let bus = playbin.bus().context("Playbin has no bus")?;

        Ok(Self {
            playbin,
            bus,
            current_frame,
            pending: VecDeque::new(),
            metadata_sent: false,
            last_time_update: None,
        })
    }

    /// Latest decoded frame, if any.
    pub fn current_frame(&self) -> Option<VideoFrame> {
        self.current_frame.lock().ok()?.clone()
    }

    fn position(&self) -> f64 {
        self.playbin
            .query_position::<gst::ClockTime>()
            .map(seconds)
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.playbin.query_duration::<gst::ClockTime>().map(seconds)
    }

    fn is_playing(&self) -> bool {
        self.playbin.current_state() == gst::State::Playing
    }

    fn metadata_event(&mut self, force: bool) -> Option<ElementEvent> {
        if self.metadata_sent && !force {
            return None;
        }
        let duration = self.duration()?;
        self.metadata_sent = true;
        Some(ElementEvent::LoadedMetadata { duration })
    }
}

fn seconds(time: gst::ClockTime) -> f64 {
    time.nseconds() as f64 / 1_000_000_000.0
}

/// Map a GStreamer error onto the HTML media error codes.
fn error_code(err: &gst::glib::Error) -> Option<u16> {
    if let Some(kind) = err.kind::<gst::ResourceError>() {
        return match kind {
            gst::ResourceError::NotFound
            | gst::ResourceError::OpenRead
            | gst::ResourceError::Read
            | gst::ResourceError::Busy
            | gst::ResourceError::NotAuthorized => Some(MediaErrorKind::CODE_NETWORK),
            _ => None,
        };
    }
    if let Some(kind) = err.kind::<gst::StreamError>() {
        return match kind {
            gst::StreamError::Decode | gst::StreamError::Demux => Some(MediaErrorKind::CODE_DECODE),
            gst::StreamError::TypeNotFound
            | gst::StreamError::WrongType
            | gst::StreamError::CodecNotFound
            | gst::StreamError::Format => Some(MediaErrorKind::CODE_SRC_NOT_SUPPORTED),
            _ => None,
        };
    }
    None
}

impl MediaElement for GstElement {
    fn set_source(&mut self, source: &str) {
        if let Err(e) = self.playbin.set_state(gst::State::Null) {
            tracing::warn!("Failed to reset pipeline: {:?}", e);
        }
        if let Ok(mut guard) = self.current_frame.lock() {
            *guard = None;
        }
        self.metadata_sent = false;
        self.last_time_update = None;

        tracing::debug!("Loading media source: {}", source);
        self.playbin.set_property("uri", source);

        // Preroll so duration becomes known before playback starts.
        if let Err(e) = self.playbin.set_state(gst::State::Paused) {
            self.pending.push_back(ElementEvent::Error {
                code: Some(MediaErrorKind::CODE_SRC_NOT_SUPPORTED),
                detail: Some(format!("{:?}", e)),
            });
        }
    }

    fn play(&mut self) -> PlayOutcome {
        settled(
            self.playbin
                .set_state(gst::State::Playing)
                .map(|_| ())
                .map_err(|e| MediaError::new(MediaErrorKind::Unknown, Some(format!("{:?}", e))).into()),
        )
    }

    fn pause(&mut self) {
        if let Err(e) = self.playbin.set_state(gst::State::Paused) {
            tracing::warn!("Failed to pause pipeline: {:?}", e);
        }
    }

    fn set_muted(&mut self, muted: bool) {
        self.playbin.set_property("mute", muted);
    }

    fn poll_event(&mut self) -> Option<ElementEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }

        while let Some(msg) = self.bus.pop() {
            match msg.view() {
                gst::MessageView::Eos(_) => return Some(ElementEvent::Ended),
                gst::MessageView::Error(err) => {
                    tracing::error!("GStreamer error: {} ({:?})", err.error(), err.debug());
                    return Some(ElementEvent::Error {
                        code: error_code(&err.error()),
                        detail: Some(err.error().to_string()),
                    });
                }
                gst::MessageView::AsyncDone(_) => {
                    if let Some(event) = self.metadata_event(false) {
                        return Some(event);
                    }
                }
                gst::MessageView::DurationChanged(_) => {
                    if let Some(event) = self.metadata_event(true) {
                        return Some(event);
                    }
                }
                _ => {}
            }
        }

        if !self.is_playing() {
            return None;
        }
        let due = self
            .last_time_update
            .map_or(true, |at| at.elapsed() >= TIME_UPDATE_INTERVAL);
        if !due {
            return None;
        }
        self.last_time_update = Some(Instant::now());
        Some(ElementEvent::TimeUpdate {
            current_time: self.position(),
            duration: self.duration().unwrap_or(0.0),
        })
    }
}

impl Drop for GstElement {
    fn drop(&mut self) {
        let _ = self.playbin.set_state(gst::State::Null);
    }
}
