// Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use wiseup_feed::model::{CallToAction, CallsToAction, Creator};
use wiseup_feed::notify::{AdImpression, ImpressionSink, Notice, Notifier};
use wiseup_feed::surface::{ElementEvent, MediaElement, PlayOutcome, PlayRejection};
use wiseup_feed::{AdItem, ContentItem, FeedController, FeedItem, ItemId};

pub fn content(id: &str, title: &str) -> FeedItem {
    FeedItem::Content(ContentItem {
        id: ItemId::new(id),
        title: title.into(),
        creator: Creator {
            name: "Sarah Johnson".into(),
            role: "Career Coach".into(),
            avatar: "/images/avatars/sarah.jpg".into(),
        },
        source: format!("https://cdn.example.com/{}.mp4", id),
        description: format!("{} lesson", title),
        resources: Vec::new(),
        tags: vec!["career".into()],
    })
}

pub fn ad(id: &str, title: &str) -> FeedItem {
    let link = |label: &str| CallToAction {
        label: label.into(),
        url: format!("https://ads.example.com/{}", id),
    };
    FeedItem::Ad(AdItem {
        id: ItemId::new(id),
        advertiser: format!("{} Inc.", title),
        title: title.into(),
        source: format!("https://cdn.example.com/{}.mp4", id),
        description: "Sponsored".into(),
        notes: String::new(),
        cta: CallsToAction {
            primary: link("Apply Now"),
            secondary: link("Learn More"),
        },
    })
}

/// The two-item feed used by the walkthrough scenarios.
pub fn intro_and_ad() -> Vec<FeedItem> {
    vec![content("1", "Intro"), ad("2", "TechCorp")]
}

/// Collaborator that remembers every notice and impression.
#[derive(Default)]
pub struct Recorder {
    notices: Mutex<Vec<Notice>>,
    impressions: Mutex<Vec<AdImpression>>,
}

impl Recorder {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn impression_titles(&self) -> Vec<String> {
        self.impressions
            .lock()
            .unwrap()
            .iter()
            .map(|i| i.title.clone())
            .collect()
    }
}

impl Notifier for Recorder {
    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

impl ImpressionSink for Recorder {
    fn record(&self, impression: &AdImpression) {
        self.impressions.lock().unwrap().push(impression.clone());
    }
}

pub fn recorded_controller() -> (FeedController, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let controller = FeedController::new(recorder.clone(), recorder.clone());
    (controller, recorder)
}

/// In-memory media element driven by the test.
#[derive(Default)]
pub struct ScriptedElement {
    pub calls: Vec<String>,
    pub events: VecDeque<ElementEvent>,
    /// Outcomes handed to upcoming play requests; empty means success.
    pub play_results: VecDeque<Result<(), PlayRejection>>,
    /// Leave play requests unresolved until `settle_play` is called.
    pub defer_play: bool,
    deferred: Vec<oneshot::Sender<Result<(), PlayRejection>>>,
}

impl ScriptedElement {
    pub fn push(&mut self, event: ElementEvent) {
        self.events.push_back(event);
    }

    pub fn settle_play(&mut self, result: Result<(), PlayRejection>) {
        if let Some(tx) = self.deferred.pop() {
            let _ = tx.send(result);
        }
    }
}

impl MediaElement for ScriptedElement {
    fn set_source(&mut self, source: &str) {
        self.calls.push(format!("source {}", source));
    }

    fn play(&mut self) -> PlayOutcome {
        self.calls.push("play".into());
        let (tx, rx) = oneshot::channel();
        if self.defer_play {
            self.deferred.push(tx);
        } else {
            let _ = tx.send(self.play_results.pop_front().unwrap_or(Ok(())));
        }
        rx
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
