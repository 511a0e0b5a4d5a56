//! Feed item model.
//!
//! A feed is an ordered list of lessons and advertisements. Items are
//! immutable once loaded; the controller only ever reads them.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Identifier of a feed item. The backend hands out numeric ids for
/// database rows and string ids for everything else, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => ItemId(n.to_string()),
            Raw::Text(s) => ItemId(s),
        })
    }
}

/// Person presenting a lesson.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Creator {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub avatar: String,
}

/// Supplementary link attached to a lesson.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Resource {
    pub title: String,
    pub url: String,
}

/// A short-form lesson.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ContentItem {
    pub id: ItemId,
    pub title: String,
    pub creator: Creator,
    #[serde(rename = "video")]
    pub source: String,
    pub description: String,
    #[serde(default)]
    pub resources: Vec<Resource>,
    /// Distinct topic tags, in the order the backend lists them.
    #[serde(default, deserialize_with = "distinct_tags")]
    pub tags: Vec<String>,
}

fn distinct_tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let mut tags = Vec::<String>::deserialize(deserializer)?;
    let mut seen = HashSet::new();
    tags.retain(|tag| seen.insert(tag.clone()));
    Ok(tags)
}

/// One call-to-action button on an advertisement.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CallToAction {
    #[serde(rename = "text")]
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CallsToAction {
    pub primary: CallToAction,
    pub secondary: CallToAction,
}

/// A sponsored video slotted between lessons.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AdItem {
    pub id: ItemId,
    pub advertiser: String,
    pub title: String,
    #[serde(rename = "video")]
    pub source: String,
    pub description: String,
    #[serde(default)]
    pub notes: String,
    pub cta: CallsToAction,
}

/// Discriminant of a [`FeedItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Content,
    Ad,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Content => "content",
            ItemKind::Ad => "ad",
        }
    }
}

/// One unit of the feed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeedItem {
    Content(ContentItem),
    Ad(AdItem),
}

impl FeedItem {
    pub fn kind(&self) -> ItemKind {
        match self {
            FeedItem::Content(_) => ItemKind::Content,
            FeedItem::Ad(_) => ItemKind::Ad,
        }
    }

    pub fn id(&self) -> &ItemId {
        match self {
            FeedItem::Content(c) => &c.id,
            FeedItem::Ad(a) => &a.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            FeedItem::Content(c) => &c.title,
            FeedItem::Ad(a) => &a.title,
        }
    }

    /// Media source reference handed to the media surface.
    pub fn source(&self) -> &str {
        match self {
            FeedItem::Content(c) => &c.source,
            FeedItem::Ad(a) => &a.source,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            FeedItem::Content(c) => &c.description,
            FeedItem::Ad(a) => &a.description,
        }
    }

    pub fn as_ad(&self) -> Option<&AdItem> {
        match self {
            FeedItem::Ad(a) => Some(a),
            FeedItem::Content(_) => None,
        }
    }
}

impl From<ContentItem> for FeedItem {
    fn from(item: ContentItem) -> Self {
        FeedItem::Content(item)
    }
}

impl From<AdItem> for FeedItem {
    fn from(item: AdItem) -> Self {
        FeedItem::Ad(item)
    }
}

/// Drop items that would break feed invariants: an empty media source or
/// an id already seen earlier in the list. Returns the number removed.
pub fn retain_playable(items: &mut Vec<FeedItem>) -> usize {
    let before = items.len();
    let mut seen = HashSet::new();
    items.retain(|item| {
        if item.source().trim().is_empty() {
            tracing::warn!("Dropping feed item {} without a media source", item.id());
            return false;
        }
        if !seen.insert(item.id().clone()) {
            tracing::warn!("Dropping duplicate feed item {}", item.id());
            return false;
        }
        true
    });
    before - items.len()
}

/// Feed bundled with the binary, used when the backend is unreachable.
pub fn sample_feed() -> Vec<FeedItem> {
    vec![
        FeedItem::Content(ContentItem {
            id: ItemId::new("1"),
            title: "Introduction to Job Interviews".into(),
            creator: Creator {
                name: "Sarah Johnson".into(),
                role: "Career Coach".into(),
                avatar: "/images/avatars/sarah.jpg".into(),
            },
            source: "https://example.com/videos/interview-tips.mp4".into(),
            description: "Learn the basics of job interviews and how to prepare effectively."
                .into(),
            resources: vec![
                Resource {
                    title: "Interview Checklist".into(),
                    url: "https://example.com/resources/checklist.pdf".into(),
                },
                Resource {
                    title: "Common Questions".into(),
                    url: "https://example.com/resources/questions.pdf".into(),
                },
            ],
            tags: vec!["interview".into(), "career".into(), "preparation".into()],
        }),
        FeedItem::Ad(AdItem {
            id: ItemId::new("2"),
            advertiser: "TechCorp Solutions".into(),
            title: "Join Our Internship Program".into(),
            source: "https://example.com/videos/techcorp-ad.mp4".into(),
            description: "Gain valuable experience with our 3-month paid internship program."
                .into(),
            notes: "Applications close on June 30th. Remote positions available.".into(),
            cta: CallsToAction {
                primary: CallToAction {
                    label: "Apply Now".into(),
                    url: "https://techcorp.example.com/apply".into(),
                },
                secondary: CallToAction {
                    label: "Learn More".into(),
                    url: "https://techcorp.example.com/internships".into(),
                },
            },
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_tags_collapse_in_listing_order() {
        let json = r#"{"type": "content", "id": 3, "title": "Salary Talks",
            "creator": {"name": "Mia"}, "video": "https://cdn.example.com/s.mp4",
            "description": "Negotiate.", "tags": ["career", "money", "career"]}"#;

        let item: FeedItem = serde_json::from_str(json).unwrap();
        let FeedItem::Content(content) = item else {
            panic!("expected content");
        };
        assert_eq!(content.tags, vec!["career", "money"]);
    }

    #[test]
    fn deserializes_tagged_items_with_numeric_ids() {
        let json = r#"[
            {"type": "content", "id": 7, "title": "CV Writing Tips",
             "creator": {"name": "HR Expert John", "avatar": "/john.jpg"},
             "video": "https://cdn.example.com/cv.mp4",
             "description": "Master the art of CV writing.",
             "tags": ["cv", "resume"]},
            {"type": "ad", "id": "ad-1", "advertiser": "TechSkills Academy",
             "title": "Learn to code", "video": "https://cdn.example.com/ad.mp4",
             "description": "Bootcamp",
             "cta": {"primary": {"text": "Enroll", "url": "https://a.example"},
                     "secondary": {"text": "Details", "url": "https://b.example"}}}
        ]"#;

        let items: Vec<FeedItem> = serde_json::from_str(json).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind(), ItemKind::Content);
        assert_eq!(items[0].id().as_str(), "7");
        assert_eq!(items[1].id().as_str(), "ad-1");

        let FeedItem::Content(content) = &items[0] else {
            panic!("expected content");
        };
        assert_eq!(content.creator.role, "");
        assert!(content.resources.is_empty());

        let ad = items[1].as_ad().unwrap();
        assert_eq!(ad.cta.primary.label, "Enroll");
        assert_eq!(ad.notes, "");
    }

    #[test]
    fn retain_playable_drops_sourceless_and_duplicate_items() {
        let mut items = sample_feed();
        let mut dup = items[0].clone();
        if let FeedItem::Content(c) = &mut dup {
            c.title = "Duplicate".into();
        }
        let mut silent = items[1].clone();
        if let FeedItem::Ad(a) = &mut silent {
            a.id = ItemId::new("99");
            a.source = "  ".into();
        }
        items.push(dup);
        items.push(silent);

        assert_eq!(retain_playable(&mut items), 2);
        assert_eq!(items, sample_feed());
    }

    #[test]
    fn sample_feed_satisfies_invariants() {
        let mut items = sample_feed();
        assert_eq!(retain_playable(&mut items), 0);
        assert_eq!(items[0].kind(), ItemKind::Content);
        assert_eq!(items[1].kind(), ItemKind::Ad);
    }
}
