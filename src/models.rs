//! data types for reddit api payloads and the posts/comments built from them
use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// the author string written for deleted, removed or missing accounts
pub const DELETED_AUTHOR: &str = "[deleted]";

/// Who wrote a post or comment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Author {
    /// a live account
    Named(String),
    /// the account is gone or reddit didn't say
    #[default]
    Deleted,
}

impl From<Option<String>> for Author {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(name) if !name.trim().is_empty() && name != DELETED_AUTHOR => Self::Named(name),
            _ => Self::Deleted,
        }
    }
}

impl Author {
    /// the name to export
    pub fn as_str(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Deleted => DELETED_AUTHOR,
        }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// convert reddit's float `created_utc` into a timestamp
pub fn timestamp_from_epoch(secs: f64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs.floor() as i64, 0).unwrap_or_default()
}

/// A `{ "kind": "Listing", "data": { ... } }` envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Listing {
    /// the listing body
    #[serde(default)]
    pub data: ListingData,
}

/// The body of a listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingData {
    /// cursor for the next page, if there is one
    #[serde(default)]
    pub after: Option<String>,
    /// the things on this page
    #[serde(default)]
    pub children: Vec<RawThing>,
}

/// A single entry of a listing: the payload shape depends on `kind`
/// (`t3` link, `t1` comment, `more` placeholder).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawThing {
    /// the thing's kind tag
    #[serde(default)]
    pub kind: String,
    /// the untyped payload
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A decoded listing entry.
#[derive(Debug, Clone)]
pub enum Thing {
    /// a post
    Link(RawPost),
    /// a comment
    Comment(RawComment),
    /// a "load more comments" / "continue this thread" placeholder
    More(MoreStub),
    /// anything else reddit decides to send
    Unknown(String),
}

impl RawThing {
    /// decode the payload according to its kind
    pub fn decode(self) -> serde_json::Result<Thing> {
        Ok(match self.kind.as_str() {
            "t3" => Thing::Link(serde_json::from_value(self.data)?),
            "t1" => Thing::Comment(serde_json::from_value(self.data)?),
            "more" => Thing::More(serde_json::from_value(self.data)?),
            _ => Thing::Unknown(self.kind),
        })
    }
}

/// A post as reddit sends it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPost {
    /// base36 id without the `t3_` prefix
    #[serde(default)]
    pub id: String,
    /// the title
    #[serde(default)]
    pub title: String,
    /// the author's username (absent or `[deleted]` for deleted accounts)
    #[serde(default)]
    pub author: Option<String>,
    /// creation time as unix seconds
    #[serde(default)]
    pub created_utc: f64,
    /// net score
    #[serde(default)]
    pub score: i64,
    /// fraction of votes that are upvotes
    #[serde(default)]
    pub upvote_ratio: f64,
    /// comment count as reported by the listing
    #[serde(default)]
    pub num_comments: i64,
    /// self text (empty for link posts)
    #[serde(default)]
    pub selftext: String,
    /// the linked url (the post's own permalink for self posts)
    #[serde(default)]
    pub url: String,
}

/// A comment as reddit sends it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawComment {
    /// base36 id without the `t1_` prefix
    #[serde(default)]
    pub id: String,
    /// fullname of the parent (`t3_...` for top level comments)
    #[serde(default)]
    pub parent_id: String,
    /// the author's username
    #[serde(default)]
    pub author: Option<String>,
    /// the comment text
    #[serde(default)]
    pub body: String,
    /// net score
    #[serde(default)]
    pub score: i64,
    /// creation time as unix seconds
    #[serde(default)]
    pub created_utc: f64,
    /// either `""` or a nested listing of replies
    #[serde(default)]
    pub replies: serde_json::Value,
}

impl RawComment {
    /// the reply listing, if this comment carries one
    pub fn take_replies(&mut self) -> Option<Listing> {
        match self.replies.take() {
            serde_json::Value::Object(map) => {
                serde_json::from_value(serde_json::Value::Object(map)).ok()
            }
            _ => None,
        }
    }
}

/// A placeholder for comments that weren't included in a response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoreStub {
    /// the placeholder's own id (`_` for thread continuations)
    #[serde(default)]
    pub id: String,
    /// fullname of the comment (or post) the hidden comments hang off
    #[serde(default)]
    pub parent_id: String,
    /// ids of the hidden comments, empty for thread continuations
    #[serde(default)]
    pub children: Vec<String>,
    /// how many comments are hidden behind this placeholder
    #[serde(default)]
    pub count: i64,
}

impl MoreStub {
    /// whether this is a "continue this thread" link rather than a collapsed batch
    pub fn is_continuation(&self) -> bool {
        self.children.is_empty()
    }
}

/// `GET /api/morechildren?api_type=json` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoreChildrenResponse {
    /// the json wrapper
    #[serde(default)]
    pub json: MoreChildrenJson,
}

/// wrapper inside [`MoreChildrenResponse`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoreChildrenJson {
    /// errors reported by reddit
    #[serde(default)]
    pub errors: Vec<serde_json::Value>,
    /// the expanded things
    #[serde(default)]
    pub data: Option<MoreChildrenData>,
}

/// the expanded things, flat, each with its `parent_id`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoreChildrenData {
    /// the things
    #[serde(default)]
    pub things: Vec<RawThing>,
}

/// `POST /api/v1/access_token` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    /// the bearer token
    #[serde(default)]
    pub access_token: Option<String>,
    /// lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// error code when reddit refuses but still answers 200
    #[serde(default)]
    pub error: Option<String>,
}

/// A post in the export window.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    /// base36 id
    pub id: String,
    /// the title
    pub title: String,
    /// the author
    pub author: Author,
    /// creation time
    pub created: DateTime<Utc>,
    /// net score
    pub score: i64,
    /// fraction of upvotes
    pub upvote_ratio: f64,
    /// comment count reported by the listing
    pub num_comments: i64,
    /// self text
    pub text: String,
    /// the post url
    pub url: String,
}

impl From<RawPost> for Post {
    fn from(raw: RawPost) -> Self {
        Self {
            id: raw.id,
            title: raw.title,
            author: Author::from(raw.author),
            created: timestamp_from_epoch(raw.created_utc),
            score: raw.score,
            upvote_ratio: raw.upvote_ratio,
            num_comments: raw.num_comments,
            text: raw.selftext,
            url: raw.url,
        }
    }
}

impl Post {
    /// the post's fullname (`t3_<id>`)
    pub fn fullname(&self) -> String {
        format!("t3_{}", self.id)
    }
}

/// A real comment (never a placeholder).
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// base36 id
    pub id: String,
    /// fullname of the parent
    pub parent_id: String,
    /// the author
    pub author: Author,
    /// the comment text
    pub body: String,
    /// net score
    pub score: i64,
    /// creation time
    pub created: DateTime<Utc>,
}

impl From<RawComment> for Comment {
    fn from(raw: RawComment) -> Self {
        Self {
            id: raw.id,
            parent_id: raw.parent_id,
            author: Author::from(raw.author),
            body: raw.body,
            score: raw.score,
            created: timestamp_from_epoch(raw.created_utc),
        }
    }
}

impl Comment {
    /// the comment's fullname (`t1_<id>`)
    pub fn fullname(&self) -> String {
        format!("t1_{}", self.id)
    }
}

/// One page of a newest-first listing.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    /// posts on this page, newest first
    pub posts: Vec<Post>,
    /// cursor for the next page
    pub after: Option<String>,
}
