//! flattening posts and comments into export rows
use {
    crate::models::{Comment, Post},
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

/// how timestamps are written in the export
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// the export columns, in order
pub const COLUMNS: [&str; 14] = [
    "post_id",
    "post_title",
    "post_author",
    "post_created_utc",
    "post_score",
    "post_upvote_ratio",
    "post_num_comments",
    "post_text",
    "post_url",
    "comment_id",
    "comment_author",
    "comment_text",
    "comment_score",
    "comment_created_utc",
];

/// format a timestamp for export
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// The post half of every row, resolved once per post and shared by all of its rows.
#[derive(Debug, Clone, PartialEq)]
pub struct PostView {
    /// post id
    pub id: String,
    /// title
    pub title: String,
    /// author name or the deleted sentinel
    pub author: String,
    /// formatted creation time
    pub created_utc: String,
    /// score
    pub score: i64,
    /// upvote ratio
    pub upvote_ratio: f64,
    /// comment count as reported by the listing
    pub num_comments: i64,
    /// self text
    pub text: String,
    /// url
    pub url: String,
}

impl From<&Post> for PostView {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            title: post.title.clone(),
            author: post.author.to_string(),
            created_utc: format_timestamp(post.created),
            score: post.score,
            upvote_ratio: post.upvote_ratio,
            num_comments: post.num_comments,
            text: post.text.clone(),
            url: post.url.clone(),
        }
    }
}

/// One exported line. The comment columns are empty on the post's own row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    /// post id
    pub post_id: String,
    /// post title
    pub post_title: String,
    /// post author or the deleted sentinel
    pub post_author: String,
    /// post creation time (`YYYY-MM-DD HH:MM:SS`, utc)
    pub post_created_utc: String,
    /// post score
    pub post_score: i64,
    /// post upvote ratio
    pub post_upvote_ratio: f64,
    /// comment count reported by the listing
    pub post_num_comments: i64,
    /// post self text
    pub post_text: String,
    /// post url
    pub post_url: String,
    /// comment id
    pub comment_id: Option<String>,
    /// comment author or the deleted sentinel
    pub comment_author: Option<String>,
    /// comment body
    pub comment_text: Option<String>,
    /// comment score
    pub comment_score: Option<i64>,
    /// comment creation time
    pub comment_created_utc: Option<String>,
}

impl ExportRow {
    /// the row standing for the post itself
    pub fn for_post(view: &PostView) -> Self {
        Self {
            post_id: view.id.clone(),
            post_title: view.title.clone(),
            post_author: view.author.clone(),
            post_created_utc: view.created_utc.clone(),
            post_score: view.score,
            post_upvote_ratio: view.upvote_ratio,
            post_num_comments: view.num_comments,
            post_text: view.text.clone(),
            post_url: view.url.clone(),
            comment_id: None,
            comment_author: None,
            comment_text: None,
            comment_score: None,
            comment_created_utc: None,
        }
    }

    /// a row for one comment on the post
    pub fn for_comment(view: &PostView, comment: &Comment) -> Self {
        Self {
            comment_id: Some(comment.id.clone()),
            comment_author: Some(comment.author.to_string()),
            comment_text: Some(comment.body.clone()),
            comment_score: Some(comment.score),
            comment_created_utc: Some(format_timestamp(comment.created)),
            ..Self::for_post(view)
        }
    }

    /// whether this row carries a comment
    pub fn is_comment(&self) -> bool {
        self.comment_id.is_some()
    }
}

/// the post row followed by one row per comment
pub fn flatten(post: &Post, comments: &[Comment]) -> Vec<ExportRow> {
    let view = PostView::from(post);
    let mut rows = Vec::with_capacity(comments.len() + 1);

    rows.push(ExportRow::for_post(&view));
    rows.extend(comments.iter().map(|c| ExportRow::for_comment(&view, c)));

    rows
}
