//! walking a forum's newest-first listing and collecting rows for posts in a time window
use {
    crate::{
        client::ForumSource,
        error::ExportError,
        models::Post,
        rows::{ExportRow, flatten},
        utils::preview,
        window::{Placement, TimeWindow},
    },
    async_trait::async_trait,
    std::time::Duration,
    tracing::{debug, info, instrument, warn},
};

/// How much of a post title goes into log lines.
const TITLE_PREVIEW: usize = 50;

/// What to harvest.
#[derive(Debug, Clone)]
pub struct HarvestRequest {
    /// the forum (subreddit) name
    pub forum: String,
    /// only posts created inside this window produce rows
    pub window: TimeWindow,
    /// maximum number of listing entries to examine
    pub limit: usize,
    /// listing entries asked for per page
    pub page_size: usize,
}

/// A pause taken after every in-window post, fetched or not.
#[async_trait]
pub trait Politeness: Send + Sync {
    /// wait before the next request
    async fn pause(&self);
}

/// Sleep for a fixed amount of time.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

#[async_trait]
impl Politeness for FixedDelay {
    async fn pause(&self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }
}

/// Never wait.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Politeness for NoDelay {
    async fn pause(&self) {}
}

/// A post in the window whose comments couldn't be fetched.
#[derive(Debug)]
pub struct PostFailure {
    /// the post's id
    pub post_id: String,
    /// the post's title
    pub title: String,
    /// what went wrong
    pub error: ExportError,
}

/// Everything a harvest produced.
#[derive(Debug, Default)]
pub struct Harvest {
    /// rows in listing order, each post followed by its comments
    pub rows: Vec<ExportRow>,
    /// posts that were left out because their comments failed
    pub failures: Vec<PostFailure>,
    /// listing entries looked at
    pub examined: usize,
    /// entries that fell inside the window
    pub matched: usize,
    /// whether a post older than the window ended the walk
    pub stopped_early: bool,
    /// the listing error that cut the walk short, if any
    pub aborted: Option<ExportError>,
}

impl Harvest {
    /// true when every in-window post was exported and the listing never failed
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.aborted.is_none()
    }
}

/// Called after each in-window post with the post and the running row count.
pub type ProgressFn = Box<dyn Fn(&Post, usize) + Send + Sync>;

/// Drives a [`ForumSource`] through a [`HarvestRequest`].
pub struct Harvester<'a, S: ForumSource + ?Sized> {
    /// where posts and comments come from
    source: &'a S,
    /// the pause between posts
    politeness: Box<dyn Politeness + 'a>,
    /// optional progress hook
    progress: Option<ProgressFn>,
}

impl<'a, S: ForumSource + ?Sized> Harvester<'a, S> {
    /// a harvester that waits `delay` after each in-window post
    pub fn new(source: &'a S, delay: Duration) -> Self {
        Self {
            source,
            politeness: Box::new(FixedDelay(delay)),
            progress: None,
        }
    }

    /// swap the pause strategy
    pub fn with_politeness(mut self, politeness: impl Politeness + 'a) -> Self {
        self.politeness = Box::new(politeness);
        self
    }

    /// report progress through `f`
    pub fn on_progress(mut self, f: impl Fn(&Post, usize) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    /// walk the listing newest first and collect rows for every post inside the window
    #[instrument(skip_all, fields(forum = %request.forum))]
    pub async fn run(&self, request: &HarvestRequest) -> Harvest {
        let mut harvest = Harvest::default();
        let mut after: Option<String> = None;

        'pages: while harvest.examined < request.limit {
            let want = request
                .page_size
                .max(1)
                .min(request.limit - harvest.examined);

            let page = match self
                .source
                .newest_page(&request.forum, after.as_deref(), want)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    warn!(error = %e, "listing failed, keeping {} rows", harvest.rows.len());
                    harvest.aborted = Some(e);
                    break;
                }
            };

            if page.posts.is_empty() {
                break;
            }

            for post in page.posts {
                if harvest.examined >= request.limit {
                    break 'pages;
                }
                harvest.examined += 1;

                match request.window.place(post.created) {
                    Placement::Before => {
                        debug!(post = %post.id, created = %post.created, "reached posts older than the window");
                        harvest.stopped_early = true;
                        break 'pages;
                    }
                    Placement::After => continue,
                    Placement::Within => {}
                }

                harvest.matched += 1;
                self.collect(&post, &mut harvest).await;

                if let Some(progress) = &self.progress {
                    progress(&post, harvest.rows.len());
                }

                self.politeness.pause().await;
            }

            match page.after {
                Some(cursor) => after = Some(cursor),
                None => break,
            }
        }

        info!(
            examined = harvest.examined,
            matched = harvest.matched,
            rows = harvest.rows.len(),
            failures = harvest.failures.len(),
            "harvest finished"
        );

        harvest
    }

    /// expand one post's comments and append its rows, or record why we couldn't
    async fn collect(&self, post: &Post, harvest: &mut Harvest) {
        match self.source.expand_comments(post).await {
            Ok(comments) => {
                info!(
                    "scraped post: {} ({} comments)",
                    preview(&post.title, TITLE_PREVIEW),
                    comments.len()
                );
                harvest.rows.extend(flatten(post, &comments));
            }
            Err(error) => {
                warn!(post = %post.id, error = %error, "skipping post, comments unavailable");
                harvest.failures.push(PostFailure {
                    post_id: post.id.clone(),
                    title: post.title.clone(),
                    error,
                });
            }
        }
    }
}
