//! client extensions for resolving a post's full comment tree
use {
    crate::{
        client::RedditClient,
        error::Result,
        forest::{CommentForest, Expansion},
        models::{Comment, Listing, MoreChildrenResponse, RawThing},
    },
    tracing::{debug, instrument, warn},
};

/// how many comments to ask for in the first request
const INITIAL_LIMIT: &str = "500";

impl RedditClient {
    /// fetch every comment on a post, expanding all collapsed branches and
    /// "continue this thread" links
    #[instrument(skip(self))]
    pub async fn fetch_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        let mut forest = CommentForest::new(post_id);
        let mut requests = 1;

        forest.absorb(self.comment_page(post_id, None).await?);

        while let Some(expansion) = forest.next_expansion() {
            match expansion {
                Expansion::Children(ids) => {
                    let batch = self.options().more_batch_size.max(1);
                    for chunk in ids.chunks(batch) {
                        requests += 1;
                        forest.absorb(self.more_children(post_id, chunk).await?);
                    }
                }
                Expansion::Thread { comment } => {
                    requests += 1;
                    forest.absorb(self.comment_page(post_id, Some(&comment)).await?);
                }
            }
        }

        debug!(comments = forest.len(), requests, "resolved comment tree");
        Ok(forest.into_comments())
    }

    /// `GET /comments/{post}`, optionally focused on one comment's subtree
    async fn comment_page(
        &self,
        post_id: &str,
        focus: Option<&str>,
    ) -> Result<Vec<RawThing>> {
        let mut url = self.endpoint(&["comments", post_id])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", INITIAL_LIMIT);
            if let Some(comment) = focus {
                query.append_pair("comment", comment);
            }
        }

        let (_post, comments): (Listing, Listing) = self.get_json(url).await?;
        Ok(comments.data.children)
    }

    /// `GET /api/morechildren` for one batch of collapsed comment ids
    async fn more_children(
        &self,
        post_id: &str,
        ids: &[String],
    ) -> Result<Vec<RawThing>> {
        let mut url = self.endpoint(&["api", "morechildren"])?;
        url.query_pairs_mut()
            .append_pair("api_type", "json")
            .append_pair("link_id", &format!("t3_{}", post_id))
            .append_pair("children", &ids.join(","))
            .append_pair("limit_children", "false");

        let response: MoreChildrenResponse = self.get_json(url).await?;
        if !response.json.errors.is_empty() {
            warn!(errors = ?response.json.errors, "morechildren reported errors");
        }

        Ok(response.json.data.map(|d| d.things).unwrap_or_default())
    }
}
