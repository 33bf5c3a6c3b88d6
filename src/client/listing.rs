//! client extensions for the newest-first post listing
use {
    crate::{
        client::RedditClient,
        error::Result,
        models::{Listing, ListingPage, Post, Thing},
    },
    tracing::{debug, instrument},
};

/// reddit never returns more than this many things per listing page
pub const MAX_PAGE_SIZE: usize = 100;

impl RedditClient {
    /// fetch one page of `/r/{forum}/new`
    #[instrument(skip(self))]
    pub async fn fetch_newest(
        &self,
        forum: &str,
        after: Option<&str>,
        count: usize,
    ) -> Result<ListingPage> {
        let mut url = self.endpoint(&["r", forum, "new"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &count.clamp(1, MAX_PAGE_SIZE).to_string());
            if let Some(after) = after {
                query.append_pair("after", after);
            }
        }

        let listing: Listing = self.get_json(url).await?;
        let posts: Vec<Post> = listing
            .data
            .children
            .into_iter()
            .filter_map(|thing| match thing.decode() {
                Ok(Thing::Link(raw)) => Some(Post::from(raw)),
                Ok(_) => None,
                Err(e) => {
                    debug!(error = %e, "skipping undecodable listing entry");
                    None
                }
            })
            .collect();

        debug!(count = posts.len(), after = ?listing.data.after, "fetched listing page");

        Ok(ListingPage {
            posts,
            after: listing.data.after,
        })
    }
}

#[cfg(test)]
mod tests {
    use {
        crate::client::{
            ForumSource, RedditClient,
            tests::{credentials, mock_reddit},
        },
        serde_json::json,
        wiremock::{
            Mock, ResponseTemplate,
            matchers::{method, path, query_param},
        },
    };

    #[tokio::test]
    async fn test_page_is_decoded_and_cursor_forwarded() {
        let (server, options) = mock_reddit().await;

        Mock::given(method("GET"))
            .and(path("/r/python/new"))
            .and(query_param("limit", "2"))
            .and(query_param("after", "t3_prev"))
            .and(query_param("raw_json", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "Listing",
                "data": {
                    "after": "t3_b",
                    "children": [
                        {"kind": "t3", "data": {
                            "id": "a", "title": "first", "author": "ann",
                            "created_utc": 1732000000.0, "score": 10, "upvote_ratio": 0.9,
                            "num_comments": 3, "selftext": "", "url": "https://i.redd.it/a.png"
                        }},
                        {"kind": "t3", "data": {
                            "id": "b", "title": "second", "author": "[deleted]",
                            "created_utc": 1731990000.0, "score": 1, "upvote_ratio": 1.0,
                            "num_comments": 0, "selftext": "text", "url": "https://www.reddit.com/r/python/comments/b/"
                        }}
                    ]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RedditClient::connect(credentials(), options).await.unwrap();
        let page = client.newest_page("python", Some("t3_prev"), 2).await.unwrap();

        assert_eq!(page.after.as_deref(), Some("t3_b"));
        assert_eq!(page.posts.len(), 2);
        assert_eq!(page.posts[0].title, "first");
        assert_eq!(page.posts[1].author.as_str(), "[deleted]");
        assert_eq!(page.posts[1].created.timestamp(), 1731990000);
    }

    #[tokio::test]
    async fn test_page_size_is_capped() {
        let (server, options) = mock_reddit().await;

        Mock::given(method("GET"))
            .and(path("/r/python/new"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "Listing",
                "data": { "after": null, "children": [] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RedditClient::connect(credentials(), options).await.unwrap();
        client.newest_page("python", None, 1000).await.unwrap();
    }
}
