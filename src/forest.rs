//! the comment tree of one post, built up across several api responses
use {
    crate::models::{Comment, MoreStub, RawComment, RawThing, Thing},
    hashbrown::{HashMap, HashSet},
    std::collections::VecDeque,
    tracing::{debug, trace},
};

/// A placeholder that still has to be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// collapsed comments, expanded through `morechildren`
    Children(Vec<String>),
    /// a "continue this thread" link, expanded by refetching the parent's subtree
    Thread {
        /// base36 id of the comment to refetch (no `t1_` prefix)
        comment: String,
    },
}

/// The comments of a post keyed by fullname, plus the placeholders still to expand.
#[derive(Debug, Default)]
pub struct CommentForest {
    /// the post's fullname (`t3_...`), root of the tree
    root: String,
    /// every comment seen so far
    comments: HashMap<String, Comment>,
    /// parent fullname -> child fullnames, in arrival order
    children: HashMap<String, Vec<String>>,
    /// fullnames in arrival order
    arrival: Vec<String>,
    /// placeholders not yet handed out
    pending: VecDeque<Expansion>,
    /// comments we already asked to continue
    continued: HashSet<String>,
}

impl CommentForest {
    /// start an empty forest for a post id (with or without `t3_`)
    pub fn new(post_id: &str) -> Self {
        let root = if post_id.starts_with("t3_") {
            post_id.to_string()
        } else {
            format!("t3_{}", post_id)
        };

        Self {
            root,
            ..Self::default()
        }
    }

    /// number of real comments collected
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    /// whether no comments were collected
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// number of placeholders waiting to be expanded
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// add the things from a listing or `morechildren` response
    pub fn absorb(&mut self, things: Vec<RawThing>) {
        let mut stack: Vec<RawThing> = things.into_iter().rev().collect();

        while let Some(thing) = stack.pop() {
            match thing.decode() {
                Ok(Thing::Comment(mut raw)) => {
                    if let Some(replies) = raw.take_replies() {
                        stack.extend(replies.data.children.into_iter().rev());
                    }
                    self.insert(raw);
                }
                Ok(Thing::More(stub)) => self.queue(stub),
                Ok(Thing::Link(_)) => {}
                Ok(Thing::Unknown(kind)) => trace!(kind, "skipping unknown thing"),
                Err(e) => debug!(error = %e, "skipping undecodable thing"),
            }
        }
    }

    /// take the next placeholder to expand
    pub fn next_expansion(&mut self) -> Option<Expansion> {
        self.pending.pop_front()
    }

    /// record a comment, ignoring ones we've seen
    fn insert(&mut self, raw: RawComment) {
        let comment = Comment::from(raw);
        let fullname = comment.fullname();

        if comment.id.is_empty() || self.comments.contains_key(&fullname) {
            return;
        }

        self.children
            .entry(comment.parent_id.clone())
            .or_default()
            .push(fullname.clone());
        self.arrival.push(fullname.clone());
        self.comments.insert(fullname, comment);
    }

    /// queue a placeholder for expansion
    fn queue(&mut self, stub: MoreStub) {
        if stub.is_continuation() {
            let Some(comment) = stub.parent_id.strip_prefix("t1_") else {
                return;
            };

            if self.continued.insert(comment.to_string()) {
                self.pending.push_back(Expansion::Thread {
                    comment: comment.to_string(),
                });
            }
            return;
        }

        let unseen: Vec<String> = stub
            .children
            .into_iter()
            .filter(|id| !self.comments.contains_key(&format!("t1_{}", id)))
            .collect();

        if !unseen.is_empty() {
            self.pending.push_back(Expansion::Children(unseen));
        }
    }

    /// every comment, breadth first from the post; comments whose parent
    /// never showed up are appended in arrival order
    pub fn into_comments(mut self) -> Vec<Comment> {
        let mut out = Vec::with_capacity(self.comments.len());
        let mut queue: VecDeque<String> = self
            .children
            .get(&self.root)
            .cloned()
            .unwrap_or_default()
            .into();

        while let Some(fullname) = queue.pop_front() {
            if let Some(kids) = self.children.get(&fullname) {
                queue.extend(kids.iter().cloned());
            }
            if let Some(comment) = self.comments.remove(&fullname) {
                out.push(comment);
            }
        }

        for fullname in &self.arrival {
            if let Some(comment) = self.comments.remove(fullname) {
                out.push(comment);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn comment(id: &str, parent: &str) -> RawThing {
        RawThing {
            kind: "t1".to_string(),
            data: json!({ "id": id, "parent_id": parent, "body": id, "replies": "" }),
        }
    }

    fn with_replies(id: &str, parent: &str, replies: Vec<RawThing>) -> RawThing {
        RawThing {
            kind: "t1".to_string(),
            data: json!({
                "id": id,
                "parent_id": parent,
                "body": id,
                "replies": { "kind": "Listing", "data": { "children": replies } },
            }),
        }
    }

    fn more(parent: &str, children: &[&str]) -> RawThing {
        RawThing {
            kind: "more".to_string(),
            data: json!({ "id": "m", "parent_id": parent, "children": children, "count": children.len() }),
        }
    }

    fn ids(comments: &[Comment]) -> Vec<&str> {
        comments.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_breadth_first_order() {
        let mut forest = CommentForest::new("p");
        forest.absorb(vec![
            with_replies("a", "t3_p", vec![comment("a1", "t1_a"), comment("a2", "t1_a")]),
            with_replies("b", "t3_p", vec![comment("b1", "t1_b")]),
        ]);

        assert_eq!(forest.len(), 5);
        assert_eq!(ids(&forest.into_comments()), vec!["a", "b", "a1", "a2", "b1"]);
    }

    #[test]
    fn test_placeholders_are_queued_not_emitted() {
        let mut forest = CommentForest::new("t3_p");
        forest.absorb(vec![comment("a", "t3_p"), more("t3_p", &["b", "c"])]);

        assert_eq!(forest.len(), 1);
        assert_eq!(
            forest.next_expansion(),
            Some(Expansion::Children(vec!["b".to_string(), "c".to_string()]))
        );
        assert_eq!(forest.next_expansion(), None);
    }

    #[test]
    fn test_expanded_children_hook_into_tree() {
        let mut forest = CommentForest::new("p");
        forest.absorb(vec![comment("a", "t3_p"), more("t1_a", &["x"])]);
        let _ = forest.next_expansion();

        forest.absorb(vec![comment("x", "t1_a"), comment("y", "t3_p")]);

        assert_eq!(ids(&forest.into_comments()), vec!["a", "y", "x"]);
    }

    #[test]
    fn test_continuations_are_requested_once() {
        let mut forest = CommentForest::new("p");
        forest.absorb(vec![with_replies("deep", "t3_p", vec![more("t1_deep", &[])])]);

        assert_eq!(
            forest.next_expansion(),
            Some(Expansion::Thread {
                comment: "deep".to_string()
            })
        );

        // refetching the subtree brings the parent back along with the same stub
        forest.absorb(vec![with_replies(
            "deep",
            "t3_p",
            vec![comment("deeper", "t1_deep"), more("t1_deep", &[])],
        )]);

        assert_eq!(forest.next_expansion(), None);
        assert_eq!(ids(&forest.into_comments()), vec!["deep", "deeper"]);
    }

    #[test]
    fn test_duplicates_and_orphans() {
        let mut forest = CommentForest::new("p");
        forest.absorb(vec![comment("a", "t3_p"), comment("a", "t3_p"), comment("o", "t1_gone")]);

        assert_eq!(ids(&forest.into_comments()), vec!["a", "o"]);
    }

    #[test]
    fn test_already_seen_children_are_not_requeued() {
        let mut forest = CommentForest::new("p");
        forest.absorb(vec![comment("a", "t3_p"), more("t3_p", &["a"])]);

        assert_eq!(forest.pending(), 0);
    }
}
