//! Search service
//!
//! One query fanned out across users, captions and hashtags, plus the
//! popular-hashtag tally for the empty-query landing state.

use std::collections::HashMap;
use std::sync::Arc;

use crate::data::{Post, PostStore, User, UserStore};
use crate::error::AppError;

/// A hashtag and how many posts carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashtagCount {
    pub tag: String,
    pub count: usize,
}

/// Everything one query matched.
#[derive(Debug, Clone)]
pub struct SearchResults {
    pub users: Vec<User>,
    /// Posts matched by caption or hashtag, feed order
    pub posts: Vec<Post>,
    /// Matching hashtags, most used first
    pub hashtags: Vec<HashtagCount>,
}

/// Search over the user and post stores.
pub struct SearchService {
    users: Arc<UserStore>,
    posts: Arc<PostStore>,
}

impl SearchService {
    pub fn new(users: Arc<UserStore>, posts: Arc<PostStore>) -> Self {
        Self { users, posts }
    }

    /// Run one query. An empty query returns everything: the full user
    /// list, the full feed and the popular hashtags.
    pub async fn search(&self, query: &str) -> Result<SearchResults, AppError> {
        let query = query.trim().trim_start_matches('#');

        let (users, posts) = if query.is_empty() {
            tokio::try_join!(self.users.get_all(), self.posts.get_all())?
        } else {
            let (users, by_caption, by_hashtag) = tokio::try_join!(
                self.users.search(query),
                self.posts.search_by_caption(query),
                self.posts.search_by_hashtag(query),
            )?;
            (users, merge_posts(by_caption, by_hashtag))
        };

        let hashtags = filter_tags(popular_hashtags(&posts), query);
        Ok(SearchResults {
            users,
            posts,
            hashtags,
        })
    }
}

/// Union of the two post matches, first occurrence wins.
fn merge_posts(by_caption: Vec<Post>, by_hashtag: Vec<Post>) -> Vec<Post> {
    let mut merged = by_caption;
    for post in by_hashtag {
        if !merged.iter().any(|p| p.id == post.id) {
            merged.push(post);
        }
    }
    merged
}

/// Tally hashtags across posts, most used first, capped at 20.
fn popular_hashtags(posts: &[Post]) -> Vec<HashtagCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for post in posts {
        for tag in &post.hashtags {
            *counts.entry(tag.as_str()).or_default() += 1;
        }
    }

    let mut tallied: Vec<HashtagCount> = counts
        .into_iter()
        .map(|(tag, count)| HashtagCount {
            tag: tag.to_string(),
            count,
        })
        .collect();
    // ties break alphabetically so the ordering is stable
    tallied.sort_by(|a, b| b.count.cmp(&a.count).then(a.tag.cmp(&b.tag)));
    tallied.truncate(20);
    tallied
}

fn filter_tags(tags: Vec<HashtagCount>, query: &str) -> Vec<HashtagCount> {
    if query.is_empty() {
        return tags;
    }
    let needle = query.to_lowercase();
    tags.into_iter()
        .filter(|t| t.tag.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{BlobStore, Latency, MemoryBlobStore, NewPost};

    async fn service() -> SearchService {
        let backend = Arc::new(MemoryBlobStore::new());
        backend.write("test_posts", "[]").await.unwrap();
        let users = Arc::new(
            UserStore::open(
                Arc::clone(&backend) as Arc<dyn BlobStore>,
                "test",
                Latency::disabled(),
            )
            .await
            .unwrap(),
        );
        let posts = Arc::new(
            PostStore::open(backend, "test", Latency::disabled())
                .await
                .unwrap(),
        );
        for (caption, tags) in [
            ("Morning coffee on the trail", vec!["coffee", "hiking"]),
            ("Late night coding", vec!["coffee", "code"]),
            ("Beach day", vec!["summer"]),
        ] {
            posts
                .create(NewPost {
                    image_url: "img".to_string(),
                    caption: Some(caption.to_string()),
                    hashtags: Some(tags.into_iter().map(String::from).collect()),
                    user_id: None,
                })
                .await
                .unwrap();
        }
        SearchService::new(users, posts)
    }

    #[tokio::test]
    async fn empty_query_returns_everything() {
        let service = service().await;
        let results = service.search("  ").await.unwrap();

        assert!(!results.users.is_empty());
        assert_eq!(results.posts.len(), 3);
        // "coffee" is on two posts, so it tops the tally
        assert_eq!(results.hashtags[0].tag, "coffee");
        assert_eq!(results.hashtags[0].count, 2);
    }

    #[tokio::test]
    async fn query_matches_captions_and_hashtags_without_duplicates() {
        let service = service().await;
        let results = service.search("coffee").await.unwrap();

        // post 1 matches by caption and hashtag but appears once;
        // post 2 matches by hashtag only
        assert_eq!(results.posts.len(), 2);
        assert_eq!(results.hashtags.len(), 1);
        assert_eq!(results.hashtags[0].tag, "coffee");
    }

    #[tokio::test]
    async fn leading_hash_is_stripped() {
        let service = service().await;
        let results = service.search("#summer").await.unwrap();
        assert_eq!(results.posts.len(), 1);
        assert_eq!(results.posts[0].caption, "Beach day");
    }

    #[tokio::test]
    async fn query_matches_users_by_name_and_bio() {
        let service = service().await;
        let results = service.search("trail").await.unwrap();
        // fixture: maya_trails by name, plus her bio mentions trail maps
        assert!(results.users.iter().any(|u| u.username == "maya_trails"));
    }
}
