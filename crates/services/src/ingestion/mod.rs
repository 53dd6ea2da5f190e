//! # Post Ingestion
//!
//! `Received → Validated → Fetched → Extracted → Persisted`, strictly in
//! sequence, single attempt. Any failure ends the run with the last completed
//! stage attached and nothing persisted.

pub mod assembler;
pub mod extractor;
pub mod validator;

use std::collections::HashSet;
use std::sync::Arc;

use domains::{
    Identity, IngestError, IngestionStage, PageFetcher, Post, PostRepository, PostSubmission,
    TagRepository,
};
use tracing::{debug, info, instrument, warn};

pub use assembler::RecordAssembler;
pub use extractor::{InvalidSelector, MetadataExtractor};

pub struct IngestionService {
    tags: Arc<dyn TagRepository>,
    fetcher: Arc<dyn PageFetcher>,
    extractor: MetadataExtractor,
    assembler: RecordAssembler,
}

impl IngestionService {
    pub fn new(
        tags: Arc<dyn TagRepository>,
        fetcher: Arc<dyn PageFetcher>,
        extractor: MetadataExtractor,
        posts: Arc<dyn PostRepository>,
    ) -> Self {
        Self {
            tags,
            fetcher,
            extractor,
            assembler: RecordAssembler::new(posts),
        }
    }

    /// Runs one submission through the whole pipeline on behalf of `author`.
    #[instrument(skip_all, fields(user = %author.username, url = %submission.url))]
    pub async fn submit(
        &self,
        author: &Identity,
        submission: PostSubmission,
    ) -> Result<Post, IngestError> {
        let result = self.run(author, submission).await;
        match &result {
            Ok(post) => info!(post_id = %post.id, stage = %IngestionStage::Persisted, "post ingested"),
            Err(err) => warn!(reached = %err.reached, failed = err.kind(), error = %err.cause, "post ingestion failed"),
        }
        result
    }

    async fn run(&self, author: &Identity, submission: PostSubmission) -> Result<Post, IngestError> {
        // 1. Validate against the tags that currently exist
        let known: HashSet<String> = self
            .tags
            .list()
            .await
            .map_err(|e| IngestError::new(IngestionStage::Received, e))?
            .into_iter()
            .map(|t| t.slug)
            .collect();
        let validated = validator::validate_submission(&submission, &known)
            .map_err(|e| IngestError::new(IngestionStage::Received, e))?;
        debug!(tags = ?validated.tags, "submission validated");

        // 2. Fetch the remote page
        let html = self
            .fetcher
            .fetch(&validated.url)
            .await
            .map_err(|e| IngestError::new(IngestionStage::Validated, e))?;
        debug!(bytes = html.len(), "page fetched");

        // 3. Extract image, title and artist
        let metadata = self
            .extractor
            .extract(&html)
            .map_err(|e| IngestError::new(IngestionStage::Fetched, e))?;
        debug!(title = %metadata.title, artist = %metadata.artist, "metadata extracted");

        // 4. Persist post and tags in one transaction
        self.assembler
            .commit(validated, metadata, author)
            .await
            .map_err(|e| IngestError::new(IngestionStage::Extracted, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::{
        Author, ExtractionError, FetchError, IngestFailure, MetadataField, MockPageFetcher,
        MockPostRepository, MockTagRepository, PersistenceError, Tag,
    };
    use uuid::Uuid;

    const FIXTURE: &str = r#"<html><head>
        <meta property="og:image" content="https://live.staticflickr.com/x.jpg">
        </head><body>
        <h1 class="photo-title">Sunset</h1>
        <a class="owner-name">Jane</a>
        </body></html>"#;

    fn jane() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            username: "jane".into(),
            email: Some("jane@example.com".into()),
        }
    }

    fn nature_tags() -> MockTagRepository {
        let mut tags = MockTagRepository::new();
        tags.expect_list().returning(|| {
            Ok(vec![Tag {
                slug: "nature".into(),
                name: "Nature".into(),
                position: Some(1),
                icon: None,
            }])
        });
        tags
    }

    fn fetcher_returning(body: &'static str) -> MockPageFetcher {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|url| url == "https://example.com/photo/1")
            .times(1)
            .returning(move |_| Ok(body.to_string()));
        fetcher
    }

    fn service(
        tags: MockTagRepository,
        fetcher: MockPageFetcher,
        posts: MockPostRepository,
    ) -> IngestionService {
        IngestionService::new(
            Arc::new(tags),
            Arc::new(fetcher),
            MetadataExtractor::with_defaults().unwrap(),
            Arc::new(posts),
        )
    }

    fn submission() -> PostSubmission {
        PostSubmission {
            url: "https://example.com/photo/1".into(),
            caption: "nice".into(),
            tags: vec!["nature".into()],
        }
    }

    #[tokio::test]
    async fn persists_fully_populated_post() {
        let author = jane();
        let author_id = author.id;
        let mut posts = MockPostRepository::new();
        posts
            .expect_create_with_tags()
            .withf(move |p| {
                p.title == "Sunset"
                    && p.artist == "Jane"
                    && p.image == "https://live.staticflickr.com/x.jpg"
                    && p.body == "nice"
                    && p.author_id == author_id
                    && p.tag_slugs == vec!["nature".to_string()]
            })
            .times(1)
            .returning(|p| {
                Ok(Post {
                    id: p.id,
                    title: p.title,
                    artist: p.artist,
                    url: p.url,
                    image: p.image,
                    body: p.body,
                    author: Some(Author {
                        id: p.author_id,
                        username: "jane".into(),
                    }),
                    tags: vec![],
                    like_count: 0,
                    created_at: p.created_at,
                })
            });

        let svc = service(nature_tags(), fetcher_returning(FIXTURE), posts);
        let post = svc.submit(&author, submission()).await.unwrap();
        assert_eq!(post.title, "Sunset");
    }

    #[tokio::test]
    async fn invalid_submission_never_fetches() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch().never();
        let mut posts = MockPostRepository::new();
        posts.expect_create_with_tags().never();

        let svc = service(nature_tags(), fetcher, posts);
        let mut raw = submission();
        raw.tags = vec!["space".into()];
        let err = svc.submit(&jane(), raw).await.unwrap_err();

        assert_eq!(err.reached, IngestionStage::Received);
        assert!(matches!(err.cause, IngestFailure::Validation(ref v) if v.fields() == vec!["tags"]));
    }

    #[tokio::test]
    async fn fetch_failure_persists_nothing() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Err(FetchError::Status(404)));
        let mut posts = MockPostRepository::new();
        posts.expect_create_with_tags().never();

        let err = service(nature_tags(), fetcher, posts)
            .submit(&jane(), submission())
            .await
            .unwrap_err();

        assert_eq!(err.reached, IngestionStage::Validated);
        assert_eq!(err.cause, IngestFailure::Fetch(FetchError::Status(404)));
    }

    #[tokio::test]
    async fn extraction_failure_persists_nothing() {
        let html: &'static str = r#"<meta content="https://live.staticflickr.com/x.jpg">
            <h1 class="photo-title">Sunset</h1>"#;
        let mut posts = MockPostRepository::new();
        posts.expect_create_with_tags().never();

        let err = service(nature_tags(), fetcher_returning(html), posts)
            .submit(&jane(), submission())
            .await
            .unwrap_err();

        assert_eq!(err.reached, IngestionStage::Fetched);
        assert_eq!(
            err.cause,
            IngestFailure::Extraction(ExtractionError::MissingField(MetadataField::Artist))
        );
    }

    #[tokio::test]
    async fn store_failure_is_reported_after_extraction() {
        let mut posts = MockPostRepository::new();
        posts
            .expect_create_with_tags()
            .times(1)
            .returning(|_| Err(PersistenceError::Storage("disk full".into())));

        let err = service(nature_tags(), fetcher_returning(FIXTURE), posts)
            .submit(&jane(), submission())
            .await
            .unwrap_err();

        assert_eq!(err.reached, IngestionStage::Extracted);
        assert_eq!(err.kind(), "persistence_failed");
    }
}
