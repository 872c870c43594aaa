//! Parallel fetch of the three source texts.
//!
//! A [`SourceFetcher`] supplies raw text for one source. [`Loader::load_all`]
//! runs one tokio task per source, joins them, and fails as a unit: the
//! first failing fetch aborts the others and nothing is normalised.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use langstat_core::models::{Diagnostic, Record, Source};
use langstat_core::{Result, StatsError};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::normalizer::{normalize, ColumnLayout};

// ── FetchError ────────────────────────────────────────────────────────────────

/// Transport failure while fetching one source's text.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),
}

// ── SourceFetcher ─────────────────────────────────────────────────────────────

/// Transport port: raw delimited text for one source.
pub trait SourceFetcher: Send + Sync + 'static {
    fn fetch(
        &self,
        source: Source,
    ) -> impl Future<Output = std::result::Result<String, FetchError>> + Send;
}

/// Reads `<root>/<file name>` from the local filesystem.
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SourceFetcher for FsFetcher {
    async fn fetch(&self, source: Source) -> std::result::Result<String, FetchError> {
        let path = self.root.join(source.file_name());
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FetchError::Io { path, source: e })
    }
}

/// Request timeout for HTTP fetches unless overridden.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches `<base_url>/<file name>` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: &str) -> std::result::Result<Self, FetchError> {
        Self::with_timeout(base_url, DEFAULT_HTTP_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> std::result::Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full URL of a source's resource.
    pub fn url_for(&self, source: Source) -> String {
        format!("{}/{}", self.base_url, source.file_name().trim_start_matches('/'))
    }
}

impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, source: Source) -> std::result::Result<String, FetchError> {
        let url = self.url_for(source);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

// ── Loader ────────────────────────────────────────────────────────────────────

/// Records and diagnostics from all three sources of one load.
#[derive(Debug, Clone, Default)]
pub struct NormalizedSet {
    /// Records in canonical source order, row order within a source.
    pub records: Vec<Record>,
    pub diagnostics: Vec<Diagnostic>,
}

impl NormalizedSet {
    /// Number of records that came from `source`.
    pub fn count_for(&self, source: Source) -> usize {
        self.records.iter().filter(|r| r.source == source).count()
    }
}

/// Fans out one fetch per source and joins them.
pub struct Loader<F: SourceFetcher> {
    fetcher: Arc<F>,
    layout: Arc<ColumnLayout>,
}

impl<F: SourceFetcher> Clone for Loader<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            layout: Arc::clone(&self.layout),
        }
    }
}

impl<F: SourceFetcher> Loader<F> {
    pub fn new(fetcher: F, layout: ColumnLayout) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            layout: Arc::new(layout),
        }
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    /// Fetch the three sources concurrently, then normalise them.
    ///
    /// The first fetch failure aborts the remaining tasks and is returned;
    /// a header problem in any source also fails the whole load.
    pub async fn load_all(&self) -> Result<NormalizedSet> {
        let texts = self.fetch_all().await?;

        let mut set = NormalizedSet::default();
        for (source, text) in Source::ALL.into_iter().zip(texts) {
            let normalized = normalize(&text, source, &self.layout)?;
            set.records.extend(normalized.records);
            set.diagnostics.extend(normalized.diagnostics);
        }
        Ok(set)
    }

    /// Raw texts in canonical source order.
    async fn fetch_all(&self) -> Result<[String; 3]> {
        let mut tasks = JoinSet::new();
        for source in Source::ALL {
            let fetcher = Arc::clone(&self.fetcher);
            tasks.spawn(async move { (source, fetcher.fetch(source).await) });
        }

        let mut texts: [Option<String>; 3] = [None, None, None];

        while let Some(joined) = tasks.join_next().await {
            let (source, fetched) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    tasks.abort_all();
                    return Err(StatsError::Task(e.to_string()));
                }
            };

            match fetched {
                Ok(text) => {
                    debug!(%source, bytes = text.len(), "fetched source");
                    texts[slot(source)] = Some(text);
                }
                Err(e) => {
                    warn!(%source, error = %e, "fetch failed; abandoning load");
                    tasks.abort_all();
                    return Err(StatsError::Fetch {
                        origin: source,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let [community, government, official] = texts;
        match (community, government, official) {
            (Some(c), Some(g), Some(o)) => Ok([c, g, o]),
            _ => Err(StatsError::Task("a fetch task ended without a result".into())),
        }
    }
}

fn slot(source: Source) -> usize {
    match source {
        Source::Community => 0,
        Source::Government => 1,
        Source::Official => 2,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HEADER: &str = "Год,Тип,Всего,Тувинский_ңөү_кол,Тувинский_ңөү_%,Тувинский_рус_клав_кол,Тувинский_рус_клав_%,Русский_кол,Русский_%";

    fn body(rows: &[&str]) -> String {
        let mut text = HEADER.to_string();
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    /// In-memory fetcher; a missing entry is a fetch failure.
    struct MapFetcher {
        texts: HashMap<Source, String>,
        delay: HashMap<Source, Duration>,
        completed: Arc<AtomicUsize>,
    }

    impl MapFetcher {
        fn new(texts: HashMap<Source, String>) -> Self {
            Self {
                texts,
                delay: HashMap::new(),
                completed: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl SourceFetcher for MapFetcher {
        async fn fetch(&self, source: Source) -> std::result::Result<String, FetchError> {
            if let Some(delay) = self.delay.get(&source) {
                tokio::time::sleep(*delay).await;
            }
            let result = self.texts.get(&source).cloned().ok_or_else(|| FetchError::Status {
                url: format!("mem://{}", source.file_name()),
                status: 404,
            });
            self.completed.fetch_add(1, Ordering::SeqCst);
            result
        }
    }

    fn all_sources() -> HashMap<Source, String> {
        HashMap::from([
            (Source::Community, body(&["2020,Посты,10,5,50,3,30,2,20"])),
            (Source::Government, body(&["2020,Посты,20,10,50,5,25,5,25"])),
            (
                Source::Official,
                body(&["2021,Комментарии,4,1,25,1,25,2,50", "2021,Посты,x,1,25,1,25,2,50"]),
            ),
        ])
    }

    #[tokio::test]
    async fn test_load_all_joins_in_canonical_order() {
        let mut fetcher = MapFetcher::new(all_sources());
        // Community finishes last; its records must still come first.
        fetcher
            .delay
            .insert(Source::Community, Duration::from_millis(30));
        let loader = Loader::new(fetcher, ColumnLayout::russian());

        let set = loader.load_all().await.unwrap();

        let sources: Vec<Source> = set.records.iter().map(|r| r.source).collect();
        assert_eq!(
            sources,
            vec![Source::Community, Source::Government, Source::Official]
        );
        assert_eq!(set.count_for(Source::Official), 1);
        assert_eq!(set.diagnostics.len(), 1);
        assert_eq!(set.diagnostics[0].source, Source::Official);
        assert_eq!(set.diagnostics[0].row, 1);
    }

    #[tokio::test]
    async fn test_load_all_fails_as_a_unit() {
        let mut texts = all_sources();
        texts.remove(&Source::Government);
        let loader = Loader::new(MapFetcher::new(texts), ColumnLayout::russian());

        let err = loader.load_all().await.unwrap_err();
        assert!(matches!(
            err,
            StatsError::Fetch {
                origin: Source::Government,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_failure_aborts_pending_fetches() {
        let mut texts = all_sources();
        texts.remove(&Source::Community);
        let mut fetcher = MapFetcher::new(texts);
        fetcher
            .delay
            .insert(Source::Official, Duration::from_secs(30));
        let completed = Arc::clone(&fetcher.completed);
        let loader = Loader::new(fetcher, ColumnLayout::russian());

        let started = std::time::Instant::now();
        let err = loader.load_all().await.unwrap_err();

        assert!(err.is_load_failure());
        assert!(started.elapsed() < Duration::from_secs(10));
        // Official was still sleeping when the load was abandoned.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(completed.load(Ordering::SeqCst) < 3);
    }

    #[tokio::test]
    async fn test_missing_column_fails_the_load() {
        let mut texts = all_sources();
        texts.insert(Source::Official, "Год,Тип\n2020,Посты".to_string());
        let loader = Loader::new(MapFetcher::new(texts), ColumnLayout::russian());

        let err = loader.load_all().await.unwrap_err();
        assert!(matches!(
            err,
            StatsError::MissingColumn {
                origin: Source::Official,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_fs_fetcher_reads_source_files() {
        let dir = TempDir::new().unwrap();
        for (source, text) in all_sources() {
            std::fs::write(dir.path().join(source.file_name()), text).unwrap();
        }

        let loader = Loader::new(FsFetcher::new(dir.path()), ColumnLayout::russian());
        let set = loader.load_all().await.unwrap();
        assert_eq!(set.records.len(), 3);
    }

    #[tokio::test]
    async fn test_fs_fetcher_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let fetcher = FsFetcher::new(dir.path());
        let err = fetcher.fetch(Source::Community).await.unwrap_err();
        match err {
            FetchError::Io { path, .. } => {
                assert!(path.ends_with("results_community_media_posts.csv"))
            }
            other => panic!("expected Io error, got {other:?}"),
        }
    }

    #[test]
    fn test_http_url_joining() {
        let fetcher = HttpFetcher::new("https://example.org/app/dataset/results/").unwrap();
        assert_eq!(
            fetcher.url_for(Source::Government),
            "https://example.org/app/dataset/results/results_gov_institutions_posts.csv"
        );
    }

    #[tokio::test]
    async fn test_http_fetcher_loads_all_sources() {
        let server = MockServer::start().await;
        for (source, text) in all_sources() {
            Mock::given(method("GET"))
                .and(path(format!("/results/{}", source.file_name())))
                .respond_with(ResponseTemplate::new(200).set_body_string(text))
                .mount(&server)
                .await;
        }

        let fetcher = HttpFetcher::new(&format!("{}/results", server.uri())).unwrap();
        let set = Loader::new(fetcher, ColumnLayout::russian())
            .load_all()
            .await
            .unwrap();
        assert_eq!(set.records.len(), 3);
    }

    #[tokio::test]
    async fn test_http_fetcher_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&server.uri()).unwrap();
        let err = fetcher.fetch(Source::Official).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 503, .. }));
    }
}
