//! The per-response script scan state machine.

use chrono::Utc;
use log::{debug, warn};
use url::Url;

use super::context::ExtractionContext;
use super::occurrence::{Occurrence, PendingReservation};
use crate::config::RETRIEVAL_DATE_FORMAT;
use crate::error_handling::{ErrorType, InfoType, ScanError};
use crate::html::{HtmlEvent, HtmlTokenizer, StartTag, TagPosition};
use crate::path_scheme::derive_path;
use crate::storage::Fingerprint;
use crate::utils::{latin1_encode, strip_comment_wrapper};
use crate::writer::WriteOutcome;

const SCRIPT_TAG: &str = "script";
const BASE_TAG: &str = "base";

#[derive(Debug)]
enum ScanState {
    Outside,
    InsideScript { anchor: TagPosition, text: String },
}

/// Scans one response body for scripts and hands each new one to the writer.
///
/// A scanner is scoped to a single response: it knows the document URL, the
/// response's retrieval date and the first `<base href>` it has seen. At most
/// one [`PendingReservation`] exists at a time; if scanning fails,
/// [`ScriptScanner::rollback`] releases it.
pub struct ScriptScanner<'a> {
    ctx: &'a ExtractionContext,
    document_url: Url,
    base_url: Url,
    base_seen: bool,
    date: Option<String>,
    state: ScanState,
    pending: Option<PendingReservation>,
    last_occurrence: Option<Occurrence>,
}

impl<'a> ScriptScanner<'a> {
    pub fn new(ctx: &'a ExtractionContext, document_url: Url, date: Option<String>) -> Self {
        Self {
            ctx,
            base_url: document_url.clone(),
            document_url,
            base_seen: false,
            date,
            state: ScanState::Outside,
            pending: None,
            last_occurrence: None,
        }
    }

    /// The occurrence most recently acted on, for diagnostics.
    pub fn last_occurrence(&self) -> Option<&Occurrence> {
        self.last_occurrence.as_ref()
    }

    pub fn pending(&self) -> Option<&PendingReservation> {
        self.pending.as_ref()
    }

    /// Feeds a whole decoded document through the state machine.
    ///
    /// # Errors
    ///
    /// Returns the first unrecoverable markup or store error. The pending
    /// reservation is left in place for [`ScriptScanner::rollback`].
    pub async fn scan(&mut self, document: &str) -> Result<(), ScanError> {
        for event in HtmlTokenizer::new(document) {
            self.step(event?).await?;
        }
        Ok(())
    }

    /// Applies one markup event.
    pub async fn step(&mut self, event: HtmlEvent<'_>) -> Result<(), ScanError> {
        match event {
            HtmlEvent::StartTag(tag) => self.start_tag(tag).await,
            HtmlEvent::Text(text) => {
                if let ScanState::InsideScript { text: buffer, .. } = &mut self.state {
                    buffer.push_str(text);
                }
                Ok(())
            }
            HtmlEvent::EndTag { name, .. } if name == SCRIPT_TAG => {
                match std::mem::replace(&mut self.state, ScanState::Outside) {
                    ScanState::InsideScript { anchor, text } => self.finish_inline(anchor, &text).await,
                    ScanState::Outside => Ok(()),
                }
            }
            HtmlEvent::EndTag { .. } => Ok(()),
        }
    }

    /// Releases whatever is still pending.
    ///
    /// Returns the released reservation so the caller can report it.
    ///
    /// # Errors
    ///
    /// Returns a store error if a release fails; the reservation is dropped
    /// either way.
    pub async fn rollback(&mut self) -> Result<Option<PendingReservation>, ScanError> {
        let Some(pending) = self.pending.take() else {
            return Ok(None);
        };
        self.ctx.store.release_path(&pending.path).await?;
        if let Some(script) = &pending.script {
            self.ctx.store.release_script(script).await?;
        }
        Ok(Some(pending))
    }

    async fn start_tag(&mut self, tag: StartTag) -> Result<(), ScanError> {
        match tag.name.as_str() {
            BASE_TAG => {
                self.apply_base(&tag);
                Ok(())
            }
            SCRIPT_TAG => {
                let src = tag.attribute("src").map(str::trim).filter(|s| !s.is_empty());
                match src {
                    Some(src) => self.external(src).await,
                    None => {
                        self.state = ScanState::InsideScript {
                            anchor: tag.position,
                            text: String::new(),
                        };
                        Ok(())
                    }
                }
            }
            _ => Ok(()),
        }
    }

    /// Only the first `<base href>` of a document counts.
    fn apply_base(&mut self, tag: &StartTag) {
        if self.base_seen {
            return;
        }
        let Some(href) = tag.attribute("href").map(str::trim) else {
            return;
        };
        self.base_seen = true;
        match self.document_url.join(href) {
            Ok(base) => self.base_url = base,
            Err(e) => debug!("Ignoring base href {href:?} in {}: {e}", self.document_url),
        }
    }

    async fn external(&mut self, src: &str) -> Result<(), ScanError> {
        let ctx = self.ctx;
        let stats = &ctx.stats;
        let url = match self.base_url.join(src) {
            Ok(url) => url,
            Err(e) => {
                debug!("Invalid script URL {src:?} in {}: {e}", self.document_url);
                stats.increment_error(ErrorType::InvalidScriptUrl);
                return Ok(());
            }
        };
        if !matches!(url.scheme(), "http" | "https") {
            debug!("Skipping {url}: unsupported scheme");
            stats.increment_info(InfoType::UnsupportedScheme);
            return Ok(());
        }

        self.last_occurrence = Some(Occurrence::external(url.as_str()));
        let path = derive_path(&url, None);
        if !ctx.store.reserve_path(&path).await? {
            stats.increment_info(InfoType::DuplicatePath);
            return Ok(());
        }
        self.pending = Some(PendingReservation::new(Fingerprint::of_path(&path)));

        // A failed retrieval keeps its path claimed so later runs do not retry it
        let body = match ctx.fetcher.fetch(&url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Cannot retrieve {url}: {e}");
                stats.increment_error(ErrorType::RetrievalError);
                self.pending = None;
                return Ok(());
            }
        };

        let body = strip_comment_wrapper(&body);
        if body.is_empty() {
            self.pending = None;
            return Ok(());
        }
        let date = Utc::now().format(RETRIEVAL_DATE_FORMAT).to_string();
        self.reserve_and_write(&path, Some(&date), url.as_str(), body)
            .await
    }

    async fn finish_inline(&mut self, anchor: TagPosition, text: &str) -> Result<(), ScanError> {
        let bytes = latin1_encode(text);
        let body = strip_comment_wrapper(&bytes);
        if body.is_empty() {
            return Ok(());
        }

        let document_url = self.document_url.clone();
        self.last_occurrence = Some(Occurrence::inline(document_url.as_str(), anchor));
        let path = derive_path(&document_url, Some(&anchor.to_string()));
        if !self.ctx.store.reserve_path(&path).await? {
            self.ctx.stats.increment_info(InfoType::DuplicatePath);
            return Ok(());
        }
        self.pending = Some(PendingReservation::new(Fingerprint::of_path(&path)));

        let date = self.date.clone();
        self.reserve_and_write(&path, date.as_deref(), document_url.as_str(), body)
            .await
    }

    /// Reserves the body itself, then classifies and writes it.
    async fn reserve_and_write(
        &mut self,
        path: &str,
        date: Option<&str>,
        source_url: &str,
        body: &[u8],
    ) -> Result<(), ScanError> {
        let ctx = self.ctx;
        let stats = &ctx.stats;
        if !ctx.store.reserve_script(body).await? {
            stats.increment_info(InfoType::DuplicateScript);
            self.pending = None;
            return Ok(());
        }
        if let Some(pending) = self.pending.as_mut() {
            pending.script = Some(Fingerprint::of(body));
        }

        match ctx.writer.classify_and_write(path, date, source_url, body) {
            WriteOutcome::Written(target) => {
                debug!("Wrote {}", target.display());
                stats.increment_info(InfoType::ScriptWritten);
            }
            WriteOutcome::Quarantined(_) => stats.increment_info(InfoType::ScriptQuarantined),
            WriteOutcome::DiscardedMarkup => stats.increment_info(InfoType::MarkupDiscarded),
            WriteOutcome::Failed(_) => {
                // Nothing reached the disk; give both slots back so a later run can retry
                stats.increment_error(ErrorType::WriteError);
                return self.rollback().await.map(|_| ());
            }
        }
        self.pending = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::error_handling::{ExtractionStats, RetrievalError, StoreError};
    use crate::fetch::ScriptFetcher;
    use crate::storage::{DedupStore, InMemoryDedupStore, Namespace};
    use crate::writer::ScriptWriter;

    #[derive(Default)]
    struct MapFetcher {
        bodies: HashMap<String, Vec<u8>>,
    }

    impl MapFetcher {
        fn with(mut self, url: &str, body: &[u8]) -> Self {
            self.bodies.insert(url.to_string(), body.to_vec());
            self
        }
    }

    #[async_trait]
    impl ScriptFetcher for MapFetcher {
        async fn fetch(&self, url: &Url) -> Result<Vec<u8>, RetrievalError> {
            self.bodies
                .get(url.as_str())
                .cloned()
                .ok_or(RetrievalError::Status(404))
        }
    }

    /// Store that refuses script reservations, to exercise rollback.
    struct FailingScriptStore(InMemoryDedupStore);

    #[async_trait]
    impl DedupStore for FailingScriptStore {
        async fn insert(&self, namespace: Namespace, fingerprint: &Fingerprint) -> Result<bool, StoreError> {
            match namespace {
                Namespace::Paths => self.0.insert(namespace, fingerprint).await,
                Namespace::Scripts => Err(StoreError::InvalidFingerprint("unavailable".to_string())),
            }
        }

        async fn remove(&self, namespace: Namespace, fingerprint: &Fingerprint) -> Result<(), StoreError> {
            self.0.remove(namespace, fingerprint).await
        }
    }

    fn context(
        prefix: &Path,
        store: Arc<dyn DedupStore>,
        fetcher: MapFetcher,
    ) -> ExtractionContext {
        ExtractionContext::new(
            store,
            Arc::new(fetcher),
            Arc::new(ScriptWriter::new(prefix)),
            Arc::new(ExtractionStats::new()),
        )
    }

    fn page() -> Url {
        Url::parse("http://www.Example.com/page").unwrap()
    }

    #[tokio::test]
    async fn test_inline_script_is_written_with_anchor_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryDedupStore::new());
        let ctx = context(dir.path(), store.clone(), MapFetcher::default());
        let mut scanner = ScriptScanner::new(&ctx, page(), Some("Tue, 01 Jan 2019 00:00:00 GMT".into()));

        scanner.scan("<html>\n  <script>alert(1)</script>").await.unwrap();

        let written = std::fs::read(dir.path().join("e/x/www.example.com/page%232%2C2.js")).unwrap();
        assert_eq!(
            written,
            b"// Retrieved Tue, 01 Jan 2019 00:00:00 GMT, from http://www.example.com/page\nalert(1)"
        );
        assert!(scanner.pending().is_none());
        assert_eq!(ctx.stats.get_info_count(InfoType::ScriptWritten), 1);
    }

    #[tokio::test]
    async fn test_comment_wrapped_inline_script_is_unwrapped() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), Arc::new(InMemoryDedupStore::new()), MapFetcher::default());
        let mut scanner = ScriptScanner::new(&ctx, page(), None);

        scanner.scan("<script><!--\nvar x=1;\n--></script>").await.unwrap();

        let written = std::fs::read(dir.path().join("e/x/www.example.com/page%231%2C0.js")).unwrap();
        assert_eq!(written, b"// Retrieved from http://www.example.com/page\nvar x=1;");
    }

    #[tokio::test]
    async fn test_identical_inline_bodies_are_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryDedupStore::new());
        let ctx = context(dir.path(), store.clone(), MapFetcher::default());
        let mut scanner = ScriptScanner::new(&ctx, page(), None);

        scanner
            .scan("<script>a()</script>\n<script>a()</script>")
            .await
            .unwrap();

        assert!(dir.path().join("e/x/www.example.com/page%231%2C0.js").exists());
        assert!(!dir.path().join("e/x/www.example.com/page%232%2C0.js").exists());
        // Both anchors claimed their paths; only one body was admitted
        assert_eq!(store.len(Namespace::Paths), 2);
        assert_eq!(store.len(Namespace::Scripts), 1);
        assert_eq!(ctx.stats.get_info_count(InfoType::DuplicateScript), 1);
    }

    #[tokio::test]
    async fn test_external_script_resolves_against_first_base() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = MapFetcher::default().with("http://cdn.example.org/lib/a.js", b"var y=2;");
        let ctx = context(dir.path(), Arc::new(InMemoryDedupStore::new()), fetcher);
        let mut scanner = ScriptScanner::new(&ctx, page(), None);

        scanner
            .scan(r#"<base href="http://cdn.example.org/lib/"><base href="http://other/"><script src="a.js"></script>"#)
            .await
            .unwrap();

        let written = std::fs::read(dir.path().join("c/d/cdn.example.org/lib%2Fa.js")).unwrap();
        let text = String::from_utf8(written).unwrap();
        assert!(text.starts_with("// Retrieved "));
        assert!(text.ends_with(", from http://cdn.example.org/lib/a.js\nvar y=2;"));
    }

    #[tokio::test]
    async fn test_failed_retrieval_keeps_path_claimed() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryDedupStore::new());
        let ctx = context(dir.path(), store.clone(), MapFetcher::default());
        let mut scanner = ScriptScanner::new(&ctx, page(), None);

        scanner.scan(r#"<script src="/missing.js"></script>"#).await.unwrap();

        assert!(store.contains(
            Namespace::Paths,
            &Fingerprint::of_path("e/x/www.example.com/missing.js")
        ));
        assert!(scanner.pending().is_none());
        assert_eq!(ctx.stats.get_error_count(ErrorType::RetrievalError), 1);
    }

    #[tokio::test]
    async fn test_non_http_sources_are_skipped_without_reservation() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryDedupStore::new());
        let ctx = context(dir.path(), store.clone(), MapFetcher::default());
        let mut scanner = ScriptScanner::new(&ctx, page(), None);

        scanner
            .scan(r#"<script src="data:text/javascript,a()"></script><script src="javascript:void(0)"></script>"#)
            .await
            .unwrap();

        assert!(store.is_empty());
        assert_eq!(ctx.stats.get_info_count(InfoType::UnsupportedScheme), 2);
    }

    #[tokio::test]
    async fn test_scan_error_leaves_finalized_writes_alone() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryDedupStore::new());
        let ctx = context(dir.path(), store.clone(), MapFetcher::default());
        let mut scanner = ScriptScanner::new(&ctx, page(), None);

        let result = scanner.scan("<script>a()</script><p <b>").await;
        assert!(matches!(result, Err(ScanError::MalformedStartTag { .. })));
        assert_eq!(scanner.rollback().await.unwrap(), None);
        assert_eq!(store.len(Namespace::Scripts), 1);
        assert!(dir.path().join("e/x/www.example.com/page%231%2C0.js").exists());
    }

    #[tokio::test]
    async fn test_store_failure_mid_occurrence_is_rolled_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FailingScriptStore(InMemoryDedupStore::new()));
        let ctx = context(dir.path(), store.clone(), MapFetcher::default());
        let mut scanner = ScriptScanner::new(&ctx, page(), None);

        let result = scanner.scan("<script>a()</script>").await;
        assert!(matches!(result, Err(ScanError::Store(_))));

        let path_fp = Fingerprint::of_path("e/x/www.example.com/page%231%2C0.js");
        assert_eq!(scanner.pending().map(|p| p.path), Some(path_fp));
        assert!(store.0.contains(Namespace::Paths, &path_fp));

        let released = scanner.rollback().await.unwrap();
        assert_eq!(released.map(|p| p.path), Some(path_fp));
        assert!(store.0.is_empty());
        assert!(scanner.pending().is_none());
        assert!(matches!(
            scanner.last_occurrence(),
            Some(Occurrence { anchor: Some(TagPosition { line: 1, column: 0 }), .. })
        ));
    }

    #[tokio::test]
    async fn test_script_element_content_of_external_script_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = MapFetcher::default().with("http://www.example.com/a.js", b"a()");
        let store = Arc::new(InMemoryDedupStore::new());
        let ctx = context(dir.path(), store.clone(), fetcher);
        let mut scanner = ScriptScanner::new(&ctx, page(), None);

        scanner
            .scan(r#"<script src="a.js">fallback()</script>"#)
            .await
            .unwrap();

        assert_eq!(store.len(Namespace::Scripts), 1);
        assert!(store.contains(Namespace::Scripts, &Fingerprint::of(b"a()")));
    }
}
