use crate::crawler::parser::{parse_html, AnchorLink, ParsedPage};
use crate::crawler::session::CrawlSession;
use crate::storage::{DocumentCandidate, DocumentStore, StorageResult};
use crate::url::{classify, file_extension, LinkKind};
use url::Url;

/// What happened to a fetched HTML page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page only redirected elsewhere through a meta refresh
    Refreshed { target: Url, enqueued: bool },
    /// The page's links were extracted
    Processed {
        title: Option<String>,
        pages_enqueued: usize,
        documents_found: usize,
    },
}

impl CrawlSession {
    /// Extracts links from a fetched page and routes them
    ///
    /// A meta refresh short-circuits everything: its target is queued at the
    /// same depth and no other link on the page is considered. Otherwise
    /// document links become candidates in the pending batch (committed
    /// whenever the batch fills) and page links are queued one level deeper
    /// if that stays within the depth limit. The batch is flushed once more
    /// at the end of the page.
    ///
    /// The page is marked visited once its links are handled. When a flush
    /// fails the page stays in flight, so a resumed run processes it again.
    pub fn process_page<S: DocumentStore + ?Sized>(
        &mut self,
        html: &str,
        page_url: &Url,
        depth: u32,
        store: &mut S,
    ) -> StorageResult<PageOutcome> {
        let parsed = parse_html(html, page_url);

        if let Some(target) = parsed.meta_refresh {
            let enqueued = self.enqueue(target.clone(), depth);
            tracing::info!(
                "Meta refresh on {} to {}{}",
                page_url,
                target,
                if enqueued { "" } else { " (not queued)" }
            );
            self.finish(page_url);
            return Ok(PageOutcome::Refreshed { target, enqueued });
        }

        let ParsedPage {
            title,
            author,
            links,
            ..
        } = parsed;

        let mut pages_enqueued = 0;
        let mut documents_found = 0;

        for link in links {
            match classify(&link.url) {
                LinkKind::Ignore => continue,
                LinkKind::Document => {
                    if self.add_document(link, page_url, &title, &author) {
                        documents_found += 1;
                        if self.batch.is_full() {
                            self.batch.flush(store)?;
                        }
                    }
                }
                LinkKind::Page => {
                    if depth < self.max_depth && self.enqueue(link.url, depth + 1) {
                        pages_enqueued += 1;
                    }
                }
            }
        }

        self.batch.flush(store)?;
        self.finish(page_url);

        Ok(PageOutcome::Processed {
            title,
            pages_enqueued,
            documents_found,
        })
    }

    /// Buffers a document link unless it is ineligible or already recorded
    fn add_document(
        &mut self,
        link: AnchorLink,
        page_url: &Url,
        title: &Option<String>,
        author: &Option<String>,
    ) -> bool {
        let key = link.url.to_string();
        if self.added_documents.contains(&key) || self.eligibility(&link.url).is_err() {
            return false;
        }

        tracing::info!("Found document: {}", key);
        self.batch.push(DocumentCandidate {
            link_extension: file_extension(&link.url),
            url: key.clone(),
            source_url: page_url.to_string(),
            source_title: title.clone(),
            source_author: author.clone(),
            link_text: link.text,
            link_title: link.title,
        });
        self.added_documents.insert(key);
        true
    }
}
