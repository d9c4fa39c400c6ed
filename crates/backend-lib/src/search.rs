// ============================
// mdwiki-backend-lib/src/search.rs
// ============================
//! Relevance scoring over the full page set.
//!
//! Queries carry three term lists. AND terms establish each document's base
//! score and drop non-matching documents, OR terms add to the score, NOT
//! terms subtract and drop documents that fall to zero or below. This is
//! additive point scoring, not boolean filtering: a document rich in NOT
//! terms can survive if its positive score is high enough.
//!
//! Scoring is a linear scan; each stage maps over the surviving documents
//! with bounded concurrency, and stages run in sequence because every stage
//! reads the running totals of the one before it.
use crate::config::SearchSettings;
use crate::metrics as metric_keys;
use futures_util::{stream, StreamExt};
use mdwiki_common::Page;
use metrics::counter;
use std::sync::Arc;

/// Weight of a title occurrence relative to a content occurrence
const TITLE_WEIGHT: i64 = 2;

/// Parsed query: three term groups, compared case-insensitively
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub and_terms: Vec<String>,
    pub or_terms: Vec<String>,
    pub not_terms: Vec<String>,
}

impl SearchQuery {
    /// Split a raw query string. A leading `-` marks a NOT term (the marker
    /// is stripped); every other fragment is an AND term. No splitter syntax
    /// produces OR terms; the list stays in the interface for callers that
    /// build queries directly.
    pub fn parse(raw: &str) -> Self {
        let mut query = SearchQuery::default();
        // split_whitespace also covers the ideographic space the search
        // form submits as-is
        for fragment in raw.split_whitespace() {
            match fragment.strip_prefix('-') {
                Some(term) if !term.is_empty() => query.not_terms.push(term.to_string()),
                Some(_) => {},
                None => query.and_terms.push(fragment.to_string()),
            }
        }
        query
    }

    pub fn is_empty(&self) -> bool {
        self.and_terms.is_empty() && self.or_terms.is_empty() && self.not_terms.is_empty()
    }
}

/// A page together with its running relevance points
#[derive(Debug, Clone)]
pub struct ScoredPage {
    pub page: Page,
    pub points: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// AND: add the score, then drop documents at zero or below
    Require,
    /// OR: add the score, keep everything
    Boost,
    /// NOT: subtract the score, then drop documents at zero or below
    Penalize,
}

impl Stage {
    fn drops(self) -> bool {
        matches!(self, Stage::Require | Stage::Penalize)
    }
}

/// Ranking engine over an in-memory page list
pub struct SearchEngine {
    concurrency: usize,
    rank_descending: bool,
}

impl SearchEngine {
    pub fn new(opts: &SearchSettings) -> Self {
        Self {
            concurrency: opts.concurrency.max(1),
            rank_descending: opts.rank_descending,
        }
    }

    /// Score `pages` against `query` and return the ranked survivors.
    ///
    /// The final order is ascending by points unless configured otherwise,
    /// so the weakest surviving match comes first by default.
    pub async fn search(&self, pages: Vec<Page>, query: &SearchQuery) -> Vec<ScoredPage> {
        counter!(metric_keys::SEARCH_RUN).increment(1);

        let mut target: Vec<ScoredPage> = pages
            .into_iter()
            .map(|page| ScoredPage { page, points: 0 })
            .collect();

        if !query.and_terms.is_empty() {
            target = self.stage(target, &query.and_terms, Stage::Require).await;
        }
        if !query.or_terms.is_empty() {
            target = self.stage(target, &query.or_terms, Stage::Boost).await;
        }
        if !query.not_terms.is_empty() {
            target = self.stage(target, &query.not_terms, Stage::Penalize).await;
        }

        if self.rank_descending {
            target.sort_by(|a, b| b.points.cmp(&a.points));
        } else {
            target.sort_by(|a, b| a.points.cmp(&b.points));
        }
        target
    }

    /// One scoring pass: map every surviving document through the stage's
    /// adjustment on a bounded concurrent scan, preserving input order.
    async fn stage(&self, input: Vec<ScoredPage>, terms: &[String], stage: Stage) -> Vec<ScoredPage> {
        let terms: Arc<Vec<String>> = Arc::new(terms.iter().map(|t| t.to_lowercase()).collect());

        let jobs = input.into_iter().map(|mut item| {
            let terms = Arc::clone(&terms);
            async move {
                tokio::task::spawn_blocking(move || {
                    let score = weighted_occurrences(&item.page, &terms);
                    match stage {
                        Stage::Require | Stage::Boost => item.points += score,
                        Stage::Penalize => item.points -= score,
                    }
                    item
                })
                .await
            }
        });

        stream::iter(jobs)
            .buffered(self.concurrency)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .filter_map(|joined| match joined {
                Ok(item) => Some(item),
                Err(e) => {
                    tracing::error!("scoring task failed: {e}");
                    None
                },
            })
            .filter(|item| !stage.drops() || item.points > 0)
            .collect()
    }
}

/// Weighted occurrence count of all terms in one document:
/// title matches count double, content matches count single.
fn weighted_occurrences(page: &Page, terms: &[String]) -> i64 {
    let title = page.title.to_lowercase();
    let content = page.content.to_lowercase();
    let title_hits: i64 = terms.iter().map(|t| occurrences(&title, t)).sum();
    let content_hits: i64 = terms.iter().map(|t| occurrences(&content, t)).sum();
    title_hits * TITLE_WEIGHT + content_hits
}

/// Non-overlapping substring occurrences
fn occurrences(haystack: &str, needle: &str) -> i64 {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count() as i64
}
