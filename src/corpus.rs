//! Fan a query out across many documents on a bounded pool of named
//! worker threads.
//!
//! Workers pull document indices from a shared cursor and send
//! `(index, matches)` back over a channel. The caller collects in
//! completion order and re-sorts by index, so output order never depends
//! on scheduling. A cancellation flag stops dispatch once the deadline
//! passes; a worker finishes the document it is on before exiting.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, warn};

use crate::search::{search, MatchRange};
use crate::settings::settings;

/// A searchable text with a caller-chosen identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Matches found in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMatches {
    pub id: String,
    pub matches: Vec<MatchRange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusOptions {
    /// Upper bound on worker threads; clamped to the document count.
    pub workers: usize,
    /// Give up after this long. `None` waits for every document.
    pub timeout: Option<Duration>,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        let c = &settings().corpus;
        Self {
            workers: c.workers,
            timeout: c.timeout(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    /// `partial` holds the matches among the `completed` documents, in
    /// input order; documents still in flight are dropped.
    #[error("deadline passed after {completed} of {total} documents")]
    TimedOut {
        completed: usize,
        total: usize,
        partial: Vec<DocumentMatches>,
    },
    #[error("failed to spawn corpus worker: {0}")]
    Spawn(#[from] io::Error),
}

type Outcome = (usize, Option<Vec<MatchRange>>);

/// Search every document with the configured pool.
///
/// Falls back to a sequential scan if no worker thread can be spawned.
/// On timeout it returns the matches from documents that finished before
/// the deadline.
pub fn search_corpus(documents: &[Document], query: &str) -> Vec<DocumentMatches> {
    match search_corpus_with(documents, query, &CorpusOptions::default()) {
        Ok(found) => found,
        Err(CorpusError::Spawn(err)) => {
            warn!(%err, "worker pool unavailable, searching sequentially");
            search_sequential(documents, query)
        }
        Err(CorpusError::TimedOut {
            completed,
            total,
            partial,
        }) => {
            warn!(completed, total, "corpus search timed out, returning partial matches");
            partial
        }
    }
}

pub fn search_corpus_with(
    documents: &[Document],
    query: &str,
    options: &CorpusOptions,
) -> Result<Vec<DocumentMatches>, CorpusError> {
    let total = documents.len();
    let _span = debug_span!("search_corpus", query, documents = total).entered();
    if query.trim().is_empty() || documents.is_empty() {
        return Ok(Vec::new());
    }

    let workers = options.workers.clamp(1, total);
    let deadline = options.timeout.map(|t| Instant::now() + t);
    let cursor = AtomicUsize::new(0);
    let cancel = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<Outcome>();

    let outcomes = thread::scope(|scope| -> Result<Vec<Outcome>, CorpusError> {
        for i in 0..workers {
            let tx = tx.clone();
            let (cursor, cancel) = (&cursor, &cancel);
            let spawned = thread::Builder::new()
                .name(format!("phonosearch-corpus-{i}"))
                .spawn_scoped(scope, move || {
                    corpus_worker(documents, query, cursor, cancel, tx);
                });
            if let Err(err) = spawned {
                cancel.store(true, Ordering::SeqCst);
                return Err(CorpusError::Spawn(err));
            }
        }
        drop(tx);

        let mut outcomes = Vec::with_capacity(total);
        while outcomes.len() < total {
            let received = match deadline {
                Some(d) => {
                    let now = Instant::now();
                    if now >= d {
                        Err(RecvTimeoutError::Timeout)
                    } else {
                        rx.recv_timeout(d - now)
                    }
                }
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(outcome) => outcomes.push(outcome),
                Err(RecvTimeoutError::Timeout) => {
                    cancel.store(true, Ordering::SeqCst);
                    return Err(CorpusError::TimedOut {
                        completed: outcomes.len(),
                        total,
                        partial: matches_in_order(documents, outcomes),
                    });
                }
                // Every worker has exited.
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        Ok(outcomes)
    })?;

    let found = matches_in_order(documents, outcomes);
    debug!(workers, matched = found.len());
    Ok(found)
}

/// Drop misses and restore input order.
fn matches_in_order(documents: &[Document], mut outcomes: Vec<Outcome>) -> Vec<DocumentMatches> {
    outcomes.sort_unstable_by_key(|(idx, _)| *idx);
    outcomes
        .into_iter()
        .filter_map(|(idx, matches)| {
            matches.map(|matches| DocumentMatches {
                id: documents[idx].id.clone(),
                matches,
            })
        })
        .collect()
}

fn corpus_worker(
    documents: &[Document],
    query: &str,
    cursor: &AtomicUsize,
    cancel: &AtomicBool,
    tx: mpsc::Sender<Outcome>,
) {
    while !cancel.load(Ordering::SeqCst) {
        let idx = cursor.fetch_add(1, Ordering::SeqCst);
        let Some(doc) = documents.get(idx) else {
            break;
        };
        if tx.send((idx, search(&doc.text, query))).is_err() {
            break;
        }
    }
}

fn search_sequential(documents: &[Document], query: &str) -> Vec<DocumentMatches> {
    documents
        .iter()
        .filter_map(|doc| {
            search(&doc.text, query).map(|matches| DocumentMatches {
                id: doc.id.clone(),
                matches,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<Document> {
        vec![
            Document::new("a", "我爱北京天安门"),
            Document::new("b", "上海欢迎你"),
            Document::new("c", "北京烤鸭"),
            Document::new("d", "hello world"),
            Document::new("e", "背景音乐"),
        ]
    }

    fn ids(found: &[DocumentMatches]) -> Vec<&str> {
        found.iter().map(|d| d.id.as_str()).collect()
    }

    fn options(workers: usize) -> CorpusOptions {
        CorpusOptions {
            workers,
            timeout: None,
        }
    }

    #[test]
    fn test_order_independent_of_workers() {
        let docs = docs();
        let expected = search_sequential(&docs, "beijing");
        assert_eq!(ids(&expected), vec!["a", "c", "e"]);
        for workers in [1, 2, 3, 8] {
            let found = search_corpus_with(&docs, "beijing", &options(workers)).unwrap();
            assert_eq!(found, expected, "workers = {workers}");
        }
    }

    #[test]
    fn test_misses_dropped() {
        let found = search_corpus_with(&docs(), "hello", &options(2)).unwrap();
        assert_eq!(ids(&found), vec!["d"]);
        assert_eq!(found[0].matches, vec![MatchRange::new(0, 4)]);
    }

    #[test]
    fn test_blank_query_and_empty_corpus() {
        assert!(search_corpus_with(&docs(), "  ", &options(2))
            .unwrap()
            .is_empty());
        assert!(search_corpus_with(&[], "beijing", &options(2))
            .unwrap()
            .is_empty());
        assert!(search_corpus(&[], "beijing").is_empty());
    }

    #[test]
    fn test_zero_timeout() {
        let opts = CorpusOptions {
            workers: 2,
            timeout: Some(Duration::ZERO),
        };
        match search_corpus_with(&docs(), "beijing", &opts) {
            Err(CorpusError::TimedOut {
                completed,
                total,
                partial,
            }) => {
                assert_eq!(completed, 0);
                assert_eq!(total, 5);
                assert!(partial.is_empty());
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_partial_matches_keep_input_order() {
        let docs = docs();
        // Completion order as a timed-out pool might leave it: "b" and "d"
        // never finished.
        let outcomes = vec![
            (4, search(&docs[4].text, "beijing")),
            (2, search(&docs[2].text, "beijing")),
            (0, search(&docs[0].text, "beijing")),
            (3, None),
        ];
        let partial = matches_in_order(&docs, outcomes);
        assert_eq!(ids(&partial), vec!["a", "c", "e"]);
    }

    #[test]
    fn test_generous_timeout_completes() {
        let opts = CorpusOptions {
            workers: 2,
            timeout: Some(Duration::from_secs(60)),
        };
        let found = search_corpus_with(&docs(), "shanghai", &opts).unwrap();
        assert_eq!(ids(&found), vec!["b"]);
    }

    #[test]
    fn test_default_options_follow_settings() {
        let opts = CorpusOptions::default();
        assert_eq!(opts.workers, settings().corpus.workers);
        assert_eq!(opts.timeout, settings().corpus.timeout());
        assert_eq!(ids(&search_corpus(&docs(), "beijing")), vec!["a", "c", "e"]);
    }

    #[test]
    fn test_zero_workers_clamped() {
        let found = search_corpus_with(&docs(), "beijing", &options(0)).unwrap();
        assert_eq!(ids(&found), vec!["a", "c", "e"]);
    }
}
