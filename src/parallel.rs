//! Several documents parsed at once.
//!
//! Every document gets its own [`ParseSession`]; the marker table is the
//! only thing shared between threads, and only by reference. Results come
//! back in input order.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::Error;
use crate::markers::MarkerTable;
use crate::reader::{read_paragraphs, source_label, source_name};
use crate::session::{ParseOutcome, ParseSession};

/// Configuration for parallel parsing
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Number of threads to use
    pub num_threads: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        let cpus = thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4);
        Self { num_threads: cpus }
    }
}

impl ParallelConfig {
    /// `0` means one thread per available CPU
    pub fn with_threads(threads: usize) -> Self {
        if threads == 0 {
            Self::default()
        } else {
            Self {
                num_threads: threads,
            }
        }
    }
}

/// One parsed document
#[derive(Debug)]
pub struct DocumentResult {
    pub path: PathBuf,
    pub label: String,
    pub outcome: ParseOutcome,
    pub elapsed: Duration,
}

/// Read and parse one document in a fresh session
pub fn parse_document(path: &Path, table: &MarkerTable) -> Result<DocumentResult, Error> {
    let start = Instant::now();
    let label = source_label(path);
    let paragraphs = read_paragraphs(path)?;

    let mut session = ParseSession::new(label.clone(), table).with_source_name(source_name(path));
    for paragraph in paragraphs {
        session.push(paragraph);
    }

    Ok(DocumentResult {
        path: path.to_path_buf(),
        label,
        outcome: session.finish(),
        elapsed: start.elapsed(),
    })
}

/// Parse documents on up to `num_threads` threads, one result per path in
/// input order
pub fn parse_documents(
    paths: &[PathBuf],
    table: &MarkerTable,
    config: &ParallelConfig,
) -> Vec<Result<DocumentResult, Error>> {
    if paths.is_empty() {
        return vec![];
    }

    let num_threads = config.num_threads.min(paths.len()).max(1);
    let chunk_size = (paths.len() + num_threads - 1) / num_threads;
    debug!(documents = paths.len(), threads = num_threads, "parsing documents");

    let indexed: Vec<(usize, &PathBuf)> = paths.iter().enumerate().collect();
    let mut ordered: BTreeMap<usize, Result<DocumentResult, Error>> = BTreeMap::new();

    thread::scope(|scope| {
        let handles: Vec<_> = indexed
            .chunks(chunk_size)
            .map(|chunk| {
                let handle = scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|&(i, path)| (i, parse_document(path, table)))
                        .collect::<Vec<_>>()
                });
                (chunk, handle)
            })
            .collect();

        for (chunk, handle) in handles {
            match handle.join() {
                Ok(results) => ordered.extend(results),
                Err(_) => {
                    for &(i, path) in chunk {
                        ordered.insert(i, Err(Error::WorkerPanicked { path: path.clone() }));
                    }
                }
            }
        }
    });

    ordered.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_doc(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dict-scanner-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    // ─────────────────────────────────────────────────────────────
    // Configuration
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn zero_threads_means_auto() {
        assert!(ParallelConfig::with_threads(0).num_threads >= 1);
        assert_eq!(ParallelConfig::with_threads(3).num_threads, 3);
    }

    // ─────────────────────────────────────────────────────────────
    // Documents
    // ─────────────────────────────────────────────────────────────

    #[test]
    fn single_document() {
        let path = write_doc("single.txt", "• ܒܝܬܐ بيت\n— ܒܝܬ ܡܠܟܐ قصر\n");
        let result = parse_document(&path, MarkerTable::builtin()).unwrap();
        assert_eq!(result.label, "single");
        assert_eq!(result.outcome.entries.len(), 1);
        assert_eq!(result.outcome.entries[0].id.as_deref(), Some("single:0001"));
        assert_eq!(result.outcome.entries[0].metadata.source, "single.txt");
        assert_eq!(result.outcome.subentry_count(), 1);
    }

    #[test]
    fn results_follow_input_order() {
        let paths: Vec<PathBuf> = (1..=5)
            .map(|n| {
                let body = "• ܒܝܬܐ بيت\n".repeat(n);
                write_doc(&format!("order{n}.txt"), &body)
            })
            .collect();

        let results = parse_documents(&paths, MarkerTable::builtin(), &ParallelConfig::with_threads(2));
        let counts: Vec<usize> = results
            .iter()
            .map(|r| r.as_ref().unwrap().outcome.entries.len())
            .collect();
        assert_eq!(counts, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn sessions_are_independent() {
        let a = write_doc("indep_a.txt", "• ܒܝܬܐ بيت\n• ܟܣܐ كأس\n");
        let b = write_doc("indep_b.txt", "• ܡܠܟܐ ملك\n");
        let results = parse_documents(&[a, b], MarkerTable::builtin(), &ParallelConfig::with_threads(2));
        let second = results[1].as_ref().unwrap();
        assert_eq!(second.outcome.entries[0].id.as_deref(), Some("indep_b:0001"));
    }

    #[test]
    fn missing_document_does_not_stop_the_rest() {
        let good = write_doc("present.txt", "• ܒܝܬܐ بيت\n");
        let missing = PathBuf::from("/nonexistent/missing.txt");
        let results =
            parse_documents(&[missing, good], MarkerTable::builtin(), &ParallelConfig::with_threads(2));
        assert!(matches!(results[0], Err(Error::Read(_))));
        assert!(results[1].is_ok());
    }

    #[test]
    fn no_documents() {
        assert!(parse_documents(&[], MarkerTable::builtin(), &ParallelConfig::default()).is_empty());
    }
}
