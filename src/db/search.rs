//! Background catalog search. Queries run on a worker thread with a second
//! connection so typing in a search box never blocks the draw loop on
//! SQLite. Replies echo the request's sequence number, letting the UI drop
//! answers that arrive after the query text has already changed.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use anyhow::{anyhow, Context, Result};
use rusqlite::Connection;

use super::{codes, medications};
use crate::models::{DiseaseCode, Medication};

/// Upper bound on rows a single search returns.
pub const SEARCH_LIMIT: usize = 50;

/// Which catalog a request runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    DiseaseCodes,
    Medications,
}

#[derive(Debug)]
pub struct SearchRequest {
    pub seq: u64,
    pub scope: SearchScope,
    pub query: String,
}

#[derive(Debug)]
pub enum SearchHits {
    Codes(Vec<DiseaseCode>),
    Medications(Vec<Medication>),
}

#[derive(Debug)]
pub struct SearchReply {
    pub seq: u64,
    pub outcome: Result<SearchHits, String>,
}

/// Handle to the search thread. Dropping it closes the request channel,
/// which is the worker's signal to exit.
pub struct SearchWorker {
    requests: Sender<SearchRequest>,
    replies: Receiver<SearchReply>,
}

impl SearchWorker {
    /// Open a second connection to the database file and park it on its own
    /// thread. The connection is opened here rather than on the thread so a
    /// bad path fails loudly at startup.
    pub fn spawn(db_path: PathBuf) -> Result<SearchWorker> {
        let conn =
            Connection::open(&db_path).context("failed to open search worker connection")?;
        let (request_tx, request_rx) = mpsc::channel::<SearchRequest>();
        let (reply_tx, reply_rx) = mpsc::channel::<SearchReply>();

        thread::spawn(move || {
            while let Ok(request) = request_rx.recv() {
                let reply = SearchReply {
                    seq: request.seq,
                    outcome: run_search(&conn, &request),
                };
                if reply_tx.send(reply).is_err() {
                    break;
                }
            }
        });

        Ok(SearchWorker {
            requests: request_tx,
            replies: reply_rx,
        })
    }

    pub fn submit(&self, request: SearchRequest) -> Result<()> {
        self.requests
            .send(request)
            .map_err(|_| anyhow!("search worker has shut down"))
    }

    /// Everything the worker finished since the last tick, oldest first.
    pub fn drain_replies(&self) -> Vec<SearchReply> {
        self.replies.try_iter().collect()
    }
}

fn run_search(conn: &Connection, request: &SearchRequest) -> Result<SearchHits, String> {
    let hits = match request.scope {
        SearchScope::DiseaseCodes => {
            codes::search_disease_codes(conn, &request.query, SEARCH_LIMIT).map(SearchHits::Codes)
        }
        SearchScope::Medications => medications::search_medications(conn, &request.query, SEARCH_LIMIT)
            .map(SearchHits::Medications),
    };

    hits.map_err(|err| match err.chain().last() {
        Some(cause) => cause.to_string(),
        None => err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use rusqlite::params;

    fn seeded_database(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("clinic.sqlite");
        let conn = Connection::open(&path).expect("open");
        crate::db::connection::apply_schema(&conn).expect("schema");
        for (code, label) in [("I10", "Essential (primary) hypertension"), ("R51", "Headache")] {
            conn.execute(
                "INSERT INTO disease_codes (code, label) VALUES (?1, ?2)",
                params![code, label],
            )
            .expect("seed");
        }
        path
    }

    fn collect_replies(worker: &SearchWorker, want: usize) -> Vec<SearchReply> {
        let mut replies = Vec::new();
        for _ in 0..200 {
            replies.extend(worker.drain_replies());
            if replies.len() >= want {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        replies
    }

    #[test]
    fn replies_echo_their_sequence_numbers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let worker = SearchWorker::spawn(seeded_database(&dir)).expect("spawn");

        worker
            .submit(SearchRequest {
                seq: 1,
                scope: SearchScope::DiseaseCodes,
                query: "zzz-no-match".into(),
            })
            .expect("submit");
        worker
            .submit(SearchRequest {
                seq: 2,
                scope: SearchScope::DiseaseCodes,
                query: "I10".into(),
            })
            .expect("submit");

        let replies = collect_replies(&worker, 2);
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].seq, 1);
        assert_eq!(replies[1].seq, 2);

        match &replies[0].outcome {
            Ok(SearchHits::Codes(hits)) => assert!(hits.is_empty()),
            other => panic!("unexpected outcome: {other:?}"),
        }
        match &replies[1].outcome {
            Ok(SearchHits::Codes(hits)) => {
                assert_eq!(hits.len(), 1);
                assert_eq!(hits[0].code, "I10");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn medication_scope_hits_the_medication_catalog() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = seeded_database(&dir);
        {
            let conn = Connection::open(&path).expect("open");
            conn.execute(
                "INSERT INTO medications (name, strength, route) VALUES ('Amlodipine', '5 mg', 'PO')",
                [],
            )
            .expect("seed medication");
        }

        let worker = SearchWorker::spawn(path).expect("spawn");
        worker
            .submit(SearchRequest {
                seq: 7,
                scope: SearchScope::Medications,
                query: "amlo".into(),
            })
            .expect("submit");

        let replies = collect_replies(&worker, 1);
        match &replies[0].outcome {
            Ok(SearchHits::Medications(hits)) => {
                assert_eq!(hits.len(), 1);
                assert_eq!(hits[0].name, "Amlodipine");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
