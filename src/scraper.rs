use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use rusqlite::Connection;
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};

use crate::db::{self, GenerationRecord};
use crate::parser::{self, ParsedPage};

const BASE_URL: &str = "https://web.pgcb.gov.bd/view_generations_bn?page=";
const FIRST_PAGE: u32 = 1;
pub const CONCURRENCY: usize = 10;

/// Totals reported after a completed fetch.
pub struct FetchStats {
    pub pages: usize,
    pub records: usize,
    pub dropped: usize,
}

enum PageEvent {
    Record(GenerationRecord),
    PageDone { dropped: usize },
    Fatal(anyhow::Error),
}

/// Fetch and parse every report page, streaming rows into the store.
///
/// All page workers are spawned up front; a counting gate keeps at most
/// [`CONCURRENCY`] of them in flight. Workers report over a channel to this
/// loop, which owns the connection and performs one independent insert per
/// row; the channel is the store's write-serialization point. Channel
/// closure after the last worker exits is the completion barrier.
///
/// Failure contract: the first fatal fault (transport error, or a table
/// that no longer matches the expected layout) ends the run with an error.
/// There is no retry and no partial-result salvage: rows already written
/// stay in the store, with no guarantee about which pages they came from.
pub async fn fetch_all(conn: &Connection, max_page: u32) -> Result<FetchStats> {
    let client = Client::new();
    let (tx, mut rx) = mpsc::channel::<PageEvent>(CONCURRENCY * 2);

    spawn_page_workers(FIRST_PAGE, max_page, CONCURRENCY, move |page| {
        let client = client.clone();
        let tx = tx.clone();
        async move {
            info!(page, "fetching page");
            match fetch_page(&client, page).await {
                Ok(parsed) => {
                    if parsed.dropped > 0 {
                        warn!(page, dropped = parsed.dropped, "rows with malformed dates");
                    }
                    for rec in parsed.records {
                        if tx.send(PageEvent::Record(rec)).await.is_err() {
                            return; // run already failed, receiver is gone
                        }
                    }
                    let _ = tx.send(PageEvent::PageDone { dropped: parsed.dropped }).await;
                }
                Err(e) => {
                    let _ = tx.send(PageEvent::Fatal(e)).await;
                }
            }
        }
    });

    let pb = ProgressBar::new(u64::from(max_page));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut stats = FetchStats {
        pages: 0,
        records: 0,
        dropped: 0,
    };
    while let Some(event) = rx.recv().await {
        match event {
            PageEvent::Record(rec) => {
                db::insert_record(conn, &rec)?;
                stats.records += 1;
            }
            PageEvent::PageDone { dropped } => {
                stats.pages += 1;
                stats.dropped += dropped;
                pb.inc(1);
            }
            PageEvent::Fatal(e) => {
                pb.abandon();
                return Err(e);
            }
        }
    }

    pb.finish_and_clear();
    info!(
        pages = stats.pages,
        records = stats.records,
        dropped = stats.dropped,
        "fetch complete"
    );
    Ok(stats)
}

/// Spawn one task per page in `first..=last`, gated so at most `limit` do
/// work at once. Each task waits on the gate before starting and holds its
/// permit until it finishes; completion is observed by the caller through
/// whatever channel the workers report on.
fn spawn_page_workers<F, Fut>(first: u32, last: u32, limit: usize, worker: F)
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let gate = Arc::new(Semaphore::new(limit));
    for page in first..=last {
        let gate = Arc::clone(&gate);
        let work = worker(page);
        tokio::spawn(async move {
            let _permit = gate.acquire_owned().await.expect("gate never closed");
            work.await;
        });
    }
}

/// Retrieve one page and extract its rows. Transport faults and layout
/// divergence both come back as errors; the caller treats them as fatal.
async fn fetch_page(client: &Client, page: u32) -> Result<ParsedPage> {
    let url = format!("{BASE_URL}{page}");
    let body = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("GET {url} failed"))?
        .error_for_status()
        .with_context(|| format!("non-success status from {url}"))?
        .text()
        .await
        .with_context(|| format!("reading body from {url}"))?;
    parser::parse_page(&body).with_context(|| format!("page {page}: table layout diverged"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn gate_caps_in_flight_workers() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::channel::<u32>(32);

        let worker_in_flight = Arc::clone(&in_flight);
        let worker_peak = Arc::clone(&peak);
        spawn_page_workers(1, 25, CONCURRENCY, move |page| {
            let in_flight = Arc::clone(&worker_in_flight);
            let peak = Arc::clone(&worker_peak);
            let tx = tx.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                let _ = tx.send(page).await;
            }
        });

        let mut pages = Vec::new();
        while let Some(p) = rx.recv().await {
            pages.push(p);
        }
        pages.sort_unstable();
        assert_eq!(pages, (1..=25).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= CONCURRENCY);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn single_permit_still_completes_every_page() {
        // A single slot serializes every worker; the run must still finish.
        let (tx, mut rx) = mpsc::channel::<u32>(8);
        spawn_page_workers(1, 5, 1, move |page| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(page).await;
            }
        });
        let mut done = 0;
        while rx.recv().await.is_some() {
            done += 1;
        }
        assert_eq!(done, 5);
    }
}
