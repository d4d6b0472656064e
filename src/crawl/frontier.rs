// src/crawl/frontier.rs
// =============================================================================
// The crawl frontier: discovered URLs waiting to be fetched, plus the set of
// URLs already claimed by a worker.
//
// At-most-once fetch:
//   next() pops a URL and inserts it into `seen` under the same lock, so a
//   second worker can never claim the same URL.
//
// Termination (all-workers-idle barrier):
//   A worker retires when
//   - `seen` has reached max_pages, or
//   - the queue is empty AND no claimed URL is still being processed.
//   While the queue is empty but another worker is busy (and may discover
//   more links), next() waits for a wake-up, re-checking every poll interval.
// =============================================================================

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct FrontierState {
    queue: VecDeque<String>,
    queued: HashSet<String>,
    seen: HashSet<String>,
    in_flight: usize,
    total_found: usize,
}

enum Poll {
    Ready(String),
    Wait,
    Exhausted,
}

/// Shared, deduplicating work queue for crawl workers
#[derive(Debug)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    wake: Notify,
    max_pages: usize,
}

impl Frontier {
    pub fn new(max_pages: usize) -> Self {
        Self {
            state: Mutex::new(FrontierState::default()),
            wake: Notify::new(),
            max_pages,
        }
    }

    /// Queues a URL unless it is already queued or claimed.
    ///
    /// Returns true if the URL was new.
    pub fn push(&self, url: String) -> bool {
        {
            let mut state = self.state.lock();
            if state.seen.contains(&url) || state.queued.contains(&url) {
                return false;
            }
            state.queued.insert(url.clone());
            state.queue.push_back(url);
            state.total_found += 1;
        }
        self.wake.notify_waiters();
        true
    }

    // Claims the next URL, waiting while other workers may still add work
    //
    // Returns: None once the crawl is over for this worker
    pub async fn next(&self, poll_interval: Duration) -> Option<Claim<'_>> {
        loop {
            // Register interest before looking at the state so a push or a
            // release between the check and the wait is not missed
            let notified = self.wake.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.poll() {
                Poll::Ready(url) => {
                    return Some(Claim {
                        frontier: self,
                        url,
                    })
                }
                Poll::Exhausted => {
                    self.wake.notify_waiters();
                    return None;
                }
                Poll::Wait => {
                    let _ = tokio::time::timeout(poll_interval, notified).await;
                }
            }
        }
    }

    fn poll(&self) -> Poll {
        let mut state = self.state.lock();
        if state.seen.len() >= self.max_pages {
            return Poll::Exhausted;
        }

        while let Some(url) = state.queue.pop_front() {
            state.queued.remove(&url);
            if state.seen.insert(url.clone()) {
                state.in_flight += 1;
                return Poll::Ready(url);
            }
        }

        if state.in_flight == 0 {
            Poll::Exhausted
        } else {
            Poll::Wait
        }
    }

    fn release(&self) {
        self.state.lock().in_flight -= 1;
        self.wake.notify_waiters();
    }

    /// Number of URLs claimed so far
    pub fn seen_count(&self) -> usize {
        self.state.lock().seen.len()
    }

    /// Number of distinct URLs ever queued
    pub fn total_found(&self) -> usize {
        self.state.lock().total_found
    }
}

/// A URL claimed by one worker. Dropping it marks the work as finished.
pub struct Claim<'a> {
    frontier: &'a Frontier,
    url: String,
}

impl Claim<'_> {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.frontier.release();
    }
}
