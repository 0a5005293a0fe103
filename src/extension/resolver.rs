// Concurrent resolver - fans an episode's sources out to providers
//
// Strategy:
// 1. Drop unusable entries; if a top-domain entry exists, keep only it
// 2. One detached task per surviving entry, started through a shared rate gate
// 3. Briefly race for a single first-tier stream
// 4. Otherwise gather every task's streams until all report or time runs out
//
// Provider failures never abort siblings. Only an empty aggregate is an error.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use super::config::ResolverSettings;
use super::errors::ExtensionError;
use super::fetcher::LinkFetcher;
use super::models::{RawSourceEntry, StreamCandidate};
use super::priority::DomainPriorities;
use super::rate_gate::RateGate;

/// Streams gathered by one resolution call, in task submission order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub streams: Vec<StreamCandidate>,
    /// The single-stream fast path short-circuited the call
    pub fast_path: bool,
}

/// What one provider task reports back
#[derive(Debug)]
struct TaskReport {
    index: usize,
    outcome: Result<Vec<StreamCandidate>, ExtensionError>,
}

/// Orchestrates provider tasks for one episode at a time
pub struct ConcurrentResolver {
    fetcher: Arc<dyn LinkFetcher>,
    priorities: DomainPriorities,
    settings: ResolverSettings,
}

impl ConcurrentResolver {
    pub fn new(
        fetcher: Arc<dyn LinkFetcher>,
        priorities: DomainPriorities,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            fetcher,
            priorities,
            settings,
        }
    }

    /// Entries worth resolving. A top-domain entry, when the policy is
    /// exclusive, is trusted alone and every other entry is discarded.
    pub fn select_candidates(&self, entries: Vec<RawSourceEntry>) -> Vec<RawSourceEntry> {
        let mut usable: Vec<RawSourceEntry> = entries.into_iter().filter(|e| e.is_usable()).collect();

        if self.settings.fast_path.exclusive_partition {
            let top = usable
                .iter()
                .position(|entry| self.priorities.is_top(&entry.decode().path_or_url));
            if let Some(pos) = top {
                info!(
                    discarded = usable.len() - 1,
                    label = %usable[pos].label,
                    "top-priority source found, resolving it exclusively"
                );
                return vec![usable.swap_remove(pos)];
            }
        }

        usable
    }

    /// Resolve all entries of one episode
    pub async fn resolve(&self, entries: Vec<RawSourceEntry>) -> Result<Resolved, ExtensionError> {
        let candidates = self.select_candidates(entries);
        if candidates.is_empty() {
            return Err(ExtensionError::NoEligibleSources);
        }

        let total = candidates.len();
        let deadline = Instant::now() + self.settings.overall_timeout;
        let gate = Arc::new(RateGate::new(self.settings.rate_interval));
        let (fast_tx, mut fast_rx) = mpsc::channel::<StreamCandidate>(1);
        let (results_tx, mut results_rx) = mpsc::channel::<TaskReport>(total);

        debug!(providers = total, "launching provider tasks");
        for (index, entry) in candidates.into_iter().enumerate() {
            let task = ProviderTask {
                index,
                entry,
                fetcher: Arc::clone(&self.fetcher),
                priorities: self.priorities.clone(),
                race_tier: self.settings.fast_path.race_tier,
                gate: Arc::clone(&gate),
                fast_tx: fast_tx.clone(),
                results_tx: results_tx.clone(),
            };
            // Detached: tasks abandoned by the fast path or the deadline
            // run to completion and their reports are dropped.
            tokio::spawn(task.run());
        }
        // Only tasks hold senders now, so both channels close once all finish
        drop(fast_tx);
        drop(results_tx);

        let fast_deadline = (Instant::now() + self.settings.fast_path_wait).min(deadline);
        match timeout_at(fast_deadline, fast_rx.recv()).await {
            Ok(Some(stream)) => {
                info!(url = %stream.url, "fast-path stream won the race");
                return Ok(Resolved {
                    streams: vec![stream],
                    fast_path: true,
                });
            }
            Ok(None) => debug!("every provider finished without a fast-path stream"),
            Err(_) => debug!("no fast-path stream within the wait, collecting all providers"),
        }
        drop(fast_rx);

        let mut ordered: Vec<Option<Vec<StreamCandidate>>> = vec![None; total];
        let mut errors = Vec::new();
        let mut reported = 0;

        while reported < total {
            match timeout_at(deadline, results_rx.recv()).await {
                Ok(Some(report)) => {
                    reported += 1;
                    match report.outcome {
                        Ok(streams) => {
                            debug!(index = report.index, streams = streams.len(), "provider finished");
                            ordered[report.index] = Some(streams);
                        }
                        Err(e) => {
                            warn!(index = report.index, error = %e, "provider failed");
                            errors.push(e.to_string());
                        }
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    let pending = total - reported;
                    warn!(pending, reported, "resolution timed out, keeping partial results");
                    errors.push(format!("timed out waiting for {} providers", pending));
                    break;
                }
            }
        }

        let streams: Vec<StreamCandidate> = ordered.into_iter().flatten().flatten().collect();
        if streams.is_empty() {
            warn!(attempted = total, "no provider produced a stream");
            return Err(ExtensionError::Exhausted {
                attempted: total,
                errors,
            });
        }

        Ok(Resolved {
            streams,
            fast_path: false,
        })
    }
}

/// Everything one detached provider task owns
struct ProviderTask {
    index: usize,
    entry: RawSourceEntry,
    fetcher: Arc<dyn LinkFetcher>,
    priorities: DomainPriorities,
    race_tier: usize,
    gate: Arc<RateGate>,
    fast_tx: mpsc::Sender<StreamCandidate>,
    results_tx: mpsc::Sender<TaskReport>,
}

impl ProviderTask {
    async fn run(self) {
        self.gate.wait_turn().await;
        let outcome = self.resolve_entry().await;
        // The orchestrator may have stopped listening; that is fine
        let _ = self
            .results_tx
            .send(TaskReport {
                index: self.index,
                outcome,
            })
            .await;
    }

    async fn resolve_entry(&self) -> Result<Vec<StreamCandidate>, ExtensionError> {
        let locator = self.entry.decode();
        debug!(index = self.index, fetcher = self.fetcher.name(), locator = %locator.path_or_url, "resolving provider");
        let links = self.fetcher.fetch(&locator).await?;

        let mut published = false;
        let mut streams = Vec::with_capacity(links.len());
        for link in &links {
            let mut stream = link.to_candidate(&self.entry.label);
            if !stream.is_valid() {
                continue;
            }
            stream.priority_rank = self.priorities.classify(&stream.url);

            // Only the link as the provider sent it can win the race
            if !published && self.priorities.in_top_tier(&link.raw_link, self.race_tier) {
                published = true;
                self.offer_fast(&stream);
            }
            streams.push(stream);
        }

        Ok(streams)
    }

    /// Non-blocking publish; an earlier winner keeps the slot
    fn offer_fast(&self, stream: &StreamCandidate) {
        if self.fast_tx.try_send(stream.clone()).is_err() {
            debug!(index = self.index, "fast-path slot already taken");
        }
    }
}
