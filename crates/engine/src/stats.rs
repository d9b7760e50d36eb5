//! Concurrent retrieval of per-instance process statistics.
//!
//! Each process needs its own stats request, so a space with many apps means
//! many round trips. They are issued concurrently from a [`JoinSet`], with a
//! [`Semaphore`] bounding how many are in flight and a short pause between
//! launches to avoid bursting the API. Results are keyed by process GUID.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use panzer_api::CfClient;
use panzer_types::{ListResponse, Process, ProcessStats};
use panzer_util::http::{get_json, resource_path};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, instrument};

pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;
pub const DEFAULT_LAUNCH_INTERVAL: Duration = Duration::from_millis(25);

/// Stats of every reported process, keyed by process GUID.
pub type StatsByProcess = HashMap<String, Vec<ProcessStats>>;

/// Something that can produce the instance stats of a process.
#[async_trait]
pub trait StatsSource: Send + Sync {
    async fn process_stats(&self, process: &Process) -> Result<Vec<ProcessStats>>;
}

#[async_trait]
impl StatsSource for CfClient {
    async fn process_stats(&self, process: &Process) -> Result<Vec<ProcessStats>> {
        let href = match process.links.stats.as_ref() {
            Some(link) if !link.href.is_empty() && self.is_api_link(&link.href) => link.href.clone(),
            _ => format!("{}/stats", resource_path("processes", &process.guid)),
        };
        let page: ListResponse<ProcessStats> = get_json(self, &href, &[]).await?;
        Ok(page.resources)
    }
}

/// Bounds for the stats fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanOutLimits {
    /// Maximum number of requests in flight.
    pub max_in_flight: usize,
    /// Pause between two launches.
    pub launch_interval: Duration,
}

impl Default for FanOutLimits {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            launch_interval: DEFAULT_LAUNCH_INTERVAL,
        }
    }
}

/// Fetch the stats of every process concurrently.
///
/// The first failure aborts all outstanding requests and is returned; there
/// are no partial results. Processes sharing a GUID are fetched once.
#[instrument(skip_all, fields(processes = processes.len(), max_in_flight = limits.max_in_flight))]
pub async fn fetch_process_stats<S>(
    source: Arc<S>,
    processes: &[Process],
    limits: &FanOutLimits,
) -> Result<StatsByProcess>
where
    S: StatsSource + ?Sized + 'static,
{
    let results: Arc<Mutex<StatsByProcess>> = Arc::new(Mutex::new(HashMap::with_capacity(processes.len())));
    let semaphore = Arc::new(Semaphore::new(limits.max_in_flight.max(1)));
    let mut tasks: JoinSet<Result<()>> = JoinSet::new();
    let mut launched = HashSet::new();

    for process in processes {
        if !launched.insert(process.guid.as_str()) {
            continue;
        }
        if launched.len() > 1 && !limits.launch_interval.is_zero() {
            tokio::time::sleep(limits.launch_interval).await;
        }
        let permit = Arc::clone(&semaphore)
            .acquire_owned()
            .await
            .context("stats semaphore closed")?;

        let source = Arc::clone(&source);
        let results = Arc::clone(&results);
        let process = process.clone();
        tasks.spawn(async move {
            let _permit = permit;
            let stats = source
                .process_stats(&process)
                .await
                .with_context(|| {
                    format!("failed to get stats for process {} ({})", process.guid, process.process_type)
                })?;
            debug!(process = %process.guid, instances = stats.len(), "stats received");
            results
                .lock()
                .map_err(|_| anyhow!("stats results lock poisoned"))?
                .insert(process.guid, stats);
            Ok(())
        });

        while let Some(finished) = tasks.try_join_next() {
            finished.context("stats task failed")??;
        }
    }

    while let Some(finished) = tasks.join_next().await {
        finished.context("stats task failed")??;
    }

    let mut results = results.lock().map_err(|_| anyhow!("stats results lock poisoned"))?;
    Ok(std::mem::take(&mut *results))
}
