use std::sync::Arc;
use std::sync::mpsc;
use std::thread::JoinHandle;

use anyhow::Context as _;
use parking_lot::Mutex;

use crate::{
    client::dataset::BatchDataset,
    foundation::{
        core::{OutputFlags, Pose},
        error::{OrrbError, OrrbResult},
    },
    service::{
        queue::{QueueOpts, WorkQueue},
        request::{BatchEntry, BatchRenderRequest, UpdateRequest},
        server::RenderService,
    },
};

/// Request parameters shared by every batch a client sends.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClientConfig {
    pub cameras: Vec<String>,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub outputs: OutputFlags,
}

/// How the entries of a job are seeded.
#[derive(Clone, Debug, PartialEq)]
pub enum JobSeeds {
    /// Entry `i` uses `seed + i`.
    Batch(u64),
    /// One seed per entry.
    PerEntry(Vec<u64>),
}

/// Poses for one batch.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchJob {
    pub poses: Vec<Pose>,
    pub seeds: JobSeeds,
}

impl BatchJob {
    pub fn seeded(poses: Vec<Pose>, seed: u64) -> Self {
        Self {
            poses,
            seeds: JobSeeds::Batch(seed),
        }
    }

    pub fn with_entry_seeds(poses: Vec<Pose>, seeds: Vec<u64>) -> OrrbResult<Self> {
        if poses.len() != seeds.len() {
            return Err(OrrbError::validation(format!(
                "{} poses but {} seeds",
                poses.len(),
                seeds.len()
            )));
        }
        Ok(Self {
            poses,
            seeds: JobSeeds::PerEntry(seeds),
        })
    }

    fn into_request(self, config: &ClientConfig) -> BatchRenderRequest {
        let mut req = BatchRenderRequest::new(config.cameras.iter().cloned(), config.width, config.height);
        req.outputs = config.outputs;
        match self.seeds {
            JobSeeds::Batch(seed) => {
                req.batch_seed = seed;
                req.entries = self
                    .poses
                    .into_iter()
                    .map(|pose| BatchEntry { pose, seed: 0 })
                    .collect();
            }
            JobSeeds::PerEntry(seeds) => {
                req.use_entry_seeds = true;
                req.entries = self
                    .poses
                    .into_iter()
                    .zip(seeds)
                    .map(|(pose, seed)| BatchEntry { pose, seed })
                    .collect();
            }
        }
        req
    }
}

/// Renderer component settings tagged with a version. Workers re-send the settings whenever the
/// version they last applied differs.
struct Stamped {
    stamp: u64,
    update: Arc<UpdateRequest>,
}

struct Task {
    stamp: u64,
    update: Arc<UpdateRequest>,
    job: BatchJob,
    destination: mpsc::Sender<OrrbResult<BatchDataset>>,
}

/// Client-side executor: worker threads, each bound to one [`RenderService`], fed from a shared
/// queue.
pub struct BatchClient {
    queue: Arc<WorkQueue<Task>>,
    renderer_config: Mutex<Stamped>,
    workers: Vec<JoinHandle<()>>,
}

impl BatchClient {
    /// Spawn one worker per service.
    pub fn start(
        config: ClientConfig,
        services: Vec<RenderService>,
        queue: QueueOpts,
    ) -> OrrbResult<Self> {
        if services.is_empty() {
            return Err(OrrbError::validation("client needs at least one render service"));
        }
        let config = Arc::new(config);
        let queue = Arc::new(WorkQueue::new(queue));
        let mut workers = Vec::with_capacity(services.len());
        for (i, service) in services.into_iter().enumerate() {
            let config = Arc::clone(&config);
            let queue = Arc::clone(&queue);
            tracing::info!(worker = i, "starting client worker");
            let handle = std::thread::Builder::new()
                .name(format!("orrb-client-{i}"))
                .spawn(move || worker_loop(i, &service, &config, &queue))
                .context("spawn client worker")?;
            workers.push(handle);
        }
        Ok(Self {
            queue,
            renderer_config: Mutex::new(Stamped {
                stamp: 0,
                update: Arc::new(UpdateRequest::default()),
            }),
            workers,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    /// Current renderer settings version. `0` until the first [`BatchClient::update`].
    pub fn stamp(&self) -> u64 {
        self.renderer_config.lock().stamp
    }

    /// Replace the renderer settings. Every worker applies them before its next batch.
    pub fn update(&self, update: UpdateRequest) -> u64 {
        let mut cfg = self.renderer_config.lock();
        cfg.stamp += 1;
        cfg.update = Arc::new(update);
        cfg.stamp
    }

    /// Queue `job`; its decoded result is sent to `destination`.
    pub fn render_batch_async(
        &self,
        job: BatchJob,
        destination: mpsc::Sender<OrrbResult<BatchDataset>>,
    ) -> OrrbResult<()> {
        let (stamp, update) = {
            let cfg = self.renderer_config.lock();
            (cfg.stamp, Arc::clone(&cfg.update))
        };
        self.queue.enqueue(Task {
            stamp,
            update,
            job,
            destination,
        })
    }

    /// Render `job` and wait for the decoded result.
    pub fn render_batch(&self, job: BatchJob) -> OrrbResult<BatchDataset> {
        let (tx, rx) = mpsc::channel();
        self.render_batch_async(job, tx)?;
        rx.recv()
            .map_err(|_| OrrbError::shutdown("client worker exited before replying"))?
    }

    /// Let queued jobs finish, then join every worker.
    pub fn shutdown(mut self) -> OrrbResult<()> {
        self.stop()
    }

    fn stop(&mut self) -> OrrbResult<()> {
        self.queue.close();
        let mut panicked = 0;
        for (i, h) in self.workers.drain(..).enumerate() {
            tracing::info!(worker = i, "joining client worker");
            if h.join().is_err() {
                panicked += 1;
            }
        }
        if panicked > 0 {
            return Err(OrrbError::render(format!("{panicked} client worker(s) panicked")));
        }
        Ok(())
    }
}

impl Drop for BatchClient {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::error!(error = %e, "client shutdown failed");
        }
    }
}

fn worker_loop(
    worker: usize,
    service: &RenderService,
    config: &ClientConfig,
    queue: &WorkQueue<Task>,
) {
    let mut applied = 0u64;
    while let Some(task) = queue.dequeue_blocking() {
        if task.stamp != applied {
            match service.update_components((*task.update).clone()).wait() {
                Ok(report) => tracing::debug!(
                    worker,
                    stamp = task.stamp,
                    applied = report.applied.len(),
                    skipped = report.skipped.len(),
                    "renderer settings applied"
                ),
                Err(e) => tracing::warn!(worker, stamp = task.stamp, error = %e, "renderer settings not applied"),
            }
            applied = task.stamp;
        }
        let result = service
            .render_batch(task.job.into_request(config))
            .wait()
            .map(|resp| BatchDataset::from_response(&resp));
        if task.destination.send(result).is_err() {
            tracing::debug!(worker, "result destination closed");
        }
    }
    tracing::debug!(worker, "client worker stopped");
}

#[cfg(test)]
#[path = "../../tests/unit/client/executor.rs"]
mod tests;
