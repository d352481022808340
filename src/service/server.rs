use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use anyhow::Context as _;

use crate::{
    foundation::error::{OrrbError, OrrbResult},
    render::backend::FrameRenderer,
    scene::runtime::SceneRuntime,
    service::{
        config::ServerConfig,
        queue::WorkQueue,
        request::{BatchRenderRequest, UpdateRequest},
        response::{BatchRenderResponse, UpdateReport},
        sim::SimulationLoop,
        workload::{BatchWorkload, PendingResult, UpdateWorkload, Workload},
    },
};

/// Cloneable request handle. Safe to use from any number of threads.
#[derive(Clone)]
pub struct RenderService {
    queue: Arc<WorkQueue<Workload>>,
    next_id: Arc<AtomicU64>,
}

impl RenderService {
    /// Queue a batch render. The result resolves once every entry has been captured.
    #[tracing::instrument(level = "debug", skip_all, fields(entries = request.batch_size()))]
    pub fn render_batch(&self, request: BatchRenderRequest) -> PendingResult<BatchRenderResponse> {
        let (w, pending) = BatchWorkload::new(self.id(), request);
        self.submit(Workload::Batch(w));
        pending
    }

    /// Queue a component update. Applied between batches, in arrival order.
    #[tracing::instrument(level = "debug", skip_all, fields(components = request.components.len()))]
    pub fn update_components(&self, request: UpdateRequest) -> PendingResult<UpdateReport> {
        let (w, pending) = UpdateWorkload::new(self.id(), request);
        self.submit(Workload::Update(w));
        pending
    }

    /// Workloads waiting behind the current one.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    fn id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn submit(&self, w: Workload) {
        let id = w.id();
        // A rejected workload is dropped here, which resolves its result to `Shutdown`.
        if let Err(e) = self.queue.enqueue(w) {
            tracing::warn!(id, error = %e, "workload rejected");
        }
    }
}

/// Owns the simulation thread.
pub struct RenderServer {
    service: RenderService,
    thread: Option<JoinHandle<()>>,
}

impl RenderServer {
    /// Initialize the renderer and spawn the simulation thread.
    ///
    /// Any failure here is fatal: the loop never runs.
    #[tracing::instrument(level = "info", skip_all, fields(thread = %config.thread_name))]
    pub fn start(
        config: ServerConfig,
        scene: Box<dyn SceneRuntime>,
        mut renderer: Box<dyn FrameRenderer>,
    ) -> OrrbResult<Self> {
        config.validate()?;
        renderer
            .init()
            .map_err(|e| OrrbError::render(format!("renderer init failed: {e}")))?;

        let queue = Arc::new(WorkQueue::new(config.queue));
        let mut sim = SimulationLoop::new(Arc::clone(&queue), scene, renderer, config.capture);
        let thread = std::thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || sim.run())
            .context("spawn simulation thread")?;
        tracing::info!("render server started");

        Ok(Self {
            service: RenderService {
                queue,
                next_id: Arc::new(AtomicU64::new(1)),
            },
            thread: Some(thread),
        })
    }

    /// A new handle for submitting requests.
    pub fn service(&self) -> RenderService {
        self.service.clone()
    }

    /// Stop accepting requests, let queued work drain, and join the simulation thread.
    pub fn shutdown(mut self) -> OrrbResult<()> {
        self.stop()
    }

    fn stop(&mut self) -> OrrbResult<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        self.service.queue.close();
        thread
            .join()
            .map_err(|_| OrrbError::render("simulation thread panicked"))?;
        tracing::info!("render server stopped");
        Ok(())
    }
}

impl Drop for RenderServer {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::error!(error = %e, "render server shutdown failed");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/server.rs"]
mod tests;
