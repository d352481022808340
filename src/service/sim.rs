use std::sync::Arc;

use crate::{
    capture::recorder::{BatchRecorder, CaptureOpts},
    render::backend::FrameRenderer,
    scene::runtime::SceneRuntime,
    service::{
        queue::WorkQueue,
        workload::{TickContext, Workload, WorkloadState},
    },
};

/// The single-threaded simulation/render loop.
///
/// Owns the scene, the renderer, the capture pipeline and the current workload. A new workload
/// is taken from the queue only once the current one has finished, so workloads run strictly in
/// arrival order.
pub struct SimulationLoop {
    queue: Arc<WorkQueue<Workload>>,
    scene: Box<dyn SceneRuntime>,
    renderer: Box<dyn FrameRenderer>,
    recorder: BatchRecorder,
    current: Option<Workload>,
    ticks: u64,
    finished: u64,
}

impl SimulationLoop {
    pub fn new(
        queue: Arc<WorkQueue<Workload>>,
        scene: Box<dyn SceneRuntime>,
        renderer: Box<dyn FrameRenderer>,
        capture: CaptureOpts,
    ) -> Self {
        Self {
            queue,
            scene,
            renderer,
            recorder: BatchRecorder::new(capture),
            current: None,
            ticks: 0,
            finished: 0,
        }
    }

    /// Run one tick without blocking.
    ///
    /// Takes the next workload if none is current, then advances it once. Returns `false` when
    /// there was nothing to do.
    pub fn tick(&mut self) -> bool {
        if self.current.is_none() {
            self.current = self.queue.try_dequeue();
            if let Some(w) = &self.current {
                tracing::info!(id = w.id(), kind = w.label(), "workload started");
            }
        }
        self.advance()
    }

    /// Tick until the queue is closed and drained.
    ///
    /// If the loop unwinds, the queue is closed and every waiting workload is dropped so its
    /// caller sees `Shutdown` instead of blocking forever.
    pub fn run(&mut self) {
        let _drain = DrainOnExit(Arc::clone(&self.queue));
        tracing::info!("simulation loop running");
        loop {
            if self.current.is_none() {
                match self.queue.dequeue_blocking() {
                    Some(w) => {
                        tracing::info!(id = w.id(), kind = w.label(), "workload started");
                        self.current = Some(w);
                    }
                    None => break,
                }
            }
            self.advance();
        }
        tracing::info!(
            ticks = self.ticks,
            finished = self.finished,
            stats = ?self.recorder.stats(),
            "simulation loop stopped"
        );
    }

    fn advance(&mut self) -> bool {
        let Some(w) = self.current.as_mut() else {
            return false;
        };
        let mut cx = TickContext {
            scene: self.scene.as_mut(),
            renderer: self.renderer.as_mut(),
            recorder: &mut self.recorder,
        };
        let state = w.tick(&mut cx);
        self.ticks += 1;
        if state.is_finished() {
            tracing::debug!(id = w.id(), ?state, "workload finished");
            self.current = None;
            self.finished += 1;
        }
        true
    }

    /// State of the workload in progress, if any.
    pub fn current_state(&self) -> Option<WorkloadState> {
        self.current.as_ref().map(Workload::state)
    }

    pub fn recorder(&self) -> &BatchRecorder {
        &self.recorder
    }

    pub fn scene(&self) -> &dyn SceneRuntime {
        self.scene.as_ref()
    }

    /// Ticks that advanced a workload.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Workloads that reached `Completed` or `Failed`.
    pub fn finished(&self) -> u64 {
        self.finished
    }
}

struct DrainOnExit(Arc<WorkQueue<Workload>>);

impl Drop for DrainOnExit {
    fn drop(&mut self) {
        if std::thread::panicking() {
            tracing::error!(queued = self.0.len(), "simulation loop panicked; failing queued workloads");
        }
        self.0.close();
        while let Some(w) = self.0.try_dequeue() {
            tracing::debug!(id = w.id(), "dropping queued workload");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/sim.rs"]
mod tests;
