use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    capture::{
        format::PixelFormat,
        recorder::{BatchRecorder, CapturedBatch},
    },
    foundation::{
        core::OutputKind,
        error::{OrrbError, OrrbResult},
    },
    output::context::BatchOutputContext,
    render::backend::FrameRenderer,
    scene::runtime::SceneRuntime,
    service::{
        request::{BatchRenderRequest, UpdateRequest},
        response::{BatchRenderResponse, CameraStream, StreamEntry, UpdateReport},
    },
};

/// Lifecycle of one workload on the simulation thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkloadState {
    Created,
    Initializing,
    Stepping,
    AwaitingCapture,
    Updating,
    Completed,
    Failed,
}

impl WorkloadState {
    /// `true` once the result has been delivered.
    pub fn is_finished(self) -> bool {
        matches!(self, WorkloadState::Completed | WorkloadState::Failed)
    }
}

/// Result future handed to the caller of a service request.
///
/// Resolves once the simulation thread finishes the workload. If the workload is dropped
/// unfinished (server shut down) it resolves to [`OrrbError::Shutdown`].
#[must_use = "a pending result does nothing unless awaited or waited on"]
pub struct PendingResult<T> {
    rx: oneshot::Receiver<OrrbResult<T>>,
}

impl<T> PendingResult<T> {
    pub(crate) fn channel() -> (oneshot::Sender<OrrbResult<T>>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }

    /// Block the current thread until the result is available.
    pub fn wait(self) -> OrrbResult<T> {
        futures::executor::block_on(self)
    }

    /// Take the result if it is already available.
    pub fn try_take(&mut self) -> Option<OrrbResult<T>> {
        match self.rx.try_recv() {
            Ok(v) => v,
            Err(oneshot::Canceled) => Some(Err(dropped())),
        }
    }
}

impl<T> Future for PendingResult<T> {
    type Output = OrrbResult<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|r| r.unwrap_or_else(|oneshot::Canceled| Err(dropped())))
    }
}

fn dropped() -> OrrbError {
    OrrbError::shutdown("workload dropped before completion")
}

fn resolve<T>(reply: &mut Option<oneshot::Sender<OrrbResult<T>>>, id: u64, result: OrrbResult<T>) {
    if let Some(tx) = reply.take()
        && tx.send(result).is_err()
    {
        tracing::debug!(id, "caller dropped the result before completion");
    }
}

/// Everything a workload touches during one tick. Owned by the simulation thread.
pub struct TickContext<'a> {
    pub scene: &'a mut dyn SceneRuntime,
    pub renderer: &'a mut dyn FrameRenderer,
    pub recorder: &'a mut BatchRecorder,
}

/// A batch render request progressing one entry per tick.
pub struct BatchWorkload {
    id: u64,
    state: WorkloadState,
    request: BatchRenderRequest,
    reply: Option<oneshot::Sender<OrrbResult<BatchRenderResponse>>>,
    cursor: usize,
    outputs: BatchOutputContext,
}

impl BatchWorkload {
    pub fn new(id: u64, request: BatchRenderRequest) -> (Self, PendingResult<BatchRenderResponse>) {
        let (tx, pending) = PendingResult::channel();
        let w = Self {
            id,
            state: WorkloadState::Created,
            request,
            reply: Some(tx),
            cursor: 0,
            outputs: BatchOutputContext::new(),
        };
        (w, pending)
    }

    pub fn state(&self) -> WorkloadState {
        self.state
    }

    /// Entries stepped so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Advance by one tick.
    pub fn tick(&mut self, cx: &mut TickContext<'_>) -> WorkloadState {
        match self.state {
            WorkloadState::Created => {
                self.state = WorkloadState::Initializing;
                match self.initialize(cx) {
                    Ok(()) => self.state = WorkloadState::Stepping,
                    Err(e) => self.fail(e),
                }
            }
            WorkloadState::Stepping => {
                if let Err(e) = self.step(cx) {
                    self.fail(e);
                } else if self.cursor == self.request.batch_size() {
                    self.state = WorkloadState::AwaitingCapture;
                }
            }
            WorkloadState::AwaitingCapture => match cx.recorder.poll_complete(&mut *cx.renderer) {
                Ok(Some(batch)) => self.complete(batch),
                Ok(None) => {}
                Err(e) => self.fail(e),
            },
            _ => {}
        }
        self.state
    }

    #[tracing::instrument(level = "info", skip_all, fields(id = self.id))]
    fn initialize(&mut self, cx: &mut TickContext<'_>) -> OrrbResult<()> {
        let req = &self.request;
        req.validate(&*cx.scene)?;
        req.check_surface_size(cx.recorder.opts().max_surface_bytes)?;
        cx.recorder.reset_batch(
            req.batch_size(),
            req.width,
            req.height,
            req.outputs,
            &req.cameras,
        );
        tracing::info!(
            cameras = req.cameras.len(),
            entries = req.batch_size(),
            width = req.width,
            height = req.height,
            "batch started"
        );
        Ok(())
    }

    fn step(&mut self, cx: &mut TickContext<'_>) -> OrrbResult<()> {
        let cursor = self.cursor;
        let entry = &self.request.entries[cursor];
        if let Err(e) = cx.scene.apply_pose(&entry.pose) {
            tracing::error!(id = self.id, entry = cursor, error = %e, "pose not applied");
        }
        let seed = self.request.entry_seed(cursor);
        let mut rng = StdRng::seed_from_u64(seed);
        for f in cx.scene.run_frame_update(cursor, &mut rng, &mut self.outputs) {
            tracing::error!(
                id = self.id,
                entry = cursor,
                component = %f.component,
                error = %f.error,
                "component failed"
            );
        }
        cx.recorder.capture(&mut *cx.renderer, &*cx.scene)?;
        tracing::debug!(id = self.id, entry = cursor, seed, "entry captured");
        self.cursor += 1;
        self.outputs.advance();
        Ok(())
    }

    #[tracing::instrument(level = "info", skip_all, fields(id = self.id))]
    fn complete(&mut self, batch: CapturedBatch) {
        let n = batch.batch_size;
        let mut streams: Vec<CameraStream> = self
            .request
            .cameras
            .iter()
            .map(|name| CameraStream {
                name: name.clone(),
                color_format: PixelFormat::wire(OutputKind::Color, self.request.outputs.alpha),
                entries: vec![StreamEntry::default(); n],
            })
            .collect();
        for images in batch.images {
            let Some(stream) = streams.iter_mut().find(|s| s.name == images.camera) else {
                continue;
            };
            for (slot, data) in stream.entries.iter_mut().zip(images.entries) {
                match images.kind {
                    OutputKind::Color => slot.color = data,
                    OutputKind::DepthNormals => slot.depth_normals = Some(data),
                    OutputKind::Segmentation => slot.segmentation = Some(data),
                }
            }
        }
        let auxiliary = std::mem::take(&mut self.outputs).finalize(n);
        let response = BatchRenderResponse {
            batch_size: n,
            width: batch.width,
            height: batch.height,
            streams,
            auxiliary,
        };
        tracing::info!(entries = n, "batch completed");
        self.state = WorkloadState::Completed;
        resolve(&mut self.reply, self.id, Ok(response));
    }

    fn fail(&mut self, error: OrrbError) {
        tracing::error!(id = self.id, state = ?self.state, %error, "batch failed");
        self.state = WorkloadState::Failed;
        resolve(&mut self.reply, self.id, Err(error));
    }
}

/// A component update, applied in a single tick.
pub struct UpdateWorkload {
    id: u64,
    state: WorkloadState,
    request: UpdateRequest,
    reply: Option<oneshot::Sender<OrrbResult<UpdateReport>>>,
}

impl UpdateWorkload {
    pub fn new(id: u64, request: UpdateRequest) -> (Self, PendingResult<UpdateReport>) {
        let (tx, pending) = PendingResult::channel();
        let w = Self {
            id,
            state: WorkloadState::Created,
            request,
            reply: Some(tx),
        };
        (w, pending)
    }

    pub fn state(&self) -> WorkloadState {
        self.state
    }

    #[tracing::instrument(level = "info", skip_all, fields(id = self.id))]
    pub fn tick(&mut self, cx: &mut TickContext<'_>) -> WorkloadState {
        if self.state == WorkloadState::Created {
            self.state = WorkloadState::Updating;
            let report = cx.scene.update_components(&self.request);
            tracing::info!(
                applied = report.applied.len(),
                skipped = report.skipped.len(),
                "components updated"
            );
            self.state = WorkloadState::Completed;
            resolve(&mut self.reply, self.id, Ok(report));
        }
        self.state
    }
}

/// Unit of work consumed by the simulation loop.
pub enum Workload {
    Batch(BatchWorkload),
    Update(UpdateWorkload),
}

impl Workload {
    pub fn id(&self) -> u64 {
        match self {
            Workload::Batch(w) => w.id,
            Workload::Update(w) => w.id,
        }
    }

    pub fn state(&self) -> WorkloadState {
        match self {
            Workload::Batch(w) => w.state,
            Workload::Update(w) => w.state,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Workload::Batch(_) => "batch",
            Workload::Update(_) => "update",
        }
    }

    pub fn tick(&mut self, cx: &mut TickContext<'_>) -> WorkloadState {
        match self {
            Workload::Batch(w) => w.tick(cx),
            Workload::Update(w) => w.tick(cx),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/service/workload.rs"]
mod tests;
