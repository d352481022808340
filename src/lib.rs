//! Batched synthetic-image render backend.
//!
//! A [`RenderServer`] owns one scene, one renderer and a simulation thread that advances queued
//! workloads one tick at a time. Batch requests are rendered into a small ring of reusable
//! surfaces and copied out asynchronously by the [`BatchRecorder`]. [`BatchClient`] spreads
//! batches over several servers and decodes responses into named arrays.
#![forbid(unsafe_code)]

mod foundation;

pub mod capture;
pub mod client;
pub mod output;
pub mod render;
pub mod scene;
pub mod service;

#[cfg(test)]
#[path = "../tests/unit/log_capture.rs"]
mod log_capture;

pub use capture::format::PixelFormat;
pub use capture::recorder::{BatchRecorder, CaptureOpts, TrimPolicy};
pub use client::dataset::{BatchDataset, DatasetValue, Tensor};
pub use client::executor::{BatchClient, BatchJob, ClientConfig, JobSeeds};
pub use foundation::core::{OutputFlags, OutputKind, Pose, Vec3};
pub use foundation::error::{OrrbError, OrrbResult};
pub use output::context::{AuxiliaryStream, BatchOutputContext, StreamData, StreamKind};
pub use render::backend::{FrameRenderer, Surface, SurfaceDesc};
pub use render::cpu::{CpuRenderer, CpuRendererOpts};
pub use scene::component::{Component, PropertyValue};
pub use scene::model::{Camera, SceneConfig};
pub use scene::registry::ComponentRegistry;
pub use scene::runtime::{Scene, SceneRuntime};
pub use service::config::ServerConfig;
pub use service::queue::QueueOpts;
pub use service::request::{BatchEntry, BatchRenderRequest, UpdateRequest};
pub use service::response::{BatchRenderResponse, CameraStream, StreamEntry, UpdateReport};
pub use service::server::{RenderServer, RenderService};
pub use service::workload::{PendingResult, WorkloadState};
