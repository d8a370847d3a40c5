//! Spromoji animates a static 2D avatar image from live face-tracking signals.
//!
//! A triangulated mesh (`Rig`) is anchored to the avatar through per-vertex texture
//! coordinates. Every frame the tracker's blendshape scores and landmarks are smoothed, the
//! mesh vertices ease toward their displaced targets, and each triangle of the avatar is
//! re-rasterized through its own texture-to-screen affine map.
//!
//! # Pipeline overview
//!
//! 1. **Acquire a rig**: load an authored rig, calibrate the canonical template from three
//!    taps, or synthesize a minimal rig from detected / selected eye and mouth regions.
//! 2. **Estimate**: `TrackingFrame -> BlendState + OrientState` (exponential smoothing).
//! 3. **Render**: move vertices, then warp the avatar triangle by triangle onto a
//!    `RenderSurface` (CPU surface powered by `vello_cpu`).
//!
//! The design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Single writer**: an [`Engine`] owns all mutable state; hosts serialize access.
//! - **Soft per-frame failures**: degenerate triangles are skipped, missing landmarks hold
//!   the last pose; only rig acquisition and calibration fail loudly.
#![forbid(unsafe_code)]

mod assets;
mod calibration;
mod detect;
mod engine;
mod estimate;
mod foundation;
mod render;
mod rig;

pub use foundation::landmarks;

pub use assets::decode::{AvatarImage, decode_avatar, load_avatar};
pub use calibration::align::{
    AlignedTemplate, CalibrationTransform, DEFAULT_CALIBRATION_MARGIN, align_template,
    align_template_with,
};
pub use calibration::template::{Template, TemplateKeys};
pub use detect::chain::{LandmarkDetector, detect_regions};
pub use detect::region::{DetectionMethod, Region, RegionKind, RegionPolygon, RegionSet};
pub use engine::acquire::{AcquiredRig, RigAcquisition, RigOrigin, acquire_rig};
pub use engine::config::{DEPTH_PASS_ENV, EngineConfig};
pub use engine::selection::{
    PointerEvent, RegionSelector, SelectionCancelled, SelectionState, select_region_set_blocking,
    select_regions_blocking,
};
pub use engine::session::Engine;
pub use estimate::pose::{
    BLEND_SMOOTHING, OrientState, POSE_SMOOTHING, PoseBlendEstimator, TrackingFrame, raw_pose,
};
pub use foundation::core::{Affine, BezPath, ImageSize, Landmark, Point, Rect, Vec2};
pub use foundation::error::{SpromojiError, SpromojiResult};
pub use foundation::math::lerp;
pub use render::cpu::CpuSurface;
pub use render::frame::FrameRGBA;
pub use render::surface::{RecordingSurface, RenderSurface, SurfaceOp};
pub use render::warp::{
    DEPTH_OFFSET, DepthPass, MeshWarpRenderer, RenderSettings, RenderStats, solve_affine,
};
pub use rig::blendshape::{BlendShape, BlendState, Displacement};
pub use rig::builder::{REGION_RIG_TRIANGLES, rig_from_aligned_template, rig_from_regions};
pub use rig::model::{Rig, RigSource, Vertex, VertexDef};
