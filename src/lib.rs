//! Interactive path boolean operations and shape fracturing.
//!
//! Main features:
//!  - Boolean operations on paths (union, intersection, difference,
//!    symmetric difference, cut, slice) with winding-rule aware fill
//!    semantics and a dual-algorithm policy: a curve-preserving path
//!    intersection graph backed by an always-succeeding polygonal fallback
//!  - Region extraction: fracture a z-ordered stack of overlapping shapes
//!    into atomic non-overlapping regions, or flatten it into an opaque
//!    top-to-bottom decomposition
//!  - An interactive builder that lets a host application merge or delete
//!    fractured regions with transactional commits and undo/redo
//!
mod boolop;
mod builder;
mod curve;
mod ellipse;
mod extract;
mod geometry;
mod graph;
mod path;
mod plane;
mod subitem;
mod utils;

pub use boolop::{
    BoolOp, BoolOptions, TOLERANCE_FACTOR, approx_threshold, boolean, boolean_report, boolean_with,
    cut_by_lines, flatten, slice,
};
pub use builder::{BooleanBuilder, BuildMode, Commit, DEFAULT_HIT_TOLERANCE, Output, TaskKind};
pub use curve::{Cubic, Curve, CurveExtremities, CurveFlattenIter, CurveRoots, Line, Quad, Segment};
pub use ellipse::{EllipArc, EllipArcCubicIter};
pub use extract::{Element, MosaicConfig, build_flatten, build_mosaic};
pub use geometry::{BBox, EPSILON, EPSILON_SQRT, PI, Point, Scalar, Transform, scalar_fmt};
pub use path::{DEFAULT_FLATNESS, Error, FillRule, Path, PathBuilder, SubPath};
pub use subitem::{ShapeId, Style, SubItem, WorkItem};
use utils::{ArrayIter, clamp, cubic_solve, quadratic_solve};
