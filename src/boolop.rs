//! Boolean operations on paths
//!
//! The engine runs two independent algorithms. The primary one is the path
//! intersection graph (`graph` module), which works on curved geometry and
//! preserves beziers, but refuses degenerate input. Whenever it fails, the
//! engine falls back unconditionally to the polygon uncrossing backend
//! (`plane` module), which always produces a result at the cost of
//! polygonalizing everything at the approximation threshold. The primary
//! result is authoritative when both apply; the fallback is strictly a
//! reliability mechanism.
//!
//! Thresholds scale with the operand bounding box diagonal so behavior is
//! scale invariant.

use crate::{
    Curve, FillRule, Line, Path, Scalar, Segment, SubPath, Transform,
    graph::{self, GraphOp},
    plane::PlaneGraph,
};
use tracing::debug;

/// Scale factor between a path's bounding box diagonal and its approximation
/// threshold. Empirically chosen, see `approx_threshold`.
pub const TOLERANCE_FACTOR: Scalar = 1e-3;

/// Boolean operation on two path operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoolOp {
    Union,
    Intersection,
    /// `A` minus `B`
    Difference,
    SymmetricDifference,
    /// Partition `A` with the edges of `B`, keeping all pieces
    Cut,
    /// Insert path breaks into `A` wherever it intersects `B`
    Slice,
}

/// Options controlling the dual-algorithm policy
#[derive(Debug, Clone, Copy)]
pub struct BoolOptions {
    /// Skip the primary algorithm entirely. Useful for inputs known to be
    /// degenerate, the result is polygonal.
    pub fallback_only: bool,
    /// Resolve self-overlap of both operands before the primary algorithm.
    /// Polygonalizes the operands, the primary detects unresolved operands
    /// by itself, so this is off by default.
    pub flatten_before: bool,
}

impl Default for BoolOptions {
    fn default() -> Self {
        Self {
            fallback_only: false,
            flatten_before: false,
        }
    }
}

/// Rough estimate of a path's size, based on its bounding box
fn diameter(path: &Path) -> Scalar {
    path.bbox(Transform::identity())
        .map_or(0.0, |bbox| bbox.diameter())
}

/// Estimate a suitable approximation threshold for a path
pub fn approx_threshold(path: &Path) -> Scalar {
    diameter(path) * TOLERANCE_FACTOR
}

/// Threshold shared by a pair of operands
fn pair_threshold(a: &Path, b: &Path) -> Scalar {
    let ta = approx_threshold(a);
    let tb = approx_threshold(b);
    let threshold = match (ta > 0.0, tb > 0.0) {
        (true, true) => ta.min(tb),
        (true, false) => ta,
        (false, _) => tb,
    };
    threshold.max(1e-9)
}

/// Convert quads to cubics. The geometry backends only handle lines and
/// cubic beziers (arcs never occur, they are converted at construction).
fn to_linear_and_cubic(path: &Path) -> Path {
    Path::new(
        path.subpaths()
            .iter()
            .map(|subpath| {
                let segments = subpath
                    .segments()
                    .iter()
                    .map(|segment| match segment {
                        Segment::Quad(quad) => crate::Cubic::from(*quad).into(),
                        segment => *segment,
                    })
                    .collect();
                SubPath::new(segments, subpath.closed()).expect("subpath is never empty")
            })
            .collect(),
    )
}

/// Resolve self-overlap/self-intersection of a path into its plain filled
/// outline under the fill rule.
///
/// The result is polygonal at the approximation threshold, with outer
/// contours counter-clockwise and holes clockwise.
pub fn flatten(path: &Path, fill_rule: FillRule) -> Path {
    if path.is_empty() {
        return Path::empty();
    }
    let threshold = approx_threshold(path).max(1e-9);
    let mut plane = PlaneGraph::new(threshold);
    let operand = plane.add_operand(path, true, threshold);
    plane.build();
    plane.select(|windings| fill_rule.is_filled(windings[operand]))
}

/// Perform a boolean operation on two paths
///
/// The cheapest entry point, identical to `boolean_report` with the
/// diagnostic flag dropped.
pub fn boolean(a: &Path, fill_a: FillRule, b: &Path, fill_b: FillRule, op: BoolOp) -> Path {
    boolean_report(a, fill_a, b, fill_b, op).0
}

/// Perform a boolean operation, reporting whether the approximate fallback
/// algorithm was used.
///
/// The flag is a diagnostic for optional user-facing reporting, never a hard
/// error: degenerate inputs simply produce an empty or best-effort result.
pub fn boolean_report(
    a: &Path,
    fill_a: FillRule,
    b: &Path,
    fill_b: FillRule,
    op: BoolOp,
) -> (Path, bool) {
    boolean_with(a, fill_a, b, fill_b, op, BoolOptions::default())
}

/// Perform a boolean operation with explicit policy options
pub fn boolean_with(
    a: &Path,
    fill_a: FillRule,
    b: &Path,
    fill_b: FillRule,
    op: BoolOp,
    options: BoolOptions,
) -> (Path, bool) {
    let a = to_linear_and_cubic(a);
    let b = to_linear_and_cubic(b);

    // empty operand identities: `0 or B = B`, `A and 0 = 0`, ...
    if a.is_empty() || b.is_empty() {
        let result = match op {
            BoolOp::Union | BoolOp::SymmetricDifference => {
                let (path, rule) = if a.is_empty() { (&b, fill_b) } else { (&a, fill_a) };
                flatten(path, rule)
            }
            BoolOp::Intersection => Path::empty(),
            BoolOp::Difference | BoolOp::Cut => flatten(&a, fill_a),
            BoolOp::Slice => a.clone(),
        };
        return (result, false);
    }

    let mut approximate = false;
    if !options.fallback_only && op != BoolOp::Slice {
        let (fa, fb) = if options.flatten_before {
            (flatten(&a, fill_a), flatten(&b, fill_b))
        } else {
            (a.clone(), b.clone())
        };
        let tolerance = pair_threshold(&fa, &fb);
        match primary(&fa, &fb, op, tolerance) {
            Ok(result) => return (result, false),
            Err(err) => {
                debug!(%err, ?op, "intersection graph failed, falling back to polygon uncrossing");
            }
        }
        approximate = true;
    }

    (fallback(&a, fill_a, &b, fill_b, op), approximate)
}

/// Primary algorithm dispatch. Symmetric difference and cut are composed out
/// of the graph primitives; their partial results have disjoint interiors so
/// plain concatenation is their union.
fn primary(a: &Path, b: &Path, op: BoolOp, tolerance: Scalar) -> Result<Path, graph::GraphError> {
    match op {
        BoolOp::Union => graph::boolean(a, b, GraphOp::Union, tolerance),
        BoolOp::Intersection => graph::boolean(a, b, GraphOp::Intersection, tolerance),
        BoolOp::Difference => graph::boolean(a, b, GraphOp::Difference, tolerance),
        BoolOp::SymmetricDifference => {
            let mut subpaths: Vec<SubPath> = graph::boolean(a, b, GraphOp::Difference, tolerance)?
                .into_iter()
                .collect();
            subpaths.extend(graph::boolean(b, a, GraphOp::Difference, tolerance)?);
            Ok(Path::new(subpaths))
        }
        BoolOp::Cut => {
            let mut subpaths: Vec<SubPath> = graph::boolean(a, b, GraphOp::Difference, tolerance)?
                .into_iter()
                .collect();
            subpaths.extend(graph::boolean(a, b, GraphOp::Intersection, tolerance)?);
            Ok(Path::new(subpaths))
        }
        BoolOp::Slice => unreachable!("slice never reaches the primary algorithm"),
    }
}

/// Conservative fallback via the planar arrangement
fn fallback(a: &Path, fill_a: FillRule, b: &Path, fill_b: FillRule, op: BoolOp) -> Path {
    let threshold_a = approx_threshold(a).max(1e-9);
    let threshold_b = approx_threshold(b).max(1e-9);
    let eps = pair_threshold(a, b);
    match op {
        BoolOp::Union | BoolOp::Intersection | BoolOp::Difference | BoolOp::SymmetricDifference => {
            let mut plane = PlaneGraph::new(eps);
            let oa = plane.add_operand(a, true, threshold_a);
            let ob = plane.add_operand(b, true, threshold_b);
            plane.build();
            plane.select(|windings| {
                let in_a = fill_a.is_filled(windings[oa]);
                let in_b = fill_b.is_filled(windings[ob]);
                match op {
                    BoolOp::Union => in_a || in_b,
                    BoolOp::Intersection => in_a && in_b,
                    BoolOp::Difference => in_a && !in_b,
                    BoolOp::SymmetricDifference => in_a != in_b,
                    _ => unreachable!(),
                }
            })
        }
        BoolOp::Cut => {
            // the cutter is infinitesimally thin curves, not a region
            let mut plane = PlaneGraph::new(eps);
            let oa = plane.add_operand(a, true, threshold_a);
            plane.add_operand(b, false, threshold_b);
            plane.build();
            let mut subpaths = Vec::new();
            for face in plane.faces() {
                if fill_a.is_filled(face.windings[oa]) {
                    subpaths.extend(face.path);
                }
            }
            Path::new(subpaths)
        }
        BoolOp::Slice => slice(a, b),
    }
}

/// Partition a path into separate pieces by an unfilled set of cut lines.
///
/// Unlike `boolean` with `Cut`, which returns everything as one path, each
/// resulting piece is returned on its own, holes attached to the piece that
/// owns them. Pieces are polygonal at the approximation threshold.
pub fn cut_by_lines(path: &Path, lines: &Path) -> Vec<Path> {
    if path.is_empty() {
        return Vec::new();
    }
    let threshold = approx_threshold(path).max(1e-9);
    let mut plane = PlaneGraph::new(pair_threshold(path, lines));
    let subject = plane.add_operand(path, true, threshold);
    if !lines.is_empty() {
        plane.add_operand(lines, false, approx_threshold(lines).max(1e-9));
    }
    plane.build();
    plane
        .faces()
        .into_iter()
        .filter(|face| FillRule::NonZero.is_filled(face.windings[subject]))
        .map(|face| face.path)
        .collect()
}

/// Insert path breaks into `path` at every intersection with the cutter.
///
/// No material is removed: the geometry is re-traced unchanged, but closed
/// components are opened and split into separate open subpaths at the
/// crossing points.
pub fn slice(path: &Path, cutter: &Path) -> Path {
    if path.is_empty() || cutter.is_empty() {
        return path.clone();
    }
    let tolerance = pair_threshold(path, cutter);

    // materialized cutter segments, including implicit closing lines
    let mut cutter_segments: Vec<Segment> = Vec::new();
    for subpath in cutter.subpaths() {
        cutter_segments.extend(subpath.segments().iter().copied());
        if subpath.closed() && !subpath.end().is_close_to(subpath.start()) {
            cutter_segments.push(Line::new(subpath.end(), subpath.start()).into());
        }
    }

    let mut subpaths: Vec<SubPath> = Vec::new();
    for subpath in path.subpaths() {
        let mut segments: Vec<Segment> = subpath.segments().to_vec();
        if subpath.closed() && !subpath.end().is_close_to(subpath.start()) {
            segments.push(Line::new(subpath.end(), subpath.start()).into());
        }

        // chains of segments between consecutive crossing points
        let mut chains: Vec<Vec<Segment>> = vec![Vec::new()];
        let mut crossings = 0usize;
        for segment in segments {
            let mut params: Vec<Scalar> = cutter_segments
                .iter()
                .flat_map(|cut| segment.intersect_params(*cut, tolerance))
                .map(|(t, _)| t)
                .filter(|&t| t > 1e-6 && t < 1.0 - 1e-6)
                .collect();
            params.sort_by(Scalar::total_cmp);
            params.dedup_by(|t0, t1| (*t0 - *t1).abs() < 1e-6);
            crossings += params.len();
            let mut prev = 0.0;
            for t in params {
                chains
                    .last_mut()
                    .expect("chains is never empty")
                    .push(segment.cut(prev, t));
                chains.push(Vec::new());
                prev = t;
            }
            chains
                .last_mut()
                .expect("chains is never empty")
                .push(segment.cut(prev, 1.0));
        }

        if crossings == 0 {
            subpaths.push(subpath.clone());
            continue;
        }
        // a closed component has no seam at its start point: the first and
        // last chains are two halves of the same piece
        if subpath.closed() && chains.len() > 1 {
            let first = chains.remove(0);
            chains
                .last_mut()
                .expect("chains is never empty")
                .extend(first);
        }
        for chain in chains {
            subpaths.extend(SubPath::new(chain, false));
        }
    }
    Path::new(subpaths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    fn square(x: Scalar, y: Scalar, size: Scalar) -> Path {
        let mut builder = Path::builder();
        builder.move_to((x, y)).rect((size, size));
        builder.build()
    }

    #[test]
    fn test_square_intersection() {
        // concrete scenario: two overlapping 2x2 squares
        let a = square(0.0, 0.0, 2.0);
        let b = square(1.0, 1.0, 2.0);
        let (inters, approximate) =
            boolean_report(&a, FillRule::NonZero, &b, FillRule::NonZero, BoolOp::Intersection);
        assert!(!approximate);
        assert_approx_eq!(inters.area().abs(), 1.0, 1e-9);
        let bbox = inters.bbox(Transform::identity()).unwrap();
        assert_approx_eq!(bbox.x(), 1.0, 1e-9);
        assert_approx_eq!(bbox.y(), 1.0, 1e-9);
        assert_approx_eq!(bbox.width(), 1.0, 1e-9);
        assert_approx_eq!(bbox.height(), 1.0, 1e-9);
    }

    #[test]
    fn test_union_commutes() {
        let a = square(0.0, 0.0, 2.0);
        let b = square(1.0, 1.0, 2.0);
        let ab = boolean(&a, FillRule::NonZero, &b, FillRule::NonZero, BoolOp::Union);
        let ba = boolean(&b, FillRule::NonZero, &a, FillRule::NonZero, BoolOp::Union);
        assert_approx_eq!(ab.area().abs(), 7.0, 1e-9);
        assert_approx_eq!(ab.area().abs(), ba.area().abs(), 1e-9);
    }

    #[test]
    fn test_union_associates() {
        let a = square(0.0, 0.0, 2.0);
        let b = square(1.0, 1.0, 2.0);
        let c = square(2.0, 0.0, 2.0);
        let rule = FillRule::NonZero;
        let left = boolean(
            &boolean(&a, rule, &b, rule, BoolOp::Union),
            rule,
            &c,
            rule,
            BoolOp::Union,
        );
        let right = boolean(
            &a,
            rule,
            &boolean(&b, rule, &c, rule, BoolOp::Union),
            rule,
            BoolOp::Union,
        );
        assert_approx_eq!(left.area().abs(), right.area().abs(), 1e-6);
    }

    #[test]
    fn test_inclusion_exclusion() {
        let a = square(0.0, 0.0, 2.0);
        let b = square(1.0, 1.0, 2.0);
        let rule = FillRule::NonZero;
        let union = boolean(&a, rule, &b, rule, BoolOp::Union);
        let inters = boolean(&a, rule, &b, rule, BoolOp::Intersection);
        assert_approx_eq!(
            union.area().abs() + inters.area().abs(),
            a.area().abs() + b.area().abs(),
            1e-9
        );
    }

    #[test]
    fn test_diff_union_relation() {
        // A u B == (A - B) u B
        let a = square(0.0, 0.0, 2.0);
        let b = square(1.0, 1.0, 2.0);
        let rule = FillRule::NonZero;
        let direct = boolean(&a, rule, &b, rule, BoolOp::Union);
        let diff = boolean(&a, rule, &b, rule, BoolOp::Difference);
        let rebuilt = boolean(&diff, rule, &b, rule, BoolOp::Union);
        assert_approx_eq!(direct.area().abs(), rebuilt.area().abs(), 1e-6);
    }

    #[test]
    fn test_symmetric_difference() {
        let a = square(0.0, 0.0, 2.0);
        let b = square(1.0, 1.0, 2.0);
        let rule = FillRule::NonZero;
        let symdiff = boolean(&a, rule, &b, rule, BoolOp::SymmetricDifference);
        assert_approx_eq!(symdiff.area(), 6.0, 1e-6);
    }

    #[test]
    fn test_fallback_forced() {
        let a = square(0.0, 0.0, 2.0);
        let b = square(1.0, 1.0, 2.0);
        let options = BoolOptions {
            fallback_only: true,
            ..Default::default()
        };
        let (union, _) = boolean_with(&a, FillRule::NonZero, &b, FillRule::NonZero, BoolOp::Union, options);
        assert_approx_eq!(union.area().abs(), 7.0, 1e-6);
    }

    #[test]
    fn test_degenerate_reported_approximate() {
        // identical operands share their whole boundary, the primary
        // algorithm refuses and the fallback resolves it
        let a = square(0.0, 0.0, 2.0);
        let (union, approximate) =
            boolean_report(&a, FillRule::NonZero, &a, FillRule::NonZero, BoolOp::Union);
        assert!(approximate);
        assert_approx_eq!(union.area().abs(), 4.0, 1e-6);
    }

    #[test]
    fn test_empty_identities() {
        let a = square(0.0, 0.0, 2.0);
        let empty = Path::empty();
        let rule = FillRule::NonZero;
        assert_approx_eq!(
            boolean(&a, rule, &empty, rule, BoolOp::Union).area().abs(),
            4.0,
            1e-6
        );
        assert!(boolean(&a, rule, &empty, rule, BoolOp::Intersection).is_empty());
        assert_approx_eq!(
            boolean(&empty, rule, &a, rule, BoolOp::Union).area().abs(),
            4.0,
            1e-6
        );
        assert!(boolean(&empty, rule, &a, rule, BoolOp::Difference).is_empty());
        assert_approx_eq!(
            boolean(&a, rule, &empty, rule, BoolOp::Difference).area().abs(),
            4.0,
            1e-6
        );
    }

    #[test]
    fn test_flatten_idempotent() {
        // self-intersecting five pointed star
        let star: Path = "M50,0 21,90 98,35 2,35 79,90z".parse().unwrap();
        let once = flatten(&star, FillRule::NonZero);
        let twice = flatten(&once, FillRule::NonZero);
        assert!(once.area().abs() > 1.0);
        assert_approx_eq!(once.area(), twice.area(), 1e-2);

        // even-odd flatten of the star drops the middle pentagon
        let even_odd = flatten(&star, FillRule::EvenOdd);
        assert!(even_odd.area().abs() < once.area().abs());
    }

    #[test]
    fn test_cut() {
        // square divided by a vertical line: both halves survive
        let a = square(0.0, 0.0, 2.0);
        let line: Path = "M1,-1 L1,3".parse().unwrap();
        let cut = boolean(&a, FillRule::NonZero, &line, FillRule::NonZero, BoolOp::Cut);
        assert_approx_eq!(cut.area().abs(), 4.0, 1e-6);
        assert_eq!(cut.subpaths().len(), 2);
    }

    #[test]
    fn test_cut_by_lines() {
        // square cut by a cross into four quadrant pieces
        let a = square(0.0, 0.0, 2.0);
        let cross: Path = "M1,-1 L1,3 M-1,1 L3,1".parse().unwrap();
        let pieces = cut_by_lines(&a, &cross);
        assert_eq!(pieces.len(), 4);
        for piece in pieces {
            assert_approx_eq!(piece.area().abs(), 1.0, 1e-6);
        }
    }

    #[test]
    fn test_slice() {
        let a = square(0.0, 0.0, 2.0);
        let line: Path = "M1,-1 L1,3".parse().unwrap();
        let sliced = slice(&a, &line);
        // the closed square becomes two open pieces, no area is removed
        assert_eq!(sliced.subpaths().len(), 2);
        for subpath in sliced.subpaths() {
            assert!(!subpath.closed());
        }
        // total geometry survives: flattening the pieces and closing them
        // again covers the whole square
        let total: Scalar = sliced.area().abs();
        assert_approx_eq!(total, 4.0, 1e-6);
    }
}
