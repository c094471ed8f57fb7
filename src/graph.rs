//! Path intersection graph, the primary boolean algorithm
//!
//! Works on curved geometry directly: operand segments are split at mutual
//! crossings, each piece is classified against the other operand by a winding
//! test at its midpoint, selected pieces are stitched back into closed
//! contours. Curves survive unchanged wherever they are not crossed.
//!
//! The algorithm is deliberately strict: open components, coincident
//! boundaries and ambiguous junctions are reported as errors instead of being
//! papered over. The boolean engine treats any error as a signal to retry
//! with the conservative polygon uncrossing backend, which always produces a
//! result.

use crate::{Curve, FillRule, Path, Point, Scalar, Segment, SubPath};
use std::{collections::HashMap, fmt};

/// Boolean operations supported by the intersection graph.
///
/// Symmetric difference and cut are composed out of these by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GraphOp {
    Union,
    Intersection,
    /// `A` minus `B`
    Difference,
}

/// Degeneracies the intersection graph refuses to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GraphError {
    /// operand contains an open component, containment is undefined
    OpenComponent,
    /// an operand is self-overlapping, its pieces do not separate inside
    /// from outside
    UnresolvedOperand,
    /// piece midpoint rests on the other operand's boundary, the operands
    /// share boundary geometry and winding tests are unreliable
    BoundaryOverlap,
    /// more than one continuation at a junction vertex
    AmbiguousJunction,
    /// a selected boundary chain does not close up
    UnclosedContour,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::OpenComponent => write!(f, "operand contains an open component"),
            GraphError::UnresolvedOperand => write!(f, "operand is not flatten-resolved"),
            GraphError::BoundaryOverlap => write!(f, "operands share boundary geometry"),
            GraphError::AmbiguousJunction => write!(f, "ambiguous junction in boundary graph"),
            GraphError::UnclosedContour => write!(f, "boundary contour does not close"),
        }
    }
}

impl std::error::Error for GraphError {}

/// Piece of an operand boundary between two crossings
struct Piece {
    segment: Segment,
    /// false for pieces of `B`
    of_a: bool,
}

/// Perform a boolean operation on two flatten-resolved operands.
///
/// Both operands must consist of closed, non-self-intersecting components
/// (the engine's flatten pre-pass guarantees this).
pub(crate) fn boolean(
    a: &Path,
    b: &Path,
    op: GraphOp,
    tolerance: Scalar,
) -> Result<Path, GraphError> {
    let segments_a = closed_segments(a)?;
    let segments_b = closed_segments(b)?;

    // find crossings between the operands
    let mut splits_a: Vec<Vec<Scalar>> = vec![Vec::new(); segments_a.len()];
    let mut splits_b: Vec<Vec<Scalar>> = vec![Vec::new(); segments_b.len()];
    for (index_a, seg_a) in segments_a.iter().enumerate() {
        for (index_b, seg_b) in segments_b.iter().enumerate() {
            for (t0, t1) in seg_a.intersect_params(*seg_b, tolerance) {
                splits_a[index_a].push(t0);
                splits_b[index_b].push(t1);
            }
        }
    }

    // split operands at the crossings and classify every piece against the
    // other operand
    let mut pieces = Vec::new();
    for (operand, segments, splits) in [
        (true, &segments_a, splits_a),
        (false, &segments_b, splits_b),
    ] {
        for (segment, params) in segments.iter().zip(splits) {
            for piece in split_segment(*segment, params, tolerance) {
                pieces.push(Piece {
                    segment: piece,
                    of_a: operand,
                });
            }
        }
    }

    // winding queries near the boundary need flattening well below the
    // tolerance, the default flatness is too coarse here
    let flatness = 0.25 * tolerance;
    let mut selected: Vec<Segment> = Vec::new();
    for piece in pieces {
        let mid = piece.segment.at(0.5);
        let dir = match piece.segment.deriv().at(0.5).normalize() {
            Some(dir) => dir,
            // cusp at the midpoint, fall back to the chord direction
            None => match (piece.segment.end() - piece.segment.start()).normalize() {
                Some(dir) => dir,
                None => continue,
            },
        };
        // normal() points right of the direction
        let left = -tolerance * dir.normal();

        // a piece of a flatten-resolved operand separates its own inside
        // from its own outside, verify and canonicalize interior-left
        let own = if piece.of_a { a } else { b };
        let filled_left = own.winding_with_flatness(mid + left, flatness) != 0;
        let filled_right = own.winding_with_flatness(mid - left, flatness) != 0;
        if filled_left == filled_right {
            return Err(GraphError::UnresolvedOperand);
        }
        let canonical = if filled_left {
            piece.segment
        } else {
            piece.segment.reverse()
        };

        // winding is unreliable on top of the other boundary
        let other = if piece.of_a { b } else { a };
        if other
            .dist_with_flatness(mid, flatness)
            .is_some_and(|dist| dist < 0.5 * tolerance)
        {
            return Err(GraphError::BoundaryOverlap);
        }
        let inside = FillRule::NonZero.is_filled(other.winding_with_flatness(mid, flatness));
        let selection = match (op, piece.of_a) {
            (GraphOp::Union, _) if !inside => Some(canonical),
            (GraphOp::Intersection, _) if inside => Some(canonical),
            (GraphOp::Difference, true) if !inside => Some(canonical),
            // subtracted boundary pieces turn into hole boundaries
            (GraphOp::Difference, false) if inside => Some(canonical.reverse()),
            _ => None,
        };
        selected.extend(selection);
    }

    stitch(selected, tolerance)
}

/// Collect segments of a path, requiring every component to be closed
fn closed_segments(path: &Path) -> Result<Vec<Segment>, GraphError> {
    let mut segments = Vec::new();
    for subpath in path.subpaths() {
        if !subpath.closed() && !subpath.end().is_close_to(subpath.start()) {
            return Err(GraphError::OpenComponent);
        }
        segments.extend(subpath.segments().iter().copied());
        // materialize the implicit closing line
        if !subpath.end().is_close_to(subpath.start()) {
            segments.push(crate::Line::new(subpath.end(), subpath.start()).into());
        }
    }
    Ok(segments)
}

/// Split a segment at the provided parameters, dropping collapsed pieces
fn split_segment(segment: Segment, mut params: Vec<Scalar>, tolerance: Scalar) -> Vec<Segment> {
    if params.is_empty() {
        return vec![segment];
    }
    let chord = segment.start().dist(segment.end()).max(tolerance);
    params.sort_by(Scalar::total_cmp);
    let mut bounds = vec![0.0];
    for param in params {
        let last = *bounds.last().expect("bounds is never empty");
        // merge crossing parameters that would produce sub-tolerance pieces
        if (param - last) * chord > 0.25 * tolerance {
            bounds.push(param);
        }
    }
    let last = *bounds.last().expect("bounds is never empty");
    if (1.0 - last) * chord > 0.25 * tolerance {
        bounds.push(1.0);
    } else {
        *bounds.last_mut().expect("bounds is never empty") = 1.0;
    }
    bounds
        .windows(2)
        .map(|pair| segment.cut(pair[0], pair[1]))
        .collect()
}

/// Stitch selected pieces into closed subpaths by matching endpoints
///
/// Crossing points found on the two operands independently can disagree by up
/// to the tolerance, so matching scans the neighbouring grid cells and
/// filters by actual distance.
fn stitch(pieces: Vec<Segment>, tolerance: Scalar) -> Result<Path, GraphError> {
    let cell = 2.0 * tolerance;
    let quantize = move |point: Point| -> (i64, i64) {
        (
            (point.x() / cell).round() as i64,
            (point.y() / cell).round() as i64,
        )
    };

    let mut outgoing: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (index, piece) in pieces.iter().enumerate() {
        outgoing
            .entry(quantize(piece.start()))
            .or_default()
            .push(index);
    }

    let mut used = vec![false; pieces.len()];
    let mut subpaths = Vec::new();
    for start in 0..pieces.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let origin = pieces[start].start();
        let mut segments = vec![pieces[start]];
        loop {
            let tail = segments.last().expect("contour is never empty").end();
            if segments.len() > 1 && tail.dist(origin) < 2.0 * tolerance {
                break;
            }
            let (kx, ky) = quantize(tail);
            let mut candidates: Vec<usize> = Vec::new();
            for dx in -1..=1 {
                for dy in -1..=1 {
                    for &index in outgoing.get(&(kx + dx, ky + dy)).into_iter().flatten() {
                        if !used[index] && pieces[index].start().dist(tail) < 2.0 * tolerance {
                            candidates.push(index);
                        }
                    }
                }
            }
            match candidates.as_slice() {
                [] => return Err(GraphError::UnclosedContour),
                [index] => {
                    used[*index] = true;
                    segments.push(pieces[*index]);
                }
                _ => return Err(GraphError::AmbiguousJunction),
            }
        }
        subpaths.extend(SubPath::new(segments, true));
    }
    Ok(Path::new(subpaths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    const TOLERANCE: Scalar = 1e-3;

    fn square(x: Scalar, y: Scalar, size: Scalar) -> Path {
        let mut builder = Path::builder();
        builder.move_to((x, y)).rect((size, size));
        builder.build()
    }

    #[test]
    fn test_square_ops() {
        let a = square(0.0, 0.0, 2.0);
        let b = square(1.0, 1.0, 2.0);

        let union = boolean(&a, &b, GraphOp::Union, TOLERANCE).unwrap();
        assert_eq!(union.subpaths().len(), 1);
        assert_approx_eq!(union.area().abs(), 7.0, 1e-6);

        let inters = boolean(&a, &b, GraphOp::Intersection, TOLERANCE).unwrap();
        assert_eq!(inters.subpaths().len(), 1);
        assert_approx_eq!(inters.area().abs(), 1.0, 1e-6);
        let bbox = inters.bbox(crate::Transform::identity()).unwrap();
        assert_approx_eq!(bbox.x(), 1.0, 1e-6);
        assert_approx_eq!(bbox.y(), 1.0, 1e-6);
        assert_approx_eq!(bbox.width(), 1.0, 1e-6);
        assert_approx_eq!(bbox.height(), 1.0, 1e-6);

        let diff = boolean(&a, &b, GraphOp::Difference, TOLERANCE).unwrap();
        assert_approx_eq!(diff.area(), 3.0, 1e-6);
    }

    #[test]
    fn test_disjoint_and_nested() {
        let a = square(0.0, 0.0, 4.0);
        let b = square(10.0, 10.0, 1.0);
        // disjoint operands have no crossings, pieces pass through whole
        let union = boolean(&a, &b, GraphOp::Union, TOLERANCE).unwrap();
        assert_eq!(union.subpaths().len(), 2);
        assert_approx_eq!(union.area().abs(), 17.0, 1e-6);

        // nested operand punches a hole
        let inner = square(1.0, 1.0, 2.0);
        let diff = boolean(&a, &inner, GraphOp::Difference, TOLERANCE).unwrap();
        assert_eq!(diff.subpaths().len(), 2);
        assert_approx_eq!(diff.area(), 12.0, 1e-6);
        let inters = boolean(&a, &inner, GraphOp::Intersection, TOLERANCE).unwrap();
        assert_approx_eq!(inters.area().abs(), 4.0, 1e-6);
    }

    #[test]
    fn test_curves_preserved() {
        // two overlapping circles, the union must keep cubic segments
        let a = Path::builder().move_to((0.0, 0.0)).circle(1.5).build();
        let b = Path::builder().move_to((2.0, 0.0)).circle(1.5).build();
        let union = boolean(&a, &b, GraphOp::Union, TOLERANCE).unwrap();
        assert!(
            union
                .subpaths()
                .iter()
                .flat_map(|subpath| subpath.segments())
                .any(|segment| segment.to_cubic().is_some())
        );
        // area of a union of two circles: 2 * pi * r^2 - lens overlap
        let area = union.area().abs();
        assert!(area > 2.0 * crate::PI * 1.5 * 1.5 - area_of_lens() - 0.1);
        assert!(area < 2.0 * crate::PI * 1.5 * 1.5 - area_of_lens() + 0.1);
    }

    // lens area of two r=1.5 circles with centers 2 apart
    fn area_of_lens() -> Scalar {
        let r: Scalar = 1.5;
        let d: Scalar = 2.0;
        let half = d / 2.0;
        2.0 * (r * r * (half / r).acos() - half * (r * r - half * half).sqrt())
    }

    #[test]
    fn test_boundary_overlap_rejected() {
        // identical squares share their entire boundary
        let a = square(0.0, 0.0, 2.0);
        let b = square(0.0, 0.0, 2.0);
        assert!(matches!(
            boolean(&a, &b, GraphOp::Union, TOLERANCE),
            Err(GraphError::BoundaryOverlap) | Err(GraphError::AmbiguousJunction)
        ));
    }

    #[test]
    fn test_open_component_rejected() {
        let a = square(0.0, 0.0, 2.0);
        let open: Path = "M0,0 L5,5".parse().unwrap();
        assert!(matches!(
            boolean(&a, &open, GraphOp::Union, TOLERANCE),
            Err(GraphError::OpenComponent)
        ));
    }
}
