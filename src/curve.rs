//! All the things you need to handle bezier curves
//!
//! Only lines, quadratic and cubic bezier segments are supported. Boolean
//! operations additionally require curve-curve intersection with parameter
//! back-references, which is implemented with bounding box subdivision.

use crate::{
    ArrayIter, BBox, EPSILON, Point, Scalar, Transform, clamp, cubic_solve, quadratic_solve,
};
use std::fmt;

pub type CurveRoots = ArrayIter<[Option<Scalar>; 3]>;
pub type CurveExtremities = ArrayIter<[Option<Scalar>; 6]>;

/// Set of operations common to all bezier curves.
pub trait Curve: Sized + Into<Segment> {
    /// Convert curve to an iterator over line segments with desired flatness
    fn flatten(&self, tr: Transform, flatness: Scalar) -> CurveFlattenIter {
        CurveFlattenIter::new(self.transform(tr), flatness)
    }

    /// Correspond to maximum deviation of the curve from the straight line
    /// `f = max |curve(t) - line(curve_start, curve_end)(t)|`. This function
    /// actually returns `16.0 * f^2` to avoid unneeded division and square root.
    fn flatness(&self) -> Scalar;

    /// Apply affine transformation to the curve
    fn transform(&self, tr: Transform) -> Self;

    /// Point at which curve starts
    fn start(&self) -> Point;

    /// Point at which curve ends
    fn end(&self) -> Point;

    /// Evaluate curve at parameter value `t` in (0.0..=1.0)
    fn at(&self, t: Scalar) -> Point;

    /// Optimized version of `Curve::split_at(0.5)`
    fn split(&self) -> (Self, Self) {
        self.split_at(0.5)
    }

    /// Split the curve at parameter value `t`
    fn split_at(&self, t: Scalar) -> (Self, Self);

    /// Create subcurve starting at parameter value `a` and ending at value `b`
    ///
    /// Parameters must be ordered `a <= b`.
    fn cut(&self, a: Scalar, b: Scalar) -> Self {
        let (_, tail) = self.split_at(a);
        let rest = 1.0 - a;
        let t = if rest.abs() < EPSILON {
            0.0
        } else {
            (b - a) / rest
        };
        let (head, _) = tail.split_at(t);
        head
    }

    /// Extend provided `init` bounding box with the bounding box of the curve
    fn bbox(&self, init: Option<BBox>) -> BBox;

    /// Derivative with respect to t, `deriv(t) = [curve'(t)_x, curve'(t)_y]`
    fn deriv(&self) -> Segment;

    /// Identical curve but directed from end to start, instead of start to end.
    fn reverse(&self) -> Self;

    /// Find roots of the equation `curve(t)_y = 0`. Values of the parameter at which curve
    /// crosses y axis.
    fn roots(&self) -> CurveRoots;

    /// Find all extremities of the curve `curve'(t)_x = 0 || curve'(t)_y = 0`
    fn extremities(&self) -> CurveExtremities;
}

pub struct CurveFlattenIter {
    flatness: Scalar,
    stack: Vec<Segment>,
}

impl CurveFlattenIter {
    pub fn new(segment: impl Into<Segment>, flatness: Scalar) -> Self {
        Self {
            flatness: 16.0 * flatness * flatness,
            stack: vec![segment.into()],
        }
    }
}

impl Iterator for CurveFlattenIter {
    type Item = Line;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.stack.pop() {
                None => {
                    return None;
                }
                Some(segment) => {
                    if segment.flatness() < self.flatness {
                        return Some(Line([segment.start(), segment.end()]));
                    }
                    let (s0, s1) = segment.split();
                    self.stack.push(s1);
                    self.stack.push(s0);
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Line
// -----------------------------------------------------------------------------

/// Line segment curve
#[derive(Clone, Copy, PartialEq)]
pub struct Line(pub [Point; 2]);

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Line([p0, p1]) = self;
        write!(f, "Line {:?} {:?}", p0, p1)
    }
}

impl Line {
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>) -> Self {
        Self([p0.into(), p1.into()])
    }

    /// Length of the line
    pub fn length(&self) -> Scalar {
        let Self([p0, p1]) = self;
        p0.dist(*p1)
    }

    /// Start and end points of the line
    pub fn points(&self) -> [Point; 2] {
        self.0
    }

    /// Find intersection of two lines
    ///
    /// Returns pair of `t` parameters for this line and the other line.
    /// Found by solving `self.at(t0) == other.at(t1)`. Actual intersection of
    /// line segments can be found by making sure that `0.0 <= t0 <= 1.0 && 0.0 <= t1 <= 1.0`
    pub fn intersect(&self, other: Line) -> Option<(Scalar, Scalar)> {
        let Line([Point([x1, y1]), Point([x2, y2])]) = *self;
        let Line([Point([x3, y3]), Point([x4, y4])]) = other;
        let det = (x4 - x3) * (y1 - y2) - (x1 - x2) * (y4 - y3);
        if det.abs() < EPSILON {
            return None;
        }
        let t0 = ((y3 - y4) * (x1 - x3) + (x4 - x3) * (y1 - y3)) / det;
        let t1 = ((y1 - y2) * (x1 - x3) + (x2 - x1) * (y1 - y3)) / det;
        Some((t0, t1))
    }

    /// Find intersection point between two line segments
    pub fn intersect_point(&self, other: Line) -> Option<Point> {
        let (t0, t1) = self.intersect(other)?;
        if (0.0..=1.0).contains(&t0) && (0.0..=1.0).contains(&t1) {
            Some(self.at(t0))
        } else {
            None
        }
    }

    /// Distance from the point to the closest position on the line segment
    pub fn dist_to_point(&self, point: Point) -> Scalar {
        let Self([p0, p1]) = *self;
        let dir = p1 - p0;
        let len2 = dir.dot(dir);
        if len2 < EPSILON {
            return point.dist(p0);
        }
        let t = clamp((point - p0).dot(dir) / len2, 0.0, 1.0);
        point.dist(p0 + t * dir)
    }

    /// Direction vector associated with the line segment
    pub fn direction(&self) -> Point {
        self.end() - self.start()
    }
}

impl Curve for Line {
    fn flatness(&self) -> Scalar {
        0.0
    }

    fn transform(&self, tr: Transform) -> Self {
        let Line([p0, p1]) = self;
        Self([tr.apply(*p0), tr.apply(*p1)])
    }

    fn start(&self) -> Point {
        self.0[0]
    }

    fn end(&self) -> Point {
        self.0[1]
    }

    fn at(&self, t: Scalar) -> Point {
        let Self([p0, p1]) = self;
        (1.0 - t) * p0 + t * p1
    }

    fn deriv(&self) -> Segment {
        let deriv = self.end() - self.start();
        Line::new(deriv, deriv).into()
    }

    fn split_at(&self, t: Scalar) -> (Self, Self) {
        let Self([p0, p1]) = self;
        let mid = self.at(t);
        (Self([*p0, mid]), Self([mid, *p1]))
    }

    fn cut(&self, a: Scalar, b: Scalar) -> Self {
        Self([self.at(a), self.at(b)])
    }

    fn bbox(&self, init: Option<BBox>) -> BBox {
        let Self([p0, p1]) = *self;
        BBox::new(p0, p1).union_opt(init)
    }

    fn reverse(&self) -> Self {
        let Self([p0, p1]) = *self;
        Self([p1, p0])
    }

    fn roots(&self) -> CurveRoots {
        let mut result = CurveRoots::new();
        let Self([Point([_, y0]), Point([_, y1])]) = self;
        if (y0 - y1).abs() > EPSILON {
            let t = y0 / (y0 - y1);
            if (0.0..=1.0).contains(&t) {
                result.push(t);
            }
        }
        result
    }

    fn extremities(&self) -> CurveExtremities {
        CurveExtremities::new()
    }
}

// -----------------------------------------------------------------------------
// Quadratic bezier curve
// -----------------------------------------------------------------------------

/// Quadratic bezier curve
///
/// Polynomial form:
/// `(1 - t) ^ 2 * p0 + 2 * (1 - t) * t * p1 + t ^ 2 * p2`
#[derive(Clone, Copy, PartialEq)]
pub struct Quad(pub [Point; 3]);

impl fmt::Debug for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Quad([p0, p1, p2]) = self;
        write!(f, "Quad {:?} {:?} {:?}", p0, p1, p2)
    }
}

impl Quad {
    pub fn new(p0: impl Into<Point>, p1: impl Into<Point>, p2: impl Into<Point>) -> Self {
        Self([p0.into(), p1.into(), p2.into()])
    }

    pub fn points(&self) -> [Point; 3] {
        self.0
    }

    /// Find smooth point used by SVG parser
    pub fn smooth(&self) -> Point {
        let Quad([_p0, p1, p2]) = self;
        2.0 * p2 - *p1
    }
}

impl Curve for Quad {
    /// Flatness criteria for the quadratic curve
    ///
    /// Line can be represented as a bezier2 curve with `p1 = (p0 + p2) / 2.0`,
    /// grouping polynomial coefficients of the difference gives
    /// `f^2 = 1/16 |2 * p1 - p0 - p2|^2`
    fn flatness(&self) -> Scalar {
        let Self([p0, p1, p2]) = *self;
        let Point([x, y]) = 2.0 * p1 - p0 - p2;
        x * x + y * y
    }

    fn transform(&self, tr: Transform) -> Self {
        let Quad([p0, p1, p2]) = self;
        Self([tr.apply(*p0), tr.apply(*p1), tr.apply(*p2)])
    }

    fn start(&self) -> Point {
        self.0[0]
    }

    fn end(&self) -> Point {
        self.0[2]
    }

    fn at(&self, t: Scalar) -> Point {
        let Self([p0, p1, p2]) = self;
        let (t1, t_1) = (t, 1.0 - t);
        let (t2, t_2) = (t1 * t1, t_1 * t_1);
        t_2 * p0 + 2.0 * t1 * t_1 * p1 + t2 * p2
    }

    fn deriv(&self) -> Segment {
        let Self([p0, p1, p2]) = *self;
        Line::new(2.0 * (p1 - p0), 2.0 * (p2 - p1)).into()
    }

    /// Optimized version of `split_at(0.5)`
    fn split(&self) -> (Self, Self) {
        let Self([p0, p1, p2]) = *self;
        let mid = 0.25 * (p0 + 2.0 * p1 + p2);
        (
            Self([p0, 0.5 * (p0 + p1), mid]),
            Self([mid, 0.5 * (p1 + p2), p2]),
        )
    }

    fn split_at(&self, t: Scalar) -> (Self, Self) {
        // https://pomax.github.io/bezierinfo/#matrixsplit
        let Self([p0, p1, p2]) = *self;
        let (t1, t_1) = (t, 1.0 - t);
        let (t2, t_2) = (t1 * t1, t_1 * t_1);
        let mid = t_2 * p0 + 2.0 * t1 * t_1 * p1 + t2 * p2;
        (
            Self([p0, t_1 * p0 + t * p1, mid]),
            Self([mid, t_1 * p1 + t * p2, p2]),
        )
    }

    fn bbox(&self, init: Option<BBox>) -> BBox {
        let Self([p0, p1, p2]) = self;
        let bbox = BBox::new(*p0, *p2).union_opt(init);
        if bbox.contains(*p1) {
            return bbox;
        }
        self.extremities()
            .fold(bbox, |bbox, t| bbox.extend(self.at(t)))
    }

    fn reverse(&self) -> Self {
        let Self([p0, p1, p2]) = *self;
        Self([p2, p1, p0])
    }

    fn roots(&self) -> CurveRoots {
        let mut result = CurveRoots::new();
        // curve(t)_y = 0
        let Self([Point([_, y0]), Point([_, y1]), Point([_, y2])]) = *self;
        let a = y0 - 2.0 * y1 + y2;
        let b = -2.0 * y0 + 2.0 * y1;
        let c = y0;
        result.extend(quadratic_solve(a, b, c).filter(|t| (0.0..=1.0).contains(t)));
        result
    }

    fn extremities(&self) -> CurveExtremities {
        let mut result = CurveExtremities::new();
        let Self([p0, p1, p2]) = self;
        let Point([a0, a1]) = *p2 - 2.0 * p1 + *p0;
        let Point([b0, b1]) = *p1 - *p0;
        // curve'(t)_x = 0
        if a0.abs() > EPSILON {
            let t0 = -b0 / a0;
            if (0.0..=1.0).contains(&t0) {
                result.push(t0)
            }
        }
        // curve'(t)_y = 0
        if a1.abs() > EPSILON {
            let t1 = -b1 / a1;
            if (0.0..=1.0).contains(&t1) {
                result.push(t1)
            }
        }
        result
    }
}

// -----------------------------------------------------------------------------
// Cubic bezier curve
// -----------------------------------------------------------------------------

/// Cubic bezier curve
///
/// Polynomial form:
/// `(1 - t) ^ 3 * p0 + 3 * (1 - t) ^ 2 * t * p1 + 3 * (1 - t) * t ^ 2 * p2 + t ^ 3 * p3`
#[derive(Clone, Copy, PartialEq)]
pub struct Cubic(pub [Point; 4]);

impl fmt::Debug for Cubic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Cubic([p0, p1, p2, p3]) = self;
        write!(f, "Cubic {:?} {:?} {:?} {:?}", p0, p1, p2, p3)
    }
}

impl Cubic {
    pub fn new(
        p0: impl Into<Point>,
        p1: impl Into<Point>,
        p2: impl Into<Point>,
        p3: impl Into<Point>,
    ) -> Self {
        Self([p0.into(), p1.into(), p2.into(), p3.into()])
    }

    pub fn points(&self) -> [Point; 4] {
        self.0
    }

    /// Find smooth point used by SVG parser
    pub fn smooth(&self) -> Point {
        let Cubic([_p0, _p1, p2, p3]) = self;
        2.0 * p3 - *p2
    }
}

impl Curve for Cubic {
    /// Flatness criteria for the cubic curve
    ///
    /// Bounds the maximum distance between the curve and the chord with
    /// `f^2 <= 1/16 max(|3 p1 - 2 p0 - p3|^2, |3 p2 - p0 - 2 p3|^2)`
    fn flatness(&self) -> Scalar {
        let Self([p0, p1, p2, p3]) = *self;
        let Point([x0, y0]) = 3.0 * p1 - 2.0 * p0 - p3;
        let Point([x1, y1]) = 3.0 * p2 - p0 - 2.0 * p3;
        (x0 * x0).max(x1 * x1) + (y0 * y0).max(y1 * y1)
    }

    fn transform(&self, tr: Transform) -> Self {
        let Cubic([p0, p1, p2, p3]) = self;
        Self([tr.apply(*p0), tr.apply(*p1), tr.apply(*p2), tr.apply(*p3)])
    }

    fn start(&self) -> Point {
        self.0[0]
    }

    fn end(&self) -> Point {
        self.0[3]
    }

    fn at(&self, t: Scalar) -> Point {
        let Self([p0, p1, p2, p3]) = self;
        let (t1, t_1) = (t, 1.0 - t);
        let (t2, t_2) = (t1 * t1, t_1 * t_1);
        let (t3, t_3) = (t2 * t1, t_2 * t_1);
        t_3 * p0 + 3.0 * t1 * t_2 * p1 + 3.0 * t2 * t_1 * p2 + t3 * p3
    }

    fn deriv(&self) -> Segment {
        let Self([p0, p1, p2, p3]) = *self;
        Quad::new(3.0 * (p1 - p0), 3.0 * (p2 - p1), 3.0 * (p3 - p2)).into()
    }

    /// Optimized version of `split_at(0.5)`
    fn split(&self) -> (Self, Self) {
        let Self([p0, p1, p2, p3]) = *self;
        let mid = 0.125 * (p0 + 3.0 * p1 + 3.0 * p2 + p3);
        let left = Self([
            p0,
            0.5 * (p0 + p1),
            0.25 * (p0 + 2.0 * p1 + p2),
            mid,
        ]);
        let right = Self([
            mid,
            0.25 * (p1 + 2.0 * p2 + p3),
            0.5 * (p2 + p3),
            p3,
        ]);
        (left, right)
    }

    fn split_at(&self, t: Scalar) -> (Self, Self) {
        // de Casteljau construction
        let Self([p0, p1, p2, p3]) = *self;
        let q0 = (1.0 - t) * p0 + t * p1;
        let q1 = (1.0 - t) * p1 + t * p2;
        let q2 = (1.0 - t) * p2 + t * p3;
        let r0 = (1.0 - t) * q0 + t * q1;
        let r1 = (1.0 - t) * q1 + t * q2;
        let mid = (1.0 - t) * r0 + t * r1;
        (Self([p0, q0, r0, mid]), Self([mid, r1, q2, p3]))
    }

    fn bbox(&self, init: Option<BBox>) -> BBox {
        let Self([p0, p1, p2, p3]) = self;
        let bbox = BBox::new(*p0, *p3).union_opt(init);
        if bbox.contains(*p1) && bbox.contains(*p2) {
            return bbox;
        }
        self.extremities()
            .fold(bbox, |bbox, t| bbox.extend(self.at(t)))
    }

    fn reverse(&self) -> Self {
        let Self([p0, p1, p2, p3]) = *self;
        Self([p3, p2, p1, p0])
    }

    fn roots(&self) -> CurveRoots {
        let mut result = CurveRoots::new();
        // curve(t)_y = 0
        let Self([Point([_, y0]), Point([_, y1]), Point([_, y2]), Point([_, y3])]) = *self;
        let a = -y0 + 3.0 * y1 - 3.0 * y2 + y3;
        let b = 3.0 * y0 - 6.0 * y1 + 3.0 * y2;
        let c = -3.0 * y0 + 3.0 * y1;
        let d = y0;
        result.extend(cubic_solve(a, b, c, d).filter(|t| (0.0..=1.0).contains(t)));
        result
    }

    fn extremities(&self) -> CurveExtremities {
        let mut result = CurveExtremities::new();
        let Self([p0, p1, p2, p3]) = *self;
        // curve'(t) = 3 * a * t^2 + 2 * b * t + c
        let Point([ax, ay]) = -1.0 * p0 + 3.0 * p1 - 3.0 * p2 + p3;
        let Point([bx, by]) = p0 - 2.0 * p1 + p2;
        let Point([cx, cy]) = p1 - p0;
        result.extend(
            quadratic_solve(3.0 * ax, 6.0 * bx, 3.0 * cx)
                .chain(quadratic_solve(3.0 * ay, 6.0 * by, 3.0 * cy))
                .filter(|t| (0.0..=1.0).contains(t)),
        );
        result
    }
}

impl From<Quad> for Cubic {
    fn from(quad: Quad) -> Self {
        // degree elevation
        let Quad([p0, p1, p2]) = quad;
        Self([
            p0,
            (1.0 / 3.0) * (p0 + 2.0 * p1),
            (1.0 / 3.0) * (2.0 * p1 + p2),
            p2,
        ])
    }
}

// -----------------------------------------------------------------------------
// Segment
// -----------------------------------------------------------------------------

/// `Segment` is an enum of either `Line`, `Quad` or `Cubic`
#[derive(Clone, Copy, PartialEq)]
pub enum Segment {
    Line(Line),
    Quad(Quad),
    Cubic(Cubic),
}

impl Segment {
    /// Find intersection between two segments
    ///
    /// This might not be the fastest method possible but works for any two curves.
    /// Divide curves as long as there is intersection between bounding boxes, if
    /// the intersection is smaller then tolerance we can treat it as an intersection point.
    pub fn intersect(self, other: impl Into<Segment>, tolerance: Scalar) -> Vec<Point> {
        self.intersect_params(other, tolerance)
            .into_iter()
            .map(|(t0, _)| self.at(t0))
            .collect()
    }

    /// Find intersections between two segments as parameter pairs
    ///
    /// Same subdivision approach as `intersect` but parameter ranges are carried
    /// along, so each intersection is reported as `(t_self, t_other)`. Clusters of
    /// adjacent subdivision cells around a single crossing are merged.
    pub fn intersect_params(
        self,
        other: impl Into<Segment>,
        tolerance: Scalar,
    ) -> Vec<(Scalar, Scalar)> {
        let other: Segment = other.into();
        // line-line crossings are solved exactly
        if let (Segment::Line(l0), Segment::Line(l1)) = (self, other) {
            return match l0.intersect(l1) {
                Some((t0, t1))
                    if (0.0..=1.0).contains(&t0) && (0.0..=1.0).contains(&t1) =>
                {
                    vec![(t0, t1)]
                }
                _ => Vec::new(),
            };
        }
        let mut queue = vec![((self, 0.0, 1.0), (other, 0.0, 1.0))];
        // (t0, t1, parameter resolution at which subdivision stopped)
        let mut hits: Vec<(Scalar, Scalar, Scalar)> = Vec::new();
        while let Some(((s0, a0, b0), (s1, a1, b1))) = queue.pop() {
            let bbox0 = s0.bbox(None);
            let bbox1 = s1.bbox(None);
            if bbox0.intersect(bbox1).is_none() {
                continue;
            }
            let s0_is_small = bbox0.width() < tolerance && bbox0.height() < tolerance;
            let s1_is_small = bbox1.width() < tolerance && bbox1.height() < tolerance;
            if s0_is_small && s1_is_small {
                let t0 = (a0 + b0) / 2.0;
                let t1 = (a1 + b1) / 2.0;
                hits.push((t0, t1, (b0 - a0).max(b1 - a1)));
            } else {
                let m0 = (a0 + b0) / 2.0;
                let m1 = (a1 + b1) / 2.0;
                let (s00, s01) = s0.split();
                let (s10, s11) = s1.split();
                queue.push(((s00, a0, m0), (s10, a1, m1)));
                queue.push(((s00, a0, m0), (s11, m1, b1)));
                queue.push(((s01, m0, b0), (s10, a1, m1)));
                queue.push(((s01, m0, b0), (s11, m1, b1)));
            }
        }
        // merge cells that surround the same crossing
        hits.sort_by(|h0, h1| h0.0.total_cmp(&h1.0));
        let mut result: Vec<(Scalar, Scalar)> = Vec::new();
        for (t0, t1, res) in hits {
            let merged = result.last().map_or(false, |(u0, u1)| {
                (t0 - u0).abs() < 4.0 * res && (t1 - u1).abs() < 4.0 * res
            });
            if !merged {
                result.push((t0, t1));
            }
        }
        result
    }

    /// Convert to line if it is a line variant of the segment
    pub fn to_line(&self) -> Option<Line> {
        match self {
            Segment::Line(line) => Some(*line),
            _ => None,
        }
    }

    /// Convert to quad if it is a quad variant of the segment
    pub fn to_quad(&self) -> Option<Quad> {
        match self {
            Segment::Quad(quad) => Some(*quad),
            _ => None,
        }
    }

    /// Convert to cubic if it is a cubic variant of the segment
    pub fn to_cubic(&self) -> Option<Cubic> {
        match self {
            Segment::Cubic(cubic) => Some(*cubic),
            _ => None,
        }
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Line(line) => line.fmt(f),
            Segment::Quad(quad) => quad.fmt(f),
            Segment::Cubic(cubic) => cubic.fmt(f),
        }
    }
}

impl Curve for Segment {
    fn flatness(&self) -> Scalar {
        match self {
            Segment::Line(line) => line.flatness(),
            Segment::Quad(quad) => quad.flatness(),
            Segment::Cubic(cubic) => cubic.flatness(),
        }
    }

    fn transform(&self, tr: Transform) -> Self {
        match self {
            Segment::Line(line) => line.transform(tr).into(),
            Segment::Quad(quad) => quad.transform(tr).into(),
            Segment::Cubic(cubic) => cubic.transform(tr).into(),
        }
    }

    fn start(&self) -> Point {
        match self {
            Segment::Line(line) => line.start(),
            Segment::Quad(quad) => quad.start(),
            Segment::Cubic(cubic) => cubic.start(),
        }
    }

    fn end(&self) -> Point {
        match self {
            Segment::Line(line) => line.end(),
            Segment::Quad(quad) => quad.end(),
            Segment::Cubic(cubic) => cubic.end(),
        }
    }

    fn at(&self, t: Scalar) -> Point {
        match self {
            Segment::Line(line) => line.at(t),
            Segment::Quad(quad) => quad.at(t),
            Segment::Cubic(cubic) => cubic.at(t),
        }
    }

    fn split_at(&self, t: Scalar) -> (Self, Self) {
        match self {
            Segment::Line(line) => {
                let (l0, l1) = line.split_at(t);
                (l0.into(), l1.into())
            }
            Segment::Quad(quad) => {
                let (q0, q1) = quad.split_at(t);
                (q0.into(), q1.into())
            }
            Segment::Cubic(cubic) => {
                let (c0, c1) = cubic.split_at(t);
                (c0.into(), c1.into())
            }
        }
    }

    fn cut(&self, a: Scalar, b: Scalar) -> Self {
        match self {
            Segment::Line(line) => line.cut(a, b).into(),
            Segment::Quad(quad) => quad.cut(a, b).into(),
            Segment::Cubic(cubic) => cubic.cut(a, b).into(),
        }
    }

    fn bbox(&self, init: Option<BBox>) -> BBox {
        match self {
            Segment::Line(line) => line.bbox(init),
            Segment::Quad(quad) => quad.bbox(init),
            Segment::Cubic(cubic) => cubic.bbox(init),
        }
    }

    fn deriv(&self) -> Segment {
        match self {
            Segment::Line(line) => line.deriv(),
            Segment::Quad(quad) => quad.deriv(),
            Segment::Cubic(cubic) => cubic.deriv(),
        }
    }

    fn reverse(&self) -> Self {
        match self {
            Segment::Line(line) => line.reverse().into(),
            Segment::Quad(quad) => quad.reverse().into(),
            Segment::Cubic(cubic) => cubic.reverse().into(),
        }
    }

    fn roots(&self) -> CurveRoots {
        match self {
            Segment::Line(line) => line.roots(),
            Segment::Quad(quad) => quad.roots(),
            Segment::Cubic(cubic) => cubic.roots(),
        }
    }

    fn extremities(&self) -> CurveExtremities {
        match self {
            Segment::Line(line) => line.extremities(),
            Segment::Quad(quad) => quad.extremities(),
            Segment::Cubic(cubic) => cubic.extremities(),
        }
    }
}

impl From<Line> for Segment {
    fn from(line: Line) -> Self {
        Self::Line(line)
    }
}

impl From<Quad> for Segment {
    fn from(quad: Quad) -> Self {
        Self::Quad(quad)
    }
}

impl From<Cubic> for Segment {
    fn from(cubic: Cubic) -> Self {
        Self::Cubic(cubic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn test_split_cut() {
        let cubic = Cubic::new((0.0, 0.0), (1.0, 2.0), (3.0, 2.0), (4.0, 0.0));
        let (c0, c1) = cubic.split_at(0.25);
        assert!(c0.end().is_close_to(cubic.at(0.25)));
        assert!(c1.start().is_close_to(cubic.at(0.25)));
        for index in 0..8 {
            let t = index as Scalar / 7.0;
            let p0 = c0.at(t);
            let p1 = cubic.at(t * 0.25);
            assert_approx_eq!(p0.x(), p1.x(), 1e-9);
            assert_approx_eq!(p0.y(), p1.y(), 1e-9);
        }

        let piece = cubic.cut(0.25, 0.75);
        assert!(piece.start().is_close_to(cubic.at(0.25)));
        assert!(piece.end().is_close_to(cubic.at(0.75)));
        for index in 0..8 {
            let t = index as Scalar / 7.0;
            let p0 = piece.at(t);
            let p1 = cubic.at(0.25 + t * 0.5);
            assert_approx_eq!(p0.x(), p1.x(), 1e-9);
            assert_approx_eq!(p0.y(), p1.y(), 1e-9);
        }
    }

    #[test]
    fn test_line_intersect() {
        let l0 = Line::new((0.0, 0.0), (2.0, 2.0));
        let l1 = Line::new((0.0, 2.0), (2.0, 0.0));
        let p = l0.intersect_point(l1).unwrap();
        assert_approx_eq!(p.x(), 1.0);
        assert_approx_eq!(p.y(), 1.0);

        // parallel lines do not intersect
        let l2 = Line::new((0.0, 1.0), (2.0, 3.0));
        assert!(l0.intersect(l2).is_none());
    }

    #[test]
    fn test_intersect_params() {
        // line crossing a cubic arch twice
        let cubic: Segment = Cubic::new((0.0, 0.0), (1.0, 3.0), (3.0, 3.0), (4.0, 0.0)).into();
        let line: Segment = Line::new((-1.0, 1.0), (5.0, 1.0)).into();
        let params = cubic.intersect_params(line, 1e-6);
        assert_eq!(params.len(), 2);
        for (t0, t1) in params {
            let p0 = cubic.at(t0);
            let p1 = line.at(t1);
            assert_approx_eq!(p0.y(), 1.0, 1e-4);
            assert_approx_eq!(p0.x(), p1.x(), 1e-4);
        }

        // disjoint segments
        let far: Segment = Line::new((10.0, 10.0), (11.0, 11.0)).into();
        assert!(cubic.intersect_params(far, 1e-6).is_empty());
    }

    #[test]
    fn test_quad_to_cubic() {
        let quad = Quad::new((0.0, 0.0), (1.0, 2.0), (2.0, 0.0));
        let cubic: Cubic = quad.into();
        for index in 0..16 {
            let t = index as Scalar / 15.0;
            let p0 = quad.at(t);
            let p1 = cubic.at(t);
            assert_approx_eq!(p0.x(), p1.x(), 1e-9);
            assert_approx_eq!(p0.y(), p1.y(), 1e-9);
        }
    }

    #[test]
    fn test_dist_to_point() {
        let line = Line::new((0.0, 0.0), (4.0, 0.0));
        assert_approx_eq!(line.dist_to_point(Point::new(2.0, 3.0)), 3.0);
        assert_approx_eq!(line.dist_to_point(Point::new(-3.0, 4.0)), 5.0);
        assert_approx_eq!(line.dist_to_point(Point::new(4.0, 0.0)), 0.0);
    }
}
