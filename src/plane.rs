//! Planar arrangement of tagged line segments
//!
//! This is the conservative geometry backend of the boolean engine: operands
//! are flattened to polylines, mutually split at intersections and snapped
//! onto a tolerance grid, after which results can be read back either as
//! region boundaries (`select`) or as the faces of the subdivision with hole
//! nesting (`faces`). Curve fidelity is lost at the approximation threshold,
//! but a result is always produced, no matter how degenerate the input.

use crate::{Curve, Line, Path, Point, Scalar, SubPath, Transform, clamp};
use std::collections::HashMap;
use tracing::debug;

/// Planar subdivision induced by a set of flattened path operands.
///
/// Operands are added with `add_operand`, the subdivision is computed once by
/// `build`, queries are valid afterwards. Every edge knows, per operand, the
/// net number of input edges that run along it (signed by direction), which
/// makes winding numbers of the original operands recoverable anywhere in the
/// plane by ray casting over the subdivision itself.
pub(crate) struct PlaneGraph {
    eps: Scalar,
    operands: usize,
    raw: Vec<RawSegment>,
    verts: Vec<Point>,
    vert_lookup: HashMap<(i64, i64), usize>,
    edges: Vec<Edge>,
    edge_lookup: HashMap<(usize, usize), usize>,
    built: bool,
}

struct RawSegment {
    line: Line,
    operand: usize,
    winding: i32,
}

struct Edge {
    v0: usize,
    v1: usize,
    /// per-operand net edge multiplicity in the `v0 -> v1` direction
    winding: Vec<i32>,
}

/// One bounded face of the subdivision
pub(crate) struct Face {
    /// outer ring followed by hole rings
    pub path: Path,
    /// winding numbers of every operand inside the face
    pub windings: Vec<i32>,
}

impl PlaneGraph {
    pub fn new(eps: Scalar) -> Self {
        Self {
            eps: eps.max(1e-9),
            operands: 0,
            raw: Vec::new(),
            verts: Vec::new(),
            vert_lookup: HashMap::new(),
            edges: Vec::new(),
            edge_lookup: HashMap::new(),
            built: false,
        }
    }

    /// Add a path operand, flattened to polylines with the provided flatness.
    ///
    /// Filled operands contribute winding to the plane and have open subpaths
    /// implicitly closed. Unfilled operands are pure cut lines: their edges
    /// split faces but carry no winding.
    pub fn add_operand(&mut self, path: &Path, filled: bool, flatness: Scalar) -> usize {
        debug_assert!(!self.built, "operands must be added before build");
        let operand = self.operands;
        self.operands += 1;
        let winding = if filled { 1 } else { 0 };
        for subpath in path.subpaths() {
            for line in subpath.flatten(Transform::identity(), flatness, filled) {
                if line.length() < self.eps {
                    continue;
                }
                self.raw.push(RawSegment {
                    line,
                    operand,
                    winding,
                });
            }
        }
        operand
    }

    /// Uncross the input: split all segments at mutual intersections, snap
    /// the endpoints onto the tolerance grid and merge duplicate edges.
    pub fn build(&mut self) {
        debug_assert!(!self.built);
        self.built = true;
        let raw = std::mem::take(&mut self.raw);
        for (index, seg) in raw.iter().enumerate() {
            let line = seg.line;
            let length = line.length();
            let slack = self.eps / length;
            let mut params = vec![0.0, 1.0];
            for (other_index, other) in raw.iter().enumerate() {
                if other_index == index {
                    continue;
                }
                match line.intersect(other.line) {
                    Some((t0, t1))
                        if (-slack..=1.0 + slack).contains(&t0)
                            && (-slack..=1.0 + slack).contains(&t1) =>
                    {
                        params.push(clamp(t0, 0.0, 1.0));
                    }
                    Some(_) => {}
                    None => {
                        // parallel: split where the other segment ends on this one
                        for point in other.line.points() {
                            if line.dist_to_point(point) < self.eps {
                                let t = (point - line.start()).dot(line.direction())
                                    / (length * length);
                                params.push(clamp(t, 0.0, 1.0));
                            }
                        }
                    }
                }
            }
            params.sort_by(Scalar::total_cmp);
            // snap split positions to vertices, dropping pieces that collapse
            let mut chain: Vec<usize> = Vec::new();
            for t in params {
                let vert = self.vert(line.at(t));
                if chain.last() != Some(&vert) {
                    chain.push(vert);
                }
            }
            for pair in chain.windows(2) {
                self.add_edge(pair[0], pair[1], seg.operand, seg.winding);
            }
        }
    }

    /// Winding number of the operand at the point, ray cast over the
    /// subdivision edges with per-operand multiplicities.
    pub fn winding(&self, operand: usize, point: Point) -> i32 {
        debug_assert!(self.built);
        let Point([px, py]) = point;
        let mut winding = 0;
        for edge in self.edges.iter() {
            let mult = edge.winding[operand];
            if mult == 0 {
                continue;
            }
            let Point([x0, y0]) = self.verts[edge.v0];
            let Point([x1, y1]) = self.verts[edge.v1];
            let up = y0 <= py && py < y1;
            let down = y1 <= py && py < y0;
            if !up && !down {
                continue;
            }
            let t = (py - y0) / (y1 - y0);
            let x = x0 + t * (x1 - x0);
            if x > px {
                winding += if up { mult } else { -mult };
            }
        }
        winding
    }

    /// Winding numbers of all operands at the point
    fn windings(&self, point: Point) -> Vec<i32> {
        (0..self.operands)
            .map(|operand| self.winding(operand, point))
            .collect()
    }

    /// Extract the boundary of the region selected by the predicate.
    ///
    /// `keep` receives the winding numbers of every operand and decides
    /// whether that spot belongs to the result. Edges whose two sides
    /// disagree form the boundary; they are oriented interior-left and
    /// stitched into closed contours.
    pub fn select(&self, keep: impl Fn(&[i32]) -> bool) -> Path {
        debug_assert!(self.built);
        let delta = 0.5 * self.eps;
        let mut directed: Vec<(usize, usize)> = Vec::new();
        for edge in self.edges.iter() {
            let p0 = self.verts[edge.v0];
            let p1 = self.verts[edge.v1];
            let dir = match (p1 - p0).normalize() {
                Some(dir) => dir,
                None => continue,
            };
            // normal() points to the right of the direction
            let left = -delta * dir.normal();
            let mid = 0.5 * (p0 + p1);
            let inside_left = keep(&self.windings(mid + left));
            let inside_right = keep(&self.windings(mid - left));
            match (inside_left, inside_right) {
                (true, false) => directed.push((edge.v0, edge.v1)),
                (false, true) => directed.push((edge.v1, edge.v0)),
                _ => {}
            }
        }
        self.stitch(directed)
    }

    /// Stitch directed boundary edges into closed contours.
    ///
    /// At junction vertices the most counter-clockwise continuation is taken,
    /// which keeps interior-left contours simple instead of figure-eights.
    fn stitch(&self, directed: Vec<(usize, usize)>) -> Path {
        let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
        for (index, (from, _)) in directed.iter().enumerate() {
            outgoing.entry(*from).or_default().push(index);
        }
        let mut used = vec![false; directed.len()];
        let mut subpaths = Vec::new();
        for start in 0..directed.len() {
            if used[start] {
                continue;
            }
            used[start] = true;
            let mut chain = vec![directed[start].0, directed[start].1];
            let closed = loop {
                let cur = *chain.last().expect("chain is never empty");
                if cur == chain[0] {
                    chain.pop();
                    break true;
                }
                let prev = chain[chain.len() - 2];
                let incoming = match (self.verts[cur] - self.verts[prev]).normalize() {
                    Some(dir) => dir,
                    None => break false,
                };
                let mut best: Option<(usize, Scalar, Scalar)> = None;
                for &candidate in outgoing.get(&cur).into_iter().flatten() {
                    if used[candidate] {
                        continue;
                    }
                    let to = self.verts[directed[candidate].1];
                    let offset = to - self.verts[cur];
                    let out_dir = match offset.normalize() {
                        Some(dir) => dir,
                        None => continue,
                    };
                    let angle = incoming.cross(out_dir).atan2(incoming.dot(out_dir));
                    let length = offset.length();
                    let better = match best {
                        None => true,
                        Some((_, best_angle, best_length)) => {
                            angle > best_angle
                                || (angle == best_angle && length < best_length)
                        }
                    };
                    if better {
                        best = Some((candidate, angle, length));
                    }
                }
                match best {
                    Some((next, _, _)) => {
                        used[next] = true;
                        chain.push(directed[next].1);
                    }
                    None => break false,
                }
            };
            if !closed {
                debug!(len = chain.len(), "dropping unclosed boundary chain");
                continue;
            }
            if chain.len() < 3 {
                continue;
            }
            let segments = chain
                .windows(2)
                .map(|pair| Line::new(self.verts[pair[0]], self.verts[pair[1]]).into())
                .collect();
            subpaths.extend(SubPath::new(segments, true));
        }
        Path::new(subpaths)
    }

    /// Extract all bounded faces of the subdivision with hole nesting.
    ///
    /// Dangling edges (chains that do not separate any two faces) are pruned
    /// first. Each face is reported with its outer ring, its hole rings and
    /// the winding numbers of every operand inside it.
    pub fn faces(&self) -> Vec<Face> {
        debug_assert!(self.built);
        // prune dangling edges
        let mut alive = vec![true; self.edges.len()];
        loop {
            let mut degree = vec![0usize; self.verts.len()];
            for (index, edge) in self.edges.iter().enumerate() {
                if alive[index] {
                    degree[edge.v0] += 1;
                    degree[edge.v1] += 1;
                }
            }
            let mut changed = false;
            for (index, edge) in self.edges.iter().enumerate() {
                if alive[index] && (degree[edge.v0] <= 1 || degree[edge.v1] <= 1) {
                    alive[index] = false;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        // half-edges, twins are adjacent (2 * edge, 2 * edge + 1)
        let mut halves: Vec<(usize, usize)> = Vec::new();
        for (index, edge) in self.edges.iter().enumerate() {
            if alive[index] {
                halves.push((edge.v0, edge.v1));
                halves.push((edge.v1, edge.v0));
            } else {
                // keep twin indexing intact
                halves.push((usize::MAX, usize::MAX));
                halves.push((usize::MAX, usize::MAX));
            }
        }
        // outgoing half-edges per vertex, counter-clockwise by angle
        let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
        for (index, &(from, _)) in halves.iter().enumerate() {
            if from != usize::MAX {
                outgoing.entry(from).or_default().push(index);
            }
        }
        for (&vert, half_ids) in outgoing.iter_mut() {
            half_ids.sort_by(|&h0, &h1| {
                let a0 = (self.verts[halves[h0].1] - self.verts[vert]).angle();
                let a1 = (self.verts[halves[h1].1] - self.verts[vert]).angle();
                a0.total_cmp(&a1)
            });
        }

        // trace face cycles: the next half-edge is the clockwise neighbour of
        // the twin around the target vertex, which walks every face with its
        // interior on the left
        let mut used = vec![false; halves.len()];
        let mut outers: Vec<(Vec<Point>, Vec<i32>, Scalar)> = Vec::new();
        let mut holes: Vec<(Vec<Point>, Point)> = Vec::new();
        for start in 0..halves.len() {
            if used[start] || halves[start].0 == usize::MAX {
                continue;
            }
            let mut cycle = Vec::new();
            let mut half = start;
            loop {
                used[half] = true;
                cycle.push(half);
                let to = halves[half].1;
                let twin = half ^ 1;
                let ring = &outgoing[&to];
                let pos = ring
                    .iter()
                    .position(|&h| h == twin)
                    .expect("twin half-edge is always registered");
                half = ring[(pos + ring.len() - 1) % ring.len()];
                if half == start {
                    break;
                }
            }
            let points: Vec<Point> = cycle.iter().map(|&h| self.verts[halves[h].0]).collect();
            let area = ring_area(&points);
            // winding sample just left of the first half-edge
            let (from, to) = halves[cycle[0]];
            let dir = match (self.verts[to] - self.verts[from]).normalize() {
                Some(dir) => dir,
                None => continue,
            };
            let sample =
                0.5 * (self.verts[from] + self.verts[to]) - 0.5 * self.eps * dir.normal();
            if area > 0.0 {
                outers.push((points, self.windings(sample), area));
            } else {
                holes.push((points, sample));
            }
        }

        // attach hole rings to the smallest containing outer ring
        let mut faces: Vec<(Path, Vec<i32>)> = outers
            .iter()
            .map(|(points, windings, _)| (Path::new(vec![ring_subpath(points)]), windings.clone()))
            .collect();
        for (points, sample) in holes {
            let mut owner: Option<(usize, Scalar)> = None;
            for (index, (ring, _, area)) in outers.iter().enumerate() {
                if ring_contains(ring, sample)
                    && owner.map_or(true, |(_, owner_area)| *area < owner_area)
                {
                    owner = Some((index, *area));
                }
            }
            if let Some((index, _)) = owner {
                faces[index].0.extend(Some(ring_subpath(&points)));
            }
        }
        faces
            .into_iter()
            .map(|(path, windings)| Face { path, windings })
            .collect()
    }

    fn vert(&mut self, point: Point) -> usize {
        let key = (
            (point.x() / self.eps).round() as i64,
            (point.y() / self.eps).round() as i64,
        );
        match self.vert_lookup.get(&key) {
            Some(&vert) => vert,
            None => {
                let vert = self.verts.len();
                self.verts.push(point);
                self.vert_lookup.insert(key, vert);
                vert
            }
        }
    }

    fn add_edge(&mut self, v0: usize, v1: usize, operand: usize, winding: i32) {
        let (a, b, sign) = if v0 < v1 { (v0, v1, 1) } else { (v1, v0, -1) };
        let index = match self.edge_lookup.get(&(a, b)) {
            Some(&index) => index,
            None => {
                let index = self.edges.len();
                self.edges.push(Edge {
                    v0: a,
                    v1: b,
                    winding: vec![0; self.operands],
                });
                self.edge_lookup.insert((a, b), index);
                index
            }
        };
        let slot = &mut self.edges[index].winding;
        slot.resize(self.operands, 0);
        slot[operand] += sign * winding;
    }
}

/// Signed area of a polygon ring (shoelace)
fn ring_area(points: &[Point]) -> Scalar {
    let mut area = 0.0;
    for index in 0..points.len() {
        let p0 = points[index];
        let p1 = points[(index + 1) % points.len()];
        area += p0.cross(p1);
    }
    area / 2.0
}

/// Even-odd containment test against a single polygon ring
fn ring_contains(points: &[Point], point: Point) -> bool {
    let Point([px, py]) = point;
    let mut inside = false;
    for index in 0..points.len() {
        let Point([x0, y0]) = points[index];
        let Point([x1, y1]) = points[(index + 1) % points.len()];
        if (y0 <= py) != (y1 <= py) {
            let t = (py - y0) / (y1 - y0);
            if x0 + t * (x1 - x0) > px {
                inside = !inside;
            }
        }
    }
    inside
}

/// Closed polyline subpath from ring points
fn ring_subpath(points: &[Point]) -> SubPath {
    let segments = (0..points.len())
        .map(|index| Line::new(points[index], points[(index + 1) % points.len()]).into())
        .collect();
    SubPath::new(segments, true).expect("ring is never empty")
}
