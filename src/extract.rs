//! Region extractor: decompose a stack of shapes into atomic regions
//!
//! Two policies are provided. `build_mosaic` fractures the whole stack into
//! venn-diagram-like cells, every cell tagged with its best-guess originating
//! shape. `build_flatten` produces the top-to-bottom opaque decomposition:
//! one region per shape, holding exactly the part of it that is visible.
//!
//! Input is the host's shape tree: leaf geometry is collected by plain
//! recursion with an accumulated transform, in top-to-bottom z-order.

use crate::{
    BBox, BoolOp, FillRule, Path, Point, Scalar, Transform, boolop,
    subitem::{ShapeId, Style, SubItem, WorkItem},
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::sync::Arc;
use tracing::debug;

/// One node of the host's shape tree, in document order (topmost first)
#[derive(Debug, Clone)]
pub enum Element {
    /// filled path
    Path {
        id: ShapeId,
        path: Path,
        fill_rule: FillRule,
        style: Style,
    },
    /// raster image, its geometry is the clip outline
    Image { id: ShapeId, clip: Path, style: Style },
    /// group applying a coordinate transform to all children
    Group {
        id: ShapeId,
        transform: Transform,
        children: Vec<Element>,
    },
    /// clone referencing another element under its own transform
    Use {
        id: ShapeId,
        transform: Transform,
        target: Arc<Element>,
    },
}

impl Element {
    pub fn id(&self) -> ShapeId {
        match self {
            Element::Path { id, .. }
            | Element::Image { id, .. }
            | Element::Group { id, .. }
            | Element::Use { id, .. } => *id,
        }
    }
}

/// Tuning knobs of the mosaic ownership sampling.
///
/// The defaults are empirically chosen, none of them is a hard invariant.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MosaicConfig {
    /// margin added around the combined bounding box of the input shapes to
    /// form the enclosing rectangle that gets cut apart
    pub margin: Scalar,
    /// sampling patience: how many random points to try per region before
    /// giving up on accumulating hits
    pub max_samples: u32,
    /// how many in-region hits to accumulate before voting on ownership
    pub target_hits: u32,
    /// sampling rng seed, a fixed default keeps ownership deterministic
    pub seed: u64,
}

impl Default for MosaicConfig {
    fn default() -> Self {
        Self {
            margin: 10.0,
            max_samples: 1000,
            target_hits: 20,
            seed: 0x5eed,
        }
    }
}

/// Drawable leaf collected from the tree, geometry in document space
struct Leaf {
    root: ShapeId,
    item: ShapeId,
    path: Path,
    fill_rule: FillRule,
    style: Style,
    is_image: bool,
}

/// Extraction result with the session gate for the interactive builder
pub(crate) struct Extraction {
    pub items: Vec<WorkItem>,
    /// whether any input shapes actually intersect; when false the caller
    /// should skip interactive mode and fall through to a plain boolean op
    pub intersected: bool,
}

/// Fracture the input stack into atomic non-overlapping regions.
///
/// The combined outline of every shape is treated as a set of cut lines, the
/// inflated bounding rectangle is cut by all of them, and each inner piece
/// is attributed to an originating shape by stochastic point sampling.
/// Pieces no shape claims become background holes without provenance.
pub fn build_mosaic(elements: &[Element], config: &MosaicConfig) -> Vec<WorkItem> {
    extract_mosaic(elements, config).items
}

pub(crate) fn extract_mosaic(elements: &[Element], config: &MosaicConfig) -> Extraction {
    let leaves = collect_leaves(elements);
    let bbox = leaves.iter().fold(None, |bbox: Option<BBox>, leaf| {
        match (bbox, leaf.path.bbox(Transform::identity())) {
            (Some(bbox), Some(other)) => Some(bbox.union(other)),
            (bbox, other) => bbox.or(other),
        }
    });
    let Some(bbox) = bbox else {
        return Extraction {
            items: Vec::new(),
            intersected: false,
        };
    };

    // enclosing rectangle and the combined cut lines
    let rect = bbox.inflate(config.margin);
    let mut builder = Path::builder();
    builder
        .move_to(rect.min())
        .rect((rect.width(), rect.height()));
    let rect_path = builder.build();
    let mut lines = Path::empty();
    for leaf in leaves.iter() {
        lines.extend(leaf.path.subpaths().iter().cloned());
    }

    let pieces = boolop::cut_by_lines(&rect_path, &lines);
    let eps = 2.0 * boolop::approx_threshold(&rect_path);

    // images are preferred owners when area is ambiguous: stable partition
    // to the front, z-order preserved within both halves
    let mut priority: Vec<usize> = (0..leaves.len()).collect();
    priority.sort_by_key(|&index| !leaves[index].is_image);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut items = Vec::new();
    let mut owned = 0usize;
    for piece in pieces {
        if touches_border(&piece, rect, eps) {
            continue;
        }
        let subitem = match sample_owner(&piece, &leaves, &priority, config, &mut rng) {
            Some(index) => {
                let leaf = &leaves[index];
                owned += 1;
                SubItem::new(
                    piece,
                    Some(leaf.root),
                    Some(leaf.item),
                    leaf.style.clone(),
                    leaf.is_image,
                )
            }
            // a hole: geometry surrounded by shapes but owned by none
            None => SubItem::new(piece, None, None, Style::default(), false),
        };
        items.push(Arc::new(subitem));
    }
    Extraction {
        items,
        intersected: owned > leaves.len(),
    }
}

/// Whether a piece rests against the expanded enclosing rectangle, meaning
/// it is part of the outside region rather than of any shape
fn touches_border(piece: &Path, rect: BBox, eps: Scalar) -> bool {
    match piece.bbox(Transform::identity()) {
        Some(bbox) => {
            bbox.x() - rect.x() < eps
                || rect.max().x() - bbox.max().x() < eps
                || bbox.y() - rect.y() < eps
                || rect.max().y() - bbox.max().y() < eps
        }
        None => true,
    }
}

/// Vote on the owner of a fractured piece by random sampling.
///
/// Points are drawn uniformly from the piece bounding box and rejected by an
/// even-odd test until `target_hits` land inside the piece or patience runs
/// out; every hit is tested against every leaf. The leaf with the most hits
/// wins, ties break towards the front of the priority list.
fn sample_owner(
    piece: &Path,
    leaves: &[Leaf],
    priority: &[usize],
    config: &MosaicConfig,
    rng: &mut StdRng,
) -> Option<usize> {
    let bbox = piece.bbox(Transform::identity())?;
    let mut hits = vec![0u32; priority.len()];
    let mut inside = 0u32;
    for _ in 0..config.max_samples {
        if inside >= config.target_hits {
            break;
        }
        let point = Point::new(
            bbox.x() + rng.random::<Scalar>() * bbox.width(),
            bbox.y() + rng.random::<Scalar>() * bbox.height(),
        );
        if !piece.contains(point, FillRule::EvenOdd) {
            continue;
        }
        inside += 1;
        for (slot, &leaf_index) in priority.iter().enumerate() {
            let leaf = &leaves[leaf_index];
            if leaf.path.contains(point, leaf.fill_rule) {
                hits[slot] += 1;
            }
        }
    }
    if inside < config.target_hits {
        debug!(
            inside,
            target = config.target_hits,
            "ownership sampling patience exhausted"
        );
    }
    let (best_slot, best_hits) = hits
        .iter()
        .enumerate()
        .max_by_key(|(slot, hits)| (**hits, std::cmp::Reverse(*slot)))?;
    if *best_hits == 0 {
        return None;
    }
    Some(priority[best_slot])
}

/// Flatten the input stack into the top-to-bottom opaque decomposition.
///
/// Shapes are walked topmost first while a running union of covered area is
/// maintained; each shape contributes exactly the still-visible part of its
/// fill-rule-resolved outline. Fully occluded shapes contribute nothing.
/// Ownership is exact, no sampling is involved.
pub fn build_flatten(elements: &[Element]) -> Vec<WorkItem> {
    extract_flatten(elements).items
}

pub(crate) fn extract_flatten(elements: &[Element]) -> Extraction {
    let leaves = collect_leaves(elements);
    let mut covered = Path::empty();
    let mut items = Vec::new();
    let mut intersected = false;
    for leaf in leaves {
        let resolved = boolop::flatten(&leaf.path, leaf.fill_rule);
        if resolved.is_empty() {
            continue;
        }
        let visible = if covered.is_empty() {
            resolved.clone()
        } else {
            boolop::boolean(
                &resolved,
                FillRule::NonZero,
                &covered,
                FillRule::NonZero,
                BoolOp::Difference,
            )
        };
        let tolerance = boolop::approx_threshold(&resolved).max(1e-9);
        if (resolved.area() - visible.area()).abs() > tolerance {
            intersected = true;
        }
        if !visible.is_empty() && visible.area().abs() > tolerance {
            items.push(Arc::new(SubItem::new(
                visible,
                Some(leaf.root),
                Some(leaf.item),
                leaf.style.clone(),
                leaf.is_image,
            )));
        }
        covered = if covered.is_empty() {
            resolved
        } else {
            boolop::boolean(
                &covered,
                FillRule::NonZero,
                &resolved,
                FillRule::NonZero,
                BoolOp::Union,
            )
        };
    }
    Extraction { items, intersected }
}

/// Collect drawable leaves from the shape trees, applying the cumulative
/// coordinate transform at each level. Document object graphs are acyclic
/// (clones reference targets, never cycles), plain recursion is safe.
fn collect_leaves(elements: &[Element]) -> Vec<Leaf> {
    let mut leaves = Vec::new();
    for element in elements {
        collect_rec(element, element.id(), Transform::identity(), &mut leaves);
    }
    leaves
}

fn collect_rec(element: &Element, root: ShapeId, tr: Transform, leaves: &mut Vec<Leaf>) {
    match element {
        Element::Path {
            id,
            path,
            fill_rule,
            style,
        } => {
            let mut path = path.clone();
            path.transform(tr);
            leaves.push(Leaf {
                root,
                item: *id,
                path,
                fill_rule: *fill_rule,
                style: style.clone(),
                is_image: false,
            });
        }
        Element::Image { id, clip, style } => {
            let mut clip = clip.clone();
            clip.transform(tr);
            leaves.push(Leaf {
                root,
                item: *id,
                path: clip,
                fill_rule: FillRule::NonZero,
                style: style.clone(),
                is_image: true,
            });
        }
        Element::Group {
            transform,
            children,
            ..
        } => {
            for child in children {
                collect_rec(child, root, tr * *transform, leaves);
            }
        }
        Element::Use {
            id,
            transform,
            target,
        } => match target.as_ref() {
            // a clone of a clipped image is a single atomic leaf producing
            // the clip outline, it is not unrolled further
            Element::Image { clip, style, .. } => {
                let mut clip = clip.clone();
                clip.transform(tr * *transform);
                leaves.push(Leaf {
                    root,
                    item: *id,
                    path: clip,
                    fill_rule: FillRule::NonZero,
                    style: style.clone(),
                    is_image: true,
                });
            }
            target => collect_rec(target, root, tr * *transform, leaves),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    fn path_element(id: u64, d: &str) -> Element {
        Element::Path {
            id: ShapeId(id),
            path: d.parse().unwrap(),
            fill_rule: FillRule::NonZero,
            style: Style::new(format!("fill:#{:06x}", id)),
        }
    }

    fn total_area(items: &[WorkItem]) -> Scalar {
        items
            .iter()
            .map(|item| item.paths().area().abs())
            .sum::<Scalar>()
    }

    #[test]
    fn test_mosaic_two_squares() {
        // topmost first: A over B
        let elements = vec![
            path_element(1, "M0,0 L2,0 L2,2 L0,2 Z"),
            path_element(2, "M1,1 L3,1 L3,3 L1,3 Z"),
        ];
        let extraction = extract_mosaic(&elements, &MosaicConfig::default());
        assert!(extraction.intersected);
        let items = extraction.items;
        assert_eq!(items.len(), 3);
        assert_approx_eq!(total_area(&items), 7.0, 1e-3);

        // the overlap cell: both shapes claim it, the tie goes to the
        // topmost shape in the priority list
        let overlap = items
            .iter()
            .find(|item| item.contains((1.5, 1.5)))
            .expect("overlap cell exists");
        assert_approx_eq!(overlap.paths().area().abs(), 1.0, 1e-3);
        assert_eq!(overlap.item(), Some(ShapeId(1)));

        let only_a = items
            .iter()
            .find(|item| item.contains((0.5, 0.5)))
            .expect("A-only cell exists");
        assert_approx_eq!(only_a.paths().area().abs(), 3.0, 1e-3);
        assert_eq!(only_a.item(), Some(ShapeId(1)));

        let only_b = items
            .iter()
            .find(|item| item.contains((2.5, 2.5)))
            .expect("B-only cell exists");
        assert_approx_eq!(only_b.paths().area().abs(), 3.0, 1e-3);
        assert_eq!(only_b.item(), Some(ShapeId(2)));
    }

    #[test]
    fn test_mosaic_no_intersections() {
        let elements = vec![
            path_element(1, "M0,0 L1,0 L1,1 L0,1 Z"),
            path_element(2, "M5,5 L6,5 L6,6 L5,6 Z"),
        ];
        let extraction = extract_mosaic(&elements, &MosaicConfig::default());
        assert!(!extraction.intersected);
        assert_eq!(extraction.items.len(), 2);
    }

    #[test]
    fn test_mosaic_hole_region() {
        // a ring: the middle is a hole owned by nobody
        let elements = vec![path_element(1, "M0,0 h4 v4 h-4 z M1,1 v2 h2 v-2 z")];
        let items = build_mosaic(&elements, &MosaicConfig::default());
        let hole = items
            .iter()
            .find(|item| item.contains((2.0, 2.0)))
            .expect("hole region exists");
        assert_eq!(hole.item(), None);
        assert_eq!(hole.root(), None);
        assert_approx_eq!(hole.paths().area().abs(), 4.0, 1e-3);

        let body = items
            .iter()
            .find(|item| item.contains((0.5, 2.0)))
            .expect("ring body exists");
        assert_eq!(body.item(), Some(ShapeId(1)));
        assert_approx_eq!(body.paths().area().abs(), 12.0, 1e-3);
    }

    #[test]
    fn test_mosaic_image_priority() {
        // image below a path still wins the ambiguous overlap cell
        let elements = vec![
            path_element(1, "M0,0 L2,0 L2,2 L0,2 Z"),
            Element::Image {
                id: ShapeId(7),
                clip: "M1,1 L3,1 L3,3 L1,3 Z".parse().unwrap(),
                style: Style::default(),
            },
        ];
        let items = build_mosaic(&elements, &MosaicConfig::default());
        let overlap = items
            .iter()
            .find(|item| item.contains((1.5, 1.5)))
            .expect("overlap cell exists");
        assert_eq!(overlap.item(), Some(ShapeId(7)));
        assert!(overlap.is_image());
    }

    #[test]
    fn test_flatten_two_squares() {
        let elements = vec![
            path_element(1, "M0,0 L2,0 L2,2 L0,2 Z"),
            path_element(2, "M1,1 L3,1 L3,3 L1,3 Z"),
        ];
        let extraction = extract_flatten(&elements);
        assert!(extraction.intersected);
        let items = extraction.items;
        assert_eq!(items.len(), 2);
        // topmost shape keeps its whole area, the lower one only what shows
        assert_eq!(items[0].item(), Some(ShapeId(1)));
        assert_approx_eq!(items[0].paths().area().abs(), 4.0, 1e-3);
        assert_eq!(items[1].item(), Some(ShapeId(2)));
        assert_approx_eq!(items[1].paths().area().abs(), 3.0, 1e-3);
        assert_approx_eq!(total_area(&items), 7.0, 1e-3);
    }

    #[test]
    fn test_flatten_occluded_shape() {
        let elements = vec![
            path_element(1, "M0,0 L4,0 L4,4 L0,4 Z"),
            path_element(2, "M1,1 L2,1 L2,2 L1,2 Z"),
        ];
        let extraction = extract_flatten(&elements);
        assert!(extraction.intersected);
        // the fully hidden square contributes nothing
        assert_eq!(extraction.items.len(), 1);
        assert_eq!(extraction.items[0].item(), Some(ShapeId(1)));
    }

    #[test]
    fn test_group_and_clone_descent() {
        // group translates its child square by (10, 0); a clone repeats the
        // group shifted by another (10, 0)
        let group = Element::Group {
            id: ShapeId(10),
            transform: Transform::new_translate(10.0, 0.0),
            children: vec![path_element(11, "M0,0 L1,0 L1,1 L0,1 Z")],
        };
        let clone = Element::Use {
            id: ShapeId(20),
            transform: Transform::new_translate(10.0, 0.0),
            target: Arc::new(group.clone()),
        };
        let leaves = collect_leaves(&[group, clone]);
        assert_eq!(leaves.len(), 2);
        let bbox0 = leaves[0].path.bbox(Transform::identity()).unwrap();
        assert_approx_eq!(bbox0.x(), 10.0);
        assert_eq!(leaves[0].root, ShapeId(10));
        assert_eq!(leaves[0].item, ShapeId(11));
        let bbox1 = leaves[1].path.bbox(Transform::identity()).unwrap();
        assert_approx_eq!(bbox1.x(), 20.0);
        assert_eq!(leaves[1].root, ShapeId(20));

        // clone of an image stays a single atomic image leaf
        let image = Element::Image {
            id: ShapeId(30),
            clip: "M0,0 L1,0 L1,1 L0,1 Z".parse().unwrap(),
            style: Style::default(),
        };
        let image_clone = Element::Use {
            id: ShapeId(31),
            transform: Transform::new_translate(5.0, 5.0),
            target: Arc::new(image),
        };
        let leaves = collect_leaves(&[image_clone]);
        assert_eq!(leaves.len(), 1);
        assert!(leaves[0].is_image);
        assert_eq!(leaves[0].item, ShapeId(31));
    }
}
