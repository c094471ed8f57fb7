//! SubItem is one fractured piece, linked to the items it originated from
//!
//! SubItems are immutable once shared: the builder wraps them in `Arc` and
//! merging produces a brand new value, so undo snapshots can share instances
//! freely without one mutation corrupting another snapshot.

use crate::{BoolOp, FillRule, Path, Point, Scalar, Transform, boolop};
use std::{collections::BTreeSet, fmt, sync::Arc};

/// Stable non-owning handle to a shape in the host document.
///
/// The host may delete the original shape at any time, so the id is a plain
/// lookup key, never a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShapeId(pub u64);

/// Opaque style handle copied from the originating shape.
///
/// The crate never interprets the content, it only moves it from consumed
/// source shapes onto the produced fragments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Style(Arc<str>);

impl Style {
    pub fn new(style: impl Into<Arc<str>>) -> Self {
        Self(style.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Style {
    fn from(style: &str) -> Self {
        Self::new(style)
    }
}

/// Shared-ownership handle to a SubItem.
///
/// Multiple builder-state snapshots reference the same SubItem without
/// copying its path data.
pub type WorkItem = Arc<SubItem>;

/// One atomic non-overlapping region produced by the region extractor
#[derive(Clone, PartialEq)]
pub struct SubItem {
    paths: Path,
    /// top-level shape this region was extracted from, absent for holes
    root: Option<ShapeId>,
    /// original shape that won ownership of this region
    item: Option<ShapeId>,
    /// all original shapes a merged region has consumed area from
    items: BTreeSet<ShapeId>,
    style: Style,
    is_image: bool,
    selected: bool,
}

impl fmt::Debug for SubItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubItem")
            .field("root", &self.root)
            .field("item", &self.item)
            .field("items", &self.items)
            .field("is_image", &self.is_image)
            .field("selected", &self.selected)
            .field("area", &self.paths.area())
            .finish()
    }
}

impl SubItem {
    pub fn new(
        paths: Path,
        root: Option<ShapeId>,
        item: Option<ShapeId>,
        style: Style,
        is_image: bool,
    ) -> Self {
        Self {
            paths,
            root,
            item,
            items: item.into_iter().collect(),
            style,
            is_image,
            selected: false,
        }
    }

    pub fn paths(&self) -> &Path {
        &self.paths
    }

    pub fn root(&self) -> Option<ShapeId> {
        self.root
    }

    pub fn item(&self) -> Option<ShapeId> {
        self.item
    }

    /// Original shapes whose area this region covers, grows on merge
    pub fn items(&self) -> &BTreeSet<ShapeId> {
        &self.items
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn is_image(&self) -> bool {
        self.is_image
    }

    pub fn selected(&self) -> bool {
        self.selected
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Merge two regions into a new one, the union of their geometry.
    ///
    /// The left hand side retains priority for the resulting style and
    /// provenance, so be mindful of how you merge these shapes. Neither
    /// input is mutated, older history snapshots stay intact.
    pub fn merge(&self, other: &SubItem) -> SubItem {
        let joined = boolop::boolean(
            &self.paths,
            FillRule::NonZero,
            &other.paths,
            FillRule::NonZero,
            BoolOp::Union,
        );
        let mut items = self.items.clone();
        items.extend(other.items.iter().copied());
        SubItem {
            paths: clean_path(joined),
            root: self.root,
            item: self.item,
            items,
            style: self.style.clone(),
            is_image: self.is_image,
            selected: self.selected,
        }
    }

    /// Return true if this subitem contains the given point
    pub fn contains(&self, point: impl Into<Point>) -> bool {
        self.paths.winding_at(point) % 2 != 0
    }

    /// Containment with a tolerance around the outline, for hit testing
    pub fn hit(&self, point: impl Into<Point>, tolerance: Scalar) -> bool {
        let point = point.into();
        self.contains(point)
            || self
                .paths
                .dist_to_point(point)
                .is_some_and(|dist| dist <= tolerance)
    }
}

/// Drop degenerate subpaths left behind by boolean operations
fn clean_path(path: Path) -> Path {
    let threshold = boolop::approx_threshold(&path);
    Path::new(
        path.into_iter()
            .filter(|subpath| {
                subpath.bbox(None, Transform::identity()).diameter() > threshold
            })
            .collect(),
    )
}
