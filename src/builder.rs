//! Interactive boolean builder
//!
//! Holds the working set of fractured regions during an interactive session.
//! The user accumulates a pending task by clicking regions (a union task
//! merges them, a delete task removes them), commits it, and can undo/redo
//! committed tasks. Undo history is coarse-grained: whole snapshots of the
//! working set. Regions are immutable behind shared handles, so snapshots
//! share them without copying path data and a merge can never corrupt an
//! older snapshot.

use crate::{
    Path, Point, Scalar,
    extract::{self, Element, MosaicConfig},
    subitem::{ShapeId, Style, SubItem, WorkItem},
};
use std::sync::Arc;
use tracing::debug;

/// Default hit-test tolerance around region outlines
pub const DEFAULT_HIT_TOLERANCE: Scalar = 2.0;

/// Region extraction policy used when the session starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// fracture into atomic overlap cells (`build_mosaic`)
    Fracture,
    /// top-to-bottom opaque decomposition (`build_flatten`)
    Flatten,
}

/// What a pending task will do to its accumulated regions on commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// merge the regions into one
    Union,
    /// remove the regions
    Delete,
}

/// Pending accumulation of selected regions
struct Task {
    kind: TaskKind,
    item: SubItem,
}

/// Output record of a finished session, materialized by the host
#[derive(Debug, Clone)]
pub enum Output {
    /// plain path fragment carrying the style of its winning source shape
    Path {
        paths: Path,
        style: Style,
        root: Option<ShapeId>,
    },
    /// image-derived fragment: reference the original image clipped by the
    /// fragment outline instead of flattening it to a path, preserving
    /// raster fidelity
    ClippedImage {
        clip: Path,
        image: ShapeId,
        style: Style,
        root: Option<ShapeId>,
    },
}

/// Everything the host needs to apply a committed session to its document
#[derive(Debug, Clone, Default)]
pub struct Commit {
    /// new document objects to create
    pub outputs: Vec<Output>,
    /// consumed source shapes to delete (empty unless replacing originals)
    pub delete: Vec<ShapeId>,
    /// images referenced by clip outputs, to be moved/kept instead of deleted
    pub reused_images: Vec<ShapeId>,
    /// shapes hidden for the session whose visibility must be restored
    pub restore: Vec<ShapeId>,
}

/// Interactive builder state machine.
///
/// Construction runs the region extractor and corresponds to session start;
/// `commit` and `discard` consume the builder and correspond to the session
/// end. Every in-session operation either fully applies or leaves the state
/// unchanged, misuse is a boolean no-op rather than an error.
pub struct BooleanBuilder {
    work_items: Vec<WorkItem>,
    /// parallel to `work_items`; false only while consumed by a pending task
    visible: Vec<bool>,
    task: Option<Task>,
    undo_stack: Vec<Vec<WorkItem>>,
    redo_stack: Vec<Vec<WorkItem>>,
    /// source shapes hidden for the duration of the session
    hidden: Vec<ShapeId>,
    intersected: bool,
    hit_tolerance: Scalar,
}

impl BooleanBuilder {
    /// Start a session over the host's current selection
    pub fn new(elements: &[Element], mode: BuildMode) -> Self {
        Self::with_config(elements, mode, &MosaicConfig::default())
    }

    pub fn with_config(elements: &[Element], mode: BuildMode, config: &MosaicConfig) -> Self {
        let extraction = match mode {
            BuildMode::Fracture => extract::extract_mosaic(elements, config),
            BuildMode::Flatten => extract::extract_flatten(elements),
        };
        let visible = vec![true; extraction.items.len()];
        Self {
            work_items: extraction.items,
            visible,
            task: None,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            hidden: elements.iter().map(Element::id).collect(),
            intersected: extraction.intersected,
            hit_tolerance: DEFAULT_HIT_TOLERANCE,
        }
    }

    pub fn set_hit_tolerance(&mut self, tolerance: Scalar) {
        self.hit_tolerance = tolerance;
    }

    /// Whether extraction produced any regions at all
    pub fn has_items(&self) -> bool {
        !self.work_items.is_empty()
    }

    /// Whether the input shapes actually intersect. When false the caller
    /// should not enter interactive mode, a plain boolean op covers it.
    pub fn has_intersections(&self) -> bool {
        self.intersected
    }

    pub fn has_task(&self) -> bool {
        self.task.is_some()
    }

    /// Whether any task has been committed in this session
    pub fn has_changes(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Current working set, for drawing the fragment outlines
    pub fn work_items(&self) -> &[WorkItem] {
        &self.work_items
    }

    /// Whether the region at the index is visible (not consumed by the
    /// pending task)
    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.get(index).copied().unwrap_or(false)
    }

    /// Accumulated geometry of the pending task, for preview drawing
    pub fn task_preview(&self) -> Option<&SubItem> {
        self.task.as_ref().map(|task| &task.item)
    }

    /// Source shapes hidden for the session
    pub fn hidden_shapes(&self) -> &[ShapeId] {
        &self.hidden
    }

    /// Whether any work item extracted from this root shape is image-derived
    pub fn contains_image(&self, root: ShapeId) -> bool {
        self.work_items
            .iter()
            .any(|item| item.root() == Some(root) && item.is_image())
    }

    /// First visible region under the point.
    ///
    /// Containment wins over outline proximity, the tolerance only catches
    /// clicks right next to an edge.
    fn item_at(&self, point: Point) -> Option<usize> {
        let candidates = || {
            self.work_items
                .iter()
                .enumerate()
                .filter(|(index, _)| self.visible[*index])
        };
        candidates()
            .find(|(_, item)| item.contains(point))
            .or_else(|| candidates().find(|(_, item)| item.hit(point, self.hit_tolerance)))
            .map(|(index, _)| index)
    }

    /// Begin a pending task seeded with the region under the point.
    ///
    /// Fails without any state change when nothing is hit or when a task is
    /// already pending (cancel it first).
    pub fn select_task(&mut self, point: impl Into<Point>, kind: TaskKind) -> bool {
        if self.task.is_some() {
            return false;
        }
        let Some(index) = self.item_at(point.into()) else {
            return false;
        };
        let mut item = (*self.work_items[index]).clone();
        item.set_selected(true);
        self.visible[index] = false;
        self.task = Some(Task { kind, item });
        true
    }

    /// Merge another still-visible region into the pending task.
    ///
    /// No-op returning false when no task is pending, nothing is hit, or the
    /// hit region is already consumed.
    pub fn extend_task(&mut self, point: impl Into<Point>) -> bool {
        if self.task.is_none() {
            return false;
        }
        let Some(index) = self.item_at(point.into()) else {
            return false;
        };
        let task = self.task.as_mut().expect("task is pending");
        task.item = task.item.merge(&self.work_items[index]);
        self.visible[index] = false;
        true
    }

    /// Discard the pending task and restore the visibility of everything it
    /// had consumed. Always legal, no-op without a pending task.
    pub fn cancel_task(&mut self) {
        self.task = None;
        self.visible.iter_mut().for_each(|visible| *visible = true);
    }

    /// Commit the pending task to the working set.
    ///
    /// Pushes the current working set onto the undo stack (clearing redo),
    /// removes the consumed regions and, for a union task, inserts the
    /// accumulated merged region. The only mutator of the persistent working
    /// set; no-op without a pending task.
    pub fn commit_task(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        self.undo_stack.push(self.work_items.clone());
        self.redo_stack.clear();

        let mut next = Vec::with_capacity(self.work_items.len());
        for (index, item) in self.work_items.drain(..).enumerate() {
            if self.visible[index] {
                next.push(item);
            }
        }
        if task.kind == TaskKind::Union {
            next.push(Arc::new(task.item));
        }
        debug!(
            regions = next.len(),
            kind = ?task.kind,
            "task committed"
        );
        self.work_items = next;
        self.visible = vec![true; self.work_items.len()];
    }

    /// Undo the latest committed task. Cancels any pending task first; a
    /// pending task is not part of history. No-op on an empty undo stack.
    pub fn undo(&mut self) {
        let Some(previous) = self.undo_stack.pop() else {
            return;
        };
        self.cancel_task();
        let current = std::mem::replace(&mut self.work_items, previous);
        self.redo_stack.push(current);
        self.visible = vec![true; self.work_items.len()];
    }

    /// Redo the latest undone task. No-op on an empty redo stack.
    pub fn redo(&mut self) {
        let Some(next) = self.redo_stack.pop() else {
            return;
        };
        self.cancel_task();
        let current = std::mem::replace(&mut self.work_items, next);
        self.undo_stack.push(current);
        self.visible = vec![true; self.work_items.len()];
    }

    /// Abort the session without writing anything to the document.
    ///
    /// All regions created during the session are dropped; returns the
    /// shapes whose visibility the host must restore.
    pub fn discard(self) -> Vec<ShapeId> {
        self.hidden
    }

    /// Terminal operation: materialize the final working set.
    ///
    /// Regions that are selected are committed; when none are selected every
    /// region is committed unless `only_selected` restricts it. Image-derived
    /// regions become clip references instead of flattened paths. With
    /// `replace`, consumed source shapes are scheduled for deletion (reused
    /// images excepted).
    pub fn commit(self, only_selected: bool, replace: bool) -> Commit {
        // nothing was done: leave the document alone
        if !self.has_changes() {
            return Commit {
                restore: self.hidden,
                ..Default::default()
            };
        }

        let any_selected = self.work_items.iter().any(|item| item.selected());
        let mut outputs = Vec::new();
        let mut reused_images = Vec::new();
        for item in self.work_items.iter() {
            if !item.selected() && (any_selected || only_selected) {
                continue;
            }
            let output = match (item.is_image(), item.item()) {
                (true, Some(image)) => {
                    if !reused_images.contains(&image) {
                        reused_images.push(image);
                    }
                    Output::ClippedImage {
                        clip: item.paths().clone(),
                        image,
                        style: item.style().clone(),
                        root: item.root(),
                    }
                }
                _ => Output::Path {
                    paths: item.paths().clone(),
                    style: item.style().clone(),
                    root: item.root(),
                },
            };
            outputs.push(output);
        }

        let delete = if replace {
            self.hidden
                .iter()
                .copied()
                .filter(|id| !reused_images.contains(id))
                .collect()
        } else {
            Vec::new()
        };
        debug!(
            outputs = outputs.len(),
            deleted = delete.len(),
            "session committed to document"
        );
        Commit {
            outputs,
            delete,
            reused_images,
            restore: self.hidden,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FillRule, Scalar, assert_approx_eq, extract::Element};

    fn path_element(id: u64, d: &str) -> Element {
        Element::Path {
            id: ShapeId(id),
            path: d.parse().unwrap(),
            fill_rule: FillRule::NonZero,
            style: Style::new(format!("fill:#{:06x}", id)),
        }
    }

    /// two overlapping 2x2 squares, the canonical three-region mosaic
    fn two_squares() -> Vec<Element> {
        vec![
            path_element(1, "M0,0 L2,0 L2,2 L0,2 Z"),
            path_element(2, "M1,1 L3,1 L3,3 L1,3 Z"),
        ]
    }

    fn total_area(builder: &BooleanBuilder) -> Scalar {
        builder
            .work_items()
            .iter()
            .map(|item| item.paths().area().abs())
            .sum()
    }

    #[test]
    fn test_session_start() {
        let builder = BooleanBuilder::new(&two_squares(), BuildMode::Fracture);
        assert!(builder.has_items());
        assert!(builder.has_intersections());
        assert!(!builder.has_task());
        assert!(!builder.has_changes());
        assert_eq!(builder.work_items().len(), 3);
        assert_approx_eq!(total_area(&builder), 7.0, 1e-3);
        assert_eq!(builder.hidden_shapes(), &[ShapeId(1), ShapeId(2)]);
    }

    #[test]
    fn test_no_intersections_flag() {
        let disjoint = vec![
            path_element(1, "M0,0 L1,0 L1,1 L0,1 Z"),
            path_element(2, "M5,5 L6,5 L6,6 L5,6 Z"),
        ];
        let builder = BooleanBuilder::new(&disjoint, BuildMode::Fracture);
        assert!(builder.has_items());
        assert!(!builder.has_intersections());
    }

    #[test]
    fn test_union_task_round_trip() {
        let mut builder = BooleanBuilder::new(&two_squares(), BuildMode::Fracture);

        // seed with the overlap cell, extend with the A-only cell
        assert!(builder.select_task((1.5, 1.5), TaskKind::Union));
        assert!(builder.has_task());
        // a second select is refused until the task is resolved
        assert!(!builder.select_task((0.5, 0.5), TaskKind::Union));
        assert!(builder.extend_task((0.5, 0.5)));
        // already-consumed regions cannot be extended with
        assert!(!builder.extend_task((1.5, 1.5)));

        builder.commit_task();
        assert!(!builder.has_task());
        assert!(builder.has_changes());
        assert_eq!(builder.work_items().len(), 2);
        assert_approx_eq!(total_area(&builder), 7.0, 1e-3);
        // the merged region is selected and spans both cells
        let merged = builder
            .work_items()
            .iter()
            .find(|item| item.selected())
            .expect("merged region exists");
        assert_approx_eq!(merged.paths().area().abs(), 4.0, 1e-3);
        assert!(merged.items().contains(&ShapeId(1)));

        // undo reproduces the exact pre-task state
        builder.undo();
        assert_eq!(builder.work_items().len(), 3);
        assert_approx_eq!(total_area(&builder), 7.0, 1e-3);
        assert!(!builder.has_changes());

        // redo; undo and redo() / undo() are inverses on the working set
        builder.redo();
        assert_eq!(builder.work_items().len(), 2);
        builder.undo();
        builder.redo();
        assert_eq!(builder.work_items().len(), 2);
        assert_approx_eq!(total_area(&builder), 7.0, 1e-3);
    }

    #[test]
    fn test_delete_task() {
        let mut builder = BooleanBuilder::new(&two_squares(), BuildMode::Fracture);
        assert!(builder.select_task((1.5, 1.5), TaskKind::Delete));
        builder.commit_task();
        assert_eq!(builder.work_items().len(), 2);
        assert_approx_eq!(total_area(&builder), 6.0, 1e-3);
    }

    #[test]
    fn test_cancel_task() {
        let mut builder = BooleanBuilder::new(&two_squares(), BuildMode::Fracture);
        assert!(builder.select_task((1.5, 1.5), TaskKind::Union));
        builder.cancel_task();
        assert!(!builder.has_task());
        assert!((0..builder.work_items().len()).all(|index| builder.is_visible(index)));
        // cancelling again is harmless
        builder.cancel_task();
        // the working set is untouched
        assert_eq!(builder.work_items().len(), 3);
    }

    #[test]
    fn test_select_misses() {
        let mut builder = BooleanBuilder::new(&two_squares(), BuildMode::Fracture);
        assert!(!builder.select_task((100.0, 100.0), TaskKind::Union));
        assert!(!builder.has_task());
        assert!(!builder.extend_task((1.5, 1.5)));
    }

    #[test]
    fn test_undo_empty_is_noop() {
        let mut builder = BooleanBuilder::new(&two_squares(), BuildMode::Fracture);
        builder.undo();
        builder.redo();
        assert_eq!(builder.work_items().len(), 3);
    }

    #[test]
    fn test_undo_discards_pending_task() {
        let mut builder = BooleanBuilder::new(&two_squares(), BuildMode::Fracture);
        assert!(builder.select_task((1.5, 1.5), TaskKind::Union));
        builder.commit_task();
        assert!(builder.select_task((0.5, 0.5), TaskKind::Union));
        builder.undo();
        // the uncommitted task is gone, not part of history
        assert!(!builder.has_task());
        assert_eq!(builder.work_items().len(), 3);
    }

    #[test]
    fn test_commit_selected_only() {
        let mut builder = BooleanBuilder::new(&two_squares(), BuildMode::Fracture);
        assert!(builder.select_task((1.5, 1.5), TaskKind::Union));
        assert!(builder.extend_task((0.5, 0.5)));
        builder.commit_task();

        let commit = builder.commit(false, true);
        // only the selected merged region is materialized
        assert_eq!(commit.outputs.len(), 1);
        match &commit.outputs[0] {
            Output::Path { paths, style, root } => {
                assert_approx_eq!(paths.area().abs(), 4.0, 1e-3);
                assert_eq!(style.as_str(), "fill:#000001");
                assert_eq!(*root, Some(ShapeId(1)));
            }
            other => panic!("unexpected output {:?}", other),
        }
        // both source shapes were consumed
        assert_eq!(commit.delete, vec![ShapeId(1), ShapeId(2)]);
        assert_eq!(commit.restore, vec![ShapeId(1), ShapeId(2)]);
    }

    #[test]
    fn test_commit_all_when_none_selected() {
        let mut builder = BooleanBuilder::new(&two_squares(), BuildMode::Fracture);
        // delete the overlap, leaving two unselected regions
        assert!(builder.select_task((1.5, 1.5), TaskKind::Delete));
        builder.commit_task();

        let commit = builder.commit(false, false);
        assert_eq!(commit.outputs.len(), 2);
        // without replace nothing is deleted
        assert!(commit.delete.is_empty());
    }

    #[test]
    fn test_commit_without_changes_is_noop() {
        let builder = BooleanBuilder::new(&two_squares(), BuildMode::Fracture);
        let commit = builder.commit(false, true);
        assert!(commit.outputs.is_empty());
        assert!(commit.delete.is_empty());
        assert_eq!(commit.restore, vec![ShapeId(1), ShapeId(2)]);
    }

    #[test]
    fn test_commit_clipped_image() {
        let elements = vec![
            path_element(1, "M0,0 L2,0 L2,2 L0,2 Z"),
            Element::Image {
                id: ShapeId(7),
                clip: "M1,1 L3,1 L3,3 L1,3 Z".parse().unwrap(),
                style: Style::default(),
            },
        ];
        let mut builder = BooleanBuilder::new(&elements, BuildMode::Fracture);
        // delete the path-only cell so the session has changes
        assert!(builder.select_task((0.5, 0.5), TaskKind::Delete));
        builder.commit_task();

        let commit = builder.commit(false, true);
        let clipped: Vec<_> = commit
            .outputs
            .iter()
            .filter(|output| matches!(output, Output::ClippedImage { .. }))
            .collect();
        assert!(!clipped.is_empty());
        assert_eq!(commit.reused_images, vec![ShapeId(7)]);
        // the reused image survives deletion
        assert!(!commit.delete.contains(&ShapeId(7)));
        assert!(commit.delete.contains(&ShapeId(1)));
    }

    #[test]
    fn test_discard() {
        let mut builder = BooleanBuilder::new(&two_squares(), BuildMode::Fracture);
        assert!(builder.select_task((1.5, 1.5), TaskKind::Union));
        builder.commit_task();
        let restore = builder.discard();
        assert_eq!(restore, vec![ShapeId(1), ShapeId(2)]);
    }

    #[test]
    fn test_flatten_mode() {
        let mut builder = BooleanBuilder::new(&two_squares(), BuildMode::Flatten);
        assert_eq!(builder.work_items().len(), 2);
        assert!(builder.has_intersections());
        // the topmost shape's region covers the overlap
        assert!(builder.select_task((1.5, 1.5), TaskKind::Union));
        let preview = builder.task_preview().expect("task pending");
        assert_approx_eq!(preview.paths().area().abs(), 4.0, 1e-3);
    }
}
