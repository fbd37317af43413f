//! Grid of equally sized cells

use alloc::vec::Vec;
use core::cell::Cell;

use crate::binding::ReactiveProperty;
use crate::error::{LayoutResult, PropertyResult};
use crate::geometry::{Rect, Size};
use crate::ui::context::LayoutContext;
use crate::ui::element::{Affects, ChildSlot, Element, ElementBase, ElementId};

/// Lays children out row by row in cells of identical size.
///
/// `rows` and `columns` of zero mean "derive from the visible child count":
/// with both zero the grid is square (`ceil(sqrt(n))`), with one zero the
/// other is the ceiling division. Hidden children reserve no cell.
pub struct UniformGrid {
    children: Vec<ElementId>,
    rows: ReactiveProperty<u32>,
    columns: ReactiveProperty<u32>,
    first_column: ReactiveProperty<u32>,
    actual_rows: Cell<u32>,
    actual_columns: Cell<u32>,
}

impl Default for UniformGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformGrid {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            rows: ReactiveProperty::new("rows", 0),
            columns: ReactiveProperty::new("columns", 0),
            first_column: ReactiveProperty::new("first_column", 0),
            actual_rows: Cell::new(0),
            actual_columns: Cell::new(0),
        }
    }

    pub fn with_rows(self, rows: u32) -> Self {
        self.rows.set(rows);
        self
    }

    pub fn with_columns(self, columns: u32) -> Self {
        self.columns.set(columns);
        self
    }

    pub fn with_first_column(self, first_column: u32) -> Self {
        self.first_column.set(first_column);
        self
    }

    pub fn rows(&self) -> &ReactiveProperty<u32> {
        &self.rows
    }

    pub fn columns(&self) -> &ReactiveProperty<u32> {
        &self.columns
    }

    /// Empty cells before the first child on the first row.
    pub fn first_column(&self) -> &ReactiveProperty<u32> {
        &self.first_column
    }

    /// Row count used by the last measure.
    pub fn actual_rows(&self) -> u32 {
        self.actual_rows.get()
    }

    /// Column count used by the last measure.
    pub fn actual_columns(&self) -> u32 {
        self.actual_columns.get()
    }

    fn update_rows_and_columns(&self, cx: &LayoutContext<'_>) {
        let mut rows = self.rows.get();
        let mut columns = self.columns.get();

        if self.first_column.get() >= columns {
            self.first_column.set_if_changed(0);
        }

        let count = self.first_column.get()
            + self
                .children
                .iter()
                .filter(|&&child| cx.is_visible(child))
                .count() as u32;

        match (rows, columns) {
            (0, 0) => {
                rows = ceil_sqrt(count);
                columns = rows;
            }
            (0, fixed) => rows = count.div_ceil(fixed),
            (fixed, 0) => columns = count.div_ceil(fixed),
            _ => {}
        }

        self.actual_rows.set(rows);
        self.actual_columns.set(columns);
    }

    fn cell_counts(&self) -> (f32, f32) {
        (
            self.actual_rows.get().max(1) as f32,
            self.actual_columns.get().max(1) as f32,
        )
    }
}

/// Smallest `r` with `r * r >= n`.
fn ceil_sqrt(n: u32) -> u32 {
    let mut root = 0u32;
    while root.saturating_mul(root) < n {
        root += 1;
    }
    root
}

impl Element for UniformGrid {
    fn bind(&mut self, base: &ElementBase) -> PropertyResult<()> {
        base.register(&self.rows, Affects::Measure)?;
        base.register(&self.columns, Affects::Measure)?;
        base.register(&self.first_column, Affects::Measure)
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }

    fn child_at(&self, index: usize) -> Option<ElementId> {
        self.children.get(index).copied()
    }

    fn child_slot(&mut self) -> Option<ChildSlot<'_>> {
        Some(ChildSlot::Many(&mut self.children))
    }

    fn measure_override(&mut self, cx: &mut LayoutContext<'_>, available: Size) -> LayoutResult<Size> {
        self.update_rows_and_columns(cx);
        let (rows, columns) = self.cell_counts();
        let cell = Size::new(available.width / columns, available.height / rows);

        let mut max_width = 0.0f32;
        let mut max_height = 0.0f32;
        for &child in &self.children {
            cx.measure(child, cell)?;
            let desired = cx.desired_size(child);
            max_width = max_width.max(desired.width);
            max_height = max_height.max(desired.height);
        }

        Ok(Size::new(max_width * columns, max_height * rows))
    }

    fn arrange_override(&mut self, cx: &mut LayoutContext<'_>, final_size: Size) -> LayoutResult<Size> {
        let (rows, columns) = self.cell_counts();
        let width = final_size.width / columns;
        let height = final_size.height / rows;
        let wrap = self.actual_columns.get().max(1);

        let mut x = self.first_column.get();
        let mut y = 0u32;
        for &child in &self.children {
            if !cx.is_visible(child) {
                continue;
            }
            cx.arrange(
                child,
                Rect::new(x as f32 * width, y as f32 * height, width, height),
            )?;
            x += 1;
            if x >= wrap {
                x = 0;
                y += 1;
            }
        }

        Ok(final_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout_manager::{LayoutManager, MAX_LAYOUT_PASSES};
    use crate::ui::ElementTree;
    use crate::ui::layouts::Panel;

    fn grid(grid: UniformGrid, count: usize) -> (ElementTree, ElementId, Vec<ElementId>) {
        let mut tree = ElementTree::new();
        let root = tree.insert(grid).unwrap();
        let children: Vec<_> = (0..count)
            .map(|_| tree.insert(Panel::new()).unwrap())
            .collect();
        tree.set_children(root, children.clone()).unwrap();
        LayoutManager::new(&mut tree, root, MAX_LAYOUT_PASSES).unwrap();
        (tree, root, children)
    }

    #[test]
    fn ceil_sqrt_matches_small_squares() {
        assert_eq!(ceil_sqrt(0), 0);
        assert_eq!(ceil_sqrt(1), 1);
        assert_eq!(ceil_sqrt(4), 2);
        assert_eq!(ceil_sqrt(5), 3);
        assert_eq!(ceil_sqrt(10), 4);
    }

    #[test]
    fn auto_grid_is_square() {
        let (mut tree, root, _) = grid(UniformGrid::new(), 5);
        tree.measure(root, Size::new(90.0, 90.0)).unwrap();

        let grid = tree.get::<UniformGrid>(root).unwrap();
        assert_eq!((grid.actual_rows(), grid.actual_columns()), (3, 3));
    }

    #[test]
    fn fixed_columns_derive_rows() {
        let (mut tree, root, children) = grid(UniformGrid::new().with_columns(2), 5);
        tree.arrange(root, Rect::new(0.0, 0.0, 100.0, 90.0)).unwrap();

        let grid = tree.get::<UniformGrid>(root).unwrap();
        assert_eq!((grid.actual_rows(), grid.actual_columns()), (3, 2));
        assert_eq!(
            tree.base(children[3]).unwrap().bounds(),
            Rect::new(50.0, 30.0, 50.0, 30.0)
        );
    }

    #[test]
    fn hidden_children_reserve_no_cell() {
        let (mut tree, root, children) = grid(UniformGrid::new().with_columns(2), 3);
        tree.base(children[0]).unwrap().visible().set(false);
        tree.arrange(root, Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();

        let grid = tree.get::<UniformGrid>(root).unwrap();
        assert_eq!(grid.actual_rows(), 1);
        assert_eq!(tree.base(children[1]).unwrap().bounds(), Rect::new(0.0, 0.0, 50.0, 100.0));
        assert_eq!(tree.base(children[2]).unwrap().bounds(), Rect::new(50.0, 0.0, 50.0, 100.0));
    }

    #[test]
    fn first_column_offsets_first_row() {
        let (mut tree, root, children) = grid(
            UniformGrid::new().with_columns(3).with_first_column(2),
            2,
        );
        tree.arrange(root, Rect::new(0.0, 0.0, 90.0, 60.0)).unwrap();

        assert_eq!(tree.get::<UniformGrid>(root).unwrap().actual_rows(), 2);
        assert_eq!(tree.base(children[0]).unwrap().bounds(), Rect::new(60.0, 0.0, 30.0, 30.0));
        assert_eq!(tree.base(children[1]).unwrap().bounds(), Rect::new(0.0, 30.0, 30.0, 30.0));
    }

    #[test]
    fn first_column_that_does_not_fit_resets() {
        let (mut tree, root, _) = grid(
            UniformGrid::new().with_columns(2).with_first_column(5),
            2,
        );
        tree.measure(root, Size::new(10.0, 10.0)).unwrap();
        assert_eq!(tree.get::<UniformGrid>(root).unwrap().first_column().get(), 0);
    }
}
