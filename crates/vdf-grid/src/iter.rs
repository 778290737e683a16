//! Block-aware iteration over a grid's region of interest.
//!
//! Both iterators walk the region I-fastest, then J, then K, handing out
//! contiguous runs of each block row instead of locating every voxel.

use std::iter::FusedIterator;

use crate::blocks::BlockLayout;
use crate::regular::RegularGrid;

/// Read-only iterator over the region of a [`RegularGrid`].
///
/// Two iterators compare equal when they walk the same grid and sit at the
/// same position. Every exhausted iterator equals every other exhausted
/// iterator.
#[derive(Debug)]
pub struct Iter<'a, B> {
    grid: Option<&'a RegularGrid<B>>,
    pos: [usize; 3],
    run: &'a [f32],
    remaining: usize,
}

impl<'a, B: AsRef<[f32]>> Iter<'a, B> {
    pub(crate) fn new(grid: &'a RegularGrid<B>) -> Self {
        let dims = grid.dimensions();
        Self {
            grid: Some(grid),
            pos: [0; 3],
            run: &[],
            remaining: dims.iter().product(),
        }
    }

    /// The exhausted iterator.
    pub fn end() -> Self {
        Self {
            grid: None,
            pos: [0; 3],
            run: &[],
            remaining: 0,
        }
    }

    /// ROI-relative index of the next voxel, or `None` once exhausted.
    pub fn position(&self) -> Option<[usize; 3]> {
        (self.remaining > 0).then_some(self.pos)
    }

    /// User coordinates of the next voxel.
    pub fn user_coordinates(&self) -> Option<[f64; 3]> {
        let grid = self.grid?;
        let pos = self.position()?;
        grid.user_coordinates(pos[0], pos[1], pos[2]).ok()
    }

    fn load_run(&mut self, grid: &'a RegularGrid<B>) -> bool {
        let [i, j, k] = self.pos;
        match grid.layout().row_run(i, j, k) {
            Ok((block, offset, len)) => {
                self.run = &grid.block(block)[offset..offset + len];
                true
            }
            Err(_) => false,
        }
    }
}

impl<'a, B: AsRef<[f32]>> Iterator for Iter<'a, B> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.remaining == 0 {
            return None;
        }
        let grid = self.grid?;

        if self.run.is_empty() && !self.load_run(grid) {
            self.remaining = 0;
            return None;
        }

        let (&v, rest) = self.run.split_first()?;
        self.run = rest;
        self.remaining -= 1;
        advance(&mut self.pos, grid.dimensions());
        Some(v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<B: AsRef<[f32]>> ExactSizeIterator for Iter<'_, B> {}

impl<B: AsRef<[f32]>> FusedIterator for Iter<'_, B> {}

impl<B> Clone for Iter<'_, B> {
    fn clone(&self) -> Self {
        Self {
            grid: self.grid,
            pos: self.pos,
            run: self.run,
            remaining: self.remaining,
        }
    }
}

impl<B> PartialEq for Iter<'_, B> {
    fn eq(&self, other: &Self) -> bool {
        match (self.remaining, other.remaining) {
            (0, 0) => true,
            (0, _) | (_, 0) => false,
            _ => {
                let same_grid = match (self.grid, other.grid) {
                    (Some(a), Some(b)) => std::ptr::eq(a, b),
                    _ => false,
                };
                same_grid && self.pos == other.pos
            }
        }
    }
}

/// Mutable iterator over the region of a [`RegularGrid`].
///
/// Each block row is split off once up front, so every voxel is handed out
/// at most once.
#[derive(Debug)]
pub struct IterMut<'a> {
    layout: BlockLayout,
    rows: Vec<Option<&'a mut [f32]>>,
    pos: [usize; 3],
    run: &'a mut [f32],
    remaining: usize,
}

impl<'a> IterMut<'a> {
    pub(crate) fn new<B: AsMut<[f32]>>(layout: BlockLayout, blocks: &'a mut [B]) -> Self {
        let [bs0, bs1, bs2] = layout.block_size();
        let mut rows = Vec::with_capacity(blocks.len() * bs1 * bs2);
        for block in blocks.iter_mut() {
            let data: &'a mut [f32] = block.as_mut();
            rows.extend(data.chunks_mut(bs0).take(bs1 * bs2).map(Some));
        }

        Self {
            layout,
            rows,
            pos: [0; 3],
            run: Default::default(),
            remaining: layout.dims().iter().product(),
        }
    }

    /// ROI-relative index of the next voxel, or `None` once exhausted.
    pub fn position(&self) -> Option<[usize; 3]> {
        (self.remaining > 0).then_some(self.pos)
    }

    fn load_run(&mut self) -> bool {
        let [i, j, k] = self.pos;
        let Ok((block, offset, len)) = self.layout.row_run(i, j, k) else {
            return false;
        };

        let [bs0, bs1, bs2] = self.layout.block_size();
        let row = block * bs1 * bs2 + offset / bs0;
        let Some(data) = self.rows.get_mut(row).and_then(Option::take) else {
            return false;
        };

        let start = offset % bs0;
        let (_, tail) = data.split_at_mut(start);
        let (run, _) = tail.split_at_mut(len);
        self.run = run;
        true
    }
}

impl<'a> Iterator for IterMut<'a> {
    type Item = &'a mut f32;

    fn next(&mut self) -> Option<&'a mut f32> {
        if self.remaining == 0 {
            return None;
        }

        if self.run.is_empty() && !self.load_run() {
            self.remaining = 0;
            return None;
        }

        let run = std::mem::take(&mut self.run);
        let (v, rest) = run.split_first_mut()?;
        self.run = rest;
        self.remaining -= 1;
        advance(&mut self.pos, self.layout.dims());
        Some(v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for IterMut<'_> {}

impl FusedIterator for IterMut<'_> {}

/// Step an I-fastest position forward by one voxel.
fn advance(pos: &mut [usize; 3], dims: [usize; 3]) {
    pos[0] += 1;
    if pos[0] < dims[0] {
        return;
    }
    pos[0] = 0;
    pos[1] += 1;
    if pos[1] < dims[1] {
        return;
    }
    pos[1] = 0;
    pos[2] += 1;
}
