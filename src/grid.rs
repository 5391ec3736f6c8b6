//! Nodata-aware numeric grid
//!
//! A `Grid` is a rectangular buffer of `f64` values paired with a same-shaped
//! mask where `true` marks a missing/invalid cell. Every operator in the crate
//! produces and consumes grids; the value stored under a masked cell is never
//! observed by downstream arithmetic or statistics.
//!
//! Elementwise combinators take the nodata rule explicitly (`MaskRule`) so an
//! operator that overrides the default OR-of-masks has to say so.

use anyhow::{bail, Result};
use smallvec::SmallVec;
use std::fmt;
use thiserror::Error;

/// Two grids combined elementwise had different shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("grid shape {left:?} does not match {right:?}")]
pub struct ShapeMismatch {
    pub left: (usize, usize),
    pub right: (usize, usize),
}

/// How the output mask of an elementwise combination is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskRule {
    /// Output cell is masked if any input cell is masked
    Union,
    /// Output mask is the left operand's mask, unchanged
    KeepLeft,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
    mask: Vec<bool>,
}

impl Grid {
    /// Build a grid with an all-valid mask
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self> {
        let mask = vec![false; values.len()];
        Self::with_mask(rows, cols, values, mask)
    }

    /// Build a grid with an explicit nodata mask
    pub fn with_mask(rows: usize, cols: usize, values: Vec<f64>, mask: Vec<bool>) -> Result<Self> {
        if values.len() != rows * cols {
            bail!(
                "Grid of {}x{} needs {} values, got {}",
                rows, cols, rows * cols, values.len()
            );
        }
        if mask.len() != values.len() {
            bail!("Mask length {} does not match {} values", mask.len(), values.len());
        }
        Ok(Self { rows, cols, values, mask })
    }

    /// Single-row grid, handy for tests and scalar-like layers
    pub fn from_row(values: Vec<f64>) -> Self {
        let cols = values.len();
        Self {
            rows: 1,
            cols,
            mask: vec![false; cols],
            values,
        }
    }

    /// Build from nested rows; every row must have the same length
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, |r| r.len());
        if rows.iter().any(|r| r.len() != n_cols) {
            bail!("Ragged rows: every row must have {} columns", n_cols);
        }
        Self::new(n_rows, n_cols, rows.into_iter().flatten().collect())
    }

    /// Grid of one constant value with the given mask
    pub fn filled(rows: usize, cols: usize, value: f64, mask: Vec<bool>) -> Result<Self> {
        Self::with_mask(rows, cols, vec![value; rows * cols], mask)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn is_masked(&self, idx: usize) -> bool {
        self.mask[idx]
    }

    /// Value at `idx`, or None when the cell is masked
    pub fn get(&self, idx: usize) -> Option<f64> {
        if self.mask[idx] {
            None
        } else {
            Some(self.values[idx])
        }
    }

    /// Iterator over unmasked values only
    pub fn valid_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values
            .iter()
            .zip(&self.mask)
            .filter(|(_, &m)| !m)
            .map(|(&v, _)| v)
    }

    pub fn count_valid(&self) -> usize {
        self.mask.iter().filter(|&&m| !m).count()
    }

    fn check_shape(&self, other: &Grid) -> Result<(), ShapeMismatch> {
        if self.shape() != other.shape() {
            return Err(ShapeMismatch {
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(())
    }

    /// Apply `f` to every cell, keeping the mask
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Grid {
        Grid {
            rows: self.rows,
            cols: self.cols,
            values: self.values.iter().map(|&v| f(v)).collect(),
            mask: self.mask.clone(),
        }
    }

    /// Combine two grids cell by cell
    pub fn zip_with(
        &self,
        other: &Grid,
        rule: MaskRule,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Grid, ShapeMismatch> {
        self.check_shape(other)?;

        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(&a, &b)| f(a, b))
            .collect();
        let mask = match rule {
            MaskRule::Union => self
                .mask
                .iter()
                .zip(&other.mask)
                .map(|(&a, &b)| a || b)
                .collect(),
            MaskRule::KeepLeft => self.mask.clone(),
        };

        Ok(Grid {
            rows: self.rows,
            cols: self.cols,
            values,
            mask,
        })
    }

    /// Mask additional cells where `pred(value)` holds
    pub fn mask_where(&mut self, pred: impl Fn(f64) -> bool) {
        for (v, m) in self.values.iter().zip(self.mask.iter_mut()) {
            if pred(*v) {
                *m = true;
            }
        }
    }

    /// Replace the nodata mask, keeping the values
    pub fn replace_mask(&mut self, mask: &[bool]) -> Result<(), ShapeMismatch> {
        if mask.len() != self.mask.len() {
            return Err(ShapeMismatch {
                left: self.shape(),
                right: (1, mask.len()),
            });
        }
        self.mask.copy_from_slice(mask);
        Ok(())
    }

    /// Clamp every unmasked cell into `[lo, hi]`
    pub fn clamp_unmasked(&mut self, lo: f64, hi: f64) {
        for (v, &m) in self.values.iter_mut().zip(&self.mask) {
            if m {
                continue;
            }
            if *v < lo {
                *v = lo;
            } else if *v > hi {
                *v = hi;
            }
        }
    }

    /// Minimum over unmasked cells
    pub fn min(&self) -> Option<f64> {
        self.valid_values().fold(None, |acc, v| match acc {
            Some(m) if m <= v => Some(m),
            _ => Some(v),
        })
    }

    /// Maximum over unmasked cells
    pub fn max(&self) -> Option<f64> {
        self.valid_values().fold(None, |acc, v| match acc {
            Some(m) if m >= v => Some(m),
            _ => Some(v),
        })
    }

    /// Mean over unmasked cells
    pub fn mean(&self) -> Option<f64> {
        let n = self.count_valid();
        if n == 0 {
            return None;
        }
        Some(self.valid_values().sum::<f64>() / n as f64)
    }

    /// Population standard deviation (ddof = 0) over unmasked cells
    pub fn std(&self) -> Option<f64> {
        let mean = self.mean()?;
        let n = self.count_valid() as f64;
        let var = self.valid_values().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(var.sqrt())
    }
}

/// Per-cell ascending stacks of several grids
///
/// Built from N same-shaped grids. The mask is the OR of every input mask, so
/// a cell missing in one layer is missing in all of them.
#[derive(Debug, Clone)]
pub struct SortedStack {
    rows: usize,
    cols: usize,
    cells: Vec<SmallVec<[f64; 8]>>,
    mask: Vec<bool>,
}

impl SortedStack {
    pub fn build(layers: &[&Grid]) -> Result<Self, ShapeMismatch> {
        let first = match layers.first() {
            Some(g) => *g,
            None => {
                return Ok(Self {
                    rows: 0,
                    cols: 0,
                    cells: Vec::new(),
                    mask: Vec::new(),
                })
            }
        };
        for layer in &layers[1..] {
            first.check_shape(layer)?;
        }

        let n = first.len();
        let mut cells = Vec::with_capacity(n);
        let mut mask = Vec::with_capacity(n);
        for idx in 0..n {
            let mut stack: SmallVec<[f64; 8]> = layers.iter().map(|g| g.values[idx]).collect();
            stack.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            cells.push(stack);
            mask.push(layers.iter().any(|g| g.mask[idx]));
        }

        Ok(Self {
            rows: first.rows,
            cols: first.cols,
            cells,
            mask,
        })
    }

    pub fn depth(&self) -> usize {
        self.cells.first().map_or(0, |c| c.len())
    }

    /// Reduce each ascending stack to one value; masked cells keep their mask
    pub fn reduce(&self, f: impl Fn(&[f64]) -> f64) -> Grid {
        Grid {
            rows: self.rows,
            cols: self.cols,
            values: self.cells.iter().map(|c| f(c.as_slice())).collect(),
            mask: self.mask.clone(),
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for r in 0..self.rows {
            if r > 0 {
                write!(f, "\n ")?;
            }
            write!(f, "[")?;
            for c in 0..self.cols {
                if c > 0 {
                    write!(f, " ")?;
                }
                let idx = r * self.cols + c;
                match self.get(idx) {
                    Some(v) => write!(f, "{:?}", v)?,
                    None => write!(f, "--")?,
                }
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn masked(values: Vec<f64>, mask: Vec<bool>) -> Grid {
        let n = values.len();
        Grid::with_mask(1, n, values, mask).unwrap()
    }

    #[test]
    fn test_zip_union_mask() {
        let a = masked(vec![1.0, 2.0, 3.0], vec![true, false, false]);
        let b = masked(vec![1.0, 2.0, 3.0], vec![false, false, true]);
        let sum = a.zip_with(&b, MaskRule::Union, |x, y| x + y).unwrap();
        assert_eq!(sum.mask(), &[true, false, true]);
        assert_eq!(sum.get(1), Some(4.0));
    }

    #[test]
    fn test_zip_keep_left_mask() {
        let a = masked(vec![1.0, 2.0], vec![false, false]);
        let b = masked(vec![1.0, 2.0], vec![true, true]);
        let out = a.zip_with(&b, MaskRule::KeepLeft, |x, _| x).unwrap();
        assert_eq!(out.mask(), &[false, false]);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = Grid::from_row(vec![1.0, 2.0]);
        let b = Grid::from_row(vec![1.0, 2.0, 3.0]);
        let err = a.zip_with(&b, MaskRule::Union, |x, y| x + y).unwrap_err();
        assert_eq!(err.left, (1, 2));
        assert_eq!(err.right, (1, 3));
    }

    #[test]
    fn test_statistics_ignore_masked_cells() {
        let g = masked(vec![-100.0, 2.0, 4.0, 100.0], vec![true, false, false, true]);
        assert_eq!(g.min(), Some(2.0));
        assert_eq!(g.max(), Some(4.0));
        assert_relative_eq!(g.mean().unwrap(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(g.std().unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_statistics_all_masked() {
        let g = masked(vec![1.0, 2.0], vec![true, true]);
        assert_eq!(g.min(), None);
        assert_eq!(g.mean(), None);
        assert_eq!(g.std(), None);
    }

    #[test]
    fn test_clamp_skips_masked() {
        let mut g = masked(vec![-3.0, 0.5, 3.0], vec![false, false, true]);
        g.clamp_unmasked(-1.0, 1.0);
        assert_eq!(g.values(), &[-1.0, 0.5, 3.0]);
    }

    #[test]
    fn test_sorted_stack_union_mask() {
        let a = masked(vec![0.5, -1.0], vec![false, false]);
        let b = masked(vec![-0.5, 1.0], vec![false, true]);
        let stack = SortedStack::build(&[&a, &b]).unwrap();
        assert_eq!(stack.depth(), 2);
        let top = stack.reduce(|s| s[s.len() - 1]);
        assert_eq!(top.get(0), Some(0.5));
        assert_eq!(top.get(1), None);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert!(Grid::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).is_err());
        let g = Grid::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(g.shape(), (2, 2));
    }

    #[test]
    fn test_display_marks_nodata() {
        let g = Grid::with_mask(2, 2, vec![1.0, 2.5, 3.0, 4.0], vec![false, true, false, false]).unwrap();
        assert_eq!(g.to_string(), "[[1.0 --]\n [3.0 4.0]]");
    }
}
