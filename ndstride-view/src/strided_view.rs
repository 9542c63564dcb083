//! Views pairing a [`Layout`] with a borrowed buffer, and the owning array.

use crate::layout::Layout;
use crate::position::PositionIter;
use crate::slice::SliceSpec;
use crate::{Result, StridedError};

// ============================================================================
// StridedView
// ============================================================================

/// Read-only strided view over a borrowed buffer.
///
/// Layout addresses index `data` directly; the constructor checks that every
/// address a valid position can produce lies inside `data`.
pub struct StridedView<'a, T> {
    data: &'a [T],
    layout: Layout,
}

impl<T> Clone for StridedView<'_, T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data,
            layout: self.layout.clone(),
        }
    }
}

impl<T> std::fmt::Debug for StridedView<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StridedView")
            .field("shape", &self.layout.shape())
            .field("strides", &self.layout.strides())
            .field("offset", &self.layout.offset())
            .finish()
    }
}

impl<'a, T> StridedView<'a, T> {
    /// Create a view, validating `layout` against `data`.
    pub fn new(data: &'a [T], layout: Layout) -> Result<Self> {
        layout.validate_bounds(data.len())?;
        Ok(Self { data, layout })
    }

    /// Row-major view of a whole slice.
    pub fn from_slice(data: &'a [T], shape: &[usize]) -> Result<Self> {
        let layout = Layout::row_major(shape);
        if layout.len() != data.len() {
            return Err(StridedError::ShapeMismatch(vec![data.len()], shape.to_vec()));
        }
        Ok(Self { data, layout })
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    #[inline]
    pub fn offset(&self) -> isize {
        self.layout.offset()
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    /// The whole underlying buffer.
    #[inline]
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    /// Base pointer of the buffer; layout addresses are relative to it.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    /// Same buffer, different layout.
    pub fn with_layout(&self, layout: Layout) -> Result<Self> {
        Self::new(self.data, layout)
    }

    pub fn permute(&self, perm: &[usize]) -> Result<Self> {
        self.with_layout(self.layout.permute(perm)?)
    }

    pub fn transpose(&self) -> Self {
        Self {
            data: self.data,
            layout: self.layout.transpose(),
        }
    }

    pub fn swap_axes(&self, ax1: usize, ax2: usize) -> Result<Self> {
        self.with_layout(self.layout.swap_axes(ax1, ax2)?)
    }

    pub fn slice(&self, specs: &[SliceSpec]) -> Result<Self> {
        self.with_layout(self.layout.slice(specs)?)
    }

    pub fn diagonal(&self, ax1: usize, ax2: usize) -> Result<Self> {
        self.with_layout(self.layout.diagonal(ax1, ax2)?)
    }

    pub fn broadcast_to(&self, shape: &[usize]) -> Result<Self> {
        self.with_layout(self.layout.broadcast_to(shape)?)
    }

    /// Zero-copy reshape; `Ok(None)` when the data would have to move.
    pub fn try_reshape(&self, shape: &[isize]) -> Result<Option<Self>> {
        self.layout
            .try_reshape(shape)?
            .map(|layout| self.with_layout(layout))
            .transpose()
    }

    /// Zero-copy reshape that fails with a `Reshape` error instead of copying.
    pub fn reshape(&self, shape: &[isize]) -> Result<Self> {
        self.with_layout(self.layout.reshape_view(shape)?)
    }

    /// Walk the addresses of this view in row-major order.
    pub fn addresses(&self) -> PositionIter {
        PositionIter::full(&self.layout)
    }
}

impl<'a, T: Copy> StridedView<'a, T> {
    /// Element at `pos`.
    ///
    /// # Panics
    /// Panics if `pos` has the wrong length or an index is out of range.
    pub fn get(&self, pos: &[usize]) -> T {
        match self.layout.checked_address(pos) {
            Ok(addr) => self.data[addr as usize],
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_get(&self, pos: &[usize]) -> Result<T> {
        let addr = self.layout.checked_address(pos)?;
        Ok(self.data[addr as usize])
    }

    /// Elements in row-major visiting order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = T> + 'a {
        let data = self.data;
        PositionIter::full(&self.layout).map(move |addr| data[addr as usize])
    }

    /// Copy the elements out in row-major order.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

// ============================================================================
// StridedViewMut
// ============================================================================

/// Mutable strided view over a borrowed buffer.
pub struct StridedViewMut<'a, T> {
    data: &'a mut [T],
    layout: Layout,
}

impl<T> std::fmt::Debug for StridedViewMut<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StridedViewMut")
            .field("shape", &self.layout.shape())
            .field("strides", &self.layout.strides())
            .field("offset", &self.layout.offset())
            .finish()
    }
}

impl<'a, T> StridedViewMut<'a, T> {
    /// Create a mutable view, validating `layout` against `data`.
    pub fn new(data: &'a mut [T], layout: Layout) -> Result<Self> {
        layout.validate_bounds(data.len())?;
        Ok(Self { data, layout })
    }

    /// Row-major view of a whole slice.
    pub fn from_slice(data: &'a mut [T], shape: &[usize]) -> Result<Self> {
        let layout = Layout::row_major(shape);
        if layout.len() != data.len() {
            return Err(StridedError::ShapeMismatch(vec![data.len()], shape.to_vec()));
        }
        Ok(Self { data, layout })
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    /// Base pointer of the buffer; layout addresses are relative to it.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr()
    }

    /// Reborrow as an immutable view.
    pub fn as_view(&self) -> StridedView<'_, T> {
        StridedView {
            data: &*self.data,
            layout: self.layout.clone(),
        }
    }

    /// Reborrow mutably for a shorter lifetime.
    pub fn reborrow(&mut self) -> StridedViewMut<'_, T> {
        StridedViewMut {
            data: &mut *self.data,
            layout: self.layout.clone(),
        }
    }

    /// Same buffer, different layout.
    pub fn with_layout(self, layout: Layout) -> Result<Self> {
        Self::new(self.data, layout)
    }

    pub fn permute(self, perm: &[usize]) -> Result<Self> {
        let layout = self.layout.permute(perm)?;
        self.with_layout(layout)
    }

    pub fn transpose(self) -> Self {
        let layout = self.layout.transpose();
        Self {
            data: self.data,
            layout,
        }
    }

    pub fn slice(self, specs: &[SliceSpec]) -> Result<Self> {
        let layout = self.layout.slice(specs)?;
        self.with_layout(layout)
    }

    pub fn diagonal(self, ax1: usize, ax2: usize) -> Result<Self> {
        let layout = self.layout.diagonal(ax1, ax2)?;
        self.with_layout(layout)
    }

    /// Zero-copy reshape that fails with a `Reshape` error instead of copying.
    pub fn reshape(self, shape: &[isize]) -> Result<Self> {
        let layout = self.layout.reshape_view(shape)?;
        self.with_layout(layout)
    }
}

impl<'a, T: Copy> StridedViewMut<'a, T> {
    /// Element at `pos`.
    ///
    /// # Panics
    /// Panics if `pos` has the wrong length or an index is out of range.
    pub fn get(&self, pos: &[usize]) -> T {
        match self.layout.checked_address(pos) {
            Ok(addr) => self.data[addr as usize],
            Err(err) => panic!("{err}"),
        }
    }

    /// Overwrite the element at `pos`.
    ///
    /// # Panics
    /// Panics if `pos` has the wrong length or an index is out of range.
    pub fn set(&mut self, pos: &[usize], value: T) {
        match self.layout.checked_address(pos) {
            Ok(addr) => self.data[addr as usize] = value,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_set(&mut self, pos: &[usize], value: T) -> Result<()> {
        let addr = self.layout.checked_address(pos)?;
        self.data[addr as usize] = value;
        Ok(())
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.as_view().to_vec()
    }
}

// ============================================================================
// StridedArray
// ============================================================================

/// Owned buffer plus layout.
#[derive(Clone)]
pub struct StridedArray<T> {
    data: Vec<T>,
    layout: Layout,
}

impl<T> std::fmt::Debug for StridedArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StridedArray")
            .field("shape", &self.layout.shape())
            .field("strides", &self.layout.strides())
            .field("offset", &self.layout.offset())
            .finish()
    }
}

impl<T: Clone> StridedArray<T> {
    /// Row-major array with every element set to `value`.
    pub fn full(shape: &[usize], value: T) -> Self {
        let layout = Layout::row_major(shape);
        Self {
            data: vec![value; layout.len()],
            layout,
        }
    }
}

impl<T: Clone + Default> StridedArray<T> {
    /// Row-major (C order) array filled with `T::default()`.
    pub fn row_major(shape: &[usize]) -> Self {
        Self::full(shape, T::default())
    }

    /// Column-major (Fortran order) array filled with `T::default()`.
    pub fn col_major(shape: &[usize]) -> Self {
        let layout = Layout::col_major(shape);
        Self {
            data: vec![T::default(); layout.len()],
            layout,
        }
    }
}

impl<T> StridedArray<T> {
    /// Row-major array whose elements are produced by `f(pos)`, called in
    /// row-major order.
    pub fn from_fn_row_major(shape: &[usize], mut f: impl FnMut(&[usize]) -> T) -> Self {
        let layout = Layout::row_major(shape);
        let total = layout.len();
        let rank = shape.len();
        let mut data = Vec::with_capacity(total);
        let mut idx = vec![0usize; rank];
        for _ in 0..total {
            data.push(f(&idx));
            for d in (0..rank).rev() {
                idx[d] += 1;
                if idx[d] < shape[d] {
                    break;
                }
                idx[d] = 0;
            }
        }
        Self { data, layout }
    }

    /// Interpret `data` as a row-major array of `shape`.
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self> {
        let layout = Layout::row_major(shape);
        if layout.len() != data.len() {
            return Err(StridedError::ShapeMismatch(vec![data.len()], shape.to_vec()));
        }
        Ok(Self { data, layout })
    }

    /// Build from a buffer and an arbitrary layout.
    pub fn from_parts(data: Vec<T>, layout: Layout) -> Result<Self> {
        layout.validate_bounds(data.len())?;
        Ok(Self { data, layout })
    }

    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    #[inline]
    pub fn strides(&self) -> &[isize] {
        self.layout.strides()
    }

    #[inline]
    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    /// Raw buffer, in storage order.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_parts(self) -> (Vec<T>, Layout) {
        (self.data, self.layout)
    }

    pub fn view(&self) -> StridedView<'_, T> {
        StridedView {
            data: &self.data,
            layout: self.layout.clone(),
        }
    }

    pub fn view_mut(&mut self) -> StridedViewMut<'_, T> {
        StridedViewMut {
            data: &mut self.data,
            layout: self.layout.clone(),
        }
    }
}

impl<T: Copy> StridedArray<T> {
    /// Element at `pos`.
    ///
    /// # Panics
    /// Panics if `pos` has the wrong length or an index is out of range.
    pub fn get(&self, pos: &[usize]) -> T {
        self.view().get(pos)
    }

    /// Overwrite the element at `pos`.
    ///
    /// # Panics
    /// Panics if `pos` has the wrong length or an index is out of range.
    pub fn set(&mut self, pos: &[usize], value: T) {
        self.view_mut().set(pos, value)
    }

    /// Elements in row-major visiting order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = T> + '_ {
        self.view().iter()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.view().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> StridedArray<i32> {
        StridedArray::from_vec(vec![1, 2, 3, 4, 5, 6], &[2, 3]).unwrap()
    }

    #[test]
    fn test_view_rejects_out_of_bounds_layout() {
        let data = [0i32; 6];
        assert!(StridedView::new(&data, Layout::row_major(&[2, 3])).is_ok());
        assert_eq!(
            StridedView::new(&data, Layout::row_major(&[2, 4])).unwrap_err(),
            StridedError::OutOfBounds { index: 7, len: 6 }
        );
        assert!(StridedView::new(&data, Layout::new(&[3], &[2], 1).unwrap()).is_ok());
    }

    #[test]
    fn test_from_vec_length_mismatch() {
        assert_eq!(
            StridedArray::from_vec(vec![1, 2, 3], &[2, 2]).unwrap_err(),
            StridedError::ShapeMismatch(vec![3], vec![2, 2])
        );
    }

    #[test]
    fn test_slice_index_then_range() {
        let a = grid();
        let v = a
            .view()
            .slice(&[SliceSpec::Index(1), SliceSpec::range(0, 1)])
            .unwrap();
        assert_eq!(v.rank(), 1);
        assert_eq!(v.to_vec(), vec![4, 5]);
    }

    #[test]
    fn test_transpose_visits_columns() {
        let a = grid();
        assert_eq!(a.view().transpose().to_vec(), vec![1, 4, 2, 5, 3, 6]);
        assert_eq!(a.view().transpose().get(&[2, 1]), 6);
    }

    #[test]
    fn test_broadcast_repeats() {
        let a = StridedArray::from_vec(vec![1, 2, 3], &[3]).unwrap();
        let b = a.view().broadcast_to(&[2, 3]).unwrap();
        assert_eq!(b.to_vec(), vec![1, 2, 3, 1, 2, 3]);
    }

    #[test]
    fn test_diagonal() {
        let a = StridedArray::from_fn_row_major(&[3, 3], |p| (p[0] * 3 + p[1]) as i32);
        assert_eq!(a.view().diagonal(0, 1).unwrap().to_vec(), vec![0, 4, 8]);
    }

    #[test]
    fn test_reshape_views() {
        let a = grid();
        let r = a.view().reshape(&[3, 2]).unwrap();
        assert_eq!(r.get(&[2, 0]), 5);
        let t = a.view().transpose();
        assert!(t.try_reshape(&[6]).unwrap().is_none());
        assert!(t.reshape(&[6]).is_err());
    }

    #[test]
    fn test_view_mut_set_through_slice() {
        let mut a = grid();
        {
            let mut col = a
                .view_mut()
                .slice(&[SliceSpec::Full, SliceSpec::Index(2)])
                .unwrap();
            col.set(&[0], 30);
            col.set(&[1], 60);
        }
        assert_eq!(a.to_vec(), vec![1, 2, 30, 4, 5, 60]);
    }

    #[test]
    fn test_reborrow_and_as_view() {
        let mut a = grid();
        let mut v = a.view_mut();
        v.reborrow().set(&[0, 0], 10);
        assert_eq!(v.as_view().get(&[0, 0]), 10);
        assert_eq!(v.to_vec()[0], 10);
    }

    #[test]
    fn test_try_get_and_try_set() {
        let mut a = grid();
        assert_eq!(a.view().try_get(&[1, 2]), Ok(6));
        assert!(a.view().try_get(&[2, 0]).is_err());
        assert!(a.view_mut().try_set(&[0, 3], 1).is_err());
    }

    #[test]
    #[should_panic]
    fn test_get_out_of_range_panics() {
        grid().get(&[0, 3]);
    }

    #[test]
    fn test_col_major_storage() {
        let mut a = StridedArray::<f64>::col_major(&[2, 2]);
        a.set(&[0, 1], 1.5);
        assert_eq!(a.data(), &[0.0, 0.0, 1.5, 0.0]);
        assert_eq!(a.to_vec(), vec![0.0, 1.5, 0.0, 0.0]);
    }

    #[test]
    fn test_rank_zero() {
        let a = StridedArray::full(&[], 7u8);
        assert_eq!(a.len(), 1);
        assert_eq!(a.get(&[]), 7);
        assert_eq!(a.iter().count(), 1);
    }
}
