//! Zero-copy reshape.

use crate::layout::{row_major_strides, Layout};
use crate::{Result, StridedError};

fn invalid(from: &[usize], to: &[isize], reason: &'static str) -> StridedError {
    StridedError::InvalidReshape {
        from: from.to_vec(),
        to: to.to_vec(),
        reason,
    }
}

/// Resolve a requested shape against `total` elements. At most one entry may
/// be `-1`, which is replaced by whatever size makes the counts agree.
pub(crate) fn resolve_shape(from: &[usize], total: usize, to: &[isize]) -> Result<Vec<usize>> {
    let mut inferred = None;
    let mut known = 1usize;
    for (i, &d) in to.iter().enumerate() {
        match d {
            -1 => {
                if inferred.replace(i).is_some() {
                    return Err(invalid(from, to, "only one dimension can be inferred"));
                }
            }
            d if d < 0 => return Err(invalid(from, to, "negative dimension")),
            d => {
                known = known
                    .checked_mul(d as usize)
                    .ok_or_else(|| invalid(from, to, "element count mismatch"))?
            }
        }
    }

    let mut shape: Vec<usize> = to.iter().map(|&d| d.max(0) as usize).collect();
    match inferred {
        Some(i) => {
            if known == 0 || total % known != 0 {
                return Err(invalid(from, to, "cannot infer dimension"));
            }
            shape[i] = total / known;
        }
        None if known != total => {
            return Err(invalid(from, to, "element count mismatch"));
        }
        None => {}
    }
    Ok(shape)
}

/// Strides for `new_dims` that walk the same elements as `(dims, strides)` in
/// row-major order, or `None` if some merged group of source axes is not
/// contiguous.
fn nocopy_strides(dims: &[usize], strides: &[isize], new_dims: &[usize]) -> Option<Vec<isize>> {
    // size-1 axes carry no information about the memory walk
    let (old_dims, old_strides): (Vec<usize>, Vec<isize>) = dims
        .iter()
        .zip(strides.iter())
        .filter(|(d, _)| **d != 1)
        .map(|(&d, &s)| (d, s))
        .unzip();

    let old_nd = old_dims.len();
    let new_nd = new_dims.len();
    let mut new_strides = vec![0isize; new_nd];

    let (mut oi, mut oj) = (0usize, 1usize);
    let (mut ni, mut nj) = (0usize, 1usize);
    while ni < new_nd && oi < old_nd {
        let mut np = new_dims[ni];
        let mut op = old_dims[oi];
        while np != op {
            if np < op {
                np *= new_dims[nj];
                nj += 1;
            } else {
                op *= old_dims[oj];
                oj += 1;
            }
        }

        for ok in oi..oj - 1 {
            if old_strides[ok] != old_dims[ok + 1] as isize * old_strides[ok + 1] {
                return None;
            }
        }

        new_strides[nj - 1] = old_strides[oj - 1];
        for nk in (ni + 1..nj).rev() {
            new_strides[nk - 1] = new_strides[nk] * new_dims[nk] as isize;
        }

        ni = nj;
        nj += 1;
        oi = oj;
        oj += 1;
    }

    let last_stride = if ni >= 1 { new_strides[ni - 1] } else { 1 };
    for s in &mut new_strides[ni..] {
        *s = last_stride;
    }
    Some(new_strides)
}

impl Layout {
    /// Reinterpret the layout with a new shape without moving any data.
    ///
    /// `new_shape` may contain a single `-1`, inferred from the element count.
    /// Returns `Ok(None)` when the row-major walk of `self` cannot be expressed
    /// with strides over `new_shape`; the caller must copy in that case.
    pub fn try_reshape(&self, new_shape: &[isize]) -> Result<Option<Layout>> {
        let total = self.len();
        let dims = resolve_shape(self.shape(), total, new_shape)?;

        if total == 0 {
            let strides = row_major_strides(&dims);
            return Ok(Some(Layout::from_parts(dims, strides, self.offset())));
        }

        Ok(nocopy_strides(self.shape(), self.strides(), &dims)
            .map(|strides| Layout::from_parts(dims, strides, self.offset())))
    }

    /// Like [`Layout::try_reshape`], but a required copy is an error.
    pub fn reshape_view(&self, new_shape: &[isize]) -> Result<Layout> {
        match self.try_reshape(new_shape)? {
            Some(layout) => Ok(layout),
            None => Err(StridedError::ReshapeNeedsCopy {
                from: self.shape().to_vec(),
                to: resolve_shape(self.shape(), self.len(), new_shape)?,
            }),
        }
    }
}
