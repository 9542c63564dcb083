//! End-to-end checks of the broadcasting front-end.

use approx::assert_relative_eq;
use ndstride::{CompareOp, ErrorKind, SliceSpec, StridedArray, StridedError, UnaryOp};
use proptest::prelude::*;

fn iota(shape: &[usize]) -> StridedArray<f64> {
    let mut n = 0.0;
    StridedArray::from_fn_row_major(shape, |_| {
        n += 1.0;
        n
    })
}

#[test]
fn test_add_matches_explicit_broadcast() {
    let a = iota(&[2, 3, 4]);
    let b = iota(&[3, 4]);

    let implicit = ndstride::add(&a.view(), &b.view()).unwrap();

    let b_full = b.view().broadcast_to(&[2, 3, 4]).unwrap();
    let mut explicit = StridedArray::<f64>::row_major(&[2, 3, 4]);
    ndstride::ops::add_into(&mut explicit.view_mut(), &a.view(), &b_full).unwrap();

    assert_eq!(implicit.shape(), &[2, 3, 4]);
    assert_eq!(implicit.to_vec(), explicit.to_vec());
    assert_eq!(implicit.get(&[1, 2, 3]), 24.0 + 12.0);
}

#[test]
fn test_operands_of_any_layout() {
    let a = iota(&[4, 5]);
    let t = a.view().transpose();
    let rev = a
        .view()
        .slice(&[SliceSpec::Full, SliceSpec::range_step(4, 0, -1)])
        .unwrap();

    let sum = ndstride::add(&rev, &a.view()).unwrap();
    for i in 0..4 {
        for j in 0..5 {
            assert_eq!(sum.get(&[i, j]), a.get(&[i, 4 - j]) + a.get(&[i, j]));
        }
    }

    let prod = ndstride::mul(&t, &t).unwrap();
    assert_eq!(prod.shape(), &[5, 4]);
    assert_eq!(prod.get(&[3, 1]), a.get(&[1, 3]) * a.get(&[1, 3]));
}

#[test]
fn test_integer_remainder_and_division_by_zero() {
    let a = StridedArray::from_vec(vec![7i32, -7, 7, -7], &[4]).unwrap();
    let b = StridedArray::from_vec(vec![3i32, 3, -3, -3], &[4]).unwrap();
    let r = ndstride::rem(&a.view(), &b.view()).unwrap();
    assert_eq!(r.to_vec(), vec![1, -1, 1, -1]);

    let zero = StridedArray::from_vec(vec![0i32], &[1]).unwrap();
    let err = ndstride::div(&a.view(), &zero.view()).unwrap_err();
    assert_eq!(err, StridedError::DivisionByZero);
    assert_eq!(err.kind(), ErrorKind::Arithmetic);
}

#[test]
fn test_unary_compare_and_scalar() {
    let a = StridedArray::from_vec(vec![1.0f64, 4.0, 9.0], &[3]).unwrap();
    let r = ndstride::map_unary(UnaryOp::Sqrt, &a.view()).unwrap();
    let halves = ndstride::binary_scalar(ndstride::BinaryOp::Div, &r.view(), 2.0).unwrap();
    for (got, want) in halves.iter().zip([0.5, 1.0, 1.5]) {
        assert_relative_eq!(got, want);
    }

    let m = ndstride::compare(CompareOp::Gt, &a.view(), &r.view()).unwrap();
    assert_eq!(m.to_vec(), vec![false, true, true]);

    let err = ndstride::map_unary(UnaryOp::Sqrt, &StridedArray::<i32>::row_major(&[2]).view())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
}

#[test]
fn test_reductions_over_views() {
    let a = StridedArray::from_vec(vec![3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0], &[2, 4]).unwrap();
    let t = a.view().transpose();

    assert_eq!(ndstride::max_axis(&t, 0).unwrap().to_vec(), vec![4.0, 9.0]);
    assert_eq!(ndstride::argmax_axis(&a.view(), 1).unwrap().to_vec(), vec![2, 1]);
    assert_eq!(ndstride::argmin_axis(&a.view(), 1).unwrap().to_vec(), vec![1, 2]);
    assert_eq!(ndstride::sum_axis(&t, 1).unwrap().to_vec(), vec![8.0, 10.0, 6.0, 7.0]);

    let empty = StridedArray::<f64>::row_major(&[3, 0]);
    assert!(matches!(
        ndstride::max_axis(&empty.view(), 1),
        Err(StridedError::EmptyReduction { .. })
    ));
    assert_eq!(ndstride::sum_axis(&empty.view(), 1).unwrap().to_vec(), vec![0.0; 3]);
}

#[test]
fn test_reshape_round_trips_through_copy() {
    let a = iota(&[3, 4]);
    let t = a.view().transpose();
    let flat = ndstride::reshape(&t, &[12]).unwrap();
    assert!(!flat.is_view());
    let back = ndstride::reshape(&flat.view(), &[4, 3]).unwrap();
    assert!(back.is_view());
    assert_eq!(back.view().to_vec(), t.to_vec());
}

proptest! {
    /// Broadcasting a size-1 axis gives the same result as repeating the data.
    #[test]
    fn prop_broadcast_equals_materialized(rows in 1usize..6, cols in 1usize..6) {
        let a = iota(&[rows, cols]);
        let col = iota(&[rows, 1]);
        let tiled = StridedArray::from_fn_row_major(&[rows, cols], |p| col.get(&[p[0], 0]));

        let broadcast = ndstride::sub(&a.view(), &col.view()).unwrap();
        let materialized = ndstride::sub(&a.view(), &tiled.view()).unwrap();
        prop_assert_eq!(broadcast.to_vec(), materialized.to_vec());
    }

    /// `to_contiguous` of any permutation yields a row-major copy with equal elements.
    #[test]
    fn prop_to_contiguous_preserves_elements(d0 in 1usize..5, d1 in 1usize..5, d2 in 1usize..5) {
        let a = iota(&[d0, d1, d2]);
        let p = a.view().permute(&[2, 0, 1]).unwrap();
        let c = ndstride::to_contiguous(&p).unwrap();
        prop_assert!(c.layout().is_row_major());
        prop_assert_eq!(c.to_vec(), p.to_vec());
    }
}
