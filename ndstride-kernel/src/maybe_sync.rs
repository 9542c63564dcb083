//! Thread-safety bounds that only bind when the `parallel` feature is on.
//!
//! Closures handed to the apply engine may run on rayon workers, so with
//! `parallel` they must be [`Sync`]. Without it they always run on the calling
//! thread and any closure is accepted.

#[cfg(feature = "parallel")]
mod imp {
    pub trait MaybeSync: Sync {}
    impl<T: Sync + ?Sized> MaybeSync for T {}

    pub trait MaybeSendSync: Send + Sync {}
    impl<T: Send + Sync + ?Sized> MaybeSendSync for T {}
}

#[cfg(not(feature = "parallel"))]
mod imp {
    pub trait MaybeSync {}
    impl<T: ?Sized> MaybeSync for T {}

    pub trait MaybeSendSync {}
    impl<T: ?Sized> MaybeSendSync for T {}
}

pub use imp::{MaybeSendSync, MaybeSync};

#[cfg(test)]
mod tests {
    use super::*;

    fn accepts_kernel<F: Fn(f64) -> f64 + MaybeSync>(f: F) -> f64 {
        f(2.0)
    }

    #[test]
    fn test_plain_closure_is_accepted() {
        let scale = 3.0;
        assert_eq!(accepts_kernel(move |x| x * scale), 6.0);
    }

    #[test]
    fn test_layouts_are_shareable() {
        fn check<T: MaybeSendSync>() {}
        check::<ndstride_view::Layout>();
        check::<f32>();
    }

    #[cfg(not(feature = "parallel"))]
    #[test]
    fn test_cell_closure_without_parallel() {
        let counter = std::cell::Cell::new(0);
        accepts_kernel(|x| {
            counter.set(counter.get() + 1);
            x
        });
        assert_eq!(counter.get(), 1);
    }
}
