/// Switchable rayon/sequential iteration.
///
/// With the `parallel` feature on, rayon's parallel iterators are
/// re-exported directly. With it off, a minimal sequential shim exposes
/// the same `into_par_iter()` entry point backed by `into_iter()`, so
/// call sites compile unchanged either way. Batch assessment leans on
/// the swap being observationally pure: regions are scored
/// independently and collected in input order, so `assess_batch`
/// returns bit-identical summaries with the feature on or off.
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Sequential replacement for `rayon::prelude::IntoParallelIterator`.
    ///
    /// Resolves `into_par_iter()` to `into_iter()`; the rest of the
    /// chain (`.map()`, `.collect()`, ...) then uses plain `Iterator`
    /// methods.
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
