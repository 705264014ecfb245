use smallvec::SmallVec;

/// Most mesh entities touch at most a handful of neighbors (a triangle has
/// 3 edges, a vertex in a typical floor-plan mesh has on the order of 6);
/// inline capacity of 4 avoids a heap allocation for the common case.
pub type SVec<T> = SmallVec<[T; 4]>;

/// Extension trait for `Option`.
///
/// NOTE: Functions use a final underscore to avoid colliding with stdlib
/// functions that will be stabilized in the future.
pub trait OptionExt<T> {
    fn as_option(&self) -> &Option<T>;
    fn is_some_and_(&self, f: impl FnOnce(&T) -> bool) -> bool {
        matches!(self.as_option(), Some(x) if f(x))
    }
}
impl<T> OptionExt<T> for Option<T> {
    fn as_option(&self) -> &Option<T> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_ext_predicates() {
        let some: Option<i32> = Some(4);
        assert!(some.is_some_and_(|x| *x == 4));
        assert!(!some.is_some_and_(|x| *x == 5));
    }
}
