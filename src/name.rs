/// Types that expose a display name.
pub trait HasName {
    fn get_name(&self) -> &str;
}

/// Types numbered within their kind (`"LDU 3"` has index 3).
pub trait HasIndex {
    fn get_index(&self) -> u32;
}

// Delegate to references so slices of borrowed items can be sorted in place
impl<T: HasName + ?Sized> HasName for &T {
    fn get_name(&self) -> &str {
        (*self).get_name()
    }
}
impl<T: HasIndex + ?Sized> HasIndex for &T {
    fn get_index(&self) -> u32 {
        (*self).get_index()
    }
}

/// Sorting helpers for slices of `T: HasIndex`.
pub trait SortByIndex {
    /// Stable, ascending sort by `get_index()`.
    fn sort_by_index(&mut self);
}

impl<T: HasIndex> SortByIndex for [T] {
    fn sort_by_index(&mut self) {
        self.sort_by_key(|a| a.get_index());
    }
}
