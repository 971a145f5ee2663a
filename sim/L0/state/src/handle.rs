//! Typed, opaque slot handles.
//!
//! A handle is an index into one of the state's slot arenas plus the value
//! type stored there. Handles are handed out at allocation time and are the
//! only way to reach a slot, so an element that keeps its handles private
//! owns its slots.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

macro_rules! slot_handle {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        pub struct $name<T> {
            index: usize,
            marker: PhantomData<fn() -> T>,
        }

        impl<T> $name<T> {
            pub(crate) const fn new(index: usize) -> Self {
                Self {
                    index,
                    marker: PhantomData,
                }
            }

            /// Arena index of the slot.
            #[must_use]
            pub const fn index(&self) -> usize {
                self.index
            }
        }

        // Manual impls: derives would demand the same bounds on `T`.
        impl<T> Clone for $name<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> Copy for $name<T> {}

        impl<T> PartialEq for $name<T> {
            fn eq(&self, other: &Self) -> bool {
                self.index == other.index
            }
        }

        impl<T> Eq for $name<T> {}

        impl<T> Hash for $name<T> {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.index.hash(state);
            }
        }

        impl<T> fmt::Debug for $name<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(
                    f,
                    concat!($label, "<{}>({})"),
                    std::any::type_name::<T>(),
                    self.index
                )
            }
        }
    };
}

slot_handle!(
    /// Handle to a user-settable variable slot holding a `T`.
    VariableHandle,
    "VariableHandle"
);

slot_handle!(
    /// Handle to a derived cache slot holding a `T`.
    CacheHandle,
    "CacheHandle"
);
