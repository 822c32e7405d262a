/// Implements the standard arithmetic operator traits for single-field newtypes.
///
/// * `binary`: `T op T -> T`
/// * `inplace`: `T op= T`
/// * `unary`: `op T -> T`
/// * `scalar`: `T op S -> T`, where `S` is the type of the wrapped field
#[macro_export]
macro_rules! op {
    (binary $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait for $for_struct {
            type Output = Self;

            fn $impl_fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$impl_fn(rhs.0))
            }
        }
    };

    (inplace $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait for $for_struct {
            fn $impl_fn(&mut self, rhs: Self) {
                self.0.$impl_fn(rhs.0)
            }
        }
    };

    (scalar $for_struct:ident, $scalar:ty, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait<$scalar> for $for_struct {
            type Output = Self;

            fn $impl_fn(self, rhs: $scalar) -> Self::Output {
                Self(self.0.$impl_fn(rhs))
            }
        }
    };

    (unary $for_struct:ident, $impl_trait:ident, $impl_fn:ident) => {
        impl $impl_trait for $for_struct {
            type Output = Self;

            fn $impl_fn(self) -> Self::Output {
                Self(self.0.$impl_fn())
            }
        }
    };
}
