//! Defines assertion helpers for integration tests returning `eyre::Result`

// Re-exported so the macros resolve `eyre` from the caller's crate
#[doc(hidden)]
pub use eyre;

/// Assert that a boolean value is true, return an error otherwise
#[macro_export]
macro_rules! assert_true_result {
    ($x:expr) => {
        if $x {
            Ok(())
        } else {
            Err($crate::assertions::eyre::eyre!("Expected `{} == true`, got `false`", stringify!($x)))
        }
    };
}

/// Assert that two values are equal, return an error otherwise
#[macro_export]
macro_rules! assert_eq_result {
    ($x:expr, $y:expr) => {
        if $x == $y {
            Ok(())
        } else {
            Err($crate::assertions::eyre::eyre!(
                "Expected `{} == {}`, got `{:?} == {:?}`",
                stringify!($x),
                stringify!($y),
                $x,
                $y
            ))
        }
    };
}
