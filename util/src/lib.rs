//! Defines one-off utility functions used throughout the adapter
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

#[cfg(feature = "digest")]
pub mod digest;
pub mod logging;

/// Expands a given error type to wrap a stringified version of a given error
///
/// To be used in a map_err() call
#[macro_export]
macro_rules! err_str {
    ($x:expr) => {
        |e| $x(e.to_string())
    };
}

#[cfg(test)]
mod test {
    /// A stand-in error type for the macro test
    #[derive(Debug, PartialEq)]
    struct WrappedError(String);

    /// Tests that `err_str!` stringifies the inner error
    #[test]
    fn test_err_str() {
        let res: Result<u8, _> = "not-a-number".parse::<u8>().map_err(err_str!(WrappedError));
        let err = res.unwrap_err();
        assert_eq!(err, WrappedError("invalid digit found in string".to_string()));
    }
}
