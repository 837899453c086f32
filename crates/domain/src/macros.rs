//! Macro for implementing string conversions on selector enums
//!
//! Configuration selectors (`loader_type`, `driver_type`) are written as
//! lowercase strings in config files and on the command line. This macro
//! gives each selector a single table of `variant => "name"` pairs from which
//! `as_str`, `Display` and `FromStr` are generated.
//!
//! # Example
//!
//! ```rust
//! use bulkload_domain::impl_selector_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Flavour {
//!     Plain,
//!     Secure,
//! }
//!
//! impl_selector_conversions!(Flavour {
//!     Plain => "plain",
//!     Secure => "secure",
//! });
//!
//! assert_eq!("SECURE".parse::<Flavour>().unwrap(), Flavour::Secure);
//! assert_eq!(Flavour::Plain.to_string(), "plain");
//! ```

/// Implements `as_str`, `Display` and `FromStr` for selector enums
///
/// Parsing trims surrounding whitespace and ignores case. Unknown names fail
/// with [`BulkLoadError::Config`](crate::BulkLoadError::Config) listing the
/// accepted values.
#[macro_export]
macro_rules! impl_selector_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl $enum_name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::BulkLoadError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    other => Err($crate::BulkLoadError::Config(format!(
                        "Invalid {}: '{}' (expected one of: {})",
                        stringify!($enum_name),
                        other,
                        [$($str),+].join(", ")
                    ))),
                }
            }
        }
    };
}
