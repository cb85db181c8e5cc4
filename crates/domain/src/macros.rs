//! Macro for implementing Display and FromStr for phase/status enums
//!
//! # Example
//!
//! ```rust
//! use mdrkit_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum ProbeState {
//!     Idle,
//!     Running,
//! }
//!
//! impl_domain_status_conversions!(ProbeState {
//!     Idle => "idle",
//!     Running => "running",
//! });
//!
//! assert_eq!(ProbeState::Running.to_string(), "running");
//! assert_eq!("IDLE".parse::<ProbeState>(), Ok(ProbeState::Idle));
//! ```

/// Implements Display and FromStr traits for unit-variant enums
///
/// Display writes the mapped string; FromStr parses it case-insensitively and
/// reports the enum name on failure.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Resolution {
        FalsePositive,
        TruePositive,
    }

    impl_domain_status_conversions!(Resolution {
        FalsePositive => "false_positive",
        TruePositive => "true_positive",
    });

    #[test]
    fn display_uses_mapped_string() {
        assert_eq!(Resolution::FalsePositive.to_string(), "false_positive");
        assert_eq!(Resolution::TruePositive.to_string(), "true_positive");
    }

    #[test]
    fn parsing_ignores_case() {
        assert_eq!(Resolution::from_str("FALSE_POSITIVE").unwrap(), Resolution::FalsePositive);
        assert_eq!(Resolution::from_str("True_Positive").unwrap(), Resolution::TruePositive);
    }

    #[test]
    fn parsing_unknown_value_names_the_enum() {
        let err = Resolution::from_str("duplicate").unwrap_err();
        assert_eq!(err, "Invalid Resolution: duplicate");
        assert!(Resolution::from_str("").is_err());
    }
}
