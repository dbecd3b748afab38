//! Closed enumerations with stable wire labels.
//!
//! Every status, type and method field in the registrar is drawn from a fixed
//! set of lowercase labels. `labelled_enum!` generates the enum together with
//! its label table so that parsing, serialization and storage all agree on the
//! same spelling. Calling crates must depend on `serde`.

/// Declare a closed enumeration with one wire label per variant.
///
/// Generates `ALL`, `as_str`, `parse`, `expected` and `Display`, plus serde
/// derives that use the labels.
#[macro_export]
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant ),+
        }

        impl $name {
            /// Every member of the enumeration, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Exact, case-sensitive label lookup.
            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($label => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Human-readable list of accepted labels (for error messages).
            pub fn expected() -> String {
                Self::ALL
                    .iter()
                    .map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}
