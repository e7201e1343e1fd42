/// Declares a status-like enum persisted as its variant name in a text column.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::error::Error;

            fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
                let raw = raw.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(raw))
                    .ok_or_else(|| {
                        crate::error::Error::bad_request(
                            "INVALID_VALUE",
                            format!(
                                "'{}' is not a valid {}; expected one of: {}",
                                raw,
                                stringify!($name),
                                $name::ALL
                                    .iter()
                                    .map(|v| v.as_str())
                                    .collect::<Vec<_>>()
                                    .join(", ")
                            ),
                        )
                    })
            }
        }
    };
}

pub mod candidate;
pub mod employer;
pub mod job_application;
pub mod job_posting;
pub mod notification;
pub mod saved_job;
pub mod user;
