/// Declare a byte-valued wire enumeration with a static description table.
///
/// Values outside the table decode to `Unknown(u8)`, so a record carrying a
/// value this library has never seen still decodes and re-encodes losslessly.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:literal => $desc:literal,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
            /// Value not listed in the protocol tables
            Unknown(u8),
        }

        impl $name {
            /// Raw wire value
            pub fn value(self) -> u8 {
                match self {
                    $( Self::$variant => $value, )+
                    Self::Unknown(value) => value,
                }
            }

            /// Human readable description
            pub fn description(self) -> &'static str {
                match self {
                    $( Self::$variant => $desc, )+
                    Self::Unknown(_) => "Unknown/unsupported",
                }
            }

            /// Check if the value is listed in the protocol tables
            pub fn is_known(self) -> bool {
                !matches!(self, Self::Unknown(_))
            }
        }

        impl From<u8> for $name {
            fn from(value: u8) -> Self {
                match value {
                    $( $value => Self::$variant, )+
                    other => Self::Unknown(other),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value.value()
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{} ({})", self.description(), self.value())
            }
        }
    };
}
