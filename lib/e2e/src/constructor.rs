use alloy::primitives::{Address, U256};

/// Constructor data passed to `cargo stylus deploy`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Constructor {
    /// Constructor signature, e.g. `constructor(address,uint256)`.
    pub signature: String,
    /// Constructor arguments, stringified the way `cargo stylus` parses them.
    pub args: Vec<String>,
}

impl Constructor {
    /// Builds a constructor from `(abi type, value)` pairs.
    #[must_use]
    pub fn from_parts(parts: Vec<(&'static str, String)>) -> Self {
        let (types, args): (Vec<_>, Vec<_>) = parts.into_iter().unzip();
        Self { signature: format!("constructor({})", types.join(",")), args }
    }
}

/// A value that can be passed as a constructor argument.
pub trait ConstructorArg {
    /// Solidity type name of the argument.
    const ABI_TYPE: &'static str;

    /// Stringify the value.
    fn to_arg(&self) -> String;
}

macro_rules! impl_constructor_arg {
    ($($ty:ty => $abi:literal),* $(,)?) => {$(
        impl ConstructorArg for $ty {
            const ABI_TYPE: &'static str = $abi;

            fn to_arg(&self) -> String {
                self.to_string()
            }
        }
    )*};
}

impl_constructor_arg!(
    U256 => "uint256",
    u64 => "uint64",
    u16 => "uint16",
    u8 => "uint8",
    bool => "bool",
    String => "string",
    Address => "address",
);

/// Builds a [`Constructor`] from its arguments.
///
/// ```rust,ignore
/// let ctr = constructor!(token, U256::from(rate));
/// assert_eq!(ctr.signature, "constructor(address,uint256)");
/// ```
#[macro_export]
macro_rules! constructor {
    () => {{
        $crate::Constructor {
            signature: "constructor()".to_string(),
            args: vec![],
        }
    }};

    ($first:expr $(, $rest:expr)* $(,)?) => {{
        fn abi_type<T: $crate::ConstructorArg>(_: &T) -> &'static str {
            T::ABI_TYPE
        }

        let params = [abi_type(&$first) $(, abi_type(&$rest))*].join(",");
        let args = vec![
            $crate::ConstructorArg::to_arg(&$first)
            $(, $crate::ConstructorArg::to_arg(&$rest))*
        ];

        $crate::Constructor {
            signature: format!("constructor({params})"),
            args,
        }
    }};
}
