//! Operator kinds carried by `NodeKind::Binary` and `NodeKind::Unary`.
//!
//! Each operator is declared once with its source symbol; the symbol is what
//! fault messages quote (`unsupported operand types for -: ...`).

use std::fmt;

macro_rules! operator_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $symbol:literal,)+ }) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub const fn as_symbol(self) -> &'static str {
                match self {
                    $($name::$variant => $symbol,)+
                }
            }

            /// Inverse of [`Self::as_symbol`].
            pub fn from_symbol(symbol: &str) -> Option<Self> {
                match symbol {
                    $($symbol => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_symbol())
            }
        }
    };
}

operator_enum! {
    BinaryOp {
        Add => "+",
        Sub => "-",
        Mul => "*",
        Div => "/",
        Mod => "%",
        Eq => "==",
        NotEq => "!=",
        Lt => "<",
        LtEq => "<=",
        Gt => ">",
        GtEq => ">=",
        And => "&&",
        Or => "||",
    }
}

operator_enum! {
    UnaryOp {
        Neg => "-",
        Not => "!",
    }
}

impl BinaryOp {
    /// `&&` and `||` evaluate their right operand only when needed.
    pub const fn is_short_circuit(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq
        )
    }
}
