//! Field selector macros.
//!
//! `select!` captures a closure-like selector as an [`Expr`] tree without
//! evaluating it, so the shape of the selector can be checked before a
//! query is built.
//!
//! [`Expr`]: crate::expr::Expr

/// Build a [`Selector`](crate::field::Selector) from `param => body`.
///
/// The body is parsed token by token:
///
/// - `w.A.B` becomes nested member accesses on the parameter `w`
/// - `w.A.len()` becomes a method call node
/// - `w.Tags[0]` becomes an index node
/// - `w.Price * 2` becomes a binary node
/// - a leading literal becomes a constant node
/// - a leading identifier other than `w` becomes a captured variable
///
/// Only the first form selects a field; the others are kept so that the
/// query builder can reject them with the offending text.
///
/// Without a type the selector accepts any [`KeyValue`] as a bound. A
/// leading `<K>` fixes the key type, so bounds must convert into `K`.
///
/// [`KeyValue`]: crate::value::KeyValue
///
/// # Examples
///
/// ```rust
/// use settee_query::{select, Selector};
///
/// struct Widget;
///
/// let price: Selector<Widget, i64> = select!(<i64> w => w.Price);
/// assert_eq!(price.expr().to_string(), "w.Price");
///
/// let nested: Selector<Widget> = select!(w => w.Owner.Name);
/// assert_eq!(nested.path().unwrap().to_string(), "Owner.Name");
/// ```
#[macro_export]
macro_rules! select {
    (<$key:ty> $param:ident => $($body:tt)+) => {
        $crate::field::Selector::<_, $key>::from_expr(
            $crate::__select_expr!(@start stringify!($param); $($body)+)
        )
    };
    ($param:ident => $($body:tt)+) => {
        $crate::field::Selector::<_, $crate::value::KeyValue>::from_expr(
            $crate::__select_expr!(@start stringify!($param); $($body)+)
        )
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __select_expr {
    (@start $param:expr; $root:ident $($rest:tt)*) => {
        $crate::__select_expr!(
            @chain $crate::expr::Expr::root($param, stringify!($root)); $($rest)*
        )
    };
    (@start $param:expr; $lit:literal $($rest:tt)*) => {
        $crate::__select_expr!(
            @chain $crate::expr::Expr::constant(stringify!($lit)); $($rest)*
        )
    };
    (@start $param:expr; $($other:tt)+) => {
        $crate::expr::Expr::opaque(stringify!($($other)+))
    };

    (@chain $acc:expr;) => {
        $acc
    };
    (@chain $acc:expr; . $method:ident ( $($args:tt)* ) $($rest:tt)*) => {
        $crate::__select_expr!(
            @chain $crate::expr::Expr::call($acc, stringify!($method), stringify!($($args)*));
            $($rest)*
        )
    };
    (@chain $acc:expr; . $name:ident $($rest:tt)*) => {
        $crate::__select_expr!(
            @chain $crate::expr::Expr::member($acc, stringify!($name)); $($rest)*
        )
    };
    (@chain $acc:expr; [ $($index:tt)* ] $($rest:tt)*) => {
        $crate::__select_expr!(
            @chain $crate::expr::Expr::index($acc, stringify!($($index)*)); $($rest)*
        )
    };
    (@chain $acc:expr; $op:tt $($rhs:tt)+) => {
        $crate::expr::Expr::binary($acc, stringify!($op), stringify!($($rhs)+))
    };
    (@chain $acc:expr; $($other:tt)+) => {
        $crate::expr::Expr::opaque(format!("{}{}", $acc, stringify!($($other)+)))
    };
}
