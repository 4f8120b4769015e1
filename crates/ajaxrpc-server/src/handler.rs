//! Server Functions
//!
//! A [`Handler`] is the callable bound to a method name. It receives the
//! already validated arguments and returns a result value or a fault.
//!
//! [`Handler::from_fn`] adapts ordinary Rust closures with typed arguments:
//!
//! ```
//! use ajaxrpc_common::{Fault, Params, Value};
//! use ajaxrpc_server::Handler;
//!
//! let add = Handler::from_fn(|a: i64, b: i64| Ok::<_, Fault>(a + b));
//! let params = Params::new(vec![Value::Int(2), Value::Int(3)]);
//! assert_eq!(add.call(&params), Ok(Value::Int(5)));
//! ```

use std::fmt;
use std::sync::Arc;

use ajaxrpc_common::{Fault, FromValue, IntoValue, Params, Value};

type HandlerFn = dyn Fn(&Params) -> Result<Value, Fault> + Send + Sync;

/// Shared, thread-safe server function.
#[derive(Clone)]
pub struct Handler(Arc<HandlerFn>);

impl Handler {
    /// Wraps a function that works on raw values.
    pub fn raw<F>(f: F) -> Self
    where
        F: Fn(&Params) -> Result<Value, Fault> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Wraps a closure of up to six typed arguments.
    ///
    /// Arguments are decoded positionally; a decode failure or a wrong
    /// argument count yields a `TypeMismatch` fault naming the position.
    pub fn from_fn<Args, F>(f: F) -> Self
    where
        F: IntoHandler<Args>,
    {
        f.into_handler()
    }

    pub fn call(&self, params: &Params) -> Result<Value, Fault> {
        (self.0)(params)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

/// Conversion of typed closures into a [`Handler`].
///
/// `Args` is the tuple of argument types; it only exists to keep the
/// implementations for different arities apart.
pub trait IntoHandler<Args> {
    fn into_handler(self) -> Handler;
}

fn check_arity(params: &Params, expected: usize) -> Result<(), Fault> {
    if params.len() != expected {
        return Err(Fault::type_mismatch(format!(
            "expected {} parameter(s), got {}",
            expected,
            params.len()
        )));
    }
    Ok(())
}

macro_rules! impl_into_handler {
    ($count:expr; $($ty:ident => $var:ident => $idx:tt),*) => {
        impl<Func, Ret, Error, $($ty,)*> IntoHandler<($($ty,)*)> for Func
        where
            Func: Fn($($ty),*) -> Result<Ret, Error> + Send + Sync + 'static,
            Ret: IntoValue,
            Error: Into<Fault>,
            $($ty: FromValue,)*
        {
            fn into_handler(self) -> Handler {
                Handler::raw(move |params: &Params| {
                    check_arity(params, $count)?;
                    $(let $var = params.decode::<$ty>($idx)?;)*
                    (self)($($var),*).map(IntoValue::into_value).map_err(Into::into)
                })
            }
        }
    };
}

impl_into_handler!(0;);
impl_into_handler!(1; A => a => 0);
impl_into_handler!(2; A => a => 0, B => b => 1);
impl_into_handler!(3; A => a => 0, B => b => 1, C => c => 2);
impl_into_handler!(4; A => a => 0, B => b => 1, C => c => 2, D => d => 3);
impl_into_handler!(5; A => a => 0, B => b => 1, C => c => 2, D => d => 3, E => e => 4);
impl_into_handler!(6; A => a => 0, B => b => 1, C => c => 2, D => d => 3, E => e => 4, F => f => 5);

#[cfg(test)]
mod tests {
    use super::*;
    use ajaxrpc_common::FaultCode;

    fn params(values: Vec<Value>) -> Params {
        Params::new(values)
    }

    #[test]
    fn test_raw_handler_sees_values() {
        let handler = Handler::raw(|params| Ok(Value::Int(params.len() as i64)));
        assert_eq!(handler.call(&params(vec![Value::Nil, Value::Nil])), Ok(Value::Int(2)));
    }

    #[test]
    fn test_zero_arity() {
        let handler = Handler::from_fn(|| Ok::<_, Fault>("pong"));
        assert_eq!(
            handler.call(&params(vec![])),
            Ok(Value::String("pong".into()))
        );
    }

    #[test]
    fn test_typed_arguments_decoded() {
        let handler = Handler::from_fn(|items: Vec<i64>| Ok::<_, Fault>(items.iter().sum::<i64>()));
        let args = params(vec![Value::Array(vec![Value::Int(10), Value::Int(11), Value::Int(12)])]);
        assert_eq!(handler.call(&args), Ok(Value::Int(33)));
    }

    #[test]
    fn test_decode_failure_names_position() {
        let handler = Handler::from_fn(|a: i64, b: String| Ok::<_, Fault>(format!("{}{}", a, b)));
        let fault = handler
            .call(&params(vec![Value::Int(1), Value::Int(2)]))
            .unwrap_err();
        assert!(fault.is(FaultCode::TypeMismatch));
        assert!(fault.message.contains('1'), "{}", fault.message);
    }

    #[test]
    fn test_wrong_arity_is_type_mismatch() {
        let handler = Handler::from_fn(|a: i64| Ok::<_, Fault>(a));
        let fault = handler.call(&params(vec![])).unwrap_err();
        assert!(fault.is(FaultCode::TypeMismatch));
    }

    #[test]
    fn test_handler_error_converts() {
        let handler = Handler::from_fn(|divisor: i64| {
            if divisor == 0 {
                return Err("division by zero");
            }
            Ok(100 / divisor)
        });
        let fault = handler.call(&params(vec![Value::Int(0)])).unwrap_err();
        assert!(fault.is(FaultCode::HandlerError));
        assert_eq!(fault.message, "division by zero");
    }

    #[test]
    fn test_user_fault_passes_through() {
        let handler = Handler::from_fn(|| Err::<(), _>(Fault::user(801, "quota exceeded")));
        assert_eq!(handler.call(&params(vec![])).unwrap_err().code, 801);
    }

    #[test]
    fn test_six_arguments() {
        let handler = Handler::from_fn(|a: i64, b: i64, c: i64, d: i64, e: i64, f: i64| {
            Ok::<_, Fault>(a + b + c + d + e + f)
        });
        let args = params((1..=6).map(Value::Int).collect());
        assert_eq!(handler.call(&args), Ok(Value::Int(21)));
    }
}
