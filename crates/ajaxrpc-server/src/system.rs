//! Introspection Builtins
//!
//! Methods under the reserved `system.` prefix are answered by the
//! dispatcher itself. User methods can never shadow them because user names
//! may not contain the separator.
//!
//! | Builtin | Signature |
//! |---------|-----------|
//! | `system.listMethods` | `array()` |
//! | `system.methodSignature` | `array(string)` |
//! | `system.methodHelp` | `string(string)` |
//! | `system.multicall` | `array(array)` |
//! | `system.getMetrics` | `struct()` |

use ajaxrpc_common::{
    Fault, FaultCode, IntoValue, MethodDescriptor, Params, Signature, StructFields, TypeTag, Value,
};

use crate::dispatcher::Dispatcher;
use crate::registry::select_signature;

/// A method served by the dispatcher rather than the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    ListMethods,
    MethodSignature,
    MethodHelp,
    Multicall,
    GetMetrics,
}

impl Builtin {
    pub const ALL: [Builtin; 5] = [
        Builtin::ListMethods,
        Builtin::MethodSignature,
        Builtin::MethodHelp,
        Builtin::Multicall,
        Builtin::GetMetrics,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::ListMethods => "system.listMethods",
            Builtin::MethodSignature => "system.methodSignature",
            Builtin::MethodHelp => "system.methodHelp",
            Builtin::Multicall => "system.multicall",
            Builtin::GetMetrics => "system.getMetrics",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    pub fn signature(self) -> Signature {
        match self {
            Builtin::ListMethods => Signature::new(TypeTag::Array, []),
            Builtin::MethodSignature => Signature::new(TypeTag::Array, [TypeTag::String]),
            Builtin::MethodHelp => Signature::new(TypeTag::String, [TypeTag::String]),
            Builtin::Multicall => Signature::new(TypeTag::Array, [TypeTag::Array]),
            Builtin::GetMetrics => Signature::new(TypeTag::Struct, []),
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Builtin::ListMethods => "Lists every callable method name.",
            Builtin::MethodSignature => {
                "Returns the signatures of a method as arrays of type names, return type first."
            }
            Builtin::MethodHelp => "Returns the help text of a method.",
            Builtin::Multicall => {
                "Runs an array of {methodName, params} calls and returns one entry per call."
            }
            Builtin::GetMetrics => "Returns call counters and latency percentiles per method.",
        }
    }

    pub fn descriptor(self) -> MethodDescriptor {
        MethodDescriptor::new(self.name(), vec![self.signature()]).with_help(self.help())
    }

    /// Validates the arguments and runs the builtin.
    pub(crate) fn call(
        self,
        dispatcher: &Dispatcher,
        params: &Params,
        in_multicall: bool,
    ) -> Result<Value, Fault> {
        select_signature(self.name(), &[self.signature()], params.as_slice())?;

        match self {
            Builtin::ListMethods => Ok(list_methods(dispatcher)),
            Builtin::MethodSignature => {
                let name: String = params.decode(0)?;
                method_signature(dispatcher, &name)
            }
            Builtin::MethodHelp => {
                let name: String = params.decode(0)?;
                method_help(dispatcher, &name)
            }
            Builtin::Multicall if in_multicall => Err(Fault::handler_error(
                "system.multicall cannot be nested",
            )),
            Builtin::Multicall => {
                let calls: Vec<Value> = params.decode(0)?;
                Ok(multicall(dispatcher, &calls))
            }
            Builtin::GetMetrics => Ok(dispatcher.metrics().snapshot().into_value()),
        }
    }
}

fn list_methods(dispatcher: &Dispatcher) -> Value {
    let names = dispatcher
        .registry()
        .names()
        .chain(Builtin::ALL.iter().map(|builtin| builtin.name()))
        .map(|name| Value::String(name.to_owned()))
        .collect();
    Value::Array(names)
}

fn introspect_unknown(name: &str) -> Fault {
    Fault::new(
        FaultCode::IntrospectUnknown,
        format!("No method '{}' to introspect", name),
    )
}

fn method_signature(dispatcher: &Dispatcher, name: &str) -> Result<Value, Fault> {
    let signatures = match Builtin::from_name(name) {
        Some(builtin) => vec![builtin.signature()],
        None => dispatcher
            .registry()
            .get(name)
            .ok_or_else(|| introspect_unknown(name))?
            .signatures()
            .to_vec(),
    };

    Ok(signatures
        .iter()
        .map(|signature| signature.to_names())
        .collect::<Vec<_>>()
        .into_value())
}

fn method_help(dispatcher: &Dispatcher, name: &str) -> Result<Value, Fault> {
    if let Some(builtin) = Builtin::from_name(name) {
        return Ok(Value::String(builtin.help().to_owned()));
    }
    dispatcher
        .registry()
        .get(name)
        .map(|entry| Value::String(entry.help().to_owned()))
        .ok_or_else(|| introspect_unknown(name))
}

/// Runs each `{methodName, params}` entry independently.
///
/// A successful call becomes a one-element array holding the result, a
/// failed one becomes `{faultCode, faultString}`.
fn multicall(dispatcher: &Dispatcher, calls: &[Value]) -> Value {
    let results = calls
        .iter()
        .map(|call| {
            let outcome = parse_call(call)
                .and_then(|(method, params)| dispatcher.call_method(method, &params, true));
            match outcome {
                Ok(value) => Value::Array(vec![value]),
                Err(fault) => fault_struct(fault),
            }
        })
        .collect();
    Value::Array(results)
}

fn parse_call(call: &Value) -> Result<(&str, Params), Fault> {
    let method = match call.field("methodName") {
        Some(Value::String(method)) => method.as_str(),
        _ => {
            return Err(Fault::malformed_request(
                "multicall entry needs a string 'methodName'",
            ))
        }
    };
    let params = match call.field("params") {
        Some(Value::Array(items)) => Params::new(items.clone()),
        None => Params::default(),
        Some(_) => {
            return Err(Fault::malformed_request(
                "multicall entry 'params' must be an array",
            ))
        }
    };
    Ok((method, params))
}

fn fault_struct(fault: Fault) -> Value {
    let mut fields = StructFields::new();
    fields.insert("faultCode".into(), Value::Int(i64::from(fault.code)));
    fields.insert("faultString".into(), Value::String(fault.message));
    Value::Struct(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for builtin in Builtin::ALL {
            assert_eq!(Builtin::from_name(builtin.name()), Some(builtin));
            assert!(builtin.name().starts_with("system."));
        }
        assert_eq!(Builtin::from_name("system.nothing"), None);
        assert_eq!(Builtin::from_name("listMethods"), None);
    }

    #[test]
    fn test_descriptor() {
        let descriptor = Builtin::MethodSignature.descriptor();
        assert_eq!(descriptor.name, "system.methodSignature");
        assert_eq!(descriptor.signatures[0].to_string(), "array(string)");
        assert!(!descriptor.help.is_empty());
    }

    #[test]
    fn test_fault_struct_fields() {
        let value = fault_struct(Fault::unknown_method("nope"));
        assert_eq!(value.field("faultCode"), Some(&Value::Int(1)));
        assert!(matches!(value.field("faultString"), Some(Value::String(s)) if s.contains("nope")));
    }

    #[test]
    fn test_parse_call_requires_method_name() {
        let mut fields = StructFields::new();
        fields.insert("params".into(), Value::Array(vec![]));
        let fault = parse_call(&Value::Struct(fields)).unwrap_err();
        assert!(fault.is(FaultCode::MalformedRequest));

        let fault = parse_call(&Value::Int(3)).unwrap_err();
        assert!(fault.is(FaultCode::MalformedRequest));
    }

    #[test]
    fn test_parse_call_defaults_params() {
        let mut fields = StructFields::new();
        fields.insert("methodName".into(), Value::String("ping".into()));
        let call = Value::Struct(fields);
        let (method, params) = parse_call(&call).unwrap();
        assert_eq!(method, "ping");
        assert!(params.is_empty());
    }
}
