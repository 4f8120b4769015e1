// Copyright 2025 AjaxRPC Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # AjaxRPC CLI
//!
//! Command-line interface for the AjaxRPC bridge.
//!
//! ## Key Commands
//!
//! - `ajaxrpc serve`: Serve the demo methods and their JavaScript stubs
//! - `ajaxrpc call`: Make one call (outputs plain JSON for scripting)
//! - `ajaxrpc methods`: List the methods a server exposes
//! - `ajaxrpc stubs`: Print the JavaScript stubs for the demo methods

use anyhow::{anyhow, Result};
use chrono::Utc;

use ajaxrpc_common::{json_to_value, Fault, Value};
use ajaxrpc_server::{Handler, MethodDeclaration, MethodRegistry};

/// The methods `ajaxrpc serve` exposes.
pub fn demo_registry() -> ajaxrpc_common::Result<MethodRegistry> {
    MethodRegistry::from_table(vec![
        MethodDeclaration::new(
            "sumintegers",
            Handler::from_fn(|items: Vec<i64>| {
                items
                    .iter()
                    .try_fold(0i64, |total, item| total.checked_add(*item))
                    .ok_or_else(|| Fault::handler_error("integer overflow"))
            }),
            vec!["int(array)".parse()?],
        )
        .with_help("Adds up an array of integers."),
        MethodDeclaration::new(
            "add",
            Handler::raw(|params| match (params.get(0), params.get(1)) {
                (Some(Value::Int(a)), Some(Value::Int(b))) => a
                    .checked_add(*b)
                    .map(Value::Int)
                    .ok_or_else(|| Fault::handler_error("integer overflow")),
                (Some(Value::Double(a)), Some(Value::Double(b))) => Ok(Value::Double(a + b)),
                _ => Err(Fault::type_mismatch("add expects two ints or two doubles")),
            }),
            vec!["int(int, int)".parse()?, "double(double, double)".parse()?],
        )
        .with_help("Adds two numbers of the same type."),
        MethodDeclaration::new(
            "echo",
            Handler::raw(|params| Ok(Value::Array(params.as_slice().to_vec()))),
            vec![],
        )
        .with_help("Returns its arguments as an array."),
        MethodDeclaration::new(
            "now",
            Handler::from_fn(|| Ok::<_, Fault>(Utc::now())),
            vec!["dateTime.iso8601()".parse()?],
        )
        .with_help("Returns the server time."),
    ])
}

/// Parses a JSON array of plain JSON values into call parameters.
pub fn parse_params(text: &str) -> Result<Vec<Value>> {
    let json: serde_json::Value =
        serde_json::from_str(text).map_err(|e| anyhow!("Invalid JSON in params: {}", e))?;
    match json_to_value(json)? {
        Value::Array(items) => Ok(items),
        other => Err(anyhow!(
            "params must be a JSON array, got {}",
            other.type_tag()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ajaxrpc_common::{FaultCode, Request};
    use ajaxrpc_server::Dispatcher;
    use std::sync::Arc;

    fn call(method: &str, params: Vec<Value>) -> Result<Value, Fault> {
        let dispatcher = Dispatcher::new(Arc::new(demo_registry().unwrap()));
        dispatcher
            .dispatch(&Request {
                method: method.into(),
                params,
            })
            .into_result()
    }

    #[test]
    fn test_parse_params() {
        let params = parse_params("[[10, 11, 12], \"x\", 1.5, null]").unwrap();
        assert_eq!(
            params,
            vec![
                Value::Array(vec![Value::Int(10), Value::Int(11), Value::Int(12)]),
                Value::String("x".into()),
                Value::Double(1.5),
                Value::Nil,
            ]
        );
        assert_eq!(parse_params("[]").unwrap(), vec![]);
    }

    #[test]
    fn test_parse_params_rejects_non_arrays() {
        assert!(parse_params("{\"a\": 1}").is_err());
        assert!(parse_params("not json").is_err());
    }

    #[test]
    fn test_demo_sumintegers() {
        let params = parse_params("[[10, 11, 12]]").unwrap();
        assert_eq!(call("sumintegers", params), Ok(Value::Int(33)));

        let fault = call("sumintegers", vec![Value::Array(vec![Value::Int(i64::MAX), Value::Int(1)])])
            .unwrap_err();
        assert!(fault.is(FaultCode::HandlerError));
    }

    #[test]
    fn test_demo_add_overloads() {
        assert_eq!(call("add", vec![Value::Int(2), Value::Int(3)]), Ok(Value::Int(5)));
        assert_eq!(
            call("add", vec![Value::Double(0.5), Value::Double(0.25)]),
            Ok(Value::Double(0.75))
        );
        let fault = call("add", vec![Value::Int(2), Value::Double(3.0)]).unwrap_err();
        assert!(fault.is(FaultCode::SignatureMismatch));
    }

    #[test]
    fn test_demo_now() {
        assert!(matches!(call("now", vec![]), Ok(Value::DateTime(_))));
    }
}
