//! Request and Reply Envelopes
//!
//! - Request: `{"method": "sumintegers", "params": [{"array": [...]}]}`
//! - Reply: `{"result": {"int": 33}}` or `{"fault": {"code": 1, "message": "..."}}`

use serde::{Deserialize, Serialize};

use super::marshal::{IntoParams, Params};
use super::{Fault, Value};

/// A call as it arrives at the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

impl Request {
    pub fn new(method: impl Into<String>, params: impl IntoParams) -> Self {
        Self {
            method: method.into(),
            params: params.into_params().into_inner(),
        }
    }

    pub fn params(&self) -> Params {
        Params::new(self.params.clone())
    }
}

/// Outcome of one call: exactly one of a result or a fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reply {
    #[serde(rename = "result")]
    Result(Value),
    #[serde(rename = "fault")]
    Fault(Fault),
}

impl Reply {
    pub fn is_fault(&self) -> bool {
        matches!(self, Reply::Fault(_))
    }

    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Reply::Fault(fault) => Some(fault),
            Reply::Result(_) => None,
        }
    }

    pub fn into_result(self) -> Result<Value, Fault> {
        match self {
            Reply::Result(value) => Ok(value),
            Reply::Fault(fault) => Err(fault),
        }
    }
}

impl From<Result<Value, Fault>> for Reply {
    fn from(outcome: Result<Value, Fault>) -> Self {
        match outcome {
            Ok(value) => Reply::Result(value),
            Err(fault) => Reply::Fault(fault),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::FaultCode;

    #[test]
    fn test_request_wire_shape() {
        let request = Request::new("sumintegers", (vec![10i64, 11, 12],));
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"method":"sumintegers","params":[{"array":[{"int":10},{"int":11},{"int":12}]}]}"#
        );
    }

    #[test]
    fn test_request_params_default_to_empty() {
        let request: Request = serde_json::from_str(r#"{"method":"ping"}"#).unwrap();
        assert!(request.params.is_empty());
    }

    #[test]
    fn test_reply_wire_shape() {
        let ok = Reply::Result(Value::Int(33));
        assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"result":{"int":33}}"#);

        let fault = Reply::Fault(Fault::new(FaultCode::UnknownMethod, "nope"));
        assert_eq!(
            serde_json::to_string(&fault).unwrap(),
            r#"{"fault":{"code":1,"message":"nope"}}"#
        );
    }

    #[test]
    fn test_reply_rejects_both_and_neither() {
        let both = r#"{"result":{"int":1},"fault":{"code":1,"message":"x"}}"#;
        assert!(serde_json::from_str::<Reply>(both).is_err());
        assert!(serde_json::from_str::<Reply>("{}").is_err());
    }

    #[test]
    fn test_into_result() {
        assert_eq!(Reply::Result(Value::Nil).into_result(), Ok(Value::Nil));
        let fault = Fault::handler_error("x");
        assert_eq!(Reply::Fault(fault.clone()).into_result(), Err(fault));
    }
}
