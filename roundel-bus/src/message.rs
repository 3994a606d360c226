//! Bus message model
//!
//! Only the handful of basic types the services use are modelled.

use serde::ser::{Serialize, SerializeTuple, Serializer};

use crate::error::BusError;

/// A basic bus value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    U32(u32),
    U16(u16),
    I16(i16),
}

impl Value {
    /// D-Bus type code
    pub fn type_code(&self) -> char {
        match self {
            Value::Str(_) => 's',
            Value::U32(_) => 'u',
            Value::U16(_) => 'q',
            Value::I16(_) => 'n',
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Str(s) => serializer.serialize_str(s),
            Value::U32(v) => serializer.serialize_u32(*v),
            Value::U16(v) => serializer.serialize_u16(*v),
            Value::I16(v) => serializer.serialize_i16(*v),
        }
    }
}

/// Signature string of a value list, e.g. `nnu`
pub fn signature_of(values: &[Value]) -> String {
    values.iter().map(Value::type_code).collect()
}

/// Several values serialized as one struct (the body of a multi-argument
/// message)
#[derive(Debug)]
pub(crate) struct Args<'a>(pub &'a [Value]);

impl Serialize for Args<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(self.0.len())?;
        for v in self.0 {
            tuple.serialize_element(v)?;
        }
        tuple.end()
    }
}

/// An inbound method call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    /// Transport-assigned id used to route the reply
    pub token: u64,
    pub interface: String,
    pub member: String,
    pub args: Vec<Value>,
}

impl MethodCall {
    pub fn new(token: u64, interface: &str, member: &str, args: Vec<Value>) -> Self {
        Self {
            token,
            interface: interface.to_string(),
            member: member.to_string(),
            args,
        }
    }

    pub fn arg_str(&self, index: usize) -> Result<&str, BusError> {
        match self.args.get(index) {
            Some(Value::Str(s)) => Ok(s),
            _ => Err(BusError::BadArgument {
                index,
                expected: "string",
            }),
        }
    }

    pub fn arg_u32(&self, index: usize) -> Result<u32, BusError> {
        match self.args.get(index) {
            Some(Value::U32(v)) => Ok(*v),
            _ => Err(BusError::BadArgument {
                index,
                expected: "uint32",
            }),
        }
    }
}

/// Handler result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Method return with zero or more values
    Return(Vec<Value>),
    /// Explicit error reply
    Error { name: String, message: String },
}

impl Reply {
    /// Empty method return
    pub fn ok() -> Self {
        Reply::Return(Vec::new())
    }

    pub fn values(values: impl Into<Vec<Value>>) -> Self {
        Reply::Return(values.into())
    }

    pub fn error(name: &str, message: &str) -> Self {
        Reply::Error {
            name: name.to_string(),
            message: message.to_string(),
        }
    }

    /// Error reply for a malformed argument
    pub fn invalid_args(err: &BusError) -> Self {
        Reply::error("org.freedesktop.DBus.Error.InvalidArgs", &err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature() {
        let v = [Value::I16(1), Value::I16(2), Value::U32(3)];
        assert_eq!(signature_of(&v), "nnu");
        assert_eq!(signature_of(&[Value::U32(0), Value::U32(0), Value::U16(0)]), "uuq");
    }

    #[test]
    fn test_arg_access() {
        let call = MethodCall::new(1, "org.roundel.Power", "SetScreenTimeout", vec![Value::U32(5000)]);
        assert_eq!(call.arg_u32(0).unwrap(), 5000);
        assert!(matches!(
            call.arg_str(0),
            Err(BusError::BadArgument { index: 0, expected: "string" })
        ));
        assert!(call.arg_u32(1).is_err());
    }
}
