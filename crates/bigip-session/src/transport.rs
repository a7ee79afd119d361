//! Seam between the session layer and the wire.
//!
//! A transport forwards one named procedure call to the device and returns its
//! decoded result. Implementations are responsible for turning remote faults into
//! [`Error::Fault`](crate::Error::Fault) via [`Fault::parse`](crate::Fault::parse),
//! so that everything above this trait works with typed fault kinds.

use std::fmt::Debug;

use serde_json::Value;

use crate::Result;

/// Synchronous request/response access to one iControl endpoint.
///
/// `procedure` is the dotted interface path, e.g. `LocalLB.Pool.get_list`;
/// `args` are the positional parameters in wire order.
pub trait Transport: Send + Sync + Debug {
    fn invoke(&self, procedure: &str, args: &[Value]) -> Result<Value>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn invoke(&self, procedure: &str, args: &[Value]) -> Result<Value> {
        (**self).invoke(procedure, args)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn invoke(&self, procedure: &str, args: &[Value]) -> Result<Value> {
        (**self).invoke(procedure, args)
    }
}
