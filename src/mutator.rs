//! Idempotent add/remove of one address.

use crate::enforcer::{SetBackend, SetOp};
use crate::error::ResponderError;
use crate::logsink::LogSink;

/// Applies mutations through a backend and logs what the backend reports.
pub struct SetMutator<'a, B: ?Sized> {
    backend: &'a B,
    log: &'a LogSink,
}

impl<'a, B: SetBackend + ?Sized> SetMutator<'a, B> {
    pub fn new(backend: &'a B, log: &'a LogSink) -> Self {
        Self { backend, log }
    }

    pub fn add(&self, set_name: &str, address: &str) -> Result<(), ResponderError> {
        self.apply(SetOp::Add, set_name, address)
    }

    pub fn delete(&self, set_name: &str, address: &str) -> Result<(), ResponderError> {
        self.apply(SetOp::Delete, set_name, address)
    }

    fn apply(&self, op: SetOp, set_name: &str, address: &str) -> Result<(), ResponderError> {
        let result = self.backend.mutate(op, set_name, address);

        // Warnings and notices are logged but only a failed call fails
        if let Some(report) = &result.report {
            self.log.log(report);
        }

        if result.success {
            Ok(())
        } else {
            Err(ResponderError::Mutation {
                op: op.verb(),
                set_name: set_name.to_string(),
                address: address.to_string(),
            })
        }
    }
}
