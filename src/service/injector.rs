// SPDX-License-Identifier: MIT OR Apache-2.0

//! The default property injector.

use super::resolution::Resolution;
use crate::domain::{Result, Value};
use crate::ports::PropertyInjector;
use tracing::trace;

/// Assigns every injectable field declared directly on the instance's type.
///
/// A field is injectable when it is neither static nor final and carries
/// metadata. Each value is resolved by the parameter provider registered for
/// the instance's type. Private fields are assigned under an access guard that
/// is released as soon as the assignment returns, whether it succeeded or not.
///
/// Injecting an instance whose type has no descriptor fails with
/// [`ModuleError::UnknownModule`](crate::domain::ModuleError::UnknownModule).
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPropertyInjector;

impl DefaultPropertyInjector {
    /// Creates the injector.
    pub fn new() -> Self {
        Self
    }
}

impl PropertyInjector for DefaultPropertyInjector {
    fn inject(&self, res: &Resolution<'_>, instance: &Value) -> Result<()> {
        let module = instance.type_info();
        let descriptor = res.registry().descriptor(&module)?;
        let mut fields = descriptor.fields().iter().filter(|f| f.is_injectable()).peekable();
        if fields.peek().is_none() {
            return Ok(());
        }

        let defaults = res.defaults_for(&module);
        let provider = res.parameter_provider_for(&module)?;
        for field in fields {
            let value = provider.resolve(res, &module, field.point(), &defaults)?;
            trace!("Injecting {}.{}", module, field.name());
            let _guard = field.grant_access();
            field.assign(&module, instance, value)?;
        }
        Ok(())
    }
}
