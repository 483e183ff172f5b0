use crate::{BindingRequest, BuildError, Platform};

/// Extension points of [`crate::PlatformBuilder::build`]. Both default to doing nothing.
pub trait BuildHook {
    /// Runs once every component exists and before any binding. Hooks may append binding
    /// requests, e.g. to wire up components they know about.
    fn after_component_instantiation(
        &mut self,
        _platform: &Platform,
        _bindings: &mut Vec<BindingRequest>,
    ) -> Result<(), BuildError> {
        Ok(())
    }

    /// Runs once binding is over and the buses are frozen.
    fn after_build(&mut self, _platform: &Platform) -> Result<(), BuildError> {
        Ok(())
    }
}
