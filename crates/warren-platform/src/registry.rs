use std::collections::BTreeMap;

use crate::{BuildContext, BuildError, BusComponent, Component, ComponentDescription, MemoryComponent};

pub type ComponentFactory =
    Box<dyn Fn(&ComponentDescription, &BuildContext) -> Result<Box<dyn Component>, BuildError>>;

/// Explicit table of component factories, keyed by type name.
#[derive(Default)]
pub struct ComponentRegistry {
    factories: BTreeMap<String, ComponentFactory>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the fabric's own `bus` and `memory` components.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry
            .factories
            .insert(BusComponent::KIND.to_owned(), Box::new(create_bus));
        registry
            .factories
            .insert(MemoryComponent::KIND.to_owned(), Box::new(create_memory));
        registry
    }

    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F) -> Result<(), BuildError>
    where
        F: Fn(&ComponentDescription, &BuildContext) -> Result<Box<dyn Component>, BuildError>
            + 'static,
    {
        let kind = kind.into();
        if self.factories.contains_key(&kind) {
            return Err(BuildError::DuplicateComponentType { kind });
        }
        self.factories.insert(kind, Box::new(factory));
        Ok(())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> + '_ {
        self.factories.keys().map(String::as_str)
    }

    pub fn create(
        &self,
        description: &ComponentDescription,
        ctx: &BuildContext,
    ) -> Result<Box<dyn Component>, BuildError> {
        let factory =
            self.factories
                .get(&description.kind)
                .ok_or_else(|| BuildError::UnknownComponentType {
                    kind: description.kind.clone(),
                })?;
        factory(description, ctx)
    }
}

fn create_bus(
    description: &ComponentDescription,
    ctx: &BuildContext,
) -> Result<Box<dyn Component>, BuildError> {
    Ok(Box::new(BusComponent::from_description(description, ctx)?))
}

fn create_memory(
    description: &ComponentDescription,
    ctx: &BuildContext,
) -> Result<Box<dyn Component>, BuildError> {
    Ok(Box::new(MemoryComponent::from_description(description, ctx)?))
}
