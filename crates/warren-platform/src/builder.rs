use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, info, warn};
use warren_bus::BusRouterRef;
use warren_ports::{bind_hierarchical, bind_peer, BindingError, ConnectionInfo, Port};
use warren_time::Scheduler;

use crate::{
    BindingRequest, BindingRequestKind, BuildContext, BuildError, BuildHook, BuildPolicy,
    Component, ComponentRegistry, FabricConfig, PlatformDescription, PortRef, TopologyReport,
};

/// A binding request the builder gave up on under [`BuildPolicy::Continue`].
#[derive(Debug, Clone, PartialEq)]
pub struct BindingFailure {
    pub request: BindingRequest,
    pub error: BindingError,
}

/// Instantiates, binds and seals a platform from its description.
pub struct PlatformBuilder {
    registry: ComponentRegistry,
    scheduler: Rc<dyn Scheduler>,
    hooks: Vec<Box<dyn BuildHook>>,
}

impl PlatformBuilder {
    pub fn new(registry: ComponentRegistry, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            registry,
            scheduler,
            hooks: Vec::new(),
        }
    }

    pub fn with_hook(mut self, hook: impl BuildHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn registry_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.registry
    }

    /// Builds the platform in five steps: instantiate every component, run the instantiation
    /// hooks, bind every requested port pair, freeze the buses and run the post-build hooks.
    pub fn build(mut self, description: &PlatformDescription) -> Result<Platform, BuildError> {
        let fabric = description.fabric.clone();
        fabric.validate()?;

        let ctx = BuildContext {
            scheduler: self.scheduler.clone(),
            fabric,
        };
        let mut platform = Platform {
            components: Vec::with_capacity(description.components.len()),
            by_name: HashMap::new(),
            scheduler: self.scheduler.clone(),
            fabric: ctx.fabric.clone(),
            binding_failures: Vec::new(),
        };

        for component in &description.components {
            if platform.by_name.contains_key(&component.name) {
                return Err(BuildError::DuplicateComponent {
                    name: component.name.clone(),
                });
            }
            let instance = self.registry.create(component, &ctx)?;
            debug!(component = %component.name, kind = %component.kind, "component instantiated");
            platform
                .by_name
                .insert(component.name.clone(), platform.components.len());
            platform.components.push(instance);
        }

        let mut bindings = description.bindings.clone();
        for hook in &mut self.hooks {
            hook.after_component_instantiation(&platform, &mut bindings)?;
        }

        for request in bindings {
            match platform.bind(&request) {
                Ok(_) => {}
                Err(BuildError::Binding { source, .. })
                    if ctx.fabric.build_policy == BuildPolicy::Continue =>
                {
                    warn!(
                        from = %request.from,
                        to = %request.to,
                        err = %source,
                        "binding skipped"
                    );
                    platform.binding_failures.push(BindingFailure {
                        request,
                        error: source,
                    });
                }
                Err(err) => return Err(err),
            }
        }

        for component in &platform.components {
            if let Some(router) = component.bus_router() {
                router.borrow_mut().freeze();
            }
        }

        for hook in &mut self.hooks {
            hook.after_build(&platform)?;
        }

        info!(
            components = platform.components.len(),
            failed_bindings = platform.binding_failures.len(),
            "platform built"
        );
        Ok(platform)
    }
}

/// A built platform: its components, their bound ports and frozen buses.
pub struct Platform {
    components: Vec<Box<dyn Component>>,
    by_name: HashMap<String, usize>,
    scheduler: Rc<dyn Scheduler>,
    fabric: FabricConfig,
    binding_failures: Vec<BindingFailure>,
}

impl Platform {
    pub fn components(&self) -> impl Iterator<Item = &dyn Component> + '_ {
        self.components.iter().map(|c| &**c as &dyn Component)
    }

    pub fn component(&self, name: &str) -> Option<&dyn Component> {
        self.by_name
            .get(name)
            .map(|&index| &*self.components[index])
    }

    /// The named component, if it exists and is a `T`.
    pub fn component_as<T: 'static>(&self, name: &str) -> Option<&T> {
        self.component(name)?.as_any().downcast_ref()
    }

    pub fn port(&self, port: &PortRef) -> Result<&Port, BuildError> {
        let component =
            self.component(&port.component)
                .ok_or_else(|| BuildError::UnknownComponent {
                    name: port.component.clone(),
                })?;
        component
            .port(&port.port)
            .ok_or_else(|| BuildError::UnknownPort {
                component: port.component.clone(),
                port: port.port.clone(),
            })
    }

    /// Router owned by the named bus component.
    pub fn router(&self, name: &str) -> Option<&BusRouterRef> {
        self.component(name)?.bus_router()
    }

    pub fn scheduler(&self) -> &Rc<dyn Scheduler> {
        &self.scheduler
    }

    pub fn fabric(&self) -> &FabricConfig {
        &self.fabric
    }

    /// Requests skipped under [`BuildPolicy::Continue`], in request order.
    pub fn binding_failures(&self) -> &[BindingFailure] {
        &self.binding_failures
    }

    pub fn report(&self) -> TopologyReport {
        TopologyReport::new(self)
    }

    fn bind(&self, request: &BindingRequest) -> Result<ConnectionInfo, BuildError> {
        let from = self.port(&request.from)?;
        let to = self.port(&request.to)?;
        let result = match request.kind {
            BindingRequestKind::Peer => bind_peer(from, to, &request.hints),
            BindingRequestKind::Hierarchical => bind_hierarchical(from, to),
        };
        result.map_err(|source| BuildError::Binding {
            from: request.from.to_string(),
            to: request.to.to_string(),
            source,
        })
    }
}
