//! Design elaboration: the module hierarchy, its signals, port bindings and
//! processes.
//!
//! Modules are built against an explicit [`Scope`] instead of ambient global
//! state. A parent instantiates a child by handing it the signals its ports
//! bind to; bindings are checked on the spot and never change afterwards.

use std::collections::HashSet;

use log::debug;

use super::port::{Port, PortDirection};
use super::process::{Process, Suspend};
use crate::core::error::{SimError, SimResult};
use crate::core::execution::context::ProcessContext;
use crate::core::types::{AsSignal, DesignId, ModuleId, ProcessId, SignalId, SignalRef};
use crate::core::values::{Value, ValueKind};

/// A reusable building block of a design.
///
/// `Ports` is whatever the parent hands down at instantiation, usually a
/// struct of signal handles. `build` declares the module's signals, binds its
/// ports, instantiates children and registers processes.
pub trait Module: Sized {
    type Ports;

    fn build(scope: &mut Scope<'_>, ports: Self::Ports) -> SimResult<Self>;
}

pub(crate) struct ModuleDecl {
    pub name: String,
    pub path: String,
    pub children: Vec<ModuleId>,
    pub signals: Vec<SignalId>,
    pub ports: Vec<Port>,
    names: HashSet<String>,
}

pub(crate) struct SignalDecl {
    pub path: String,
    pub scope: String,
    pub name: String,
    pub owner: ModuleId,
    pub initial: Value,
}

pub(crate) struct ProcessDecl {
    pub path: String,
    pub module: ModuleId,
    pub body: Box<dyn Process>,
}

/// An elaborated design, ready to be handed to the simulator.
pub struct Design {
    pub(crate) id: DesignId,
    pub(crate) modules: Vec<ModuleDecl>,
    pub(crate) signals: Vec<SignalDecl>,
    pub(crate) processes: Vec<ProcessDecl>,
}

impl Design {
    /// Create a design whose root module is named `name`.
    pub fn new(name: &str) -> Self {
        Self {
            id: DesignId::fresh(),
            modules: vec![ModuleDecl {
                name: name.to_string(),
                path: name.to_string(),
                children: Vec::new(),
                signals: Vec::new(),
                ports: Vec::new(),
                names: HashSet::new(),
            }],
            signals: Vec::new(),
            processes: Vec::new(),
        }
    }

    /// Elaborate `M` as the root of a new design.
    pub fn elaborate<M: Module>(name: &str, ports: M::Ports) -> SimResult<(Design, M)> {
        let mut design = Design::new(name);
        let top = {
            let mut scope = design.root();
            M::build(&mut scope, ports)?
        };
        debug!(
            "Elaborated '{}': {} modules, {} signals, {} processes",
            name,
            design.modules.len(),
            design.signals.len(),
            design.processes.len()
        );
        Ok((design, top))
    }

    /// Scope of the root module.
    pub fn root(&mut self) -> Scope<'_> {
        Scope { design: self, module: ModuleId(0) }
    }

    pub fn name(&self) -> &str {
        &self.modules[0].name
    }

    pub fn id(&self) -> DesignId {
        self.id
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Hierarchical path of every module instance, depth first from the root.
    pub fn module_paths(&self) -> Vec<&str> {
        let mut paths = Vec::with_capacity(self.modules.len());
        let mut stack = vec![ModuleId(0)];
        while let Some(id) = stack.pop() {
            let decl = &self.modules[id.0];
            paths.push(decl.path.as_str());
            stack.extend(decl.children.iter().rev().copied());
        }
        paths
    }

    /// Look up a signal by hierarchical path.
    pub fn find_signal(&self, path: &str) -> Option<SignalRef> {
        self.signals.iter().enumerate().find(|(_, s)| s.path == path).map(|(index, s)| SignalRef {
            design: self.id,
            id: SignalId(index),
            kind: s.initial.kind(),
        })
    }

    /// Signals each module's processes may drive: the ones it owns plus the
    /// ones aliased through its output and inout ports.
    pub(crate) fn drivable_signals(&self, module: ModuleId) -> HashSet<SignalId> {
        let decl = &self.modules[module.0];
        decl.signals
            .iter()
            .copied()
            .chain(
                decl.ports
                    .iter()
                    .filter(|p| p.direction.can_drive())
                    .map(|p| p.signal.id),
            )
            .collect()
    }
}

/// Declaration context of one module instance.
pub struct Scope<'d> {
    design: &'d mut Design,
    module: ModuleId,
}

impl<'d> Scope<'d> {
    pub fn id(&self) -> ModuleId {
        self.module
    }

    pub fn name(&self) -> &str {
        &self.decl().name
    }

    /// Hierarchical path of this instance.
    pub fn path(&self) -> &str {
        &self.decl().path
    }

    fn decl(&self) -> &ModuleDecl {
        &self.design.modules[self.module.0]
    }

    fn claim_name(&mut self, name: &str) -> SimResult<String> {
        let decl = &mut self.design.modules[self.module.0];
        if !decl.names.insert(name.to_string()) {
            return Err(SimError::DuplicateName {
                scope: decl.path.clone(),
                name: name.to_string(),
            });
        }
        Ok(format!("{}.{}", decl.path, name))
    }

    /// Declare a signal owned by this module, starting at the kind's default.
    pub fn signal(&mut self, name: &str, kind: ValueKind) -> SimResult<SignalRef> {
        self.signal_init(name, Value::default_for(kind))
    }

    /// Declare a signal owned by this module with an explicit initial value.
    pub fn signal_init(&mut self, name: &str, initial: impl Into<Value>) -> SimResult<SignalRef> {
        let path = self.claim_name(name)?;
        let scope = self.decl().path.clone();
        let initial = initial.into();
        let kind = initial.kind();
        let id = SignalId(self.design.signals.len());
        self.design.signals.push(SignalDecl {
            path,
            scope,
            name: name.to_string(),
            owner: self.module,
            initial,
        });
        self.design.modules[self.module.0].signals.push(id);
        Ok(SignalRef { design: self.design.id, id, kind })
    }

    /// Bind an input port to a signal supplied by the parent.
    pub fn input(&mut self, name: &str, kind: ValueKind, binding: impl AsSignal) -> SimResult<Port> {
        self.port(name, PortDirection::Input, kind, binding.signal_ref())
    }

    /// Bind an output port to a signal supplied by the parent.
    pub fn output(&mut self, name: &str, kind: ValueKind, binding: impl AsSignal) -> SimResult<Port> {
        self.port(name, PortDirection::Output, kind, binding.signal_ref())
    }

    /// Bind a bidirectional port to a signal supplied by the parent.
    pub fn inout(&mut self, name: &str, kind: ValueKind, binding: impl AsSignal) -> SimResult<Port> {
        self.port(name, PortDirection::Inout, kind, binding.signal_ref())
    }

    fn port(
        &mut self,
        name: &str,
        direction: PortDirection,
        kind: ValueKind,
        signal: SignalRef,
    ) -> SimResult<Port> {
        if signal.design != self.design.id {
            return Err(SimError::UnknownSignal(signal.id));
        }
        if signal.kind != kind {
            return Err(SimError::PortBinding {
                port: format!("{}.{}", self.path(), name),
                expected: kind,
                found: signal.kind,
            });
        }
        let path = self.claim_name(name)?;
        let port = Port { path, direction, signal };
        self.design.modules[self.module.0].ports.push(port.clone());
        Ok(port)
    }

    /// Create a child instance named `name` and build `M` inside it.
    pub fn instantiate<M: Module>(&mut self, name: &str, ports: M::Ports) -> SimResult<M> {
        let path = self.claim_name(name)?;
        let child = ModuleId(self.design.modules.len());
        self.design.modules.push(ModuleDecl {
            name: name.to_string(),
            path,
            children: Vec::new(),
            signals: Vec::new(),
            ports: Vec::new(),
            names: HashSet::new(),
        });
        self.design.modules[self.module.0].children.push(child);

        let mut scope = Scope { design: &mut *self.design, module: child };
        M::build(&mut scope, ports)
    }

    /// Register a process of this module; it becomes runnable at initialize.
    pub fn process<P: Process + 'static>(&mut self, name: &str, body: P) -> SimResult<ProcessId> {
        let path = self.claim_name(name)?;
        let id = ProcessId(self.design.processes.len());
        self.design.processes.push(ProcessDecl {
            path,
            module: self.module,
            body: Box::new(body),
        });
        Ok(id)
    }

    /// Register a closure as a process; captured variables hold its state.
    pub fn process_fn<F>(&mut self, name: &str, body: F) -> SimResult<ProcessId>
    where
        F: FnMut(&mut ProcessContext<'_>) -> SimResult<Suspend> + 'static,
    {
        self.process(name, body)
    }
}
