//! Model types and opaque simple values.
//!
//! A model is an object node carrying `$modelType` and `$modelId` entries.
//! Its type, registered once per store, supplies the named actions that may
//! be invoked on it, an optional on-init hook and an optional snapshot
//! processor applied to input snapshots before construction.
//!
//! A simple value is an immutable holder that exports itself to snapshot
//! data and is rebuilt from it by a registered import function.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::action::{wrap_in_action, ActionFn};
use crate::constants::ON_INIT_ACTION;
use crate::error::{Error, Result};
use crate::node::NodeId;
use crate::snapshot::Snapshot;
use crate::store::Store;

// ── Simple values ─────────────────────────────────────────────────────────

/// An immutable value that manages its own snapshot form.
pub trait SimpleValue: fmt::Debug {
    /// Registered type name, used to find the import function.
    fn type_name(&self) -> &str;

    /// Export the value. Called once, when the value is tracked.
    fn to_snapshot(&self) -> Snapshot;

    fn as_any(&self) -> &dyn Any;
}

/// Rebuilds a simple value from its exported data.
pub type SimpleImportFn = Rc<dyn Fn(&Snapshot) -> Result<Box<dyn SimpleValue>>>;

/// Transforms an input snapshot before a model is constructed from it.
pub type SnapshotProcessor = Rc<dyn Fn(Snapshot) -> Result<Snapshot>>;

// ── Model types ───────────────────────────────────────────────────────────

/// Description of a model type: its name and behaviour.
pub struct ModelType {
    name: String,
    actions: HashMap<String, ActionFn>,
    on_init: Option<ActionFn>,
    processor: Option<SnapshotProcessor>,
}

impl ModelType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: HashMap::new(),
            on_init: None,
            processor: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register an action. The body is wrapped with [`wrap_in_action`].
    pub fn action<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut Store, NodeId, &[Snapshot]) -> Result<Snapshot> + 'static,
    {
        let name = name.into();
        let wrapped = wrap_in_action(name.clone(), body);
        self.actions.insert(name, wrapped);
        self
    }

    /// Hook run once right after construction, as the `$$onInit` action.
    pub fn on_init<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Store, NodeId) -> Result<()> + 'static,
    {
        self.on_init = Some(wrap_in_action(ON_INIT_ACTION, move |store, node, _args| {
            hook(store, node)?;
            Ok(Snapshot::null())
        }));
        self
    }

    /// Preprocess input snapshots; metadata keys are re-added afterwards.
    pub fn from_snapshot<F>(mut self, processor: F) -> Self
    where
        F: Fn(Snapshot) -> Result<Snapshot> + 'static,
    {
        self.processor = Some(Rc::new(processor));
        self
    }

    pub(crate) fn find_action(&self, name: &str) -> Option<ActionFn> {
        if name == ON_INIT_ACTION {
            return self.on_init.clone();
        }
        self.actions.get(name).cloned()
    }

    pub(crate) fn on_init_action(&self) -> Option<ActionFn> {
        self.on_init.clone()
    }

    pub(crate) fn processor(&self) -> Option<SnapshotProcessor> {
        self.processor.clone()
    }

    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelType")
            .field("name", &self.name)
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("on_init", &self.on_init.is_some())
            .finish()
    }
}

// ── Registry ──────────────────────────────────────────────────────────────

/// Name tables for model and simple types. Later registrations under an
/// existing name replace the earlier one.
#[derive(Default)]
pub(crate) struct TypeRegistry {
    models: HashMap<String, Rc<ModelType>>,
    simples: HashMap<String, SimpleImportFn>,
}

impl TypeRegistry {
    pub(crate) fn model(&self, name: &str) -> Result<Rc<ModelType>> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownModelType(name.to_owned()))
    }

    pub(crate) fn simple(&self, name: &str) -> Result<SimpleImportFn> {
        self.simples
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownSimpleType(name.to_owned()))
    }
}

impl Store {
    /// Register a model type. A duplicate name is logged and replaces the
    /// previous registration.
    pub fn register_model(&mut self, model_type: ModelType) {
        let name = model_type.name.clone();
        if self.registry.models.contains_key(&name) {
            tracing::warn!(model_type = %name, "a model type with this name is already registered");
        }
        self.registry.models.insert(name, Rc::new(model_type));
    }

    /// Register the import function for a simple value type.
    pub fn register_simple<F>(&mut self, type_name: impl Into<String>, import: F)
    where
        F: Fn(&Snapshot) -> Result<Box<dyn SimpleValue>> + 'static,
    {
        let type_name = type_name.into();
        if self.registry.simples.contains_key(&type_name) {
            tracing::warn!(
                simple_type = %type_name,
                "a simple type with this name is already registered"
            );
        }
        self.registry.simples.insert(type_name, Rc::new(import));
    }

    pub fn is_model_registered(&self, name: &str) -> bool {
        self.registry.models.contains_key(name)
    }
}
