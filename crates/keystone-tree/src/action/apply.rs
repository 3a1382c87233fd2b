//! Invoking actions by name and replaying recorded calls.

use crate::action::{ActionCall, ActionFn};
use crate::constants::{APPLY_PATCHES_ACTION, APPLY_SNAPSHOT_ACTION};
use crate::error::{Error, Result};
use crate::node::NodeId;
use crate::patch::types::patches_from_snapshot;
use crate::path::Path;
use crate::snapshot::Snapshot;
use crate::store::Store;

impl Store {
    /// The action `name` of the model type of `node`, if any.
    pub fn find_action(&self, node: NodeId, name: &str) -> Option<ActionFn> {
        let type_name = self.model_type_of(node)?;
        self.registry.model(&type_name).ok()?.find_action(name)
    }

    /// Invoke the action `name` on `node`.
    pub fn call_action(&mut self, node: NodeId, name: &str, args: &[Snapshot]) -> Result<Snapshot> {
        self.ensure(node)?;
        self.dispatch(node, name, args, |store: &Store| store.path_of(node))
    }

    /// Replay `call` against the tree rooted at `root`.
    pub fn apply_action(&mut self, root: NodeId, call: &ActionCall) -> Result<Snapshot> {
        let target = self
            .resolve_path(root, &call.target_path)
            .ok_or_else(|| Error::ActionTargetNotFound {
                path: call.target_path.clone(),
            })?;
        let path = call.target_path.clone();
        self.dispatch(target, &call.action_name, &call.args, move |_: &Store| path)
    }

    fn dispatch(
        &mut self,
        target: NodeId,
        name: &str,
        args: &[Snapshot],
        path: impl FnOnce(&Store) -> Path,
    ) -> Result<Snapshot> {
        match name {
            APPLY_PATCHES_ACTION => {
                let patches = match args.first() {
                    Some(arg) => patches_from_snapshot(arg)?,
                    None => Vec::new(),
                };
                self.apply_patches(target, &patches)?;
                Ok(Snapshot::null())
            }
            APPLY_SNAPSHOT_ACTION => {
                let snapshot = args.first().ok_or_else(|| {
                    Error::InvalidSnapshot(format!(
                        "{APPLY_SNAPSHOT_ACTION} needs a snapshot argument"
                    ))
                })?;
                self.apply_snapshot(target, snapshot)?;
                Ok(Snapshot::null())
            }
            _ => {
                let action =
                    self.find_action(target, name)
                        .ok_or_else(|| Error::ActionMethodNotFound {
                            path: path(self),
                            name: name.to_owned(),
                        })?;
                action(self, target, args)
            }
        }
    }
}
