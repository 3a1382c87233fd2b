//! The action wrapper.

use std::rc::Rc;

use crate::error::Result;
use crate::node::NodeId;
use crate::snapshot::Snapshot;
use crate::store::Store;

/// A wrapped action: `(store, target, args) -> result`.
pub type ActionFn = Rc<dyn Fn(&mut Store, NodeId, &[Snapshot]) -> Result<Snapshot>>;

/// Wrap `body` so each invocation runs through [`Store::run_action`] under
/// the given name.
pub fn wrap_in_action<F>(name: impl Into<String>, body: F) -> ActionFn
where
    F: Fn(&mut Store, NodeId, &[Snapshot]) -> Result<Snapshot> + 'static,
{
    let name = name.into();
    Rc::new(move |store: &mut Store, target: NodeId, args: &[Snapshot]| {
        store.run_action(&name, target, args, |store| body(store, target, args))
    })
}

impl Store {
    /// Run `body` as the action `name` on `target`.
    ///
    /// A top-level call is reported to action listeners before `body`
    /// starts. Patches are flushed once the outermost action returns, also
    /// when it fails; mutations made before the failure are kept.
    pub fn run_action<R>(
        &mut self,
        name: &str,
        target: NodeId,
        args: &[Snapshot],
        body: impl FnOnce(&mut Store) -> Result<R>,
    ) -> Result<R> {
        self.ensure(target)?;
        let top_level = self.action_depth == 0;
        if top_level {
            self.notify_action_listeners(target, name, args);
        }
        tracing::debug!(action = name, target = %target, top_level, "action started");

        self.action_depth += 1;
        let result = self.batch(body);
        self.action_depth -= 1;

        match &result {
            Ok(_) => tracing::debug!(action = name, target = %target, "action finished"),
            Err(err) => {
                tracing::warn!(action = name, target = %target, error = %err, "action failed")
            }
        }
        result
    }
}
