//! Actions: named, recordable mutations of model nodes.
//!
//! An action runs inside a batch scope, so all patches it causes reach
//! listeners as one notification when the outermost action returns. A
//! top-level call is described as an [`ActionCall`] before the body runs
//! and handed to action listeners, which can ship it elsewhere and replay
//! it with [`Store::apply_action`](crate::Store::apply_action).

pub mod apply;
pub mod listeners;
pub mod types;
pub mod wrap;

pub use listeners::ActionListener;
pub(crate) use listeners::ActionListeners;
pub use types::{
    action_call_from_str, action_call_to_string, deserialize_action_call, serialize_action_call,
    ActionCall,
};
pub use wrap::{wrap_in_action, ActionFn};
