//! Patch recorder: collects patch events from a subtree or the whole store.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::node::NodeId;
use crate::patch::Patch;
use crate::store::{ListenerId, Store};

/// Predicate deciding whether a `(patches, inverse_patches)` pair is kept.
pub type PatchFilter = Rc<dyn Fn(&[Patch], &[Patch]) -> bool>;

#[derive(Clone)]
pub struct PatchRecorderOptions {
    /// Start recording immediately.
    pub recording: bool,
    pub filter: Option<PatchFilter>,
}

impl Default for PatchRecorderOptions {
    fn default() -> Self {
        Self {
            recording: true,
            filter: None,
        }
    }
}

impl fmt::Debug for PatchRecorderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchRecorderOptions")
            .field("recording", &self.recording)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

/// One delivered batch of patches.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchRecorderEvent {
    /// Subtree root the recorder watches, or the affected tree root for a
    /// store-wide recorder.
    pub target: NodeId,
    pub patches: Vec<Patch>,
    pub inverse_patches: Vec<Patch>,
}

struct RecorderState {
    recording: bool,
    filter: Option<PatchFilter>,
    events: Vec<PatchRecorderEvent>,
}

impl RecorderState {
    fn record(&mut self, target: NodeId, patches: &[Patch], inverse: &[Patch]) {
        if !self.recording {
            return;
        }
        if let Some(filter) = &self.filter {
            if !filter(patches, inverse) {
                return;
            }
        }
        self.events.push(PatchRecorderEvent {
            target,
            patches: patches.to_vec(),
            inverse_patches: inverse.to_vec(),
        });
    }
}

/// Records patch events until disposed.
pub struct PatchRecorder {
    state: Rc<RefCell<RecorderState>>,
    listener: ListenerId,
}

impl PatchRecorder {
    /// Record patches below `subtree`, or in every tree when `None`.
    pub fn new(
        store: &mut Store,
        subtree: Option<NodeId>,
        options: PatchRecorderOptions,
    ) -> Result<Self> {
        let state = Rc::new(RefCell::new(RecorderState {
            recording: options.recording,
            filter: options.filter,
            events: Vec::new(),
        }));
        let sink = state.clone();
        let listener = match subtree {
            Some(root) => store.on_patches(root, move |patches, inverse| {
                sink.borrow_mut().record(root, patches, inverse)
            })?,
            None => store.on_global_patches(move |root, patches, inverse| {
                sink.borrow_mut().record(root, patches, inverse)
            }),
        };
        Ok(Self { state, listener })
    }

    pub fn recording(&self) -> bool {
        self.state.borrow().recording
    }

    pub fn set_recording(&self, recording: bool) {
        self.state.borrow_mut().recording = recording;
    }

    pub fn events(&self) -> Vec<PatchRecorderEvent> {
        self.state.borrow().events.clone()
    }

    pub fn clear(&self) {
        self.state.borrow_mut().events.clear();
    }

    /// Stop listening. Events recorded so far are returned.
    pub fn dispose(self, store: &mut Store) -> Vec<PatchRecorderEvent> {
        store.dispose_listener(self.listener);
        std::mem::take(&mut self.state.borrow_mut().events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn records_and_undoes() {
        let mut store = Store::default();
        let root = store.tweak(json!({"n": 1})).unwrap();
        let recorder =
            PatchRecorder::new(&mut store, Some(root), PatchRecorderOptions::default()).unwrap();

        store.set(root, "n", json!(2)).unwrap();
        store.set(root, "m", json!(3)).unwrap();

        let events = recorder.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].target, root);

        recorder.set_recording(false);
        for event in events.iter().rev() {
            store.apply_patches_reversed(root, &event.inverse_patches).unwrap();
        }
        assert_eq!(store.get_snapshot(root).unwrap(), json!({"n": 1}));
        assert_eq!(recorder.events().len(), 2);
    }

    #[test]
    fn filter_and_global_scope() {
        let mut store = Store::default();
        let a = store.tweak(json!({})).unwrap();
        let b = store.tweak(json!({})).unwrap();
        let only_adds: PatchFilter =
            Rc::new(|patches: &[Patch], _: &[Patch]| patches.iter().all(|p| p.op_name() == "add"));
        let recorder = PatchRecorder::new(
            &mut store,
            None,
            PatchRecorderOptions {
                recording: true,
                filter: Some(only_adds),
            },
        )
        .unwrap();

        store.set(a, "x", json!(1)).unwrap();
        store.set(a, "x", json!(2)).unwrap();
        store.set(b, "y", json!(1)).unwrap();

        let events = recorder.dispose(&mut store);
        assert_eq!(events.iter().map(|e| e.target).collect::<Vec<_>>(), vec![a, b]);

        store.set(b, "z", json!(1)).unwrap();
    }
}
