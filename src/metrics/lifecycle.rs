use std::sync::Arc;

/// Receives one callback per completed step of a run.
///
/// Called synchronously on the run's own thread, in non-decreasing
/// `elapsed_millis` order.
pub trait StepListener: Send + Sync {
    fn step_ended(&self, elapsed_millis: u64, counter: u64);
}

/// Anything that can register and unregister step listeners.
pub trait StepSource {
    fn add_step_listener(&mut self, listener: Arc<dyn StepListener>) -> ListenerId;

    /// `false` when `id` was never registered here or is already gone.
    fn remove_step_listener(&mut self, id: ListenerId) -> bool;
}

/// Handle returned by [`StepSource::add_step_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Listener bookkeeping for `StepSource` implementations.
#[derive(Default)]
pub struct StepListeners {
    next_id: u64,
    listeners: Vec<(ListenerId, Arc<dyn StepListener>)>,
}

impl StepListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: Arc<dyn StepListener>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn step_ended(&self, elapsed_millis: u64, counter: u64) {
        for (_, listener) in &self.listeners {
            listener.step_ended(elapsed_millis, counter);
        }
    }
}
