//! Change notifications emitted by the [`Dashboard`](crate::dashboard::Dashboard).

use langstat_data::filter::FilterSelection;

use crate::dashboard::PipelineStatus;

/// Something observable about the dashboard changed.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    /// The pipeline moved to a new state.
    StatusChanged(PipelineStatus),
    /// A successful load replaced the record set.
    DatasetReplaced { records: usize, years: Vec<i32> },
    /// The filter selection changed; aggregates should be recomputed.
    SelectionChanged(FilterSelection),
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Listener invoked synchronously for every event.
pub type Observer = Box<dyn FnMut(&DashboardEvent) + Send>;

/// Registered observers, called in subscription order.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    next_id: u64,
    observers: Vec<(SubscriptionId, Observer)>,
}

impl ObserverRegistry {
    pub(crate) fn subscribe(&mut self, observer: Observer) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    /// `false` when `id` was not registered.
    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    pub(crate) fn notify(&mut self, event: &DashboardEvent) {
        for (_, observer) in self.observers.iter_mut() {
            observer(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }
}
