//! Subscriber lists and subscription handles.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<E> = Rc<RefCell<dyn FnMut(&E)>>;

struct ListenerTable<E> {
    next_id: u64,
    entries: Vec<(u64, Callback<E>)>,
    emitting: bool,
    pending: VecDeque<E>,
}

/// A list of callbacks interested in events of type `E`.
///
/// Emission runs on the caller's thread, in subscription order. An event
/// emitted from inside a listener is queued and delivered to every listener
/// once the current event has been delivered, so no listener is ever
/// re-entered and no event is lost.
pub struct Listeners<E: 'static> {
    table: Rc<RefCell<ListenerTable<E>>>,
}

impl<E: 'static> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> Listeners<E> {
    pub fn new() -> Self {
        Self {
            table: Rc::new(RefCell::new(ListenerTable {
                next_id: 0,
                entries: Vec::new(),
                emitting: false,
                pending: VecDeque::new(),
            })),
        }
    }

    /// Register `callback`. It stays registered until the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&E) + 'static,
    {
        let callback: Callback<E> = Rc::new(RefCell::new(callback));
        let id = {
            let mut table = self.table.borrow_mut();
            let id = table.next_id;
            table.next_id += 1;
            table.entries.push((id, callback));
            id
        };

        let table: Weak<RefCell<ListenerTable<E>>> = Rc::downgrade(&self.table);
        Subscription::new(move || {
            if let Some(table) = table.upgrade() {
                table.borrow_mut().entries.retain(|(entry, _)| *entry != id);
            }
        })
    }

    pub fn len(&self) -> usize {
        self.table.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: Clone + 'static> Listeners<E> {
    /// Deliver `event` to every registered listener.
    ///
    /// Called from inside a listener of this list, `event` is queued and
    /// this returns immediately; the outermost call drains the queue.
    pub fn emit(&self, event: &E) {
        {
            let mut table = self.table.borrow_mut();
            if table.emitting {
                log::trace!("queueing nested emission");
                table.pending.push_back(event.clone());
                return;
            }
            table.emitting = true;
        }

        self.deliver(event);
        loop {
            let next = {
                let mut table = self.table.borrow_mut();
                match table.pending.pop_front() {
                    Some(next) => next,
                    None => {
                        table.emitting = false;
                        break;
                    }
                }
            };
            self.deliver(&next);
        }
    }

    fn deliver(&self, event: &E) {
        // Snapshot so listeners may subscribe or unsubscribe while we iterate.
        let snapshot: Vec<Callback<E>> = self
            .table
            .borrow()
            .entries
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();

        for callback in snapshot {
            (&mut *callback.borrow_mut())(event);
        }
    }
}

impl<E: 'static> fmt::Debug for Listeners<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("len", &self.len())
            .finish()
    }
}

/// Keeps a listener registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Unsubscribe now.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keep the listener registered for as long as the event source lives.
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
