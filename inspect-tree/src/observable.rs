//! Observable collection and value slots consumed by a rendering layer.

use std::cell::RefCell;
use std::fmt;

use crate::event::{Listeners, Subscription};

/// Structural change of an [`ObservableVec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionChange<T> {
    /// `item` now sits at `index`.
    Added { index: usize, item: T },
    /// `item` was removed from `index`.
    Removed { index: usize, item: T },
    /// Every item was dropped at once.
    Reset,
}

/// Notifications for a change that is already stored but not announced yet.
///
/// Lets an owner update several observables first and only then let
/// listeners run, so every listener sees the complete new state.
#[must_use = "a deferred change is not announced until emitted"]
pub struct Deferred<'a, E: Clone + 'static> {
    listeners: &'a Listeners<E>,
    events: Vec<E>,
}

impl<E: Clone + 'static> Deferred<'_, E> {
    pub fn emit(self) {
        for event in &self.events {
            self.listeners.emit(event);
        }
    }
}

/// Ordered sequence that announces every structural change.
///
/// Listeners run after the mutation is complete, so reading the vec from a
/// callback sees the new contents.
pub struct ObservableVec<T: Clone + 'static> {
    items: RefCell<Vec<T>>,
    listeners: Listeners<CollectionChange<T>>,
}

impl<T: Clone + 'static> Default for ObservableVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> ObservableVec<T> {
    pub fn new() -> Self {
        Self {
            items: RefCell::new(Vec::new()),
            listeners: Listeners::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.items.borrow().get(index).cloned()
    }

    /// Snapshot of the current contents.
    pub fn to_vec(&self) -> Vec<T> {
        self.items.borrow().clone()
    }

    pub fn push(&self, item: T) {
        let index = {
            let mut items = self.items.borrow_mut();
            items.push(item.clone());
            items.len() - 1
        };
        self.listeners.emit(&CollectionChange::Added { index, item });
    }

    pub fn remove(&self, index: usize) -> Option<T> {
        let item = {
            let mut items = self.items.borrow_mut();
            if index >= items.len() {
                return None;
            }
            items.remove(index)
        };
        self.listeners.emit(&CollectionChange::Removed {
            index,
            item: item.clone(),
        });
        Some(item)
    }

    /// Drop every item. Always announces a reset.
    pub fn clear(&self) {
        self.items.borrow_mut().clear();
        self.listeners.emit(&CollectionChange::Reset);
    }

    /// Swap in `items`, announcing a reset followed by one addition per
    /// item. All of `items` is stored before the reset is announced.
    pub fn replace(&self, items: impl IntoIterator<Item = T>) {
        self.replace_deferred(items).emit();
    }

    /// Like [`replace`](Self::replace), but leaves announcing to the caller.
    pub fn replace_deferred(
        &self,
        items: impl IntoIterator<Item = T>,
    ) -> Deferred<'_, CollectionChange<T>> {
        let mut stored = self.items.borrow_mut();
        stored.clear();
        stored.extend(items);

        let mut events = Vec::with_capacity(stored.len() + 1);
        events.push(CollectionChange::Reset);
        events.extend(
            stored
                .iter()
                .enumerate()
                .map(|(index, item)| CollectionChange::Added {
                    index,
                    item: item.clone(),
                }),
        );
        Deferred {
            listeners: &self.listeners,
            events,
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&CollectionChange<T>) + 'static,
    {
        self.listeners.subscribe(callback)
    }

    pub fn on_added<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(usize, &T) + 'static,
    {
        self.subscribe(move |change| {
            if let CollectionChange::Added { index, item } = change {
                callback(*index, item);
            }
        })
    }

    pub fn on_removed<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(usize, &T) + 'static,
    {
        self.subscribe(move |change| {
            if let CollectionChange::Removed { index, item } = change {
                callback(*index, item);
            }
        })
    }

    pub fn on_reset<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut() + 'static,
    {
        self.subscribe(move |change| {
            if let CollectionChange::Reset = change {
                callback();
            }
        })
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for ObservableVec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableVec")
            .field("items", &*self.items.borrow())
            .field("listeners", &self.listeners)
            .finish()
    }
}

/// Single value slot that announces changes.
pub struct Observable<T: Clone + 'static> {
    value: RefCell<T>,
    listeners: Listeners<T>,
}

impl<T: Clone + Default + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
            listeners: Listeners::new(),
        }
    }

    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Store `value` and notify unconditionally.
    pub fn replace(&self, value: T) {
        self.replace_deferred(value).emit();
    }

    /// Store `value` now; the returned notification fires when emitted.
    pub fn replace_deferred(&self, value: T) -> Deferred<'_, T> {
        *self.value.borrow_mut() = value.clone();
        Deferred {
            listeners: &self.listeners,
            events: vec![value],
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&T) + 'static,
    {
        self.listeners.subscribe(callback)
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Store `value`, notifying only when it differs from the current one.
    /// Returns whether it changed.
    pub fn set(&self, value: T) -> bool {
        match self.set_deferred(value) {
            Some(change) => {
                change.emit();
                true
            }
            None => false,
        }
    }

    /// Store `value` if it differs from the current one, returning the
    /// notification to emit once the caller's state is consistent.
    pub fn set_deferred(&self, value: T) -> Option<Deferred<'_, T>> {
        let mut current = self.value.borrow_mut();
        if *current == value {
            return None;
        }
        *current = value.clone();
        Some(Deferred {
            listeners: &self.listeners,
            events: vec![value],
        })
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.value.borrow())
            .field("listeners", &self.listeners)
            .finish()
    }
}
