use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

/// A single-threaded observable value container.
///
/// Holds a current value and notifies registered subscribers synchronously
/// on every [`set`](ObservableProperty::set), in subscription order. There
/// is no coalescing: setting a value equal to the current one still
/// produces exactly one notification per subscriber.
///
/// Cloning an `ObservableProperty` clones the handle; both handles address
/// the same value and subscriber list. Derived views created through
/// [`map`](ObservableProperty::map) are read-only by convention: only the
/// source should publish into them.
pub struct ObservableProperty<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

struct Inner<T> {
    value: T,
    subscribers: Vec<Subscriber<T>>,
    next_id: u64,
    notifying: bool,
    // Ids released while a notification pass had the subscriber list
    // checked out; applied when the pass ends.
    dead: Vec<u64>,
    // Keeps a derived property attached to its source for as long as the
    // derived property itself is alive.
    upstream: Option<Subscription>,
}

struct Subscriber<T> {
    id: u64,
    handler: Box<dyn FnMut(&T)>,
}

impl<T> ObservableProperty<T> {
    /// Create a property holding `initial`.
    pub fn new(initial: T) -> Self {
        ObservableProperty {
            inner: Rc::new(RefCell::new(Inner {
                value: initial,
                subscribers: Vec::new(),
                next_id: 0,
                notifying: false,
                dead: Vec::new(),
                upstream: None,
            })),
        }
    }

    /// Register `handler` to run on every future [`set`](Self::set).
    ///
    /// A subscriber registered from inside a notification pass sees only
    /// subsequent publishes, not the one in flight. Dropping the returned
    /// [`Subscription`] releases it.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: FnMut(&T) + 'static,
        T: 'static,
    {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push(Subscriber {
                id,
                handler: Box::new(handler),
            });
            id
        };

        let weak = Rc::downgrade(&self.inner);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    let mut inner = inner.borrow_mut();
                    if inner.notifying {
                        inner.dead.push(id);
                    } else {
                        inner.subscribers.retain(|s| s.id != id);
                    }
                }
            })),
        }
    }
}

impl<T: Clone> ObservableProperty<T> {
    /// Return a clone of the current value.
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Replace the current value and notify all active subscribers, in
    /// subscription order, before returning.
    ///
    /// # Panics
    ///
    /// Panics when called from inside a notification of the same property:
    /// nested publishes would interleave observers mid-delivery.
    pub fn set(&self, value: T) {
        let mut active = {
            let mut inner = self.inner.borrow_mut();
            assert!(
                !inner.notifying,
                "re-entrant set() on an observable property while it is notifying subscribers"
            );
            inner.notifying = true;
            inner.value = value.clone();
            mem::take(&mut inner.subscribers)
        };

        for sub in active.iter_mut() {
            // A handler earlier in this pass may have released this one.
            let released = self.inner.borrow().dead.contains(&sub.id);
            if !released {
                (sub.handler)(&value);
            }
        }

        let mut inner = self.inner.borrow_mut();
        let added = mem::take(&mut inner.subscribers);
        active.extend(added);
        let dead = mem::take(&mut inner.dead);
        active.retain(|s| !dead.contains(&s.id));
        inner.subscribers = active;
        inner.notifying = false;
    }

    /// Driver-style consumption: invoke `handler` immediately with the
    /// current value, then on every subsequent [`set`](Self::set).
    pub fn drive<F>(&self, mut handler: F) -> Subscription
    where
        F: FnMut(&T) + 'static,
        T: 'static,
    {
        handler(&self.get());
        self.subscribe(handler)
    }

    /// Derive a read-only property that republishes `transform(v)` on
    /// every publish of `v` by this property.
    ///
    /// The derived property is seeded with `transform(current)` and owns
    /// its upstream subscription, so dropping the derived property (and
    /// every clone of its handle) detaches it from this source.
    pub fn map<U, F>(&self, transform: F) -> ObservableProperty<U>
    where
        T: 'static,
        U: Clone + 'static,
        F: Fn(&T) -> U + 'static,
    {
        let derived = ObservableProperty::new(transform(&self.get()));
        let weak = Rc::downgrade(&derived.inner);
        let upstream = self.subscribe(move |value| {
            if let Some(inner) = weak.upgrade() {
                ObservableProperty { inner }.set(transform(value));
            }
        });
        derived.inner.borrow_mut().upstream = Some(upstream);
        derived
    }
}

impl<T> Clone for ObservableProperty<T> {
    fn clone(&self) -> Self {
        ObservableProperty {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Handle controlling the lifetime of one subscriber registration.
///
/// Releasing the handle stops delivery to its handler; releasing twice is
/// a no-op. The handle releases itself when dropped, so it must be kept
/// alive (or parked in a [`DisposeBag`]) for as long as deliveries are
/// wanted.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Stop delivery to the associated handler. Idempotent.
    pub fn release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    /// Move this handle into `bag`, tying its lifetime to the bag's.
    pub fn disposed_by(self, bag: &mut DisposeBag) {
        bag.insert(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

/// A collection of subscription handles released together at one lifetime
/// boundary, typically when the owning screen is torn down.
#[derive(Default)]
pub struct DisposeBag {
    handles: Vec<Subscription>,
}

impl DisposeBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `subscription`; it stays active until the bag is
    /// released or dropped.
    pub fn insert(&mut self, subscription: Subscription) {
        self.handles.push(subscription);
    }

    /// Release every handle in the bag. The bag can be reused afterwards.
    pub fn release_all(&mut self) {
        self.handles.clear();
    }

    /// Number of handles currently held.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Whether the bag holds no handles.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_get_and_set() {
        let prop = ObservableProperty::new(18.0_f64);
        assert_eq!(prop.get(), 18.0);

        prop.set(21.5);
        assert_eq!(prop.get(), 21.5);
    }

    #[test]
    fn test_subscribers_notified_in_registration_order() {
        let prop = ObservableProperty::new(0);
        let order = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&order);
        let _a = prop.subscribe(move |v| first.borrow_mut().push(('a', *v)));
        let second = Rc::clone(&order);
        let _b = prop.subscribe(move |v| second.borrow_mut().push(('b', *v)));

        prop.set(1);
        prop.set(2);

        assert_eq!(
            *order.borrow(),
            vec![('a', 1), ('b', 1), ('a', 2), ('b', 2)]
        );
    }

    #[test]
    fn test_set_equal_value_still_notifies() {
        let prop = ObservableProperty::new(21.5_f64);
        let count = Rc::new(Cell::new(0));

        let counter = Rc::clone(&count);
        let _sub = prop.subscribe(move |_| counter.set(counter.get() + 1));

        prop.set(21.5);
        prop.set(21.5);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_release_stops_one_subscriber_while_others_continue() {
        let prop = ObservableProperty::new(0);
        let a_count = Rc::new(Cell::new(0));
        let b_count = Rc::new(Cell::new(0));

        let a = Rc::clone(&a_count);
        let mut sub_a = prop.subscribe(move |_| a.set(a.get() + 1));
        let b = Rc::clone(&b_count);
        let _sub_b = prop.subscribe(move |_| b.set(b.get() + 1));

        prop.set(1);
        sub_a.release();
        // Double release is a no-op.
        sub_a.release();
        prop.set(2);

        assert_eq!(a_count.get(), 1);
        assert_eq!(b_count.get(), 2);
    }

    #[test]
    fn test_release_from_inside_a_handler_skips_that_subscriber_mid_pass() {
        let prop = ObservableProperty::new(0);
        let b_count = Rc::new(Cell::new(0));
        let b_slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        // A runs first and releases B during the same notification pass.
        let slot = Rc::clone(&b_slot);
        let _sub_a = prop.subscribe(move |_| {
            if let Some(mut sub) = slot.borrow_mut().take() {
                sub.release();
            }
        });
        let b = Rc::clone(&b_count);
        *b_slot.borrow_mut() = Some(prop.subscribe(move |_| b.set(b.get() + 1)));

        prop.set(1);
        prop.set(2);

        assert_eq!(b_count.get(), 0);
        assert_eq!(prop.inner.borrow().subscribers.len(), 1);
    }

    #[test]
    fn test_dropping_handle_releases_subscription() {
        let prop = ObservableProperty::new(0);
        let count = Rc::new(Cell::new(0));

        {
            let counter = Rc::clone(&count);
            let _sub = prop.subscribe(move |_| counter.set(counter.get() + 1));
            prop.set(1);
        }
        prop.set(2);

        assert_eq!(count.get(), 1);
        assert_eq!(prop.inner.borrow().subscribers.len(), 0);
    }

    #[test]
    fn test_drive_replays_latest_value_on_subscription() {
        let prop = ObservableProperty::new(String::from("Mode: On"));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        let _sub = prop.drive(move |text| sink.borrow_mut().push(text.clone()));
        prop.set(String::from("Mode: Off"));

        assert_eq!(*seen.borrow(), vec!["Mode: On", "Mode: Off"]);
    }

    #[test]
    fn test_map_derives_and_supports_multiple_subscribers() {
        let temperature = ObservableProperty::new(10.0_f64);
        let doubled = temperature.map(|t| t * 2.0);
        assert_eq!(doubled.get(), 20.0);

        let a_seen = Rc::new(Cell::new(0.0));
        let b_seen = Rc::new(Cell::new(0.0));
        let a = Rc::clone(&a_seen);
        let _sub_a = doubled.subscribe(move |v| a.set(*v));
        let b = Rc::clone(&b_seen);
        let _sub_b = doubled.subscribe(move |v| b.set(*v));

        temperature.set(15.0);

        assert_eq!(doubled.get(), 30.0);
        assert_eq!(a_seen.get(), 30.0);
        assert_eq!(b_seen.get(), 30.0);
    }

    #[test]
    fn test_dropping_derived_property_detaches_from_source() {
        let source = ObservableProperty::new(1);
        {
            let _derived = source.map(|v| v + 1);
            assert_eq!(source.inner.borrow().subscribers.len(), 1);
        }
        source.set(2);
        assert_eq!(source.inner.borrow().subscribers.len(), 0);
    }

    #[test]
    fn test_subscriber_added_during_notification_sees_only_later_values() {
        let prop = ObservableProperty::new(0);
        let late_seen = Rc::new(RefCell::new(Vec::new()));

        let handle = prop.clone();
        let late = Rc::clone(&late_seen);
        let keep = Rc::new(RefCell::new(Vec::new()));
        let keeper = Rc::clone(&keep);
        let _sub = prop.subscribe(move |v| {
            if *v == 1 {
                let late = Rc::clone(&late);
                keeper
                    .borrow_mut()
                    .push(handle.subscribe(move |v| late.borrow_mut().push(*v)));
            }
        });

        prop.set(1);
        prop.set(2);

        assert_eq!(*late_seen.borrow(), vec![2]);
    }

    #[test]
    #[should_panic(expected = "re-entrant set()")]
    fn test_reentrant_set_is_rejected() {
        let prop = ObservableProperty::new(0);
        let handle = prop.clone();
        let _sub = prop.subscribe(move |v| {
            handle.set(v + 1);
        });
        prop.set(1);
    }

    #[test]
    fn test_dispose_bag_releases_everything_together() {
        let prop = ObservableProperty::new(0);
        let a_count = Rc::new(Cell::new(0));
        let b_count = Rc::new(Cell::new(0));
        let mut bag = DisposeBag::new();

        let a = Rc::clone(&a_count);
        prop.subscribe(move |_| a.set(a.get() + 1)).disposed_by(&mut bag);
        let b = Rc::clone(&b_count);
        prop.subscribe(move |_| b.set(b.get() + 1)).disposed_by(&mut bag);
        assert_eq!(bag.len(), 2);

        prop.set(1);
        bag.release_all();
        assert!(bag.is_empty());
        prop.set(2);

        assert_eq!(a_count.get(), 1);
        assert_eq!(b_count.get(), 1);
    }
}
