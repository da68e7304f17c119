use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

type Subscriber<T> = Box<dyn Fn(&T) + Send + Sync>;

/// A small observed-value cell. Two controls that must stay in sync
/// (a slider and its paired text input, say) hold clones of the same
/// `Shared` and write through it; subscribers hear every write.
pub struct Shared<T> {
    inner: Arc<SharedInner<T>>,
}

struct SharedInner<T> {
    value: Mutex<T>,
    subscribers: Mutex<Vec<Subscriber<T>>>,
}

impl<T: Clone> Shared<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(SharedInner {
                value: Mutex::new(value),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set(&self, value: T) {
        {
            let mut slot = self
                .inner
                .value
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *slot = value.clone();
        }
        let subscribers = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for subscriber in subscribers.iter() {
            subscriber(&value);
        }
    }

    pub fn subscribe(&self, subscriber: impl Fn(&T) + Send + Sync + 'static) {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(subscriber));
    }
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Shared").field(&self.get()).finish()
    }
}
