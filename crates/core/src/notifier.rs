/// List of keyed observers that are invoked in insertion order. Each
/// observer can be disabled without being removed, which lets an owner
/// silence its own callback around a programmatic change.
pub struct Notifier<A: ?Sized> {
    observers: Vec<Observer<A>>,
}

struct Observer<A: ?Sized> {
    key: String,
    enabled: bool,
    func: Box<dyn FnMut(&A)>,
}

impl<A: ?Sized> Default for Notifier<A> {
    fn default() -> Self {
        Self {
            observers: Vec::new(),
        }
    }
}

impl<A: ?Sized> Notifier<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer(&mut self, key: impl Into<String>, func: impl FnMut(&A) + 'static) {
        let key = key.into();
        assert!(
            !self.has_observer(&key),
            "observer {key:?} added twice to notifier"
        );
        self.observers.push(Observer {
            key,
            enabled: true,
            func: Box::new(func),
        });
    }

    pub fn remove_observer(&mut self, key: &str) {
        let before = self.observers.len();
        self.observers.retain(|observer| observer.key != key);
        assert!(
            self.observers.len() < before,
            "observer {key:?} not found in notifier"
        );
    }

    pub fn enable_observer(&mut self, key: &str, enabled: bool) {
        let observer = self
            .observers
            .iter_mut()
            .find(|observer| observer.key == key);
        match observer {
            Some(observer) => observer.enabled = enabled,
            None => panic!("observer {key:?} not found in notifier"),
        }
    }

    pub fn is_observer_enabled(&self, key: &str) -> bool {
        self.observers
            .iter()
            .any(|observer| observer.key == key && observer.enabled)
    }

    pub fn has_observer(&self, key: &str) -> bool {
        self.observers.iter().any(|observer| observer.key == key)
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn notify(&mut self, args: &A) {
        for observer in self.observers.iter_mut().filter(|o| o.enabled) {
            (observer.func)(args);
        }
    }
}
