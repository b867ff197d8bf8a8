use std::fmt;
use std::rc::Rc;

/// A callback driven by a [`Ticker`](crate::Ticker).
///
/// Receives `(time_stamp, delta_time)` in milliseconds once per cycle.
/// Identity is by handle: clones of the same `Tick` compare equal, while two
/// ticks built from identical closures do not.
#[derive(Clone)]
pub struct Tick {
    callback: Rc<dyn Fn(f64, f64) + 'static>,
}

impl Tick {
    pub fn new(callback: impl Fn(f64, f64) + 'static) -> Self {
        Self {
            callback: Rc::new(callback),
        }
    }

    pub(crate) fn invoke(&self, time_stamp: f64, delta_time: f64) {
        (self.callback)(time_stamp, delta_time);
    }

    /// Returns true when both handles refer to the same callback.
    pub fn same_as(&self, other: &Tick) -> bool {
        Rc::ptr_eq(&self.callback, &other.callback)
    }
}

impl PartialEq for Tick {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for Tick {}

impl fmt::Debug for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tick")
            .field(&Rc::as_ptr(&self.callback).cast::<()>())
            .finish()
    }
}

