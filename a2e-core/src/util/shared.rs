// Part of the Apple IIe emulator core.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

pub type Shared<T> = Rc<RefCell<T>>;
pub type SharedCell<T> = Rc<Cell<T>>;

/// A non-owning back-reference to a `Shared<T>`. Used by components that
/// need to call back into an owner that already holds a strong reference
/// to them (e.g. a soft-switch handler mutating the bus it is registered
/// on), so the two never form an `Rc` cycle.
pub type WeakShared<T> = Weak<RefCell<T>>;

pub fn new_shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

pub fn new_shared_cell<T>(value: T) -> SharedCell<T> {
    Rc::new(Cell::new(value))
}

pub fn downgrade<T>(shared: &Shared<T>) -> WeakShared<T> {
    Rc::downgrade(shared)
}
