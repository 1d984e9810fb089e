use std::any::{Any, type_name};
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use tracing::trace;

use crate::bind::ClassId;
use crate::runtime::{VmError, VmResult};

/// Managed slot wrapping one native object.
///
/// The slot exclusively owns the native value: it is dropped exactly once,
/// when the last `Rc<Instance>` goes away.
pub struct Instance {
    class: ClassId,
    data: RefCell<Box<dyn Any>>,
}

impl Instance {
    pub(crate) fn new(class: ClassId, value: Box<dyn Any>) -> Rc<Self> {
        let inst = Rc::new(Self {
            class,
            data: RefCell::new(value),
        });
        trace!(target: "tether::heap", class = class.index(), ptr = ?Rc::as_ptr(&inst), "allocated native object");
        inst
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.data.try_borrow().map(|b| b.is::<T>()).unwrap_or(false)
    }

    pub fn borrow_as<T: 'static>(&self) -> VmResult<Ref<'_, T>> {
        let guard = self
            .data
            .try_borrow()
            .map_err(|_| VmError::runtime("native object is already borrowed mutably"))?;
        Ref::filter_map(guard, |b| b.downcast_ref::<T>())
            .map_err(|_| VmError::type_error(format!("native object is not a {}", type_name::<T>())))
    }

    pub fn borrow_mut_as<T: 'static>(&self) -> VmResult<RefMut<'_, T>> {
        let guard = self
            .data
            .try_borrow_mut()
            .map_err(|_| VmError::runtime("native object is already borrowed"))?;
        RefMut::filter_map(guard, |b| b.downcast_mut::<T>())
            .map_err(|_| VmError::type_error(format!("native object is not a {}", type_name::<T>())))
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        trace!(target: "tether::heap", class = self.class.index(), "reclaiming native object");
    }
}
