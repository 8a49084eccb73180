pub mod tracing;

use savefmt::document::{Address, Document, DocumentError, MemoryDocument};
use std::cell::RefCell;
use std::rc::Rc;

/// A memory document the test keeps a handle to after the watcher opened it.
#[derive(Clone)]
pub struct SharedDocument(pub Rc<RefCell<MemoryDocument>>);

impl SharedDocument {
    pub fn new(body: &str) -> Self {
        Self(Rc::new(RefCell::new(MemoryDocument::new(body))))
    }

    pub fn body(&self) -> Vec<u8> {
        self.0.borrow().body().to_vec()
    }
}

impl Document for SharedDocument {
    fn read_body(&mut self) -> Result<Vec<u8>, DocumentError> {
        self.0.borrow_mut().read_body()
    }

    fn set_address(&mut self, addr: Address) -> Result<(), DocumentError> {
        self.0.borrow_mut().set_address(addr)
    }

    fn write_data(&mut self, data: &[u8]) -> Result<(), DocumentError> {
        self.0.borrow_mut().write_data(data)
    }

    fn write_ctl(&mut self, msg: &str) -> Result<(), DocumentError> {
        self.0.borrow_mut().write_ctl(msg)
    }
}
