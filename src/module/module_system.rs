//! Reusable declaration units.

use crate::module::Module;

/// A unit of declarations that can be applied to any [`Module`].
///
/// Lets libraries ship their bindings as a value instead of a function that
/// takes a module.
///
/// # Example
///
/// ```rust
/// use ferrous_inject::{injectable, Configure, Injector, Module, Resolver};
///
/// pub struct Pool {
///     pub size: usize,
/// }
/// injectable!(Pool);
///
/// pub struct Storage {
///     pub pool_size: usize,
/// }
///
/// impl Configure for Storage {
///     fn configure(self, module: &mut Module) {
///         module.bind::<Pool>().to_singleton(Pool { size: self.pool_size });
///     }
/// }
///
/// let module = Module::from_config(Storage { pool_size: 4 });
/// let injector = Injector::new([module]).unwrap();
/// assert_eq!(injector.get::<Pool>().unwrap().size, 4);
/// ```
pub trait Configure {
    /// Declares this unit's bindings into `module`.
    fn configure(self, module: &mut Module);
}

impl<F> Configure for F
where
    F: FnOnce(&mut Module),
{
    fn configure(self, module: &mut Module) {
        self(module)
    }
}
