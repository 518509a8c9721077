//! # Behaviors and Capabilities
//!
//! A [`Behavior`] is a unit of logic attached to a [`Node`](crate::Node).
//! A capability is any object-safe trait a behavior chooses to expose,
//! addressed as a trait object type such as `dyn Armor`.
//!
//! Rust has no runtime "does this value implement trait X" query, so each
//! behavior declares its capabilities once, when it is attached, through
//! [`Behavior::register_capabilities`]. The resulting table maps the
//! capability's `TypeId` to a cast from the erased instance back to
//! `&mut dyn Capability`.
//!
//! # Example
//!
//! ```rust,ignore
//! trait Armor {
//!     fn apply_damage(&mut self, damage: i32) -> Steps;
//! }
//!
//! struct Plate { health: i32 }
//!
//! impl Behavior for Plate {
//!     fn register_capabilities(capabilities: &mut Capabilities<Self>) {
//!         capabilities.add::<dyn Armor>(|plate| plate);
//!     }
//! }
//! ```

use crate::{error::DispatchError, sync::lock};
use std::{
    any::{Any, TypeId, type_name},
    collections::HashMap,
    marker::PhantomData,
    sync::{
        Arc, Mutex, TryLockError,
        atomic::{AtomicBool, Ordering},
    },
};

/// A unit of logic that can be attached to a node.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Behavior`",
    label = "missing `Behavior` implementation",
    note = "Implement `Behavior` (or `#[derive(Behavior)]`) to attach `{Self}` to a node."
)]
pub trait Behavior: Any + Send {
    /// Declare the capability interfaces this behavior provides.
    fn register_capabilities(capabilities: &mut Capabilities<Self>)
    where
        Self: Sized;
}

/// Builder collecting the capabilities of a behavior type `B`.
pub struct Capabilities<B> {
    table: CapabilityTable,
    _behavior: PhantomData<fn(&mut B)>,
}

impl<B: Behavior> Capabilities<B> {
    pub(crate) fn new() -> Self {
        Self {
            table: CapabilityTable::default(),
            _behavior: PhantomData,
        }
    }

    /// Register capability `C` with the cast from `B` to it.
    ///
    /// The cast is almost always the identity closure `|b| b`; the unsizing
    /// coercion to `&mut C` happens inside it.
    pub fn add<C: ?Sized + 'static>(&mut self, cast: fn(&mut B) -> &mut C) -> &mut Self {
        let caster: Box<dyn CastTo<C>> = Box::new(TypedCast { cast });
        self.table.casters.insert(TypeId::of::<C>(), Box::new(caster));
        self.table.names.push(type_name::<C>());
        self
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.table.casters.len()
    }

    /// Whether no capability has been registered.
    pub fn is_empty(&self) -> bool {
        self.table.casters.is_empty()
    }
}

trait CastTo<C: ?Sized>: Send + Sync {
    fn cast<'a>(&self, instance: &'a mut dyn Any) -> Option<&'a mut C>;
}

struct TypedCast<B, C: ?Sized> {
    cast: fn(&mut B) -> &mut C,
}

impl<B: 'static, C: ?Sized + 'static> CastTo<C> for TypedCast<B, C> {
    fn cast<'a>(&self, instance: &'a mut dyn Any) -> Option<&'a mut C> {
        instance.downcast_mut::<B>().map(self.cast)
    }
}

#[derive(Default)]
struct CapabilityTable {
    casters: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    names: Vec<&'static str>,
}

impl CapabilityTable {
    fn caster<C: ?Sized + 'static>(&self) -> Option<&dyn CastTo<C>> {
        let entry: &(dyn Any + Send + Sync) = &**self.casters.get(&TypeId::of::<C>())?;
        entry
            .downcast_ref::<Box<dyn CastTo<C>>>()
            .map(|caster| caster.as_ref())
    }
}

/// Controls whether an attached behavior receives messages.
///
/// Returned by [`Node::attach`](crate::Node::attach) and shared with the
/// attached [`BehaviorCell`]. The flag lives outside the behavior's mutex,
/// so a running handler may disable itself or a sibling without contention.
///
/// The flag is read when a dispatch collects its handlers. A dispatch that
/// already collected the behavior still delivers to it; the change applies
/// from the next dispatch on. Once the behavior is removed from its node
/// (for example by destroying the node), the handle no longer affects
/// anything.
#[derive(Debug, Clone)]
pub struct EnabledHandle(Arc<AtomicBool>);

impl EnabledHandle {
    fn enabled() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Whether the behavior receives messages.
    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Resume delivery to the behavior.
    pub fn enable(&self) {
        self.set_enabled(true);
    }

    /// Stop delivery to the behavior.
    pub fn disable(&self) {
        self.set_enabled(false);
    }

    /// Set whether the behavior receives messages.
    pub fn set_enabled(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Release);
    }
}

/// A behavior instance as stored on a node.
///
/// The instance sits behind its own mutex so a handler may dispatch to its
/// siblings while it runs. Dispatching back into a behavior that is already
/// executing yields [`DispatchError::HandlerBusy`] instead of deadlocking.
pub struct BehaviorCell {
    type_id: TypeId,
    type_name: &'static str,
    instance: Mutex<Box<dyn Any + Send>>,
    enabled: EnabledHandle,
    capabilities: CapabilityTable,
}

impl BehaviorCell {
    /// Wrap a behavior, collecting its capability table.
    pub fn new<B: Behavior>(behavior: B) -> Self {
        let mut capabilities = Capabilities::<B>::new();
        B::register_capabilities(&mut capabilities);
        Self {
            type_id: TypeId::of::<B>(),
            type_name: type_name::<B>(),
            instance: Mutex::new(Box::new(behavior)),
            enabled: EnabledHandle::enabled(),
            capabilities: capabilities.table,
        }
    }

    /// The concrete behavior type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the behavior's concrete type is `B`.
    pub fn is<B: Behavior>(&self) -> bool {
        self.type_id == TypeId::of::<B>()
    }

    /// Names of the capabilities this behavior registered.
    pub fn capability_names(&self) -> &[&'static str] {
        &self.capabilities.names
    }

    /// Check if the behavior is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled.is_enabled()
    }

    /// Get a handle for toggling this behavior's enabled state.
    pub fn enabled_handle(&self) -> EnabledHandle {
        self.enabled.clone()
    }

    /// Whether the behavior registered capability `C`.
    pub fn provides<C: ?Sized + 'static>(&self) -> bool {
        self.capabilities.casters.contains_key(&TypeId::of::<C>())
    }

    /// Run `f` against the behavior viewed as capability `C`.
    pub fn with_capability<C, R>(&self, f: impl FnOnce(&mut C) -> R) -> Result<R, DispatchError>
    where
        C: ?Sized + 'static,
    {
        let mismatch = || DispatchError::CapabilityMismatch {
            expected: type_name::<C>(),
            actual: self.type_name,
        };
        let caster = self.capabilities.caster::<C>().ok_or_else(mismatch)?;
        let mut guard = match self.instance.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                return Err(DispatchError::HandlerBusy {
                    handler: self.type_name,
                });
            }
        };
        let target = caster.cast(&mut **guard).ok_or_else(mismatch)?;
        Ok(f(target))
    }

    /// Run `f` against the behavior as its concrete type, if it is a `B`.
    ///
    /// Blocks if the behavior is executing on another thread.
    pub fn with_concrete<B: Behavior, R>(&self, f: impl FnOnce(&mut B) -> R) -> Option<R> {
        let mut guard = lock(&self.instance);
        (&mut **guard).downcast_mut::<B>().map(f)
    }
}

impl std::fmt::Debug for BehaviorCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorCell")
            .field("type_name", &self.type_name)
            .field("enabled", &self.is_enabled())
            .field("capabilities", &self.capabilities.names)
            .finish()
    }
}
