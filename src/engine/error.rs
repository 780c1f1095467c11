//! Error types for component registration and schema construction.
//!
//! Each error models a single failure mode and carries enough context to make
//! the failure actionable. All errors implement [`std::error::Error`] and
//! [`fmt::Display`], and convert into the aggregate [`EcsError`] via `From`
//! so call sites can bubble failures with `?`.
//!
//! Only construction-time failures are represented here. Hot-path invariant
//! breaks — fetching a component a record's schema does not contain, or using
//! a stale index past the live record count — indicate corrupted bookkeeping
//! and terminate the process instead of returning an error (see the crate
//! docs on failure semantics).

use std::fmt;

use crate::engine::types::ComponentId;

/// Returned when registering a component after the registry was frozen.
///
/// Component identity must be stable before any schema or storage is built;
/// freezing marks that point. A registration attempt past it is a startup
/// ordering bug in the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryFrozenError {
    /// Type name of the component whose registration was rejected.
    pub type_name: &'static str,
}

impl fmt::Display for RegistryFrozenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "component registry is frozen; cannot register {}",
            self.type_name
        )
    }
}

impl std::error::Error for RegistryFrozenError {}

/// Returned when the registry has no ids left to assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentCapacityError {
    /// Configured maximum number of component kinds.
    pub capacity: usize,
}

impl fmt::Display for ComponentCapacityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "component capacity exhausted (limit {})",
            self.capacity
        )
    }
}

impl std::error::Error for ComponentCapacityError {}

/// Returned when a schema references a component id the registry never
/// assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownComponentError {
    /// The unregistered component id.
    pub component_id: ComponentId,
}

impl fmt::Display for UnknownComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component id {} is not registered", self.component_id)
    }
}

impl std::error::Error for UnknownComponentError {}

/// Returned when a schema lists the same component more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateComponentError {
    /// The repeated component id.
    pub component_id: ComponentId,
    /// Display name of the repeated component.
    pub name: &'static str,
}

impl fmt::Display for DuplicateComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "component {} (id {}) listed twice in one schema",
            self.name, self.component_id
        )
    }
}

impl std::error::Error for DuplicateComponentError {}

/// Aggregate error for ECS construction paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcsError {
    /// Registration rejected because the registry is frozen.
    Frozen(RegistryFrozenError),
    /// Registration rejected because component capacity is exhausted.
    Capacity(ComponentCapacityError),
    /// Schema referenced an unregistered component.
    UnknownComponent(UnknownComponentError),
    /// Schema listed a component twice.
    DuplicateComponent(DuplicateComponentError),
}

impl fmt::Display for EcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcsError::Frozen(e) => e.fmt(f),
            EcsError::Capacity(e) => e.fmt(f),
            EcsError::UnknownComponent(e) => e.fmt(f),
            EcsError::DuplicateComponent(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for EcsError {}

impl From<RegistryFrozenError> for EcsError {
    fn from(e: RegistryFrozenError) -> Self {
        EcsError::Frozen(e)
    }
}

impl From<ComponentCapacityError> for EcsError {
    fn from(e: ComponentCapacityError) -> Self {
        EcsError::Capacity(e)
    }
}

impl From<UnknownComponentError> for EcsError {
    fn from(e: UnknownComponentError) -> Self {
        EcsError::UnknownComponent(e)
    }
}

impl From<DuplicateComponentError> for EcsError {
    fn from(e: DuplicateComponentError) -> Self {
        EcsError::DuplicateComponent(e)
    }
}

/// Result alias for ECS construction paths.
pub type EcsResult<T> = Result<T, EcsError>;
