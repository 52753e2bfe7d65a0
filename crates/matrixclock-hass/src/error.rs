//! Error type for registry operations

/// Error type for entity registry operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// An entity with the same name is already registered
    DuplicateName,
    /// The fixed-size entity table is full
    CapacityExceeded,
    /// No entity with the given name is registered
    UnknownEntity,
    /// A derived topic or full name did not fit its buffer
    TopicTooLong,
    /// A discovery or state document did not serialize
    Encode,
}

impl core::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RegistryError::DuplicateName => write!(f, "entity name already registered"),
            RegistryError::CapacityExceeded => write!(f, "entity table full"),
            RegistryError::UnknownEntity => write!(f, "unknown entity"),
            RegistryError::TopicTooLong => write!(f, "derived topic too long"),
            RegistryError::Encode => write!(f, "document serialization failed"),
        }
    }
}
