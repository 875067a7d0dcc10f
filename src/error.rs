//! Error types for the arena allocator

use core::fmt;

/// Errors that can occur during arena operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaError {
    /// Request exceeds the largest block class
    TooLarge,
    /// Request exceeds the bytes currently available
    OutOfSpace,
    /// No block could be found or synthesized by splitting
    Fragmented,
    /// No block starts at the given offset
    NotABlock,
    /// The block at the given offset is already free
    AlreadyFree,
    /// Reallocation could not obtain a new block; the old block is intact
    ReallocNoSpace,
    /// Arena not initialised
    NotInitialised,
    /// Arena already initialised
    AlreadyInitialised,
    /// Invalid initial partition configuration
    InvalidConfig,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge => write!(f, "request exceeds largest block class"),
            Self::OutOfSpace => write!(f, "request exceeds available space"),
            Self::Fragmented => write!(f, "no block available even via splitting"),
            Self::NotABlock => write!(f, "no block starts at this offset"),
            Self::AlreadyFree => write!(f, "block is already free"),
            Self::ReallocNoSpace => write!(f, "reallocation failed; old block intact"),
            Self::NotInitialised => write!(f, "arena not initialised"),
            Self::AlreadyInitialised => write!(f, "arena already initialised"),
            Self::InvalidConfig => write!(f, "invalid partition configuration"),
        }
    }
}

/// Errors that can occur while validating an initial partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A class was given more blocks than its table capacity
    CapacityExceeded,
    /// The partition claims more bytes than the arena holds
    ArenaOverflow,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded => write!(f, "initial length exceeds table capacity"),
            Self::ArenaOverflow => write!(f, "partition exceeds arena size"),
        }
    }
}

impl From<ConfigError> for ArenaError {
    fn from(_: ConfigError) -> Self {
        ArenaError::InvalidConfig
    }
}
