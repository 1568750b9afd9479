//! The Syscall Registry (spec §4.3): a number-indexed and name-indexed
//! lookup over the static [`SyscallSchema`] table, built once per session
//! and treated as immutable thereafter (spec §3 invariant 3).
//!
//! The reference tracer this was distilled from assembles its syscall
//! tables by importing several module-level lists; spec §9 calls that out
//! for redesign ("global syscall tables -> explicit Registry object"). This
//! module is the replacement: a single object, built once, queried by
//! number or name, and the only place that is allowed to hand out a
//! [`SyscallSchema`].

use std::collections::HashMap;

use crate::decode::{buffer, flags, sockaddr, structs, Decoder, ReturnDecoder};

/// Declared direction of a parameter (spec §3 Parameter Descriptor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
    InOut,
}

/// Where a memory-backed decoder finds the length/count it needs, when
/// that length isn't a fixed struct size.
#[derive(Debug, Clone, Copy)]
pub enum Aux {
    /// No auxiliary length; the decoder uses a fixed size or its own
    /// fallback cap.
    None,
    /// Read the length/count from another declared argument, by index.
    Arg(usize),
    /// Use the syscall's own (successful) return value as the length —
    /// e.g. the number of bytes a `read(2)` actually filled.
    ReturnValue,
}

/// One parameter in a [`SyscallSchema`] (spec §3).
#[derive(Clone, Copy)]
pub struct ParamDescriptor {
    pub name: &'static str,
    pub type_name: &'static str,
    pub direction: Direction,
    pub decoder: Decoder,
    pub aux: Aux,
}

/// Closed category tag set used for filtering and summarization (spec §2,
/// §4.8, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    File,
    Network,
    Process,
    Memory,
    Signal,
    Ipc,
    Thread,
    Time,
    Sysinfo,
    Security,
    Debug,
    Misc,
}

impl Category {
    /// Parse a `--trace`/`-e` category token (spec §6's closed set).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "file" => Self::File,
            "network" => Self::Network,
            "process" => Self::Process,
            "memory" => Self::Memory,
            "signal" => Self::Signal,
            "ipc" => Self::Ipc,
            "thread" => Self::Thread,
            "time" => Self::Time,
            "sysinfo" => Self::Sysinfo,
            "security" => Self::Security,
            "debug" => Self::Debug,
            "misc" => Self::Misc,
            _ => return None,
        })
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Network => "network",
            Self::Process => "process",
            Self::Memory => "memory",
            Self::Signal => "signal",
            Self::Ipc => "ipc",
            Self::Thread => "thread",
            Self::Time => "time",
            Self::Sysinfo => "sysinfo",
            Self::Security => "security",
            Self::Debug => "debug",
            Self::Misc => "misc",
        }
    }
}

/// A syscall's full schema: number, name, parameters, return rendering,
/// and category (spec §3).
pub struct SyscallSchema {
    pub number: u32,
    pub name: &'static str,
    pub category: Category,
    pub params: &'static [ParamDescriptor],
    pub ret: ReturnDecoder,
}

/// Shorthand for declaring a [`ParamDescriptor`] in the static table below.
macro_rules! param {
    ($name:literal, $ty:literal, $dir:ident, $decoder:expr) => {
        ParamDescriptor {
            name: $name,
            type_name: $ty,
            direction: Direction::$dir,
            decoder: $decoder,
            aux: Aux::None,
        }
    };
    ($name:literal, $ty:literal, $dir:ident, $decoder:expr, aux = $aux:expr) => {
        ParamDescriptor {
            name: $name,
            type_name: $ty,
            direction: Direction::$dir,
            decoder: $decoder,
            aux: $aux,
        }
    };
}

pub(crate) use param;

include!("registry_data.rs");

/// An immutable, session-wide mapping from syscall number and name to
/// schema (spec §4.3).
pub struct Registry {
    by_number: HashMap<u32, &'static SyscallSchema>,
    by_name: HashMap<&'static str, &'static SyscallSchema>,
}

impl Registry {
    /// Build the registry from the static schema table. Cheap enough
    /// (a few hundred entries) to do unconditionally at session start.
    #[must_use]
    pub fn build() -> Self {
        let mut by_number = HashMap::with_capacity(SYSCALLS.len());
        let mut by_name = HashMap::with_capacity(SYSCALLS.len());
        for schema in SYSCALLS {
            by_number.insert(schema.number, schema);
            by_name.insert(schema.name, schema);
        }
        Self { by_number, by_name }
    }

    /// Look up a schema by its BSD syscall number.
    #[must_use]
    pub fn lookup(&self, number: u32) -> Option<&'static SyscallSchema> {
        self.by_number.get(&number).copied()
    }

    /// Look up a schema by name, case-insensitively (spec §4.3: "by
    /// lowercase name, for filtering"). Callers pass an already-lowercased
    /// needle; the table itself is stored in its canonical (lowercase)
    /// spelling.
    #[must_use]
    pub fn lookup_by_name(&self, name: &str) -> Option<&'static SyscallSchema> {
        self.by_name.get(name).copied()
    }

    /// Total number of schemas known to this registry (used by
    /// `--list-syscalls`).
    #[must_use]
    pub fn len(&self) -> usize {
        SYSCALLS.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        SYSCALLS.is_empty()
    }

    /// Iterate all known schemas, in table order (used by
    /// `--list-syscalls`).
    pub fn iter(&self) -> impl Iterator<Item = &'static SyscallSchema> {
        SYSCALLS.iter()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_looks_up_by_number_and_name() {
        let reg = Registry::build();
        let by_num = reg.lookup(SYSCALLS[0].number).unwrap();
        let by_name = reg.lookup_by_name(SYSCALLS[0].name).unwrap();
        assert_eq!(by_num.name, by_name.name);
    }

    #[test]
    fn unknown_number_and_name_return_none() {
        let reg = Registry::build();
        assert!(reg.lookup(0xffff_ffff).is_none());
        assert!(reg.lookup_by_name("not_a_real_syscall").is_none());
    }

    #[test]
    fn every_schema_number_is_unique() {
        let reg = Registry::build();
        assert_eq!(reg.len(), SYSCALLS.len());
        let mut seen = std::collections::HashSet::new();
        for s in SYSCALLS {
            assert!(seen.insert(s.number), "duplicate syscall number {}", s.number);
        }
    }

    #[test]
    fn names_are_stored_lowercase() {
        for s in SYSCALLS {
            assert_eq!(s.name, s.name.to_ascii_lowercase());
        }
    }
}
