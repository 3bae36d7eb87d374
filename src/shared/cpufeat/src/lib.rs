#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[cfg(test)]
mod tests;

use alloc::{format, string::String, vec::Vec};

/// Output register slots of one `cpuid` invocation, valued as their index
/// into the snapshot.
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Eax = 0,
    Ebx = 1,
    Ecx = 2,
    Edx = 3,
}

/// The four output registers of a single CPU identification query at one
/// leaf value. Always constructed zeroed, so no bits from a prior leaf can
/// leak into a later decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafSnapshot {
    registers: [u32; 4],
}

impl LeafSnapshot {
    pub const fn zeroed() -> Self {
        Self { registers: [0; 4] }
    }

    pub const fn from_registers(registers: [u32; 4]) -> Self {
        Self { registers }
    }

    /// Issues one `cpuid` query (sub-leaf 0) at the given leaf, capturing
    /// all four output registers into a fresh snapshot.
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    pub fn query(leaf: u32) -> Self {
        let result = raw_cpuid::cpuid!(leaf);
        Self { registers: [result.eax, result.ebx, result.ecx, result.edx] }
    }

    pub const fn register(&self, register: Register) -> u32 {
        self.registers[register as usize]
    }

    pub const fn bit(&self, register: Register, bit: u8) -> bool {
        (self.register(register) >> bit) & 1 == 1
    }
}

/// Two-state label reported for every feature bit.
pub const fn label(set: bool) -> &'static str {
    if set {
        "enable"
    } else {
        "disable"
    }
}

/// One reportable CPU feature: the leaf to query and the bit that carries it.
#[derive(Debug, Clone, Copy)]
pub struct Feature {
    pub name: &'static str,
    pub leaf: u32,
    pub register: Register,
    pub bit: u8,
}

/// Report order. Entries sharing a leaf are contiguous, so a reporting loop
/// queries each of the four leaves exactly once.
pub const FEATURES: [Feature; 13] = [
    Feature { name: "SGX", leaf: 0x07, register: Register::Ebx, bit: 2 },
    Feature { name: "SMEP", leaf: 0x07, register: Register::Ebx, bit: 7 },
    Feature { name: "INVPCID", leaf: 0x07, register: Register::Ebx, bit: 10 },
    Feature { name: "MPX", leaf: 0x07, register: Register::Ebx, bit: 14 },
    Feature { name: "SMAP", leaf: 0x07, register: Register::Ebx, bit: 20 },
    Feature { name: "CLFLUSHOPT", leaf: 0x07, register: Register::Ebx, bit: 23 },
    Feature { name: "PREFETCHWT1", leaf: 0x07, register: Register::Ecx, bit: 1 },
    Feature { name: "PKU", leaf: 0x07, register: Register::Ecx, bit: 3 },
    Feature { name: "OSPKE", leaf: 0x07, register: Register::Ecx, bit: 4 },
    Feature {
        name: "ARAT. APIC-Timer-always-running feature",
        leaf: 0x06,
        register: Register::Eax,
        bit: 2,
    },
    Feature { name: "Invariant TSC", leaf: 0x8000_0007, register: Register::Edx, bit: 8 },
    Feature { name: "x2APIC", leaf: 0x01, register: Register::Ecx, bit: 21 },
    Feature { name: "TSC-Deadline", leaf: 0x01, register: Register::Ecx, bit: 24 },
];

/// Splits a packed UEFI revision word into its (major, minor) pair.
pub const fn split_revision(packed: u32) -> (u32, u32) {
    (packed >> 16, packed & 0xffff)
}

/// Upper bound on a rendered report line, in character units, terminator
/// included.
pub const MAX_LINE_UNITS: usize = 256;

/// One reported field, rendered once and carried in two forms: the console
/// form (line-feed terminated) and the file form (ASCII projection, CRLF
/// terminated). Both forms encode the same field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    content: String,
}

impl ReportLine {
    pub fn text_field(name: &str, value: &str) -> Self {
        Self::new(format!("{}: {}", name, value))
    }

    pub fn hex_field(name: &str, value: u32) -> Self {
        Self::new(format!("{}: 0x{:x}", name, value))
    }

    pub fn version_field(name: &str, major: u32, minor: u32) -> Self {
        Self::new(format!("{}: {}.{}", name, major, minor))
    }

    fn new(mut content: String) -> Self {
        // Leave room for the two-unit CRLF terminator of the file form.
        truncate_units(&mut content, MAX_LINE_UNITS - 2);
        Self { content }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn console_form(&self) -> String {
        let mut out = String::with_capacity(self.content.len() + 1);
        out.push_str(&self.content);
        out.push('\n');
        out
    }

    pub fn file_form(&self) -> Vec<u8> {
        let mut out = ascii_projection(&self.content);
        out.extend_from_slice(b"\r\n");
        out
    }
}

fn truncate_units(content: &mut String, max_units: usize) {
    if let Some((index, _)) = content.char_indices().nth(max_units) {
        content.truncate(index);
    }
}

/// Lossy projection to one byte per character, keeping the low byte of each
/// unit. Faithful for ASCII input; anything wider corrupts silently, which
/// matches what consumers of the report file expect.
pub fn ascii_projection(content: &str) -> Vec<u8> {
    content.chars().map(|c| (c as u32 & 0xff) as u8).collect()
}
