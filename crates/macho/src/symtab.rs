//! `LC_SYMTAB` / `nlist_64` parsing and string table lookup.

use crate::header::{le_u32, le_u64, MachOError};

/// Load command type: symbol table.
pub(crate) const LC_SYMTAB: u32 = 0x2;

/// Size of a `symtab_command`, including its 8-byte load command header.
const SYMTAB_CMD_SIZE: usize = 24;

/// Size of one `nlist_64` entry.
const NLIST_64_SIZE: usize = 16;

/// `n_type` mask selecting the stab/type bits.
const N_STAB: u8 = 0xe0;
/// `n_type` mask selecting the symbol type bits.
const N_TYPE: u8 = 0x0e;
/// `n_type` value: symbol is defined in a section (has a valid `n_value`).
const N_SECT: u8 = 0x0e;

/// A parsed `LC_SYMTAB` load command.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SymtabCommand {
    pub symoff: u32,
    pub nsyms: u32,
    pub stroff: u32,
    pub strsize: u32,
}

impl SymtabCommand {
    pub(crate) fn parse(data: &[u8], offset: usize) -> Result<Self, MachOError> {
        if offset + SYMTAB_CMD_SIZE > data.len() {
            return Err(MachOError::Truncated);
        }
        let b = &data[offset..];
        Ok(Self {
            symoff: le_u32(b, 8),
            nsyms: le_u32(b, 12),
            stroff: le_u32(b, 16),
            strsize: le_u32(b, 20),
        })
    }
}

/// A resolved, named symbol with its load address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Demangled-or-not symbol name as it appears in the string table.
    pub name: String,
    /// Symbol value — for a defined symbol, its address (link-edit base,
    /// i.e. the caller must add the image's slide/load bias).
    pub address: u64,
    /// `true` if the symbol is externally visible (`N_EXT`).
    pub external: bool,
}

/// Extract every defined, named symbol from a `LC_SYMTAB` table.
///
/// Returns symbols sorted by ascending address so callers can binary-search
/// for the enclosing function of a return address.
pub(crate) fn extract_symbols(
    data: &[u8],
    symtab: &SymtabCommand,
) -> Result<Vec<Symbol>, MachOError> {
    let sym_table_start = symtab.symoff as u64;
    let sym_table_end = sym_table_start
        .checked_add(u64::from(symtab.nsyms) * NLIST_64_SIZE as u64)
        .ok_or(MachOError::InvalidOffset)?;
    if sym_table_end > data.len() as u64 {
        return Err(MachOError::InvalidOffset);
    }

    let str_table_start = symtab.stroff as usize;
    let str_table_end = str_table_start
        .checked_add(symtab.strsize as usize)
        .ok_or(MachOError::InvalidOffset)?;
    if str_table_end > data.len() {
        return Err(MachOError::InvalidOffset);
    }
    let strtab = &data[str_table_start..str_table_end];

    let mut symbols = Vec::with_capacity(symtab.nsyms as usize);
    for i in 0..symtab.nsyms as usize {
        let off = sym_table_start as usize + i * NLIST_64_SIZE;
        let b = &data[off..off + NLIST_64_SIZE];
        let n_strx = le_u32(b, 0) as usize;
        let n_type = b[4];
        let n_value = le_u64(b, 8);

        if n_type & N_STAB != 0 {
            continue; // debugging symbol, not a real address.
        }
        if n_type & N_TYPE != N_SECT {
            continue; // undefined/indirect/absolute — no resolvable address here.
        }
        if n_strx == 0 || n_strx >= strtab.len() {
            continue;
        }

        let name = read_cstr(&strtab[n_strx..]);
        if name.is_empty() {
            continue;
        }

        symbols.push(Symbol {
            name,
            address: n_value,
            external: n_type & 0x01 != 0,
        });
    }

    symbols.sort_by_key(|s| s.address);
    Ok(symbols)
}

fn read_cstr(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_symtab(entries: &[(&str, u64, u8)]) -> (Vec<u8>, SymtabCommand) {
        let mut strtab = vec![0u8]; // index 0 is always the empty string.
        let mut offsets = Vec::new();
        for (name, _, _) in entries {
            offsets.push(strtab.len() as u32);
            strtab.extend_from_slice(name.as_bytes());
            strtab.push(0);
        }

        let mut symbuf = Vec::new();
        for (i, (_, addr, n_type)) in entries.iter().enumerate() {
            symbuf.extend_from_slice(&offsets[i].to_le_bytes());
            symbuf.push(*n_type);
            symbuf.push(0); // n_sect
            symbuf.extend_from_slice(&0u16.to_le_bytes()); // n_desc
            symbuf.extend_from_slice(&addr.to_le_bytes());
        }

        let mut data = Vec::new();
        let symoff = 0u32;
        data.extend_from_slice(&symbuf);
        let stroff = data.len() as u32;
        data.extend_from_slice(&strtab);

        (
            data,
            SymtabCommand {
                symoff,
                nsyms: entries.len() as u32,
                stroff,
                strsize: strtab.len() as u32,
            },
        )
    }

    #[test]
    fn extracts_defined_external_symbols() {
        let (data, cmd) = build_symtab(&[
            ("_cerror", 0x1000, N_SECT | 0x01),
            ("_cerror_nocancel", 0x1010, N_SECT | 0x01),
        ]);
        let syms = extract_symbols(&data, &cmd).unwrap();
        assert_eq!(syms.len(), 2);
        assert_eq!(syms[0].name, "_cerror");
        assert_eq!(syms[0].address, 0x1000);
        assert!(syms[0].external);
    }

    #[test]
    fn skips_stabs_and_undefined() {
        let (data, cmd) = build_symtab(&[
            ("stab_entry", 0x2000, N_STAB | N_SECT),
            ("undefined_sym", 0, 0x00), // N_UNDF
            ("_real", 0x3000, N_SECT),
        ]);
        let syms = extract_symbols(&data, &cmd).unwrap();
        assert_eq!(syms.len(), 1);
        assert_eq!(syms[0].name, "_real");
    }

    #[test]
    fn sorts_by_address() {
        let (data, cmd) = build_symtab(&[("_b", 0x2000, N_SECT), ("_a", 0x1000, N_SECT)]);
        let syms = extract_symbols(&data, &cmd).unwrap();
        assert_eq!(syms[0].name, "_a");
        assert_eq!(syms[1].name, "_b");
    }

    #[test]
    fn rejects_out_of_bounds_symtab() {
        let cmd = SymtabCommand {
            symoff: 0,
            nsyms: 10,
            stroff: 0,
            strsize: 0,
        };
        assert_eq!(extract_symbols(&[0u8; 4], &cmd), Err(MachOError::InvalidOffset));
    }
}
