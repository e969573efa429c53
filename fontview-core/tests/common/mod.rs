//! Minimal in-memory sfnt files for tests: a table directory with one `name` table.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const FAMILY: u16 = 1;
pub const SUBFAMILY: u16 = 2;
pub const TYPOGRAPHIC_FAMILY: u16 = 16;
pub const TYPOGRAPHIC_SUBFAMILY: u16 = 17;

/// Build a TrueType-flavoured sfnt whose `name` table holds `names`
/// as (name id, text) pairs, encoded as Windows/Unicode BMP, US English.
pub fn sfnt_with_names(names: &[(u16, &str)]) -> Vec<u8> {
    sfnt_at(names, 0)
}

/// Same as [`sfnt_with_names`], for a font that will start `base` bytes into
/// its file. Table offsets in the directory are absolute.
fn sfnt_at(names: &[(u16, &str)], base: usize) -> Vec<u8> {
    let name_table = name_table(names);

    let mut out = Vec::new();
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes()); // numTables
    out.extend_from_slice(&16u16.to_be_bytes()); // searchRange
    out.extend_from_slice(&0u16.to_be_bytes()); // entrySelector
    out.extend_from_slice(&0u16.to_be_bytes()); // rangeShift

    let offset = base + 12 + 16;
    out.extend_from_slice(b"name");
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(&(offset as u32).to_be_bytes());
    out.extend_from_slice(&(name_table.len() as u32).to_be_bytes());

    out.extend_from_slice(&name_table);
    while out.len() % 4 != 0 {
        out.push(0);
    }
    out
}

/// A `ttcf` collection holding one face per entry of `faces`.
pub fn collection(faces: &[&[(u16, &str)]]) -> Vec<u8> {
    let header_len = 12 + 4 * faces.len();
    let mut bodies = Vec::new();
    let mut offsets = Vec::new();
    let mut cursor = header_len;
    for names in faces {
        let body = sfnt_at(names, cursor);
        offsets.push(cursor as u32);
        cursor += body.len();
        bodies.push(body);
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"ttcf");
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    out.extend_from_slice(&(faces.len() as u32).to_be_bytes());
    for offset in offsets {
        out.extend_from_slice(&offset.to_be_bytes());
    }
    for body in bodies {
        out.extend_from_slice(&body);
    }
    out
}

/// A font naming `family` with a single `style`.
pub fn sfnt(family: &str, style: &str) -> Vec<u8> {
    sfnt_with_names(&[(FAMILY, family), (SUBFAMILY, style)])
}

fn name_table(names: &[(u16, &str)]) -> Vec<u8> {
    let encoded: Vec<Vec<u8>> = names
        .iter()
        .map(|(_, text)| text.encode_utf16().flat_map(u16::to_be_bytes).collect())
        .collect();

    let count = names.len() as u16;
    let storage_offset = 6 + 12 * count;
    let mut table = Vec::new();
    table.extend_from_slice(&0u16.to_be_bytes()); // format
    table.extend_from_slice(&count.to_be_bytes());
    table.extend_from_slice(&storage_offset.to_be_bytes());

    let mut string_offset = 0u16;
    for ((name_id, _), bytes) in names.iter().zip(&encoded) {
        table.extend_from_slice(&3u16.to_be_bytes()); // platform: Windows
        table.extend_from_slice(&1u16.to_be_bytes()); // encoding: Unicode BMP
        table.extend_from_slice(&0x0409u16.to_be_bytes()); // language: en-US
        table.extend_from_slice(&name_id.to_be_bytes());
        table.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
        table.extend_from_slice(&string_offset.to_be_bytes());
        string_offset += bytes.len() as u16;
    }
    for bytes in &encoded {
        table.extend_from_slice(bytes);
    }
    table
}

/// Write `bytes` to `dir/name`, creating parent directories.
pub fn write_font(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(&path, bytes).expect("write font");
    path
}
