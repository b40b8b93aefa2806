//! PDB structure reader preserving models, alternate locations, and per-atom annotations.
//!
//! The parser walks the fixed-column records line by line. Entry metadata comes from
//! `HEADER`, `TITLE` and `CRYST1`; coordinates come from `ATOM`/`HETATM` grouped under the
//! enclosing `MODEL`. Every conformer is kept in file order.

use crate::io::builder::{ResidueSite, StructureBuilder};
use crate::io::error::Error;
use crate::model::{
    atom::Atom,
    structure::Structure,
    types::{Element, Point, UnitCell},
};
use std::io::BufRead;
use std::str::FromStr;

const FORMAT: &str = "PDB";

/// Parses a legacy PDB stream into a [`Structure`].
///
/// # Arguments
///
/// * `reader` - Any buffered reader that yields PDB lines.
///
/// # Returns
///
/// A populated [`Structure`] with one [`Model`](crate::model::models::Model) per `MODEL`
/// block (or a single model when the file has none).
///
/// # Errors
///
/// Returns [`Error::Parse`] on malformed numeric fields or truncated coordinate records,
/// [`Error::InconsistentData`] when the stream contains no atoms, and [`Error::Io`] for
/// failures of the underlying reader.
///
/// # Examples
///
/// ```
/// use bio_convert::io::read_pdb_structure;
/// use std::io::Cursor;
///
/// let pdb = "\
/// ATOM      1  N   GLY A   1       0.000   0.000   0.000  1.00 20.00           N\n\
/// END\n";
/// let structure = read_pdb_structure(Cursor::new(pdb.as_bytes())).unwrap();
/// assert_eq!(structure.chain_count(), 1);
/// assert_eq!(structure.atom_count(), 1);
/// ```
pub fn read<R: BufRead>(reader: R) -> Result<Structure, Error> {
    let mut structure = Structure::new();
    let mut builder = StructureBuilder::new();
    let mut title_parts: Vec<String> = Vec::new();
    let mut current_model = 1;
    let mut last_serial = 0;

    let mut line_num = 0;

    for line in reader.lines() {
        line_num += 1;
        let line = line.map_err(|e| Error::from_io(e, None))?;
        let record = column(&line, 0, 6).trim_end();

        match record {
            "HEADER" => {
                let id = column(&line, 62, 66).trim();
                if !id.is_empty() {
                    structure.id_code = Some(id.to_string());
                }
            }
            "TITLE" => {
                let text = column(&line, 10, 80).trim();
                if !text.is_empty() {
                    title_parts.push(text.to_string());
                }
            }
            "CRYST1" => {
                structure.cell = Some(parse_cryst1(&line, line_num)?);
            }
            "MODEL" => {
                current_model = column(&line, 6, line.len()).trim().parse::<i32>().map_err(|_| {
                    Error::parse(FORMAT, None, line_num, "Invalid MODEL serial number")
                })?;
                log::trace!("Entering model {}", current_model);
            }
            "ATOM" | "HETATM" => {
                let (site, atom) =
                    parse_atom_record(&line, line_num, record == "HETATM", &mut last_serial)?;
                builder.add_atom(current_model, site, atom);
            }
            _ => {}
        }
    }

    if builder.atom_count() == 0 {
        return Err(Error::inconsistent_data(
            FORMAT,
            None,
            "no ATOM or HETATM records found",
        ));
    }

    if !title_parts.is_empty() {
        structure.title = Some(title_parts.join(" "));
    }

    log::debug!(
        "Parsed {} PDB atom records over {} lines",
        builder.atom_count(),
        line_num
    );

    for model in builder.finish() {
        structure.add_model(model);
    }

    Ok(structure)
}

/// Returns the columns `[start, end)` of a record, clamped to the line length.
///
/// Lines are frequently stripped of trailing blanks, so missing columns read as empty.
fn column(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    if start >= end {
        return "";
    }
    line.get(start..end).unwrap_or("")
}

fn column_char(line: &str, idx: usize) -> Option<char> {
    column(line, idx, idx + 1)
        .chars()
        .next()
        .filter(|c| *c != ' ')
}

fn parse_required<T: FromStr>(
    line: &str,
    start: usize,
    end: usize,
    line_num: usize,
    what: &str,
) -> Result<T, Error> {
    column(line, start, end)
        .trim()
        .parse::<T>()
        .map_err(|_| Error::parse(FORMAT, None, line_num, format!("Invalid {}", what)))
}

/// Parses an optional numeric column; blank means `default`, garbage is an error.
fn parse_optional(
    line: &str,
    start: usize,
    end: usize,
    default: f64,
    line_num: usize,
    what: &str,
) -> Result<f64, Error> {
    let raw = column(line, start, end).trim();
    if raw.is_empty() {
        return Ok(default);
    }
    raw.parse::<f64>()
        .map_err(|_| Error::parse(FORMAT, None, line_num, format!("Invalid {}", what)))
}

/// Parses an `ATOM`/`HETATM` line into its residue labels and the atom itself.
///
/// # Arguments
///
/// * `line` - Raw PDB record line.
/// * `line_num` - Current line number for diagnostics.
/// * `is_hetatm` - Indicates whether the record originated from `HETATM`.
/// * `last_serial` - Serial of the previous atom, used when the serial column overflowed.
fn parse_atom_record<'a>(
    line: &'a str,
    line_num: usize,
    is_hetatm: bool,
    last_serial: &mut i32,
) -> Result<(ResidueSite<'a>, Atom), Error> {
    if line.len() < 54 {
        return Err(Error::parse(FORMAT, None, line_num, "Atom record too short"));
    }

    let serial = match column(line, 6, 11).trim().parse::<i32>() {
        Ok(serial) => serial,
        Err(_) => {
            log::debug!(
                "Line {}: unreadable atom serial '{}', numbering sequentially",
                line_num,
                column(line, 6, 11)
            );
            *last_serial + 1
        }
    };
    *last_serial = serial;

    let atom_field = column(line, 12, 16);
    let atom_name = atom_field.trim();
    let alt_loc = column_char(line, 16);
    let res_name = column(line, 17, 21).trim();
    let chain_id = column(line, 21, 22).trim();
    let res_seq: i32 = parse_required(line, 22, 26, line_num, "residue sequence number")?;
    let i_code = column_char(line, 26);

    let x: f64 = parse_required(line, 30, 38, line_num, "X coordinate")?;
    let y: f64 = parse_required(line, 38, 46, line_num, "Y coordinate")?;
    let z: f64 = parse_required(line, 46, 54, line_num, "Z coordinate")?;

    let occupancy = parse_optional(line, 54, 60, 1.0, line_num, "occupancy")?;
    let b_factor = parse_optional(line, 60, 66, 0.0, line_num, "temperature factor")?;

    let element_str = column(line, 76, 78).trim();
    let element = if element_str.is_empty() {
        parse_element_from_name(atom_field)
    } else {
        Element::from_str(element_str).unwrap_or_else(|_| parse_element_from_name(atom_field))
    };

    let formal_charge = parse_charge(column(line, 78, 80)).unwrap_or_else(|| {
        log::debug!(
            "Line {}: ignoring unreadable charge '{}'",
            line_num,
            column(line, 78, 80)
        );
        0
    });

    let atom = Atom::new(atom_name, element, Point::new(x, y, z))
        .with_serial(serial)
        .with_alt_loc(alt_loc)
        .with_occupancy(occupancy)
        .with_b_factor(b_factor)
        .with_formal_charge(formal_charge);

    let site = ResidueSite {
        chain_id,
        seq_id: res_seq,
        insertion_code: i_code,
        name: res_name,
        hetero: is_hetatm,
    };

    Ok((site, atom))
}

/// Reads a charge column written as `2+`/`1-` (or the reversed `+2`). Blank means neutral.
fn parse_charge(field: &str) -> Option<i8> {
    let field = field.trim();
    if field.is_empty() {
        return Some(0);
    }

    let (digits, sign) = if let Some(d) = field.strip_suffix('+') {
        (d, 1)
    } else if let Some(d) = field.strip_suffix('-') {
        (d, -1)
    } else if let Some(d) = field.strip_prefix('+') {
        (d, 1)
    } else if let Some(d) = field.strip_prefix('-') {
        (d, -1)
    } else {
        return None;
    };

    let magnitude = if digits.is_empty() {
        1
    } else {
        digits.parse::<i8>().ok()?
    };
    Some(sign * magnitude)
}

/// Converts a `CRYST1` record into unit-cell parameters and space group.
///
/// # Errors
///
/// Emits [`Error::Parse`] when the line is underspecified or a cell parameter is not numeric.
fn parse_cryst1(line: &str, line_num: usize) -> Result<UnitCell, Error> {
    if line.len() < 54 {
        return Err(Error::parse(
            FORMAT,
            None,
            line_num,
            "CRYST1 record too short",
        ));
    }

    let a = parse_required(line, 6, 15, line_num, "unit cell length a")?;
    let b = parse_required(line, 15, 24, line_num, "unit cell length b")?;
    let c = parse_required(line, 24, 33, line_num, "unit cell length c")?;
    let alpha = parse_optional(line, 33, 40, 90.0, line_num, "unit cell angle alpha")?;
    let beta = parse_optional(line, 40, 47, 90.0, line_num, "unit cell angle beta")?;
    let gamma = parse_optional(line, 47, 54, 90.0, line_num, "unit cell angle gamma")?;

    let mut cell = UnitCell::new(a, b, c, alpha, beta, gamma);
    let space_group = column(line, 55, 66).trim();
    if !space_group.is_empty() {
        cell.space_group = Some(space_group.to_string());
    }

    if cell.is_degenerate() {
        log::warn!("Line {}: CRYST1 describes a degenerate unit cell", line_num);
    }

    Ok(cell)
}

/// Infers an element symbol from an atom name when columns 77‑78 are blank.
///
/// Strips non-alphabetic characters, tries two-letter, then single-letter lookups, and
/// ultimately falls back to [`Element::Unknown`].
fn parse_element_from_name(field: &str) -> Element {
    fn parse_single(ch: char) -> Option<Element> {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        Element::from_str(&ch.to_string()).ok()
    }

    fn parse_pair(first: char, second: char) -> Option<Element> {
        if !(first.is_ascii_alphabetic() && second.is_ascii_alphabetic()) {
            return None;
        }
        Element::from_str(&format!("{}{}", first, second)).ok()
    }

    let letters: Vec<(usize, char)> = field
        .char_indices()
        .filter(|(_, ch)| ch.is_ascii_alphabetic())
        .collect();

    let Some(&(first_idx, first_char)) = letters.first() else {
        return Element::Unknown;
    };

    // A name starting in column 13 denotes a two-letter element (FE, ZN, ...).
    if let Some(&(second_idx, second_char)) = letters.get(1) {
        let contiguous = second_idx == first_idx + first_char.len_utf8();
        if first_idx == 0 && contiguous {
            if let Some(el) = parse_pair(first_char, second_char) {
                return el;
            }
        }
    }

    if let Some(el) = parse_single(first_char) {
        return el;
    }

    for window in letters.windows(2) {
        let (first_idx, first_char) = window[0];
        let (second_idx, second_char) = window[1];
        let contiguous = second_idx == first_idx + first_char.len_utf8();
        if let Some(el) = contiguous
            .then(|| parse_pair(first_char, second_char))
            .flatten()
        {
            return el;
        }
        if let Some(el) = parse_single(second_char) {
            return el;
        }
    }

    Element::Unknown
}
