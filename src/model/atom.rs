//! Fundamental atom representation carrying every per-atom field the supported formats share.
//!
//! Atoms are instantiated by the format readers and rendered back by the writers. Besides
//! name, element and position they keep the crystallographic annotations (serial, alternate
//! location, occupancy, B-factor, formal charge) so a conversion does not silently drop them.

use super::types::{Element, Point};
use smol_str::SmolStr;
use std::fmt;

/// Labeled atom with crystallographic annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Serial number as found in the source file (`ATOM` serial, `_atom_site.id`).
    pub serial: i32,
    /// Atom name as it appears in crystallographic or modeling files (e.g., `CA`).
    pub name: SmolStr,
    /// Alternate location indicator; `None` when the atom has a single conformer.
    pub alt_loc: Option<char>,
    /// Chemical element derived from the periodic table definitions.
    pub element: Element,
    /// Cartesian coordinates measured in ångströms.
    pub pos: Point,
    /// Fractional occupancy in `[0, 1]`.
    pub occupancy: f64,
    /// Isotropic temperature factor in Å².
    pub b_factor: f64,
    /// Formal charge in elementary charge units.
    pub formal_charge: i8,
}

impl Atom {
    /// Creates a fully occupied atom with zero B-factor and no charge.
    ///
    /// # Arguments
    ///
    /// * `name` - Atom label such as `"CA"` or `"OXT"`.
    /// * `element` - `Element` variant describing the chemical identity.
    /// * `pos` - `Point` describing the Cartesian coordinates in ångströms.
    pub fn new(name: &str, element: Element, pos: Point) -> Self {
        Self {
            serial: 0,
            name: SmolStr::new(name),
            alt_loc: None,
            element,
            pos,
            occupancy: 1.0,
            b_factor: 0.0,
            formal_charge: 0,
        }
    }

    pub fn with_serial(mut self, serial: i32) -> Self {
        self.serial = serial;
        self
    }

    pub fn with_alt_loc(mut self, alt_loc: Option<char>) -> Self {
        self.alt_loc = alt_loc;
        self
    }

    pub fn with_occupancy(mut self, occupancy: f64) -> Self {
        self.occupancy = occupancy;
        self
    }

    pub fn with_b_factor(mut self, b_factor: f64) -> Self {
        self.b_factor = b_factor;
        self
    }

    pub fn with_formal_charge(mut self, formal_charge: i8) -> Self {
        self.formal_charge = formal_charge;
        self
    }

    /// Computes the Euclidean distance to another atom in ångströms.
    pub fn distance(&self, other: &Atom) -> f64 {
        nalgebra::distance(&self.pos, &other.pos)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Atom {{ serial: {}, name: \"{}\", element: {}, pos: [{:.3}, {:.3}, {:.3}] }}",
            self.serial, self.name, self.element, self.pos.x, self.pos.y, self.pos.z
        )
    }
}
