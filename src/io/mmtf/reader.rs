use super::codec;
use super::types::{GroupType, MmtfStructure};
use crate::io::builder::{ResidueSite, StructureBuilder};
use crate::io::error::Error;
use crate::model::{
    atom::Atom,
    structure::Structure,
    types::{Element, Point, UnitCell},
};
use serde_bytes::ByteBuf;
use std::io::Read;

const FORMAT: &str = "MMTF";

/// Reads an MMTF MessagePack stream.
pub fn read<R: Read>(mut reader: R) -> Result<Structure, Error> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| Error::from_io(e, None))?;
    from_slice(&bytes)
}

/// Decodes an MMTF document held in memory.
pub fn from_slice(bytes: &[u8]) -> Result<Structure, Error> {
    let mmtf: MmtfStructure =
        rmp_serde::from_slice(bytes).map_err(|e| Error::codec(FORMAT, e.to_string()))?;

    if !mmtf.mmtf_version.starts_with("1.") {
        log::warn!(
            "MMTF version {} is not 1.x; decoding may be incomplete",
            mmtf.mmtf_version
        );
    }
    log::debug!(
        "Decoding MMTF {} produced by '{}'",
        mmtf.mmtf_version,
        mmtf.mmtf_producer
    );

    let columns = Columns::decode(&mmtf)?;
    let builder = columns.assemble(&mmtf.group_list)?;

    let mut structure = Structure::new();
    structure.id_code = mmtf.structure_id.clone().filter(|id| !id.is_empty());
    structure.title = mmtf.title.clone().filter(|t| !t.is_empty());
    structure.cell = read_cell(&mmtf);

    for model in builder.finish() {
        structure.add_model(model);
    }

    Ok(structure)
}

fn inconsistent(details: impl Into<String>) -> Error {
    Error::inconsistent_data(FORMAT, None, details)
}

fn count(value: i32, field: &str) -> Result<usize, Error> {
    usize::try_from(value).map_err(|_| inconsistent(format!("{} is negative ({})", field, value)))
}

fn expect_len<T>(values: Vec<T>, expected: usize, field: &str) -> Result<Vec<T>, Error> {
    if values.len() != expected {
        return Err(inconsistent(format!(
            "{} has {} entries, expected {}",
            field,
            values.len(),
            expected
        )));
    }
    Ok(values)
}

fn optional<T>(
    bytes: Option<&ByteBuf>,
    decode: fn(&[u8]) -> Result<Vec<T>, Error>,
    expected: usize,
    field: &str,
) -> Result<Option<Vec<T>>, Error> {
    bytes
        .map(|b| expect_len(decode(&b[..])?, expected, field))
        .transpose()
}

fn read_cell(mmtf: &MmtfStructure) -> Option<UnitCell> {
    let values = mmtf.unit_cell.as_deref()?;
    let [a, b, c, alpha, beta, gamma] = values else {
        log::warn!(
            "Ignoring MMTF unitCell with {} values instead of 6",
            values.len()
        );
        return None;
    };
    let mut cell = UnitCell::new(
        *a as f64,
        *b as f64,
        *c as f64,
        *alpha as f64,
        *beta as f64,
        *gamma as f64,
    );
    cell.space_group = mmtf.space_group.clone().filter(|sg| !sg.is_empty());
    Some(cell)
}

/// Decoded per-atom, per-group and per-chain arrays, checked against the header counts.
struct Columns {
    num_atoms: usize,
    x: Vec<f32>,
    y: Vec<f32>,
    z: Vec<f32>,
    b_factors: Option<Vec<f32>>,
    atom_ids: Option<Vec<i32>>,
    alt_locs: Option<Vec<Option<char>>>,
    occupancies: Option<Vec<f32>>,

    group_ids: Vec<i32>,
    group_types: Vec<usize>,
    insertion_codes: Option<Vec<Option<char>>>,

    chain_names: Vec<String>,
    groups_per_chain: Vec<usize>,
    chains_per_model: Vec<usize>,
}

impl Columns {
    fn decode(mmtf: &MmtfStructure) -> Result<Self, Error> {
        let num_atoms = count(mmtf.num_atoms, "numAtoms")?;
        let num_groups = count(mmtf.num_groups, "numGroups")?;
        let num_chains = count(mmtf.num_chains, "numChains")?;
        let num_models = count(mmtf.num_models, "numModels")?;

        let chains_per_model = expect_len(
            mmtf.chains_per_model
                .iter()
                .map(|&n| count(n, "chainsPerModel"))
                .collect::<Result<Vec<_>, _>>()?,
            num_models,
            "chainsPerModel",
        )?;
        let groups_per_chain = expect_len(
            mmtf.groups_per_chain
                .iter()
                .map(|&n| count(n, "groupsPerChain"))
                .collect::<Result<Vec<_>, _>>()?,
            num_chains,
            "groupsPerChain",
        )?;

        if chains_per_model.iter().sum::<usize>() != num_chains {
            return Err(inconsistent(format!(
                "chainsPerModel sums to {}, numChains is {}",
                chains_per_model.iter().sum::<usize>(),
                num_chains
            )));
        }
        if groups_per_chain.iter().sum::<usize>() != num_groups {
            return Err(inconsistent(format!(
                "groupsPerChain sums to {}, numGroups is {}",
                groups_per_chain.iter().sum::<usize>(),
                num_groups
            )));
        }

        let chain_names = match &mmtf.chain_name_list {
            Some(names) => codec::decode_strings(names)?,
            None => codec::decode_strings(&mmtf.chain_id_list)?,
        };
        let chain_names = expect_len(chain_names, num_chains, "chainNameList")?;

        let group_types = expect_len(
            codec::decode_ints(&mmtf.group_type_list)?,
            num_groups,
            "groupTypeList",
        )?
        .into_iter()
        .map(|t| {
            usize::try_from(t)
                .ok()
                .filter(|&idx| idx < mmtf.group_list.len())
                .ok_or_else(|| {
                    inconsistent(format!(
                        "groupTypeList references group type {} of {}",
                        t,
                        mmtf.group_list.len()
                    ))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

        let atoms_in_groups: usize = group_types
            .iter()
            .map(|&t| mmtf.group_list[t].atom_count())
            .sum();
        if atoms_in_groups != num_atoms {
            return Err(inconsistent(format!(
                "groups describe {} atoms, numAtoms is {}",
                atoms_in_groups, num_atoms
            )));
        }

        Ok(Self {
            num_atoms,
            x: expect_len(codec::decode_floats(&mmtf.x_coord_list)?, num_atoms, "xCoordList")?,
            y: expect_len(codec::decode_floats(&mmtf.y_coord_list)?, num_atoms, "yCoordList")?,
            z: expect_len(codec::decode_floats(&mmtf.z_coord_list)?, num_atoms, "zCoordList")?,
            b_factors: optional(
                mmtf.b_factor_list.as_ref(),
                codec::decode_floats,
                num_atoms,
                "bFactorList",
            )?,
            atom_ids: optional(
                mmtf.atom_id_list.as_ref(),
                codec::decode_ints,
                num_atoms,
                "atomIdList",
            )?,
            alt_locs: optional(
                mmtf.alt_loc_list.as_ref(),
                codec::decode_chars,
                num_atoms,
                "altLocList",
            )?,
            occupancies: optional(
                mmtf.occupancy_list.as_ref(),
                codec::decode_floats,
                num_atoms,
                "occupancyList",
            )?,
            group_ids: expect_len(
                codec::decode_ints(&mmtf.group_id_list)?,
                num_groups,
                "groupIdList",
            )?,
            group_types,
            insertion_codes: optional(
                mmtf.ins_code_list.as_ref(),
                codec::decode_chars,
                num_groups,
                "insCodeList",
            )?,
            chain_names,
            groups_per_chain,
            chains_per_model,
        })
    }

    /// Walks models, chains, groups and atoms by their per-level counts.
    fn assemble(&self, group_list: &[GroupType]) -> Result<StructureBuilder, Error> {
        let mut builder = StructureBuilder::new();
        let mut chain_idx = 0;
        let mut group_idx = 0;
        let mut atom_idx = 0;

        for (model_idx, &chain_count) in self.chains_per_model.iter().enumerate() {
            let model_serial = model_idx as i32 + 1;

            for _ in 0..chain_count {
                let chain_name = &self.chain_names[chain_idx];

                for _ in 0..self.groups_per_chain[chain_idx] {
                    let group = &group_list[self.group_types[group_idx]];
                    let site = ResidueSite {
                        chain_id: chain_name,
                        seq_id: self.group_ids[group_idx],
                        insertion_code: self
                            .insertion_codes
                            .as_ref()
                            .and_then(|codes| codes[group_idx]),
                        name: &group.group_name,
                        hetero: group.is_hetero(),
                    };

                    for local in 0..group.atom_count() {
                        let atom = self.atom(group, local, atom_idx);
                        builder.add_atom(model_serial, site, atom);
                        atom_idx += 1;
                    }
                    group_idx += 1;
                }
                chain_idx += 1;
            }
        }

        if atom_idx != self.num_atoms {
            return Err(inconsistent(format!(
                "hierarchy covers {} atoms, numAtoms is {}",
                atom_idx, self.num_atoms
            )));
        }

        log::debug!(
            "Rebuilt {} atoms in {} groups across {} models",
            atom_idx,
            group_idx,
            self.chains_per_model.len()
        );

        Ok(builder)
    }

    fn atom(&self, group: &GroupType, local: usize, idx: usize) -> Atom {
        let element = group
            .element_list
            .get(local)
            .and_then(|symbol| symbol.parse::<Element>().ok())
            .unwrap_or(Element::Unknown);
        let charge = group
            .formal_charge_list
            .get(local)
            .and_then(|&c| i8::try_from(c).ok())
            .unwrap_or(0);

        Atom::new(
            &group.atom_name_list[local],
            element,
            Point::new(self.x[idx] as f64, self.y[idx] as f64, self.z[idx] as f64),
        )
        .with_serial(
            self.atom_ids
                .as_ref()
                .map_or(idx as i32 + 1, |ids| ids[idx]),
        )
        .with_alt_loc(self.alt_locs.as_ref().and_then(|locs| locs[idx]))
        .with_occupancy(
            self.occupancies
                .as_ref()
                .map_or(1.0, |values| values[idx] as f64),
        )
        .with_b_factor(
            self.b_factors
                .as_ref()
                .map_or(0.0, |values| values[idx] as f64),
        )
        .with_formal_charge(charge)
    }
}
