use super::codec;
use super::types::{GroupType, MMTF_VERSION, MmtfStructure};
use crate::io::error::Error;
use crate::model::{chain::Chain, residue::Residue, structure::Structure};
use serde_bytes::ByteBuf;
use std::collections::HashMap;
use std::io::Write;

const CHAIN_ID_WIDTH: usize = 4;
const COORD_DIVISOR: i32 = 1000;
const B_FACTOR_DIVISOR: i32 = 100;
const OCCUPANCY_DIVISOR: i32 = 100;

/// Encodes the structure as an MMTF MessagePack map directly into `writer`.
pub fn write_structure<W: Write>(mut writer: W, structure: &Structure) -> Result<(), Error> {
    let mmtf = Encoder::default().encode(structure);

    rmp_serde::encode::write_named(&mut writer, &mmtf)
        .map_err(|e| Error::codec("MMTF", e.to_string()))?;
    writer.flush().map_err(|e| Error::from_io(e, None))?;

    Ok(())
}

pub fn to_bytes(structure: &Structure) -> Result<Vec<u8>, Error> {
    let mut buffer = Vec::new();
    write_structure(&mut buffer, structure)?;
    Ok(buffer)
}

/// Flattened per-atom, per-group and per-chain columns collected in file order.
#[derive(Default)]
struct Encoder {
    group_types: Vec<GroupType>,
    group_index: HashMap<GroupType, i32>,

    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
    b_factors: Vec<f64>,
    occupancies: Vec<f64>,
    atom_ids: Vec<i32>,
    alt_locs: Vec<Option<char>>,

    group_ids: Vec<i32>,
    group_type_refs: Vec<i32>,
    insertion_codes: Vec<Option<char>>,
    sequence_indices: Vec<i32>,

    chain_ids: Vec<String>,
    groups_per_chain: Vec<i32>,
    chains_per_model: Vec<i32>,
}

impl Encoder {
    fn encode(mut self, structure: &Structure) -> MmtfStructure {
        for model in structure.iter_models() {
            self.chains_per_model.push(model.chain_count() as i32);
            for chain in model.iter_chains() {
                self.push_chain(chain);
            }
        }

        log::debug!(
            "Encoding {} atoms in {} groups with {} distinct group types",
            self.x.len(),
            self.group_ids.len(),
            self.group_types.len()
        );

        let chain_ids = ByteBuf::from(codec::encode_strings(&self.chain_ids, CHAIN_ID_WIDTH));
        let alt_locs_present = self.alt_locs.iter().any(Option::is_some);
        let insertion_codes_present = self.insertion_codes.iter().any(Option::is_some);

        MmtfStructure {
            mmtf_version: MMTF_VERSION.to_string(),
            mmtf_producer: format!("bio-convert {}", env!("CARGO_PKG_VERSION")),
            unit_cell: structure
                .cell
                .as_ref()
                .filter(|cell| !cell.is_degenerate())
                .map(|cell| {
                    [cell.a, cell.b, cell.c, cell.alpha, cell.beta, cell.gamma]
                        .iter()
                        .map(|v| *v as f32)
                        .collect()
                }),
            space_group: structure
                .cell
                .as_ref()
                .and_then(|cell| cell.space_group.clone()),
            structure_id: structure.id_code.clone(),
            title: structure.title.clone(),

            num_bonds: 0,
            num_atoms: self.x.len() as i32,
            num_groups: self.group_ids.len() as i32,
            num_chains: self.chain_ids.len() as i32,
            num_models: self.chains_per_model.len() as i32,

            x_coord_list: ByteBuf::from(codec::encode_delta_recursive_float(
                &self.x,
                COORD_DIVISOR,
            )),
            y_coord_list: ByteBuf::from(codec::encode_delta_recursive_float(
                &self.y,
                COORD_DIVISOR,
            )),
            z_coord_list: ByteBuf::from(codec::encode_delta_recursive_float(
                &self.z,
                COORD_DIVISOR,
            )),
            b_factor_list: Some(ByteBuf::from(codec::encode_delta_recursive_float(
                &self.b_factors,
                B_FACTOR_DIVISOR,
            ))),
            atom_id_list: Some(ByteBuf::from(codec::encode_run_length_delta(
                &self.atom_ids,
            ))),
            alt_loc_list: alt_locs_present
                .then(|| ByteBuf::from(codec::encode_run_length_chars(&self.alt_locs))),
            occupancy_list: Some(ByteBuf::from(codec::encode_run_length_float(
                &self.occupancies,
                OCCUPANCY_DIVISOR,
            ))),

            group_id_list: ByteBuf::from(codec::encode_run_length_delta(&self.group_ids)),
            group_type_list: ByteBuf::from(codec::encode_int32(&self.group_type_refs)),
            sec_struct_list: Some(ByteBuf::from(codec::encode_int8(&vec![
                -1i8;
                self.group_ids.len()
            ]))),
            ins_code_list: insertion_codes_present
                .then(|| ByteBuf::from(codec::encode_run_length_chars(&self.insertion_codes))),
            sequence_index_list: Some(ByteBuf::from(codec::encode_run_length_delta(
                &self.sequence_indices,
            ))),

            chain_name_list: Some(chain_ids.clone()),
            chain_id_list: chain_ids,
            groups_per_chain: self.groups_per_chain,
            chains_per_model: self.chains_per_model,
            group_list: self.group_types,
        }
    }

    fn push_chain(&mut self, chain: &Chain) {
        if chain.id.len() > CHAIN_ID_WIDTH {
            log::warn!(
                "Chain id '{}' exceeds {} characters and is truncated in MMTF output",
                chain.id,
                CHAIN_ID_WIDTH
            );
        }
        self.chain_ids.push(chain.id.clone());
        self.groups_per_chain.push(chain.residue_count() as i32);

        let mut polymer_index = 0;
        for residue in chain.iter_residues() {
            let sequence_index = if residue.is_polymer() {
                polymer_index += 1;
                polymer_index - 1
            } else {
                -1
            };
            self.push_residue(residue, sequence_index);
        }
    }

    fn push_residue(&mut self, residue: &Residue, sequence_index: i32) {
        let group_type = group_type_for(residue);
        let next = self.group_types.len() as i32;
        let type_ref = *self.group_index.entry(group_type).or_insert_with_key(|key| {
            self.group_types.push(key.clone());
            next
        });

        self.group_ids.push(residue.id);
        self.group_type_refs.push(type_ref);
        self.insertion_codes.push(residue.insertion_code);
        self.sequence_indices.push(sequence_index);

        for atom in residue.iter_atoms() {
            self.x.push(atom.pos.x);
            self.y.push(atom.pos.y);
            self.z.push(atom.pos.z);
            self.b_factors.push(atom.b_factor);
            self.occupancies.push(atom.occupancy);
            self.atom_ids.push(atom.serial);
            self.alt_locs.push(atom.alt_loc);
        }
    }
}

fn group_type_for(residue: &Residue) -> GroupType {
    let standard = residue.standard_name();
    let chem_comp_type = match standard {
        _ if residue.hetero => "NON-POLYMER".to_string(),
        Some(kind) if kind.is_polymer() => kind.chem_comp_type().to_string(),
        _ => "OTHER".to_string(),
    };
    let single_letter_code = standard
        .filter(|kind| kind.is_polymer())
        .map(|kind| kind.one_letter_code().to_string())
        .unwrap_or_else(|| "?".to_string());

    GroupType {
        formal_charge_list: residue
            .iter_atoms()
            .map(|a| a.formal_charge as i32)
            .collect(),
        atom_name_list: residue.iter_atoms().map(|a| a.name.to_string()).collect(),
        element_list: residue
            .iter_atoms()
            .map(|a| a.element.symbol().to_string())
            .collect(),
        bond_atom_list: Vec::new(),
        bond_order_list: Vec::new(),
        group_name: residue.name.clone(),
        single_letter_code,
        chem_comp_type,
    }
}
