//! Serde view of the MMTF 1.0 top-level map.
//!
//! Encoded arrays stay as raw bytes here; [`super::codec`] turns them into typed vectors.

use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;

pub const MMTF_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MmtfStructure {
    pub mmtf_version: String,
    #[serde(default)]
    pub mmtf_producer: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_cell: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub num_bonds: i32,
    pub num_atoms: i32,
    pub num_groups: i32,
    pub num_chains: i32,
    pub num_models: i32,

    pub group_list: Vec<GroupType>,

    pub x_coord_list: ByteBuf,
    pub y_coord_list: ByteBuf,
    pub z_coord_list: ByteBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b_factor_list: Option<ByteBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atom_id_list: Option<ByteBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_loc_list: Option<ByteBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupancy_list: Option<ByteBuf>,

    pub group_id_list: ByteBuf,
    pub group_type_list: ByteBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sec_struct_list: Option<ByteBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ins_code_list: Option<ByteBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_index_list: Option<ByteBuf>,

    pub chain_id_list: ByteBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_name_list: Option<ByteBuf>,
    pub groups_per_chain: Vec<i32>,
    pub chains_per_model: Vec<i32>,
}

/// Residue template shared by every group that references it through `groupTypeList`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupType {
    pub formal_charge_list: Vec<i32>,
    pub atom_name_list: Vec<String>,
    pub element_list: Vec<String>,
    #[serde(default)]
    pub bond_atom_list: Vec<i32>,
    #[serde(default)]
    pub bond_order_list: Vec<i32>,
    pub group_name: String,
    #[serde(default)]
    pub single_letter_code: String,
    #[serde(default)]
    pub chem_comp_type: String,
}

impl GroupType {
    pub fn atom_count(&self) -> usize {
        self.atom_name_list.len()
    }

    /// Groups typed as polymer linkers (`L-PEPTIDE LINKING`, `RNA LINKING`, ...) are polymer
    /// residues; everything else except the `OTHER` fallback is a hetero group.
    pub fn is_hetero(&self) -> bool {
        let kind = self.chem_comp_type.to_ascii_uppercase();
        !kind.contains("LINKING") && kind != "OTHER"
    }
}
