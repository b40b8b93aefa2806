use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;

pub type Point = Point3<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Element {
    Unknown = 0,
    H = 1,
    He = 2,
    Li = 3,
    Be = 4,
    B = 5,
    C = 6,
    N = 7,
    O = 8,
    F = 9,
    Ne = 10,
    Na = 11,
    Mg = 12,
    Al = 13,
    Si = 14,
    P = 15,
    S = 16,
    Cl = 17,
    Ar = 18,
    K = 19,
    Ca = 20,
    Sc = 21,
    Ti = 22,
    V = 23,
    Cr = 24,
    Mn = 25,
    Fe = 26,
    Co = 27,
    Ni = 28,
    Cu = 29,
    Zn = 30,
    Ga = 31,
    Ge = 32,
    As = 33,
    Se = 34,
    Br = 35,
    Kr = 36,
    Rb = 37,
    Sr = 38,
    Y = 39,
    Zr = 40,
    Nb = 41,
    Mo = 42,
    Tc = 43,
    Ru = 44,
    Rh = 45,
    Pd = 46,
    Ag = 47,
    Cd = 48,
    In = 49,
    Sn = 50,
    Sb = 51,
    Te = 52,
    I = 53,
    Xe = 54,
    Cs = 55,
    Ba = 56,
    La = 57,
    Ce = 58,
    Pr = 59,
    Nd = 60,
    Pm = 61,
    Sm = 62,
    Eu = 63,
    Gd = 64,
    Tb = 65,
    Dy = 66,
    Ho = 67,
    Er = 68,
    Tm = 69,
    Yb = 70,
    Lu = 71,
    Hf = 72,
    Ta = 73,
    W = 74,
    Re = 75,
    Os = 76,
    Ir = 77,
    Pt = 78,
    Au = 79,
    Hg = 80,
    Tl = 81,
    Pb = 82,
    Bi = 83,
    Po = 84,
    At = 85,
    Rn = 86,
    Fr = 87,
    Ra = 88,
    Ac = 89,
    Th = 90,
    Pa = 91,
    U = 92,
    Np = 93,
    Pu = 94,
    Am = 95,
    Cm = 96,
    Bk = 97,
    Cf = 98,
    Es = 99,
    Fm = 100,
    Md = 101,
    No = 102,
    Lr = 103,
    Rf = 104,
    Db = 105,
    Sg = 106,
    Bh = 107,
    Hs = 108,
    Mt = 109,
    Ds = 110,
    Rg = 111,
    Cn = 112,
    Nh = 113,
    Fl = 114,
    Mc = 115,
    Lv = 116,
    Ts = 117,
    Og = 118,
}

/// Elements indexed by atomic number; index 0 is [`Element::Unknown`].
const ELEMENTS: [Element; 119] = {
    use Element::*;
    [
        Unknown, H, He, Li, Be, B, C, N, O, F, Ne, Na, Mg, Al, Si, P, S, Cl, Ar, K, Ca, Sc, Ti,
        V, Cr, Mn, Fe, Co, Ni, Cu, Zn, Ga, Ge, As, Se, Br, Kr, Rb, Sr, Y, Zr, Nb, Mo, Tc, Ru,
        Rh, Pd, Ag, Cd, In, Sn, Sb, Te, I, Xe, Cs, Ba, La, Ce, Pr, Nd, Pm, Sm, Eu, Gd, Tb, Dy,
        Ho, Er, Tm, Yb, Lu, Hf, Ta, W, Re, Os, Ir, Pt, Au, Hg, Tl, Pb, Bi, Po, At, Rn, Fr, Ra,
        Ac, Th, Pa, U, Np, Pu, Am, Cm, Bk, Cf, Es, Fm, Md, No, Lr, Rf, Db, Sg, Bh, Hs, Mt, Ds,
        Rg, Cn, Nh, Fl, Mc, Lv, Ts, Og,
    ]
};

const SYMBOLS: [&str; 119] = [
    "X", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd",
    "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm",
    "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg",
    "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

impl Element {
    pub fn from_atomic_number(number: u8) -> Self {
        ELEMENTS
            .get(number as usize)
            .copied()
            .unwrap_or(Element::Unknown)
    }

    /// Title-case symbol (`"Fe"`); `"X"` for [`Element::Unknown`].
    pub fn symbol(&self) -> &'static str {
        SYMBOLS[*self as usize]
    }

    /// Upper-case symbol as written in PDB columns 77-78 and mmCIF `type_symbol`.
    pub fn pdb_symbol(&self) -> String {
        self.symbol().to_ascii_uppercase()
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Element {
    type Err = String;

    /// Accepts atomic numbers or symbols in any letter case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(num) = s.parse::<u8>() {
            return Ok(Element::from_atomic_number(num));
        }

        let mut chars = s.chars();
        let normalized = match (chars.next(), chars.next(), chars.next()) {
            (Some(first), None, _) => first.to_ascii_uppercase().to_string(),
            (Some(first), Some(second), None) => format!(
                "{}{}",
                first.to_ascii_uppercase(),
                second.to_ascii_lowercase()
            ),
            _ => return Err(format!("Invalid element symbol: {}", s)),
        };

        SYMBOLS
            .iter()
            .skip(1)
            .position(|sym| *sym == normalized)
            .map(|idx| ELEMENTS[idx + 1])
            .ok_or_else(|| format!("Invalid element symbol: {}", s))
    }
}

/// Residues with well-known polymer chemistry.
///
/// Used by writers to decide polymer membership (`ATOM` records, `_entity_poly_seq`,
/// MMTF `chemCompType`) independently of how the source file flagged the residue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardResidue {
    ALA,
    ARG,
    ASN,
    ASP,
    CYS,
    GLN,
    GLU,
    GLY,
    HIS,
    ILE,
    LEU,
    LYS,
    MET,
    PHE,
    PRO,
    SER,
    THR,
    TRP,
    TYR,
    VAL,
    SEC,
    PYL,
    MSE,
    A,
    C,
    G,
    U,
    I,
    DA,
    DC,
    DG,
    DT,
    DI,
    HOH,
}

impl StandardResidue {
    pub fn is_protein(&self) -> bool {
        use StandardResidue::*;
        matches!(
            self,
            ALA | ARG
                | ASN
                | ASP
                | CYS
                | GLN
                | GLU
                | GLY
                | HIS
                | ILE
                | LEU
                | LYS
                | MET
                | PHE
                | PRO
                | SER
                | THR
                | TRP
                | TYR
                | VAL
                | SEC
                | PYL
                | MSE
        )
    }

    pub fn is_rna(&self) -> bool {
        use StandardResidue::*;
        matches!(self, A | C | G | U | I)
    }

    pub fn is_dna(&self) -> bool {
        use StandardResidue::*;
        matches!(self, DA | DC | DG | DT | DI)
    }

    pub fn is_nucleic(&self) -> bool {
        self.is_rna() || self.is_dna()
    }

    pub fn is_polymer(&self) -> bool {
        self.is_protein() || self.is_nucleic()
    }

    pub fn one_letter_code(&self) -> char {
        use StandardResidue::*;
        match self {
            ALA => 'A',
            ARG => 'R',
            ASN => 'N',
            ASP => 'D',
            CYS => 'C',
            GLN => 'Q',
            GLU => 'E',
            GLY => 'G',
            HIS => 'H',
            ILE => 'I',
            LEU => 'L',
            LYS => 'K',
            MET | MSE => 'M',
            PHE => 'F',
            PRO => 'P',
            SER => 'S',
            THR => 'T',
            TRP => 'W',
            TYR => 'Y',
            VAL => 'V',
            SEC => 'U',
            PYL => 'O',
            A | DA => 'A',
            C | DC => 'C',
            G | DG => 'G',
            U => 'U',
            DT => 'T',
            I | DI => 'I',
            HOH => '?',
        }
    }

    /// Chemical component type as used by the PDB chemical component dictionary.
    pub fn chem_comp_type(&self) -> &'static str {
        if self.is_protein() {
            "L-PEPTIDE LINKING"
        } else if self.is_dna() {
            "DNA LINKING"
        } else if self.is_rna() {
            "RNA LINKING"
        } else {
            "NON-POLYMER"
        }
    }
}

impl fmt::Display for StandardResidue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl FromStr for StandardResidue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use StandardResidue::*;
        match s {
            "ALA" => Ok(ALA),
            "ARG" => Ok(ARG),
            "ASN" => Ok(ASN),
            "ASP" => Ok(ASP),
            "CYS" => Ok(CYS),
            "GLN" => Ok(GLN),
            "GLU" => Ok(GLU),
            "GLY" => Ok(GLY),
            "HIS" => Ok(HIS),
            "ILE" => Ok(ILE),
            "LEU" => Ok(LEU),
            "LYS" => Ok(LYS),
            "MET" => Ok(MET),
            "PHE" => Ok(PHE),
            "PRO" => Ok(PRO),
            "SER" => Ok(SER),
            "THR" => Ok(THR),
            "TRP" => Ok(TRP),
            "TYR" => Ok(TYR),
            "VAL" => Ok(VAL),
            "SEC" => Ok(SEC),
            "PYL" => Ok(PYL),
            "MSE" => Ok(MSE),
            "A" => Ok(A),
            "C" => Ok(C),
            "G" => Ok(G),
            "U" => Ok(U),
            "I" => Ok(I),
            "DA" => Ok(DA),
            "DC" => Ok(DC),
            "DG" => Ok(DG),
            "DT" => Ok(DT),
            "DI" => Ok(DI),
            "HOH" | "WAT" => Ok(HOH),
            _ => Err(format!("Invalid standard residue: {}", s)),
        }
    }
}

/// Crystallographic unit cell with optional space group symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitCell {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub space_group: Option<String>,
}

impl UnitCell {
    pub fn new(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
            space_group: None,
        }
    }

    /// Cells with a zero-length edge carry no crystallographic meaning.
    pub fn is_degenerate(&self) -> bool {
        self.a <= 0.0 || self.b <= 0.0 || self.c <= 0.0
    }

    pub fn space_group_or_p1(&self) -> &str {
        self.space_group.as_deref().unwrap_or("P 1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_symbol_returns_correct_value() {
        assert_eq!(Element::H.symbol(), "H");
        assert_eq!(Element::Fe.symbol(), "Fe");
        assert_eq!(Element::Og.symbol(), "Og");
        assert_eq!(Element::Unknown.symbol(), "X");
        assert_eq!(Element::Zn.pdb_symbol(), "ZN");
    }

    #[test]
    fn element_table_is_indexed_by_atomic_number() {
        for (number, element) in ELEMENTS.iter().enumerate() {
            assert_eq!(Element::from_atomic_number(number as u8), *element);
        }
    }

    #[test]
    fn element_from_str_is_case_insensitive() {
        assert_eq!(Element::from_str("FE").unwrap(), Element::Fe);
        assert_eq!(Element::from_str("fe").unwrap(), Element::Fe);
        assert_eq!(Element::from_str("Fe").unwrap(), Element::Fe);
        assert_eq!(Element::from_str(" c ").unwrap(), Element::C);
        assert_eq!(Element::from_str("CL").unwrap(), Element::Cl);
    }

    #[test]
    fn element_from_str_parses_atomic_numbers() {
        assert_eq!(Element::from_str("6").unwrap(), Element::C);
        assert_eq!(Element::from_str("0").unwrap(), Element::Unknown);
        assert_eq!(Element::from_str("200").unwrap(), Element::Unknown);
    }

    #[test]
    fn element_from_str_rejects_invalid_symbols() {
        assert!(Element::from_str("Xx").is_err());
        assert!(Element::from_str("ABC").is_err());
        assert!(Element::from_str("").is_err());
    }

    #[test]
    fn standard_residue_classifies_polymers() {
        assert!(StandardResidue::ALA.is_protein());
        assert!(StandardResidue::MSE.is_protein());
        assert!(StandardResidue::DA.is_dna());
        assert!(StandardResidue::U.is_rna());
        assert!(!StandardResidue::HOH.is_polymer());
    }

    #[test]
    fn standard_residue_from_str_accepts_water_alias() {
        assert_eq!(
            StandardResidue::from_str("WAT").unwrap(),
            StandardResidue::HOH
        );
        assert!(StandardResidue::from_str("LIG").is_err());
    }

    #[test]
    fn standard_residue_reports_codes_and_chem_comp_types() {
        assert_eq!(StandardResidue::TRP.one_letter_code(), 'W');
        assert_eq!(StandardResidue::DT.one_letter_code(), 'T');
        assert_eq!(
            StandardResidue::GLY.chem_comp_type(),
            "L-PEPTIDE LINKING"
        );
        assert_eq!(StandardResidue::DG.chem_comp_type(), "DNA LINKING");
        assert_eq!(StandardResidue::G.chem_comp_type(), "RNA LINKING");
        assert_eq!(StandardResidue::HOH.chem_comp_type(), "NON-POLYMER");
    }

    #[test]
    fn unit_cell_detects_degenerate_edges() {
        assert!(UnitCell::new(0.0, 1.0, 1.0, 90.0, 90.0, 90.0).is_degenerate());
        assert!(!UnitCell::new(1.0, 1.0, 1.0, 90.0, 90.0, 90.0).is_degenerate());
    }
}
