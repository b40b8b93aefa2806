use crate::io::error::Error;
use crate::model::{
    atom::Atom, chain::Chain, models::Model, residue::Residue, structure::Structure,
    types::UnitCell,
};
use std::collections::HashSet;
use std::io::Write;

const TITLE_WIDTH: usize = 69;

pub fn write_structure<W: Write>(writer: W, structure: &Structure) -> Result<(), Error> {
    let mut ctx = WriterContext::new(writer);

    ctx.write_header(structure)?;

    if let Some(cell) = &structure.cell {
        ctx.write_cryst1(cell)?;
    }

    let multi_model = structure.model_count() > 1;
    for model in structure.iter_models() {
        ctx.write_model(model, multi_model)?;
    }

    ctx.write_end()?;

    Ok(())
}

/// Renders the structure as PDB text held in memory.
pub fn to_string(structure: &Structure) -> Result<String, Error> {
    let mut buffer = Vec::new();
    write_structure(&mut buffer, structure)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

struct WriterContext<W> {
    writer: W,
    current_serial: usize,
    warned: HashSet<String>,
}

impl<W: Write> WriterContext<W> {
    fn new(writer: W) -> Self {
        Self {
            writer,
            current_serial: 1,
            warned: HashSet::new(),
        }
    }

    fn line(&mut self, text: &str) -> Result<(), Error> {
        writeln!(self.writer, "{}", text).map_err(|e| Error::from_io(e, None))
    }

    /// Logs a lossy write once per distinct message.
    fn warn_once(&mut self, message: String) {
        if self.warned.insert(message.clone()) {
            log::warn!("{}", message);
        }
    }

    fn write_header(&mut self, structure: &Structure) -> Result<(), Error> {
        if let Some(id) = &structure.id_code {
            let line = format!("HEADER    {:<40}{:9}   {}", "", "", id);
            self.line(&line)?;
        }

        if let Some(title) = &structure.title {
            for (idx, chunk) in wrap_words(title, TITLE_WIDTH).iter().enumerate() {
                let line = if idx == 0 {
                    format!("TITLE     {}", chunk)
                } else {
                    format!("TITLE   {:>2} {}", idx + 1, chunk)
                };
                self.line(&line)?;
            }
        }
        Ok(())
    }

    fn write_cryst1(&mut self, cell: &UnitCell) -> Result<(), Error> {
        let line = format!(
            "CRYST1{:9.3}{:9.3}{:9.3}{:7.2}{:7.2}{:7.2} {:<11}{:4}",
            cell.a,
            cell.b,
            cell.c,
            cell.alpha,
            cell.beta,
            cell.gamma,
            cell.space_group_or_p1(),
            1
        );
        self.line(&line)
    }

    fn write_model(&mut self, model: &Model, multi_model: bool) -> Result<(), Error> {
        if multi_model {
            self.line(&format!("MODEL     {:>4}", model.serial))?;
            self.current_serial = 1;
        }

        for chain in model.iter_chains() {
            self.write_chain(chain)?;
        }

        if multi_model {
            self.line("ENDMDL")?;
        }
        Ok(())
    }

    fn write_chain(&mut self, chain: &Chain) -> Result<(), Error> {
        let chain_id = self.chain_column(&chain.id);
        let last_polymer = chain.last_polymer_residue();

        for residue in chain.iter_residues() {
            for atom in residue.iter_atoms() {
                let record_type = if residue.hetero { "HETATM" } else { "ATOM  " };
                let serial = self.current_serial;
                self.write_atom_record(record_type, serial, atom, residue, chain_id)?;
                self.current_serial += 1;
            }

            if last_polymer.is_some_and(|last| std::ptr::eq(last, residue)) {
                let serial = self.current_serial;
                self.write_ter_record(serial, residue, chain_id)?;
                self.current_serial += 1;
            }
        }
        Ok(())
    }

    fn chain_column(&mut self, chain_id: &str) -> char {
        let mut chars = chain_id.chars();
        let first = chars.next().unwrap_or(' ');
        if chars.next().is_some() {
            self.warn_once(format!(
                "Chain ID '{}' does not fit the PDB format; writing '{}'",
                chain_id, first
            ));
        }
        first
    }

    fn residue_columns(&mut self, residue: &Residue) -> (String, String) {
        let name = if residue.name.len() > 3 {
            self.warn_once(format!(
                "Residue name '{}' does not fit the PDB format; truncating",
                residue.name
            ));
            residue.name.chars().take(3).collect()
        } else {
            residue.name.clone()
        };

        let seq = if (-999..=9999).contains(&residue.id) {
            residue.id.to_string()
        } else {
            self.warn_once(format!(
                "Residue number {} does not fit the PDB format; wrapping",
                residue.id
            ));
            (residue.id.rem_euclid(10000)).to_string()
        };

        (name, seq)
    }

    fn write_atom_record(
        &mut self,
        record_type: &str,
        serial: usize,
        atom: &Atom,
        residue: &Residue,
        chain_id: char,
    ) -> Result<(), Error> {
        let atom_name = if atom.name.len() >= 4 {
            atom.name.chars().take(4).collect::<String>()
        } else if atom.element.symbol().len() == 1 {
            format!(" {:<3}", atom.name)
        } else {
            format!("{:<4}", atom.name)
        };

        let (res_name, res_seq) = self.residue_columns(residue);

        let line = format!(
            "{:6}{:5} {:4}{:1}{:>3} {:1}{:>4}{:1}   {:8.3}{:8.3}{:8.3}{:6.2}{:6.2}          {:>2}{:2}",
            record_type,
            serial % 100000,
            atom_name,
            atom.alt_loc.unwrap_or(' '),
            res_name,
            chain_id,
            res_seq,
            residue.insertion_code.unwrap_or(' '),
            atom.pos.x,
            atom.pos.y,
            atom.pos.z,
            atom.occupancy,
            atom.b_factor,
            atom.element.pdb_symbol(),
            format_charge(atom.formal_charge)
        );
        self.line(&line)
    }

    fn write_ter_record(
        &mut self,
        serial: usize,
        residue: &Residue,
        chain_id: char,
    ) -> Result<(), Error> {
        let (res_name, res_seq) = self.residue_columns(residue);

        let line = format!(
            "TER   {:5}      {:>3} {:1}{:>4}{:1}",
            serial % 100000,
            res_name,
            chain_id,
            res_seq,
            residue.insertion_code.unwrap_or(' ')
        );
        self.line(&line)
    }

    fn write_end(&mut self) -> Result<(), Error> {
        self.line("END")?;
        self.writer.flush().map_err(|e| Error::from_io(e, None))
    }
}

/// Columns 79-80: magnitude followed by sign (`2+`), blank when neutral.
fn format_charge(charge: i8) -> String {
    match charge {
        0 => String::new(),
        c if c > 0 => format!("{}+", c),
        c => format!("{}-", c.unsigned_abs()),
    }
}

/// Greedy word wrap used for continued records such as `TITLE`.
fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word;
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split = word
                .char_indices()
                .map(|(i, _)| i)
                .take_while(|i| *i <= width)
                .last()
                .unwrap_or(width);
            lines.push(word[..split].to_string());
            word = &word[split..];
        }

        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::pdb::reader;
    use crate::model::types::{Element, Point};
    use std::io::Cursor;

    fn parse_float(text: &str) -> f64 {
        text.trim().parse::<f64>().unwrap()
    }

    fn sample_structure() -> Structure {
        let mut structure = Structure::new();
        structure.id_code = Some("1ABC".to_string());
        structure.title = Some("TEST PROTEIN".to_string());
        let mut cell = UnitCell::new(10.0, 20.0, 30.0, 90.0, 90.0, 120.0);
        cell.space_group = Some("P 61".to_string());
        structure.cell = Some(cell);

        let mut model = Model::new(1);
        let mut chain = Chain::new("A");

        let mut ala = Residue::new(1, None, "ALA", false);
        ala.add_atom(
            Atom::new("N", Element::N, Point::new(1.0, 2.0, 3.0))
                .with_serial(1)
                .with_b_factor(12.5),
        );
        ala.add_atom(
            Atom::new("CA", Element::C, Point::new(-1.5, 2.25, 0.0))
                .with_serial(2)
                .with_alt_loc(Some('A'))
                .with_occupancy(0.5),
        );
        chain.add_residue(ala);

        let mut zinc = Residue::new(301, None, "ZN", true);
        zinc.add_atom(
            Atom::new("ZN", Element::Zn, Point::new(5.0, 5.0, 5.0)).with_formal_charge(2),
        );
        chain.add_residue(zinc);

        model.add_chain(chain);
        structure.add_model(model);
        structure
    }

    #[test]
    fn write_structure_emits_fixed_columns() {
        let text = to_string(&sample_structure()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("HEADER"));
        assert_eq!(&lines[0][62..66], "1ABC");
        assert_eq!(lines[1], "TITLE     TEST PROTEIN");

        let cryst = lines[2];
        assert!(cryst.starts_with("CRYST1"));
        assert!((parse_float(&cryst[6..15]) - 10.0).abs() < 1e-3);
        assert!((parse_float(&cryst[47..54]) - 120.0).abs() < 1e-2);
        assert_eq!(cryst[55..66].trim(), "P 61");

        let n = lines[3];
        assert_eq!(&n[0..6], "ATOM  ");
        assert_eq!(n[6..11].trim(), "1");
        assert_eq!(&n[12..16], " N  ");
        assert_eq!(&n[17..20], "ALA");
        assert_eq!(&n[21..22], "A");
        assert_eq!(n[22..26].trim(), "1");
        assert!((parse_float(&n[30..38]) - 1.0).abs() < 1e-6);
        assert!((parse_float(&n[60..66]) - 12.5).abs() < 1e-6);
        assert_eq!(n[76..78].trim(), "N");

        let ca = lines[4];
        assert_eq!(&ca[12..16], " CA ");
        assert_eq!(&ca[16..17], "A");
        assert!((parse_float(&ca[54..60]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn write_structure_places_ter_after_polymer_and_before_heterogens() {
        let text = to_string(&sample_structure()).unwrap();
        let records: Vec<&str> = text.lines().map(|l| l[..6.min(l.len())].trim()).collect();

        assert_eq!(
            records,
            vec!["HEADER", "TITLE", "CRYST1", "ATOM", "ATOM", "TER", "HETATM", "END"]
        );

        let hetatm = text.lines().find(|l| l.starts_with("HETATM")).unwrap();
        assert_eq!(hetatm[6..11].trim(), "4");
        assert_eq!(&hetatm[12..16], "ZN  ");
        assert_eq!(&hetatm[76..80], "ZN2+");
    }

    #[test]
    fn write_structure_wraps_models() {
        let mut structure = Structure::new();
        for serial in 1..=2 {
            let mut model = Model::new(serial);
            let mut chain = Chain::new("A");
            let mut residue = Residue::new(1, None, "HOH", true);
            residue.add_atom(Atom::new("O", Element::O, Point::origin()));
            chain.add_residue(residue);
            model.add_chain(chain);
            structure.add_model(model);
        }

        let text = to_string(&structure).unwrap();

        assert_eq!(text.matches("MODEL").count(), 2);
        assert_eq!(text.matches("ENDMDL").count(), 2);
        assert!(text.contains("MODEL        2"));
        assert!(!text.contains("TER"));
    }

    #[test]
    fn write_structure_truncates_wide_values() {
        let mut structure = Structure::new();
        let mut model = Model::new(1);
        let mut chain = Chain::new("AB");
        let mut residue = Residue::new(12345, None, "LONG", true);
        residue.add_atom(Atom::new("C1", Element::C, Point::origin()));
        chain.add_residue(residue);
        model.add_chain(chain);
        structure.add_model(model);

        let text = to_string(&structure).unwrap();
        let line = text.lines().find(|l| l.starts_with("HETATM")).unwrap();

        assert_eq!(&line[17..20], "LON");
        assert_eq!(&line[21..22], "A");
        assert_eq!(line[22..26].trim(), "2345");
    }

    #[test]
    fn written_text_reads_back() {
        let original = sample_structure();
        let text = to_string(&original).unwrap();

        let parsed = reader::read(Cursor::new(text.as_bytes())).unwrap();

        assert_eq!(parsed.atom_count(), original.atom_count());
        assert_eq!(parsed.id_code, original.id_code);
        assert_eq!(parsed.title, original.title);
        assert_eq!(parsed.cell, original.cell);
        let zinc = parsed.iter_atoms().find(|a| a.element == Element::Zn).unwrap();
        assert_eq!(zinc.formal_charge, 2);
    }

    #[test]
    fn water_sharing_a_residue_number_stays_hetatm() {
        const PDB_DATA: &str = "\
ATOM      1  N   ALA A   1       0.000   0.000   0.000  1.00 10.00           N\n\
ATOM      2  CA  ALA A   1       1.458   0.000   0.000  1.00 10.00           C\n\
HETATM    3  O   HOH A   1       5.000   5.000   5.000  1.00 20.00           O\n";

        let parsed = reader::read(Cursor::new(PDB_DATA.as_bytes())).unwrap();
        assert_eq!(parsed.first_model().unwrap().chain("A").unwrap().residue_count(), 2);

        let text = to_string(&parsed).unwrap();
        let records: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with("ATOM") || l.starts_with("HETATM"))
            .collect();

        assert_eq!(records.len(), 3);
        assert!(records[0].starts_with("ATOM  ") && &records[0][17..20] == "ALA");
        assert!(records[2].starts_with("HETATM"));
        assert_eq!(&records[2][17..20], "HOH");
        assert_eq!(records[2][22..26].trim(), "1");
    }

    #[test]
    fn wrap_words_respects_width() {
        let lines = wrap_words("ALPHA BETA GAMMA DELTA", 11);

        assert_eq!(lines, vec!["ALPHA BETA", "GAMMA DELTA"]);
        assert_eq!(wrap_words("ABCDEFGHIJ", 4), vec!["ABCD", "EFGH", "IJ"]);
    }

    #[test]
    fn format_charge_matches_pdb_convention() {
        assert_eq!(format_charge(0), "");
        assert_eq!(format_charge(2), "2+");
        assert_eq!(format_charge(-1), "1-");
    }
}
