// ─────────────────────────────────────────────────────────────────────
// SCPN Grain Core — Auger Spectra
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Loader for the Auger electron spectra of inner-shell vacancies.
//!
//! Text format, one datum per line. `#` starts a comment. The first datum
//! is the layout version, followed by element records terminated by a
//! negative element index:
//!
//! ```text
//! element index
//! number of subshells
//!   subshell index (0, 1, ...)
//!   ionization threshold [eV]
//!   number of lines
//!     energy [eV]  average number of electrons
//! ```

use grain_types::constants::{EVRYD, LIMELM, MAGIC_AUGER_DATA};
use grain_types::error::{GrainError, GrainResult};

#[derive(Debug, Clone, PartialEq)]
pub struct AugerShell {
    /// Ionization threshold [Ryd]
    pub threshold: f64,
    /// Auger line energies [Ryd], all below the threshold.
    pub energies: Vec<f64>,
    /// Average number of electrons emitted per vacancy in each line.
    pub avg_numbers: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AugerElement {
    pub element: usize,
    pub shells: Vec<AugerShell>,
}

#[derive(Debug, Clone, Default)]
pub struct AugerTable {
    elements: Vec<Option<AugerElement>>,
}

struct DataLines<'a> {
    source: &'a str,
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> DataLines<'a> {
    fn new(source: &'a str, text: &'a str) -> Self {
        DataLines {
            source,
            lines: text.lines().enumerate(),
        }
    }

    /// Next non-comment line with any trailing comment stripped.
    fn next_line(&mut self) -> GrainResult<(usize, &'a str)> {
        for (number, line) in self.lines.by_ref() {
            let data = line.split('#').next().unwrap_or("").trim();
            if !data.is_empty() {
                return Ok((number + 1, data));
            }
        }
        Err(GrainError::DataFormat(format!(
            "{}: unexpected end of Auger data",
            self.source
        )))
    }

    fn next_value<T: std::str::FromStr>(&mut self, what: &str) -> GrainResult<T> {
        let (number, line) = self.next_line()?;
        let token = line.split_whitespace().next().unwrap_or("");
        token.parse().map_err(|_| {
            GrainError::DataFormat(format!(
                "{}:{number}: cannot read {what} from '{line}'",
                self.source
            ))
        })
    }

    fn next_pair(&mut self) -> GrainResult<(f64, f64)> {
        let (number, line) = self.next_line()?;
        let mut fields = line.split_whitespace().map(str::parse::<f64>);
        match (fields.next(), fields.next()) {
            (Some(Ok(a)), Some(Ok(b))) => Ok((a, b)),
            _ => Err(GrainError::DataFormat(format!(
                "{}:{number}: expected 'energy number', got '{line}'",
                self.source
            ))),
        }
    }
}

impl AugerTable {
    pub fn from_file(path: &str) -> GrainResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(path, &text)
    }

    /// Parse table text; `source` names the input in diagnostics.
    pub fn parse(source: &str, text: &str) -> GrainResult<Self> {
        let mut lines = DataLines::new(source, text);
        let version: i64 = lines.next_value("version")?;
        if version != MAGIC_AUGER_DATA {
            return Err(GrainError::DataVersionMismatch {
                path: source.to_string(),
                expected: MAGIC_AUGER_DATA,
                found: version,
            });
        }

        let mut elements: Vec<Option<AugerElement>> = vec![None; LIMELM];
        loop {
            let index: i64 = lines.next_value("element index")?;
            if index < 0 {
                break;
            }
            let element = index as usize;
            if element >= LIMELM {
                return Err(GrainError::DataFormat(format!(
                    "{source}: element index {element} out of range"
                )));
            }
            if elements[element].is_some() {
                return Err(GrainError::DataFormat(format!(
                    "{source}: duplicate record for element {element}"
                )));
            }
            let n_shells: usize = lines.next_value("number of subshells")?;
            if n_shells == 0 {
                return Err(GrainError::DataFormat(format!(
                    "{source}: element {element} has no subshells"
                )));
            }
            let mut shells = Vec::with_capacity(n_shells);
            for ns in 0..n_shells {
                let index: usize = lines.next_value("subshell index")?;
                if index != ns {
                    return Err(GrainError::DataFormat(format!(
                        "{source}: element {element} subshell {index} out of order, expected {ns}"
                    )));
                }
                let threshold = lines.next_value::<f64>("ionization threshold")? / EVRYD;
                let n_lines: usize = lines.next_value("number of lines")?;
                if n_lines == 0 {
                    return Err(GrainError::DataFormat(format!(
                        "{source}: element {element} subshell {ns} has no lines"
                    )));
                }
                let mut energies = Vec::with_capacity(n_lines);
                let mut avg_numbers = Vec::with_capacity(n_lines);
                for _ in 0..n_lines {
                    let (energy_ev, avg) = lines.next_pair()?;
                    let energy = energy_ev / EVRYD;
                    if energy >= threshold {
                        return Err(GrainError::DataFormat(format!(
                            "{source}: element {element} subshell {ns}: line at {energy_ev} eV \
                             is not below the threshold"
                        )));
                    }
                    energies.push(energy);
                    avg_numbers.push(avg);
                }
                shells.push(AugerShell {
                    threshold,
                    energies,
                    avg_numbers,
                });
            }
            elements[element] = Some(AugerElement { element, shells });
        }
        Ok(AugerTable { elements })
    }

    pub fn get(&self, element: usize) -> Option<&AugerElement> {
        self.elements.get(element).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.elements.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
