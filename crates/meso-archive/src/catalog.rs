// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Mesoanalysis parameter catalog.
//!
//! Maps the human-readable parameter labels shown to the user onto the short
//! codes the archive uses in its image file names. Parameters are grouped into
//! sections the same way the SPC mesoanalysis page groups them.

use thiserror::Error;

/// Errors raised when a user selection cannot be turned into a parameter code.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("no parameter selected")]
    Empty,

    #[error("\"{0}\" is a section header, not a parameter")]
    SectionHeader(String),

    #[error("unknown parameter: {0}")]
    Unknown(String),
}

/// One selectable parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterEntry {
    /// Section the parameter is listed under (e.g. "Wind Shear")
    pub category: String,
    /// Display label (e.g. "0-6km Shear Vector")
    pub label: String,
    /// Archive code used in image names (e.g. "shr6")
    pub code: String,
}

/// A named group of parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub entries: Vec<ParameterEntry>,
}

impl Section {
    /// Build a section from `(label, code)` pairs.
    pub fn new(name: &str, params: &[(&str, &str)]) -> Self {
        let entries = params
            .iter()
            .map(|(label, code)| ParameterEntry {
                category: name.to_owned(),
                label: (*label).to_owned(),
                code: (*code).to_owned(),
            })
            .collect();

        Self {
            name: name.to_owned(),
            entries,
        }
    }

    /// Header line used when the catalog is rendered as a flat list
    #[must_use]
    pub fn header(&self) -> String {
        format!("--- {} ---", self.name)
    }
}

/// Placeholder section shown first in selection lists. It has no entries.
pub const PLACEHOLDER_SECTION: &str = "Choose a Parameter";

const BASIC_SURFACE: &[(&str, &str)] = &[
    ("MSL Pressure/Wind", "pmsl"),
    ("T/Td/Wind", "ttd"),
    ("Moisture Convergence", "mcon"),
    ("ThetaE Advection", "thea"),
    ("2hr Pressure Change", "pchg"),
];

const UPPER_AIR: &[(&str, &str)] = &[
    ("850 mb", "850mb"),
    ("700 mb", "700mb"),
    ("500 mb", "500mb"),
    ("300 mb", "300mb"),
    ("Deep Moisture Convergence", "dlcp"),
    ("Surface Frontogenesis", "sfnt"),
    ("850mb Temperature Advection", "tadv"),
    ("850mb Frontogenesis", "8fnt"),
    ("700mb Frontogenesis", "7fnt"),
    ("850-700mb Frontogenesis", "857f"),
    ("700-500mb Frontogenesis", "75ft"),
    ("700-400mb Diff. Vorticity Advection", "vadv"),
    ("400-250mb Pot. Vorticity Advection", "padv"),
    ("850-250mb Diff. Divergence", "ddiv"),
    ("300 mb Jet Circulation", "ageo"),
];

const THERMODYNAMIC: &[(&str, &str)] = &[
    ("SB Cape/SB CIN", "sbcp"),
    ("100mb ML CAPE", "mlcp"),
    ("MU CAPE/LPL Height", "mucp"),
    ("SB Lifted Index/ CINH", "muli"),
    ("Mid-Level Lapse Rates", "laps"),
    ("Low-Level Lapse Rates", "lllr"),
    ("Normalized CAPE", "ncap"),
    ("Downdraft CAPE", "dcape"),
    ("LFC Height", "lfch"),
    ("LCL Height", "lclh"),
    ("LCL to LFC Mean RH", "lfrh"),
    ("Skew-t", "skewt"),
];

const WIND_SHEAR: &[(&str, &str)] = &[
    ("850-300mb Mean Wind", "mnwd"),
    ("0-6km Shear Vector", "shr6"),
    ("0-8km Shear Vector", "shr8"),
    ("Effective Shear", "eshr"),
    ("BRN Shear", "brns"),
    ("0-1km SR Helicity", "srh1"),
    ("0-3km SR Helicity", "srh3"),
    ("Effective SR Helicity", "effh"),
    ("0-1km Shear Vector", "shr1"),
    ("850 & 500mb Wind Crossover", "xover"),
    ("Hodographs", "hodo"),
];

const STORM_RELATIVE: &[(&str, &str)] = &[
    ("0-2km SR Winds", "llsr"),
    ("4-6km SR Winds", "mlsr"),
    ("9-11km SR Winds", "hlsr"),
    ("Anvil Level SR Winds", "alsr"),
];

const COMPOSITE: &[(&str, &str)] = &[
    ("Supercell Composite", "scp"),
    ("Supercell Composite (left-moving)", "lscp"),
    ("Significant Tornado (fixed layer)", "stor"),
    ("Significant Tornado (effective layer)", "stpc"),
    ("Significant Hail Parameter", "sigh"),
    ("Derecho Composite", "dcp"),
    ("Craven/Brooks SigSvr", "cbsig"),
    ("1km EHI", "ehi1"),
    ("3km EHI", "ehi3"),
    ("3km VGP", "vgp3"),
    ("MCS Maintenance Probability", "mcsm"),
    ("01km Tornadic Energy Helicity Index", "tehi"),
    ("Tornadic Tilting & Stretching", "tts"),
];

const HEAVY_RAIN: &[(&str, &str)] = &[
    ("Precipitable Water", "pwtr"),
    ("850 mb Moisture Transport", "tran"),
    ("Upwind Propagation Vector", "prop"),
];

const WINTER: &[(&str, &str)] = &[
    ("Surface Wet Bulb Temperature", "swbt"),
    ("Freezing Level Info", "fzlv"),
    ("Critical Thickness", "thck"),
    ("800-750 mb EPVg", "epvl"),
    ("650-500mb EPVg", "epvm"),
    ("Lake Effect Snow 1", "les1"),
    ("Lake Effect Snow 2", "les2"),
];

const FIRE: &[(&str, &str)] = &[
    ("Surface RH, Temperature, Wind", "sfir"),
    ("Fosberg Index", "fosb"),
    ("Low-Altitude Haines Index", "lhan"),
    ("Mid-Altitude Haines Index", "mhan"),
    ("High-Altitude Haines Index", "hhan"),
    ("Lower Atmos. Severity Index", "lasi"),
];

/// Immutable parameter lookup table.
#[derive(Debug, Clone)]
pub struct Catalog {
    sections: Vec<Section>,
}

impl Catalog {
    /// Create a catalog from explicit sections.
    #[must_use]
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    /// The SPC mesoanalysis parameter table.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(vec![
            Section::new(PLACEHOLDER_SECTION, &[]),
            Section::new("Basic Surface Parameters", BASIC_SURFACE),
            Section::new("Basic UA/Forcing Fields", UPPER_AIR),
            Section::new("Thermodynamic Fields", THERMODYNAMIC),
            Section::new("Wind Shear", WIND_SHEAR),
            Section::new("Storm Relative Winds", STORM_RELATIVE),
            Section::new("Composite Indices", COMPOSITE),
            Section::new("Heavy Rainfall", HEAVY_RAIN),
            Section::new("Winter Weather", WINTER),
            Section::new("Fire Weather", FIRE),
        ])
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Iterate every parameter in display order
    pub fn entries(&self) -> impl Iterator<Item = &ParameterEntry> {
        self.sections.iter().flat_map(|s| s.entries.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    /// Lookup by exact display label
    #[must_use]
    pub fn by_label(&self, label: &str) -> Option<&ParameterEntry> {
        self.entries().find(|e| e.label == label)
    }

    /// Lookup by archive code (case-insensitive)
    #[must_use]
    pub fn by_code(&self, code: &str) -> Option<&ParameterEntry> {
        self.entries().find(|e| e.code.eq_ignore_ascii_case(code))
    }

    /// Flat selection list: a header line per section followed by its labels.
    #[must_use]
    pub fn choices(&self) -> Vec<String> {
        let mut choices = Vec::with_capacity(self.sections.len() + self.len());
        for section in &self.sections {
            choices.push(section.header());
            choices.extend(section.entries.iter().map(|e| e.label.clone()));
        }
        choices
    }

    /// Turn a user selection (label or code) into a parameter.
    ///
    /// Labels win over codes. Section headers and blank input never resolve.
    pub fn resolve_selection(&self, selection: &str) -> Result<&ParameterEntry, SelectionError> {
        let selection = selection.trim();
        if selection.is_empty() {
            return Err(SelectionError::Empty);
        }

        if let Some(entry) = self.by_label(selection).or_else(|| self.by_code(selection)) {
            return Ok(entry);
        }

        let is_header = self
            .sections
            .iter()
            .any(|s| s.name == selection || s.header() == selection);
        if is_header {
            Err(SelectionError::SectionHeader(selection.to_owned()))
        } else {
            Err(SelectionError::Unknown(selection.to_owned()))
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
