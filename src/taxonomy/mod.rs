//! Static cut taxonomy - embedded per-species catalogs
//!
//! Each species ships as a YAML file embedded in the binary, parsed once into
//! a `Taxonomy`. Cut IDs are globally unique across all species; loading
//! validates that invariant so configuration and documents can reference a
//! cut by ID alone.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_embed::Embed;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Embed)]
#[folder = "src/taxonomy/data/"]
struct EmbeddedTaxonomy;

/// Species supported by the cut sheet workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimalType {
    Beef,
    Pork,
    Lamb,
    Goat,
}

impl AnimalType {
    pub const ALL: [AnimalType; 4] = [
        AnimalType::Beef,
        AnimalType::Pork,
        AnimalType::Lamb,
        AnimalType::Goat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnimalType::Beef => "beef",
            AnimalType::Pork => "pork",
            AnimalType::Lamb => "lamb",
            AnimalType::Goat => "goat",
        }
    }
}

impl std::fmt::Display for AnimalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AnimalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beef" => Ok(AnimalType::Beef),
            "pork" => Ok(AnimalType::Pork),
            "lamb" => Ok(AnimalType::Lamb),
            "goat" => Ok(AnimalType::Goat),
            _ => Err(format!("Unknown animal type: {}", s)),
        }
    }
}

/// One selectable cut within a primal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutChoice {
    pub id: String,
    pub name: String,

    /// Requires extra skill or equipment; not every processor offers it
    #[serde(default)]
    pub specialty: bool,

    /// Carries an additional processing fee (curing, smoking, tenderizing)
    #[serde(default)]
    pub additional_fee: bool,
}

/// A named subdivision of a primal (one level deep)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubSection {
    pub id: String,
    pub name: String,
    pub cuts: Vec<CutChoice>,
}

/// A large anatomical section of the carcass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Primal {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub cuts: Vec<CutChoice>,

    #[serde(default)]
    pub subsections: Vec<SubSection>,
}

/// The full catalog for one species
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimalSchema {
    pub animal: AnimalType,
    pub primals: Vec<Primal>,
}

/// Where a cut lives within the taxonomy
#[derive(Debug, Clone)]
struct CutKey {
    animal: AnimalType,
    primal: String,
    subsection: Option<String>,
}

/// A resolved cut with its location
#[derive(Debug, Clone, Copy)]
pub struct FoundCut<'a> {
    pub animal: AnimalType,
    pub primal_id: &'a str,
    pub subsection_id: Option<&'a str>,
    pub cut: &'a CutChoice,
}

/// Enabled/total counts for a species given a disabled set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutCounts {
    pub enabled: usize,
    pub total: usize,
}

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("Missing embedded taxonomy data for {0}")]
    MissingData(AnimalType),

    #[error("Cannot parse taxonomy file {file}: {message}")]
    Parse { file: String, message: String },

    #[error("Duplicate cut ID '{cut_id}' (first seen in {first}, again in {second})")]
    DuplicateCutId {
        cut_id: String,
        first: AnimalType,
        second: AnimalType,
    },
}

/// The loaded, validated cut catalog for all species
#[derive(Debug, Clone)]
pub struct Taxonomy {
    schemas: BTreeMap<AnimalType, AnimalSchema>,
    index: HashMap<String, CutKey>,
}

impl Taxonomy {
    /// Load and validate the embedded catalogs
    pub fn load() -> Result<Self, TaxonomyError> {
        let mut schemas = BTreeMap::new();
        let mut index: HashMap<String, CutKey> = HashMap::new();

        for animal in AnimalType::ALL {
            let filename = format!("{}.yaml", animal.as_str());
            let file = EmbeddedTaxonomy::get(&filename)
                .ok_or(TaxonomyError::MissingData(animal))?;
            let content =
                std::str::from_utf8(&file.data).map_err(|e| TaxonomyError::Parse {
                    file: filename.clone(),
                    message: e.to_string(),
                })?;
            let schema: AnimalSchema =
                serde_yml::from_str(content).map_err(|e| TaxonomyError::Parse {
                    file: filename.clone(),
                    message: e.to_string(),
                })?;

            for primal in &schema.primals {
                for cut in &primal.cuts {
                    Self::index_cut(&mut index, cut, animal, &primal.id, None)?;
                }
                for sub in &primal.subsections {
                    for cut in &sub.cuts {
                        Self::index_cut(&mut index, cut, animal, &primal.id, Some(&sub.id))?;
                    }
                }
            }

            schemas.insert(animal, schema);
        }

        Ok(Self { schemas, index })
    }

    fn index_cut(
        index: &mut HashMap<String, CutKey>,
        cut: &CutChoice,
        animal: AnimalType,
        primal: &str,
        subsection: Option<&str>,
    ) -> Result<(), TaxonomyError> {
        if let Some(existing) = index.get(&cut.id) {
            return Err(TaxonomyError::DuplicateCutId {
                cut_id: cut.id.clone(),
                first: existing.animal,
                second: animal,
            });
        }
        index.insert(
            cut.id.clone(),
            CutKey {
                animal,
                primal: primal.to_string(),
                subsection: subsection.map(|s| s.to_string()),
            },
        );
        Ok(())
    }

    /// The full catalog for one species
    pub fn animal_schema(&self, animal: AnimalType) -> &AnimalSchema {
        // All four species are loaded in `load`, so the lookup cannot miss.
        &self.schemas[&animal]
    }

    /// Ordered primals for one species
    pub fn primals(&self, animal: AnimalType) -> &[Primal] {
        &self.animal_schema(animal).primals
    }

    /// Resolve a cut ID anywhere in the taxonomy
    pub fn find_cut(&self, cut_id: &str) -> Option<FoundCut<'_>> {
        let key = self.index.get(cut_id)?;
        let schema = &self.schemas[&key.animal];
        let primal = schema.primals.iter().find(|p| p.id == key.primal)?;

        let (subsection_id, cut) = match &key.subsection {
            None => (None, primal.cuts.iter().find(|c| c.id == cut_id)?),
            Some(sub_id) => {
                let sub = primal.subsections.iter().find(|s| &s.id == sub_id)?;
                (
                    Some(sub.id.as_str()),
                    sub.cuts.iter().find(|c| c.id == cut_id)?,
                )
            }
        };

        Some(FoundCut {
            animal: key.animal,
            primal_id: &primal.id,
            subsection_id,
            cut,
        })
    }

    /// All cuts for a species, in catalog order
    pub fn cuts(&self, animal: AnimalType) -> impl Iterator<Item = &CutChoice> {
        self.primals(animal).iter().flat_map(|p| {
            p.cuts
                .iter()
                .chain(p.subsections.iter().flat_map(|s| s.cuts.iter()))
        })
    }

    /// Enabled/total cut counts for a species given a processor's disabled set
    pub fn cut_counts(&self, animal: AnimalType, disabled: &BTreeSet<String>) -> CutCounts {
        let mut counts = CutCounts {
            enabled: 0,
            total: 0,
        };
        for cut in self.cuts(animal) {
            counts.total += 1;
            if !disabled.contains(&cut.id) {
                counts.enabled += 1;
            }
        }
        counts
    }
}
