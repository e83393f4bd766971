//! Genomic trait field table
//!
//! One ordered table of the fifteen fields extracted per document. The
//! completeness scorer and every display layer read this table, so a field
//! added or renamed here changes scoring and rendering together.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the fixed genomic fields stored on a trait record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitField {
    Trait,
    GermplasmName,
    GenomeVersion,
    Chromosome,
    PhysicalPosition,
    Gene,
    SnpName,
    VariantId,
    VariantType,
    EffectSize,
    GwasModel,
    EvidenceType,
    Allele,
    Annotation,
    CandidateRegion,
}

/// All trait fields in display and scoring order
pub const TRAIT_FIELDS: [TraitField; 15] = [
    TraitField::Trait,
    TraitField::GermplasmName,
    TraitField::GenomeVersion,
    TraitField::Chromosome,
    TraitField::PhysicalPosition,
    TraitField::Gene,
    TraitField::SnpName,
    TraitField::VariantId,
    TraitField::VariantType,
    TraitField::EffectSize,
    TraitField::GwasModel,
    TraitField::EvidenceType,
    TraitField::Allele,
    TraitField::Annotation,
    TraitField::CandidateRegion,
];

impl TraitField {
    /// Warehouse column name (lower-case)
    pub fn column(self) -> &'static str {
        match self {
            TraitField::Trait => "trait",
            TraitField::GermplasmName => "germplasm_name",
            TraitField::GenomeVersion => "genome_version",
            TraitField::Chromosome => "chromosome",
            TraitField::PhysicalPosition => "physical_position",
            TraitField::Gene => "gene",
            TraitField::SnpName => "snp_name",
            TraitField::VariantId => "variant_id",
            TraitField::VariantType => "variant_type",
            TraitField::EffectSize => "effect_size",
            TraitField::GwasModel => "gwas_model",
            TraitField::EvidenceType => "evidence_type",
            TraitField::Allele => "allele",
            TraitField::Annotation => "annotation",
            TraitField::CandidateRegion => "candidate_region",
        }
    }

    /// Human-readable label for cards and tables
    pub fn label(self) -> &'static str {
        match self {
            TraitField::Trait => "Trait",
            TraitField::GermplasmName => "Germplasm Name",
            TraitField::GenomeVersion => "Genome Version",
            TraitField::Chromosome => "Chromosome",
            TraitField::PhysicalPosition => "Physical Position",
            TraitField::Gene => "Gene",
            TraitField::SnpName => "SNP Name",
            TraitField::VariantId => "Variant ID",
            TraitField::VariantType => "Variant Type",
            TraitField::EffectSize => "Effect Size",
            TraitField::GwasModel => "GWAS Model",
            TraitField::EvidenceType => "Evidence Type",
            TraitField::Allele => "Allele",
            TraitField::Annotation => "Annotation",
            TraitField::CandidateRegion => "Candidate Region",
        }
    }

    /// Card icon
    pub fn icon(self) -> &'static str {
        match self {
            TraitField::Trait => "🎯",
            TraitField::GermplasmName => "🌱",
            TraitField::GenomeVersion => "🧬",
            TraitField::Chromosome => "📍",
            TraitField::PhysicalPosition => "📏",
            TraitField::Gene => "🧪",
            TraitField::SnpName => "🔬",
            TraitField::VariantId => "🆔",
            TraitField::VariantType => "🔀",
            TraitField::EffectSize => "📈",
            TraitField::GwasModel => "🧮",
            TraitField::EvidenceType => "📋",
            TraitField::Allele => "🔤",
            TraitField::Annotation => "📝",
            TraitField::CandidateRegion => "🗺️",
        }
    }

    /// Look up a field by column name, ignoring ASCII case
    ///
    /// Warehouses report column names upper-cased (`GERMPLASM_NAME`), the
    /// SQLite mirror lower-cased; both resolve to the same field.
    pub fn from_column(name: &str) -> Option<TraitField> {
        TRAIT_FIELDS
            .iter()
            .copied()
            .find(|field| field.column().eq_ignore_ascii_case(name))
    }
}

impl AsRef<str> for TraitField {
    fn as_ref(&self) -> &str {
        self.column()
    }
}

impl fmt::Display for TraitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}
