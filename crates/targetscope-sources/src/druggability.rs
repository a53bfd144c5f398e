//! Druggability heuristic.
//!
//!   score = min(1, w_site   · min(sites, site_cap) / site_cap
//!                + w_ligand · min(ligands, ligand_cap) / ligand_cap
//!                + w_class  · class_weight(structural_class))

use serde::{Deserialize, Serialize};

use targetscope_common::{DruggabilityEvidence, EngineError, Result};

/// Broad structural / functional class of a protein.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralClass {
    Kinase,
    Gpcr,
    IonChannel,
    NuclearReceptor,
    Protease,
    Enzyme,
    Transporter,
    Receptor,
    TranscriptionFactor,
    Other,
}

impl StructuralClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            StructuralClass::Kinase              => "kinase",
            StructuralClass::Gpcr                => "gpcr",
            StructuralClass::IonChannel          => "ion_channel",
            StructuralClass::NuclearReceptor     => "nuclear_receptor",
            StructuralClass::Protease            => "protease",
            StructuralClass::Enzyme              => "enzyme",
            StructuralClass::Transporter         => "transporter",
            StructuralClass::Receptor            => "receptor",
            StructuralClass::TranscriptionFactor => "transcription_factor",
            StructuralClass::Other               => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let class = match s.trim().to_lowercase().as_str() {
            "kinase"               => StructuralClass::Kinase,
            "gpcr"                 => StructuralClass::Gpcr,
            "ion_channel"          => StructuralClass::IonChannel,
            "nuclear_receptor"     => StructuralClass::NuclearReceptor,
            "protease"             => StructuralClass::Protease,
            "enzyme"               => StructuralClass::Enzyme,
            "transporter"          => StructuralClass::Transporter,
            "receptor"             => StructuralClass::Receptor,
            "transcription_factor" => StructuralClass::TranscriptionFactor,
            "other"                => StructuralClass::Other,
            _ => return None,
        };
        Some(class)
    }

    /// Map a UniProt keyword onto a class, if it names one.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let kw = keyword.to_lowercase();
        let class = if kw.contains("kinase") {
            StructuralClass::Kinase
        } else if kw.contains("g-protein coupled receptor") {
            StructuralClass::Gpcr
        } else if kw.contains("ion channel") || kw.contains("ionic channel") {
            StructuralClass::IonChannel
        } else if kw.contains("nuclear receptor") || kw == "steroid-binding" {
            StructuralClass::NuclearReceptor
        } else if kw.contains("protease") {
            StructuralClass::Protease
        } else if kw.contains("transport") {
            StructuralClass::Transporter
        } else if kw == "receptor" {
            StructuralClass::Receptor
        } else if kw == "transcription regulation" || kw == "activator" || kw == "repressor" {
            StructuralClass::TranscriptionFactor
        } else if matches!(
            kw.as_str(),
            "hydrolase" | "transferase" | "oxidoreductase" | "lyase" | "isomerase" | "ligase"
        ) {
            StructuralClass::Enzyme
        } else {
            return None;
        };
        Some(class)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassWeights {
    #[serde(default = "one")]
    pub kinase: f64,
    #[serde(default = "one")]
    pub gpcr: f64,
    #[serde(default = "point_nine")]
    pub ion_channel: f64,
    #[serde(default = "point_nine")]
    pub nuclear_receptor: f64,
    #[serde(default = "point_eight")]
    pub protease: f64,
    #[serde(default = "point_seven")]
    pub enzyme: f64,
    #[serde(default = "point_six")]
    pub transporter: f64,
    #[serde(default = "point_seven")]
    pub receptor: f64,
    #[serde(default = "point_three")]
    pub transcription_factor: f64,
    #[serde(default = "point_two")]
    pub other: f64,
}

fn one() -> f64 { 1.0 }
fn point_nine() -> f64 { 0.9 }
fn point_eight() -> f64 { 0.8 }
fn point_seven() -> f64 { 0.7 }
fn point_six() -> f64 { 0.6 }
fn point_three() -> f64 { 0.3 }
fn point_two() -> f64 { 0.2 }

impl Default for ClassWeights {
    fn default() -> Self {
        Self {
            kinase: 1.0,
            gpcr: 1.0,
            ion_channel: 0.9,
            nuclear_receptor: 0.9,
            protease: 0.8,
            enzyme: 0.7,
            transporter: 0.6,
            receptor: 0.7,
            transcription_factor: 0.3,
            other: 0.2,
        }
    }
}

impl ClassWeights {
    pub fn weight(&self, class: StructuralClass) -> f64 {
        match class {
            StructuralClass::Kinase              => self.kinase,
            StructuralClass::Gpcr                => self.gpcr,
            StructuralClass::IonChannel          => self.ion_channel,
            StructuralClass::NuclearReceptor     => self.nuclear_receptor,
            StructuralClass::Protease            => self.protease,
            StructuralClass::Enzyme              => self.enzyme,
            StructuralClass::Transporter         => self.transporter,
            StructuralClass::Receptor            => self.receptor,
            StructuralClass::TranscriptionFactor => self.transcription_factor,
            StructuralClass::Other               => self.other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DruggabilityHeuristic {
    #[serde(default = "default_w_site")]
    pub w_site: f64,
    #[serde(default = "default_site_cap")]
    pub site_cap: u32,
    #[serde(default = "default_w_ligand")]
    pub w_ligand: f64,
    #[serde(default = "default_ligand_cap")]
    pub ligand_cap: u32,
    #[serde(default = "default_w_class")]
    pub w_class: f64,
    #[serde(default)]
    pub class_weights: ClassWeights,
}

fn default_w_site() -> f64 { 0.35 }
fn default_site_cap() -> u32 { 5 }
fn default_w_ligand() -> f64 { 0.35 }
fn default_ligand_cap() -> u32 { 3 }
fn default_w_class() -> f64 { 0.30 }

impl Default for DruggabilityHeuristic {
    fn default() -> Self {
        Self {
            w_site: default_w_site(),
            site_cap: default_site_cap(),
            w_ligand: default_w_ligand(),
            ligand_cap: default_ligand_cap(),
            w_class: default_w_class(),
            class_weights: ClassWeights::default(),
        }
    }
}

impl DruggabilityHeuristic {
    pub fn validate(&self) -> Result<()> {
        if self.site_cap == 0 || self.ligand_cap == 0 {
            return Err(EngineError::config("druggability caps must be at least 1"));
        }
        if [self.w_site, self.w_ligand, self.w_class].iter().any(|w| *w < 0.0) {
            return Err(EngineError::config("druggability weights must be non-negative"));
        }
        Ok(())
    }

    /// Score in [0, 1]. Missing class counts as `other`.
    pub fn score(&self, evidence: &DruggabilityEvidence) -> f64 {
        let sites = f64::from(evidence.binding_sites.min(self.site_cap)) / f64::from(self.site_cap);
        let ligands =
            f64::from(evidence.ligand_count.min(self.ligand_cap)) / f64::from(self.ligand_cap);
        let class = evidence
            .structural_class
            .as_deref()
            .and_then(StructuralClass::parse)
            .unwrap_or(StructuralClass::Other);

        let raw = self.w_site * sites
            + self.w_ligand * ligands
            + self.w_class * self.class_weights.weight(class);
        raw.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(sites: u32, ligands: u32, class: Option<&str>) -> DruggabilityEvidence {
        DruggabilityEvidence {
            binding_sites: sites,
            ligand_count: ligands,
            structural_class: class.map(String::from),
        }
    }

    #[test]
    fn test_saturated_kinase_scores_one() {
        let h = DruggabilityHeuristic::default();
        let s = h.score(&evidence(12, 40, Some("kinase")));
        assert!((s - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_evidence_scores_other_class() {
        let h = DruggabilityHeuristic::default();
        let s = h.score(&evidence(0, 0, None));
        assert!((s - 0.30 * 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_partial_evidence() {
        let h = DruggabilityHeuristic::default();
        // 0.35·2/5 + 0.35·1/3 + 0.30·0.3
        let expected = 0.35 * 0.4 + 0.35 / 3.0 + 0.09;
        let s = h.score(&evidence(2, 1, Some("transcription_factor")));
        assert!((s - expected).abs() < 1e-9);
    }

    #[test]
    fn test_keyword_classification() {
        assert_eq!(StructuralClass::from_keyword("Tyrosine-protein kinase"), Some(StructuralClass::Kinase));
        assert_eq!(StructuralClass::from_keyword("G-protein coupled receptor"), Some(StructuralClass::Gpcr));
        assert_eq!(StructuralClass::from_keyword("Receptor"), Some(StructuralClass::Receptor));
        assert_eq!(StructuralClass::from_keyword("Hydrolase"), Some(StructuralClass::Enzyme));
        assert_eq!(StructuralClass::from_keyword("Phosphoprotein"), None);
    }

    #[test]
    fn test_zero_cap_rejected() {
        let h = DruggabilityHeuristic { site_cap: 0, ..Default::default() };
        assert!(h.validate().is_err());
    }
}
