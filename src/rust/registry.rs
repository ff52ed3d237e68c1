//! Sponsored categories and the creatives shown for them.
//!
//! The registry is an ordered table: classification walks categories in the
//! order they were added, and that order decides ties.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierError;

/// Minimum cosine similarity for an ad to be shown.
pub const SHOW_AD_THRESHOLD: f32 = 0.6;

/// A sponsored topic together with the phrases that define its centroid.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryConfig {
    /// Unique identifier, also the key used in the centroid cache file
    pub key: String,
    /// Human readable name
    pub name: String,
    /// Sponsor paying for this category
    pub sponsor: String,
    /// Id of the creative rendered when this category wins
    pub creative_id: String,
    /// Example phrases averaged into the category centroid
    pub seed_phrases: Vec<String>,
}

impl CategoryConfig {
    /// Creates a category with no seed phrases yet.
    ///
    /// # Example
    /// ```
    /// use adslot::CategoryConfig;
    ///
    /// let category = CategoryConfig::new(
    ///     "migraine",
    ///     "Migraine",
    ///     "Acme Pharma",
    ///     "acme-migraine",
    /// ).with_seed_phrases(vec!["migraine with aura", "CGRP antagonist"]);
    /// assert_eq!(category.seed_phrases.len(), 2);
    /// ```
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        sponsor: impl Into<String>,
        creative_id: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            sponsor: sponsor.into(),
            creative_id: creative_id.into(),
            seed_phrases: Vec::new(),
        }
    }

    /// Replaces the seed phrases of the category
    pub fn with_seed_phrases(mut self, phrases: Vec<impl Into<String>>) -> Self {
        self.seed_phrases = phrases.into_iter().map(Into::into).collect();
        self
    }
}

/// Advertisement content for a sponsor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creative {
    pub creative_id: String,
    pub sponsor: String,
    /// Public path of the sponsor logo
    pub logo_url: String,
    pub headline: String,
    pub body: String,
    /// Call-to-action link
    pub cta_url: String,
    /// Important safety information link
    pub isi_url: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub disclaimer: Option<String>,
}

impl Creative {
    pub fn new(
        creative_id: impl Into<String>,
        sponsor: impl Into<String>,
        logo_url: impl Into<String>,
        headline: impl Into<String>,
        body: impl Into<String>,
        cta_url: impl Into<String>,
        isi_url: impl Into<String>,
    ) -> Self {
        Self {
            creative_id: creative_id.into(),
            sponsor: sponsor.into(),
            logo_url: logo_url.into(),
            headline: headline.into(),
            body: body.into(),
            cta_url: cta_url.into(),
            isi_url: isi_url.into(),
            disclaimer: None,
        }
    }

    pub fn with_disclaimer(mut self, disclaimer: impl Into<String>) -> Self {
        self.disclaimer = Some(disclaimer.into());
        self
    }
}

impl fmt::Display for Creative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ad | {}", self.sponsor)?;
        writeln!(f, "  {}", self.headline)?;
        writeln!(f, "  {}", self.body)?;
        if let Some(disclaimer) = &self.disclaimer {
            writeln!(f, "  {}", disclaimer)?;
        }
        writeln!(f, "  Learn more: {}", self.cta_url)?;
        write!(f, "  ISI: {}", self.isi_url)
    }
}

/// Ordered table of categories plus the creatives they point at.
#[derive(Debug, Clone, Default)]
pub struct CategoryRegistry {
    categories: Vec<CategoryConfig>,
    creatives: HashMap<String, Creative>,
}

lazy_static! {
    static ref BUILTIN: Arc<CategoryRegistry> = Arc::new(builtin_registry());
}

impl CategoryRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in registry with the four sponsored medical categories.
    pub fn builtin() -> Arc<CategoryRegistry> {
        Arc::clone(&BUILTIN)
    }

    /// Validates and appends a category.
    ///
    /// # Errors
    /// `ValidationError` when the key, name, sponsor or creative id is empty,
    /// the key is already registered, there are no seed phrases, or any seed
    /// phrase is empty.
    pub fn add_category(&mut self, category: CategoryConfig) -> Result<(), ClassifierError> {
        Self::validate_category(&category)?;
        if self.category(&category.key).is_some() {
            return Err(ClassifierError::ValidationError(
                format!("Category '{}' is already registered", category.key)
            ));
        }
        self.categories.push(category);
        Ok(())
    }

    /// Builder-style variant of [`add_category`](Self::add_category)
    pub fn with_category(mut self, category: CategoryConfig) -> Result<Self, ClassifierError> {
        self.add_category(category)?;
        Ok(self)
    }

    /// Inserts a creative, replacing any creative with the same id
    pub fn add_creative(&mut self, creative: Creative) {
        self.creatives.insert(creative.creative_id.clone(), creative);
    }

    pub fn with_creative(mut self, creative: Creative) -> Self {
        self.add_creative(creative);
        self
    }

    fn validate_category(category: &CategoryConfig) -> Result<(), ClassifierError> {
        if category.key.is_empty() {
            return Err(ClassifierError::ValidationError("Category key cannot be empty".into()));
        }
        if category.name.is_empty() {
            return Err(ClassifierError::ValidationError(
                format!("Category '{}' must have a name", category.key)
            ));
        }
        if category.sponsor.is_empty() {
            return Err(ClassifierError::ValidationError(
                format!("Category '{}' must have a sponsor", category.key)
            ));
        }
        if category.creative_id.is_empty() {
            return Err(ClassifierError::ValidationError(
                format!("Category '{}' must reference a creative", category.key)
            ));
        }
        if category.seed_phrases.is_empty() {
            return Err(ClassifierError::ValidationError(
                format!("Category '{}' must have at least one seed phrase", category.key)
            ));
        }
        if let Some(pos) = category.seed_phrases.iter().position(|p| p.is_empty()) {
            return Err(ClassifierError::ValidationError(
                format!("Seed phrase {} of category '{}' cannot be empty", pos + 1, category.key)
            ));
        }
        Ok(())
    }

    /// Categories in enumeration order
    pub fn categories(&self) -> &[CategoryConfig] {
        &self.categories
    }

    pub fn category(&self, key: &str) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| c.key == key)
    }

    pub fn creative(&self, creative_id: &str) -> Option<&Creative> {
        self.creatives.get(creative_id)
    }

    /// Finds a category key by its display name, ignoring case.
    pub fn category_by_name(&self, name: &str) -> Option<&str> {
        let lower = name.to_lowercase();
        self.categories
            .iter()
            .find(|c| c.name.to_lowercase() == lower)
            .map(|c| c.key.as_str())
    }

    /// Keys of categories whose creative id has no creative registered.
    pub fn dangling_creatives(&self) -> Vec<&str> {
        self.categories
            .iter()
            .filter(|c| !self.creatives.contains_key(&c.creative_id))
            .map(|c| c.key.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

fn category(
    key: &str,
    name: &str,
    sponsor: &str,
    creative_id: &str,
    seed_phrases: &[&str],
) -> CategoryConfig {
    CategoryConfig::new(key, name, sponsor, creative_id).with_seed_phrases(seed_phrases.to_vec())
}

fn builtin_registry() -> CategoryRegistry {
    let categories = vec![
        category(
            "pancreatic_cancer",
            "Pancreatic cancer",
            "Genentech",
            "genentech-pancreatic",
            &[
                "pancreatic cancer treatment",
                "pancreatic adenocarcinoma therapy",
                "metastatic pancreatic cancer",
                "pancreas tumor chemotherapy",
                "FOLFIRINOX for pancreatic cancer",
                "gemcitabine nab-paclitaxel pancreatic",
                "neoadjuvant therapy pancreas carcinoma",
                "BRCA pancreatic cancer PARP inhibitor",
                "locally advanced pancreatic adenocarcinoma",
                "palliative care pancreatic malignancy",
            ],
        ),
        category(
            "breast_cancer",
            "Breast cancer",
            "Pfizer",
            "pfizer-breast",
            &[
                "HER2 positive breast cancer",
                "ER+ PR+ breast carcinoma",
                "metastatic breast cancer therapy",
                "adjuvant therapy for breast cancer",
                "CDK4/6 inhibitor HR+ HER2-",
                "triple negative breast cancer treatment",
                "neoadjuvant therapy breast carcinoma",
                "aromatase inhibitor postmenopausal",
                "anti-HER2 therapy trastuzumab pertuzumab",
                "locoregional recurrence breast cancer",
            ],
        ),
        category(
            "arthritis",
            "Arthritis",
            "Eli Lilly",
            "lilly-arthritis",
            &[
                "rheumatoid arthritis treatment",
                "psoriatic arthritis medication",
                "joint pain inflammation biologic",
                "DMARD therapy",
                "TNF inhibitor rheumatoid arthritis",
                "JAK inhibitor RA",
                "methotrexate inadequate response",
                "morning stiffness synovitis",
                "ankylosing spondylitis axial spondyloarthritis",
                "treat-to-target rheumatoid DAS28",
            ],
        ),
        category(
            "vaccines_infectious_disease",
            "Vaccines & Infectious Disease",
            "GSK",
            "gsk-vaccines",
            &[
                "shingles vaccine",
                "RSV vaccination",
                "influenza immunization",
                "infectious disease prevention vaccine",
                "adult immunization schedule",
                "pneumococcal vaccine PCV20",
                "COVID-19 booster mRNA",
                "Tdap adult booster",
                "hepatitis B vaccination",
                "travel vaccines yellow fever typhoid",
            ],
        ),
    ];

    let creatives = [
        Creative::new(
            "genentech-pancreatic",
            "Genentech",
            "/ads/genentech.svg",
            "Targeted options for pancreatic cancer",
            "Learn about therapy options for appropriate patients with pancreatic cancer.",
            "https://www.gene.com",
            "https://www.gene.com/isi",
        )
        .with_disclaimer("For US HCPs only. See Important Safety Information."),
        Creative::new(
            "pfizer-breast",
            "Pfizer",
            "/ads/pfizer.svg",
            "Advancing care in breast cancer",
            "Explore data and resources for HR+ / HER2- mBC.",
            "https://www.pfizer.com",
            "https://www.pfizer.com/isi",
        )
        .with_disclaimer("For US HCPs only. Please see full Prescribing Information."),
        Creative::new(
            "lilly-arthritis",
            "Eli Lilly",
            "/ads/lilly.svg",
            "Relief for RA patients",
            "Learn about treatment options for moderate to severe RA.",
            "https://www.lilly.com",
            "https://www.lilly.com/isi",
        ),
        Creative::new(
            "gsk-vaccines",
            "GSK",
            "/ads/gsk.svg",
            "Vaccines that matter",
            "Information for HCPs on adult vaccines including RSV and shingles.",
            "https://www.gsk.com",
            "https://www.gsk.com/isi",
        ),
    ];

    CategoryRegistry {
        categories,
        creatives: creatives
            .into_iter()
            .map(|c| (c.creative_id.clone(), c))
            .collect(),
    }
}
