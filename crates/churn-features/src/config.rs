//! Feature contract configuration.
//!
//! A [`FeatureContract`] is the immutable bundle that defines how raw customer
//! tables map onto the columns one trained classifier expects: the alias
//! table, the value vocabularies used during coercion, the derivation sources
//! and the ordered model schema. Every pipeline stage receives the contract
//! explicitly, so alternate schemas can be tested side by side.
//!
//! # Example
//!
//! ```rust,ignore
//! use churn_features::config::FeatureContract;
//!
//! let contract = FeatureContract::builder()
//!     .senior_age_threshold(65.0)
//!     .fill_absent_features(false)
//!     .build()?;
//! ```

use crate::error::{FeatureError, Result};
use crate::schema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

/// One row of the alias table: a canonical feature and its accepted spellings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub canonical: String,
    pub variants: Vec<String>,
}

impl AliasEntry {
    pub fn new<I, S>(canonical: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            canonical: canonical.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }
}

/// Configuration for the feature pipeline.
///
/// `Default` is the built-in churn contract. Contracts loaded from JSON may
/// omit any field; omitted fields take the built-in value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureContract {
    /// Ordered alias table. Declaration order decides claim priority.
    pub aliases: Vec<AliasEntry>,

    /// Ordered feature columns the classifier consumes (label excluded).
    pub model_features: Vec<String>,

    /// Values treated as "service absent" by the rejection-keyword test.
    pub rejection_vocabulary: BTreeSet<String>,

    /// Contract spelling (alphanumeric key form) to numeric code.
    pub contract_codes: BTreeMap<String, u8>,

    /// Churn label spellings mapping to 1.
    pub positive_labels: BTreeSet<String>,

    /// Churn label spellings mapping to 0.
    pub negative_labels: BTreeSet<String>,

    /// Text spellings counted as true by the OR derivations.
    pub truthy_values: BTreeSet<String>,

    /// Source columns for `onlineservice`.
    pub online_sources: Vec<String>,

    /// Source columns for `streaming`.
    pub streaming_sources: Vec<String>,

    /// Columns parsed as numbers during coercion.
    pub numeric_features: Vec<String>,

    /// Column used for the stable row sort, in key form.
    /// Default: "customerid"
    pub id_column: String,

    /// Age at or above which a customer counts as a senior citizen.
    /// Default: 60
    pub senior_age_threshold: f64,

    /// Multiplier applied to tenure columns expressed in years.
    /// Default: 12
    pub months_per_year: f64,

    /// Whether model features absent from the input are filled with 0.
    /// Default: true
    pub fill_absent_features: bool,
}

fn owned_set<'a>(values: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    values.into_iter().map(str::to_string).collect()
}

fn owned_vec<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    values.into_iter().map(str::to_string).collect()
}

impl Default for FeatureContract {
    fn default() -> Self {
        Self {
            aliases: schema::DEFAULT_ALIASES
                .iter()
                .map(|(canonical, variants)| AliasEntry::new(*canonical, variants.iter().copied()))
                .collect(),
            model_features: owned_vec(schema::MODEL_FEATURES),
            rejection_vocabulary: owned_set(schema::REJECTION_VOCABULARY),
            contract_codes: schema::CONTRACT_CODES
                .iter()
                .map(|(name, code)| (name.to_string(), *code))
                .collect(),
            positive_labels: owned_set(schema::POSITIVE_CHURN_LABELS),
            negative_labels: owned_set(schema::NEGATIVE_CHURN_LABELS),
            truthy_values: owned_set(schema::TRUTHY_VALUES),
            online_sources: owned_vec(schema::ONLINE_SOURCES),
            streaming_sources: owned_vec(schema::STREAMING_SOURCES),
            numeric_features: owned_vec(schema::NUMERIC_FEATURES),
            id_column: schema::CUSTOMER_ID.to_string(),
            senior_age_threshold: schema::SENIOR_AGE_THRESHOLD,
            months_per_year: schema::MONTHS_PER_YEAR,
            fill_absent_features: true,
        }
    }
}

impl FeatureContract {
    /// Create a new contract builder starting from the built-in contract.
    pub fn builder() -> FeatureContractBuilder {
        FeatureContractBuilder::default()
    }

    /// Load a contract from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FeatureError::Io(e).with_context(format!("Reading contract {}", path.display()))
        })?;
        let contract: FeatureContract = serde_json::from_str(&content)?;
        contract
            .validate()
            .map_err(|e| FeatureError::InvalidConfig(e.to_string()))?;
        Ok(contract)
    }

    /// Validate the contract and return the first problem found.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.aliases.is_empty() {
            return Err(ConfigValidationError::EmptyAliasTable);
        }

        let mut canonicals = HashSet::new();
        for entry in &self.aliases {
            if !canonicals.insert(entry.canonical.as_str()) {
                return Err(ConfigValidationError::DuplicateCanonical(
                    entry.canonical.clone(),
                ));
            }
            if entry.variants.is_empty() {
                return Err(ConfigValidationError::EmptyVariants(entry.canonical.clone()));
            }
        }

        if self.model_features.is_empty() {
            return Err(ConfigValidationError::EmptyModelSchema);
        }

        let mut seen = HashSet::new();
        for feature in &self.model_features {
            if !seen.insert(feature.as_str()) {
                return Err(ConfigValidationError::DuplicateModelFeature(feature.clone()));
            }
            if feature == schema::CHURN {
                return Err(ConfigValidationError::LabelInModelSchema);
            }
            let derived = schema::DERIVED_FEATURES.contains(&feature.as_str());
            if !derived && !canonicals.contains(feature.as_str()) {
                return Err(ConfigValidationError::UnresolvableFeature(feature.clone()));
            }
        }

        if let Some(label) = self.positive_labels.intersection(&self.negative_labels).next() {
            return Err(ConfigValidationError::OverlappingLabels(label.clone()));
        }

        if self.id_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyIdColumn);
        }

        if !self.senior_age_threshold.is_finite() || self.senior_age_threshold <= 0.0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "senior_age_threshold".to_string(),
                value: self.senior_age_threshold,
            });
        }

        if !self.months_per_year.is_finite() || self.months_per_year <= 0.0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "months_per_year".to_string(),
                value: self.months_per_year,
            });
        }

        Ok(())
    }
}

/// Errors that can occur during contract validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Alias table is empty")]
    EmptyAliasTable,

    #[error("Canonical feature '{0}' is declared more than once in the alias table")]
    DuplicateCanonical(String),

    #[error("Canonical feature '{0}' has no variants")]
    EmptyVariants(String),

    #[error("Model schema is empty")]
    EmptyModelSchema,

    #[error("Model feature '{0}' is listed more than once")]
    DuplicateModelFeature(String),

    #[error("Model feature '{0}' has neither an alias entry nor a derivation")]
    UnresolvableFeature(String),

    #[error("The churn label cannot be a model feature")]
    LabelInModelSchema,

    #[error("Churn label '{0}' is both positive and negative")]
    OverlappingLabels(String),

    #[error("Identifier column name is empty")]
    EmptyIdColumn,

    #[error("Invalid value for '{field}': {value} (must be finite and positive)")]
    InvalidValue { field: String, value: f64 },
}

/// Builder for [`FeatureContract`] with fluent API.
#[derive(Debug, Default)]
pub struct FeatureContractBuilder {
    aliases: Option<Vec<AliasEntry>>,
    model_features: Option<Vec<String>>,
    rejection_vocabulary: Option<BTreeSet<String>>,
    contract_codes: Option<BTreeMap<String, u8>>,
    positive_labels: Option<BTreeSet<String>>,
    negative_labels: Option<BTreeSet<String>>,
    truthy_values: Option<BTreeSet<String>>,
    online_sources: Option<Vec<String>>,
    streaming_sources: Option<Vec<String>>,
    numeric_features: Option<Vec<String>>,
    id_column: Option<String>,
    senior_age_threshold: Option<f64>,
    months_per_year: Option<f64>,
    fill_absent_features: Option<bool>,
}

impl FeatureContractBuilder {
    /// Replace the whole alias table.
    pub fn aliases(mut self, aliases: Vec<AliasEntry>) -> Self {
        self.aliases = Some(aliases);
        self
    }

    /// Set the ordered model schema.
    pub fn model_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.model_features = Some(features.into_iter().map(Into::into).collect());
        self
    }

    pub fn rejection_vocabulary<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rejection_vocabulary = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn contract_codes(mut self, codes: BTreeMap<String, u8>) -> Self {
        self.contract_codes = Some(codes);
        self
    }

    /// Set the churn label vocabularies.
    pub fn churn_labels<I, J, S>(mut self, positive: I, negative: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.positive_labels = Some(positive.into_iter().map(Into::into).collect());
        self.negative_labels = Some(negative.into_iter().map(Into::into).collect());
        self
    }

    /// Set the text spellings counted as true by the OR derivations.
    pub fn truthy_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.truthy_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn online_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.online_sources = Some(sources.into_iter().map(Into::into).collect());
        self
    }

    pub fn streaming_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.streaming_sources = Some(sources.into_iter().map(Into::into).collect());
        self
    }

    /// Set the columns whose text is parsed as numbers during coercion.
    pub fn numeric_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric_features = Some(features.into_iter().map(Into::into).collect());
        self
    }

    /// Set the identifier column used for the row sort.
    pub fn id_column(mut self, column: impl Into<String>) -> Self {
        self.id_column = Some(column.into());
        self
    }

    pub fn senior_age_threshold(mut self, age: f64) -> Self {
        self.senior_age_threshold = Some(age);
        self
    }

    pub fn months_per_year(mut self, months: f64) -> Self {
        self.months_per_year = Some(months);
        self
    }

    /// Enable or disable zero-filling of model features absent from the input.
    pub fn fill_absent_features(mut self, fill: bool) -> Self {
        self.fill_absent_features = Some(fill);
        self
    }

    /// Build and validate the contract.
    pub fn build(self) -> std::result::Result<FeatureContract, ConfigValidationError> {
        let defaults = FeatureContract::default();
        let contract = FeatureContract {
            aliases: self.aliases.unwrap_or(defaults.aliases),
            model_features: self.model_features.unwrap_or(defaults.model_features),
            rejection_vocabulary: self
                .rejection_vocabulary
                .unwrap_or(defaults.rejection_vocabulary),
            contract_codes: self.contract_codes.unwrap_or(defaults.contract_codes),
            positive_labels: self.positive_labels.unwrap_or(defaults.positive_labels),
            negative_labels: self.negative_labels.unwrap_or(defaults.negative_labels),
            truthy_values: self.truthy_values.unwrap_or(defaults.truthy_values),
            online_sources: self.online_sources.unwrap_or(defaults.online_sources),
            streaming_sources: self.streaming_sources.unwrap_or(defaults.streaming_sources),
            numeric_features: self.numeric_features.unwrap_or(defaults.numeric_features),
            id_column: self.id_column.unwrap_or(defaults.id_column),
            senior_age_threshold: self
                .senior_age_threshold
                .unwrap_or(defaults.senior_age_threshold),
            months_per_year: self.months_per_year.unwrap_or(defaults.months_per_year),
            fill_absent_features: self
                .fill_absent_features
                .unwrap_or(defaults.fill_absent_features),
        };

        contract.validate()?;
        Ok(contract)
    }
}
