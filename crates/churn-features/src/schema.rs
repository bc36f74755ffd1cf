//! Canonical and model feature names for the churn feature contract.
//!
//! These constants are the built-in contract; [`FeatureContract::default`]
//! is assembled from them. Stages never read the constants directly for
//! anything a contract can override.
//!
//! [`FeatureContract::default`]: crate::config::FeatureContract

pub const GENDER: &str = "gender";
pub const SENIOR_CITIZEN: &str = "seniorcitizen";
pub const PARTNER: &str = "partner";
pub const TENURE: &str = "tenure";
pub const PHONE_SERVICE: &str = "phoneservice";
pub const INTERNET_SERVICE: &str = "internetservice";
pub const ONLINE_SERVICE: &str = "onlineservice";
pub const STREAMING: &str = "streaming";
pub const CONTRACT: &str = "contract";
pub const MONTHLY_CHARGES: &str = "monthlycharges";
pub const TOTAL_CHARGES: &str = "totalcharges";
pub const CHURN: &str = "churn";
pub const AGE: &str = "age";
pub const CUSTOMER_ID: &str = "customerid";

/// Fixed, ordered set of pipeline-internal feature names.
pub const CANONICAL_FEATURES: [&str; 20] = [
    "gender",
    "seniorcitizen",
    "partner",
    "dependents",
    "tenure",
    "phoneservice",
    "multiplelines",
    "internetservice",
    "onlinesecurity",
    "onlinebackup",
    "deviceprotection",
    "techsupport",
    "streamingtv",
    "streamingmovies",
    "contract",
    "paperlessbilling",
    "paymentmethod",
    "monthlycharges",
    "totalcharges",
    "churn",
];

/// Column order the classifier was trained on. Must never be reordered.
pub const MODEL_FEATURES: [&str; 10] = [
    GENDER,
    SENIOR_CITIZEN,
    PARTNER,
    TENURE,
    PHONE_SERVICE,
    ONLINE_SERVICE,
    STREAMING,
    CONTRACT,
    MONTHLY_CHARGES,
    TOTAL_CHARGES,
];

/// Features produced by the derivation stage rather than read from input.
pub const DERIVED_FEATURES: [&str; 2] = [ONLINE_SERVICE, STREAMING];

/// Alias table in declaration order. The order decides which canonical name
/// claims a raw column first.
pub const DEFAULT_ALIASES: &[(&str, &[&str])] = &[
    ("gender", &["gender", "sex"]),
    ("seniorcitizen", &["seniorcitizen", "senior_citizen", "senior"]),
    ("partner", &["partner", "spouse", "married"]),
    ("dependents", &["dependents", "children"]),
    (
        "tenure",
        &[
            "tenure",
            "tenureinmonths",
            "tenureinmonth",
            "tenureinyears",
            "tenureinyear",
        ],
    ),
    ("phoneservice", &["phoneservice", "phone_service"]),
    ("multiplelines", &["multiplelines", "multiple_lines"]),
    ("internetservice", &["internetservice", "internet_service"]),
    ("onlinesecurity", &["onlinesecurity", "security"]),
    ("onlinebackup", &["onlinebackup", "backup"]),
    ("deviceprotection", &["deviceprotection", "deviceprotectionplan"]),
    ("techsupport", &["techsupport", "premiumsupport"]),
    ("streamingtv", &["streamingtv", "tv"]),
    ("streamingmovies", &["streamingmovies", "movies"]),
    ("contract", &["contract"]),
    ("paperlessbilling", &["paperlessbilling", "paperless_billing"]),
    ("paymentmethod", &["paymentmethod", "payment_method"]),
    ("monthlycharges", &["monthlycharges", "monthly_charge"]),
    ("totalcharges", &["totalcharges", "total_charge"]),
    (
        "churn",
        &["churn", "churned", "churnstatus", "customerstatus"],
    ),
];

/// Values that mean "does not have this service" after lower-casing,
/// trimming and removing spaces.
pub const REJECTION_VOCABULARY: [&str; 9] = [
    "no",
    "none",
    "nointernet",
    "nointernetservice",
    "notapplicable",
    "na",
    "0",
    "null",
    "unknown",
];

/// Contract spellings (lower-cased, alphanumerics only) and their codes.
pub const CONTRACT_CODES: [(&str, u8); 3] = [("monthtomonth", 0), ("oneyear", 1), ("twoyear", 2)];

pub const POSITIVE_CHURN_LABELS: [&str; 8] = [
    "churn",
    "churned",
    "yes",
    "1",
    "true",
    "left",
    "exited",
    "cancelled",
];

pub const NEGATIVE_CHURN_LABELS: [&str; 7] =
    ["no", "0", "false", "stay", "stayed", "joined", "active"];

/// Text spellings that count as an enabled service in the OR derivations.
pub const TRUTHY_VALUES: [&str; 3] = ["yes", "1", "true"];

pub const ONLINE_SOURCES: [&str; 4] = [
    "onlinesecurity",
    "onlinebackup",
    "techsupport",
    "deviceprotection",
];

pub const STREAMING_SOURCES: [&str; 3] = ["streamingtv", "streamingmovies", "streamingmusic"];

/// Columns parsed as numbers during coercion instead of going through the
/// rejection-keyword test.
pub const NUMERIC_FEATURES: [&str; 3] = [TENURE, MONTHLY_CHARGES, AGE];

pub const SENIOR_AGE_THRESHOLD: f64 = 60.0;
pub const MONTHS_PER_YEAR: f64 = 12.0;
