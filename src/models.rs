use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

/// A closed set of literal answers offered by one select box of the form.
///
/// The literal strings are part of the scorer's feature encoding, so they are
/// serialized verbatim (including spacing and capitalization).
pub trait FormOption: Sized + Copy + PartialEq + 'static {
    /// Every accepted answer, in form display order.
    const OPTIONS: &'static [Self];

    /// The literal answer string.
    fn as_str(&self) -> &'static str;
}

macro_rules! form_option {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $literal:tt),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $(
                #[serde(rename = $literal)]
                $variant,
            )+
        }

        impl FormOption for $name {
            const OPTIONS: &'static [Self] = &[$(Self::$variant),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $literal,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

form_option! {
    /// Customer gender.
    Gender { Male => "Male", Female => "Female" }
}

form_option! {
    /// Plain two-state answer used by phone service, senior citizen,
    /// partner, dependents and paperless billing.
    YesNo { Yes => "Yes", No => "No" }
}

form_option! {
    /// Multiple lines answer. "No phone service" is a distinct literal.
    MultipleLines {
        Yes => "Yes",
        No => "No",
        NoPhoneService => "No phone service",
    }
}

form_option! {
    /// Internet service kind.
    InternetService {
        Dsl => "DSL",
        FiberOptic => "Fiber optic",
        No => "No",
    }
}

form_option! {
    /// Answer for the six internet add-on services (security, backup,
    /// device protection, tech support, streaming TV, streaming movies).
    AddonService {
        Yes => "Yes",
        No => "No",
        NoInternetService => "No internet service",
    }
}

form_option! {
    /// Contract term.
    Contract {
        MonthToMonth => "Month-to-month",
        OneYear => "One year",
        TwoYear => "Two year",
    }
}

form_option! {
    /// Billing payment method.
    PaymentMethod {
        ElectronicCheck => "Electronic check",
        MailedCheck => "Mailed check",
        BankTransferAutomatic => "Bank transfer (automatic)",
        CreditCardAutomatic => "Credit card (automatic)",
    }
}

form_option! {
    /// Tenure bucket label. Upper bounds are inclusive.
    TenureGroup {
        UpTo6 => "0-6",
        UpTo12 => "7-12",
        UpTo24 => "13-24",
        UpTo36 => "25-36",
        UpTo48 => "37-48",
        UpTo60 => "49-60",
        Over60 => "61-72",
    }
}

impl YesNo {
    /// Display order for questions where "No" is the default answer.
    pub const NO_FIRST: &'static [YesNo] = &[YesNo::No, YesNo::Yes];

    pub fn is_yes(self) -> bool {
        self == YesNo::Yes
    }
}

impl AddonService {
    pub fn is_yes(self) -> bool {
        self == AddonService::Yes
    }
}

// ============ Form Input ============

/// Upper bound of the tenure input, in months.
pub const TENURE_MAX_MONTHS: u32 = 72;
/// Lower bound of the monthly charges input.
pub const MONTHLY_CHARGES_MIN: f64 = 18.0;
/// Upper bound of the monthly charges input.
pub const MONTHLY_CHARGES_MAX: f64 = 120.0;

/// Raw answers collected by the customer form.
///
/// Field names double as the HTML form input names and the JSON keys of the
/// prediction API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CustomerForm {
    pub gender: Gender,
    pub senior_citizen: YesNo,
    pub partner: YesNo,
    pub dependents: YesNo,
    /// Months with the company, 0..=72.
    pub tenure_months: u32,
    pub phone_service: YesNo,
    pub multiple_lines: MultipleLines,
    pub internet_service: InternetService,
    pub online_security: AddonService,
    pub online_backup: AddonService,
    pub device_protection: AddonService,
    pub tech_support: AddonService,
    pub streaming_tv: AddonService,
    pub streaming_movies: AddonService,
    pub contract: Contract,
    pub paperless_billing: YesNo,
    pub payment_method: PaymentMethod,
    /// Monthly charges in dollars, 18.0..=120.0.
    pub monthly_charges: f64,
    /// Total charges in dollars, >= 0.
    pub total_charges: f64,
    /// Customer lifetime value.
    pub cltv: u32,
}

impl Default for CustomerForm {
    /// The values the form shows before the user changes anything.
    fn default() -> Self {
        Self {
            gender: Gender::Male,
            senior_citizen: YesNo::No,
            partner: YesNo::No,
            dependents: YesNo::No,
            tenure_months: 12,
            phone_service: YesNo::Yes,
            multiple_lines: MultipleLines::Yes,
            internet_service: InternetService::Dsl,
            online_security: AddonService::Yes,
            online_backup: AddonService::Yes,
            device_protection: AddonService::Yes,
            tech_support: AddonService::Yes,
            streaming_tv: AddonService::Yes,
            streaming_movies: AddonService::Yes,
            contract: Contract::MonthToMonth,
            paperless_billing: YesNo::No,
            payment_method: PaymentMethod::ElectronicCheck,
            monthly_charges: 70.0,
            total_charges: 800.0,
            cltv: 2000,
        }
    }
}

impl CustomerForm {
    /// Enforces the numeric bounds the form advertises.
    ///
    /// Enumerated answers are already constrained by their types.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.tenure_months > TENURE_MAX_MONTHS {
            return Err(AppError::BadRequest(format!(
                "tenure_months must be between 0 and {}, got {}",
                TENURE_MAX_MONTHS, self.tenure_months
            )));
        }
        if !self.monthly_charges.is_finite()
            || !(MONTHLY_CHARGES_MIN..=MONTHLY_CHARGES_MAX).contains(&self.monthly_charges)
        {
            return Err(AppError::BadRequest(format!(
                "monthly_charges must be between {:.1} and {:.1}, got {}",
                MONTHLY_CHARGES_MIN, MONTHLY_CHARGES_MAX, self.monthly_charges
            )));
        }
        if !self.total_charges.is_finite() || self.total_charges < 0.0 {
            return Err(AppError::BadRequest(format!(
                "total_charges must be a non-negative amount, got {}",
                self.total_charges
            )));
        }
        Ok(())
    }
}

// ============ Feature Record ============

/// Number of columns in a [`FeatureRecord`].
pub const FEATURE_COUNT: usize = 35;

/// Column names of the feature record, in schema order.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "Gender",
    "Senior Citizen",
    "Partner",
    "Dependents",
    "Tenure Months",
    "Phone Service",
    "Multiple Lines",
    "Internet Service",
    "Online Security",
    "Online Backup",
    "Device Protection",
    "Tech Support",
    "Streaming TV",
    "Streaming Movies",
    "Contract",
    "Paperless Billing",
    "Payment Method",
    "Monthly Charges",
    "Total Charges",
    "CLTV",
    "Tenure_Group",
    "Online Security_flag",
    "Online Backup_flag",
    "Device Protection_flag",
    "Tech Support_flag",
    "Streaming TV_flag",
    "Streaming Movies_flag",
    "Total_Services",
    "Has_Addons",
    "Has_Fiber",
    "Has_Autopay",
    "Is_Senior",
    "Is_Family",
    "Is_New_Customer",
    "Avg_Charge",
];

/// The fixed-schema record handed to the scorer.
///
/// Raw answers are carried through unchanged; the remaining fields are
/// derived by [`crate::features::derive_features`]. Serialized keys are the
/// column names the trained model was fitted on.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FeatureRecord {
    #[serde(rename = "Gender")]
    pub gender: Gender,
    #[serde(rename = "Senior Citizen")]
    pub senior_citizen: YesNo,
    #[serde(rename = "Partner")]
    pub partner: YesNo,
    #[serde(rename = "Dependents")]
    pub dependents: YesNo,
    #[serde(rename = "Tenure Months")]
    pub tenure_months: u32,
    #[serde(rename = "Phone Service")]
    pub phone_service: YesNo,
    #[serde(rename = "Multiple Lines")]
    pub multiple_lines: MultipleLines,
    #[serde(rename = "Internet Service")]
    pub internet_service: InternetService,
    #[serde(rename = "Online Security")]
    pub online_security: AddonService,
    #[serde(rename = "Online Backup")]
    pub online_backup: AddonService,
    #[serde(rename = "Device Protection")]
    pub device_protection: AddonService,
    #[serde(rename = "Tech Support")]
    pub tech_support: AddonService,
    #[serde(rename = "Streaming TV")]
    pub streaming_tv: AddonService,
    #[serde(rename = "Streaming Movies")]
    pub streaming_movies: AddonService,
    #[serde(rename = "Contract")]
    pub contract: Contract,
    #[serde(rename = "Paperless Billing")]
    pub paperless_billing: YesNo,
    #[serde(rename = "Payment Method")]
    pub payment_method: PaymentMethod,
    #[serde(rename = "Monthly Charges")]
    pub monthly_charges: f64,
    #[serde(rename = "Total Charges")]
    pub total_charges: f64,
    #[serde(rename = "CLTV")]
    pub cltv: u32,

    #[serde(rename = "Tenure_Group")]
    pub tenure_group: TenureGroup,
    #[serde(rename = "Online Security_flag")]
    pub online_security_flag: u8,
    #[serde(rename = "Online Backup_flag")]
    pub online_backup_flag: u8,
    #[serde(rename = "Device Protection_flag")]
    pub device_protection_flag: u8,
    #[serde(rename = "Tech Support_flag")]
    pub tech_support_flag: u8,
    #[serde(rename = "Streaming TV_flag")]
    pub streaming_tv_flag: u8,
    #[serde(rename = "Streaming Movies_flag")]
    pub streaming_movies_flag: u8,
    #[serde(rename = "Total_Services")]
    pub total_services: u8,
    #[serde(rename = "Has_Addons")]
    pub has_addons: u8,
    #[serde(rename = "Has_Fiber")]
    pub has_fiber: u8,
    #[serde(rename = "Has_Autopay")]
    pub has_autopay: u8,
    #[serde(rename = "Is_Senior")]
    pub is_senior: u8,
    #[serde(rename = "Is_Family")]
    pub is_family: u8,
    #[serde(rename = "Is_New_Customer")]
    pub is_new_customer: u8,
    #[serde(rename = "Avg_Charge")]
    pub avg_charge: f64,
}

impl FeatureRecord {
    /// Column name to value view of the record, as the scorer consumes it.
    pub fn to_columns(&self) -> Result<Map<String, Value>, AppError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(columns)) => Ok(columns),
            Ok(other) => Err(AppError::InternalError(format!(
                "feature record serialized to a non-object value: {}",
                other
            ))),
            Err(e) => Err(AppError::InternalError(format!(
                "failed to serialize feature record: {}",
                e
            ))),
        }
    }
}

// ============ Prediction Output ============

/// Risk label shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    High,
    Low,
}

impl RiskLevel {
    /// Maps a predicted class label onto a risk level.
    pub fn from_label(label: u8) -> Self {
        if label == 1 {
            RiskLevel::High
        } else {
            RiskLevel::Low
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            RiskLevel::High => "High Risk of Churn",
            RiskLevel::Low => "Low Risk - Likely to Stay",
        }
    }
}

/// Result of scoring one customer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PredictionResponse {
    /// Correlates the response with server logs.
    pub request_id: Uuid,
    /// Predicted class: 1 = churn, 0 = stay.
    pub label: u8,
    /// Probability of churn, 0.0..=1.0.
    pub churn_probability: f64,
    /// Probability formatted as a percentage with one decimal, e.g. "73.4%".
    pub churn_percentage: String,
    pub risk: RiskLevel,
    pub message: String,
    /// `name@version` of the model that produced the score.
    pub model: String,
    pub scored_at: DateTime<Utc>,
}

/// Formats a probability the way the result view displays it.
pub fn format_percentage(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

/// Metadata describing the loaded model artifact.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ModelInfo {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Number of columns the model expects in every record.
    pub feature_count: usize,
    /// Probability above which a customer is labeled as churning.
    pub threshold: f64,
    /// SHA-256 of the artifact bytes, hex encoded.
    pub sha256: String,
}

impl ModelInfo {
    pub fn label(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_literals_round_trip() {
        assert_eq!(MultipleLines::NoPhoneService.as_str(), "No phone service");
        assert_eq!(
            PaymentMethod::CreditCardAutomatic.to_string(),
            "Credit card (automatic)"
        );
        assert!(serde_json::from_str::<InternetService>("\"fiber optic\"").is_err());
    }

    #[test]
    fn test_options_serialize_as_literals() {
        let json = serde_json::to_string(&AddonService::NoInternetService).unwrap();
        assert_eq!(json, "\"No internet service\"");

        let parsed: Contract = serde_json::from_str("\"Month-to-month\"").unwrap();
        assert_eq!(parsed, Contract::MonthToMonth);
    }

    #[test]
    fn test_default_form_is_valid() {
        assert!(CustomerForm::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_bounds() {
        let mut form = CustomerForm::default();
        form.tenure_months = 73;
        assert!(matches!(form.validate(), Err(AppError::BadRequest(_))));

        let mut form = CustomerForm::default();
        form.monthly_charges = 17.5;
        assert!(matches!(form.validate(), Err(AppError::BadRequest(_))));

        let mut form = CustomerForm::default();
        form.monthly_charges = f64::NAN;
        assert!(matches!(form.validate(), Err(AppError::BadRequest(_))));

        let mut form = CustomerForm::default();
        form.total_charges = -1.0;
        assert!(matches!(form.validate(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_validate_accepts_bounds() {
        let mut form = CustomerForm::default();
        form.tenure_months = 0;
        form.monthly_charges = MONTHLY_CHARGES_MIN;
        form.total_charges = 0.0;
        assert!(form.validate().is_ok());

        form.tenure_months = TENURE_MAX_MONTHS;
        form.monthly_charges = MONTHLY_CHARGES_MAX;
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_risk_level_from_label() {
        assert_eq!(RiskLevel::from_label(1), RiskLevel::High);
        assert_eq!(RiskLevel::from_label(0), RiskLevel::Low);
        assert_eq!(RiskLevel::High.message(), "High Risk of Churn");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(0.734), "73.4%");
        assert_eq!(format_percentage(0.0), "0.0%");
        assert_eq!(format_percentage(1.0), "100.0%");
    }
}
