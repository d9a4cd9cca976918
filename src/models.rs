//! Data models and wire DTOs for the AgriFund platform.
//!
//! Records mirror what the backend returns; payload structs mirror what the
//! wizards send. Wire casing is camelCase and enum variants travel as
//! SCREAMING_SNAKE_CASE strings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Smallest fundable request, in Vietnamese dong.
pub const MIN_REQUESTED_AMOUNT: i64 = 1_000_000;

/// Funding categories a farmer can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestmentType {
    CropFunding,
    LivestockFunding,
    EquipmentPurchase,
    Infrastructure,
    Expansion,
}

impl InvestmentType {
    pub const ALL: [InvestmentType; 5] = [
        InvestmentType::CropFunding,
        InvestmentType::LivestockFunding,
        InvestmentType::EquipmentPurchase,
        InvestmentType::Infrastructure,
        InvestmentType::Expansion,
    ];

    /// Whether a request of this type must reference a registered farmland.
    pub fn requires_farmland(self) -> bool {
        matches!(
            self,
            InvestmentType::CropFunding | InvestmentType::LivestockFunding
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            InvestmentType::CropFunding => "Crop funding",
            InvestmentType::LivestockFunding => "Livestock funding",
            InvestmentType::EquipmentPurchase => "Equipment purchase",
            InvestmentType::Infrastructure => "Infrastructure",
            InvestmentType::Expansion => "Expansion",
        }
    }
}

/// Risk grade the farmer self-assigns to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::VeryHigh,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::VeryHigh => "Very high",
        }
    }
}

/// Soil classification of a farmland.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SoilType {
    Alluvial,
    RedBasalt,
    Clay,
    Sandy,
    Loam,
}

/// Where a funding request sits in its server-side lifecycle. The backend
/// owns every transition; the client only displays it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestmentStatus {
    #[default]
    PendingApproval,
    Approved,
    Funding,
    Funded,
    Rejected,
    Closed,
    /// Statuses introduced server-side after this client shipped.
    #[serde(other)]
    Unknown,
}

/// Verification state the platform assigns to a farmland.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationLevel {
    #[default]
    Unverified,
    Pending,
    Verified,
}

/// A registered farmland, as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Farmland {
    pub id: Uuid,
    pub name: String,
    pub area_hectares: f64,
    pub province: String,
    pub commune: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
    pub full_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_type: Option<SoilType>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub verification_level: VerificationLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A funding request record, as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmerInvestment {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub investment_type: InvestmentType,
    #[serde(default)]
    pub farmland_id: Option<Uuid>,
    pub requested_amount: i64,
    #[serde(default)]
    pub minimum_investment: Option<i64>,
    #[serde(default)]
    pub maximum_investment: Option<i64>,
    #[serde(default)]
    pub expected_return_rate: Option<f64>,
    #[serde(default)]
    pub duration_months: Option<i32>,
    #[serde(default)]
    pub target_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub funding_deadline: Option<DateTime<Utc>>,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    pub collateral: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub insurance: Option<String>,
    #[serde(default)]
    pub repayment_terms: Option<String>,
    #[serde(default)]
    pub status: InvestmentStatus,
    #[serde(default)]
    pub funded_amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Response of the image upload endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedImage {
    pub url: String,
    pub filename: String,
    pub size: u64,
    pub mimetype: String,
}

/// Wire payload for creating or updating a funding request.
///
/// Optional fields left blank in the form are omitted from the body entirely
/// rather than sent as empty strings or nulls.
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_funding_bounds", skip_on_field_errors = false))]
pub struct InvestmentPayload {
    #[validate(length(min = 1))]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub investment_type: InvestmentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farmland_id: Option<Uuid>,
    pub requested_amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_investment: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_investment: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_return_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_months: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding_deadline: Option<NaiveDate>,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<String>,
    #[validate(length(min = 1))]
    pub collateral: String,
    #[validate(length(min = 1))]
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repayment_terms: Option<String>,
}

/// Amount floor and investor-bound ordering for a funding request.
fn validate_funding_bounds(payload: &InvestmentPayload) -> Result<(), ValidationError> {
    if payload.requested_amount < MIN_REQUESTED_AMOUNT {
        return Err(ValidationError::new("requested_amount_below_minimum"));
    }
    if let (Some(min), Some(max)) = (payload.minimum_investment, payload.maximum_investment) {
        if min > max {
            return Err(ValidationError::new("minimum_above_maximum"));
        }
    }
    if let Some(max) = payload.maximum_investment {
        if max > payload.requested_amount {
            return Err(ValidationError::new("maximum_above_requested"));
        }
    }
    Ok(())
}

/// Wire payload for registering a farmland.
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FarmlandPayload {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(custom = "validate_positive_area")]
    pub area_hectares: f64,
    #[validate(length(min = 1))]
    pub province: String,
    #[validate(length(min = 1))]
    pub commune: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
    pub full_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil_type: Option<SoilType>,
    pub images: Vec<String>,
}

fn validate_positive_area(area: f64) -> Result<(), ValidationError> {
    if area > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::new("area_not_positive"))
    }
}
