//! Typed onboarding form contracts.
//!
//! Submitted forms are loosely typed: numbers may arrive as strings, flags
//! as checkbox values. Required fields are checked and reported together;
//! numeric fields are never rejected, they are parsed leniently and
//! clamped into range, falling back to in-range defaults.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::{FarmingType, LandType};
use crate::error::ValidationErrors;

pub const EXPERIENCE_YEARS_MAX: u8 = 60;
pub const FARMER_LAND_ACRES_MIN: f64 = 0.1;
pub const FARMER_LAND_ACRES_MAX: f64 = 1000.0;
pub const DEFAULT_FARMER_LAND_ACRES: f64 = 1.0;
pub const LEASE_MONTHS_MIN: u16 = 1;
pub const LEASE_MONTHS_MAX: u16 = 120;
pub const DEFAULT_LEASE_MONTHS: u16 = 12;
pub const LAND_ACRES_MIN: f64 = 0.1;
pub const LAND_ACRES_MAX: f64 = 100_000.0;

/// A number that may have been submitted as text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormNumber {
    Number(f64),
    Text(String),
    /// Anything else; reads as no value
    Other(Value),
}

impl FormNumber {
    /// Finite value, if one can be read
    pub fn value(&self) -> Option<f64> {
        let v = match self {
            FormNumber::Number(n) => *n,
            FormNumber::Text(s) => s.trim().parse::<f64>().ok()?,
            FormNumber::Other(_) => return None,
        };
        v.is_finite().then_some(v)
    }
}

impl From<f64> for FormNumber {
    fn from(v: f64) -> Self {
        FormNumber::Number(v)
    }
}

impl From<&str> for FormNumber {
    fn from(v: &str) -> Self {
        FormNumber::Text(v.to_string())
    }
}

/// A boolean that may have been submitted as a checkbox value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormFlag {
    Bool(bool),
    Text(String),
    Other(Value),
}

impl FormFlag {
    pub fn value(&self) -> bool {
        match self {
            FormFlag::Bool(b) => *b,
            FormFlag::Text(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "on" | "yes" | "1"
            ),
            FormFlag::Other(v) => v.as_f64().is_some_and(|n| n == 1.0),
        }
    }
}

impl From<bool> for FormFlag {
    fn from(v: bool) -> Self {
        FormFlag::Bool(v)
    }
}

/// Contact details collected by both onboarding forms
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactDetails {
    pub phone: String,
    pub state: String,
    pub district: String,
    pub bio: Option<String>,
}

/// Farmer profile values after coercion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmerProfileInput {
    pub crops: Vec<String>,
    pub experience_years: u8,
    pub farming_type: FarmingType,
    pub land_size_acres: f64,
    pub lease_duration_months: u16,
    pub irrigation_needed: bool,
    pub equipment_access: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FarmerOnboarding {
    pub contact: ContactDetails,
    pub profile: FarmerProfileInput,
}

/// Land supplied during landowner onboarding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandInput {
    pub title: String,
    pub size_acres: f64,
    pub land_type: LandType,
    pub soil_type: Option<String>,
    pub irrigation_available: bool,
    pub min_lease_months: u16,
    pub max_lease_months: u16,
    pub expected_rent_min: Option<f64>,
    pub expected_rent_max: Option<f64>,
    pub allowed_crops: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LandownerOnboarding {
    pub contact: ContactDetails,
    pub land: Option<LandInput>,
}

/// Farmer onboarding form as submitted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmerOnboardingForm {
    #[serde(deserialize_with = "lenient_text")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub state: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub district: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub bio: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub crops: Vec<String>,
    pub experience: Option<FormNumber>,
    #[serde(deserialize_with = "lenient_text")]
    pub farming_type: Option<String>,
    pub land_size: Option<FormNumber>,
    pub lease_duration: Option<FormNumber>,
    pub irrigation_needed: Option<FormFlag>,
    pub equipment_access: Option<FormFlag>,
}

impl FarmerOnboardingForm {
    pub fn into_onboarding(self) -> Result<FarmerOnboarding, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let contact = contact_details(self.phone, self.state, self.district, self.bio, &mut errors);

        let crops = clean_list(self.crops);
        if crops.is_empty() {
            errors.push("crops", "at least one crop is required");
        }
        errors.into_result()?;

        let experience_years = self
            .experience
            .and_then(|n| n.value())
            .map(|v| v.trunc().clamp(0.0, f64::from(EXPERIENCE_YEARS_MAX)) as u8)
            .unwrap_or(0);

        let farming_type = self
            .farming_type
            .and_then(|s| s.parse().ok())
            .unwrap_or(FarmingType::Mixed);

        let land_size_acres = self
            .land_size
            .and_then(|n| n.value())
            .map(|v| v.clamp(FARMER_LAND_ACRES_MIN, FARMER_LAND_ACRES_MAX))
            .unwrap_or(DEFAULT_FARMER_LAND_ACRES);

        Ok(FarmerOnboarding {
            contact,
            profile: FarmerProfileInput {
                crops,
                experience_years,
                farming_type,
                land_size_acres,
                lease_duration_months: lease_months(self.lease_duration, DEFAULT_LEASE_MONTHS),
                irrigation_needed: flag(self.irrigation_needed),
                equipment_access: flag(self.equipment_access),
            },
        })
    }
}

/// Landowner onboarding form as submitted; land fields are optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LandownerOnboardingForm {
    #[serde(deserialize_with = "lenient_text")]
    pub phone: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub state: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub district: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub bio: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub land_title: Option<String>,
    pub land_size: Option<FormNumber>,
    #[serde(deserialize_with = "lenient_text")]
    pub land_type: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub soil_type: Option<String>,
    pub irrigation_available: Option<FormFlag>,
    pub min_lease_duration: Option<FormNumber>,
    pub max_lease_duration: Option<FormNumber>,
    pub expected_rent_min: Option<FormNumber>,
    pub expected_rent_max: Option<FormNumber>,
    #[serde(deserialize_with = "lenient_list")]
    pub allowed_crops: Vec<String>,
}

impl LandownerOnboardingForm {
    pub fn into_onboarding(self) -> Result<LandownerOnboarding, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let contact = contact_details(self.phone, self.state, self.district, self.bio, &mut errors);
        errors.into_result()?;

        let title = non_blank(self.land_title);
        let size = self.land_size.and_then(|n| n.value()).filter(|v| *v > 0.0);

        // Both title and size must be present for a land to be recorded
        let land = match (title, size) {
            (Some(title), Some(size)) => {
                let mut min = lease_months(self.min_lease_duration, LEASE_MONTHS_MIN);
                let mut max = lease_months(self.max_lease_duration, LEASE_MONTHS_MAX);
                if min > max {
                    std::mem::swap(&mut min, &mut max);
                }

                let mut rent_min = rent(self.expected_rent_min);
                let mut rent_max = rent(self.expected_rent_max);
                if let (Some(lo), Some(hi)) = (rent_min, rent_max) {
                    if lo > hi {
                        rent_min = Some(hi);
                        rent_max = Some(lo);
                    }
                }

                Some(LandInput {
                    title,
                    size_acres: size.clamp(LAND_ACRES_MIN, LAND_ACRES_MAX),
                    land_type: self
                        .land_type
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(LandType::Agricultural),
                    soil_type: non_blank(self.soil_type),
                    irrigation_available: flag(self.irrigation_available),
                    min_lease_months: min,
                    max_lease_months: max,
                    expected_rent_min: rent_min,
                    expected_rent_max: rent_max,
                    allowed_crops: clean_list(self.allowed_crops),
                })
            }
            _ => None,
        };

        Ok(LandownerOnboarding { contact, land })
    }
}

/// Strings as given, numbers and booleans in their text form, anything else absent
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(Value::deserialize(deserializer)?))
}

/// A list of scalars or a single scalar; null and other shapes are empty
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(scalar_text).collect(),
        other => scalar_text(other).into_iter().collect(),
    })
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn contact_details(
    phone: Option<String>,
    state: Option<String>,
    district: Option<String>,
    bio: Option<String>,
    errors: &mut ValidationErrors,
) -> ContactDetails {
    let mut required = |field: &'static str, value: Option<String>| {
        non_blank(value).unwrap_or_else(|| {
            errors.push(field, "is required");
            String::new()
        })
    };

    ContactDetails {
        phone: required("phone", phone),
        state: required("state", state),
        district: required("district", district),
        bio: non_blank(bio),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Trim, drop blanks and exact duplicates, keep first-seen order
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !out.iter().any(|seen| seen == item) {
            out.push(item.to_string());
        }
    }
    out
}

fn lease_months(value: Option<FormNumber>, default: u16) -> u16 {
    value
        .and_then(|n| n.value())
        .map(|v| v.trunc().clamp(f64::from(LEASE_MONTHS_MIN), f64::from(LEASE_MONTHS_MAX)) as u16)
        .unwrap_or(default)
}

fn rent(value: Option<FormNumber>) -> Option<f64> {
    value.and_then(|n| n.value()).filter(|v| *v >= 0.0)
}

fn flag(value: Option<FormFlag>) -> bool {
    value.map(|f| f.value()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact_only() -> FarmerOnboardingForm {
        FarmerOnboardingForm {
            phone: Some("9876543210".into()),
            state: Some("Punjab".into()),
            district: Some("Ludhiana".into()),
            crops: vec!["Wheat".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_form_number_reads_text_and_numbers() {
        assert_eq!(FormNumber::from("  12.5 ").value(), Some(12.5));
        assert_eq!(FormNumber::from(3.0).value(), Some(3.0));
        assert_eq!(FormNumber::from("abc").value(), None);
        assert_eq!(FormNumber::from("NaN").value(), None);
    }

    #[test]
    fn test_form_flag_accepts_checkbox_values() {
        assert!(FormFlag::Text("on".into()).value());
        assert!(FormFlag::Text("TRUE".into()).value());
        assert!(!FormFlag::Text("off".into()).value());
        assert!(FormFlag::Bool(true).value());
    }

    #[test]
    fn test_wrong_typed_fields_deserialize() {
        let form: FarmerOnboardingForm = serde_json::from_value(serde_json::json!({
            "phone": 9876543210u64,
            "state": "Punjab",
            "district": ["Ludhiana"],
            "bio": null,
            "crops": null,
            "experience": true,
            "land_size": { "acres": 4 },
            "irrigation_needed": 1,
            "equipment_access": []
        }))
        .unwrap();

        assert_eq!(form.phone.as_deref(), Some("9876543210"));
        assert_eq!(form.district, None);
        assert_eq!(form.bio, None);
        assert!(form.crops.is_empty());
        assert_eq!(form.experience.as_ref().and_then(FormNumber::value), None);
        assert_eq!(form.land_size.as_ref().and_then(FormNumber::value), None);
        assert!(flag(form.irrigation_needed.clone()));
        assert!(!flag(form.equipment_access.clone()));

        let err = form.into_onboarding().unwrap_err();
        assert!(err.has_field("district"));
        assert!(err.has_field("crops"));
        assert!(!err.has_field("phone"));
    }

    #[test]
    fn test_crop_lists_accept_scalars() {
        let form: LandownerOnboardingForm = serde_json::from_value(serde_json::json!({
            "allowed_crops": ["Wheat", 7, null, { "name": "Rice" }]
        }))
        .unwrap();
        assert_eq!(form.allowed_crops, vec!["Wheat", "7"]);

        let form: FarmerOnboardingForm =
            serde_json::from_value(serde_json::json!({ "crops": "Cotton" })).unwrap();
        assert_eq!(form.crops, vec!["Cotton"]);
    }

    #[test]
    fn test_farmer_defaults_are_in_range() {
        let parsed = contact_only().into_onboarding().unwrap();
        assert_eq!(parsed.profile.experience_years, 0);
        assert_eq!(parsed.profile.farming_type, FarmingType::Mixed);
        assert_eq!(parsed.profile.land_size_acres, DEFAULT_FARMER_LAND_ACRES);
        assert_eq!(parsed.profile.lease_duration_months, DEFAULT_LEASE_MONTHS);
        assert!(!parsed.profile.irrigation_needed);
    }

    #[test]
    fn test_farmer_numbers_are_clamped_not_rejected() {
        let form = FarmerOnboardingForm {
            experience: Some("75".into()),
            land_size: Some(0.01.into()),
            lease_duration: Some("500".into()),
            ..contact_only()
        };
        let parsed = form.into_onboarding().unwrap();
        assert_eq!(parsed.profile.experience_years, EXPERIENCE_YEARS_MAX);
        assert_eq!(parsed.profile.land_size_acres, FARMER_LAND_ACRES_MIN);
        assert_eq!(parsed.profile.lease_duration_months, LEASE_MONTHS_MAX);
    }

    #[test]
    fn test_unparsable_experience_defaults_to_zero() {
        let form = FarmerOnboardingForm {
            experience: Some("ten".into()),
            ..contact_only()
        };
        assert_eq!(form.into_onboarding().unwrap().profile.experience_years, 0);
    }

    #[test]
    fn test_missing_required_fields_are_all_reported() {
        let form = FarmerOnboardingForm {
            phone: Some("   ".into()),
            crops: vec![" ".into()],
            ..Default::default()
        };
        let err = form.into_onboarding().unwrap_err();
        for field in ["phone", "state", "district", "crops"] {
            assert!(err.has_field(field), "missing error for {}", field);
        }
    }

    #[test]
    fn test_crops_are_cleaned() {
        let form = FarmerOnboardingForm {
            crops: vec![" Rice ".into(), "".into(), "Rice".into(), "Maize".into()],
            ..contact_only()
        };
        let parsed = form.into_onboarding().unwrap();
        assert_eq!(parsed.profile.crops, vec!["Rice", "Maize"]);
    }

    #[test]
    fn test_landowner_land_needs_title_and_size() {
        let base = LandownerOnboardingForm {
            phone: Some("1".into()),
            state: Some("Goa".into()),
            district: Some("North Goa".into()),
            ..Default::default()
        };

        let no_land = base.clone().into_onboarding().unwrap();
        assert!(no_land.land.is_none());

        let title_only = LandownerOnboardingForm {
            land_title: Some("River plot".into()),
            ..base.clone()
        };
        assert!(title_only.into_onboarding().unwrap().land.is_none());

        let zero_size = LandownerOnboardingForm {
            land_title: Some("River plot".into()),
            land_size: Some("0".into()),
            ..base.clone()
        };
        assert!(zero_size.into_onboarding().unwrap().land.is_none());

        let with_land = LandownerOnboardingForm {
            land_title: Some("River plot".into()),
            land_size: Some("4.5".into()),
            ..base
        };
        let land = with_land.into_onboarding().unwrap().land.unwrap();
        assert_eq!(land.size_acres, 4.5);
        assert_eq!(land.land_type, LandType::Agricultural);
        assert_eq!(land.min_lease_months, LEASE_MONTHS_MIN);
        assert_eq!(land.max_lease_months, LEASE_MONTHS_MAX);
    }

    #[test]
    fn test_landowner_swaps_inverted_ranges() {
        let form = LandownerOnboardingForm {
            phone: Some("1".into()),
            state: Some("Goa".into()),
            district: Some("North Goa".into()),
            land_title: Some("Orchard".into()),
            land_size: Some(2.0.into()),
            land_type: Some("orchard".into()),
            min_lease_duration: Some("36".into()),
            max_lease_duration: Some("12".into()),
            expected_rent_min: Some("9000".into()),
            expected_rent_max: Some("5000".into()),
            ..Default::default()
        };
        let land = form.into_onboarding().unwrap().land.unwrap();
        assert_eq!(land.land_type, LandType::Orchard);
        assert_eq!((land.min_lease_months, land.max_lease_months), (12, 36));
        assert_eq!(land.expected_rent_min, Some(5000.0));
        assert_eq!(land.expected_rent_max, Some(9000.0));
    }
}
