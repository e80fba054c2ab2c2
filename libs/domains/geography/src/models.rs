use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Rejects values that are empty once surrounding whitespace is removed
fn validate_not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}

/// Country row. Names are unique case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Country {
    /// Store-assigned identifier
    pub id: i32,
    pub name: String,
}

/// Province row. Unique on (case-insensitive name, country).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Province {
    /// Store-assigned identifier
    pub id: i32,
    pub name: String,
    pub country_id: i32,
}

/// Locality row. The id is caller supplied (usually a postal code).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Locality {
    pub id: String,
    pub name: String,
    pub province_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCountry {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProvince {
    pub name: String,
    pub country_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLocality {
    pub id: String,
    pub name: String,
    pub province_id: i32,
}

/// Flat request resolved into country, province and locality rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestGeography {
    /// Locality id (postal code)
    #[validate(length(min = 1, max = 32), custom(function = "validate_not_blank"))]
    pub id: String,
    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub locality_name: String,
    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub province_name: String,
    #[validate(length(min = 1, max = 255), custom(function = "validate_not_blank"))]
    pub country_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseGeography {
    pub locality_id: String,
    pub locality_name: String,
    pub province_name: String,
    pub country_name: String,
}

/// The three rows a single resolution produced or reused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGeography {
    pub country: Country,
    pub province: Province,
    pub locality: Locality,
}

impl From<ResolvedGeography> for ResponseGeography {
    fn from(resolved: ResolvedGeography) -> Self {
        Self {
            locality_id: resolved.locality.id,
            locality_name: resolved.locality.name,
            province_name: resolved.province.name,
            country_name: resolved.country.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RequestGeography {
        RequestGeography {
            id: "5194".to_string(),
            locality_name: "Villa General Belgrano".to_string(),
            province_name: "Cordoba".to_string(),
            country_name: "Argentina".to_string(),
        }
    }

    #[test]
    fn test_request_uses_camel_case_fields() {
        let parsed: RequestGeography = serde_json::from_value(serde_json::json!({
            "id": "5194",
            "localityName": "Villa General Belgrano",
            "provinceName": "Cordoba",
            "countryName": "Argentina"
        }))
        .unwrap();

        assert_eq!(parsed, request());
    }

    #[test]
    fn test_blank_fields_fail_validation() {
        let mut input = request();
        input.province_name = "   ".to_string();

        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("province_name"));
    }

    #[test]
    fn test_valid_request_passes_validation() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_response_from_resolved_rows() {
        let resolved = ResolvedGeography {
            country: Country {
                id: 1,
                name: "Argentina".to_string(),
            },
            province: Province {
                id: 2,
                name: "Santa Fe".to_string(),
                country_id: 1,
            },
            locality: Locality {
                id: "3000".to_string(),
                name: "Santa Fe".to_string(),
                province_id: 2,
            },
        };

        let response = ResponseGeography::from(resolved);
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["localityId"], "3000");
        assert_eq!(json["provinceName"], "Santa Fe");
        assert_eq!(json["countryName"], "Argentina");
    }
}
