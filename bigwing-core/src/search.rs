use bigwing_shared::{PageRequest, MAX_PAGE_SIZE};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct OneWaySearchQuery {
    pub origin_code: String,
    pub destination_code: String,
    pub departure_date: NaiveDate,
    pub page_size: u32,
    pub page_number: u32,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct RoundTripSearchQuery {
    pub origin_code: String,
    pub destination_code: String,
    pub departure_date: NaiveDate,
    pub return_date: NaiveDate,
    pub page_size: u32,
    pub page_number: u32,
}

/// A single directed leg: schedules flying from `origin_code` to `destination_code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchLeg {
    pub origin_code: String,
    pub destination_code: String,
    pub departure_date: NaiveDate,
}

impl OneWaySearchQuery {
    pub fn into_leg(self) -> CoreResult<(SearchLeg, PageRequest)> {
        let page = page_request(self.page_number, self.page_size)?;
        let leg = SearchLeg {
            origin_code: normalize_code("originCode", &self.origin_code)?,
            destination_code: normalize_code("destinationCode", &self.destination_code)?,
            departure_date: self.departure_date,
        };
        Ok((leg, page))
    }
}

impl RoundTripSearchQuery {
    /// Returns the outbound leg, the return leg (reversed airports) and the page
    /// request applied to both.
    pub fn into_legs(self) -> CoreResult<(SearchLeg, SearchLeg, PageRequest)> {
        if self.return_date < self.departure_date {
            return Err(CoreError::ValidationError(
                "returnDate must not be before departureDate".to_string(),
            ));
        }
        let page = page_request(self.page_number, self.page_size)?;
        let origin = normalize_code("originCode", &self.origin_code)?;
        let destination = normalize_code("destinationCode", &self.destination_code)?;

        let outbound = SearchLeg {
            origin_code: origin.clone(),
            destination_code: destination.clone(),
            departure_date: self.departure_date,
        };
        let inbound = SearchLeg {
            origin_code: destination,
            destination_code: origin,
            departure_date: self.return_date,
        };
        Ok((outbound, inbound, page))
    }
}

fn normalize_code(field: &str, value: &str) -> CoreResult<String> {
    let code = value.trim();
    if code.is_empty() {
        return Err(CoreError::ValidationError(format!("{} must not be empty", field)));
    }
    Ok(code.to_uppercase())
}

fn page_request(page_number: u32, page_size: u32) -> CoreResult<PageRequest> {
    PageRequest::new(page_number, page_size).ok_or_else(|| {
        CoreError::ValidationError(format!(
            "pageNumber must be at least 1 and pageSize between 1 and {}",
            MAX_PAGE_SIZE
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_way_query_deserialization() {
        let json = r#"
            {
                "originCode": " lax ",
                "destinationCode": "JFK",
                "departureDate": "2024-12-25",
                "pageSize": 10,
                "pageNumber": 1
            }
        "#;
        let query: OneWaySearchQuery = serde_json::from_str(json).expect("Failed to deserialize");
        let (leg, page) = query.into_leg().unwrap();

        assert_eq!(leg.origin_code, "LAX");
        assert_eq!(leg.destination_code, "JFK");
        assert_eq!(leg.departure_date, NaiveDate::from_ymd_opt(2024, 12, 25).unwrap());
        assert_eq!(page.page_size(), 10);
    }

    #[test]
    fn test_zero_page_number_is_rejected() {
        let query = OneWaySearchQuery {
            origin_code: "LAX".to_string(),
            destination_code: "JFK".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2024, 12, 25).unwrap(),
            page_size: 10,
            page_number: 0,
        };
        assert!(matches!(query.into_leg(), Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn test_oversized_page_is_rejected() {
        let query = OneWaySearchQuery {
            origin_code: "LAX".to_string(),
            destination_code: "JFK".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2024, 12, 25).unwrap(),
            page_size: u32::MAX,
            page_number: u32::MAX,
        };
        assert!(matches!(query.into_leg(), Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn test_round_trip_reverses_airports() {
        let query = RoundTripSearchQuery {
            origin_code: "LAX".to_string(),
            destination_code: "jfk".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
            return_date: NaiveDate::from_ymd_opt(2024, 12, 27).unwrap(),
            page_size: 5,
            page_number: 1,
        };
        let (outbound, inbound, _) = query.into_legs().unwrap();

        assert_eq!((outbound.origin_code.as_str(), outbound.destination_code.as_str()), ("LAX", "JFK"));
        assert_eq!((inbound.origin_code.as_str(), inbound.destination_code.as_str()), ("JFK", "LAX"));
        assert_eq!(inbound.departure_date, NaiveDate::from_ymd_opt(2024, 12, 27).unwrap());
    }

    #[test]
    fn test_return_before_departure_is_rejected() {
        let query = RoundTripSearchQuery {
            origin_code: "LAX".to_string(),
            destination_code: "JFK".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2024, 12, 20).unwrap(),
            return_date: NaiveDate::from_ymd_opt(2024, 12, 19).unwrap(),
            page_size: 5,
            page_number: 1,
        };
        assert!(query.into_legs().is_err());
    }
}
