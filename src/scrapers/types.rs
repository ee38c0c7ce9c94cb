use crate::models::Room;
use crate::models::DayAvailability;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A fully built request to the provider
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>, headers: &BTreeMap<String, String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            headers: headers.clone(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, headers: &BTreeMap<String, String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            headers: headers.clone(),
            body: Some(body),
        }
    }
}

// --- GraphQL envelopes ---

#[derive(Debug, Serialize)]
pub struct GraphqlRequest<V> {
    pub query: &'static str,
    pub variables: V,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlError {
    #[serde(default)]
    pub message: String,
}

// --- Session ---

pub const OPEN_SESSION_QUERY: &str = "mutation postSearchedData($checkinDate: String!, $checkoutDate: String!, $searchType: searchType!, $hostelId: ID, $tripPackageId: ID, $workationPackageId: ID) {
  Search(
    hostelId: $hostelId
    checkinDate: $checkinDate
    checkoutDate: $checkoutDate
    searchType: $searchType
    tripPackageId: $tripPackageId
    workationPackageId: $workationPackageId
  ) {
    sessionId
    hostelId
  }
}";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionVariables<'a> {
    pub hostel_id: &'a str,
    pub checkin_date: String,
    pub checkout_date: String,
    pub search_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct OpenSessionData {
    #[serde(rename = "Search")]
    pub search: SearchResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub session_id: String,
}

// --- Rooms ---

pub const SEARCH_ROOMS_QUERY: &str = "mutation SearchBySessionNew($sessionId: String!) {
  SearchBySessionNew(sessionId: $sessionId) {
    searchResults
  }
}";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionVariables<'a> {
    pub session_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SearchRoomsData {
    #[serde(rename = "SearchBySessionNew")]
    pub search: RoomSearchResults,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSearchResults {
    pub search_results: Vec<Room>,
}

// --- Availability ---

pub const AVAILABILITY_QUERY: &str = "mutation availability($searchFilter: searchFilter) {
  availability(searchFilter: $searchFilter) {
    searchResults
    roomAvailableMessage
  }
}";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityVariables<'a> {
    pub search_filter: SearchFilter<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter<'a> {
    pub session_id: &'a str,
    pub room_unique_id: &'a str,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityData {
    pub availability: AvailabilityResults,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResults {
    pub search_results: Vec<DayAvailability>,
}

// --- REST pages ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub page_props: CatalogProps,
}

#[derive(Debug, Deserialize)]
pub struct CatalogProps {
    pub hostels: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailPage {
    pub page_props: DetailProps,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailProps {
    pub hostel_details: HostelDetailsRecord,
}

#[derive(Debug, Deserialize)]
pub struct HostelDetailsRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}
