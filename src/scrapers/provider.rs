use crate::config::{Config, HeaderProfile};
use crate::models::{DayAvailability, HostelDetails, Room, Session, SessionWindow};
use crate::scrapers::error::ApiError;
use crate::scrapers::http::RetryingClient;
use crate::scrapers::traits::Transport;
use crate::scrapers::types::*;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

const SEARCH_TYPE_HOSTEL: &str = "Hostel";
/// Availability is only ever requested for the first page
const AVAILABILITY_PAGE: u32 = 1;

/// Typed access to the provider's catalog, detail and GraphQL endpoints.
///
/// Request methods return the raw JSON body so callers can snapshot it before
/// handing it to the matching `parse_*` function.
pub struct Provider<T> {
    client: RetryingClient<T>,
    catalog_url: String,
    detail_url_prefix: String,
    graphql_url: String,
    headers: HeaderProfile,
    days: u32,
}

impl<T: Transport> Provider<T> {
    pub fn new(transport: T, config: &Config) -> Self {
        Self {
            client: RetryingClient::new(transport, config.max_retries, config.retry_delay()),
            catalog_url: config.get_hostels_url.clone(),
            detail_url_prefix: config.hostel_id_url.clone(),
            graphql_url: config.graphql_url.clone(),
            headers: config.header_profile().clone(),
            days: config.duration_days,
        }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        self.client.transport()
    }

    pub async fn hostel_catalog(&self) -> Result<Value, ApiError> {
        let request = ApiRequest::get(&self.catalog_url, &self.headers.base_header);
        self.client.call(&request).await
    }

    pub async fn hostel_details(&self, slug: &str) -> Result<Value, ApiError> {
        let url = detail_url(&self.detail_url_prefix, slug)?;
        let request = ApiRequest::get(url, &self.headers.base_header);
        self.client.call(&request).await
    }

    pub async fn open_session(
        &self,
        hostel_id: &str,
        window: SessionWindow,
    ) -> Result<Value, ApiError> {
        let variables = OpenSessionVariables {
            hostel_id,
            checkin_date: window.check_in_str(),
            checkout_date: window.check_out_str(),
            search_type: SEARCH_TYPE_HOSTEL,
        };
        self.graphql(OPEN_SESSION_QUERY, variables).await
    }

    pub async fn search_rooms(&self, session_id: &str) -> Result<Value, ApiError> {
        self.graphql(SEARCH_ROOMS_QUERY, SessionVariables { session_id })
            .await
    }

    pub async fn availability(&self, session_id: &str, room_id: &str) -> Result<Value, ApiError> {
        let variables = AvailabilityVariables {
            search_filter: SearchFilter {
                session_id,
                room_unique_id: room_id,
                page: AVAILABILITY_PAGE,
                limit: self.days,
            },
        };
        self.graphql(AVAILABILITY_QUERY, variables).await
    }

    async fn graphql<V: Serialize>(
        &self,
        query: &'static str,
        variables: V,
    ) -> Result<Value, ApiError> {
        let body = serde_json::to_value(GraphqlRequest { query, variables }).map_err(|source| {
            ApiError::Shape {
                what: "GraphQL request",
                source,
            }
        })?;
        let request = ApiRequest::post(&self.graphql_url, &self.headers.data_header, body);
        self.client.call(&request).await
    }
}

/// `<prefix><slug>.json?hostelURL=<slug>`
pub fn detail_url(prefix: &str, slug: &str) -> Result<String, ApiError> {
    let base = format!("{}{}.json", prefix, slug);
    Url::parse_with_params(&base, &[("hostelURL", slug)])
        .map(String::from)
        .map_err(|e| ApiError::InvalidUrl {
            url: base,
            reason: e.to_string(),
        })
}

pub fn parse_catalog(body: &Value) -> Result<Vec<Value>, ApiError> {
    let page: CatalogPage = from_body("hostel catalog", body)?;
    Ok(page.page_props.hostels)
}

pub fn parse_details(body: &Value) -> Result<HostelDetails, ApiError> {
    let page: DetailPage = from_body("hostel detail", body)?;
    let details = page.page_props.hostel_details;
    Ok(HostelDetails {
        hostel_id: details.id,
        hostel_name: details.name,
    })
}

pub fn parse_session(body: &Value) -> Result<Session, ApiError> {
    let data: OpenSessionData = graphql_data("Search", body)?;
    Ok(Session {
        session_id: data.search.session_id,
    })
}

pub fn parse_rooms(body: &Value) -> Result<Vec<Room>, ApiError> {
    let data: SearchRoomsData = graphql_data("SearchBySessionNew", body)?;
    Ok(data.search.search_results)
}

pub fn parse_availability(body: &Value) -> Result<Vec<DayAvailability>, ApiError> {
    let data: AvailabilityData = graphql_data("availability", body)?;
    debug!(days = data.availability.search_results.len(), "Parsed availability");
    Ok(data.availability.search_results)
}

fn from_body<D: DeserializeOwned>(what: &'static str, body: &Value) -> Result<D, ApiError> {
    serde_json::from_value(body.clone()).map_err(|source| ApiError::Shape { what, source })
}

/// Pull `data` out of a GraphQL response. Errors reported by the server win
/// over shape errors when `data` is unusable.
fn graphql_data<D: DeserializeOwned>(operation: &'static str, body: &Value) -> Result<D, ApiError> {
    let envelope: GraphqlResponse<Value> = from_body(operation, body)?;
    match serde_json::from_value(envelope.data.unwrap_or(Value::Null)) {
        Ok(data) => Ok(data),
        Err(_) if !envelope.errors.is_empty() => Err(ApiError::Graphql {
            operation,
            messages: envelope
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        }),
        Err(source) => Err(ApiError::Shape {
            what: operation,
            source,
        }),
    }
}
