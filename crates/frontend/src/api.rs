use odi_shared::models::{Dataset, Entry, Meta, PlacesPayload, SummaryRow};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

fn api_url() -> Result<String, String> {
    let origin = web_sys::window()
        .ok_or("No window")?
        .location()
        .origin()
        .map_err(|_| "No origin".to_string())?;
    Ok(format!("{}/graphql", origin))
}

async fn query<T: for<'de> Deserialize<'de>>(
    query_str: &str,
    variables: Option<serde_json::Value>,
) -> Result<T, String> {
    let req = GraphQLRequest {
        query: query_str.to_string(),
        variables,
    };

    let resp = reqwest::Client::new()
        .post(api_url()?)
        .json(&req)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let gql_resp: GraphQLResponse<T> = resp.json().await.map_err(|e| e.to_string())?;

    if let Some(errors) = gql_resp.errors {
        if !errors.is_empty() {
            return Err(errors[0].message.clone());
        }
    }

    gql_resp.data.ok_or_else(|| "No data returned".to_string())
}

// API functions

#[derive(Deserialize)]
pub struct MetaResponse {
    pub meta: Meta,
}

pub async fn fetch_meta() -> Result<Meta, String> {
    let resp: MetaResponse = query(r#"query { meta { years currentYear } }"#, None).await?;
    Ok(resp.meta)
}

#[derive(Deserialize)]
pub struct SummaryResponse {
    pub summary: Vec<SummaryRow>,
}

pub async fn fetch_summary() -> Result<Vec<SummaryRow>, String> {
    let resp: SummaryResponse = query(
        r#"query { summary { id title value previousValue } }"#,
        None,
    )
    .await?;
    Ok(resp.summary)
}

#[derive(Deserialize)]
pub struct DatasetsResponse {
    pub datasets: Vec<Dataset>,
}

pub async fn fetch_datasets() -> Result<Vec<Dataset>, String> {
    let resp: DatasetsResponse =
        query(r#"query { datasets { id title score rank } }"#, None).await?;
    Ok(resp.datasets)
}

#[derive(Deserialize)]
pub struct EntriesResponse {
    pub entries: Vec<Entry>,
}

pub async fn fetch_entries() -> Result<Vec<Entry>, String> {
    let resp: EntriesResponse = query(
        r#"query { entries { place year dataset score rank isOpen } }"#,
        None,
    )
    .await?;
    Ok(resp.entries)
}

/// Places and the geography they are drawn on, in one round trip.
pub async fn fetch_places() -> Result<PlacesPayload, String> {
    query(
        r#"query { places { id name score rank previousScore previousRank } geo }"#,
        None,
    )
    .await
}
