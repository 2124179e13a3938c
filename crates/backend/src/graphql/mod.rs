use std::sync::Arc;

use async_graphql::{Context, Json, Object, SimpleObject};
use odi_shared::models;

use crate::data::IndexData;

// GraphQL output types

#[derive(SimpleObject)]
pub struct GqlMeta {
    pub years: Vec<String>,
    pub current_year: Option<String>,
}

#[derive(SimpleObject)]
pub struct GqlSummaryRow {
    pub id: String,
    pub title: String,
    pub value: Option<String>,
    pub previous_value: Option<String>,
}

#[derive(SimpleObject)]
pub struct GqlPlace {
    pub id: String,
    pub name: String,
    pub score: Option<String>,
    pub rank: Option<String>,
    pub previous_score: Option<String>,
    pub previous_rank: Option<String>,
}

#[derive(SimpleObject)]
pub struct GqlDataset {
    pub id: String,
    pub title: String,
    pub score: Option<String>,
    pub rank: Option<String>,
}

#[derive(SimpleObject)]
pub struct GqlEntry {
    pub place: String,
    pub year: String,
    pub dataset: String,
    pub score: Option<String>,
    pub rank: Option<String>,
    pub is_open: Option<bool>,
}

impl From<&models::Meta> for GqlMeta {
    fn from(m: &models::Meta) -> Self {
        GqlMeta {
            years: m.years.clone(),
            current_year: m.current_year.clone(),
        }
    }
}

impl From<&models::SummaryRow> for GqlSummaryRow {
    fn from(s: &models::SummaryRow) -> Self {
        GqlSummaryRow {
            id: s.id.clone(),
            title: s.title.clone(),
            value: s.value.clone(),
            previous_value: s.previous_value.clone(),
        }
    }
}

impl From<&models::Place> for GqlPlace {
    fn from(p: &models::Place) -> Self {
        GqlPlace {
            id: p.id.clone(),
            name: p.name.clone(),
            score: p.score.clone(),
            rank: p.rank.clone(),
            previous_score: p.previous_score.clone(),
            previous_rank: p.previous_rank.clone(),
        }
    }
}

impl From<&models::Dataset> for GqlDataset {
    fn from(d: &models::Dataset) -> Self {
        GqlDataset {
            id: d.id.clone(),
            title: d.title.clone(),
            score: d.score.clone(),
            rank: d.rank.clone(),
        }
    }
}

impl From<&models::Entry> for GqlEntry {
    fn from(e: &models::Entry) -> Self {
        GqlEntry {
            place: e.place.clone(),
            year: e.year.clone(),
            dataset: e.dataset.clone(),
            score: e.score.clone(),
            rank: e.rank.clone(),
            is_open: e.is_open,
        }
    }
}

// Query root

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn meta(&self, ctx: &Context<'_>) -> async_graphql::Result<GqlMeta> {
        let data = ctx.data::<Arc<IndexData>>()?;
        Ok(GqlMeta::from(&data.meta))
    }

    async fn summary(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<GqlSummaryRow>> {
        let data = ctx.data::<Arc<IndexData>>()?;
        Ok(data.summary.iter().map(GqlSummaryRow::from).collect())
    }

    async fn places(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<GqlPlace>> {
        let data = ctx.data::<Arc<IndexData>>()?;
        Ok(data.places.iter().map(GqlPlace::from).collect())
    }

    async fn place(&self, ctx: &Context<'_>, id: String) -> async_graphql::Result<Option<GqlPlace>> {
        let data = ctx.data::<Arc<IndexData>>()?;
        Ok(data.find_place(&id).map(GqlPlace::from))
    }

    async fn datasets(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<GqlDataset>> {
        let data = ctx.data::<Arc<IndexData>>()?;
        Ok(data.datasets.iter().map(GqlDataset::from).collect())
    }

    /// Entries, optionally narrowed to a year, dataset and place.
    async fn entries(
        &self,
        ctx: &Context<'_>,
        year: Option<String>,
        dataset: Option<String>,
        place: Option<String>,
    ) -> async_graphql::Result<Vec<GqlEntry>> {
        let data = ctx.data::<Arc<IndexData>>()?;
        let matches = |want: &Option<String>, have: &str| {
            want.as_deref().map_or(true, |w| w.eq_ignore_ascii_case(have))
        };
        Ok(data
            .entries
            .iter()
            .filter(|e| {
                matches(&year, &e.year) && matches(&dataset, &e.dataset) && matches(&place, &e.place)
            })
            .map(GqlEntry::from)
            .collect())
    }

    /// Region outlines as a GeoJSON FeatureCollection.
    async fn geo(&self, ctx: &Context<'_>) -> async_graphql::Result<Json<geojson::FeatureCollection>> {
        let data = ctx.data::<Arc<IndexData>>()?;
        Ok(Json(data.geo.clone()))
    }
}

pub type Schema =
    async_graphql::Schema<QueryRoot, async_graphql::EmptyMutation, async_graphql::EmptySubscription>;

pub fn build_schema(data: Arc<IndexData>) -> Schema {
    async_graphql::Schema::build(
        QueryRoot,
        async_graphql::EmptyMutation,
        async_graphql::EmptySubscription,
    )
    .data(data)
    .finish()
}
