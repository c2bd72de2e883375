use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};

use crate::{
    model::models::{DengueRecord, RecordFilter},
    service::boundaries::BoundaryDataset,
};

/**
 * Lower and upper bound of the heatmap color scale.
 */
pub const CORRELATION_RANGE: (f64, f64) = (-1.0, 1.0);

/**
 * Choropleth fill colors, highest bucket first. A region gets the first color whose
 * threshold its case total exceeds.
 */
const CASE_COLORS: [(i64, &str); 10] = [
    (100_000, "#800026"),
    (90_000, "#BD0026"),
    (80_000, "#E31A1C"),
    (70_000, "#FF4D1A"),
    (60_000, "#FF6F3C"),
    (50_000, "#FF924A"),
    (40_000, "#FFB566"),
    (30_000, "#FFDA80"),
    (20_000, "#FFF200"),
    (10_000, "#FFEB00"),
];

const LOWEST_CASE_COLOR: &str = "#FFE500";

/**
 * Case and death series of one region, in record order.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSeries {
    pub region: String,
    pub cases: Vec<i64>,
    pub deaths: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionTotal {
    pub region: String,
    pub cases: i64,
}

/**
 * One bar pair of the cases/deaths comparison chart.
 */
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonPoint {
    pub location: String,
    pub cases: i64,
    pub deaths: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionCorrelation {
    pub region: String,
    pub correlation: f64,
}

/**
 * Data for the correlation heatmap.
 */
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationHeatmap {
    /**
     * Axis labels, used for both x and y.
     */
    pub regions: Vec<String>,
    /**
     * Cell (i, j) correlates the cases of region i with the deaths of region j.
     */
    pub z: Vec<Vec<f64>>,
    /**
     * Cell labels with two decimals.
     */
    pub text: Vec<Vec<String>>,
    pub zmin: f64,
    pub zmax: f64,
    /**
     * Cases against deaths within each region.
     */
    pub region_correlations: Vec<RegionCorrelation>,
}

/**
 * Computes the Pearson correlation coefficient of two series.
 *
 * # Returns
 * `None` when either series is empty, the lengths differ or either series has zero variance.
 */
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.is_empty() || y.is_empty() || x.len() != y.len() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / count;
    let mean_y = y.iter().sum::<f64>() / count;
    let numerator: f64 = x.iter().zip(y).map(|(xi, yi)| (xi - mean_x) * (yi - mean_y)).sum();
    let denominator_x = x.iter().map(|xi| (xi - mean_x).powi(2)).sum::<f64>().sqrt();
    let denominator_y = y.iter().map(|yi| (yi - mean_y).powi(2)).sum::<f64>().sqrt();
    if denominator_x == 0.0 || denominator_y == 0.0 {
        return None;
    }
    Some((numerator / (denominator_x * denominator_y)).clamp(CORRELATION_RANGE.0, CORRELATION_RANGE.1))
}

#[allow(clippy::cast_precision_loss)]
fn as_series(values: &[i64]) -> Vec<f64> {
    values.iter().map(|value| *value as f64).collect()
}

/**
 * Groups case and death counts by region. The region key is case sensitive and regions are
 * returned in order of first appearance.
 */
pub fn group_by_region(records: &[DengueRecord]) -> Vec<RegionSeries> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<RegionSeries> = Vec::new();
    for record in records {
        let position = *index.entry(record.regions.as_str()).or_insert_with(|| {
            groups.push(RegionSeries { region: record.regions.clone(), cases: Vec::new(), deaths: Vec::new() });
            groups.len() - 1
        });
        groups[position].cases.push(record.cases);
        groups[position].deaths.push(record.deaths);
    }
    groups
}

/**
 * Sums cases per region. Totals saturate at `i64::MAX`.
 */
pub fn aggregate_cases_by_region(records: &[DengueRecord]) -> Vec<RegionTotal> {
    group_by_region(records).into_iter().map(|series| RegionTotal { cases: series.cases.iter().fold(0_i64, |total, cases| total.saturating_add(*cases)), region: series.region }).collect()
}

/**
 * Builds the correlation heatmap. The diagonal is fixed to 1 and undefined correlations are
 * shown as 0.
 */
pub fn correlation_heatmap(records: &[DengueRecord]) -> CorrelationHeatmap {
    let groups: Vec<(String, Vec<f64>, Vec<f64>)> = group_by_region(records).into_iter().map(|series| (series.region, as_series(&series.cases), as_series(&series.deaths))).collect();
    let z: Vec<Vec<f64>> = groups
        .iter()
        .enumerate()
        .map(|(row, (_, cases, _))| {
            groups.iter().enumerate().map(|(column, (_, _, deaths))| if row == column { 1.0 } else { pearson_correlation(cases, deaths).unwrap_or(0.0) }).collect()
        })
        .collect();
    let text = z.iter().map(|row| row.iter().map(|value| format!("{value:.2}")).collect()).collect();
    let region_correlations = groups.iter().map(|(region, cases, deaths)| RegionCorrelation { region: region.clone(), correlation: pearson_correlation(cases, deaths).unwrap_or(0.0) }).collect();
    CorrelationHeatmap { regions: groups.into_iter().map(|(region, _, _)| region).collect(), z, text, zmin: CORRELATION_RANGE.0, zmax: CORRELATION_RANGE.1, region_correlations }
}

/**
 * Bar chart data for the records passing the filter.
 */
pub fn comparison_series(records: &[DengueRecord], filter: &RecordFilter) -> Vec<ComparisonPoint> {
    records.iter().filter(|record| filter.matches(record)).map(|record| ComparisonPoint { location: record.location.clone(), cases: record.cases, deaths: record.deaths }).collect()
}

/**
 * Fill color for a case total. Thresholds are absolute, not scaled to the data.
 */
pub fn case_color(cases: i64) -> &'static str {
    CASE_COLORS.iter().find(|(threshold, _)| cases > *threshold).map_or(LOWEST_CASE_COLOR, |(_, color)| *color)
}

fn normalize_region(name: &str) -> String {
    name.trim().to_uppercase()
}

/**
 * Style applied to every boundary on the map.
 */
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStyle {
    pub weight: u32,
    pub opacity: f64,
    pub color: &'static str,
    pub dash_array: &'static str,
    pub fill_opacity: f64,
}

impl Default for FeatureStyle {
    fn default() -> Self {
        FeatureStyle { weight: 2, opacity: 1.0, color: "white", dash_array: "3", fill_opacity: 0.7 }
    }
}

/**
 * Initial map position.
 */
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    pub center: [f64; 2],
    pub zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        MapView { center: [12.8797, 121.7740], zoom: 6 }
    }
}

/**
 * Data for the choropleth map.
 */
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoroplethOutput {
    /**
     * GeoJSON `FeatureCollection` with `cases`, `fillColor` and `tooltip` added to each feature's properties.
     */
    pub boundaries: Value,
    pub style: FeatureStyle,
    pub view: MapView,
}

/**
 * Represents the service deriving chart and map data from records.
 */
pub struct AnalyticsService {
    /**
     * Static region boundaries for the map.
     */
    boundaries: Arc<BoundaryDataset>,
}

impl AnalyticsService {
    /**
     * Creates a new instance of `AnalyticsService`.
     *
     * # Arguments
     * `boundaries`: Static region boundaries for the map.
     */
    pub fn new(boundaries: Arc<BoundaryDataset>) -> Self {
        AnalyticsService { boundaries }
    }

    /**
     * Colors each boundary by the case total of its region.
     *
     * Region names on both sides are trimmed and uppercased before comparing. When several
     * spellings of a region normalize to the same name their totals are added. Boundaries
     * without a matching region get 0 cases. Totals saturate at `i64::MAX`.
     *
     * # Arguments
     * `records`: The full record collection.
     *
     * # Returns
     * The map data.
     */
    pub fn choropleth(&self, records: &[DengueRecord]) -> ChoroplethOutput {
        let mut totals: HashMap<String, i64> = HashMap::new();
        for total in aggregate_cases_by_region(records) {
            let entry = totals.entry(normalize_region(&total.region)).or_insert(0);
            *entry = entry.saturating_add(total.cases);
        }
        let features: Vec<Value> = self
            .boundaries
            .features()
            .iter()
            .map(|boundary| {
                let cases = totals.get(&normalize_region(&boundary.name)).copied().unwrap_or(0);
                let mut feature = boundary.feature.clone();
                if let Some(object) = feature.as_object_mut() {
                    let properties = object.entry("properties").or_insert_with(|| json!({}));
                    if let Some(properties) = properties.as_object_mut() {
                        properties.insert("cases".to_string(), json!(cases));
                        properties.insert("fillColor".to_string(), json!(case_color(cases)));
                        properties.insert("tooltip".to_string(), json!(format!("{}\nCases: {}", boundary.name, cases)));
                    }
                }
                feature
            })
            .collect();
        let unmatched = totals.keys().filter(|region| !self.boundaries.features().iter().any(|boundary| normalize_region(&boundary.name) == **region)).count();
        if unmatched > 0 {
            tracing::debug!("{} regions have no matching boundary", unmatched);
        }
        ChoroplethOutput { boundaries: json!({ "type": "FeatureCollection", "features": features }), style: FeatureStyle::default(), view: MapView::default() }
    }
}
