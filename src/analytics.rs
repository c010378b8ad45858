// 📊 Analytics - aggregations behind the dashboard views
// City trends, summaries, comparisons, month×city heatmap and rankings.
// Every function is a pure read over a slice of records.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::category::{classify, AqiCategory, AqiValue};
use crate::pollutants::Pollutant;
use crate::records::AirQualityRecord;

/// Default size of the "most polluted" ranking.
pub const DEFAULT_TOP_LIMIT: usize = 10;

// ============================================================================
// CITY SELECTION
// ============================================================================

/// Distinct city names, sorted.
pub fn cities(records: &[AirQualityRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.city.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Records for one city in date order.
pub fn city_records<'a>(records: &'a [AirQualityRecord], city: &str) -> Vec<&'a AirQualityRecord> {
    let mut selected: Vec<&AirQualityRecord> = records.iter().filter(|r| r.city == city).collect();
    selected.sort_by_key(|r| r.date);
    selected
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub aqi: AqiValue,
}

/// Daily AQI series for one city.
pub fn aqi_series(records: &[AirQualityRecord], city: &str) -> Vec<TrendPoint> {
    city_records(records, city)
        .into_iter()
        .map(|r| TrendPoint { date: r.date, aqi: r.aqi })
        .collect()
}

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AqiSummary {
    pub count: usize,
    pub mean: AqiValue,
    pub min: AqiValue,
    pub max: AqiValue,
    pub mean_category: AqiCategory,
}

/// Mean/min/max AQI for a city; `None` when the city has no records.
pub fn summary(records: &[AirQualityRecord], city: &str) -> Option<AqiSummary> {
    let values: Vec<f64> = records.iter().filter(|r| r.city == city).map(|r| r.aqi).collect();
    if values.is_empty() {
        return None;
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(AqiSummary {
        count: values.len(),
        mean,
        min,
        max,
        mean_category: classify(mean),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollutantShare {
    pub pollutant: Pollutant,
    pub mean: f64,
    /// Share of the summed means, 0–100.
    pub percent: f64,
}

/// Mean of each pollutant for a city and its share of the total, as drawn
/// in the contribution pie. Empty when the city has no records.
pub fn pollutant_contribution(records: &[AirQualityRecord], city: &str) -> Vec<PollutantShare> {
    let selected: Vec<&AirQualityRecord> = records.iter().filter(|r| r.city == city).collect();
    if selected.is_empty() {
        return Vec::new();
    }

    let n = selected.len() as f64;
    let means: Vec<(Pollutant, f64)> = Pollutant::ALL
        .iter()
        .map(|p| (*p, selected.iter().map(|r| r.reading(*p)).sum::<f64>() / n))
        .collect();

    let total: f64 = means.iter().map(|(_, m)| m).sum();

    means
        .into_iter()
        .map(|(pollutant, mean)| PollutantShare {
            pollutant,
            mean,
            percent: if total > 0.0 { mean / total * 100.0 } else { 0.0 },
        })
        .collect()
}

// ============================================================================
// COMPARISON
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityTrend {
    pub city: String,
    pub series: Vec<TrendPoint>,
    pub summary: Option<AqiSummary>,
}

impl CityTrend {
    pub fn for_city(records: &[AirQualityRecord], city: &str) -> Self {
        CityTrend {
            city: city.to_string(),
            series: aqi_series(records, city),
            summary: summary(records, city),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityComparison {
    pub first: CityTrend,
    pub second: CityTrend,
}

impl CityComparison {
    /// Difference of mean AQI (first − second), when both cities have data.
    pub fn mean_difference(&self) -> Option<f64> {
        match (&self.first.summary, &self.second.summary) {
            (Some(a), Some(b)) => Some(a.mean - b.mean),
            _ => None,
        }
    }
}

pub fn compare(records: &[AirQualityRecord], first: &str, second: &str) -> CityComparison {
    CityComparison {
        first: CityTrend::for_city(records, first),
        second: CityTrend::for_city(records, second),
    }
}

/// Records of both cities together, for the comparison download.
pub fn comparison_records<'a>(
    records: &'a [AirQualityRecord],
    first: &str,
    second: &str,
) -> Vec<&'a AirQualityRecord> {
    let mut combined = city_records(records, first);
    combined.extend(city_records(records, second));
    combined
}

// ============================================================================
// HEATMAP
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapRow {
    pub city: String,
    /// Mean AQI for January..December; `None` where the city has no data.
    pub months: [Option<f64>; 12],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    pub rows: Vec<HeatmapRow>,
}

impl Heatmap {
    /// Highest cell value, for scaling colours.
    pub fn max_value(&self) -> Option<f64> {
        self.rows
            .iter()
            .flat_map(|row| row.months.iter().flatten())
            .copied()
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
    }
}

/// Mean AQI by city (rows, sorted) and calendar month (columns), pooled
/// across years.
pub fn monthly_heatmap(records: &[AirQualityRecord]) -> Heatmap {
    let mut sums: BTreeMap<&str, [(f64, usize); 12]> = BTreeMap::new();

    for record in records {
        let cells = sums.entry(record.city.as_str()).or_insert([(0.0, 0); 12]);
        let month = record.date.month0() as usize;
        cells[month].0 += record.aqi;
        cells[month].1 += 1;
    }

    let rows = sums
        .into_iter()
        .map(|(city, cells)| {
            let mut months = [None; 12];
            for (i, (sum, count)) in cells.iter().enumerate() {
                if *count > 0 {
                    months[i] = Some(sum / *count as f64);
                }
            }
            HeatmapRow {
                city: city.to_string(),
                months,
            }
        })
        .collect();

    Heatmap { rows }
}

// ============================================================================
// RANKING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRanking {
    pub city: String,
    pub mean_aqi: AqiValue,
    pub category: AqiCategory,
}

/// Cities by mean AQI, worst first. Equal means are ordered by city name.
pub fn top_polluted(records: &[AirQualityRecord], limit: usize) -> Vec<CityRanking> {
    let mut totals: HashMap<&str, (f64, usize)> = HashMap::new();
    for record in records {
        let entry = totals.entry(record.city.as_str()).or_insert((0.0, 0));
        entry.0 += record.aqi;
        entry.1 += 1;
    }

    let mut ranking: Vec<CityRanking> = totals
        .into_iter()
        .map(|(city, (sum, count))| {
            let mean_aqi = sum / count as f64;
            CityRanking {
                city: city.to_string(),
                mean_aqi,
                category: classify(mean_aqi),
            }
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.mean_aqi
            .total_cmp(&a.mean_aqi)
            .then_with(|| a.city.cmp(&b.city))
    });
    ranking.truncate(limit);
    ranking
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(city: &str, date: &str, aqi: f64) -> AirQualityRecord {
        AirQualityRecord {
            city: city.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            pm25: aqi / 2.0,
            pm10: aqi,
            no2: 20.0,
            co: 1.0,
            o3: 30.0,
            aqi,
        }
    }

    fn sample() -> Vec<AirQualityRecord> {
        vec![
            record("Mumbai", "2020-02-01", 90.0),
            record("Delhi", "2020-01-02", 400.0),
            record("Delhi", "2020-01-01", 300.0),
            record("Chennai", "2019-12-31", 60.0),
            record("Delhi", "2021-01-15", 350.0),
            record("Mumbai", "2020-01-01", 110.0),
            record("Aizawl", "2020-01-01", 100.0),
        ]
    }

    #[test]
    fn test_cities_sorted_and_unique() {
        assert_eq!(cities(&sample()), vec!["Aizawl", "Chennai", "Delhi", "Mumbai"]);
        assert!(cities(&[]).is_empty());
    }

    #[test]
    fn test_series_in_date_order() {
        let records = sample();
        let series = aqi_series(&records, "Delhi");

        let values: Vec<f64> = series.iter().map(|p| p.aqi).collect();
        assert_eq!(values, vec![300.0, 400.0, 350.0]);
        assert!(series.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn test_summary() {
        let s = summary(&sample(), "Delhi").unwrap();

        assert_eq!(s.count, 3);
        assert_eq!(s.mean, 350.0);
        assert_eq!(s.min, 300.0);
        assert_eq!(s.max, 400.0);
        assert_eq!(s.mean_category, AqiCategory::VeryPoor);

        assert!(summary(&sample(), "Atlantis").is_none());
    }

    #[test]
    fn test_pollutant_shares_sum_to_100() {
        let shares = pollutant_contribution(&sample(), "Mumbai");

        assert_eq!(shares.len(), 5);
        assert_eq!(shares[0].pollutant, Pollutant::Pm25);
        assert_eq!(shares[0].mean, 50.0);

        let total: f64 = shares.iter().map(|s| s.percent).sum();
        assert!((total - 100.0).abs() < 1e-9);

        assert!(pollutant_contribution(&sample(), "Atlantis").is_empty());
    }

    #[test]
    fn test_compare() {
        let records = sample();
        let comparison = compare(&records, "Delhi", "Mumbai");

        assert_eq!(comparison.first.city, "Delhi");
        assert_eq!(comparison.second.series.len(), 2);
        assert_eq!(comparison.mean_difference(), Some(250.0));

        let missing = compare(&records, "Delhi", "Atlantis");
        assert_eq!(missing.mean_difference(), None);

        assert_eq!(comparison_records(&records, "Delhi", "Mumbai").len(), 5);
    }

    #[test]
    fn test_heatmap_buckets_by_calendar_month() {
        let heatmap = monthly_heatmap(&sample());

        let cities: Vec<&str> = heatmap.rows.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities, vec!["Aizawl", "Chennai", "Delhi", "Mumbai"]);

        let delhi = &heatmap.rows[2];
        // January pooled across 2020 and 2021
        assert_eq!(delhi.months[0], Some(350.0));
        assert_eq!(delhi.months[1], None);

        let chennai = &heatmap.rows[1];
        assert_eq!(chennai.months[11], Some(60.0));

        assert_eq!(heatmap.max_value(), Some(350.0));
    }

    #[test]
    fn test_top_polluted_ordering_and_limit() {
        let top = top_polluted(&sample(), 3);

        let names: Vec<&str> = top.iter().map(|r| r.city.as_str()).collect();
        // Mumbai and Aizawl tie at 100; name order breaks the tie.
        assert_eq!(names, vec!["Delhi", "Aizawl", "Mumbai"]);
        assert_eq!(top[0].mean_aqi, 350.0);
        assert_eq!(top[0].category, AqiCategory::VeryPoor);
    }

    #[test]
    fn test_aggregates_stay_finite_with_nan_rows_in_csv() {
        let data = "\
City,Date,PM2.5,PM10,NO2,CO,O3,AQI
Delhi,2020-01-01,1,2,3,4,5,NaN
Delhi,2020-01-02,150,300,40,2,30,300
Mumbai,2020-01-01,50,90,20,1,30,100
";
        let records = crate::records::load_csv_from_reader(data.as_bytes()).unwrap();

        let delhi = summary(&records, "Delhi").unwrap();
        assert_eq!(delhi.count, 1);
        assert_eq!(delhi.mean, 300.0);
        assert_eq!(delhi.mean_category, AqiCategory::Poor);

        let top = top_polluted(&records, DEFAULT_TOP_LIMIT);
        assert!(top.iter().all(|r| r.mean_aqi.is_finite()));
        assert_eq!(top[0].city, "Delhi");
        assert_eq!(top[1].mean_aqi, 100.0);

        let heatmap = monthly_heatmap(&records);
        assert!(heatmap
            .rows
            .iter()
            .flat_map(|row| row.months.iter().flatten())
            .all(|v| v.is_finite()));
        assert_eq!(heatmap.max_value(), Some(300.0));
    }

    #[test]
    fn test_top_polluted_with_fewer_cities_than_limit() {
        assert_eq!(top_polluted(&sample(), DEFAULT_TOP_LIMIT).len(), 4);
        assert!(top_polluted(&[], DEFAULT_TOP_LIMIT).is_empty());
    }
}
