// src/analyse/mod.rs
//! Read the cleaned London tables back out of the store and export the result
//! sets the borough charts are drawn from.

use anyhow::{Context, Result};
use std::{fs, path::Path};
use tracing::{info, instrument, warn};

use crate::store::{QueryResult, TableStore};

/// A named read-back query. `label` is the column holding area names.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisQuery {
    pub name: &'static str,
    pub sql: &'static str,
    pub label: &'static str,
}

pub const QUERIES: &[AnalysisQuery] = &[
    AnalysisQuery {
        name: "life_satisfaction",
        sql: "SELECT area_name, average_age, life_satisfaction_score \
              FROM london_borough_profiles ORDER BY average_age, life_satisfaction_score",
        label: "area_name",
    },
    AnalysisQuery {
        name: "bame_population",
        sql: "SELECT area_name, pctg_population_bame \
              FROM london_borough_profiles ORDER BY pctg_population_bame",
        label: "area_name",
    },
    AnalysisQuery {
        name: "crime",
        sql: "SELECT A.borough, A.major_category, SUM(A.value) AS total_count \
              FROM london_crime_by_lsoa AS A \
              INNER JOIN london_borough_profiles AS B ON A.borough = B.area_name \
              GROUP BY A.borough, A.major_category",
        label: "borough",
    },
    AnalysisQuery {
        name: "crime_amount",
        sql: "SELECT A.borough, SUM(A.value) AS total_count FROM london_crime_by_lsoa AS A \
              INNER JOIN london_borough_profiles AS B ON A.borough = B.area_name \
              GROUP BY A.borough ORDER BY total_count",
        label: "borough",
    },
    AnalysisQuery {
        name: "house_price",
        sql: "SELECT A.area, A.date, A.average_price AS mean_house_price \
              FROM housing_in_london_monthly_variables AS A \
              INNER JOIN london_borough_profiles AS B ON A.area = LOWER(B.area_name)",
        label: "area",
    },
    AnalysisQuery {
        name: "gross_annual_pay",
        sql: "SELECT area_name, gross_annual_pay FROM london_borough_profiles \
              ORDER BY gross_annual_pay",
        label: "area_name",
    },
    AnalysisQuery {
        name: "health",
        sql: "SELECT area_name, male_life_expectancy, female_life_expectancy, population_density, \
              prop_population_over_65 FROM london_borough_profiles",
        label: "area_name",
    },
    AnalysisQuery {
        name: "education",
        sql: "SELECT area_name, prop_working_age_no_qualif, prop_working_age_degree, \
              achvmt_5_or_more_gcse, gross_annual_pay, employment_rate \
              FROM london_borough_profiles ORDER BY prop_working_age_no_qualif",
        label: "area_name",
    },
    AnalysisQuery {
        name: "transport_env",
        sql: "SELECT area_name, number_of_cars, avg_public_transport_accessibility, \
              pctg_area_greenspace FROM london_borough_profiles ORDER BY number_of_cars",
        label: "area_name",
    },
    AnalysisQuery {
        name: "political_analysis",
        sql: "SELECT area_name, prop_seats_conservatives_2014_elect, \
              prop_seats_labour_2014_elect, prop_seats_lib_dems_2014_elect \
              FROM london_borough_profiles ORDER BY prop_seats_conservatives_2014_elect, \
              prop_seats_labour_2014_elect, prop_seats_lib_dems_2014_elect",
        label: "area_name",
    },
    AnalysisQuery {
        name: "political_turnout",
        sql: "SELECT area_name, turnout_2014_local_elect FROM london_borough_profiles \
              ORDER BY turnout_2014_local_elect DESC",
        label: "area_name",
    },
    AnalysisQuery {
        name: "wellbeing_scores",
        sql: "SELECT area_name, life_satisfaction_score, happiness_score, anxiety_score, \
              worthwhileness_score FROM london_borough_profiles",
        label: "area_name",
    },
];

const LABEL_WIDTH: usize = 12;

/// Shorten long area names to 12 characters plus `..`.
pub fn shorten_label(s: &str) -> String {
    if s.chars().count() > LABEL_WIDTH {
        let head: String = s.chars().take(LABEL_WIDTH).collect();
        format!("{}..", head)
    } else {
        s.to_string()
    }
}

/// Write a result set as CSV, shortening the `label` column. NULL cells are
/// written empty.
pub fn write_csv(result: &QueryResult, label: &str, path: &Path) -> Result<()> {
    let label_idx = result.column_index(label);
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("creating {:?}", path))?;
    wtr.write_record(&result.columns)?;
    for row in &result.rows {
        let record: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| match cell {
                Some(v) if Some(i) == label_idx => shorten_label(&v.to_string()),
                Some(v) => v.to_string(),
                None => String::new(),
            })
            .collect();
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Run every query in [`QUERIES`] and write `<name>.csv` files into
/// `out_dir`. Queries over tables that are not in the store are skipped.
/// Returns `(name, rows)` for each exported query.
#[instrument(level = "info", skip(store, out_dir), fields(out = %out_dir.display()))]
pub fn run_all(store: &TableStore, out_dir: &Path) -> Result<Vec<(String, usize)>> {
    run_queries(store, QUERIES, out_dir)
}

pub fn run_queries(
    store: &TableStore,
    queries: &[AnalysisQuery],
    out_dir: &Path,
) -> Result<Vec<(String, usize)>> {
    fs::create_dir_all(out_dir).with_context(|| format!("creating {:?}", out_dir))?;

    let mut done = Vec::with_capacity(queries.len());
    for q in queries {
        let result = match store.query(q.sql) {
            Ok(r) => r,
            Err(e) => {
                warn!(query = q.name, error = %e, "skipping query");
                continue;
            }
        };
        let path = out_dir.join(format!("{}.csv", q.name));
        write_csv(&result, q.label, &path)?;
        info!(query = q.name, rows = result.rows.len(), path = %path.display(), "exported");
        done.push((q.name.to_string(), result.rows.len()));
    }
    Ok(done)
}
