use crate::data::{CategoryKey, TableView};
use crate::error::PlotResult;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::BTreeSet;

/// How category keys are ordered in an aggregation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderPolicy {
    /// Order of first occurrence in table row order.
    FirstSeen,
    /// Natural ordering of the keys.
    #[default]
    Sorted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup {
    pub key: CategoryKey,
    pub aggregate: f64,
}

/// Count rows per distinct `group_by` value, or sum `value_column` per value.
pub fn aggregate(
    table: &TableView,
    group_by: &str,
    value_column: Option<&str>,
    order: OrderPolicy,
) -> PlotResult<Vec<CategoryGroup>> {
    let group_idx = table.require_column("group_by", group_by)?;
    let value_idx = match value_column {
        Some(v) => Some(table.require_numeric("value_column", v)?),
        None => None,
    };

    // IndexMap keeps first-seen order, sorted order is applied afterwards
    let mut totals: IndexMap<CategoryKey, f64> = IndexMap::new();
    for row in table.rows() {
        let amount = match value_idx {
            Some(idx) => row[idx].as_f64().unwrap_or(0.0),
            None => 1.0,
        };
        *totals.entry(row[group_idx].key()).or_insert(0.0) += amount;
    }

    if order == OrderPolicy::Sorted {
        totals.sort_keys();
    }

    Ok(totals
        .into_iter()
        .map(|(key, aggregate)| CategoryGroup { key, aggregate })
        .collect())
}

/// Sum `value_column` per (series, category) pair.
///
/// Every series carries one group per category, aligned to the shared sorted
/// category set; combinations with no rows aggregate to 0. Series keys are
/// sorted too.
pub fn aggregate_2d(
    table: &TableView,
    category_column: &str,
    series_column: &str,
    value_column: &str,
) -> PlotResult<IndexMap<CategoryKey, Vec<CategoryGroup>>> {
    let category_idx = table.require_column("category_column", category_column)?;
    let series_idx = table.require_column("series_column", series_column)?;
    let value_idx = table.require_numeric("value_column", value_column)?;

    let categories: BTreeSet<CategoryKey> =
        table.column_values(category_idx).map(|v| v.key()).collect();
    let series_keys: BTreeSet<CategoryKey> =
        table.column_values(series_idx).map(|v| v.key()).collect();

    let mut result: IndexMap<CategoryKey, IndexMap<CategoryKey, f64>> = series_keys
        .into_iter()
        .map(|s| {
            let zeros: IndexMap<CategoryKey, f64> =
                categories.iter().map(|c| (c.clone(), 0.0)).collect();
            (s, zeros)
        })
        .collect();

    for row in table.rows() {
        let amount = row[value_idx].as_f64().unwrap_or(0.0);
        if let Some(cell) = result
            .get_mut(&row[series_idx].key())
            .and_then(|cats| cats.get_mut(&row[category_idx].key()))
        {
            *cell += amount;
        }
    }

    Ok(result
        .into_iter()
        .map(|(series, cats)| {
            let groups = cats
                .into_iter()
                .map(|(key, aggregate)| CategoryGroup { key, aggregate })
                .collect();
            (series, groups)
        })
        .collect())
}

/// The shared category keys of an [`aggregate_2d`] result.
pub fn category_keys(groups: &IndexMap<CategoryKey, Vec<CategoryGroup>>) -> Vec<CategoryKey> {
    groups
        .values()
        .next()
        .map(|g| g.iter().map(|c| c.key.clone()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_reader::read_csv;

    fn animals() -> TableView {
        let csv = "animal\ndog\ncat\ndog\ndog\ndog\ncat\ncat\nhuman\ndog\ntiger\ntiger\ncoati\n";
        read_csv(csv.as_bytes()).unwrap()
    }

    fn processes() -> TableView {
        let csv = "year,state,processes\n\
                   2010,SP,10\n\
                   2010,RJ,4\n\
                   2011,SP,12\n\
                   2011,MG,3\n\
                   2010,SP,5\n";
        read_csv(csv.as_bytes()).unwrap()
    }

    fn as_pairs(groups: &[CategoryGroup]) -> Vec<(String, f64)> {
        groups.iter().map(|g| (g.key.to_string(), g.aggregate)).collect()
    }

    #[test]
    fn test_count_first_seen() {
        let groups = aggregate(&animals(), "animal", None, OrderPolicy::FirstSeen).unwrap();
        assert_eq!(
            as_pairs(&groups),
            vec![
                ("dog".to_string(), 5.0),
                ("cat".to_string(), 3.0),
                ("human".to_string(), 1.0),
                ("tiger".to_string(), 2.0),
                ("coati".to_string(), 1.0),
            ]
        );
    }

    #[test]
    fn test_count_sorted() {
        let groups = aggregate(&animals(), "animal", None, OrderPolicy::Sorted).unwrap();
        let keys: Vec<String> = groups.iter().map(|g| g.key.to_string()).collect();
        assert_eq!(keys, vec!["cat", "coati", "dog", "human", "tiger"]);
        let total: f64 = groups.iter().map(|g| g.aggregate).sum();
        assert_eq!(total, 12.0);
    }

    #[test]
    fn test_sum_per_group() {
        let groups = aggregate(&processes(), "state", Some("processes"), OrderPolicy::Sorted).unwrap();
        assert_eq!(
            as_pairs(&groups),
            vec![
                ("MG".to_string(), 3.0),
                ("RJ".to_string(), 4.0),
                ("SP".to_string(), 27.0),
            ]
        );
    }

    #[test]
    fn test_numeric_keys_sort_naturally() {
        let csv = "n\n10\n9\n100\n9\n";
        let table = read_csv(csv.as_bytes()).unwrap();
        let groups = aggregate(&table, "n", None, OrderPolicy::Sorted).unwrap();
        assert_eq!(
            as_pairs(&groups),
            vec![("9".to_string(), 2.0), ("10".to_string(), 1.0), ("100".to_string(), 1.0)]
        );
    }

    #[test]
    fn test_sum_of_text_column_fails() {
        let err = aggregate(&processes(), "year", Some("state"), OrderPolicy::Sorted).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("value_column"));
    }

    #[test]
    fn test_unknown_group_column_fails() {
        let err = aggregate(&animals(), "species", None, OrderPolicy::Sorted).unwrap_err();
        assert!(err.to_string().contains("group_by"));
    }

    #[test]
    fn test_aggregate_2d_aligns_categories() {
        let grouped = aggregate_2d(&processes(), "state", "year", "processes").unwrap();
        let series: Vec<String> = grouped.keys().map(|k| k.to_string()).collect();
        assert_eq!(series, vec!["2010", "2011"]);

        let cats: Vec<String> = category_keys(&grouped).iter().map(|k| k.to_string()).collect();
        assert_eq!(cats, vec!["MG", "RJ", "SP"]);

        let y2010 = &grouped[&CategoryKey::Integer(2010)];
        assert_eq!(
            y2010.iter().map(|g| g.aggregate).collect::<Vec<_>>(),
            vec![0.0, 4.0, 15.0]
        );
        let y2011 = &grouped[&CategoryKey::Integer(2011)];
        assert_eq!(
            y2011.iter().map(|g| g.aggregate).collect::<Vec<_>>(),
            vec![3.0, 0.0, 12.0]
        );
    }

    #[test]
    fn test_aggregate_2d_requires_numeric_values() {
        let err = aggregate_2d(&processes(), "state", "year", "state").unwrap_err();
        assert!(err.is_configuration());
    }
}
