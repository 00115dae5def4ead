//! Attribute importance for combat outcomes
//!
//! Joins each combat to both participants' attribute rows, engineers
//! first-minus-second difference features, and asks a ranking oracle which
//! differences mattered most for victory.

use crate::analysis::{FIRST_SLOT, JOIN_KEY, SECOND_SLOT, STAT_COLUMNS, WINNER};
use crate::data::table::Table;
use crate::oracle::RankingOracle;
use crate::{KaisenError, Result};
use std::collections::HashMap;

/// One engineered feature with its fitted importance score
#[derive(Debug, Clone, serde::Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Feature matrix, labels and the feature names they were built from
#[derive(Debug)]
pub struct TrainingData {
    pub features: Vec<String>,
    pub matrix: Vec<Vec<f64>>,
    pub labels: Vec<f64>,
}

/// Build the difference-feature matrix and binary labels.
///
/// Combats whose participants have no attribute row are dropped. A stat
/// missing on either side imputes to a zero difference rather than dropping
/// the row. The label is 1 exactly when the recorded winner equals the first
/// participant; everything else, including malformed winner ids, maps to 0.
pub fn assemble_training_data(combats: &Table, attributes: &Table) -> Result<TrainingData> {
    let key = attributes.require_column("attributes", JOIN_KEY)?;
    let first = combats.require_column("combat list", FIRST_SLOT)?;
    let second = combats.require_column("combat list", SECOND_SLOT)?;
    let winner = combats.require_column("combat list", WINNER)?;

    let present: Vec<(&str, usize)> = STAT_COLUMNS
        .iter()
        .filter_map(|stat| attributes.column(stat).map(|idx| (*stat, idx)))
        .collect();

    let mut by_id: HashMap<String, usize> = HashMap::new();
    for (row_idx, row) in attributes.rows().iter().enumerate() {
        if let Some(id) = row[key].key_string() {
            by_id.entry(id).or_insert(row_idx);
        }
    }

    let mut matrix = Vec::new();
    let mut labels = Vec::new();
    for row in combats.rows() {
        let first_id = match row[first].key_string() {
            Some(id) => id,
            None => continue,
        };
        let second_id = match row[second].key_string() {
            Some(id) => id,
            None => continue,
        };
        let (p1, p2) = match (by_id.get(&first_id), by_id.get(&second_id)) {
            (Some(&a), Some(&b)) => (&attributes.rows()[a], &attributes.rows()[b]),
            _ => continue,
        };

        let mut feature_row = Vec::with_capacity(present.len());
        for (_, stat_idx) in &present {
            let diff = match (p1[*stat_idx].as_f64(), p2[*stat_idx].as_f64()) {
                (Some(a), Some(b)) => a - b,
                _ => 0.0,
            };
            feature_row.push(diff);
        }
        matrix.push(feature_row);
        labels.push(if row[winner].key_string().as_deref() == Some(first_id.as_str()) {
            1.0
        } else {
            0.0
        });
    }

    if present.is_empty() || matrix.is_empty() {
        return Err(KaisenError::EmptyDataset(
            "no joined combat rows to train the ranking oracle on".to_string(),
        ));
    }

    Ok(TrainingData {
        features: present
            .iter()
            .map(|(stat, _)| format!("{}_diff", stat))
            .collect(),
        matrix,
        labels,
    })
}

/// Rank the engineered difference features by descending importance.
pub fn rank_features(
    combats: &Table,
    attributes: &Table,
    oracle: &dyn RankingOracle,
) -> Result<Vec<FeatureImportance>> {
    let data = assemble_training_data(combats, attributes)?;
    let importances = oracle.fit(&data.matrix, &data.labels)?;
    if importances.len() != data.features.len() {
        return Err(KaisenError::Oracle(format!(
            "oracle returned {} importances for {} features",
            importances.len(),
            data.features.len()
        )));
    }

    let mut ranked: Vec<FeatureImportance> = data
        .features
        .into_iter()
        .zip(importances)
        .map(|(feature, importance)| FeatureImportance {
            feature,
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(ranked)
}
