// tests/common/mod.rs
//
// Shared fixture: a tiny deterministic classifier over the manual-form
// feature set, separable enough that high-spend/high-income customers score
// clearly above low-spend ones.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use gbdt::config::Config;
use gbdt::decision_tree::Data;
use gbdt::gradient_boost::GBDT;

use conversion_simulator::api::{self, AppState};
use conversion_simulator::config::AppConfig;
use conversion_simulator::model::{ModelArtifact, ModelGateway};
use conversion_simulator::schema::ModelSchema;

pub const FEATURES: [&str; 7] = [
    "Income",
    "Recency",
    "Kidhome",
    "Teenhome",
    "MntWines",
    "MntFruits",
    "MntGoldProds",
];

/// A clearly converting customer row (schema order).
pub fn buyer_row(i: usize) -> Vec<f32> {
    let i = i as f32;
    vec![
        70_000.0 + 500.0 * i,
        5.0 + i % 10.0,
        0.0,
        0.0,
        600.0 + 10.0 * (i % 20.0),
        60.0,
        150.0,
    ]
}

/// A clearly non-converting customer row (schema order).
pub fn non_buyer_row(i: usize) -> Vec<f32> {
    let i = i as f32;
    vec![
        15_000.0 + 300.0 * i,
        80.0 - i % 30.0,
        2.0,
        1.0,
        5.0 + i % 10.0,
        2.0,
        4.0,
    ]
}

/// Train the fixture model. Fully deterministic: fixed data, fixed config.
pub fn artifact() -> ModelArtifact {
    let mut cfg = Config::new();
    cfg.set_feature_size(FEATURES.len());
    cfg.set_max_depth(4);
    cfg.set_iterations(25);
    cfg.set_shrinkage(0.3);
    cfg.set_loss("LogLikelyhood");
    cfg.set_debug(false);
    cfg.set_min_leaf_size(1);

    let mut model = GBDT::new(&cfg);
    let mut training: Vec<Data> = Vec::new();
    for i in 0..40 {
        training.push(Data::new_training_data(buyer_row(i), 1.0, 1.0, None));
        training.push(Data::new_training_data(non_buyer_row(i), 1.0, -1.0, None));
    }
    model.fit(&mut training);

    ModelArtifact {
        schema: ModelSchema::new(FEATURES),
        model,
    }
}

pub fn gateway() -> Arc<ModelGateway> {
    Arc::new(ModelGateway::new(artifact()))
}

/// Build the same Router the binary uses (minus static assets and metrics).
pub fn test_router() -> Router {
    let state = AppState::new(gateway(), &AppConfig::default());
    api::router(state)
}

/// CSV with `buyers` clear converters followed by `others` clear
/// non-converters, plus a trailing text column the model ignores.
pub fn sample_csv(buyers: usize, others: usize) -> String {
    let mut out = String::from("Income,Recency,Kidhome,Teenhome,MntWines,MntFruits,MntGoldProds,Education\n");
    for i in 0..buyers {
        let r = buyer_row(i);
        out.push_str(&format!(
            "{},{},{},{},{},{},{},Graduation\n",
            r[0], r[1], r[2], r[3], r[4], r[5], r[6]
        ));
    }
    for i in 0..others {
        let r = non_buyer_row(i);
        out.push_str(&format!(
            "{},{},{},{},{},{},{},Basic\n",
            r[0], r[1], r[2], r[3], r[4], r[5], r[6]
        ));
    }
    out
}
