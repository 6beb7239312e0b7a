//! The three raw pair sources: proper pairs between sibling non-derived
//! layouts, interpolation chains between two rated parents, and worsening
//! chains rooted at one positively-rated parent. Each source only needs read
//! access to the store; filtering, augmentation, and splitting happen in
//! `corpus::mod`.

use crate::constants::InterKind;
use crate::constants::LayoutKind;
use crate::constants::WorseKind;
use crate::ids::Id16;
use crate::store::Store;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct RawPair {
    pub graph: Id16,
    pub lhs: Id16,
    pub rhs: Id16,
    pub label: f64,
}

pub fn proper_pairs(store: &Store) -> anyhow::Result<Vec<RawPair>> {
    let mut pairs = Vec::new();
    for graph in store.all_graphs()? {
        let layouts = store.non_derived_layouts_of_graph(graph.id)?;
        for i in 0..layouts.len() {
            for j in (i + 1)..layouts.len() {
                let lhs = &layouts[i];
                let rhs = &layouts[j];
                let Some(rating_lhs) = lhs.layout.and_then(LayoutKind::rating) else {
                    continue;
                };
                let Some(rating_rhs) = rhs.layout.and_then(LayoutKind::rating) else {
                    continue;
                };
                pairs.push(RawPair {
                    graph: graph.id,
                    lhs: lhs.id,
                    rhs: rhs.id,
                    label: (rating_rhs - rating_lhs) / 2.0,
                });
            }
        }
    }
    Ok(pairs)
}

pub fn interpolation_chains(store: &Store) -> anyhow::Result<Vec<RawPair>> {
    let mut groups: BTreeMap<(Id16, Id16, InterKind), Vec<(f64, Id16)>> = BTreeMap::new();
    for row in store.all_inter_layouts()? {
        groups
            .entry((row.parent_1st, row.parent_2nd, row.method))
            .or_default()
            .push((row.rate, row.id));
    }
    let mut pairs = Vec::new();
    for ((parent_1st, parent_2nd, _method), mut points) in groups {
        let Some(p1) = store.layout_by_id(parent_1st)? else { continue };
        let Some(p2) = store.layout_by_id(parent_2nd)? else { continue };
        let Some(rating_1) = p1.layout.and_then(LayoutKind::rating) else {
            continue;
        };
        let Some(rating_2) = p2.layout.and_then(LayoutKind::rating) else {
            continue;
        };
        points.push((0.0, parent_1st));
        points.push((1.0, parent_2nd));
        points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        let rating_diff = rating_2 - rating_1;
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                let (rate_a, id_a) = points[i];
                let (rate_b, id_b) = points[j];
                pairs.push(RawPair {
                    graph: p1.graph,
                    lhs: id_a,
                    rhs: id_b,
                    label: (rate_b - rate_a) * rating_diff,
                });
            }
        }
    }
    Ok(pairs)
}

pub fn worsening_chains(store: &Store) -> anyhow::Result<Vec<RawPair>> {
    let mut groups: BTreeMap<(Id16, WorseKind), Vec<(f64, Id16)>> = BTreeMap::new();
    let mut max_rate_by_method: BTreeMap<WorseKind, f64> = BTreeMap::new();
    let rows = store.all_worse_layouts()?;
    for row in &rows {
        groups.entry((row.parent, row.method)).or_default().push((row.rate, row.id));
        let entry = max_rate_by_method.entry(row.method).or_insert(0.0);
        if row.rate > *entry {
            *entry = row.rate;
        }
    }
    let mut pairs = Vec::new();
    for ((parent, method), mut points) in groups {
        let Some(parent_row) = store.layout_by_id(parent)? else { continue };
        let Some(rating) = parent_row.layout.and_then(LayoutKind::rating) else {
            continue;
        };
        let max_rate = max_rate_by_method.get(&method).copied().unwrap_or(1.0).max(f64::MIN_POSITIVE);
        points = points.into_iter().map(|(rate, id)| (rate / max_rate, id)).collect();
        points.push((0.0, parent));
        points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        let effective_rating = if rating > 0.0 { rating } else { 0.0 };
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                let (rate_a, id_a) = points[i];
                let (rate_b, id_b) = points[j];
                pairs.push(RawPair {
                    graph: parent_row.graph,
                    lhs: id_a,
                    rhs: id_b,
                    label: (rate_a - rate_b) * effective_rating,
                });
            }
        }
    }
    Ok(pairs)
}
