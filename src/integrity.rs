//! Standalone integrity scan over the store and its file tree: referential
//! integrity, file presence/orphans, derivation-graph shape, property
//! ranges, and principal-axis normalization. `--repair` is limited to the
//! one mutation the scan can safely perform on its own: deleting a row
//! whose file has gone missing underneath it.

use crate::constants::Prop;
use crate::ids::Id16;
use crate::store::Store;
use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use walkdir::WalkDir;

const ORTHONORMAL_TOLERANCE: f64 = 1e-3;
const ANGLE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone)]
pub enum RepairAction {
    DeleteGraph(Id16),
    DeleteLayout(Id16),
    DeleteHistogram { outer: i64, bincount: u64 },
    DeleteSlidingAverage { outer: i64, sigma: f64 },
}

#[derive(Debug, Clone)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
    pub repair: Option<RepairAction>,
}

#[derive(Debug, Default)]
pub struct Report {
    pub issues: Vec<Issue>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }
}

fn push(issues: &mut Vec<Issue>, kind: &'static str, detail: impl Into<String>) {
    issues.push(Issue { kind, detail: detail.into(), repair: None });
}

fn push_repairable(issues: &mut Vec<Issue>, kind: &'static str, detail: impl Into<String>, repair: RepairAction) {
    issues.push(Issue { kind, detail: detail.into(), repair: Some(repair) });
}

pub fn check(store: &Store) -> anyhow::Result<Report> {
    let mut issues = Vec::new();
    check_id_uniqueness(store, &mut issues)?;
    check_referential_integrity(store, &mut issues)?;
    check_file_presence(store, &mut issues)?;
    check_derivation_graph(store, &mut issues)?;
    check_property_ranges(store, &mut issues)?;
    check_principal_components(store, &mut issues)?;
    Ok(Report { issues })
}

fn check_id_uniqueness(store: &Store, issues: &mut Vec<Issue>) -> anyhow::Result<()> {
    let graph_ids: BTreeSet<Id16> = store.all_graphs_any()?.iter().map(|g| g.id).collect();
    let mut seen_layout_ids = BTreeSet::new();
    for layout in store.all_layouts()? {
        if graph_ids.contains(&layout.id) {
            push(issues, "duplicate-id", format!("{} is both a graph id and a layout id", layout.id));
        }
        if !seen_layout_ids.insert(layout.id) {
            push(issues, "duplicate-id", format!("layout id {} appears more than once", layout.id));
        }
    }
    Ok(())
}

fn check_referential_integrity(store: &Store, issues: &mut Vec<Issue>) -> anyhow::Result<()> {
    let graph_ids: BTreeSet<Id16> = store.all_graphs_any()?.iter().map(|g| g.id).collect();
    let layouts = store.all_layouts()?;
    let layout_ids: BTreeSet<Id16> = layouts.iter().map(|l| l.id).collect();

    for layout in &layouts {
        if !graph_ids.contains(&layout.graph) {
            push(issues, "dangling-foreign-key", format!("layout {} references missing graph {}", layout.id, layout.graph));
        }
    }
    for row in store.all_inter_layouts()? {
        if !layout_ids.contains(&row.parent_1st) {
            push(issues, "dangling-foreign-key", format!("inter_layout {} references missing parent1st {}", row.id, row.parent_1st));
        }
        if !layout_ids.contains(&row.parent_2nd) {
            push(issues, "dangling-foreign-key", format!("inter_layout {} references missing parent2nd {}", row.id, row.parent_2nd));
        }
    }
    for row in store.all_worse_layouts()? {
        if !layout_ids.contains(&row.parent) {
            push(issues, "dangling-foreign-key", format!("worse_layout {} references missing parent {}", row.id, row.parent));
        }
    }
    for row in store.all_properties_disc()? {
        if !layout_ids.contains(&row.layout) {
            push(issues, "dangling-foreign-key", format!("properties_disc row {} references missing layout {}", row.id, row.layout));
        }
    }
    for row in store.all_properties_cont()? {
        if !layout_ids.contains(&row.layout) {
            push(issues, "dangling-foreign-key", format!("properties_cont row {} references missing layout {}", row.id, row.layout));
        }
    }
    for row in store.all_metrics()? {
        if !layout_ids.contains(&row.layout) {
            push(issues, "dangling-foreign-key", format!("metric row references missing layout {}", row.layout));
        }
    }
    for row in store.all_test_scores()? {
        if !layout_ids.contains(&row.lhs) {
            push(issues, "dangling-foreign-key", format!("test_score references missing lhs layout {}", row.lhs));
        }
        if !layout_ids.contains(&row.rhs) {
            push(issues, "dangling-foreign-key", format!("test_score references missing rhs layout {}", row.rhs));
        }
    }
    for row in store.all_major_axes()? {
        if !layout_ids.contains(&row.layout) {
            push(issues, "dangling-foreign-key", format!("major_axis references missing layout {}", row.layout));
        }
    }
    for row in store.all_minor_axes()? {
        if !layout_ids.contains(&row.layout) {
            push(issues, "dangling-foreign-key", format!("minor_axis references missing layout {}", row.layout));
        }
    }
    Ok(())
}

fn file_exists_nonempty(root: &Path, relative: &str) -> bool {
    let path = root.join(relative);
    std::fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false)
}

/// For every `file` column, check the file exists and is non-empty. Each
/// issue carries the `RepairAction` that `repair` will apply: deleting the
/// graph/layout row outright, or just the histogram/sliding-average inner
/// row.
fn check_file_presence(store: &Store, issues: &mut Vec<Issue>) -> anyhow::Result<()> {
    for graph in store.all_graphs_any()? {
        if !file_exists_nonempty(&store.root, &graph.file) {
            push_repairable(
                issues,
                "dangling-file-reference",
                format!("graph {} file {} is missing", graph.id, graph.file),
                RepairAction::DeleteGraph(graph.id),
            );
        }
    }
    for layout in store.all_layouts()? {
        if !file_exists_nonempty(&store.root, &layout.file) {
            push_repairable(
                issues,
                "dangling-file-reference",
                format!("layout {} file {} is missing", layout.id, layout.file),
                RepairAction::DeleteLayout(layout.id),
            );
        }
    }
    for histogram in store.all_histograms()? {
        let Some(file) = &histogram.file else { continue };
        if !file_exists_nonempty(&store.root, file) {
            push_repairable(
                issues,
                "dangling-file-reference",
                format!("histogram (outer={}, bincount={}) file {} is missing", histogram.outer, histogram.bincount, file),
                RepairAction::DeleteHistogram { outer: histogram.outer, bincount: histogram.bincount },
            );
        }
    }
    for sliding in store.all_sliding_averages()? {
        let Some(file) = &sliding.file else { continue };
        if !file_exists_nonempty(&store.root, file) {
            push_repairable(
                issues,
                "dangling-file-reference",
                format!("sliding_average (outer={}, sigma={}) file {} is missing", sliding.outer, sliding.sigma, file),
                RepairAction::DeleteSlidingAverage { outer: sliding.outer, sigma: sliding.sigma },
            );
        }
    }

    check_orphan_files(store, issues)?;
    Ok(())
}

/// Walk the graphs/layouts/properties trees and flag any file that no row
/// references. Compares relative paths, the same form stored in `file`
/// columns.
fn check_orphan_files(store: &Store, issues: &mut Vec<Issue>) -> anyhow::Result<()> {
    let mut referenced: BTreeSet<PathBuf> = BTreeSet::new();
    for graph in store.all_graphs_any()? {
        referenced.insert(PathBuf::from(graph.file));
    }
    for layout in store.all_layouts()? {
        referenced.insert(PathBuf::from(layout.file));
    }
    for histogram in store.all_histograms()? {
        if let Some(file) = histogram.file {
            referenced.insert(PathBuf::from(file));
        }
    }
    for sliding in store.all_sliding_averages()? {
        if let Some(file) = sliding.file {
            referenced.insert(PathBuf::from(file));
        }
    }

    for tree in ["graphs", "layouts", "properties"] {
        let dir = store.root.join(tree);
        if !dir.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&dir).into_iter().filter_map(Result::ok).filter(|e| e.file_type().is_file()) {
            let Ok(relative) = entry.path().strip_prefix(&store.root) else { continue };
            if !referenced.contains(relative) {
                push(issues, "orphan-file", format!("{} is not referenced by any row", relative.display()));
            }
        }
    }
    Ok(())
}

/// Every derived layout must have exactly one parent record (inter xor
/// worse); every parent must itself be non-derived and share the child's
/// graph.
fn check_derivation_graph(store: &Store, issues: &mut Vec<Issue>) -> anyhow::Result<()> {
    let layouts = store.all_layouts()?;
    let by_id: std::collections::BTreeMap<Id16, &crate::store::Layout> = layouts.iter().map(|l| (l.id, l)).collect();
    let inter = store.all_inter_layouts()?;
    let worse = store.all_worse_layouts()?;
    let inter_ids: BTreeSet<Id16> = inter.iter().map(|r| r.id).collect();
    let worse_ids: BTreeSet<Id16> = worse.iter().map(|r| r.id).collect();

    for layout in &layouts {
        let has_inter = inter_ids.contains(&layout.id);
        let has_worse = worse_ids.contains(&layout.id);
        if layout.is_derived() {
            if has_inter == has_worse {
                push(
                    issues,
                    "derivation-violation",
                    format!(
                        "derived layout {} has {} parent records (expected exactly one)",
                        layout.id,
                        has_inter as u8 + has_worse as u8
                    ),
                );
            }
        } else if has_inter || has_worse {
            push(issues, "derivation-violation", format!("non-derived layout {} has a parent record", layout.id));
        }
    }

    for row in &inter {
        let Some(child) = by_id.get(&row.id) else { continue };
        for (label, parent_id) in [("parent1st", row.parent_1st), ("parent2nd", row.parent_2nd)] {
            let Some(parent) = by_id.get(&parent_id) else { continue };
            if parent.is_derived() {
                push(issues, "derivation-violation", format!("inter_layout {} {label} {} is itself derived", row.id, parent_id));
            }
            if parent.graph != child.graph {
                push(
                    issues,
                    "derivation-violation",
                    format!("inter_layout {} {label} {} belongs to a different graph", row.id, parent_id),
                );
            }
        }
    }
    for row in &worse {
        let Some(child) = by_id.get(&row.id) else { continue };
        let Some(parent) = by_id.get(&row.parent) else { continue };
        if parent.is_derived() {
            push(issues, "derivation-violation", format!("worse_layout {} parent {} is itself derived", row.id, row.parent));
        }
        if parent.graph != child.graph {
            push(issues, "derivation-violation", format!("worse_layout {} parent {} belongs to a different graph", row.id, row.parent));
        }
    }
    Ok(())
}

fn check_property_ranges(store: &Store, issues: &mut Vec<Issue>) -> anyhow::Result<()> {
    let angular_max = 2.0 * std::f64::consts::PI + ANGLE_EPSILON;
    let in_range = |prop: Prop, v: f64| if prop.is_angular() { (0.0..=angular_max).contains(&v) } else { v >= 0.0 };

    for row in store.all_properties_disc()? {
        for (label, value) in [("minimum", Some(row.minimum)), ("maximum", Some(row.maximum)), ("mean", row.mean), ("rms", Some(row.rms))] {
            let Some(value) = value else { continue };
            if value.is_finite() && !in_range(row.property, value) {
                push(
                    issues,
                    "property-range-violation",
                    format!("properties_disc {} {label}={value} out of range for {}", row.id, row.property.name()),
                );
            }
        }
    }
    for row in store.all_properties_cont()? {
        for (label, value) in [("minimum", Some(row.minimum)), ("maximum", Some(row.maximum)), ("mean", row.mean), ("rms", Some(row.rms))] {
            let Some(value) = value else { continue };
            if value.is_finite() && !in_range(row.property, value) {
                push(
                    issues,
                    "property-range-violation",
                    format!("properties_cont {} {label}={value} out of range for {}", row.id, row.property.name()),
                );
            }
        }
    }
    Ok(())
}

fn check_principal_components(store: &Store, issues: &mut Vec<Issue>) -> anyhow::Result<()> {
    let major: std::collections::BTreeMap<Id16, crate::store::Axis> =
        store.all_major_axes()?.into_iter().map(|a| (a.layout, a)).collect();
    let minor: std::collections::BTreeMap<Id16, crate::store::Axis> =
        store.all_minor_axes()?.into_iter().map(|a| (a.layout, a)).collect();

    for (layout, axis) in &major {
        let norm = (axis.x * axis.x + axis.y * axis.y).sqrt();
        if (norm - 1.0).abs() > ORTHONORMAL_TOLERANCE {
            push(issues, "axis-violation", format!("major axis of {layout} has norm {norm}, expected 1"));
        }
    }
    for (layout, axis) in &minor {
        let norm = (axis.x * axis.x + axis.y * axis.y).sqrt();
        if (norm - 1.0).abs() > ORTHONORMAL_TOLERANCE {
            push(issues, "axis-violation", format!("minor axis of {layout} has norm {norm}, expected 1"));
        }
    }
    for (layout, a) in &major {
        let Some(b) = minor.get(layout) else { continue };
        let dot = a.x * b.x + a.y * b.y;
        if dot.abs() > ORTHONORMAL_TOLERANCE {
            push(issues, "axis-violation", format!("major/minor axes of {layout} are not orthogonal (dot={dot})"));
        }
    }
    Ok(())
}

/// Apply every issue's `RepairAction`, if it has one. Returns the number of
/// rows removed.
pub fn repair(store: &mut Store, report: &Report) -> anyhow::Result<usize> {
    let mut removed = 0;
    for issue in &report.issues {
        let Some(action) = &issue.repair else { continue };
        let txn = store.begin()?;
        match action {
            RepairAction::DeleteGraph(id) => txn.delete_graph(*id)?,
            RepairAction::DeleteLayout(id) => txn.delete_layout(*id)?,
            RepairAction::DeleteHistogram { outer, bincount } => txn.delete_histogram(*outer, *bincount)?,
            RepairAction::DeleteSlidingAverage { outer, sigma } => txn.delete_sliding_average(*outer, *sigma)?,
        }
        txn.commit()?;
        removed += 1;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Generator;
    use crate::constants::LayoutKind;
    use crate::store::Graph;
    use crate::store::Layout;

    fn sample_graph(id: Id16, file: &str) -> Graph {
        Graph {
            id,
            generator: Generator::Rome,
            file: file.to_string(),
            nodes: 10,
            edges: 12,
            native: true,
            seed: None,
            fingerprint: None,
            poisoned: false,
        }
    }

    #[test]
    fn clean_store_reports_no_issues() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path()).unwrap();
        let id = Id16::random(&mut rand::rng());
        let graph_file = "graphs/x-rome.xml.gz";
        std::fs::create_dir_all(dir.path().join("graphs")).unwrap();
        std::fs::write(dir.path().join(graph_file), b"data").unwrap();
        let txn = store.begin().unwrap();
        txn.insert_graph(&sample_graph(id, graph_file)).unwrap();
        txn.commit().unwrap();

        let report = check(&store).unwrap();
        assert!(report.is_clean(), "{:?}", report.issues);
    }

    #[test]
    fn missing_layout_file_is_reported_and_repaired() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path()).unwrap();
        let graph_id = Id16::random(&mut rand::rng());
        let graph_file = "graphs/x-rome.xml.gz";
        std::fs::create_dir_all(dir.path().join("graphs")).unwrap();
        std::fs::write(dir.path().join(graph_file), b"data").unwrap();
        let layout_id = Id16::random(&mut rand::rng());
        let layout_file = "layouts/missing/does-not-exist.xml.gz";
        let txn = store.begin().unwrap();
        txn.insert_graph(&sample_graph(graph_id, graph_file)).unwrap();
        txn.insert_layout(&Layout {
            id: layout_id,
            graph: graph_id,
            layout: Some(LayoutKind::Fmmm),
            file: layout_file.to_string(),
            width: None,
            height: None,
            seed: None,
            fingerprint: None,
        })
        .unwrap();
        txn.commit().unwrap();

        let report = check(&store).unwrap();
        assert_eq!(report.count("dangling-file-reference"), 1);

        let removed = repair(&mut store, &report).unwrap();
        assert_eq!(removed, 1);
        assert!(store.layout_by_id(layout_id).unwrap().is_none());
    }

    #[test]
    fn orphan_file_under_data_tree_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        std::fs::create_dir_all(dir.path().join("graphs")).unwrap();
        std::fs::write(dir.path().join("graphs/orphan-rome.xml.gz"), b"data").unwrap();

        let report = check(&store).unwrap();
        assert_eq!(report.count("orphan-file"), 1);
    }
}
