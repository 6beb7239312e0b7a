//! The content-addressed artifact store: a relational index (`rusqlite`,
//! bundled SQLite) over graphs/layouts/derivations/properties/metrics/test
//! scores, paired with a file-system tree rooted at a tag-marked data
//! directory. Schema DDL runs idempotently on every open.

mod files;
mod queries;
mod records;
mod schema;
mod txn;

pub use files::commit;
pub use files::graph_path;
pub use files::histogram_path;
pub use files::layout_path;
pub use files::sliding_average_path;
pub use records::Axis;
pub use records::Graph;
pub use records::Histogram;
pub use records::InterLayout;
pub use records::Layout;
pub use records::Metric;
pub use records::PropertyCont;
pub use records::PropertyDisc;
pub use records::SlidingAverage;
pub use records::TestScore;
pub use records::WorseLayout;
pub use txn::StoreTxn;

use std::path::Path;
use std::path::PathBuf;

pub struct Store {
    conn: rusqlite::Connection,
    pub root: PathBuf,
}

impl Store {
    pub fn open(root: &Path) -> anyhow::Result<Self> {
        files::ensure_data_root(root)?;
        let db_path = root.join("index.sqlite3");
        let conn = rusqlite::Connection::open(&db_path)
            .map_err(|e| anyhow::anyhow!("cannot open {}: {e}", db_path.display()))?;
        conn.execute_batch(schema::SCHEMA)
            .map_err(|e| anyhow::anyhow!("cannot initialize schema: {e}"))?;
        Ok(Self {
            conn,
            root: root.to_path_buf(),
        })
    }

    pub(crate) fn conn(&self) -> &rusqlite::Connection {
        &self.conn
    }

    pub fn begin(&mut self) -> anyhow::Result<StoreTxn<'_>> {
        let inner = self.conn.transaction().map_err(|e| anyhow::anyhow!("begin failed: {e}"))?;
        Ok(StoreTxn { inner })
    }

    /// Drop rows stage-by-stage in reverse dependency order, for the `clean`
    /// CLI operation, and remove the files those rows pointed at so nothing
    /// is left orphaned under `root`. `stage` names the innermost stage whose
    /// output (and everything that depends on it) should be removed; `None`
    /// clears everything including graphs. Mirrors the original's per-action
    /// `clean_*` family (`manager.py`'s `clean_graphs`/`clean_layouts`/
    /// `clean_inter`/`clean_worse`/`clean_properties`/`clean_model`), each of
    /// which pairs its `DROP TABLE`/`DELETE` with a matching `shutil.rmtree`
    /// or per-row `os.remove`.
    pub fn clean(&mut self, stage: Option<crate::constants::Action>) -> anyhow::Result<()> {
        use crate::constants::Action;

        // Derived layouts (inter/worse) are removed file-by-file, not by
        // directory, since their proper-layout siblings under the same graph
        // directory survive an `Action::LayInter`/`Action::LayWorse` clean.
        let derived_layout_files: Vec<PathBuf> = if matches!(stage, Some(Action::LayInter) | Some(Action::LayWorse)) {
            self.all_layouts()?
                .into_iter()
                .filter(|layout| layout.is_derived())
                .map(|layout| self.root.join(layout.file))
                .collect()
        } else {
            Vec::new()
        };

        let txn = self.begin()?;
        let statements: &[&str] = match stage {
            Some(Action::Model) => &["DELETE FROM test_scores"],
            Some(Action::Metrics) => &["DELETE FROM test_scores", "DELETE FROM metrics"],
            Some(Action::Properties) => &[
                "DELETE FROM test_scores",
                "DELETE FROM metrics",
                "DELETE FROM histograms",
                "DELETE FROM sliding_averages",
                "DELETE FROM properties_disc",
                "DELETE FROM properties_cont",
                "DELETE FROM major_axis",
                "DELETE FROM minor_axis",
            ],
            Some(Action::LayInter) | Some(Action::LayWorse) => &[
                "DELETE FROM test_scores",
                "DELETE FROM metrics",
                "DELETE FROM histograms",
                "DELETE FROM sliding_averages",
                "DELETE FROM properties_disc",
                "DELETE FROM properties_cont",
                "DELETE FROM major_axis",
                "DELETE FROM minor_axis",
                "DELETE FROM inter_layouts",
                "DELETE FROM worse_layouts",
                "DELETE FROM layouts WHERE layout IS NULL",
            ],
            Some(Action::Layouts) => &[
                "DELETE FROM test_scores",
                "DELETE FROM metrics",
                "DELETE FROM histograms",
                "DELETE FROM sliding_averages",
                "DELETE FROM properties_disc",
                "DELETE FROM properties_cont",
                "DELETE FROM major_axis",
                "DELETE FROM minor_axis",
                "DELETE FROM inter_layouts",
                "DELETE FROM worse_layouts",
                "DELETE FROM layouts",
            ],
            Some(Action::Graphs) | None => &[
                "DELETE FROM test_scores",
                "DELETE FROM metrics",
                "DELETE FROM histograms",
                "DELETE FROM sliding_averages",
                "DELETE FROM properties_disc",
                "DELETE FROM properties_cont",
                "DELETE FROM major_axis",
                "DELETE FROM minor_axis",
                "DELETE FROM inter_layouts",
                "DELETE FROM worse_layouts",
                "DELETE FROM layouts",
                "DELETE FROM graphs",
            ],
        };
        for sql in statements {
            txn.conn().execute(sql, [])?;
        }
        txn.commit()?;

        for file in &derived_layout_files {
            files::remove_file_if_exists(file)?;
        }
        match stage {
            Some(Action::Model) => files::remove_dir_if_exists(&files::model_dir(&self.root))?,
            Some(Action::Metrics) => {}
            Some(Action::Properties) | Some(Action::LayInter) | Some(Action::LayWorse) => {
                files::remove_dir_if_exists(&files::properties_dir(&self.root))?;
            }
            Some(Action::Layouts) => {
                files::remove_dir_if_exists(&files::properties_dir(&self.root))?;
                files::remove_dir_if_exists(&files::layouts_dir(&self.root))?;
            }
            Some(Action::Graphs) | None => {
                files::remove_dir_if_exists(&files::properties_dir(&self.root))?;
                files::remove_dir_if_exists(&files::layouts_dir(&self.root))?;
                files::remove_dir_if_exists(&files::graphs_dir(&self.root))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Generator;
    use crate::constants::LayoutKind;
    use crate::ids::Id16;

    fn sample_graph(id: Id16) -> Graph {
        Graph {
            id,
            generator: Generator::Rome,
            file: "graphs/x.xml.gz".into(),
            nodes: 42,
            edges: 80,
            native: true,
            seed: None,
            fingerprint: None,
            poisoned: false,
        }
    }

    #[test]
    fn inserts_and_reads_back_a_graph() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path()).unwrap();
        let id = Id16::random(&mut rand::rng());
        {
            let txn = store.begin().unwrap();
            txn.insert_graph(&sample_graph(id)).unwrap();
            txn.commit().unwrap();
        }
        let graphs = store.graphs_by_generator(Generator::Rome).unwrap();
        assert_eq!(graphs.len(), 1);
        assert_eq!(graphs[0].id, id);
    }

    #[test]
    fn rejects_duplicate_graph_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path()).unwrap();
        let id = Id16::random(&mut rand::rng());
        let txn = store.begin().unwrap();
        txn.insert_graph(&sample_graph(id)).unwrap();
        assert!(txn.insert_graph(&sample_graph(id)).is_err());
    }

    #[test]
    fn idmatch_resolves_an_unambiguous_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path()).unwrap();
        let id = Id16::random(&mut rand::rng());
        let txn = store.begin().unwrap();
        txn.insert_graph(&sample_graph(id)).unwrap();
        txn.commit().unwrap();
        let prefix = &id.to_string()[..4];
        assert_eq!(store.idmatch("graphs", prefix, false).unwrap(), id);
    }

    #[test]
    fn allocate_unique_layout_id_avoids_collisions() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path()).unwrap();
        let graph_id = Id16::random(&mut rand::rng());
        let layout_id = store.allocate_unique_layout_id(&mut rand::rng()).unwrap();
        let txn = store.begin().unwrap();
        txn.insert_graph(&sample_graph(graph_id)).unwrap();
        txn.insert_layout(&Layout {
            id: layout_id,
            graph: graph_id,
            layout: Some(LayoutKind::Fmmm),
            file: "layouts/x/y.xml.gz".into(),
            width: None,
            height: None,
            seed: None,
            fingerprint: None,
        })
        .unwrap();
        txn.commit().unwrap();
        let next = store.allocate_unique_layout_id(&mut rand::rng()).unwrap();
        assert_ne!(next, layout_id);
    }
}
