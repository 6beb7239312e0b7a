//! Row-level insert and select helpers. Inserts take `&StoreTxn` and enforce
//! the pre-checks the schema itself cannot express (id uniqueness, derived
//! vs. non-derived parentage); selects take `&Store` and run outside any
//! transaction.

use super::records::Axis;
use super::records::Graph;
use super::records::Histogram;
use super::records::InterLayout;
use super::records::Layout;
use super::records::Metric;
use super::records::PropertyCont;
use super::records::PropertyDisc;
use super::records::SlidingAverage;
use super::records::TestScore;
use super::records::WorseLayout;
use super::txn::StoreTxn;
use super::Store;
use crate::constants::Generator;
use crate::constants::GraphSize;
use crate::constants::LayoutKind;
use crate::ids::Id16;
use rand::RngCore;

impl<'a> StoreTxn<'a> {
    pub fn insert_graph(&self, g: &Graph) -> anyhow::Result<()> {
        if self.graph_exists(g.id)? {
            anyhow::bail!("graph {} already exists", g.id);
        }
        self.conn().execute(
            "INSERT INTO graphs (id, generator, file, nodes, edges, native, seed, fingerprint, poisoned)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                g.id.bytes(),
                g.generator as i32,
                g.file,
                g.nodes as i64,
                g.edges as i64,
                g.native,
                g.seed,
                g.fingerprint,
                g.poisoned,
            ],
        )?;
        Ok(())
    }

    fn graph_exists(&self, id: Id16) -> anyhow::Result<bool> {
        let n: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM graphs WHERE id = ?1",
            rusqlite::params![id.bytes()],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn poison_graph(&self, id: Id16) -> anyhow::Result<()> {
        self.conn()
            .execute("UPDATE graphs SET poisoned = 1 WHERE id = ?1", rusqlite::params![id.bytes()])?;
        Ok(())
    }

    pub fn set_layout_fingerprint(&self, id: Id16, fingerprint: &[u8]) -> anyhow::Result<()> {
        self.conn().execute(
            "UPDATE layouts SET fingerprint = ?1 WHERE id = ?2",
            rusqlite::params![fingerprint, id.bytes()],
        )?;
        Ok(())
    }

    pub fn insert_layout(&self, l: &Layout) -> anyhow::Result<()> {
        self.conn().execute(
            "INSERT INTO layouts (id, graph, layout, file, width, height, seed, fingerprint)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                l.id.bytes(),
                l.graph.bytes(),
                l.layout.map(|k| k as i32),
                l.file,
                l.width,
                l.height,
                l.seed,
                l.fingerprint,
            ],
        )?;
        Ok(())
    }

    pub fn insert_inter_layout(&self, row: &InterLayout) -> anyhow::Result<()> {
        self.conn().execute(
            "INSERT INTO inter_layouts (id, parent1st, parent2nd, method, rate) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                row.id.bytes(),
                row.parent_1st.bytes(),
                row.parent_2nd.bytes(),
                row.method as i32,
                row.rate,
            ],
        )?;
        Ok(())
    }

    pub fn insert_worse_layout(&self, row: &WorseLayout) -> anyhow::Result<()> {
        self.conn().execute(
            "INSERT INTO worse_layouts (id, parent, method, rate) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![row.id.bytes(), row.parent.bytes(), row.method as i32, row.rate],
        )?;
        Ok(())
    }

    pub fn insert_property_disc(&self, row: &PropertyDisc) -> anyhow::Result<i64> {
        self.conn().execute(
            "INSERT INTO properties_disc
             (layout, property, vicinity, size, minimum, maximum, mean, rms, entropy_intercept, entropy_slope)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                row.layout.bytes(),
                row.property as i32,
                row.vicinity.map(|v| v as i64),
                row.size as i64,
                row.minimum,
                row.maximum,
                row.mean,
                row.rms,
                row.entropy_intercept,
                row.entropy_slope,
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn insert_property_cont(&self, row: &PropertyCont) -> anyhow::Result<i64> {
        self.conn().execute(
            "INSERT INTO properties_cont (layout, property, vicinity, size, minimum, maximum, mean, rms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                row.layout.bytes(),
                row.property as i32,
                row.vicinity.map(|v| v as i64),
                row.size as i64,
                row.minimum,
                row.maximum,
                row.mean,
                row.rms,
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn insert_histogram(&self, row: &Histogram) -> anyhow::Result<()> {
        self.conn().execute(
            "INSERT INTO histograms (outer, bincount, binwidth, binning, entropy, file)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![row.outer, row.bincount as i64, row.binwidth, row.binning, row.entropy, row.file],
        )?;
        Ok(())
    }

    pub fn insert_sliding_average(&self, row: &SlidingAverage) -> anyhow::Result<()> {
        self.conn().execute(
            "INSERT INTO sliding_averages (outer, sigma, points, entropy, file) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![row.outer, row.sigma, row.points as i64, row.entropy, row.file],
        )?;
        Ok(())
    }

    pub fn insert_major_axis(&self, row: &Axis) -> anyhow::Result<()> {
        self.conn().execute(
            "INSERT INTO major_axis (layout, x, y) VALUES (?1, ?2, ?3)",
            rusqlite::params![row.layout.bytes(), row.x, row.y],
        )?;
        Ok(())
    }

    pub fn insert_minor_axis(&self, row: &Axis) -> anyhow::Result<()> {
        self.conn().execute(
            "INSERT INTO minor_axis (layout, x, y) VALUES (?1, ?2, ?3)",
            rusqlite::params![row.layout.bytes(), row.x, row.y],
        )?;
        Ok(())
    }

    pub fn insert_metric(&self, row: &Metric) -> anyhow::Result<()> {
        self.conn().execute(
            "INSERT INTO metrics (layout, metric, value) VALUES (?1, ?2, ?3)",
            rusqlite::params![row.layout.bytes(), row.metric as i32, row.value],
        )?;
        Ok(())
    }

    pub fn insert_test_score(&self, row: &TestScore) -> anyhow::Result<()> {
        self.conn().execute(
            "INSERT INTO test_scores (lhs, rhs, test, value) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![row.lhs.bytes(), row.rhs.bytes(), row.test as i32, row.value],
        )?;
        Ok(())
    }

    /// Delete one graph row. Used by the integrity checker's `--repair` path;
    /// does not cascade, so dependent layouts become newly-dangling foreign
    /// keys that a follow-up scan will report.
    pub fn delete_graph(&self, id: Id16) -> anyhow::Result<()> {
        self.conn().execute("DELETE FROM graphs WHERE id = ?1", rusqlite::params![id.bytes()])?;
        Ok(())
    }

    /// Delete one layout row. Does not cascade to `inter_layouts`/
    /// `worse_layouts`/`metrics`/etc rows that reference it.
    pub fn delete_layout(&self, id: Id16) -> anyhow::Result<()> {
        self.conn().execute("DELETE FROM layouts WHERE id = ?1", rusqlite::params![id.bytes()])?;
        Ok(())
    }

    pub fn delete_histogram(&self, outer: i64, bincount: u64) -> anyhow::Result<()> {
        self.conn().execute(
            "DELETE FROM histograms WHERE outer = ?1 AND bincount = ?2",
            rusqlite::params![outer, bincount as i64],
        )?;
        Ok(())
    }

    pub fn delete_sliding_average(&self, outer: i64, sigma: f64) -> anyhow::Result<()> {
        self.conn().execute(
            "DELETE FROM sliding_averages WHERE outer = ?1 AND sigma = ?2",
            rusqlite::params![outer, sigma],
        )?;
        Ok(())
    }

    pub fn record_tool_performance(&self, command: &str, millis: u64) -> anyhow::Result<()> {
        let recorded = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.conn().execute(
            "INSERT INTO tool_performance (command, millis, recorded) VALUES (?1, ?2, ?3)",
            rusqlite::params![command, millis as i64, recorded as i64],
        )?;
        Ok(())
    }
}

impl Store {
    /// Count non-derived graphs of `generator` classified into `size`.
    pub fn count_graphs(&self, generator: Generator, size: GraphSize) -> anyhow::Result<u64> {
        let (lo, hi) = (size.low_end() as i64, size.high_end().map(|h| h as i64));
        let n: i64 = match hi {
            Some(hi) => self.conn().query_row(
                "SELECT COUNT(*) FROM graphs WHERE generator = ?1 AND nodes >= ?2 AND nodes < ?3 AND poisoned = 0",
                rusqlite::params![generator as i32, lo, hi],
                |row| row.get(0),
            )?,
            None => self.conn().query_row(
                "SELECT COUNT(*) FROM graphs WHERE generator = ?1 AND nodes >= ?2 AND poisoned = 0",
                rusqlite::params![generator as i32, lo],
                |row| row.get(0),
            )?,
        };
        Ok(n as u64)
    }

    pub fn graph_by_id(&self, id: Id16) -> anyhow::Result<Option<Graph>> {
        self.conn()
            .query_row(
                "SELECT id, generator, file, nodes, edges, native, seed, fingerprint, poisoned
                 FROM graphs WHERE id = ?1",
                rusqlite::params![id.bytes()],
                row_to_graph,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                e => Err(e.into()),
            })
    }

    pub fn graphs_by_generator(&self, generator: Generator) -> anyhow::Result<Vec<Graph>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, generator, file, nodes, edges, native, seed, fingerprint, poisoned
             FROM graphs WHERE generator = ?1 AND poisoned = 0",
        )?;
        let rows = stmt.query_map(rusqlite::params![generator as i32], row_to_graph)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// All non-poisoned graphs, across every generator.
    pub fn all_graphs(&self) -> anyhow::Result<Vec<Graph>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, generator, file, nodes, edges, native, seed, fingerprint, poisoned
             FROM graphs WHERE poisoned = 0",
        )?;
        let rows = stmt.query_map([], row_to_graph)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Every graph row, poisoned or not. Used by the integrity checker, which
    /// must account for every row regardless of whether a stage still
    /// considers it live.
    pub fn all_graphs_any(&self) -> anyhow::Result<Vec<Graph>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, generator, file, nodes, edges, native, seed, fingerprint, poisoned FROM graphs",
        )?;
        let rows = stmt.query_map([], row_to_graph)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn inter_layout_rates(
        &self,
        parent_1st: Id16,
        parent_2nd: Id16,
        method: crate::constants::InterKind,
    ) -> anyhow::Result<Vec<f64>> {
        let mut stmt = self.conn().prepare(
            "SELECT rate FROM inter_layouts WHERE parent1st = ?1 AND parent2nd = ?2 AND method = ?3",
        )?;
        let rows = stmt.query_map(
            rusqlite::params![parent_1st.bytes(), parent_2nd.bytes(), method as i32],
            |row| row.get::<_, f64>(0),
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn worse_layout_rates(&self, parent: Id16, method: crate::constants::WorseKind) -> anyhow::Result<Vec<f64>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT rate FROM worse_layouts WHERE parent = ?1 AND method = ?2")?;
        let rows = stmt.query_map(rusqlite::params![parent.bytes(), method as i32], |row| row.get::<_, f64>(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn all_inter_layouts(&self) -> anyhow::Result<Vec<InterLayout>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, parent1st, parent2nd, method, rate FROM inter_layouts")?;
        let rows = stmt.query_map([], row_to_inter_layout)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn all_worse_layouts(&self) -> anyhow::Result<Vec<WorseLayout>> {
        let mut stmt = self.conn().prepare("SELECT id, parent, method, rate FROM worse_layouts")?;
        let rows = stmt.query_map([], row_to_worse_layout)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn non_derived_layouts_of_graph(&self, graph: Id16) -> anyhow::Result<Vec<Layout>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, graph, layout, file, width, height, seed, fingerprint
             FROM layouts WHERE graph = ?1 AND layout IS NOT NULL",
        )?;
        let rows = stmt.query_map(rusqlite::params![graph.bytes()], row_to_layout)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn layouts_of_graph(&self, graph: Id16) -> anyhow::Result<Vec<Layout>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, graph, layout, file, width, height, seed, fingerprint
             FROM layouts WHERE graph = ?1",
        )?;
        let rows = stmt.query_map(rusqlite::params![graph.bytes()], row_to_layout)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn layout_by_id(&self, id: Id16) -> anyhow::Result<Option<Layout>> {
        self.conn()
            .query_row(
                "SELECT id, graph, layout, file, width, height, seed, fingerprint FROM layouts WHERE id = ?1",
                rusqlite::params![id.bytes()],
                row_to_layout,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                e => Err(e.into()),
            })
    }

    pub fn layouts_missing_fingerprint(&self) -> anyhow::Result<Vec<Id16>> {
        let mut stmt = self.conn().prepare("SELECT id FROM layouts WHERE fingerprint IS NULL")?;
        let rows = stmt.query_map([], |row| {
            let bytes: Vec<u8> = row.get(0)?;
            Ok(Id16::from_bytes(&bytes))
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Every stored layout, derived or not.
    pub fn all_layouts(&self) -> anyhow::Result<Vec<Layout>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, graph, layout, file, width, height, seed, fingerprint FROM layouts")?;
        let rows = stmt.query_map([], row_to_layout)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn has_property_disc(&self, layout: Id16, property: crate::constants::Prop) -> anyhow::Result<bool> {
        let n: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM properties_disc WHERE layout = ?1 AND property = ?2",
            rusqlite::params![layout.bytes(), property as i32],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn has_property_cont(&self, layout: Id16, property: crate::constants::Prop) -> anyhow::Result<bool> {
        let n: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM properties_cont WHERE layout = ?1 AND property = ?2",
            rusqlite::params![layout.bytes(), property as i32],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn has_metric(&self, layout: Id16, metric: crate::constants::MetricKind) -> anyhow::Result<bool> {
        let n: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM metrics WHERE layout = ?1 AND metric = ?2",
            rusqlite::params![layout.bytes(), metric as i32],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn property_disc_row(
        &self,
        layout: Id16,
        property: crate::constants::Prop,
        vicinity: Option<u64>,
    ) -> anyhow::Result<Option<PropertyDisc>> {
        let sql = "SELECT id, layout, property, vicinity, size, minimum, maximum, mean, rms, entropy_intercept, entropy_slope
                    FROM properties_disc WHERE layout = ?1 AND property = ?2 AND vicinity IS ?3 LIMIT 1";
        self.conn()
            .query_row(
                sql,
                rusqlite::params![layout.bytes(), property as i32, vicinity.map(|v| v as i64)],
                row_to_property_disc,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                e => Err(e.into()),
            })
    }

    pub fn property_cont_row(
        &self,
        layout: Id16,
        property: crate::constants::Prop,
        vicinity: Option<u64>,
    ) -> anyhow::Result<Option<PropertyCont>> {
        let sql = "SELECT id, layout, property, vicinity, size, minimum, maximum, mean, rms
                    FROM properties_cont WHERE layout = ?1 AND property = ?2 AND vicinity IS ?3 LIMIT 1";
        self.conn()
            .query_row(
                sql,
                rusqlite::params![layout.bytes(), property as i32, vicinity.map(|v| v as i64)],
                row_to_property_cont,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                e => Err(e.into()),
            })
    }

    /// Every discrete-property row across every layout.
    pub fn all_properties_disc(&self) -> anyhow::Result<Vec<PropertyDisc>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, layout, property, vicinity, size, minimum, maximum, mean, rms, entropy_intercept, entropy_slope
             FROM properties_disc",
        )?;
        let rows = stmt.query_map([], row_to_property_disc)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Every continuous-property row across every layout.
    pub fn all_properties_cont(&self) -> anyhow::Result<Vec<PropertyCont>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, layout, property, vicinity, size, minimum, maximum, mean, rms FROM properties_cont")?;
        let rows = stmt.query_map([], row_to_property_cont)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn all_major_axes(&self) -> anyhow::Result<Vec<Axis>> {
        let mut stmt = self.conn().prepare("SELECT layout, x, y FROM major_axis")?;
        let rows = stmt.query_map([], row_to_axis)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn all_minor_axes(&self) -> anyhow::Result<Vec<Axis>> {
        let mut stmt = self.conn().prepare("SELECT layout, x, y FROM minor_axis")?;
        let rows = stmt.query_map([], row_to_axis)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Histogram rows for one outer `properties_disc` row, ascending by bincount.
    pub fn histograms_for_outer(&self, outer: i64) -> anyhow::Result<Vec<Histogram>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT outer, bincount, binwidth, binning, entropy, file FROM histograms WHERE outer = ?1 ORDER BY bincount")?;
        let rows = stmt.query_map(rusqlite::params![outer], row_to_histogram)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Every histogram row, regardless of outer property row.
    pub fn all_histograms(&self) -> anyhow::Result<Vec<Histogram>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT outer, bincount, binwidth, binning, entropy, file FROM histograms")?;
        let rows = stmt.query_map([], row_to_histogram)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Every sliding-average row, regardless of outer property row.
    pub fn all_sliding_averages(&self) -> anyhow::Result<Vec<SlidingAverage>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT outer, sigma, points, entropy, file FROM sliding_averages")?;
        let rows = stmt.query_map([], row_to_sliding_average)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Sliding-average rows for one outer `properties_cont` row, ascending by sigma.
    pub fn sliding_averages_for_outer(&self, outer: i64) -> anyhow::Result<Vec<SlidingAverage>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT outer, sigma, points, entropy, file FROM sliding_averages WHERE outer = ?1 ORDER BY sigma")?;
        let rows = stmt.query_map(rusqlite::params![outer], row_to_sliding_average)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn major_axis_for(&self, layout: Id16) -> anyhow::Result<Option<Axis>> {
        self.conn()
            .query_row(
                "SELECT layout, x, y FROM major_axis WHERE layout = ?1 LIMIT 1",
                rusqlite::params![layout.bytes()],
                row_to_axis,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                e => Err(e.into()),
            })
    }

    pub fn minor_axis_for(&self, layout: Id16) -> anyhow::Result<Option<Axis>> {
        self.conn()
            .query_row(
                "SELECT layout, x, y FROM minor_axis WHERE layout = ?1 LIMIT 1",
                rusqlite::params![layout.bytes()],
                row_to_axis,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                e => Err(e.into()),
            })
    }

    /// Every metric row recorded for one layout.
    pub fn metrics_for(&self, layout: Id16) -> anyhow::Result<Vec<Metric>> {
        let mut stmt = self.conn().prepare("SELECT layout, metric, value FROM metrics WHERE layout = ?1")?;
        let rows = stmt.query_map(rusqlite::params![layout.bytes()], row_to_metric)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Every metric row, across every layout.
    pub fn all_metrics(&self) -> anyhow::Result<Vec<Metric>> {
        let mut stmt = self.conn().prepare("SELECT layout, metric, value FROM metrics")?;
        let rows = stmt.query_map([], row_to_metric)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Every test-score row, across every pair.
    pub fn all_test_scores(&self) -> anyhow::Result<Vec<TestScore>> {
        let mut stmt = self.conn().prepare("SELECT lhs, rhs, test, value FROM test_scores")?;
        let rows = stmt.query_map([], row_to_test_score)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Whether a `TestScore` already exists for this exact (pair, kind), so
    /// the eval stage can skip re-scoring a pair it already scored.
    pub fn has_test_score(&self, lhs: Id16, rhs: Id16, test: crate::constants::TestKind) -> anyhow::Result<bool> {
        let n: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM test_scores WHERE lhs = ?1 AND rhs = ?2 AND test = ?3",
            rusqlite::params![lhs.bytes(), rhs.bytes(), test as i32],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    pub fn has_layout_kind(&self, graph: Id16, kind: LayoutKind) -> anyhow::Result<bool> {
        let n: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM layouts WHERE graph = ?1 AND layout = ?2",
            rusqlite::params![graph.bytes(), kind as i32],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }

    /// Resolve a hex id or fingerprint prefix to a unique row. Fails on an
    /// ambiguous or empty match.
    pub fn idmatch(&self, table: &str, prefix: &str, by_fingerprint: bool) -> anyhow::Result<Id16> {
        if !matches!(table, "graphs" | "layouts") {
            anyhow::bail!("idmatch: unknown table {table:?}");
        }
        let column = if by_fingerprint { "fingerprint" } else { "id" };
        let sql = format!("SELECT id FROM {table} WHERE hex({column}) LIKE ?1");
        let pattern = format!("{}%", prefix.to_ascii_uppercase());
        let mut stmt = self.conn().prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params![pattern])?;
        let mut found: Option<Id16> = None;
        while let Some(row) = rows.next()? {
            let bytes: Vec<u8> = row.get(0)?;
            let candidate = Id16::from_bytes(&bytes);
            if found.replace(candidate).is_some() {
                anyhow::bail!("prefix {prefix:?} matches more than one row in {table}");
            }
        }
        found.ok_or_else(|| anyhow::anyhow!("prefix {prefix:?} matches no row in {table}"))
    }

    /// Draw 16 random bytes until one is unused as a layout id, up to a small
    /// retry bound.
    pub fn allocate_unique_layout_id(&self, rng: &mut impl RngCore) -> anyhow::Result<Id16> {
        const ATTEMPTS: usize = 32;
        for _ in 0..ATTEMPTS {
            let candidate = Id16::random(rng);
            let n: i64 = self.conn().query_row(
                "SELECT COUNT(*) FROM layouts WHERE id = ?1",
                rusqlite::params![candidate.bytes()],
                |row| row.get(0),
            )?;
            if n == 0 {
                return Ok(candidate);
            }
        }
        anyhow::bail!("could not allocate a unique layout id after {ATTEMPTS} attempts")
    }
}

fn row_to_graph(row: &rusqlite::Row) -> rusqlite::Result<Graph> {
    let id: Vec<u8> = row.get(0)?;
    let generator: i32 = row.get(1)?;
    Ok(Graph {
        id: Id16::from_bytes(&id),
        generator: generator_from_i32(generator),
        file: row.get(2)?,
        nodes: row.get::<_, i64>(3)? as u64,
        edges: row.get::<_, i64>(4)? as u64,
        native: row.get(5)?,
        seed: row.get(6)?,
        fingerprint: row.get(7)?,
        poisoned: row.get(8)?,
    })
}

fn row_to_layout(row: &rusqlite::Row) -> rusqlite::Result<Layout> {
    let id: Vec<u8> = row.get(0)?;
    let graph: Vec<u8> = row.get(1)?;
    let layout: Option<i32> = row.get(2)?;
    Ok(Layout {
        id: Id16::from_bytes(&id),
        graph: Id16::from_bytes(&graph),
        layout: layout.map(layout_kind_from_i32),
        file: row.get(3)?,
        width: row.get(4)?,
        height: row.get(5)?,
        seed: row.get(6)?,
        fingerprint: row.get(7)?,
    })
}

fn generator_from_i32(value: i32) -> Generator {
    Generator::all()
        .iter()
        .copied()
        .chain(std::iter::once(Generator::Import))
        .find(|g| *g as i32 == value)
        .expect("generator discriminant read back from the store must be one we wrote")
}

fn layout_kind_from_i32(value: i32) -> LayoutKind {
    LayoutKind::all()
        .iter()
        .copied()
        .find(|k| *k as i32 == value)
        .expect("layout kind discriminant read back from the store must be one we wrote")
}

fn prop_from_i32(value: i32) -> crate::constants::Prop {
    crate::constants::Prop::all()
        .iter()
        .copied()
        .find(|p| *p as i32 == value)
        .expect("property discriminant read back from the store must be one we wrote")
}

fn metric_from_i32(value: i32) -> crate::constants::MetricKind {
    crate::constants::MetricKind::all()
        .iter()
        .copied()
        .find(|m| *m as i32 == value)
        .expect("metric discriminant read back from the store must be one we wrote")
}

fn row_to_property_disc(row: &rusqlite::Row) -> rusqlite::Result<PropertyDisc> {
    let layout: Vec<u8> = row.get(1)?;
    let property: i32 = row.get(2)?;
    let vicinity: Option<i64> = row.get(3)?;
    Ok(PropertyDisc {
        id: row.get(0)?,
        layout: Id16::from_bytes(&layout),
        property: prop_from_i32(property),
        vicinity: vicinity.map(|v| v as u64),
        size: row.get::<_, i64>(4)? as u64,
        minimum: row.get(5)?,
        maximum: row.get(6)?,
        mean: row.get(7)?,
        rms: row.get(8)?,
        entropy_intercept: row.get(9)?,
        entropy_slope: row.get(10)?,
    })
}

fn row_to_property_cont(row: &rusqlite::Row) -> rusqlite::Result<PropertyCont> {
    let layout: Vec<u8> = row.get(1)?;
    let property: i32 = row.get(2)?;
    let vicinity: Option<i64> = row.get(3)?;
    Ok(PropertyCont {
        id: row.get(0)?,
        layout: Id16::from_bytes(&layout),
        property: prop_from_i32(property),
        vicinity: vicinity.map(|v| v as u64),
        size: row.get::<_, i64>(4)? as u64,
        minimum: row.get(5)?,
        maximum: row.get(6)?,
        mean: row.get(7)?,
        rms: row.get(8)?,
    })
}

fn row_to_histogram(row: &rusqlite::Row) -> rusqlite::Result<Histogram> {
    Ok(Histogram {
        outer: row.get(0)?,
        bincount: row.get::<_, i64>(1)? as u64,
        binwidth: row.get(2)?,
        binning: row.get(3)?,
        entropy: row.get(4)?,
        file: row.get(5)?,
    })
}

fn row_to_sliding_average(row: &rusqlite::Row) -> rusqlite::Result<SlidingAverage> {
    Ok(SlidingAverage {
        outer: row.get(0)?,
        sigma: row.get(1)?,
        points: row.get::<_, i64>(2)? as u64,
        entropy: row.get(3)?,
        file: row.get(4)?,
    })
}

fn row_to_axis(row: &rusqlite::Row) -> rusqlite::Result<Axis> {
    let layout: Vec<u8> = row.get(0)?;
    Ok(Axis {
        layout: Id16::from_bytes(&layout),
        x: row.get(1)?,
        y: row.get(2)?,
    })
}

fn row_to_inter_layout(row: &rusqlite::Row) -> rusqlite::Result<InterLayout> {
    let id: Vec<u8> = row.get(0)?;
    let parent_1st: Vec<u8> = row.get(1)?;
    let parent_2nd: Vec<u8> = row.get(2)?;
    let method: i32 = row.get(3)?;
    Ok(InterLayout {
        id: Id16::from_bytes(&id),
        parent_1st: Id16::from_bytes(&parent_1st),
        parent_2nd: Id16::from_bytes(&parent_2nd),
        method: inter_kind_from_i32(method),
        rate: row.get(4)?,
    })
}

fn row_to_worse_layout(row: &rusqlite::Row) -> rusqlite::Result<WorseLayout> {
    let id: Vec<u8> = row.get(0)?;
    let parent: Vec<u8> = row.get(1)?;
    let method: i32 = row.get(2)?;
    Ok(WorseLayout {
        id: Id16::from_bytes(&id),
        parent: Id16::from_bytes(&parent),
        method: worse_kind_from_i32(method),
        rate: row.get(3)?,
    })
}

fn inter_kind_from_i32(value: i32) -> crate::constants::InterKind {
    crate::constants::InterKind::all()
        .iter()
        .copied()
        .find(|k| *k as i32 == value)
        .expect("inter kind discriminant read back from the store must be one we wrote")
}

fn worse_kind_from_i32(value: i32) -> crate::constants::WorseKind {
    crate::constants::WorseKind::all()
        .iter()
        .copied()
        .find(|k| *k as i32 == value)
        .expect("worse kind discriminant read back from the store must be one we wrote")
}

fn row_to_metric(row: &rusqlite::Row) -> rusqlite::Result<Metric> {
    let layout: Vec<u8> = row.get(0)?;
    let metric: i32 = row.get(1)?;
    Ok(Metric {
        layout: Id16::from_bytes(&layout),
        metric: metric_from_i32(metric),
        value: row.get(2)?,
    })
}

fn test_kind_from_i32(value: i32) -> crate::constants::TestKind {
    crate::constants::TestKind::all()
        .iter()
        .copied()
        .find(|t| *t as i32 == value)
        .expect("test kind discriminant read back from the store must be one we wrote")
}

fn row_to_test_score(row: &rusqlite::Row) -> rusqlite::Result<TestScore> {
    let lhs: Vec<u8> = row.get(0)?;
    let rhs: Vec<u8> = row.get(1)?;
    let test: i32 = row.get(2)?;
    Ok(TestScore {
        lhs: Id16::from_bytes(&lhs),
        rhs: Id16::from_bytes(&rhs),
        test: test_kind_from_i32(test),
        value: row.get(3)?,
    })
}
