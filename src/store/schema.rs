//! Pure schema definitions for the SQLite tables backing the artifact store.
//! No I/O here — just the DDL text, built at compile time with
//! `const_format::concatcp!` the way the teacher's Postgres schema module does.

use const_format::concatcp;

const FK: &str = "PRAGMA foreign_keys = ON;";

pub const SCHEMA: &str = concatcp!(
    FK,
    r#"
CREATE TABLE IF NOT EXISTS graphs (
    id          BLOB PRIMARY KEY,
    generator   INTEGER NOT NULL,
    file        TEXT NOT NULL,
    nodes       INTEGER NOT NULL,
    edges       INTEGER NOT NULL,
    native      INTEGER NOT NULL,
    seed        BLOB,
    fingerprint BLOB,
    poisoned    INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS layouts (
    id          BLOB PRIMARY KEY,
    graph       BLOB NOT NULL REFERENCES graphs(id),
    layout      INTEGER,
    file        TEXT NOT NULL,
    width       REAL,
    height      REAL,
    seed        BLOB,
    fingerprint BLOB
);

CREATE TABLE IF NOT EXISTS inter_layouts (
    id          BLOB PRIMARY KEY REFERENCES layouts(id),
    parent1st   BLOB NOT NULL REFERENCES layouts(id),
    parent2nd   BLOB NOT NULL REFERENCES layouts(id),
    method      INTEGER NOT NULL,
    rate        REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS worse_layouts (
    id          BLOB PRIMARY KEY REFERENCES layouts(id),
    parent      BLOB NOT NULL REFERENCES layouts(id),
    method      INTEGER NOT NULL,
    rate        REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS properties_disc (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    layout           BLOB NOT NULL REFERENCES layouts(id),
    property         INTEGER NOT NULL,
    vicinity         INTEGER,
    size             INTEGER NOT NULL,
    minimum          REAL NOT NULL,
    maximum          REAL NOT NULL,
    mean             REAL,
    rms              REAL NOT NULL,
    entropy_intercept REAL NOT NULL,
    entropy_slope     REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS properties_cont (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    layout    BLOB NOT NULL REFERENCES layouts(id),
    property  INTEGER NOT NULL,
    vicinity  INTEGER,
    size      INTEGER NOT NULL,
    minimum   REAL NOT NULL,
    maximum   REAL NOT NULL,
    mean      REAL,
    rms       REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS histograms (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    outer    INTEGER NOT NULL REFERENCES properties_disc(id),
    bincount INTEGER NOT NULL,
    binwidth REAL NOT NULL,
    binning  TEXT NOT NULL,
    entropy  REAL,
    file     TEXT
);

CREATE TABLE IF NOT EXISTS sliding_averages (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    outer   INTEGER NOT NULL REFERENCES properties_cont(id),
    sigma   REAL NOT NULL,
    points  INTEGER NOT NULL,
    entropy REAL,
    file    TEXT
);

CREATE TABLE IF NOT EXISTS major_axis (
    layout BLOB PRIMARY KEY REFERENCES layouts(id),
    x      REAL NOT NULL,
    y      REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS minor_axis (
    layout BLOB PRIMARY KEY REFERENCES layouts(id),
    x      REAL NOT NULL,
    y      REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS metrics (
    id     INTEGER PRIMARY KEY AUTOINCREMENT,
    layout BLOB NOT NULL REFERENCES layouts(id),
    metric INTEGER NOT NULL,
    value  REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS test_scores (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    lhs   BLOB NOT NULL REFERENCES layouts(id),
    rhs   BLOB NOT NULL REFERENCES layouts(id),
    test  INTEGER NOT NULL,
    value REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS tool_performance (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    command   TEXT NOT NULL,
    millis    INTEGER NOT NULL,
    recorded  INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_graphs_generator ON graphs(generator);
CREATE INDEX IF NOT EXISTS idx_layouts_graph ON layouts(graph);
CREATE INDEX IF NOT EXISTS idx_properties_disc_layout ON properties_disc(layout);
CREATE INDEX IF NOT EXISTS idx_properties_cont_layout ON properties_cont(layout);
CREATE INDEX IF NOT EXISTS idx_metrics_layout ON metrics(layout);
CREATE INDEX IF NOT EXISTS idx_test_scores_pair ON test_scores(lhs, rhs);
"#
);
