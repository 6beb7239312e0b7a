//! Row types mirroring the entities in the data model. Each carries the
//! columns named in its schema table; optional columns are `Option`.

use crate::constants::Generator;
use crate::constants::InterKind;
use crate::constants::LayoutKind;
use crate::constants::MetricKind;
use crate::constants::Prop;
use crate::constants::TestKind;
use crate::constants::WorseKind;
use crate::ids::Id16;

#[derive(Debug, Clone)]
pub struct Graph {
    pub id: Id16,
    pub generator: Generator,
    pub file: String,
    pub nodes: u64,
    pub edges: u64,
    pub native: bool,
    pub seed: Option<Vec<u8>>,
    pub fingerprint: Option<Vec<u8>>,
    pub poisoned: bool,
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub id: Id16,
    pub graph: Id16,
    pub layout: Option<LayoutKind>,
    pub file: String,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub seed: Option<Vec<u8>>,
    pub fingerprint: Option<Vec<u8>>,
}

impl Layout {
    pub fn is_derived(&self) -> bool {
        self.layout.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct InterLayout {
    pub id: Id16,
    pub parent_1st: Id16,
    pub parent_2nd: Id16,
    pub method: InterKind,
    pub rate: f64,
}

#[derive(Debug, Clone)]
pub struct WorseLayout {
    pub id: Id16,
    pub parent: Id16,
    pub method: WorseKind,
    pub rate: f64,
}

#[derive(Debug, Clone)]
pub struct PropertyDisc {
    pub id: i64,
    pub layout: Id16,
    pub property: Prop,
    pub vicinity: Option<u64>,
    pub size: u64,
    pub minimum: f64,
    pub maximum: f64,
    pub mean: Option<f64>,
    pub rms: f64,
    pub entropy_intercept: f64,
    pub entropy_slope: f64,
}

#[derive(Debug, Clone)]
pub struct PropertyCont {
    pub id: i64,
    pub layout: Id16,
    pub property: Prop,
    pub vicinity: Option<u64>,
    pub size: u64,
    pub minimum: f64,
    pub maximum: f64,
    pub mean: Option<f64>,
    pub rms: f64,
}

#[derive(Debug, Clone)]
pub struct Histogram {
    pub outer: i64,
    pub bincount: u64,
    pub binwidth: f64,
    pub binning: String,
    pub entropy: Option<f64>,
    pub file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SlidingAverage {
    pub outer: i64,
    pub sigma: f64,
    pub points: u64,
    pub entropy: Option<f64>,
    pub file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Axis {
    pub layout: Id16,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone)]
pub struct Metric {
    pub layout: Id16,
    pub metric: MetricKind,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct TestScore {
    pub lhs: Id16,
    pub rhs: Id16,
    pub test: TestKind,
    pub value: f64,
}
