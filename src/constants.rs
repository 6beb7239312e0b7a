//! Fixed enumerations and numeric constants shared across the pipeline.
//!
//! Integer discriminants are pinned to the values used by the on-disk store and
//! by the external tool JSON contract; changing them invalidates persisted data.

use serde::Deserialize;
use serde::Serialize;

pub const GRAPH_FILE_SUFFIX: &str = ".xml.gz";
pub const LAYOUT_FILE_SUFFIX: &str = ".xml.gz";
pub const DATA_ROOT_TAG_FILE: &str = "DATADIR.TAG";
pub const DATA_ROOT_TAG_MAGIC: &str = "graphstudy-data-root-v1\n";

/// Histogram bin counts used for discrete-kernel feature extraction, 8..=512.
pub const FIXED_COUNT_BINS: [usize; 7] = [8, 16, 32, 64, 128, 256, 512];

/// Vicinity radii used for localized properties, 1..=512.
pub const VICINITIES: [usize; 10] = [1, 2, 4, 8, 16, 32, 64, 128, 256, 512];

/// Minimum |rank| required for a corpus pair to be retained.
pub const MIN_SIGNIFICANCE: f64 = 0.05;

/// Tolerance used when rounding interpolation/worsening rates for comparison.
pub const RATE_QUANTIZATION: f64 = 1000.0;

/// Fraction of non-finite feature entries above which training aborts.
pub const MAX_NONFINITE_FRACTION: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum Generator {
    Smtape = -23,
    Psadmit = -22,
    Grenoble = -21,
    Bcspwr = -20,
    Randdag = -12,
    North = -11,
    Rome = -10,
    Import = 0,
    Lindenmayer = 10,
    Quasi3d = 23,
    Quasi4d = 24,
    Quasi5d = 25,
    Quasi6d = 26,
    Grid = 30,
    Torus1 = 31,
    Torus2 = 32,
    Mosaic1 = 41,
    Mosaic2 = 42,
    Bottle = 50,
    Tree = 60,
    Randgeo = 70,
}

impl Generator {
    pub fn imported(self) -> bool {
        (self as i32) <= 0
    }

    pub fn all() -> &'static [Generator] {
        use Generator::*;
        &[
            Smtape, Psadmit, Grenoble, Bcspwr, Randdag, North, Rome, Lindenmayer, Quasi3d,
            Quasi4d, Quasi5d, Quasi6d, Grid, Torus1, Torus2, Mosaic1, Mosaic2, Bottle, Tree,
            Randgeo,
        ]
    }

    /// Parse the kebab-case name used in configuration files and tool JSON.
    pub fn parse(token: &str) -> anyhow::Result<Self> {
        crate::errors::parse_kebab_enum(Self::all().iter().copied(), token, "Generators")
    }

    pub fn name(self) -> &'static str {
        use Generator::*;
        match self {
            Smtape => "smtape",
            Psadmit => "psadmit",
            Grenoble => "grenoble",
            Bcspwr => "bcspwr",
            Randdag => "randdag",
            North => "north",
            Rome => "rome",
            Import => "import",
            Lindenmayer => "lindenmayer",
            Quasi3d => "quasi3d",
            Quasi4d => "quasi4d",
            Quasi5d => "quasi5d",
            Quasi6d => "quasi6d",
            Grid => "grid",
            Torus1 => "torus1",
            Torus2 => "torus2",
            Mosaic1 => "mosaic1",
            Mosaic2 => "mosaic2",
            Bottle => "bottle",
            Tree => "tree",
            Randgeo => "randgeo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum GraphSize {
    Tiny = 1,
    Small = 2,
    Medium = 3,
    Large = 4,
    Huge = 5,
}

struct SizeBounds {
    lower: u64,
    upper: Option<u64>,
}

impl GraphSize {
    pub fn all() -> &'static [GraphSize] {
        use GraphSize::*;
        &[Tiny, Small, Medium, Large, Huge]
    }

    fn bounds(self) -> SizeBounds {
        use GraphSize::*;
        match self {
            Tiny => SizeBounds { lower: 0, upper: Some(10) },
            Small => SizeBounds { lower: 10, upper: Some(100) },
            Medium => SizeBounds { lower: 100, upper: Some(1000) },
            Large => SizeBounds { lower: 1000, upper: Some(100_000) },
            Huge => SizeBounds { lower: 100_000, upper: None },
        }
    }

    pub fn low_end(self) -> u64 {
        self.bounds().lower
    }

    pub fn high_end(self) -> Option<u64> {
        self.bounds().upper
    }

    /// Target node count to request from a generator for this size bucket.
    pub fn target(self) -> u64 {
        let b = self.bounds();
        let upper = b.upper.unwrap_or(b.lower.saturating_mul(2).max(1));
        let mid = ((b.lower as f64).sqrt() + (upper as f64).sqrt()) / 2.0;
        (mid * mid).round() as u64
    }

    /// Classify a graph by its node count into the narrowest matching bucket.
    pub fn classify(nodes: u64) -> Self {
        for size in Self::all().iter().rev() {
            if nodes >= size.low_end() {
                return *size;
            }
        }
        GraphSize::Tiny
    }

    pub fn parse(token: &str) -> anyhow::Result<Self> {
        use GraphSize::*;
        match token.to_ascii_lowercase().as_str() {
            "tiny" => Ok(Tiny),
            "small" => Ok(Small),
            "medium" => Ok(Medium),
            "large" => Ok(Large),
            "huge" => Ok(Huge),
            other => anyhow::bail!("Enumerator 'GraphSizes' has no value {other:?}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum LayoutKind {
    Native = 0,
    Fmmm = 10,
    Stress = 11,
    DavidsonHarel = 12,
    SpringEmbedderKk = 13,
    PivotMds = 14,
    Sugiyama = 21,
    RandomUniform = -1,
    RandomNormal = -2,
    Phantom = -10,
}

impl LayoutKind {
    pub fn all() -> &'static [LayoutKind] {
        use LayoutKind::*;
        &[
            Native,
            Fmmm,
            Stress,
            DavidsonHarel,
            SpringEmbedderKk,
            PivotMds,
            Sugiyama,
            RandomUniform,
            RandomNormal,
            Phantom,
        ]
    }

    pub fn garbage(self) -> bool {
        (self as i32) < 0
    }

    pub fn proper(self) -> bool {
        !self.garbage()
    }

    /// Fixed quality rating used by the corpus assembler:
    /// canonical layouts -> +1, randomized/phantom -> -1, everything else unknown.
    pub fn rating(self) -> Option<f64> {
        use LayoutKind::*;
        match self {
            Native | Fmmm | Stress => Some(1.0),
            RandomUniform | RandomNormal | Phantom => Some(-1.0),
            _ => None,
        }
    }

    pub fn parse(token: &str) -> anyhow::Result<Self> {
        crate::errors::parse_kebab_enum(Self::all().iter().copied(), token, "Layouts")
    }

    pub fn name(self) -> &'static str {
        use LayoutKind::*;
        match self {
            Native => "native",
            Fmmm => "fmmm",
            Stress => "stress",
            DavidsonHarel => "davidson-harel",
            SpringEmbedderKk => "spring-embedder-kk",
            PivotMds => "pivot-mds",
            Sugiyama => "sugiyama",
            RandomUniform => "random-uniform",
            RandomNormal => "random-normal",
            Phantom => "phantom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum InterKind {
    Linear = 1,
    Xlinear = 2,
}

impl InterKind {
    pub fn all() -> &'static [InterKind] {
        &[InterKind::Linear, InterKind::Xlinear]
    }
    pub fn name(self) -> &'static str {
        match self {
            InterKind::Linear => "linear",
            InterKind::Xlinear => "xlinear",
        }
    }
    pub fn parse(token: &str) -> anyhow::Result<Self> {
        crate::errors::parse_kebab_enum(Self::all().iter().copied(), token, "LayInter")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum WorseKind {
    FlipNodes = 1,
    FlipEdges = 2,
    Movlsq = 3,
    Perturb = 4,
}

impl WorseKind {
    pub fn all() -> &'static [WorseKind] {
        use WorseKind::*;
        &[FlipNodes, FlipEdges, Movlsq, Perturb]
    }
    pub fn name(self) -> &'static str {
        use WorseKind::*;
        match self {
            FlipNodes => "flip-nodes",
            FlipEdges => "flip-edges",
            Movlsq => "movlsq",
            Perturb => "perturb",
        }
    }
    pub fn parse(token: &str) -> anyhow::Result<Self> {
        crate::errors::parse_kebab_enum(Self::all().iter().copied(), token, "LayWorse")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum Prop {
    RdfGlobal = 1,
    RdfLocal = 2,
    Angular = 3,
    EdgeLength = 4,
    Princomp1st = 5,
    Princomp2nd = 6,
    Tension = 7,
}

impl Prop {
    /// Canonical enumeration order used to derive the deterministic feature schema.
    pub fn all() -> &'static [Prop] {
        use Prop::*;
        &[
            RdfGlobal,
            RdfLocal,
            Angular,
            EdgeLength,
            Princomp1st,
            Princomp2nd,
            Tension,
        ]
    }

    pub fn localized(self) -> bool {
        matches!(self, Prop::RdfLocal)
    }

    /// Angular properties range over `[0, 2pi]`; everything else checked by
    /// the integrity scan is non-negative.
    pub fn is_angular(self) -> bool {
        matches!(self, Prop::Angular)
    }

    /// Principal-component properties additionally record a MajorAxis/MinorAxis row.
    pub fn is_principal_component(self) -> bool {
        matches!(self, Prop::Princomp1st | Prop::Princomp2nd)
    }

    pub fn name(self) -> &'static str {
        use Prop::*;
        match self {
            RdfGlobal => "rdf-global",
            RdfLocal => "rdf-local",
            Angular => "angular",
            EdgeLength => "edge-length",
            Princomp1st => "princomp-1st",
            Princomp2nd => "princomp-2nd",
            Tension => "tension",
        }
    }

    pub fn parse(token: &str) -> anyhow::Result<Self> {
        crate::errors::parse_kebab_enum(Self::all().iter().copied(), token, "Properties")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum Kernel {
    Raw = 0,
    Boxed = 1,
    Gaussian = 2,
}

impl Kernel {
    /// The two kernels extracted per property: discrete (`Boxed`, histogram)
    /// and continuous (`Gaussian`, sliding average).
    pub fn disc() -> Self {
        Kernel::Boxed
    }
    pub fn cont() -> Self {
        Kernel::Gaussian
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum MetricKind {
    StressKk = 10,
    StressFitNodesep = 11,
    StressFitScale = 12,
    CrossCount = 20,
    CrossResolution = 30,
    AngularResolution = 40,
    EdgeLengthStdev = 50,
}

impl MetricKind {
    pub fn all() -> &'static [MetricKind] {
        use MetricKind::*;
        &[
            StressKk,
            StressFitNodesep,
            StressFitScale,
            CrossCount,
            CrossResolution,
            AngularResolution,
            EdgeLengthStdev,
        ]
    }

    /// The four metrics that feed the Huang-weighted composite baseline.
    pub fn huang() -> &'static [MetricKind] {
        use MetricKind::*;
        &[CrossCount, CrossResolution, AngularResolution, EdgeLengthStdev]
    }

    pub fn name(self) -> &'static str {
        use MetricKind::*;
        match self {
            StressKk => "stress-kk",
            StressFitNodesep => "stress-fit-nodesep",
            StressFitScale => "stress-fit-scale",
            CrossCount => "cross-count",
            CrossResolution => "cross-resolution",
            AngularResolution => "angular-resolution",
            EdgeLengthStdev => "edge-length-stdev",
        }
    }

    pub fn parse(token: &str) -> anyhow::Result<Self> {
        crate::errors::parse_kebab_enum(Self::all().iter().copied(), token, "Metrics")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum TestKind {
    Expected = 0,
    NnForward = 1,
    NnReverse = 2,
    StressKk = 10,
    StressFitNodesep = 11,
    StressFitScale = 12,
    Huang = 20,
}

impl TestKind {
    pub fn all() -> &'static [TestKind] {
        use TestKind::*;
        &[
            Expected,
            NnForward,
            NnReverse,
            StressKk,
            StressFitNodesep,
            StressFitScale,
            Huang,
        ]
    }

    pub fn is_alternative(self) -> bool {
        (self as i32) >= 10
    }

    pub fn name(self) -> &'static str {
        use TestKind::*;
        match self {
            Expected => "expected",
            NnForward => "nn-forward",
            NnReverse => "nn-reverse",
            StressKk => "stress-kk",
            StressFitNodesep => "stress-fit-nodesep",
            StressFitScale => "stress-fit-scale",
            Huang => "huang",
        }
    }
}

/// Bad-log / stage keys, one per pipeline stage; `lay-inter` and `lay-worse`
/// are tracked as separate actions since they run independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum Action {
    Graphs = 10,
    Layouts = 20,
    LayWorse = 30,
    LayInter = 31,
    Properties = 40,
    Metrics = 45,
    Model = 50,
}

impl Action {
    pub fn all() -> &'static [Action] {
        use Action::*;
        &[Graphs, Layouts, LayWorse, LayInter, Properties, Metrics, Model]
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Graphs => "graphs",
            Action::Layouts => "layouts",
            Action::LayWorse => "lay-worse",
            Action::LayInter => "lay-inter",
            Action::Properties => "properties",
            Action::Metrics => "metrics",
            Action::Model => "model",
        }
    }

    pub fn parse(token: &str) -> anyhow::Result<Self> {
        crate::errors::parse_kebab_enum(Self::all().iter().copied(), token, "Action")
    }
}
