// Fitness module organization
// color-distance primitives, byte-level SAD and the swappable metrics built on them

pub mod color;
pub mod metrics;
pub mod sad;

pub use color::{compare_color, compare_color_squared, compare_color_strict};
pub use metrics::{
    sanitize_score, DifferenceMetric, FitnessMetric, MetricKind, MetricSettings, PerceptualMetric,
    SquaredMetric, StrictMetric,
};
pub use sad::sad_rgba;
