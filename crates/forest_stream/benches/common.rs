use std::time::Duration;

use criterion::{Criterion, Throughput};
use forest_stream::height::HeightOracle;

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// Rolling terrain used by every bench so oracle cost is not trivially zero.
pub fn rolling_terrain() -> HeightOracle {
    HeightOracle::heightfield(|x, z| Some((x * 0.13).sin() * 1.5 + (z * 0.07).cos() * 2.0))
}
