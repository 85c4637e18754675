// src/metric.rs

use crate::error::MetricError;
use crate::model::TestResult;

/// Duration-weighted fault detection score of an ordering, in percent.
///
/// Area under the curve of "fraction of failures found" over "fraction of
/// total run time spent". A failing test contributes a trapezoid: half its
/// own step plus the area already reached before it.
pub fn score<'a, I>(ordering: I) -> Result<f64, MetricError>
where
    I: IntoIterator<Item = &'a TestResult>,
    I::IntoIter: Clone,
{
    let tests = ordering.into_iter();
    let total_fail = tests.clone().filter(|t| t.failed()).count();
    let total_time: f64 = tests.clone().map(|t| t.duration).sum();

    if total_fail == 0 {
        return Err(MetricError::NoFailures);
    }
    if total_time <= 0.0 {
        return Err(MetricError::ZeroDuration);
    }

    let total_fail = total_fail as f64;
    let mut found = 0u32;
    let mut area = 0.0;

    for test in tests {
        let weight = test.duration / total_time;
        let k = f64::from(found);
        if test.failed() {
            area += (2.0 * k + 1.0) / total_fail * weight / 2.0 * 100.0;
            found += 1;
        } else {
            area += k / total_fail * weight * 100.0;
        }
    }

    Ok(area)
}
