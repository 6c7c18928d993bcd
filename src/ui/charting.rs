use typeflow::time_series::TimeSeriesPoint;

/// X (seconds) and Y (WPM) upper bounds for the results chart
pub fn compute_chart_params(points: &[TimeSeriesPoint], fallback_secs: f64) -> (f64, f64) {
    let highest_wpm = points.iter().map(|p| p.wpm).fold(0.0, f64::max);

    let overall_duration = points
        .last()
        .map_or(fallback_secs, |p| p.t)
        .max(1.0);

    (overall_duration, highest_wpm.round().max(1.0))
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
