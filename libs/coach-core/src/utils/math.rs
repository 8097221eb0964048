//! Mathematical utility functions.

/// Handle lap distance wrap-around at the start/finish line.
///
/// When calculating distance deltas, a negative result means the span
/// crossed the start/finish line (e.g., 0.99 -> 0.01 = -0.98). This
/// corrects that to the actual distance traveled (0.02).
///
/// Assumes lap distance is normalized to 0.0-1.0.
#[inline]
pub fn wrap_distance(delta: f64) -> f64 {
    wrap_distance_in(delta, 1.0)
}

/// Wrap a distance delta for an arbitrary lap range (e.g., track length
/// in meters).
#[inline]
pub fn wrap_distance_in(delta: f64, lap_range: f64) -> f64 {
    if delta < 0.0 {
        delta + lap_range
    } else {
        delta
    }
}

/// Shortest distance between two normalized lap positions, going either
/// way around the track. Used when matching zones and corners between laps.
#[inline]
pub fn circular_delta(a: f64, b: f64) -> f64 {
    let direct = (a - b).abs();
    direct.min(1.0 - direct)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_distance_positive_passthrough() {
        assert_eq!(wrap_distance(0.1), 0.1);
        assert_eq!(wrap_distance(0.0), 0.0);
    }

    #[test]
    fn wrap_distance_corrects_crossing() {
        assert!((wrap_distance(0.01 - 0.99) - 0.02).abs() < 1e-10);
        assert!((wrap_distance(-0.5) - 0.5).abs() < 1e-10);
    }

    #[test]
    fn wrap_distance_in_meters() {
        assert!((wrap_distance_in(100.0 - 4900.0, 5000.0) - 200.0).abs() < 1e-10);
    }

    #[test]
    fn circular_delta_takes_shorter_arc() {
        assert!((circular_delta(0.98, 0.02) - 0.04).abs() < 1e-10);
        assert!((circular_delta(0.2, 0.5) - 0.3).abs() < 1e-10);
        assert_eq!(circular_delta(0.4, 0.4), 0.0);
    }
}
