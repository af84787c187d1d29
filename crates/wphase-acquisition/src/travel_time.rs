//! Tabulated P-wave travel times.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use wphase_core::error::{Result, WphaseError};
use wphase_core::ports::TravelTimeModel;

const BUILTIN_DISTANCES: [f64; 21] = [
    0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0, 45.0, 50.0, 55.0, 60.0, 65.0, 70.0,
    75.0, 80.0, 85.0, 90.0, 95.0, 100.0,
];

const BUILTIN_DEPTHS: [f64; 4] = [0.0, 100.0, 300.0, 700.0];

// Coarse first-arriving P times in seconds, one row per distance
const BUILTIN_TIMES: [[f64; 4]; 21] = [
    [0.0, 12.5, 34.0, 72.0],
    [76.4, 82.5, 92.9, 111.7],
    [142.8, 142.6, 141.8, 141.3],
    [206.8, 200.2, 188.3, 168.6],
    [273.3, 260.3, 237.3, 198.3],
    [323.0, 310.0, 287.0, 248.0],
    [370.4, 357.4, 334.4, 295.4],
    [414.6, 401.6, 378.6, 339.6],
    [456.6, 443.6, 420.6, 381.6],
    [496.7, 483.7, 460.7, 421.7],
    [534.9, 521.9, 498.9, 459.9],
    [571.3, 558.3, 535.3, 496.3],
    [605.8, 592.8, 569.8, 530.8],
    [638.4, 625.4, 602.4, 563.4],
    [669.2, 656.2, 633.2, 594.2],
    [698.2, 685.2, 662.2, 623.2],
    [725.3, 712.3, 689.3, 650.3],
    [750.4, 737.4, 714.4, 675.4],
    [773.5, 760.5, 737.5, 698.5],
    [794.2, 781.2, 758.2, 719.2],
    [812.8, 799.8, 776.8, 737.8],
];

/// P travel time table over a distance x depth grid.
///
/// Lookups interpolate bilinearly. Depths outside the grid are clamped to its
/// edges; distances outside the grid are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableFile")]
pub struct TabulatedTravelTimes {
    /// Epicentral distances in degrees, strictly increasing
    distances: Vec<f64>,
    /// Source depths in km, strictly increasing
    depths: Vec<f64>,
    /// `times[i][j]` is the P time at `distances[i]` and `depths[j]`
    times: Vec<Vec<f64>>,
}

/// Unvalidated table as it appears on disk
#[derive(Deserialize)]
struct TableFile {
    distances: Vec<f64>,
    depths: Vec<f64>,
    times: Vec<Vec<f64>>,
}

impl TryFrom<TableFile> for TabulatedTravelTimes {
    type Error = WphaseError;

    fn try_from(file: TableFile) -> Result<Self> {
        Self::new(file.distances, file.depths, file.times)
    }
}

impl TabulatedTravelTimes {
    pub fn new(distances: Vec<f64>, depths: Vec<f64>, times: Vec<Vec<f64>>) -> Result<Self> {
        let table = Self { distances, depths, times };
        table.validate()?;
        Ok(table)
    }

    /// Coarse surface-to-deep-focus table covering 0 to 100 degrees
    pub fn builtin() -> Self {
        Self {
            distances: BUILTIN_DISTANCES.to_vec(),
            depths: BUILTIN_DEPTHS.to_vec(),
            times: BUILTIN_TIMES.iter().map(|row| row.to_vec()).collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: TableFile =
            serde_json::from_str(json).map_err(|e| WphaseError::Serialization(e.to_string()))?;
        Self::try_from(file)
    }

    /// Load a table from a JSON file with `distances`, `depths` and `times` keys
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let table = Self::from_json_str(&content)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            distances = table.distances.len(),
            depths = table.depths.len(),
            "Loaded travel time table"
        );
        Ok(table)
    }

    pub fn max_distance(&self) -> f64 {
        self.distances.last().copied().unwrap_or(0.0)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| WphaseError::TravelTime { reason: reason.to_string() };

        if self.distances.len() < 2 {
            return Err(invalid("table needs at least two distances"));
        }
        if self.depths.is_empty() {
            return Err(invalid("table needs at least one depth"));
        }
        if !strictly_increasing(&self.distances) || !strictly_increasing(&self.depths) {
            return Err(invalid("table axes must be strictly increasing"));
        }
        if self.times.len() != self.distances.len()
            || self.times.iter().any(|row| row.len() != self.depths.len())
        {
            return Err(invalid("table shape does not match its axes"));
        }
        if self.times.iter().flatten().any(|t| !t.is_finite()) {
            return Err(invalid("table contains non-finite times"));
        }
        Ok(())
    }
}

impl Default for TabulatedTravelTimes {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TravelTimeModel for TabulatedTravelTimes {
    fn p_time(&self, distance_deg: f64, depth_km: f64) -> Result<f64> {
        let min = self.distances[0];
        let max = self.max_distance();
        if !distance_deg.is_finite() || distance_deg < min || distance_deg > max {
            return Err(WphaseError::TravelTime {
                reason: format!("distance {:.3} deg outside table range [{}, {}]", distance_deg, min, max),
            });
        }
        if !depth_km.is_finite() {
            return Err(WphaseError::TravelTime { reason: "depth is not finite".to_string() });
        }

        let (i0, i1, fx) = bracket(&self.distances, distance_deg);
        let (j0, j1, fz) = bracket(&self.depths, depth_km);

        let t = &self.times;
        let near = t[i0][j0] + (t[i0][j1] - t[i0][j0]) * fz;
        let far = t[i1][j0] + (t[i1][j1] - t[i1][j0]) * fz;

        Ok(near + (far - near) * fx)
    }
}

fn strictly_increasing(axis: &[f64]) -> bool {
    axis.iter().all(|v| v.is_finite()) && axis.windows(2).all(|w| w[0] < w[1])
}

/// Neighbouring indices and fractional offset of `x` on `axis`, clamped to its ends
fn bracket(axis: &[f64], x: f64) -> (usize, usize, f64) {
    let last = axis.len() - 1;
    if x <= axis[0] {
        return (0, 0, 0.0);
    }
    if x >= axis[last] {
        return (last, last, 0.0);
    }
    let hi = axis.partition_point(|v| *v <= x);
    let lo = hi - 1;
    let frac = (x - axis[lo]) / (axis[hi] - axis[lo]);
    (lo, hi, frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn small_table() -> TabulatedTravelTimes {
        TabulatedTravelTimes::new(
            vec![0.0, 10.0, 20.0],
            vec![0.0, 100.0],
            vec![vec![0.0, 10.0], vec![100.0, 90.0], vec![200.0, 180.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_grid_nodes_are_exact() {
        let table = small_table();
        assert_eq!(table.p_time(10.0, 0.0).unwrap(), 100.0);
        assert_eq!(table.p_time(20.0, 100.0).unwrap(), 180.0);
    }

    #[test]
    fn test_bilinear_interpolation() {
        let table = small_table();
        // Halfway between 10 and 20 degrees and between 0 and 100 km
        let t = table.p_time(15.0, 50.0).unwrap();
        assert!((t - 142.5).abs() < 1e-9, "got {}", t);
    }

    #[test]
    fn test_depth_is_clamped() {
        let table = small_table();
        assert_eq!(table.p_time(10.0, 650.0).unwrap(), 90.0);
        assert_eq!(table.p_time(10.0, -5.0).unwrap(), 100.0);
    }

    #[test]
    fn test_distance_beyond_table_rejected() {
        let table = small_table();
        assert!(matches!(table.p_time(20.5, 0.0), Err(WphaseError::TravelTime { .. })));
        assert!(table.p_time(-1.0, 0.0).is_err());
        assert!(table.p_time(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert!(TabulatedTravelTimes::new(vec![0.0], vec![0.0], vec![vec![0.0]]).is_err());
        assert!(TabulatedTravelTimes::new(vec![0.0, 0.0], vec![0.0], vec![vec![0.0], vec![1.0]]).is_err());
        assert!(TabulatedTravelTimes::new(vec![0.0, 1.0], vec![0.0], vec![vec![0.0]]).is_err());
    }

    #[test]
    fn test_builtin_is_valid_and_increasing_with_distance() {
        let table = TabulatedTravelTimes::builtin();
        assert!(table.validate().is_ok());
        let mut previous = -1.0;
        for d in (5..=90).step_by(5) {
            let t = table.p_time(d as f64, 33.0).unwrap();
            assert!(t > previous);
            previous = t;
        }
        // Teleseismic P at 30 degrees arrives a little over six minutes after origin
        let t30 = table.p_time(30.0, 0.0).unwrap();
        assert!(t30 > 360.0 && t30 < 380.0);
    }

    #[test]
    fn test_load_from_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"distances": [0.0, 50.0], "depths": [0.0], "times": [[0.0], [500.0]]}}"#
        )
        .unwrap();

        let table = TabulatedTravelTimes::load(file.path()).unwrap();

        assert_eq!(table.p_time(25.0, 10.0).unwrap(), 250.0);
        assert_eq!(table.max_distance(), 50.0);
    }

    #[test]
    fn test_empty_table_does_not_deserialize() {
        let json = r#"{"distances": [], "depths": [], "times": []}"#;
        assert!(serde_json::from_str::<TabulatedTravelTimes>(json).is_err());
        assert!(matches!(
            TabulatedTravelTimes::from_json_str(json),
            Err(WphaseError::TravelTime { .. })
        ));
    }

    #[test]
    fn test_serialized_table_reads_back() {
        let json = serde_json::to_string(&small_table()).unwrap();
        let table: TabulatedTravelTimes = serde_json::from_str(&json).unwrap();
        assert_eq!(table, small_table());
    }

    #[test]
    fn test_invalid_json_is_serialization_error() {
        let err = TabulatedTravelTimes::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, WphaseError::Serialization(_)));
    }
}
