use serde::{Deserialize, Serialize};

/// How epicentral distance in degrees is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DistanceModel {
    /// WGS84 geodesic length converted to degrees of mean-radius arc
    #[default]
    Ellipsoidal,
    /// Great-circle central angle on a sphere
    Spherical,
}
