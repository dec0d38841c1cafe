use nalgebra::Matrix6;

use crate::constants::{COVARIANCE_KEYS, COVARIANCE_TRIANGLE_LEN};
use crate::oem_errors::OemError;
use crate::time::OemEpoch;
use crate::version::OemVersion;

/// 6x6 position/velocity covariance at one epoch.
///
/// The matrix is always symmetric; only its lower triangle is read and written.
#[derive(Debug, Clone, PartialEq)]
pub struct Covariance {
    pub epoch: OemEpoch,
    pub frame: Option<String>,
    pub matrix: Matrix6<f64>,
    pub version: OemVersion,
}

impl Covariance {
    /// Build from a full matrix. The matrix is symmetrized from its lower triangle.
    pub fn new(
        epoch: OemEpoch,
        frame: Option<String>,
        matrix: Matrix6<f64>,
        version: OemVersion,
    ) -> Self {
        let mut matrix = matrix;
        matrix.fill_upper_triangle_with_lower_triangle();
        Covariance {
            epoch,
            frame,
            matrix,
            version,
        }
    }

    /// Build from the 21 lower-triangle values, row by row.
    pub fn from_lower_triangle(
        epoch: OemEpoch,
        frame: Option<String>,
        values: &[f64],
        version: OemVersion,
    ) -> Result<Self, OemError> {
        if values.len() != COVARIANCE_TRIANGLE_LEN {
            return Err(OemError::Dimension(format!(
                "Covariance lower triangle must have {COVARIANCE_TRIANGLE_LEN} values, got {}",
                values.len()
            )));
        }
        let mut matrix = Matrix6::zeros();
        for (value, (_, row, col)) in values.iter().zip(COVARIANCE_KEYS.iter()) {
            matrix[(*row, *col)] = *value;
            matrix[(*col, *row)] = *value;
        }
        Ok(Covariance {
            epoch,
            frame,
            matrix,
            version,
        })
    }

    /// The 21 lower-triangle values, row by row.
    pub fn lower_triangle(&self) -> Vec<f64> {
        COVARIANCE_KEYS
            .iter()
            .map(|(_, row, col)| self.matrix[(*row, *col)])
            .collect()
    }
}

#[cfg(test)]
mod covariance_test {
    use super::*;
    use crate::time::Calendar;

    #[test]
    fn test_lower_triangle_is_symmetrized() {
        let epoch = OemEpoch::parse("2020-01-01T00:00:00", Calendar::Utc).unwrap();
        let values: Vec<f64> = (1..=21).map(f64::from).collect();
        let cov = Covariance::from_lower_triangle(epoch, None, &values, OemVersion::V2_0).unwrap();

        assert_eq!(cov.matrix, cov.matrix.transpose());
        // row 4 (X_DOT) starts at the 7th value
        assert_eq!(cov.matrix[(3, 0)], 7.0);
        assert_eq!(cov.matrix[(0, 3)], 7.0);
        assert_eq!(cov.matrix[(5, 5)], 21.0);
        assert_eq!(cov.lower_triangle(), values);

        assert!(matches!(
            Covariance::from_lower_triangle(epoch, None, &values[..20], OemVersion::V2_0),
            Err(OemError::Dimension(_))
        ));
    }
}
