use super::traits::CsvTable;
use crate::core::profile::{NodeProfile, NormalizedPoint, Waypoint};
use crate::core::surface::grid::Sample;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Surface samples: `x,y,energy,probability`.
pub struct SampleTable;

impl CsvTable for SampleTable {
    type Record = Sample;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub x: f64,
    pub y: f64,
}

impl From<PositionRecord> for Point2<f64> {
    fn from(record: PositionRecord) -> Self {
        Point2::new(record.x, record.y)
    }
}

impl From<Point2<f64>> for PositionRecord {
    fn from(point: Point2<f64>) -> Self {
        Self {
            x: point.x,
            y: point.y,
        }
    }
}

/// Path positions: `x,y`.
pub struct PositionTable;

impl CsvTable for PositionTable {
    type Record = PositionRecord;
}

/// Per-node profile: `x,y,pmf_energy,external_energy,probability`.
pub struct ProfileTable;

impl CsvTable for ProfileTable {
    type Record = NodeProfile;
}

/// Arc-length normalized profile: `distance,energy,x,y`.
pub struct NormalizedProfileTable;

impl CsvTable for NormalizedProfileTable {
    type Record = NormalizedPoint;
}

/// Resampled waypoints: `x,y,energy,distance`.
pub struct WaypointTable;

impl CsvTable for WaypointTable {
    type Record = Waypoint;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::traits::IoError;
    use tempfile::tempdir;

    #[test]
    fn sample_table_reads_headed_csv_with_comments_and_whitespace() {
        let content = "\
# generated by umbrella sampling
x, y, energy, probability
0.0, 0.0, 1.5, 0.2
1.0, 0.0, 2.5, 0.8
";
        let samples = SampleTable::read_from(content.as_bytes()).unwrap();
        assert_eq!(
            samples,
            vec![
                Sample::new(0.0, 0.0, 1.5, 0.2),
                Sample::new(1.0, 0.0, 2.5, 0.8),
            ]
        );
    }

    #[test]
    fn sample_table_reports_the_failing_record() {
        let content = "x,y,energy,probability\n0,0,1,1\n1,zero,1,1\n";
        let result = SampleTable::read_from(content.as_bytes());
        assert!(matches!(result, Err(IoError::Csv { record: 2, .. })));
    }

    #[test]
    fn position_table_converts_to_points() {
        let records = PositionTable::read_from("x,y\n0.5,1.5\n".as_bytes()).unwrap();
        let points: Vec<Point2<f64>> = records.into_iter().map(Into::into).collect();
        assert_eq!(points, vec![Point2::new(0.5, 1.5)]);
    }

    #[test]
    fn profile_table_writes_header_and_rows() {
        let profile = vec![NodeProfile {
            x: 1.0,
            y: 2.0,
            pmf_energy: 3.5,
            external_energy: 0.0,
            probability: 0.25,
        }];
        let mut buffer = Vec::new();
        ProfileTable::write_to(&profile, &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("x,y,pmf_energy,external_energy,probability")
        );
        assert_eq!(lines.next(), Some("1.0,2.0,3.5,0.0,0.25"));
    }

    #[test]
    fn tables_round_trip_through_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("normalized.csv");
        let points = vec![
            NormalizedPoint {
                distance: 0.0,
                energy: 1.0,
                x: 0.0,
                y: 0.0,
            },
            NormalizedPoint {
                distance: 2.5,
                energy: -0.5,
                x: 1.0,
                y: 0.3,
            },
        ];

        NormalizedProfileTable::write_to_path(&points, &path).unwrap();
        let loaded = NormalizedProfileTable::read_from_path(&path).unwrap();
        assert_eq!(loaded, points);
    }

    #[test]
    fn read_from_path_propagates_missing_file() {
        let dir = tempdir().unwrap();
        let result = SampleTable::read_from_path(dir.path().join("missing.csv"));
        assert!(matches!(result, Err(IoError::Io(_))));
    }
}
