// Lap-level breakdown of the segment states in a report

use std::{collections::BTreeMap, fmt};

use itertools::Itertools;

use crate::{telemetry::SegmentState, writer::ReportRow};

const SECTOR_NAMES: [&str; 3] = ["S1", "S2", "S3"];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateDistribution {
    pub total: usize,
    pub counts: BTreeMap<SegmentState, usize>,
}

impl StateDistribution {
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a ReportRow>) -> Self {
        let counts: BTreeMap<SegmentState, usize> =
            rows.into_iter().map(|row| row.state).counts().into_iter().collect();
        Self {
            total: counts.values().sum(),
            counts,
        }
    }

    pub fn count(&self, state: SegmentState) -> usize {
        self.counts.get(&state).copied().unwrap_or(0)
    }

    /// Share of samples in `state`, 0-100. An empty distribution is 0 everywhere.
    pub fn percentage(&self, state: SegmentState) -> f64 {
        if self.total == 0 {
            0.
        } else {
            self.count(state) as f64 * 100. / self.total as f64
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SectorSummary {
    pub name: &'static str,
    pub distribution: StateDistribution,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LapSummary {
    pub lap: StateDistribution,
    pub sectors: Vec<SectorSummary>,
}

impl LapSummary {
    pub fn from_rows(rows: &[ReportRow], sector_bounds: [f64; 2]) -> Self {
        let mut by_sector = rows
            .iter()
            .into_group_map_by(|row| sector_index(row.relative_distance, sector_bounds));

        let sectors = SECTOR_NAMES
            .into_iter()
            .enumerate()
            .map(|(index, name)| SectorSummary {
                name,
                distribution: StateDistribution::from_rows(
                    by_sector.remove(&index).unwrap_or_default(),
                ),
            })
            .collect();

        Self {
            lap: StateDistribution::from_rows(rows),
            sectors,
        }
    }
}

/// Sector of a sample: before the first bound, before the second, or after.
pub fn sector_index(relative_distance: f64, sector_bounds: [f64; 2]) -> usize {
    if relative_distance < sector_bounds[0] {
        0
    } else if relative_distance < sector_bounds[1] {
        1
    } else {
        2
    }
}

impl fmt::Display for LapSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<34}{:>9}", "STATE", "LAP")?;
        for sector in &self.sectors {
            write!(f, "{:>9}", sector.name)?;
        }
        writeln!(f)?;

        for state in SegmentState::DECISION_ORDER {
            write!(f, "{:<34}{:>8.1}%", state.label(), self.lap.percentage(state))?;
            for sector in &self.sectors {
                write!(f, "{:>8.1}%", sector.distribution.percentage(state))?;
            }
            writeln!(f)?;
        }

        write!(f, "{:<34}{:>9}", "SAMPLES", self.lap.total)?;
        for sector in &self.sectors {
            write!(f, "{:>9}", sector.distribution.total)?;
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(relative_distance: f64, state: SegmentState) -> ReportRow {
        ReportRow {
            relative_distance,
            state,
            speed: 200.,
            throttle: 50.,
            brake: false,
        }
    }

    #[test]
    fn test_lap_distribution() {
        let rows = vec![
            row(0.1, SegmentState::InCurve),
            row(0.2, SegmentState::InCurve),
            row(0.5, SegmentState::CurveExit),
            row(0.9, SegmentState::MediumLongStraight),
        ];
        let summary = LapSummary::from_rows(&rows, [0.33, 0.67]);

        assert_eq!(summary.lap.total, 4);
        assert_eq!(summary.lap.count(SegmentState::InCurve), 2);
        assert_eq!(summary.lap.count(SegmentState::ShortStraight), 0);
        assert_eq!(summary.lap.percentage(SegmentState::InCurve), 50.);
        assert_eq!(summary.lap.percentage(SegmentState::CurveExit), 25.);
    }

    #[test]
    fn test_sector_split() {
        let rows = vec![
            row(0.0, SegmentState::InCurve),
            row(0.33, SegmentState::CurveExit),
            row(0.669, SegmentState::ShortStraight),
            row(0.67, SegmentState::MediumLongStraight),
            row(1.0, SegmentState::MediumLongStraight),
        ];
        let summary = LapSummary::from_rows(&rows, [0.33, 0.67]);

        let names: Vec<&str> = summary.sectors.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["S1", "S2", "S3"]);
        assert_eq!(summary.sectors[0].distribution.total, 1);
        assert_eq!(summary.sectors[1].distribution.total, 2);
        assert_eq!(summary.sectors[2].distribution.total, 2);
        assert_eq!(
            summary.sectors[2]
                .distribution
                .percentage(SegmentState::MediumLongStraight),
            100.
        );
    }

    #[test]
    fn test_empty_report() {
        let summary = LapSummary::from_rows(&[], [0.33, 0.67]);
        assert_eq!(summary.lap.total, 0);
        assert_eq!(summary.lap.percentage(SegmentState::InCurve), 0.);
        assert!(summary.sectors.iter().all(|s| s.distribution.total == 0));
    }

    #[test]
    fn test_table_lists_every_state() {
        let rows = vec![row(0.1, SegmentState::InCurve), row(0.8, SegmentState::CurveExit)];
        let table = LapSummary::from_rows(&rows, [0.33, 0.67]).to_string();

        for state in SegmentState::DECISION_ORDER {
            assert!(table.contains(state.label()));
        }
        let in_curve = table.lines().find(|l| l.starts_with("IN A CURVE")).unwrap();
        assert!(in_curve.contains("50.0%"));
        assert!(in_curve.contains("100.0%"));
        assert!(table.lines().last().unwrap().starts_with("SAMPLES"));
    }
}
