use super::error::DashboardError;

// ---------------------------------------------------------------------------
// Column – the fixed schema of the delay dataset
// ---------------------------------------------------------------------------

/// One column of the delay dataset.
///
/// Every column has a canonical snake_case name. The original SBB export uses
/// German headers, which are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    StopName,
    Latitude,
    Longitude,
    Date,
    Hour,
    OriginClass,
    TrainCategory,
    LineId,
    IsDelayed,
    DelayCategory,
}

impl Column {
    pub const ALL: [Column; 10] = [
        Column::StopName,
        Column::Latitude,
        Column::Longitude,
        Column::Date,
        Column::Hour,
        Column::OriginClass,
        Column::TrainCategory,
        Column::LineId,
        Column::IsDelayed,
        Column::DelayCategory,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::StopName => "stop_name",
            Column::Latitude => "latitude",
            Column::Longitude => "longitude",
            Column::Date => "date",
            Column::Hour => "hour",
            Column::OriginClass => "origin_class",
            Column::TrainCategory => "train_category",
            Column::LineId => "line_id",
            Column::IsDelayed => "is_delayed",
            Column::DelayCategory => "delay_category",
        }
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::StopName => &["Haltestelle"],
            Column::Latitude => &["lat"],
            Column::Longitude => &["long", "lon"],
            Column::Date => &["Datum"],
            Column::Hour => &["Stunde"],
            Column::OriginClass => &["Ursprung"],
            Column::TrainCategory => &["Zuggattung"],
            Column::LineId => &["Linie"],
            Column::IsDelayed => &["Ist verspätet"],
            Column::DelayCategory => &["Verspätungskategorie"],
        }
    }

    /// Whether a header names this column (canonical name or alias).
    pub fn matches(self, header: &str) -> bool {
        let header = header.trim();
        header == self.name() || self.aliases().iter().any(|a| *a == header)
    }

    /// Null cells are only legal in the delay category.
    pub fn is_nullable(self) -> bool {
        matches!(self, Column::DelayCategory)
    }
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

/// Position of every schema column within a source's header list,
/// indexed in [`Column::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex([usize; 10]);

impl ColumnIndex {
    pub fn get(&self, column: Column) -> usize {
        self.0[column as usize]
    }

    /// Source positions of all schema columns, ascending.
    pub fn sorted_positions(&self) -> Vec<usize> {
        let mut positions = self.0.to_vec();
        positions.sort_unstable();
        positions
    }
}

/// Locate every schema column in `headers`.
///
/// Extra columns are ignored. All missing columns are reported together.
pub fn resolve_columns<S: AsRef<str>>(headers: &[S]) -> Result<ColumnIndex, DashboardError> {
    let mut positions = [0usize; 10];
    let mut missing = Vec::new();

    for column in Column::ALL {
        match headers.iter().position(|h| column.matches(h.as_ref())) {
            Some(pos) => positions[column as usize] = pos,
            None => missing.push(column.name()),
        }
    }

    if !missing.is_empty() {
        return Err(DashboardError::SchemaMismatch(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )));
    }
    Ok(ColumnIndex(positions))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: [&str; 10] = [
        "stop_name",
        "latitude",
        "longitude",
        "date",
        "hour",
        "origin_class",
        "train_category",
        "line_id",
        "is_delayed",
        "delay_category",
    ];

    #[test]
    fn resolves_canonical_headers() {
        let index = resolve_columns(&CANONICAL).unwrap();
        for (i, column) in Column::ALL.iter().enumerate() {
            assert_eq!(index.get(*column), i);
        }
    }

    #[test]
    fn resolves_original_german_headers_in_any_order() {
        let headers = [
            "Linie",
            "Haltestelle",
            "Verspätungskategorie",
            "lat",
            "long",
            "Datum",
            "Stunde",
            "Ursprung",
            "Zuggattung",
            "Ist verspätet",
            "unused",
        ];
        let index = resolve_columns(&headers).unwrap();
        assert_eq!(index.get(Column::LineId), 0);
        assert_eq!(index.get(Column::StopName), 1);
        assert_eq!(index.get(Column::DelayCategory), 2);
        assert_eq!(index.get(Column::IsDelayed), 9);
        assert_eq!(index.sorted_positions(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn reports_every_missing_column() {
        let headers = ["stop_name", "latitude", "longitude", "date", "hour", "origin_class", "line_id"];
        match resolve_columns(&headers) {
            Err(DashboardError::SchemaMismatch(msg)) => {
                assert!(msg.contains("train_category"));
                assert!(msg.contains("is_delayed"));
                assert!(msg.contains("delay_category"));
                assert!(!msg.contains("stop_name"));
            }
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }
}
