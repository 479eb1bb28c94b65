//! Loading the historical customer table from CSV.
//!
//! The header defines the feature column order: every feature field must be
//! present exactly once, the identifier is dropped and the label is split off.
//! Any other column is rejected.

use crate::dataset::DatasetError;
use crate::preprocessing::encoding::binary;
use crate::preprocessing::imputation::parse_monetary;
use crate::schema::{BinaryField, CustomerRecord, Field, ID_COLUMN, LABEL_COLUMN};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Deserialize)]
struct LabelRow {
    #[serde(rename = "Churn")]
    churn: String,
}

/// Row counts reported when a table is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSummary {
    pub rows: usize,
    pub churned: usize,
    pub retained: usize,
    /// `TotalCharges` values that will be replaced by the median.
    pub malformed_total_charges: usize,
}

/// Customer records with their churn labels, in file order.
#[derive(Debug, Clone)]
pub struct ChurnTable {
    columns: Vec<Field>,
    records: Vec<CustomerRecord>,
    labels: Vec<u8>,
}

fn header_columns(headers: &csv::StringRecord) -> Result<Vec<Field>, DatasetError> {
    let mut columns = Vec::with_capacity(Field::ALL.len());
    let mut has_label = false;
    for name in headers.iter() {
        match name {
            ID_COLUMN => {}
            LABEL_COLUMN => has_label = true,
            other => match Field::from_name(other) {
                Some(field) if columns.contains(&field) => {
                    return Err(DatasetError::DuplicateColumn(other.to_string()))
                }
                Some(field) => columns.push(field),
                None => return Err(DatasetError::UnknownColumn(other.to_string())),
            },
        }
    }

    let mut missing: Vec<String> = Field::ALL
        .iter()
        .filter(|f| !columns.contains(f))
        .map(|f| f.name().to_string())
        .collect();
    if !has_label {
        missing.push(LABEL_COLUMN.to_string());
    }
    if !missing.is_empty() {
        return Err(DatasetError::MissingColumns(missing));
    }
    Ok(columns)
}

impl ChurnTable {
    /// Load the table from a CSV file with a header row.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_reader(BufReader::new(file))?;
        tracing::info!(path = %path.display(), "loaded training table");
        Ok(table)
    }

    /// Load the table from any CSV source with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut rdr = ReaderBuilder::new().from_reader(reader);
        let headers = rdr.headers()?.clone();
        let columns = header_columns(&headers)?;

        let mut records = Vec::new();
        let mut labels = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let row = result?;
            let record: CustomerRecord = row.deserialize(Some(&headers))?;
            let label: LabelRow = row.deserialize(Some(&headers))?;
            let code = binary::map(BinaryField::Churn, &label.churn)
                .map_err(|source| DatasetError::Encoding { row: i + 1, source })?;
            records.push(record);
            labels.push(code);
        }

        if records.is_empty() {
            return Err(DatasetError::Empty);
        }

        let table = Self {
            columns,
            records,
            labels,
        };
        let summary = table.summary();
        tracing::info!(
            rows = summary.rows,
            churned = summary.churned,
            retained = summary.retained,
            malformed_total_charges = summary.malformed_total_charges,
            "dataset summary"
        );
        Ok(table)
    }

    /// Build a table from already-parsed parts.
    pub fn from_parts(
        columns: Vec<Field>,
        records: Vec<CustomerRecord>,
        labels: Vec<u8>,
    ) -> Result<Self, DatasetError> {
        if records.len() != labels.len() {
            return Err(DatasetError::Shape(format!(
                "{} records but {} labels",
                records.len(),
                labels.len()
            )));
        }
        if records.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(Self {
            columns,
            records,
            labels,
        })
    }

    /// Feature columns in header order.
    pub fn columns(&self) -> &[Field] {
        &self.columns
    }

    pub fn records(&self) -> &[CustomerRecord] {
        &self.records
    }

    /// Churn labels, `1` for churned.
    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> TableSummary {
        let churned = self.labels.iter().filter(|&&l| l == 1).count();
        let malformed_total_charges = self
            .records
            .iter()
            .filter(|r| parse_monetary(&r.total_charges).is_none())
            .count();
        TableSummary {
            rows: self.len(),
            churned,
            retained: self.len() - churned,
            malformed_total_charges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MonetaryValue;

    const HEADER: &str = "customerID,gender,SeniorCitizen,Partner,Dependents,tenure,PhoneService,MultipleLines,InternetService,OnlineSecurity,OnlineBackup,DeviceProtection,TechSupport,StreamingTV,StreamingMovies,Contract,PaperlessBilling,PaymentMethod,MonthlyCharges,TotalCharges,Churn";

    const ROWS: &str = "\
7590-VHVEG,Female,0,Yes,No,1,No,No phone service,DSL,No,Yes,No,No,No,No,Month-to-month,Yes,Electronic check,29.85,29.85,No
5575-GNVDE,Male,0,No,No,34,Yes,No,DSL,Yes,No,Yes,No,No,No,One year,No,Mailed check,56.95,1889.5,No
3668-QPYBK,Male,0,No,No,2,Yes,No,DSL,Yes,Yes,No,No,No,No,Month-to-month,Yes,Mailed check,53.85,108.15,Yes
4472-LVYGI,Female,0,Yes,Yes,0,No,No phone service,DSL,Yes,No,Yes,Yes,Yes,No,Two year,Yes,Bank transfer (automatic),52.55, ,No
";

    fn csv(header: &str, rows: &str) -> String {
        format!("{}\n{}", header, rows)
    }

    #[test]
    fn test_load_table() {
        let table = ChurnTable::from_reader(csv(HEADER, ROWS).as_bytes()).unwrap();

        assert_eq!(table.len(), 4);
        assert_eq!(table.columns(), &Field::ALL);
        assert_eq!(table.labels(), &[0, 0, 1, 0]);
        assert_eq!(table.records()[1].tenure, 34.0);
        assert_eq!(table.records()[1].contract, "One year");
        assert_eq!(table.records()[3].total_charges, MonetaryValue::Text(" ".into()));
    }

    #[test]
    fn test_summary_counts() {
        let table = ChurnTable::from_reader(csv(HEADER, ROWS).as_bytes()).unwrap();
        assert_eq!(
            table.summary(),
            TableSummary {
                rows: 4,
                churned: 1,
                retained: 3,
                malformed_total_charges: 1,
            }
        );
    }

    #[test]
    fn test_bool_like_total_charges_fall_back_to_median() {
        use crate::preprocessing::{FittedTransformer, MonetaryCoercion, Transformer};

        let rows = ROWS
            .replacen(",29.85,29.85,", ",29.85,true,", 1)
            .replacen(",56.95,1889.5,", ",56.95,false,", 1);
        let table = ChurnTable::from_reader(csv(HEADER, &rows).as_bytes()).unwrap();
        assert_eq!(table.records()[0].total_charges, MonetaryValue::Text("true".into()));
        assert_eq!(table.records()[1].total_charges, MonetaryValue::Text("false".into()));
        assert_eq!(table.summary().malformed_total_charges, 3);

        // Only 108.15 parses
        let coercion = MonetaryCoercion.fit(table.records()).unwrap();
        assert_eq!(coercion.median(), 108.15);
        assert_eq!(coercion.coerce(&table.records()[0].total_charges), 108.15);
        assert_eq!(coercion.transform(&table.records()[1].total_charges).unwrap(), 108.15);
    }

    #[test]
    fn test_header_defines_column_order() {
        // Swap tenure and gender
        let header = HEADER
            .replacen("gender", "__g", 1)
            .replacen("tenure", "gender", 1)
            .replacen("__g", "tenure", 1);
        let rows = ROWS
            .lines()
            .map(|line| {
                let mut cells: Vec<&str> = line.split(',').collect();
                cells.swap(1, 5);
                cells.join(",")
            })
            .collect::<Vec<_>>()
            .join("\n");

        let table = ChurnTable::from_reader(csv(&header, &rows).as_bytes()).unwrap();
        assert_eq!(table.columns()[0], Field::Tenure);
        assert_eq!(table.columns()[4], Field::Gender);
        assert_eq!(table.records()[0].gender, "Female");
        assert_eq!(table.records()[1].tenure, 34.0);
    }

    #[test]
    fn test_unknown_column_rejected() {
        let header = format!("{},Region", HEADER);
        let rows: String = ROWS.lines().map(|l| format!("{},North\n", l)).collect();
        let result = ChurnTable::from_reader(csv(&header, &rows).as_bytes());
        assert!(matches!(result, Err(DatasetError::UnknownColumn(c)) if c == "Region"));
    }

    #[test]
    fn test_missing_label_column() {
        let header = HEADER.trim_end_matches(",Churn");
        let rows: String = ROWS
            .lines()
            .map(|l| format!("{}\n", &l[..l.rfind(',').unwrap()]))
            .collect();
        let result = ChurnTable::from_reader(csv(header, &rows).as_bytes());
        assert!(matches!(result, Err(DatasetError::MissingColumns(m)) if m == vec!["Churn"]));
    }

    #[test]
    fn test_bad_label_reports_row() {
        let rows = ROWS.replacen("108.15,Yes", "108.15,Maybe", 1);
        let result = ChurnTable::from_reader(csv(HEADER, &rows).as_bytes());
        assert!(matches!(result, Err(DatasetError::Encoding { row: 3, .. })));
    }

    #[test]
    fn test_empty_table() {
        let result = ChurnTable::from_reader(format!("{}\n", HEADER).as_bytes());
        assert!(matches!(result, Err(DatasetError::Empty)));
    }

    #[test]
    fn test_from_path() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", csv(HEADER, ROWS)).unwrap();
        file.flush().unwrap();

        let table = ChurnTable::from_path(file.path()).unwrap();
        assert_eq!(table.len(), 4);

        let missing = ChurnTable::from_path(file.path().with_extension("absent"));
        assert!(matches!(missing, Err(DatasetError::Io { .. })));
    }
}
