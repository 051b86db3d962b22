use std::io::Read;

use csv::ReaderBuilder;
use ndarray::{Array2, ArrayView2};

use crate::error::{DensityTreeError, Result};

/// Rejects inputs no tree can be built from: no rows, no columns, or
/// non-finite entries.
pub fn validate_dataset(x: ArrayView2<f64>) -> Result<()> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(DensityTreeError::EmptyDataset);
    }
    if let Some(((row, col), _)) = x.indexed_iter().find(|(_, v)| !v.is_finite()) {
        return Err(DensityTreeError::NonFiniteValue { row, col });
    }
    Ok(())
}

/// First column whose values are all equal, if any.
pub fn constant_column(x: ArrayView2<f64>) -> Option<usize> {
    x.columns().into_iter().position(|col| {
        col.first()
            .map_or(false, |&first| col.iter().all(|&v| v == first))
    })
}

/// Stacks feature vectors into a matrix, checking they share one dimension.
pub fn dataset_from_rows(rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    let expected = rows.first().map(Vec::len).ok_or(DensityTreeError::EmptyDataset)?;
    if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
        return Err(DensityTreeError::DimensionMismatch {
            row,
            expected,
            found: r.len(),
        });
    }

    let data: Vec<f64> = rows.iter().flatten().copied().collect();
    let x = Array2::from_shape_vec((rows.len(), expected), data)
        .map_err(|e| DensityTreeError::InvalidParameter(e.to_string()))?;
    validate_dataset(x.view())?;
    Ok(x)
}

/// Reads one feature vector per CSV record. Every column is a feature.
pub fn dataset_from_csv<R: Read>(reader: R, has_headers: bool) -> Result<Array2<f64>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(has_headers)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let values = record
            .iter()
            .enumerate()
            .map(|(col, field)| {
                field.parse::<f64>().map_err(|_| DensityTreeError::ParseValue {
                    row,
                    col,
                    value: field.to_string(),
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(values);
    }
    dataset_from_rows(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_dataset_from_rows() {
        let x = dataset_from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(x, array![[1.0, 2.0], [3.0, 4.0]]);
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let err = dataset_from_rows(&[vec![1.0, 2.0], vec![3.0], vec![4.0, 5.0]]).unwrap_err();
        assert_eq!(
            err,
            DensityTreeError::DimensionMismatch {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_empty_and_non_finite_inputs() {
        assert_eq!(
            dataset_from_rows(&[]).unwrap_err(),
            DensityTreeError::EmptyDataset
        );
        assert_eq!(
            validate_dataset(Array2::<f64>::zeros((3, 0)).view()).unwrap_err(),
            DensityTreeError::EmptyDataset
        );
        let x = array![[1.0, 2.0], [f64::NAN, 0.0]];
        assert_eq!(
            validate_dataset(x.view()).unwrap_err(),
            DensityTreeError::NonFiniteValue { row: 1, col: 0 }
        );
    }

    #[test]
    fn test_constant_column() {
        let x = array![[1.0, 5.0, 2.0], [3.0, 5.0, 2.0], [4.0, 5.0, 2.0]];
        assert_eq!(constant_column(x.view()), Some(1));
        assert_eq!(constant_column(array![[1.0], [2.0]].view()), None);
    }

    #[test]
    fn test_dataset_from_csv() {
        let input = "x,y\n1.0, 2.0\n3.5,-4\n";
        let x = dataset_from_csv(input.as_bytes(), true).unwrap();
        assert_eq!(x, array![[1.0, 2.0], [3.5, -4.0]]);

        let x = dataset_from_csv("1,2,3\n".as_bytes(), false).unwrap();
        assert_eq!(x.dim(), (1, 3));
    }

    #[test]
    fn test_csv_errors() {
        let err = dataset_from_csv("1,2\n3,abc\n".as_bytes(), false).unwrap_err();
        assert_eq!(
            err,
            DensityTreeError::ParseValue {
                row: 1,
                col: 1,
                value: "abc".to_string()
            }
        );

        let err = dataset_from_csv("1,2\n3\n".as_bytes(), false).unwrap_err();
        assert!(matches!(err, DensityTreeError::DimensionMismatch { row: 1, .. }));

        let err = dataset_from_csv("a,b\n".as_bytes(), true).unwrap_err();
        assert_eq!(err, DensityTreeError::EmptyDataset);
    }
}
