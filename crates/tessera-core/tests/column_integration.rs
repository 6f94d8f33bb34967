//! Integration tests for the column facade.

use tessera_core::{
    Column, ColumnType, DateColumn, Error, IntColumn, NumericColumn, PackedDate, ParseOptions,
    Selection, ShortColumn, StringColumn, WideValue,
};

const M: i32 = i32::MIN;

#[test]
fn test_integer_column_with_missing() {
    let mut column = IntColumn::new("n");
    column.append(1).append(2).append_option(None).append(4);
    assert_eq!(column.count_missing(), 1);
    assert!(column.is_missing(2).unwrap());

    column.sort_ascending();
    assert_eq!(column.as_slice(), &[M, 1, 2, 4]);
    assert!(column.is_missing(0).unwrap());

    column.sort_descending();
    assert_eq!(column.as_slice(), &[4, 2, 1, M]);
    assert!(column.is_missing(3).unwrap());
}

#[test]
fn test_low_cardinality_strings() {
    let mut column = StringColumn::new("grade");
    for _ in 0..1000 {
        column.append("A").unwrap();
    }
    column.append("B").unwrap();
    assert_eq!(column.size(), 1001);
    assert_eq!(column.count_unique(), 2);
    assert_eq!(
        tessera_core::DictionaryBacked::dictionary(&column).distinct_count(),
        2
    );
}

#[test]
fn test_date_pack_round_trip_and_order() {
    let date = PackedDate::pack(2020, 1, 15).unwrap();
    assert_eq!(date.unpack(), Some((2020, 1, 15)));
    let next = PackedDate::pack(2020, 1, 16).unwrap();
    assert!(date.raw() < next.raw());
}

#[test]
fn test_selection_difference() {
    let evens: Selection = (0..10).filter(|row| row % 2 == 0).collect();
    let mut result = evens.clone();
    result.and_not(&Selection::with(&[0, 2]));
    assert_eq!(result.to_vec(), vec![4, 6, 8]);
    assert_eq!(result.size(), 3);
}

#[test]
fn test_lag_and_lead() {
    let column = IntColumn::create("n", &[10, 20, 30, 40, 50]);
    assert_eq!(column.lag(2).as_slice(), &[M, M, 10, 20, 30]);
    assert_eq!(column.lead(2).as_slice(), &[30, 40, 50, M, M]);
}

#[test]
fn test_caller_widens_after_out_of_range() {
    let options = ParseOptions::default();
    let cells = ["12", "-7", "40000", "NA"];

    let mut column = ShortColumn::new("reading");
    let mut widened = None;
    for (row, cell) in cells.iter().enumerate() {
        match column.append_cell(cell, &options) {
            Ok(()) => {}
            Err(err @ Error::OutOfRange { .. }) => {
                if let Error::OutOfRange { input, parsed, column_type } = &err {
                    assert_eq!(input, "40000");
                    assert_eq!(*parsed, WideValue::Integer(40_000));
                    assert_eq!(*column_type, ColumnType::Short);
                }
                assert_eq!(column.size(), row);
                let mut wider = column.to_int_column();
                for cell in &cells[row..] {
                    wider.append_cell(cell, &options).unwrap();
                }
                widened = Some(wider);
                break;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    let widened = widened.unwrap();
    assert_eq!(widened.as_slice(), &[12, -7, 40_000, M]);
    assert_eq!(widened.column_type(), ColumnType::Integer);
}

#[test]
fn test_filter_chain_across_columns() {
    // Two columns of the same table, filtered with one combined selection.
    let ages = IntColumn::create("age", &[34, 17, M, 52, 41]);
    let names = StringColumn::create("name", &["ann", "bob", "cy", "dee", "eve"]).unwrap();

    let adults = ages.is_greater_than_or_equal_to(18);
    let not_dee = names.is_not_equal_to("dee");
    let selected = &adults & &not_dee;

    let ages = ages.where_selected(&selected).unwrap();
    let names = names.where_selected(&selected).unwrap();
    assert_eq!(ages.size(), 2);
    assert_eq!(names.get_string(0).unwrap(), "ann");
    assert_eq!(names.get_string(1).unwrap(), "eve");
    assert_eq!(ages.get_string(1).unwrap(), "41");
}

#[test]
fn test_generic_ingestion_by_type() {
    let options = ParseOptions::default();
    let header = [
        ("flag", ColumnType::Boolean),
        ("count", ColumnType::Long),
        ("label", ColumnType::String),
        ("day", ColumnType::LocalDate),
    ];
    let rows = [
        ["true", "1,200", "alpha", "2021-03-04"],
        ["NA", "", "beta", "03/05/2021"],
        ["F", "-3", "NA", ""],
    ];

    let mut columns: Vec<Box<dyn Column>> = header
        .iter()
        .map(|(name, column_type)| column_type.create_column(name))
        .collect();
    for row in rows {
        for (column, cell) in columns.iter_mut().zip(row) {
            column.append_cell(cell, &options).unwrap();
        }
    }

    for column in &columns {
        assert_eq!(column.size(), 3);
    }
    assert_eq!(columns[0].count_missing(), 1);
    assert_eq!(columns[1].get_string(0).unwrap(), "1200");
    assert_eq!(columns[2].missing().to_vec(), vec![2]);
    assert_eq!(columns[3].get_string(1).unwrap(), "2021-03-05");

    let days = columns[3].downcast_ref::<DateColumn>().unwrap();
    assert_eq!(days.max(), Some(PackedDate::pack(2021, 3, 5).unwrap()));
}

#[test]
fn test_malformed_cells_are_errors_not_missing() {
    let options = ParseOptions::default();
    for (column_type, cell) in [
        (ColumnType::Integer, "1.5e"),
        (ColumnType::Boolean, "perhaps"),
        (ColumnType::LocalDate, "2021-02-30"),
        (ColumnType::LocalTime, "25:00"),
    ] {
        let mut column = column_type.create_column("c");
        let err = column.append_cell(cell, &options).unwrap_err();
        assert!(
            matches!(err, Error::MalformedLiteral { .. }),
            "{column_type}: {err}"
        );
        assert!(column.is_empty());
    }
}

#[test]
fn test_aggregation_view_skips_missing() {
    let column = IntColumn::create("n", &[3, M, -2, 8]);
    let values = column.as_double_array();
    assert_eq!(values.len(), 4);
    assert!(values[1].is_nan());
    let present: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
    assert_eq!(present.iter().sum::<f64>(), 9.0);
    assert_eq!(column.min_f64(), Some(-2.0));
}

#[test]
fn test_index_out_of_bounds() {
    let column = IntColumn::create("n", &[1, 2]);
    let err = column.get(2).unwrap_err();
    assert!(matches!(err, Error::IndexOutOfBounds { index: 2, size: 2 }));
    assert!(column.filter(&Selection::with(&[0, 5])).is_err());
}
