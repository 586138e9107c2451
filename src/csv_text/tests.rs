use super::*;

fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

fn row(cells: &[Option<&str>]) -> Vec<Option<String>> {
    cells.iter().map(|c| c.map(str::to_string)).collect()
}

#[test]
fn basic_output() {
    let csv = to_csv(
        &cols(&["name", "age"]),
        &[row(&[Some("Alice"), Some("30")]), row(&[Some("Bob"), Some("25")])],
    )
    .expect("should render csv");

    let lines: Vec<&str> = csv.trim_end().lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "\"name\",\"age\"");
    assert_eq!(lines[1], "\"Alice\",\"30\"");
    assert_eq!(lines[2], "\"Bob\",\"25\"");
}

#[test]
fn quotes_are_doubled() {
    let csv = to_csv(&cols(&["name"]), &[row(&[Some("Say \"Hello\"")])])
        .expect("should render csv");
    assert!(csv.contains("\"Say \"\"Hello\"\"\""));
}

#[test]
fn commas_and_newlines_stay_inside_quotes() {
    let csv = to_csv(
        &cols(&["name", "note"]),
        &[row(&[Some("Smith, John"), Some("line one\nline two")])],
    )
    .expect("should render csv");

    let mut reader = csv::Reader::from_reader(csv.as_bytes());
    let records: Vec<csv::StringRecord> = reader
        .records()
        .collect::<std::result::Result<_, _>>()
        .expect("should parse back");
    assert_eq!(records.len(), 1);
    assert_eq!(&records[0][0], "Smith, John");
    assert_eq!(&records[0][1], "line one\nline two");
}

#[test]
fn null_cells_render_empty() {
    let csv = to_csv(
        &cols(&["a", "b"]),
        &[row(&[None, Some("x")]), row(&[Some("y"), None])],
    )
    .expect("should render csv");

    let lines: Vec<&str> = csv.trim_end().lines().collect();
    assert_eq!(lines[1], "\"\",\"x\"");
    assert_eq!(lines[2], "\"y\",\"\"");
}

#[test]
fn header_only_for_empty_rows() {
    let csv = to_csv(&cols(&["a", "b"]), &[]).expect("should render csv");
    assert_eq!(csv.trim_end(), "\"a\",\"b\"");
}

#[test]
fn round_trips_through_csv_reader() {
    let columns = cols(&["id", "name", "comment"]);
    let rows = vec![
        row(&[Some("1"), Some("plain"), Some("nothing special")]),
        row(&[Some("2"), Some("comma, here"), Some("quote \" here")]),
        row(&[Some("3"), Some("multi\nline"), None]),
    ];

    let csv = to_csv(&columns, &rows).expect("should render csv");
    let mut reader = csv::Reader::from_reader(csv.as_bytes());

    let headers = reader.headers().expect("should read headers").clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["id", "name", "comment"]
    );

    let records: Vec<csv::StringRecord> = reader
        .records()
        .collect::<std::result::Result<_, _>>()
        .expect("should parse back");
    assert_eq!(records.len(), rows.len());
    for (record, original) in records.iter().zip(&rows) {
        for (cell, original_cell) in record.iter().zip(original) {
            assert_eq!(cell, original_cell.as_deref().unwrap_or_default());
        }
    }
}
