use chronodb::storage::{Record, StorageEngine, Value};
use chronodb::Executor;

fn setup(gpas: &[&str]) -> (tempfile::TempDir, Executor) {
    let dir = tempfile::tempdir().unwrap();
    let mut executor = Executor::new(StorageEngine::new(dir.path()).unwrap());
    executor
        .execute("CREATE TABLE students (id INT, name STRING, gpa FLOAT)")
        .unwrap();
    for (i, gpa) in gpas.iter().enumerate() {
        executor
            .execute(&format!("INSERT INTO students VALUES ({}, n{}, {})", i + 1, i + 1, gpa))
            .unwrap();
    }
    (dir, executor)
}

fn gpas(rows: &[Record]) -> Vec<f32> {
    rows.iter()
        .filter_map(|r| r.get(2).and_then(Value::as_f32))
        .collect()
}

fn ids(rows: &[Record]) -> Vec<i32> {
    rows.iter().filter_map(Record::id).collect()
}

#[test]
fn test_partition_property() {
    let (_dir, mut executor) = setup(&["2.5", "0.5", "3.9", "2.5", "1.75", "3.0", "0.0", "3.9"]);
    let all = executor.execute("SELECT * FROM students").unwrap().rows;

    for pivot in ["0", "0.5", "2.5", "2.6", "3.9", "10"] {
        let above = executor
            .execute(&format!("SELECT * FROM students WHERE gpa > {}", pivot))
            .unwrap()
            .rows;
        let below = executor
            .execute(&format!("SELECT * FROM students WHERE gpa <= {}", pivot))
            .unwrap()
            .rows;

        let mut union = ids(&above);
        union.extend(ids(&below));
        union.sort();
        let mut expected = ids(&all);
        expected.sort();
        assert_eq!(union, expected, "pivot {}", pivot);

        for part in [&above, &below] {
            let values = gpas(part);
            assert!(values.windows(2).all(|w| w[0] <= w[1]), "pivot {}", pivot);
        }
    }
}

#[test]
fn test_ties_keep_insertion_order() {
    let (_dir, mut executor) = setup(&["3.0", "1.0", "3.0", "3.0"]);
    let rows = executor
        .execute("SELECT * FROM students WHERE gpa >= 3")
        .unwrap()
        .rows;
    assert_eq!(ids(&rows), vec![1, 3, 4]);
}

#[test]
fn test_equality_uses_insertion_order_and_epsilon() {
    let (_dir, mut executor) = setup(&["3.00001", "1.0", "3.0"]);
    let rows = executor
        .execute("SELECT * FROM students WHERE gpa = 3")
        .unwrap()
        .rows;
    assert_eq!(ids(&rows), vec![1, 3]);
}

#[test]
fn test_consecutive_scans_match() {
    let (_dir, mut executor) = setup(&["1.0", "2.0", "3.0"]);
    let first = executor.execute("SELECT * FROM students").unwrap().rows;
    let second = executor.execute("SELECT * FROM students").unwrap().rows;
    assert_eq!(first, second);
    assert_eq!(ids(&first), vec![1, 2, 3]);
}

#[test]
fn test_integer_range_on_identity_column() {
    let (_dir, mut executor) = setup(&["1.0", "2.0", "3.0", "4.0"]);
    let rows = executor
        .execute("SELECT * FROM students WHERE ID < 3")
        .unwrap()
        .rows;
    assert_eq!(ids(&rows), vec![1, 2]);
}
