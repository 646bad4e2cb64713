use chronodb::storage::{Record, StorageEngine};
use chronodb::{Error, Executor};

fn setup() -> (tempfile::TempDir, Executor) {
    let dir = tempfile::tempdir().unwrap();
    let engine = StorageEngine::new(dir.path()).unwrap();
    let mut executor = Executor::new(engine);
    executor
        .execute("CREATE TABLE students (id INT, name STRING, gpa FLOAT)")
        .unwrap();
    for (id, name, gpa) in [(1, "Alice", 3.8), (2, "Bob", 2.9), (3, "Carol", 3.1)] {
        executor
            .execute(&format!(
                "INSERT INTO students VALUES ({}, \"{}\", {})",
                id, name, gpa
            ))
            .unwrap();
    }
    (dir, executor)
}

fn scan(executor: &mut Executor) -> Vec<Record> {
    executor.execute("SELECT * FROM students").unwrap().rows
}

/// UNDO restores the prior scan exactly and REDO the post-mutation scan
fn assert_reversible(executor: &mut Executor, statement: &str) {
    let before = scan(executor);
    executor.execute(statement).unwrap();
    let after = scan(executor);
    assert_ne!(before, after, "{} changed nothing", statement);

    executor.execute("UNDO").unwrap();
    assert_eq!(scan(executor), before, "undo of {}", statement);

    executor.execute("REDO").unwrap();
    assert_eq!(scan(executor), after, "redo of {}", statement);
}

#[test]
fn test_every_mutation_is_reversible() {
    let (_dir, mut executor) = setup();
    assert_reversible(&mut executor, "INSERT INTO students VALUES (4, \"Dan\", 2.2)");
    assert_reversible(&mut executor, "DELETE FROM students WHERE ID 2");
    assert_reversible(&mut executor, "UPDATE students SET gpa 4.0 WHERE ID 1");
    assert_reversible(&mut executor, "UPDATE students SET name \"Caroline\" WHERE ID 3");
    assert_reversible(&mut executor, "UPDATE students SET id 9 WHERE ID 4");
}

#[test]
fn test_undo_chain_walks_back_to_start() {
    let (_dir, mut executor) = setup();
    let start = scan(&mut executor);

    executor.execute("DELETE FROM students WHERE ID 1").unwrap();
    executor
        .execute("UPDATE students SET name \"Robert\" WHERE ID 2")
        .unwrap();
    executor
        .execute("INSERT INTO students VALUES (1, \"Alice\", 1.0)")
        .unwrap();
    let end = scan(&mut executor);

    for _ in 0..3 {
        executor.execute("UNDO").unwrap();
    }
    assert_eq!(scan(&mut executor), start);

    for _ in 0..3 {
        executor.execute("REDO").unwrap();
    }
    assert_eq!(scan(&mut executor), end);
    assert!(matches!(executor.execute("REDO"), Err(Error::EmptyRedo)));
}

#[test]
fn test_new_mutation_discards_redo() {
    let (_dir, mut executor) = setup();
    executor.execute("DELETE FROM students WHERE ID 3").unwrap();
    executor.execute("UNDO").unwrap();

    // reads leave redo intact
    executor.execute("SELECT * FROM students WHERE gpa > 3").unwrap();
    assert!(executor.history().can_redo());

    executor.execute("UPDATE students SET gpa 3.3 WHERE ID 3").unwrap();
    assert!(matches!(executor.execute("REDO"), Err(Error::EmptyRedo)));
}

#[test]
fn test_empty_history_has_no_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let mut executor = Executor::new(StorageEngine::new(dir.path()).unwrap());

    let err = executor.execute("UNDO").unwrap_err();
    assert_eq!(err.to_string(), "History error: nothing to undo");
    assert!(matches!(executor.execute("REDO"), Err(Error::EmptyRedo)));
    assert!(executor.engine().list_tables().unwrap().is_empty());
}
