//! Shared fixtures: pipelines with captured diagnostics and data files on disk

use anyhow::{Context, Result};
use embedz_core::{Mapping, Value};
use embedz_pipeline::{Block, Embedz, EmbedzState, FailureMode, MemorySink};
use std::path::{Path, PathBuf};

/// A pipeline that returns errors instead of exiting, plus the sink its
/// notices and diagnostics are written to
pub fn test_pipeline() -> (Embedz, MemorySink) {
    pipeline_with_stdin("")
}

/// Like [`test_pipeline`], with fixed text standing in for standard input
pub fn pipeline_with_stdin(stdin: &str) -> (Embedz, MemorySink) {
    let sink = MemorySink::new();
    let embedz = Embedz::new(EmbedzState::with_stdin_text(stdin))
        .with_failure_mode(FailureMode::Propagate)
        .with_diagnostics(Box::new(sink.clone()));
    (embedz, sink)
}

/// Render one block, treating a definition-only block as empty output
pub fn render(embedz: &mut Embedz, block: Block) -> Result<String> {
    Ok(embedz.process_block(&block)?.unwrap_or_default())
}

/// Write `content` to `name` inside `dir`
pub fn write_fixture(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// SQLite database with a `products(name, category, price)` table
pub fn products_database(dir: &Path) -> Result<PathBuf> {
    let path = dir.join("products.db");
    let conn = rusqlite::Connection::open(&path)?;
    conn.execute_batch(
        "CREATE TABLE products (name TEXT, category TEXT, price INTEGER);
         INSERT INTO products VALUES ('Apple', 'fruit', 100);
         INSERT INTO products VALUES ('Carrot', 'vegetable', 60);
         INSERT INTO products VALUES ('Banana', 'fruit', 80);",
    )?;
    Ok(path)
}

/// Mapping from literal pairs
pub fn mapping(pairs: &[(&str, Value)]) -> Mapping {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

/// Record value from literal pairs
pub fn record(pairs: &[(&str, Value)]) -> Value {
    Value::Map(mapping(pairs))
}
