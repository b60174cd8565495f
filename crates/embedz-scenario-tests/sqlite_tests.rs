//! SQLite database files as data sources

#[cfg(test)]
mod sqlite_tests {
    use crate::fixtures::{products_database, render, test_pipeline};
    use anyhow::Result;
    use embedz_core::{EmbedzError, ErrorCategory};
    use embedz_pipeline::Block;
    use indoc::formatdoc;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_whole_table() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let db = products_database(dir.path())?;
        let (mut embedz, _) = test_pipeline();

        let output = render(
            &mut embedz,
            Block::new("{% for p in data %}{{ p.name }}:{{ p.price }} {% endfor %}")
                .with_attribute("data", db.to_string_lossy())
                .with_attribute("format", "sqlite")
                .with_attribute("table", "products"),
        )?;
        assert_eq!(output, "Apple:100 Carrot:60 Banana:80 \n");
        Ok(())
    }

    #[test]
    fn test_query_with_local_parameter() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let db = products_database(dir.path())?;
        let (mut embedz, _) = test_pipeline();

        let output = render(
            &mut embedz,
            Block::new(formatdoc! {"
                ---
                data: {}
                format: sqlite
                with:
                  category: fruit
                query: SELECT name FROM products WHERE category = '{{{{ category }}}}' ORDER BY price
                ---
                {{{{ data | map(attribute='name') | join(', ') }}}}
            ", db.display()}),
        )?;
        assert_eq!(output, "Banana, Apple\n");
        Ok(())
    }

    #[rstest]
    #[case::no_table_or_query(None, &["'table'", "'query'"])]
    #[case::inline_text(Some("name\nApple"), &["does not support inline data"])]
    fn test_sqlite_errors(#[case] inline: Option<&str>, #[case] expected: &[&str]) -> Result<()> {
        let dir = tempfile::tempdir()?;
        let db = products_database(dir.path())?;
        let (mut embedz, sink) = test_pipeline();

        let block = match inline {
            Some(data) => Block::new(format!("---\nformat: sqlite\n---\n{{{{ data }}}}\n---\n{}", data)),
            None => Block::new("{{ data }}")
                .with_attribute("data", db.to_string_lossy())
                .with_attribute("format", "sqlite"),
        };
        let err = embedz.process_block(&block).unwrap_err();

        assert_eq!(err.category(), ErrorCategory::Data);
        assert!(matches!(err, EmbedzError::Data(_)));
        for fragment in expected {
            assert!(err.to_string().contains(fragment), "{err}");
        }
        assert!(sink.contents().contains("pandoc-embedz Error"));
        Ok(())
    }
}
