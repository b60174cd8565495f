//! Standalone rendering of whole template files

use anyhow::{Context, bail};
use embedz_core::{Mapping, Value, validate_file_path};
use embedz_pipeline::{Embedz, STDIN_SOURCE, StandaloneOverrides, TEST_MODE_ENV};
use std::path::PathBuf;

/// What to render and where the result goes
#[derive(Debug, Clone, Default)]
pub struct StandaloneRequest {
    /// Template files; `-` reads the template from standard input
    pub files: Vec<String>,
    /// Inline template text given with `-t`
    pub template: Option<String>,
    /// Data format given with `-f`
    pub format: Option<String>,
    /// External config files given with `-c`, in order
    pub configs: Vec<String>,
    pub output: Option<PathBuf>,
}

impl StandaloneRequest {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.template.is_some() && !self.files.is_empty() {
            bail!("cannot specify both -t/--template and template files");
        }
        if self.template.is_none() && self.files.is_empty() {
            bail!("--standalone/-s requires at least one file or --template/-t option");
        }
        Ok(())
    }

    /// Configuration layered beneath each template's own front matter
    pub fn overrides(&self, stdin_is_terminal: bool) -> StandaloneOverrides {
        let mut config = Mapping::new();
        match self.configs.as_slice() {
            [] => {}
            [single] => {
                config.insert("config".into(), Value::from(single.as_str()));
            }
            many => {
                config.insert(
                    "config".into(),
                    Value::List(many.iter().map(|c| Value::from(c.as_str())).collect()),
                );
            }
        }
        if let Some(format) = &self.format {
            config.insert("format".into(), Value::from(format.as_str()));
        }

        // An inline template without a format renders without data
        let inline_without_format = self.template.is_some() && self.format.is_none();
        let stdin_fallback = !stdin_is_terminal
            && self.files.len() <= 1
            && !inline_without_format
            && std::env::var_os(TEST_MODE_ENV).is_none_or(|v| v.is_empty());

        StandaloneOverrides {
            config,
            stdin_fallback,
        }
    }

    /// Template texts to render, in order
    fn sources(&self, embedz: &mut Embedz) -> anyhow::Result<Vec<String>> {
        if let Some(template) = &self.template {
            return Ok(vec![match &self.format {
                Some(format) => inline_with_stdin_data(template, format),
                None => template.clone(),
            }]);
        }

        self.files
            .iter()
            .map(|file| -> anyhow::Result<String> {
                if file == STDIN_SOURCE {
                    return Ok(embedz.state_mut().take_stdin()?);
                }
                let path = validate_file_path(file)?;
                std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read template {}", path.display()))
            })
            .collect()
    }
}

/// Front matter that reads `format` data from standard input, followed by
/// the inline template
fn inline_with_stdin_data(template: &str, format: &str) -> String {
    format!(
        "---\ndata: \"{}\"\nformat: {}\n---\n{}",
        STDIN_SOURCE, format, template
    )
}

/// Render every template of `request` and write the concatenated output
pub fn run(embedz: &mut Embedz, request: &StandaloneRequest, stdin_is_terminal: bool) -> anyhow::Result<()> {
    request.validate()?;
    let overrides = request.overrides(stdin_is_terminal);

    let mut rendered = String::new();
    for source in request.sources(embedz)? {
        rendered.push_str(&embedz.render_standalone(&source, &overrides)?);
    }

    match &request.output {
        Some(path) => std::fs::write(path, rendered)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedz_pipeline::{EmbedzState, FailureMode, MemorySink};
    use pretty_assertions::assert_eq;

    fn embedz(stdin: &str) -> Embedz {
        Embedz::new(EmbedzState::with_stdin_text(stdin))
            .with_failure_mode(FailureMode::Propagate)
            .with_diagnostics(Box::new(MemorySink::new()))
    }

    #[test]
    fn test_template_and_files_conflict() {
        let request = StandaloneRequest {
            files: vec!["report.md".into()],
            template: Some("{{ x }}".into()),
            ..StandaloneRequest::default()
        };
        let err = request.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot specify both -t/--template and template files"
        );
    }

    #[test]
    fn test_nothing_to_render() {
        let err = StandaloneRequest::default().validate().unwrap_err();
        assert!(err.to_string().contains("requires at least one file"));
    }

    #[test]
    fn test_overrides_config_list_and_format() {
        let request = StandaloneRequest {
            files: vec!["a.md".into()],
            configs: vec!["one.yaml".into(), "two.yaml".into()],
            format: Some("csv".into()),
            ..StandaloneRequest::default()
        };
        let overrides = request.overrides(true);
        assert_eq!(
            overrides.config["config"],
            Value::List(vec![Value::from("one.yaml"), Value::from("two.yaml")])
        );
        assert_eq!(overrides.config["format"], Value::from("csv"));
        assert!(!overrides.stdin_fallback);
    }

    #[test]
    fn test_inline_template_with_format_reads_stdin() {
        let request = StandaloneRequest {
            template: Some("{% for r in data %}{{ r.n }};{% endfor %}".into()),
            format: Some("csv".into()),
            ..StandaloneRequest::default()
        };
        let mut embedz = embedz("n\n1\n2\n");
        let sources = request.sources(&mut embedz).unwrap();
        let rendered = embedz
            .render_standalone(&sources[0], &request.overrides(true))
            .unwrap();
        assert_eq!(rendered, "1;2;\n");
    }

    #[test]
    fn test_files_rendered_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.md");
        let second = dir.path().join("second.md");
        std::fs::write(&first, "---\nglobal:\n  who: World\n---\nHello\n").unwrap();
        std::fs::write(&second, "{{ who }}!\n").unwrap();
        let output = dir.path().join("out.txt");

        let request = StandaloneRequest {
            files: vec![
                first.to_string_lossy().to_string(),
                second.to_string_lossy().to_string(),
            ],
            output: Some(output.clone()),
            ..StandaloneRequest::default()
        };
        run(&mut embedz(""), &request, true).unwrap();
        assert_eq!(std::fs::read_to_string(output).unwrap(), "Hello\nWorld!\n");
    }

    #[test]
    fn test_template_from_stdin() {
        let request = StandaloneRequest {
            files: vec!["-".into()],
            ..StandaloneRequest::default()
        };
        let mut embedz = embedz("---\nwith:\n  n: 3\n---\nn={{ n }}\n");
        let sources = request.sources(&mut embedz).unwrap();
        assert_eq!(sources.len(), 1);
        assert!(embedz.state().stdin_consumed());
        let rendered = embedz
            .render_standalone(&sources[0], &request.overrides(false))
            .unwrap();
        assert_eq!(rendered, "n=3\n");
    }
}
