//! Pandoc JSON filter mode
//!
//! Pandoc hands the filter the document AST as JSON on stdin and reads the
//! transformed AST back from stdout. Every code block carrying the `embedz`
//! class is replaced by the blocks Pandoc parses from its rendered output.

use anyhow::Context;
use embedz_core::{EmbedzError, Result};
use embedz_pipeline::{Block, Embedz, Host};
use serde_json::Value as Json;
use std::io::{Read, Write};
use std::process::{Command, Stdio};

/// Re-parses rendered Markdown by running `pandoc -f markdown -t json`
pub struct PandocHost {
    program: String,
}

impl Default for PandocHost {
    fn default() -> Self {
        Self {
            program: "pandoc".to_string(),
        }
    }
}

impl Host for PandocHost {
    type Node = Json;

    fn reparse(&mut self, text: &str) -> Result<Vec<Json>> {
        let mut child = Command::new(&self.program)
            .args(["-f", "markdown", "-t", "json"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                EmbedzError::HostIntegration(format!("failed to run {}: {}", self.program, e))
            })?;

        if let Some(stdin) = child.stdin.as_mut() {
            stdin.write_all(text.as_bytes())?;
        }
        // stdin is closed when the handle drops inside wait_with_output

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            return Err(EmbedzError::HostIntegration(format!(
                "{} exited with status {} while parsing rendered output",
                self.program, code
            )));
        }

        let mut document: Json = serde_json::from_slice(&output.stdout)?;
        match document.get_mut("blocks").map(Json::take) {
            Some(Json::Array(blocks)) => Ok(blocks),
            _ => Err(EmbedzError::HostIntegration(format!(
                "{} returned a document without a block list",
                self.program
            ))),
        }
    }

    fn is_code_block(&self, node: &Json) -> bool {
        node_type(node) == Some("CodeBlock")
    }
}

fn node_type(node: &Json) -> Option<&str> {
    node.get("t").and_then(Json::as_str)
}

/// The block for a Pandoc `CodeBlock` node carrying the `embedz` class.
///
/// Pandoc encodes a code block as
/// `{"t": "CodeBlock", "c": [[id, [classes], [[key, value]]], text]}`.
pub fn embedz_block(node: &Json) -> Option<Block> {
    if node_type(node) != Some("CodeBlock") {
        return None;
    }
    let content = node.get("c")?.as_array()?;
    let attr = content.first()?.as_array()?;
    let text = content.get(1)?.as_str()?;

    let classes = attr
        .get(1)?
        .as_array()?
        .iter()
        .filter_map(|class| class.as_str().map(str::to_string))
        .collect();
    let attributes = attr
        .get(2)?
        .as_array()?
        .iter()
        .filter_map(|pair| {
            let pair = pair.as_array()?;
            Some((
                pair.first()?.as_str()?.to_string(),
                pair.get(1)?.as_str()?.to_string(),
            ))
        })
        .collect();

    let block = Block {
        text: text.to_string(),
        attributes,
        classes,
    };
    block.is_embedz().then_some(block)
}

/// Walk `node` in document order, splicing the nodes `replace` returns in
/// place of every embedz code block
pub fn replace_blocks<F>(node: &mut Json, replace: &mut F) -> Result<()>
where
    F: FnMut(&Block) -> Result<Vec<Json>>,
{
    match node {
        Json::Array(items) => {
            let mut spliced = Vec::with_capacity(items.len());
            for mut item in items.drain(..) {
                match embedz_block(&item) {
                    Some(block) => spliced.extend(replace(&block)?),
                    None => {
                        replace_blocks(&mut item, replace)?;
                        spliced.push(item);
                    }
                }
            }
            *items = spliced;
        }
        Json::Object(fields) => {
            for value in fields.values_mut() {
                replace_blocks(value, replace)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Filter one Pandoc JSON document from `input` to `output`
pub fn run_with<H, R, W>(embedz: &mut Embedz, host: &mut H, input: R, output: W) -> anyhow::Result<()>
where
    H: Host<Node = Json>,
    R: Read,
    W: Write,
{
    let mut document: Json =
        serde_json::from_reader(input).context("failed to read Pandoc JSON from input")?;

    let blocks = document
        .get_mut("blocks")
        .context("Pandoc JSON document has no \"blocks\" field")?;
    let mut count = 0usize;
    replace_blocks(blocks, &mut |block| {
        count += 1;
        embedz.process_into(block, host)
    })?;
    tracing::debug!(blocks = count, "processed embedz blocks");

    serde_json::to_writer(output, &document).context("failed to write Pandoc JSON")?;
    Ok(())
}
