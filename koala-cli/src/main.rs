//! Koala selector CLI
//!
//! Runs a selector against a JSON DOM snapshot and prints the matches.
//!
//! Set `RUST_LOG=koala_query=debug` to trace chain stages on stderr.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use koala_dom::{DomTree, NodeId, NodeType};
use koala_query::{QueryEngine, QueryOptions};
use owo_colors::OwoColorize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// koala-query: query a DOM snapshot with shadow-piercing selectors
#[derive(Parser, Debug)]
#[command(name = "koala-query")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # First match of a CSS selector, piercing open shadow roots
    koala-query page.json 'section span'

    # Every match, light tree only
    koala-query page.json --all 'css:light=li.item'

    # Chain into a host, match by text, print the host
    koala-query page.json '*css=my-card >> text="Buy now"'

    # Matches as JSON snapshots
    koala-query page.json --all --json '[data-testid^=row]'

    # Query below the first match of another selector
    koala-query page.json --scope '#sidebar' --all 'a'
"#)]
struct Cli {
    /// Path to the JSON DOM snapshot
    #[arg(value_name = "SNAPSHOT")]
    snapshot: PathBuf,

    /// Selector to evaluate
    #[arg(value_name = "SELECTOR")]
    selector: String,

    /// Print every match instead of the first
    #[arg(short, long)]
    all: bool,

    /// Print matches as JSON snapshots
    #[arg(long)]
    json: bool,

    /// Evaluate below the first match of this selector instead of the document
    #[arg(long, value_name = "SELECTOR")]
    scope: Option<String>,

    /// JSON file with query options
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let tree = load_snapshot(&cli.snapshot)?;
    let options = match cli.config {
        Some(ref path) => load_options(path)?,
        None => QueryOptions::default(),
    };
    let engine = QueryEngine::new(options);

    let root = match cli.scope {
        Some(ref scope) => match engine
            .query_single(&tree, scope, tree.root())
            .with_context(|| format!("invalid scope selector `{scope}`"))?
        {
            Some(node) => node,
            None => {
                eprintln!("{} scope `{scope}` matched nothing", "error:".red().bold());
                process::exit(2);
            }
        },
        None => tree.root(),
    };

    let selector = engine
        .compile(&cli.selector)
        .with_context(|| format!("invalid selector `{}`", cli.selector))?;
    debug!(%selector, ?root, "compiled");

    let matches = if cli.all {
        selector.query_all(&tree, root)
    } else {
        selector.query_single(&tree, root).into_iter().collect()
    };

    if cli.json {
        let snapshots: Vec<_> = matches.iter().map(|&node| tree.to_snapshot(node)).collect();
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
    } else {
        for (i, &node) in matches.iter().enumerate() {
            print_match(&tree, i, node);
        }
    }

    if matches.is_empty() {
        if !cli.json {
            eprintln!("{}", "no matches".dimmed());
        }
        process::exit(1);
    }
    Ok(())
}

fn load_snapshot(path: &Path) -> Result<DomTree> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    DomTree::from_json(&json).with_context(|| format!("invalid snapshot {}", path.display()))
}

fn load_options(path: &Path) -> Result<QueryOptions> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("invalid config {}", path.display()))
}

/// One match: its position, its path from the document, and its text.
fn print_match(tree: &DomTree, index: usize, node: NodeId) {
    println!("{} {}", format!("[{index}]").dimmed(), path_to(tree, node));
    println!("    {}", start_tag(tree, node).cyan());
    let text = tree.text_content(node);
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if !text.is_empty() {
        println!("    {}", format!("\"{text}\"").green());
    }
}

/// `section > div#root1 > #shadow-root > span`
fn path_to(tree: &DomTree, node: NodeId) -> String {
    let mut steps = Vec::new();
    let mut current = Some(node);
    // Walk one tree at a time, hopping from each shadow root to its host.
    while let Some(start) = current {
        let mut top = start;
        for id in std::iter::once(start).chain(tree.ancestors(start)) {
            match tree.get(id).map(|n| &n.node_type) {
                Some(NodeType::Element(data)) => steps.push(match data.id() {
                    Some(id) => format!("{}#{id}", data.tag_name),
                    None => data.tag_name.clone(),
                }),
                Some(NodeType::ShadowRoot(_)) => steps.push("#shadow-root".to_string()),
                _ => {}
            }
            top = id;
        }
        current = tree.host(top);
    }
    steps.reverse();
    steps.join(" > ")
}

fn start_tag(tree: &DomTree, node: NodeId) -> String {
    let Some(data) = tree.as_element(node) else {
        return String::new();
    };
    let mut attrs: Vec<_> = data.attrs.iter().collect();
    attrs.sort();
    let attrs: String = attrs
        .into_iter()
        .map(|(k, v)| {
            if v.is_empty() {
                format!(" {k}")
            } else {
                format!(" {k}=\"{v}\"")
            }
        })
        .collect();
    format!("<{}{attrs}>", data.tag_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_crosses_shadow_roots() {
        let tree = DomTree::from_json(
            r#"{"type": "element", "tagName": "section", "children": [
                {"type": "element", "tagName": "div", "attributes": {"id": "root1"},
                 "shadowRoot": {"mode": "open", "children": [
                    {"type": "element", "tagName": "span"}
                 ]}}
            ]}"#,
        )
        .unwrap();
        let span = koala_query::query_single(&tree, "span", tree.root())
            .unwrap()
            .unwrap();
        assert_eq!(path_to(&tree, span), "section > div#root1 > #shadow-root > span");
    }
}
