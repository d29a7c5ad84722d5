//! graft - replicate a selected part of a folder tree.
//!
//! Usage:
//!   graft tree -s SRC [--toggle PATH]...          Show the tree with selection states
//!   graft plan -s SRC [--toggle PATH]...          Show the work a copy would do
//!   graft copy -s SRC -d DEST [--map FROM=TO]...  Copy the selection
//!   graft export -s SRC                           Export the source tree to JSON
//!   graft --help                                  Show help

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{bail, Context, Result};
use tokio::sync::broadcast::error::RecvError;

use graft_core::{
    ConfigError, ConfigFile, GraftConfig, Node, RemoteId, RenameMapping, SelectionState,
    SourceTree, DEFAULT_PAGE_SIZE,
};
use graft_ops::{CopyEvent, CopyOrchestrator};
use graft_remote::{LocalStorage, TreeLoader};
use graft_select::{Selection, SelectionSnapshot};

#[derive(Parser)]
#[command(
    name = "graft",
    version,
    about = "Replicate a selected part of a folder tree",
    long_about = "graft copies the parts of a source folder you select into a destination \
                  folder, keeping their relative layout and optionally renaming them.\n\n\
                  Folders you did not select are created only where something selected \
                  needs them as a parent."
)]
struct Cli {
    /// Config file (defaults to <config dir>/graft/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the source tree with selection states
    Tree {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Show the work items a selection produces
    Plan {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Save the resulting selection for use with --selection
        #[arg(long, value_name = "FILE")]
        save_selection: Option<PathBuf>,
    },

    /// Copy the selection into a destination folder
    Copy {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        selection: SelectionArgs,

        /// Destination folder
        #[arg(short, long)]
        dest: Option<PathBuf>,

        /// Rename rule; an empty FROM prepends TO (repeatable, applied in order)
        #[arg(short, long = "map", value_name = "FROM=TO", value_parser = RenameMapping::parse)]
        mappings: Vec<RenameMapping>,

        /// Let the destination name copies whose name no rule changed
        #[arg(long)]
        keep_remote_copy_naming: bool,
    },

    /// Export the source tree to JSON
    Export {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Source folder
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Entries requested per listing page
    #[arg(long)]
    page_size: Option<u32>,
}

#[derive(Args)]
struct SelectionArgs {
    /// Cycle the selection state of the node at PATH (repeatable).
    /// Paths shared by same-named siblings are rejected; select a parent
    /// folder or use a selection file instead.
    #[arg(short, long = "toggle", value_name = "PATH")]
    toggles: Vec<String>,

    /// Select everything before applying toggles
    #[arg(short = 'a', long)]
    select_all: bool,

    /// Start from a saved selection
    #[arg(long, value_name = "FILE")]
    selection: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(ConfigFile::default_path);
    let file = ConfigFile::load(&config_path)
        .wrap_err_with(|| format!("Failed to read {}", config_path.display()))?;

    match cli.command {
        Command::Tree { source, selection } => {
            let (source, page_size) = resolve_source(&file, &source)?;
            let client = LocalStorage::new().with_page_size(page_size as usize);
            let tree = load_tree(&client, &source).await?;
            let selection = build_selection(&tree, &selection)?;
            print_tree(&tree, &selection);
        }
        Command::Plan {
            source,
            selection,
            format,
            save_selection,
        } => {
            let (source, page_size) = resolve_source(&file, &source)?;
            let client = LocalStorage::new().with_page_size(page_size as usize);
            let tree = load_tree(&client, &source).await?;
            let selection = build_selection(&tree, &selection)?;
            print_plan(&tree, &selection, format)?;

            if let Some(path) = save_selection {
                let json = serde_json::to_string_pretty(&selection.snapshot(&tree))?;
                std::fs::write(&path, json)
                    .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
                eprintln!("Selection saved to {}", path.display());
            }
        }
        Command::Copy {
            source,
            selection,
            dest,
            mappings,
            keep_remote_copy_naming,
        } => {
            let config = resolve_config(
                file,
                &source,
                dest.as_deref(),
                mappings,
                keep_remote_copy_naming,
            )?;
            run_copy(&config, &selection).await?;
        }
        Command::Export { source, output } => {
            let (source, page_size) = resolve_source(&file, &source)?;
            let client = LocalStorage::new().with_page_size(page_size as usize);
            let tree = load_tree(&client, &source).await?;
            let json = serde_json::to_string_pretty(&tree)?;

            match output {
                Some(output_path) => {
                    std::fs::write(&output_path, json)?;
                    eprintln!("Exported to {}", output_path.display());
                }
                None => {
                    println!("{}", json);
                }
            }
        }
    }

    Ok(())
}

/// Id of a local folder given on the command line.
fn local_id(path: &Path) -> Result<RemoteId> {
    let path = path
        .canonicalize()
        .wrap_err_with(|| format!("Invalid path: {}", path.display()))?;
    let Some(id) = path.to_str() else {
        bail!("Path is not valid UTF-8: {}", path.display());
    };
    Ok(RemoteId::new(id))
}

/// Source folder and page size for commands that only read.
fn resolve_source(file: &ConfigFile, args: &SourceArgs) -> Result<(RemoteId, u32)> {
    let source = match &args.source {
        Some(path) => local_id(path)?,
        None => file.source.clone().ok_or(ConfigError::MissingSource)?,
    };
    let page_size = args.page_size.or(file.page_size).unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size == 0 {
        bail!("--page-size must be at least 1");
    }
    Ok((source, page_size))
}

/// Full copy configuration: the config file, overridden by flags.
fn resolve_config(
    file: ConfigFile,
    source: &SourceArgs,
    dest: Option<&Path>,
    mappings: Vec<RenameMapping>,
    keep_remote_copy_naming: bool,
) -> Result<GraftConfig> {
    let mut builder = file.into_builder();
    if let Some(path) = &source.source {
        builder.source(local_id(path)?);
    }
    if let Some(page_size) = source.page_size {
        builder.page_size(page_size);
    }
    if let Some(path) = dest {
        builder.destination(local_id(path)?);
    }
    if !mappings.is_empty() {
        builder.mappings(mappings);
    }
    if keep_remote_copy_naming {
        builder.keep_remote_copy_naming(true);
    }
    Ok(builder.build()?)
}

/// Load the source tree, showing listing progress.
async fn load_tree(client: &LocalStorage, source: &RemoteId) -> Result<SourceTree> {
    eprintln!("Loading {}...", source);

    let loader = TreeLoader::new(client);
    let mut rx = loader.subscribe();
    let reporter = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(progress) => eprint!(
                    "\r Listed {} folders, {} entries",
                    progress.folders_listed, progress.entries_seen
                ),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = loader.load(source).await;
    drop(loader);
    let _ = reporter.await;
    eprintln!();

    let tree = result.wrap_err_with(|| format!("Failed to load {}", source))?;
    for warning in tree.warnings() {
        eprintln!("warning: {}: {}", warning.path, warning.message);
    }
    Ok(tree)
}

/// Apply the saved selection, select-all and toggles, in that order.
fn build_selection(tree: &SourceTree, args: &SelectionArgs) -> Result<Selection> {
    let mut selection = Selection::new(tree);

    if let Some(path) = &args.selection {
        let text = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        let snapshot: SelectionSnapshot =
            serde_json::from_str(&text).context("Invalid selection file")?;
        let applied = selection.restore(tree, &snapshot);
        if applied < snapshot.len() {
            eprintln!(
                "warning: {} selection entries do not match the source tree",
                snapshot.len() - applied
            );
        }
    }

    if args.select_all {
        selection.set_all(tree, SelectionState::All);
    }

    for path in &args.toggles {
        let Some(node) = tree.find_by_path(path) else {
            bail!("No such path in source tree: {path}");
        };
        let matches = tree.iter().filter(|n| n.path == node.path).count();
        if matches > 1 {
            bail!("Ambiguous path in source tree: {path} names {matches} items");
        }
        let state = selection.cycle(tree, &node.id);
        eprintln!(" {} -> {}", node.path, state);
    }

    Ok(selection)
}

async fn run_copy(config: &GraftConfig, selection: &SelectionArgs) -> Result<()> {
    let client = LocalStorage::new().with_page_size(config.page_size as usize);
    let tree = load_tree(&client, &config.source).await?;
    let selection = build_selection(&tree, selection)?;
    let plan = selection.plan(&tree);

    if plan.is_empty() {
        eprintln!("Nothing selected.");
        return Ok(());
    }

    eprintln!("Copying {} items into {}...", plan.total, config.destination);

    let result = CopyOrchestrator::from_config(&tree, &client, config)
        .with_observer(|event: &CopyEvent| {
            if let CopyEvent::ParentFallback { path, .. } = event {
                eprintln!("\nwarning: parent of {path} not found; placed at the destination root");
            }
        })
        .run(&plan.items, plan.total, |done, total| {
            eprint!("\r {} {}/{}", make_bar(done, total, 30), done, total);
        })
        .await;
    eprintln!();

    let report = result.context("Copy failed")?;
    println!("{}", report.summary());
    Ok(())
}

fn print_tree(tree: &SourceTree, selection: &Selection) {
    let mut stack: Vec<(&Node, usize)> = tree.roots().iter().rev().map(|n| (n, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        println!(
            "{}{} {}{}",
            "  ".repeat(depth),
            state_marker(selection.get(&node.id)),
            node.name,
            if node.is_folder() { "/" } else { "" }
        );
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }

    println!();
    println!(
        " {} nodes, {} items selected",
        tree.node_count(),
        selection.selected_count(tree)
    );
}

fn print_plan(tree: &SourceTree, selection: &Selection, format: OutputFormat) -> Result<()> {
    let plan = selection.plan(tree);

    match format {
        OutputFormat::Text => {
            if plan.is_empty() {
                println!(" Nothing selected.");
                return Ok(());
            }
            for item in &plan.items {
                let Some(node) = tree.get(&item.node_id) else {
                    continue;
                };
                let suffix = match (node.is_folder(), item.include_children) {
                    (true, true) => "/ (with contents)",
                    (true, false) => "/",
                    (false, _) => "",
                };
                println!(" {:<12} {}{}", item.selection_type.to_string(), node.path, suffix);
            }
            println!();
            println!(
                " {} work items, {} items to copy",
                plan.items.len(),
                plan.total
            );
        }
        OutputFormat::Json => {
            let items: Vec<_> = plan
                .items
                .iter()
                .filter_map(|item| {
                    tree.get(&item.node_id).map(|node| {
                        serde_json::json!({
                            "path": node.path,
                            "kind": node.kind,
                            "selection_type": item.selection_type,
                            "include_children": item.include_children,
                        })
                    })
                })
                .collect();
            let output = serde_json::json!({ "items": items, "total": plan.total });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn state_marker(state: SelectionState) -> &'static str {
    match state {
        SelectionState::None => "[ ]",
        SelectionState::All => "[x]",
        SelectionState::FolderOnly => "[/]",
        SelectionState::Partial => "[~]",
    }
}

/// Create a simple ASCII bar.
fn make_bar(done: usize, total: usize, width: usize) -> String {
    let ratio = if total > 0 {
        (done as f64 / total as f64).min(1.0)
    } else {
        0.0
    };
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

#[cfg(test)]
mod tests {
    use graft_core::NodeId;

    use super::*;

    fn source_args(source: Option<PathBuf>) -> SourceArgs {
        SourceArgs {
            source,
            page_size: None,
        }
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = ConfigFile::from_toml_str(
            r#"
            source = "/nowhere"
            destination = "/elsewhere"
            page_size = 50
            mappings = [{ from = "a", to = "b" }]
            "#,
        )
        .unwrap();

        let config = resolve_config(
            file,
            &source_args(Some(dir.path().to_path_buf())),
            None,
            vec![RenameMapping::prepend("X")],
            true,
        )
        .unwrap();

        assert_eq!(config.source, local_id(dir.path()).unwrap());
        assert_eq!(config.destination.as_str(), "/elsewhere");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.mappings, vec![RenameMapping::prepend("X")]);
        assert!(config.keep_remote_copy_naming);
    }

    #[test]
    fn test_missing_destination_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_config(
            ConfigFile::default(),
            &source_args(Some(dir.path().to_path_buf())),
            None,
            Vec::new(),
            false,
        )
        .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::MissingDestination)
        );
    }

    #[test]
    fn test_missing_source_is_reported() {
        let err = resolve_source(&ConfigFile::default(), &source_args(None)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::MissingSource)
        );
    }

    fn toggles(paths: &[&str]) -> SelectionArgs {
        SelectionArgs {
            toggles: paths.iter().map(|p| p.to_string()).collect(),
            select_all: false,
            selection: None,
        }
    }

    fn same_named_siblings() -> SourceTree {
        SourceTree::from_nodes(vec![
            Node::new_folder("x1", "X", "")
                .with_children(vec![Node::new_file("a", "one.txt", "X")]),
            Node::new_folder("x2", "X", "")
                .with_children(vec![Node::new_file("b", "two.txt", "X")]),
            Node::new_file("c", "todo.txt", ""),
        ])
        .unwrap()
    }

    #[test]
    fn test_toggle_rejects_path_shared_by_siblings() {
        let tree = same_named_siblings();
        let err = build_selection(&tree, &toggles(&["/X/"])).err().unwrap();
        assert!(err.to_string().contains("Ambiguous path"));
        assert!(err.to_string().contains("2 items"));
    }

    #[test]
    fn test_toggle_unique_path() {
        let tree = same_named_siblings();
        let selection = build_selection(&tree, &toggles(&["todo.txt"])).unwrap();
        assert_eq!(selection.get(&NodeId::new("c")), SelectionState::All);
        assert_eq!(selection.get(&NodeId::new("x1")), SelectionState::None);
    }

    #[test]
    fn test_make_bar() {
        assert_eq!(make_bar(0, 0, 4), "[░░░░]");
        assert_eq!(make_bar(2, 4, 4), "[██░░]");
        assert_eq!(make_bar(5, 4, 4), "[████]");
    }
}
