//! Word-list harness for the ternary search tree.
//!
//! Loads a whitespace-separated word file and runs one operation against it,
//! reporting how long each step took.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, ensure, Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};
use tst_rs::{
    Config, CopyTree, Payload, RefTree, Removal, Storage, TernaryTree, TstError,
    DEFAULT_MAX_WORD_LEN,
};

#[derive(Debug, Parser)]
#[command(version, about = "Load a word list into a ternary search tree and query it")]
struct Cli {
    /// Whitespace-separated word list.
    #[arg(value_name = "WORDS")]
    words: PathBuf,
    /// Borrow words from the loaded file instead of copying them into the tree.
    #[arg(long)]
    reference: bool,
    /// Longest word accepted, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_WORD_LEN)]
    max_word_len: usize,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print every stored word in order with its occurrence count.
    Print {
        /// Refuse to print trees holding more words than this.
        #[arg(long, default_value_t = 100)]
        print_limit: usize,
    },
    /// Look up words.
    Find {
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// List stored words starting with a prefix.
    Suggest {
        prefix: String,
        #[arg(long, default_value_t = 1024)]
        max: usize,
    },
    /// Delete every loaded word in shuffled order, checking the tree as it
    /// shrinks.
    Validate {
        #[arg(long)]
        seed: Option<u64>,
        /// After each removal, look up every word not yet removed.
        #[arg(long)]
        exhaustive: bool,
    },
    /// Interactive menu over stdin. Always copies words.
    Repl,
}

fn main() -> Result<()> {
    // Logging setup
    let fmt_layer = fmt::layer().with_writer(io::stderr);
    let filter_layer = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env()
        .context("error reading logging directives")?;
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    let args = Cli::parse();
    let text = fs::read_to_string(&args.words)
        .with_context(|| format!("error reading word list {}", args.words.display()))?;
    let config = Config::with_max_word_len(args.max_word_len);

    if args.reference {
        if matches!(args.command, Command::Repl) {
            bail!("the repl adds words of its own and needs copy mode; drop --reference");
        }
        let tree: RefTree<'_> = load(&text, config)?;
        run(tree, &text, args.command)
    } else {
        let tree: CopyTree = load(&text, config)?;
        match args.command {
            Command::Repl => repl(tree),
            command => run(tree, &text, command),
        }
    }
}

fn load<'w, P: Payload<'w>>(text: &'w str, config: Config) -> Result<TernaryTree<P>> {
    let start = Instant::now();
    let mut tree = TernaryTree::with_config(config);
    let mut total = 0usize;
    for word in text.split_whitespace() {
        tree.insert(word)
            .with_context(|| format!("error inserting {word:?}"))?;
        total += 1;
    }
    let ownership = P::OWNERSHIP;
    info!(%ownership, total, distinct = tree.len(), "loaded word list");
    println!(
        "loaded {total} words ({} distinct, {} nodes) in {:.3?}",
        tree.len(),
        tree.node_count(),
        start.elapsed()
    );
    Ok(tree)
}

fn run<P: Storage>(mut tree: TernaryTree<P>, text: &str, command: Command) -> Result<()> {
    match command {
        Command::Print { print_limit } => {
            ensure!(
                tree.len() <= print_limit,
                "{} words exceed the print limit of {print_limit}; raise --print-limit",
                tree.len()
            );
            let start = Instant::now();
            tree.traverse(|entry| println!("{} {}", entry.word(), entry.occurrences()));
            println!("printed {} words in {:.3?}", tree.len(), start.elapsed());
        }
        Command::Find { words } => {
            for word in &words {
                find(&tree, word);
            }
        }
        Command::Suggest { prefix, max } => suggest(&tree, &prefix, max),
        Command::Validate { seed, exhaustive } => {
            let mut words: Vec<&str> = text.split_whitespace().collect();
            let seed = seed.unwrap_or_else(rand::random);
            words.shuffle(&mut StdRng::seed_from_u64(seed));
            println!("validating {} removals with seed {seed}", words.len());

            let start = Instant::now();
            validate(&mut tree, words, exhaustive)?;
            println!("validated in {:.3?}", start.elapsed());
        }
        Command::Repl => bail!("the repl needs copy mode"),
    }
    Ok(())
}

fn find<P: Storage>(tree: &TernaryTree<P>, word: &str) {
    let start = Instant::now();
    let entry = tree.get(word);
    let elapsed = start.elapsed();
    match entry {
        Some(entry) => println!(
            "{word}: found, {} occurrences ({elapsed:.3?})",
            entry.occurrences()
        ),
        None => println!("{word}: not found ({elapsed:.3?})"),
    }
}

fn suggest<P: Storage>(tree: &TernaryTree<P>, prefix: &str, max: usize) {
    let start = Instant::now();
    let found = tree.suggest(prefix, max);
    let elapsed = start.elapsed();
    match found {
        Some(words) => {
            for word in &words {
                println!("{word}");
            }
            let note = if words.len() == max { ", may be truncated" } else { "" };
            println!("{} suggestions{note} ({elapsed:.3?})", words.len());
        }
        None => println!("no words start with {prefix:?} ({elapsed:.3?})"),
    }
}

/// Remove `pending` one word at a time until the tree is empty.
///
/// Words whose removal is refused as unrotatable are retried in a later round,
/// once other removals have changed the tree's shape.
fn validate<P: Storage>(tree: &mut TernaryTree<P>, mut pending: Vec<&str>, exhaustive: bool) -> Result<()> {
    let mut round = 0;
    while !pending.is_empty() {
        round += 1;
        let mut refused = Vec::new();
        for (i, &word) in pending.iter().enumerate() {
            ensure!(tree.contains(word), "{word:?} missing before its removal");

            let gone = match tree.remove(word) {
                Ok(Removal::Removed(_)) => true,
                Ok(Removal::Retained(_)) => false,
                Ok(Removal::NotFound) => bail!("{word:?} not found for removal"),
                Err(TstError::Unrotatable { .. }) => {
                    refused.push(word);
                    false
                }
                Err(err) => return Err(err).with_context(|| format!("error removing {word:?}")),
            };
            if gone {
                ensure!(!tree.contains(word), "{word:?} still found after its last removal");
            }

            if exhaustive {
                for &rest in pending[i + 1..].iter().chain(&refused) {
                    ensure!(tree.contains(rest), "{rest:?} lost while removing {word:?}");
                }
            }
        }

        debug!(round, refused = refused.len(), left = tree.len(), "validation round done");
        ensure!(
            refused.len() < pending.len(),
            "{} words could not be removed from the tree",
            refused.len()
        );
        pending = refused;
    }

    ensure!(tree.is_empty(), "{} words left after removing everything", tree.len());
    ensure!(tree.node_count() == 0, "{} nodes leaked", tree.node_count());
    println!("tree empty after {round} rounds");
    Ok(())
}

const MENU: &str = "\
 p) print   a) add   f) find   s) suggest   d) delete   q) quit
choice: ";

fn repl(mut tree: CopyTree) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let Some(choice) = prompt(&mut lines, MENU)? else {
            break;
        };
        match choice.as_str() {
            "p" => {
                let start = Instant::now();
                tree.traverse(|entry| println!("{} {}", entry.word(), entry.occurrences()));
                println!("{} words ({:.3?})", tree.len(), start.elapsed());
            }
            "a" => {
                let Some(word) = prompt(&mut lines, "word to add: ")? else {
                    break;
                };
                let start = Instant::now();
                match tree.insert(&word) {
                    Ok(entry) if entry.occurrences() > 1 => println!(
                        "{word}: already present, now {} occurrences ({:.3?})",
                        entry.occurrences(),
                        start.elapsed()
                    ),
                    Ok(_) => println!("{word}: added ({:.3?})", start.elapsed()),
                    Err(err) => println!("{word}: {err}"),
                }
            }
            "f" => {
                let Some(word) = prompt(&mut lines, "word to find: ")? else {
                    break;
                };
                find(&tree, &word);
            }
            "s" => {
                let Some(prefix) = prompt(&mut lines, "prefix: ")? else {
                    break;
                };
                suggest(&tree, &prefix, 1024);
            }
            "d" => {
                let Some(word) = prompt(&mut lines, "word to delete: ")? else {
                    break;
                };
                let start = Instant::now();
                let outcome = match tree.remove(&word) {
                    Ok(Removal::Removed(_)) => "deleted".to_owned(),
                    Ok(Removal::Retained(entry)) => {
                        format!("{} occurrences left", entry.occurrences())
                    }
                    Ok(Removal::NotFound) => "not found".to_owned(),
                    Err(err) => err.to_string(),
                };
                println!("{word}: {outcome} ({:.3?})", start.elapsed());
            }
            "q" => break,
            "" => {}
            other => println!("unknown choice {other:?}"),
        }
    }

    let freed = tree.clear();
    debug!(freed, "tree torn down");
    Ok(())
}

/// Print `label` and read one trimmed line; `None` at end of input.
fn prompt(lines: &mut impl Iterator<Item = io::Result<String>>, label: &str) -> Result<Option<String>> {
    print!("{label}");
    io::stdout().flush().context("error writing to stdout")?;
    match lines.next() {
        Some(line) => Ok(Some(line.context("error reading stdin")?.trim().to_owned())),
        None => Ok(None),
    }
}
