//! `tg-trace`: traces a set of sample graphs with the `tracegraph`
//! library and writes their wire encodings to the output directory.
//!
//! **Outputs:**
//! - `<out>/double.json`: a conditional arithmetic op
//! - `<out>/meters.json`: a user class with a traced method
//! - `<out>/countdown.json`: a graph embedding a while loop
//! - `<out>/friends.json`: ordered B-tree writes and reads
//!
//! **Usage:**
//! ```
//! tg-trace [--out <path>]
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::fs;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use indexmap::IndexMap;
use tracegraph::{wire, BTree, ClassRegistry, Context, ErrorCode, RangeSpec, State, Tracer, Uri};

/// Trace the sample graphs and write their wire encodings.
#[derive(Parser)]
#[command(name = "tg-trace", about = "Trace sample graphs and emit their wire encodings")]
struct Args {
    /// Output directory for encoded graphs.
    #[arg(long, default_value = "traced")]
    out: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let out = &args.out;

    fs::create_dir_all(out)
        .with_context(|| format!("Failed to create output directory: {}", out.display()))?;

    let registry = ClassRegistry::new();

    write_artifact(out, "double.json", double_op(&registry)?)?;
    write_artifact(out, "meters.json", meters_class(&registry)?)?;
    write_artifact(out, "countdown.json", countdown_graph()?)?;
    write_artifact(out, "friends.json", friends_graph()?)?;

    Ok(())
}

fn write_artifact(out: &std::path::Path, name: &str, encoded: serde_json::Value) -> Result<()> {
    let path = out.join(name);
    let text = serde_json::to_string_pretty(&encoded)
        .with_context(|| format!("Failed to serialize {name}"))?;
    fs::write(&path, &text).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("  Written: {} ({} bytes)", path.display(), text.len());
    Ok(())
}

/// `f(x) = if x >= 0 { x * 2 } else { error }` over a symbolic integer.
fn double_op(registry: &ClassRegistry) -> Result<serde_json::Value> {
    let tracer = Tracer::new(registry);
    let (op, sig) = tracer.get_op("double", "Int", Some("Int"), |_cxt, x| {
        let nonneg = x.gte(&State::int(0))?;
        let doubled = x.mul(&State::int(2))?;
        tracegraph::if_then_else(
            nonneg,
            doubled,
            State::error(ErrorCode::BadRequest, "negative input"),
        )
    })?;
    println!(
        "double: {} parameter(s), returns {}, {} assignment(s)",
        sig.params.len(),
        sig.rtype,
        op.graph().len()
    );
    Ok(wire::encode_op(&op))
}

/// A unit-of-measure class with one traced method.
fn meters_class(registry: &ClassRegistry) -> Result<serde_json::Value> {
    let class = registry
        .class(Uri::new("/app/units/meters"))
        .extends(Uri::new("/state/scalar/value/number/float"))
        .get_method("scaled", "Float", |_cxt, this, factor| {
            this.member("value", Uri::new("/state/scalar/value/number/float"))
                .mul(&factor)
        })
        .build()?;
    println!(
        "meters: class {} extends {}, {} method(s)",
        class.uri(),
        class.parent(),
        class.methods().len()
    );
    Ok(wire::encode_class(&class))
}

/// Counts a symbolic integer down to zero.
fn countdown_graph() -> Result<serde_json::Value> {
    let mut state0 = IndexMap::new();
    state0.insert("i".to_owned(), State::int(10));

    let looped = tracegraph::while_loop(
        state0,
        |_cxt, args| args["i"].gt(&State::int(0)),
        |_cxt, args| args["i"].sub(&State::int(1)),
    )?;

    let graph = Context::new().finalize(Some(looped))?;
    println!("countdown: {} assignment(s)", graph.len());
    Ok(wire::encode_context(&graph))
}

/// Inserts into a remote B-tree, then counts a slice of it, in order.
fn friends_graph() -> Result<serde_json::Value> {
    let tree = BTree::new(State::link(Uri::new("/app/friends")));

    let insert = tree.insert(vec![State::string("alice"), State::int(3)]);
    let named = tree.slice(RangeSpec::normalize(Some(State::string("alice"))));
    let count = tracegraph::after(vec![insert], named.count());

    let graph = Context::new().finalize(Some(count))?;
    println!("friends: {} assignment(s)", graph.len());
    Ok(wire::encode_context(&graph))
}
