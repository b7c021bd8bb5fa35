//! Cross-boundary chain execution.
//!
//! A chain `a >> b >> c` runs in stages. Stage 0 matches `a` below the
//! query root; each later stage matches its part below every node the
//! previous stage produced. The captured stage (the one marked with `*`, or
//! the last one) supplies the result.

use std::cell::OnceCell;

use tracing::{debug, debug_span};

use crate::assembler::DocumentOrder;
use crate::matcher::Matcher;
use crate::tree::SelectorTree;
use crate::CompiledPart;

/// The state between two stages.
struct Stage<N> {
    /// Index of the part that produced `contexts`; `None` before stage 0.
    index: Option<usize>,
    /// Contexts for the next part, in document order.
    contexts: Vec<N>,
}

/// Run `parts` against `tree` starting from `root`.
///
/// Every stage runs, even after the captured one or after a stage that
/// matched nothing. The result is the captured stage's match set in
/// document order.
pub fn execute<T: SelectorTree>(tree: &T, parts: &[CompiledPart], root: T::Node) -> Vec<T::Node> {
    let captured = parts
        .iter()
        .position(|part| part.capture)
        .unwrap_or_else(|| parts.len().saturating_sub(1));
    // Only needed once a stage has several contexts.
    let order_cell: OnceCell<DocumentOrder<T>> = OnceCell::new();
    let order = || order_cell.get_or_init(|| DocumentOrder::new(tree, root));

    let mut stage = Stage {
        index: None,
        contexts: vec![root],
    };
    let mut result = Vec::new();

    for (index, part) in parts.iter().enumerate() {
        let _span = debug_span!("stage", index, engine = %part.engine).entered();

        let per_context = stage.contexts.iter().map(|&context| {
            Matcher::new(tree, context, part.engine.pierces_shadow()).query(&part.clause)
        });
        let matches: Vec<T::Node> = if stage.contexts.len() == 1 {
            // One context: the matcher's pre-order is already document order.
            per_context.flatten().collect()
        } else {
            order().assemble(per_context)
        };
        debug!(
            contexts = stage.contexts.len(),
            matches = matches.len(),
            after = ?stage.index,
            "stage done"
        );

        if index == captured {
            result.clone_from(&matches);
        }
        stage = Stage {
            index: Some(index),
            contexts: matches,
        };
    }

    if captured + 1 < parts.len() {
        debug!(captured, "later stages discarded");
    }
    result
}
