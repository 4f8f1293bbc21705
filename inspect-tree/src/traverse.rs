//! Lazy pre-order traversal over any tree shape.
//!
//! The traversal does not know anything about the node type. Callers hand
//! in a children selector, so the same primitive walks arena ids, view
//! handles or plain owned structs.

/// Pre-order iterator returned by [`traverse`] and [`traverse_forest`].
///
/// Children of a node are only requested once that node has been yielded.
pub struct PreOrder<N, F> {
    stack: Vec<N>,
    children: F,
}

/// Walk `root` in pre-order: the node itself, then each child's subtree
/// from left to right.
pub fn traverse<N, F, I>(root: N, children: F) -> PreOrder<N, F>
where
    F: FnMut(&N) -> I,
    I: IntoIterator<Item = N>,
{
    PreOrder {
        stack: vec![root],
        children,
    }
}

/// Walk several sibling roots in order, each in pre-order.
pub fn traverse_forest<N, F, I>(roots: impl IntoIterator<Item = N>, children: F) -> PreOrder<N, F>
where
    F: FnMut(&N) -> I,
    I: IntoIterator<Item = N>,
{
    let mut stack: Vec<N> = roots.into_iter().collect();
    stack.reverse();
    PreOrder { stack, children }
}

impl<N, F, I> Iterator for PreOrder<N, F>
where
    F: FnMut(&N) -> I,
    I: IntoIterator<Item = N>,
{
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let node = self.stack.pop()?;
        let mark = self.stack.len();
        self.stack.extend((self.children)(&node));
        // Reverse the freshly pushed children so the leftmost pops first.
        self.stack[mark..].reverse();
        Some(node)
    }
}
