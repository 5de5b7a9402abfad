//! Reverse-mode traversal of the computational graph

use super::Tensor;
use ndarray::Array1;
use std::collections::HashSet;

/// Backward step of one differentiable operation
///
/// `backward` reads the gradient of the op's output and accumulates the
/// partial gradients into its inputs. It must not recurse: the engine calls
/// every op exactly once, in reverse topological order.
pub trait BackwardOp {
    /// Propagate the output gradient into the inputs
    fn backward(&self);

    /// Inputs of the operation, used to order the traversal
    fn inputs(&self) -> Vec<Tensor>;
}

/// Run back-propagation rooted at `root`
pub(crate) fn run(root: &Tensor, grad_output: Option<Array1<f32>>) {
    let seed = grad_output.unwrap_or_else(|| Array1::ones(root.len()));
    root.accumulate_grad(seed);

    for node in topological_order(root).iter().rev() {
        if let Some(op) = node.backward_op() {
            op.backward();
        }
    }
}

/// Post-order of the graph below `root` (inputs before the nodes using them)
fn topological_order(root: &Tensor) -> Vec<Tensor> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![(root.clone(), false)];

    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            order.push(node);
            continue;
        }
        if !visited.insert(node.id()) {
            continue;
        }
        let op = node.backward_op();
        stack.push((node, true));
        if let Some(op) = op {
            for input in op.inputs() {
                if input.requires_grad() && !visited.contains(&input.id()) {
                    stack.push((input, false));
                }
            }
        }
    }

    order
}
