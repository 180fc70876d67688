//! Postfix stack evaluation.

use std::borrow::Cow;

use mesh_types::DomainTopology;

use crate::error::{RegionError, RegionResult};
use crate::kind::SetOperator;
use crate::leaf::EvalContext;
use crate::parser::StackOp;
use crate::region::Region;

/// Combine two operands with a set operator.
///
/// # Errors
///
/// See [`Region::combine`].
pub fn eval_operator(
    item1: &Region,
    item2: &Region,
    operator: SetOperator,
    topology: &DomainTopology,
) -> RegionResult<Region> {
    item1.combine(item2, operator, topology)
}

/// Replay a postfix stack and return the resulting region.
///
/// Leaves push a region; operators pop `item2`, then `item1`, and push
/// `item1 <op> item2`. Named references stay borrowed until the end, so the
/// result is only cloned when the whole expression is a single reference.
///
/// # Errors
///
/// Propagates leaf and operator errors. Returns
/// [`RegionError::MalformedExpression`] unless exactly one region remains.
pub fn visit_stack(stack: &[StackOp], ctx: &EvalContext<'_>) -> RegionResult<Region> {
    let mut operands: Vec<Cow<'_, Region>> = Vec::with_capacity(stack.len());
    for op in stack {
        match op {
            StackOp::Leaf(leaf) => operands.push(ctx.eval_leaf(leaf)?),
            StackOp::Op(operator) => {
                let remaining = operands.len();
                let (Some(item2), Some(item1)) = (operands.pop(), operands.pop()) else {
                    return Err(RegionError::MalformedExpression { remaining });
                };
                let result = eval_operator(&item1, &item2, *operator, ctx.topology)?;
                operands.push(Cow::Owned(result));
            }
        }
    }

    if operands.len() != 1 {
        return Err(RegionError::MalformedExpression {
            remaining: operands.len(),
        });
    }
    operands
        .pop()
        .map(Cow::into_owned)
        .ok_or(RegionError::MalformedExpression { remaining: 0 })
}
