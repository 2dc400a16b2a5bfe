//! Inference building blocks shared by operator implementations.

use dfx_tensor::{DType, PartialShape, StorageType};

use crate::error::{OpError, Result};
use crate::schema::DispatchMode;

/// Fail unless `got == expected`.
pub fn check_arity(op: &str, what: &'static str, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(OpError::ArityMismatch {
            op: op.to_string(),
            what,
            expected,
            got,
        });
    }
    Ok(())
}

/// Merge `candidate` into `slot`, failing with `ShapeMismatch` on conflict.
pub fn assign_shape(
    op: &str,
    arg: &str,
    slot: &mut PartialShape,
    candidate: &PartialShape,
) -> Result<()> {
    let merged = slot.merge(candidate).map_err(|_| OpError::ShapeMismatch {
        op: op.to_string(),
        arg: arg.to_string(),
        expected: candidate.to_string(),
        got: slot.to_string(),
    })?;
    *slot = merged;
    Ok(())
}

fn slot_label(kind: &str, index: usize) -> String {
    format!("{} {}", kind, index)
}

/// Element-wise type unification over any number of inputs and outputs.
///
/// All slots must end up with one shared type. The first known type (inputs
/// first, then outputs) wins; every other known slot must match it and every
/// unknown slot is filled with it. Returns `Ok(false)` without touching any
/// slot when no type is known yet.
pub fn elemwise_type(
    op: &str,
    inputs: &mut [Option<DType>],
    outputs: &mut [Option<DType>],
) -> Result<bool> {
    let unified = match inputs.iter().chain(outputs.iter()).flatten().next() {
        Some(dtype) => *dtype,
        None => return Ok(false),
    };

    let labelled = inputs
        .iter_mut()
        .enumerate()
        .map(|(i, slot)| (slot_label("input", i), slot))
        .chain(
            outputs
                .iter_mut()
                .enumerate()
                .map(|(i, slot)| (slot_label("output", i), slot)),
        );

    for (label, slot) in labelled {
        match slot {
            Some(dtype) if *dtype != unified => {
                return Err(OpError::TypeMismatch {
                    op: op.to_string(),
                    arg: label,
                    expected: unified.to_string(),
                    got: dtype.to_string(),
                });
            }
            Some(_) => {}
            None => *slot = Some(unified),
        }
    }
    Ok(true)
}

/// Resolve every slot to dense storage and select the dense kernel,
/// whatever storage was hinted on the inputs.
pub fn dense_storage(
    inputs: &mut [Option<StorageType>],
    outputs: &mut [Option<StorageType>],
) -> DispatchMode {
    for slot in inputs.iter_mut().chain(outputs.iter_mut()) {
        *slot = Some(StorageType::Default);
    }
    DispatchMode::FCompute
}
