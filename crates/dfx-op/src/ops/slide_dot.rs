//! `slide_dot`: dense matrix product `(m, l) x (l, n) -> (m, n)`.

use dfx_tensor::{DType, PartialShape, Shape, StorageType, Tensor};
use tracing::trace;

use crate::error::{OpError, Result};
use crate::infer::{assign_shape, check_arity, dense_storage, elemwise_type};
use crate::param::{Attrs, OpParams, ParamDescriptor};
use crate::resource::{OpContext, ResourceRequest};
use crate::schema::{ArgumentDoc, DispatchMode, OpReq, OpSchema};

pub const OP_NAME: &str = "slide_dot";

const DESCRIPTION: &str = "Dot product of two arrays.

Multiplies a (m, l) matrix `lhs` by a (l, n) matrix `rhs`, producing a
(m, n) matrix. Both inputs must be dense float32.
";

/// Parameters of `slide_dot`. There are no tunable fields yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideDotParam {}

impl SlideDotParam {
    pub fn descriptor() -> ParamDescriptor {
        ParamDescriptor::builder("SlideDotParam").build()
    }

    pub fn from_attrs(attrs: &Attrs) -> Result<Self> {
        Self::descriptor().parse(attrs)?;
        Ok(SlideDotParam {})
    }
}

fn parse_params(attrs: &Attrs) -> Result<OpParams> {
    SlideDotParam::from_attrs(attrs).map(OpParams::SlideDot)
}

fn infer_shape(
    _params: &OpParams,
    inputs: &mut [PartialShape],
    outputs: &mut [PartialShape],
) -> Result<bool> {
    check_arity(OP_NAME, "inputs", 2, inputs.len())?;
    check_arity(OP_NAME, "outputs", 1, outputs.len())?;

    let matrix = PartialShape::with_rank(2);
    assign_shape(OP_NAME, "lhs", &mut inputs[0], &matrix)?;
    assign_shape(OP_NAME, "rhs", &mut inputs[1], &matrix)?;
    assign_shape(OP_NAME, "output", &mut outputs[0], &matrix)?;

    // (m, l) x (l, n) -> (m, n)
    let (lhs, rhs) = (&inputs[0], &inputs[1]);
    if let (Some(l), Some(l2)) = (lhs.dim(1), rhs.dim(0)) {
        if l != l2 {
            return Err(OpError::ShapeMismatch {
                op: OP_NAME.to_string(),
                arg: "rhs".to_string(),
                expected: PartialShape::from_dims(vec![Some(l), rhs.dim(1)]).to_string(),
                got: rhs.to_string(),
            });
        }
    }
    let l = lhs.dim(1).or(rhs.dim(0));
    let out = PartialShape::from_dims(vec![lhs.dim(0), rhs.dim(1)]);
    assign_shape(OP_NAME, "output", &mut outputs[0], &out)?;

    // A known output fills in m and n on the inputs.
    let (m, n) = (outputs[0].dim(0), outputs[0].dim(1));
    assign_shape(OP_NAME, "lhs", &mut inputs[0], &PartialShape::from_dims(vec![m, l]))?;
    assign_shape(OP_NAME, "rhs", &mut inputs[1], &PartialShape::from_dims(vec![l, n]))?;

    Ok(inputs.iter().chain(outputs.iter()).all(PartialShape::is_complete))
}

fn infer_type(
    _params: &OpParams,
    inputs: &mut [Option<DType>],
    outputs: &mut [Option<DType>],
) -> Result<bool> {
    check_arity(OP_NAME, "inputs", 2, inputs.len())?;
    check_arity(OP_NAME, "outputs", 1, outputs.len())?;
    elemwise_type(OP_NAME, inputs, outputs)
}

fn infer_storage_type(
    _params: &OpParams,
    inputs: &mut [Option<StorageType>],
    outputs: &mut [Option<StorageType>],
) -> Result<DispatchMode> {
    check_arity(OP_NAME, "inputs", 2, inputs.len())?;
    check_arity(OP_NAME, "outputs", 1, outputs.len())?;
    Ok(dense_storage(inputs, outputs))
}

fn resource_request(_params: &OpParams) -> Vec<ResourceRequest> {
    vec![ResourceRequest::TempSpace]
}

fn matrix_dims(arg: &str, shape: &Shape) -> Result<(usize, usize)> {
    if shape.ndim() != 2 {
        return Err(OpError::ShapeMismatch {
            op: OP_NAME.to_string(),
            arg: arg.to_string(),
            expected: "[?, ?]".to_string(),
            got: shape.to_string(),
        });
    }
    Ok((shape.dim(0), shape.dim(1)))
}

fn forward(
    _params: &OpParams,
    ctx: &mut OpContext<'_>,
    inputs: &[&Tensor],
    req: &[OpReq],
    outputs: &mut [&mut Tensor],
) -> Result<()> {
    check_arity(OP_NAME, "inputs", 2, inputs.len())?;
    check_arity(OP_NAME, "outputs", 1, outputs.len())?;
    check_arity(OP_NAME, "write requests", 1, req.len())?;

    let (lhs, rhs) = (inputs[0], inputs[1]);
    let out_dtype = outputs[0].dtype();
    if out_dtype != DType::F32 {
        return Err(OpError::UnsupportedDType {
            op: OP_NAME.to_string(),
            reason: format!("only float32 is supported, output is {}", out_dtype),
        });
    }
    for (arg, t) in [("lhs", lhs), ("rhs", rhs)] {
        if t.dtype() != out_dtype {
            return Err(OpError::UnsupportedDType {
                op: OP_NAME.to_string(),
                reason: format!(
                    "input and output types must match: {} is {}, output is {}",
                    arg,
                    t.dtype(),
                    out_dtype
                ),
            });
        }
    }
    for (arg, stype) in [
        ("lhs", lhs.storage_type()),
        ("rhs", rhs.storage_type()),
        ("output", outputs[0].storage_type()),
    ] {
        if !stype.is_dense() {
            return Err(OpError::UnsupportedStorage {
                op: OP_NAME.to_string(),
                arg: arg.to_string(),
                stype: stype.to_string(),
            });
        }
    }

    match req[0] {
        OpReq::Null => return Ok(()),
        OpReq::WriteTo | OpReq::WriteInplace => {}
        OpReq::AddTo => {
            return Err(OpError::UnsupportedWriteMode {
                op: OP_NAME.to_string(),
                req: req[0].to_string(),
            })
        }
    }

    let (m, l) = matrix_dims("lhs", lhs.shape())?;
    let (l2, n) = matrix_dims("rhs", rhs.shape())?;
    let out_dims = matrix_dims("output", outputs[0].shape())?;
    if l2 != l {
        return Err(OpError::ShapeMismatch {
            op: OP_NAME.to_string(),
            arg: "rhs".to_string(),
            expected: format!("[{}, {}]", l, n),
            got: rhs.shape().to_string(),
        });
    }
    if out_dims != (m, n) {
        return Err(OpError::ShapeMismatch {
            op: OP_NAME.to_string(),
            arg: "output".to_string(),
            expected: format!("[{}, {}]", m, n),
            got: outputs[0].shape().to_string(),
        });
    }

    trace!(m, l, n, backend = ctx.backend.name(), "slide_dot forward");
    let out = outputs[0].data_f32_mut()?;
    ctx.backend
        .matmul_into(lhs.data_f32()?, rhs.data_f32()?, out, m, l, n)?;
    Ok(())
}

/// Schema registered under `slide_dot`.
pub fn schema() -> OpSchema {
    OpSchema {
        name: OP_NAME,
        aliases: &["_sparse_slide_dot"],
        description: DESCRIPTION,
        arguments: vec![
            ArgumentDoc {
                name: "lhs",
                type_info: "NDArray-or-Symbol",
                doc: "The first input",
            },
            ArgumentDoc {
                name: "rhs",
                type_info: "NDArray-or-Symbol",
                doc: "The second input",
            },
        ],
        num_inputs: 2,
        num_outputs: 1,
        output_names: &["output"],
        params: SlideDotParam::descriptor(),
        parse_params,
        infer_shape,
        infer_type,
        infer_storage_type,
        resource_request,
        compute: forward,
        // Sparse compute path and backward operator are not implemented.
        compute_ex: None,
        gradient: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dfx_tensor::{CpuBackend, CpuStorage};
    use half::f16;
    use proptest::prelude::*;

    fn params() -> OpParams {
        OpParams::SlideDot(SlideDotParam::default())
    }

    fn known(dims: &[usize]) -> PartialShape {
        PartialShape::from(Shape::from_slice(dims))
    }

    fn matrix(rows: usize, cols: usize, data: &[f32]) -> Tensor {
        Tensor::new(data.to_vec(), Shape::new(vec![rows, cols]))
    }

    fn run(lhs: &Tensor, rhs: &Tensor, out: &mut Tensor, req: OpReq) -> Result<()> {
        let backend = CpuBackend::new();
        let mut ctx = OpContext::materialize(&backend, &resource_request(&params()), 0);
        forward(&params(), &mut ctx, &[lhs, rhs], &[req], &mut [out])
    }

    fn shapes(lhs: PartialShape, rhs: PartialShape, out: PartialShape) -> (Result<bool>, [PartialShape; 3]) {
        let mut ins = [lhs, rhs];
        let mut outs = [out];
        let res = infer_shape(&params(), &mut ins, &mut outs);
        let [a, b] = ins;
        let [c] = outs;
        (res, [a, b, c])
    }

    #[test]
    fn test_identity_times_matrix() {
        let a = matrix(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        let b = matrix(2, 2, &[5.0, 6.0, 7.0, 8.0]);
        let mut c = Tensor::zeros(DType::F32, Shape::new(vec![2, 2]));
        run(&a, &b, &mut c, OpReq::WriteTo).unwrap();
        assert_eq!(c.data_f32().unwrap(), &[5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_row_times_column() {
        let a = matrix(1, 3, &[1.0, 2.0, 3.0]);
        let b = matrix(3, 1, &[4.0, 5.0, 6.0]);
        let mut c = Tensor::zeros(DType::F32, Shape::new(vec![1, 1]));
        run(&a, &b, &mut c, OpReq::WriteTo).unwrap();
        assert_eq!(c.data_f32().unwrap(), &[32.0]);
    }

    #[test]
    fn test_inner_dim_mismatch_fails_inference() {
        let (res, _) = shapes(known(&[3, 4]), known(&[5, 6]), PartialShape::unknown());
        assert!(matches!(res, Err(OpError::ShapeMismatch { ref arg, .. }) if arg == "rhs"));
    }

    #[test]
    fn test_zeros_give_zeros() {
        let a = matrix(2, 2, &[0.0; 4]);
        let b = matrix(2, 2, &[0.0; 4]);
        let mut c = Tensor::new(vec![3.0; 4], Shape::new(vec![2, 2]));
        run(&a, &b, &mut c, OpReq::WriteTo).unwrap();
        assert_eq!(c.data_f32().unwrap(), &[0.0; 4]);
    }

    #[test]
    fn test_resource_request_is_single_temp_space() {
        assert_eq!(resource_request(&params()), vec![ResourceRequest::TempSpace]);
    }

    #[test]
    fn test_infer_output_shape() {
        let (res, [lhs, rhs, out]) =
            shapes(known(&[2, 3]), known(&[3, 5]), PartialShape::unknown());
        assert!(res.unwrap());
        assert_eq!(out, known(&[2, 5]));
        assert_eq!(lhs, known(&[2, 3]));
        assert_eq!(rhs, known(&[3, 5]));
    }

    #[test]
    fn test_infer_backfills_inputs_from_output() {
        let (res, [lhs, rhs, out]) = shapes(
            PartialShape::from_dims(vec![None, Some(3)]),
            PartialShape::from_dims(vec![None, None]),
            known(&[4, 7]),
        );
        assert!(res.unwrap());
        assert_eq!(lhs, known(&[4, 3]));
        assert_eq!(rhs, known(&[3, 7]));
        assert_eq!(out, known(&[4, 7]));
    }

    #[test]
    fn test_infer_defers_when_incomplete() {
        let (res, [lhs, rhs, out]) = shapes(
            PartialShape::unknown(),
            known(&[3, 5]),
            PartialShape::unknown(),
        );
        assert!(!res.unwrap());
        assert_eq!(lhs, PartialShape::from_dims(vec![None, Some(3)]));
        assert_eq!(rhs, known(&[3, 5]));
        assert_eq!(out, PartialShape::from_dims(vec![None, Some(5)]));
    }

    #[test]
    fn test_infer_output_conflict() {
        let (res, _) = shapes(known(&[2, 3]), known(&[3, 5]), known(&[2, 6]));
        assert!(matches!(res, Err(OpError::ShapeMismatch { ref arg, .. }) if arg == "output"));
    }

    #[test]
    fn test_infer_rejects_non_matrix() {
        let (res, _) = shapes(known(&[2, 3, 4]), known(&[4, 5]), PartialShape::unknown());
        assert!(matches!(res, Err(OpError::ShapeMismatch { ref arg, .. }) if arg == "lhs"));
    }

    #[test]
    fn test_infer_shape_arity() {
        let mut ins = [known(&[2, 2])];
        let mut outs = [PartialShape::unknown()];
        assert!(matches!(
            infer_shape(&params(), &mut ins, &mut outs),
            Err(OpError::ArityMismatch { what: "inputs", .. })
        ));
    }

    #[test]
    fn test_infer_type() {
        let mut ins = [Some(DType::F32), Some(DType::F32)];
        let mut outs = [None];
        assert!(infer_type(&params(), &mut ins, &mut outs).unwrap());
        assert_eq!(outs, [Some(DType::F32)]);

        let mut ins = [Some(DType::F32), Some(DType::F16)];
        let mut outs = [None];
        assert!(matches!(
            infer_type(&params(), &mut ins, &mut outs),
            Err(OpError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_infer_type_is_dtype_agnostic() {
        let mut ins = [Some(DType::I32), None];
        let mut outs = [None];
        assert!(infer_type(&params(), &mut ins, &mut outs).unwrap());
        assert_eq!(outs, [Some(DType::I32)]);
    }

    #[test]
    fn test_infer_storage_always_dense() {
        let mut ins = [Some(StorageType::Csr), None];
        let mut outs = [Some(StorageType::RowSparse)];
        let mode = infer_storage_type(&params(), &mut ins, &mut outs).unwrap();
        assert_eq!(mode, DispatchMode::FCompute);
        assert_eq!(ins, [Some(StorageType::Default); 2]);
        assert_eq!(outs, [Some(StorageType::Default)]);
    }

    #[test]
    fn test_non_f32_is_fatal_and_writes_nothing() {
        let h = |v: f32| f16::from_f32(v);
        let shape = Shape::new(vec![2, 2]);
        let a = Tensor::from_storage(
            CpuStorage::F16(vec![h(1.0); 4]),
            shape.clone(),
            StorageType::Default,
        )
        .unwrap();
        let b = a.clone();
        let sentinel = CpuStorage::F16(vec![h(9.0); 4]);
        let mut c = Tensor::from_storage(sentinel.clone(), shape, StorageType::Default).unwrap();

        let err = run(&a, &b, &mut c, OpReq::WriteTo).unwrap_err();
        assert!(matches!(err, OpError::UnsupportedDType { .. }));
        assert_eq!(c.storage(), &sentinel);
    }

    #[test]
    fn test_input_dtype_must_match_output() {
        let a = Tensor::zeros(DType::F64, Shape::new(vec![2, 2]));
        let b = matrix(2, 2, &[1.0; 4]);
        let mut c = Tensor::new(vec![9.0; 4], Shape::new(vec![2, 2]));
        let err = run(&a, &b, &mut c, OpReq::WriteTo).unwrap_err();
        assert!(matches!(err, OpError::UnsupportedDType { .. }));
        assert_eq!(c.data_f32().unwrap(), &[9.0; 4]);
    }

    #[test]
    fn test_sparse_input_rejected() {
        let a = Tensor::from_storage(
            CpuStorage::from_f32_vec(vec![1.0; 4]),
            Shape::new(vec![2, 2]),
            StorageType::Csr,
        )
        .unwrap();
        let b = matrix(2, 2, &[1.0; 4]);
        let mut c = Tensor::zeros(DType::F32, Shape::new(vec![2, 2]));
        let err = run(&a, &b, &mut c, OpReq::WriteTo).unwrap_err();
        assert!(matches!(err, OpError::UnsupportedStorage { ref arg, .. } if arg == "lhs"));
    }

    #[test]
    fn test_write_modes() {
        let a = matrix(1, 1, &[2.0]);
        let b = matrix(1, 1, &[3.0]);

        let mut c = matrix(1, 1, &[-1.0]);
        run(&a, &b, &mut c, OpReq::Null).unwrap();
        assert_eq!(c.data_f32().unwrap(), &[-1.0]);

        let err = run(&a, &b, &mut c, OpReq::AddTo).unwrap_err();
        assert!(matches!(err, OpError::UnsupportedWriteMode { .. }));
        assert_eq!(c.data_f32().unwrap(), &[-1.0]);

        run(&a, &b, &mut c, OpReq::WriteInplace).unwrap();
        assert_eq!(c.data_f32().unwrap(), &[6.0]);
    }

    #[test]
    fn test_compute_rejects_unresolved_shapes() {
        let a = matrix(2, 3, &[1.0; 6]);
        let b = matrix(2, 3, &[1.0; 6]);
        let mut c = Tensor::zeros(DType::F32, Shape::new(vec![2, 3]));
        assert!(matches!(
            run(&a, &b, &mut c, OpReq::WriteTo),
            Err(OpError::ShapeMismatch { ref arg, .. }) if arg == "rhs"
        ));

        let b = matrix(3, 2, &[1.0; 6]);
        assert!(matches!(
            run(&a, &b, &mut c, OpReq::WriteTo),
            Err(OpError::ShapeMismatch { ref arg, .. }) if arg == "output"
        ));
    }

    #[test]
    fn test_schema_metadata() {
        let s = schema();
        assert_eq!(s.name, "slide_dot");
        assert_eq!(s.input_names(), vec!["lhs", "rhs"]);
        assert_eq!(s.num_inputs, 2);
        assert_eq!(s.num_outputs, 1);
        assert!(s.compute_ex.is_none());
        assert!(s.gradient.is_none());
        assert!(s.describe().starts_with("Dot product of two arrays."));
        assert!(s.describe().contains("lhs : NDArray-or-Symbol\n    The first input\n"));
    }

    #[test]
    fn test_params_reject_unknown_keys() {
        assert!(SlideDotParam::from_attrs(&Attrs::new()).is_ok());
        let mut attrs = Attrs::new();
        attrs.insert("transpose_a".to_string(), "true".to_string());
        assert!(matches!(
            SlideDotParam::from_attrs(&attrs),
            Err(OpError::InvalidParam { .. })
        ));
    }

    fn operands() -> impl Strategy<Value = (usize, usize, usize, Vec<f32>, Vec<f32>)> {
        (1usize..6, 1usize..6, 1usize..6).prop_flat_map(|(m, l, n)| {
            (
                Just(m),
                Just(l),
                Just(n),
                prop::collection::vec(-10.0f32..10.0, m * l),
                prop::collection::vec(-10.0f32..10.0, l * n),
            )
        })
    }

    proptest! {
        #[test]
        fn prop_matches_left_to_right_product((m, l, n, a, b) in operands()) {
            let lhs = matrix(m, l, &a);
            let rhs = matrix(l, n, &b);
            let mut out = Tensor::new(vec![f32::NAN; m * n], Shape::new(vec![m, n]));
            run(&lhs, &rhs, &mut out, OpReq::WriteTo).unwrap();

            let got = out.data_f32().unwrap();
            for i in 0..m {
                for j in 0..n {
                    let expected = (0..l).fold(0.0f32, |acc, k| acc + a[i * l + k] * b[k * n + j]);
                    prop_assert_eq!(got[i * n + j], expected);
                }
            }
        }

        #[test]
        fn prop_shape_inference((m, l, n) in (1usize..64, 1usize..64, 1usize..64), l2 in 1usize..64) {
            let (res, [_, _, out]) = shapes(known(&[m, l]), known(&[l, n]), PartialShape::unknown());
            prop_assert!(res.unwrap());
            prop_assert_eq!(out, known(&[m, n]));

            let (res, _) = shapes(known(&[m, l]), known(&[l2, n]), PartialShape::unknown());
            prop_assert_eq!(res.is_err(), l != l2);
        }
    }
}
