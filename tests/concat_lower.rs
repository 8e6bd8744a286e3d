use loft::backend::Backend;
use loft::ir::{verify_module, Dim, IRModule, Instr, ValueShape};
use loft::lower::{concat_along_axis, LowerError};
use loft::types::DType;

#[test]
fn static_inputs_take_the_fast_path() {
    let mut ir = IRModule::new();
    let gpu = Backend::gpu_reference();
    let a = ir.param(ValueShape::from_static(DType::F32, &[4, 8]));
    let b = ir.param(ValueShape::from_static(DType::F32, &[6, 8]));
    let before = ir.instrs.len();

    let lowered = concat_along_axis(&mut ir, &gpu, &[a, b], 0).unwrap();

    assert_eq!(lowered.runtime_extent, None);
    let shape = ir.shape_of(lowered.value).unwrap();
    assert_eq!(shape.dims, vec![Dim::Static(10), Dim::Static(8)]);

    // Zero run-time overhead: exactly one instruction, the concat itself.
    assert_eq!(ir.instrs.len(), before + 1);
    assert!(matches!(ir.instrs.last(), Some(Instr::Concat { .. })));

    ir.instrs.push(Instr::Output(lowered.value));
    verify_module(&ir).unwrap();
}

#[test]
fn static_sum_covers_middle_axis() {
    let mut ir = IRModule::new();
    let gpu = Backend::gpu_reference();
    let a = ir.param(ValueShape::from_static(DType::F32, &[3, 5, 7]));
    let b = ir.param(ValueShape::from_static(DType::F32, &[3, 2, 7]));

    let lowered = concat_along_axis(&mut ir, &gpu, &[a, b], 1).unwrap();
    let shape = ir.shape_of(lowered.value).unwrap();
    assert_eq!(
        shape.dims,
        vec![Dim::Static(3), Dim::Static(7), Dim::Static(7)]
    );
}

#[test]
fn rank_mismatch_is_a_shape_inference_error() {
    let mut ir = IRModule::new();
    let gpu = Backend::gpu_reference();
    let a = ir.param(ValueShape::from_static(DType::F32, &[4, 8]));
    let b = ir.param(ValueShape::from_static(DType::F32, &[4, 8, 2]));
    let before = ir.instrs.len();

    let err = concat_along_axis(&mut ir, &gpu, &[a, b], 0).unwrap_err();
    match err {
        LowerError::RankMismatch {
            expected,
            found,
            input,
            ..
        } => {
            assert_eq!(expected, 2);
            assert_eq!(found, 3);
            assert_eq!(input, 1);
        }
        other => panic!("expected RankMismatch, got {other:?}"),
    }
    // No partial result: nothing was emitted.
    assert_eq!(ir.instrs.len(), before);
}

#[test]
fn axis_out_of_range_is_a_shape_inference_error() {
    let mut ir = IRModule::new();
    let gpu = Backend::gpu_reference();
    let a = ir.param(ValueShape::from_static(DType::F32, &[4, 8]));
    let b = ir.param(ValueShape::from_static(DType::F32, &[6, 8]));

    let err = concat_along_axis(&mut ir, &gpu, &[a, b], 2).unwrap_err();
    assert!(matches!(
        err,
        LowerError::AxisOutOfRange { axis: 2, rank: 2, .. }
    ));
}

#[test]
fn fixed_axis_extent_mismatch_is_rejected() {
    let mut ir = IRModule::new();
    let gpu = Backend::gpu_reference();
    let a = ir.param(ValueShape::from_static(DType::F32, &[4, 8]));
    let b = ir.param(ValueShape::from_static(DType::F32, &[6, 9]));

    let err = concat_along_axis(&mut ir, &gpu, &[a, b], 0).unwrap_err();
    match err {
        LowerError::ExtentMismatch {
            axis,
            expected,
            found,
            input,
            ..
        } => {
            assert_eq!(axis, 1);
            assert_eq!(expected, 8);
            assert_eq!(found, 9);
            assert_eq!(input, 1);
        }
        other => panic!("expected ExtentMismatch, got {other:?}"),
    }
}

#[test]
fn empty_input_list_is_rejected() {
    let mut ir = IRModule::new();
    let gpu = Backend::gpu_reference();
    let err = concat_along_axis(&mut ir, &gpu, &[], 0).unwrap_err();
    assert!(matches!(err, LowerError::NoInputs { .. }));
}

#[test]
fn value_without_shape_metadata_is_rejected() {
    let mut ir = IRModule::new();
    let gpu = Backend::gpu_reference();
    let a = ir.param(ValueShape::from_static(DType::F32, &[4, 8]));
    let bare = ir.fresh();
    ir.instrs.push(Instr::Param(bare));

    let err = concat_along_axis(&mut ir, &gpu, &[a, bare], 0).unwrap_err();
    assert!(matches!(err, LowerError::MissingShape { input: 1, .. }));
}

#[test]
fn backend_without_extent_queries_fails_only_for_dynamic_inputs() {
    let cpu = Backend {
        name: "cpu".to_string(),
        supported: vec![DType::F32, DType::I32],
        dynamic_extents: false,
    };

    // Static concat still lowers.
    let mut ir = IRModule::new();
    let a = ir.param(ValueShape::from_static(DType::F32, &[4, 8]));
    let b = ir.param(ValueShape::from_static(DType::F32, &[6, 8]));
    concat_along_axis(&mut ir, &cpu, &[a, b], 0).unwrap();

    // A dynamic input hits the capability error before anything is emitted.
    let mut ir = IRModule::new();
    let a = ir.dynamic_param(DType::F32, &[20, 8], 0, Some(20));
    let b = ir.param(ValueShape::from_static(DType::F32, &[6, 8]));
    let before = ir.instrs.len();
    let err = concat_along_axis(&mut ir, &cpu, &[a, b], 0).unwrap_err();
    match err {
        LowerError::DynamicExtentUnsupported { op, backend } => {
            assert_eq!(op, "tensor.concat");
            assert_eq!(backend, "cpu");
        }
        other => panic!("expected DynamicExtentUnsupported, got {other:?}"),
    }
    assert_eq!(ir.instrs.len(), before);
}

#[test]
fn emitted_dynamic_lowering_passes_the_verifier() {
    let mut ir = IRModule::new();
    let gpu = Backend::gpu_reference();
    let a = ir.dynamic_param(DType::F32, &[20, 64], 0, Some(20));
    let b = ir.param(ValueShape::from_static(DType::F32, &[2, 64]));
    let c = ir.dynamic_param(DType::F32, &[10, 64], 0, Some(10));

    let lowered = concat_along_axis(&mut ir, &gpu, &[a, b, c], 0).unwrap();
    ir.instrs.push(Instr::Output(lowered.value));
    verify_module(&ir).unwrap();
}
