use super::*;
use crate::utils::testing::{check_tensor_near, create_test_param, create_test_tensor};

#[test]
fn test_staging_sums_contributions_per_parameter() -> Result<()> {
    let p = create_test_param(vec![0.0, 0.0], vec![2]);
    let q = create_test_param(vec![0.0], vec![1]);
    let mut staging = ParamStaging::default();
    assert!(staging.is_empty());

    staging.accumulate(&q, create_test_tensor(vec![1.0], vec![1]))?;
    staging.accumulate(&p, create_test_tensor(vec![1.0, 2.0], vec![2]))?;
    staging.accumulate(&p.clone(), create_test_tensor(vec![3.0, 4.0], vec![2]))?;
    assert!(!p.has_grad(), "nothing reaches the parameter before commit");

    let committed = staging.commit()?;
    assert_eq!(committed, vec![q.clone(), p.clone()]);
    check_tensor_near(&p.grad(), &[2], &[4.0, 6.0], 1e-12);
    check_tensor_near(&q.grad(), &[1], &[1.0], 1e-12);
    Ok(())
}

#[test]
fn test_staging_rejects_wrong_shape() {
    let p = create_test_param(vec![0.0, 0.0], vec![2]);
    let mut staging = ParamStaging::default();
    let err = staging
        .accumulate(&p, create_test_tensor(vec![1.0, 2.0, 3.0], vec![3]))
        .unwrap_err();
    assert!(matches!(err, ToychError::ShapeMismatch { .. }));
    assert!(staging.is_empty());
}

#[test]
fn test_staged_updates_change_value_and_version() -> Result<()> {
    let p = create_test_param(vec![1.0, 1.0], vec![2]);
    let mut staging = ParamStaging::default();
    staging.update(&p, create_test_tensor(vec![0.5, -0.5], vec![2]))?;
    staging.update(&p, create_test_tensor(vec![0.5, -0.5], vec![2]))?;
    assert_eq!(p.version(), 0);

    let committed = staging.commit()?;
    assert!(committed.is_empty(), "direct updates are not gradients");
    check_tensor_near(&p.value(), &[2], &[2.0, 0.0], 1e-12);
    assert_eq!(p.version(), 1);
    assert!(!p.has_grad());
    Ok(())
}

#[test]
fn test_context_accessors() -> Result<()> {
    let inputs = vec![
        Arc::new(create_test_tensor(vec![1.0, 2.0], vec![2])),
        Arc::new(create_test_tensor(vec![3.0], vec![1])),
    ];
    let output = create_test_tensor(vec![4.0, 5.0], vec![2]);
    let needs = [true, false];
    let mut staging = ParamStaging::default();
    let ctx = BackwardContext::new(&inputs, &output, &needs, &mut staging);

    assert_eq!(ctx.input(1)?.data(), &[3.0]);
    assert_eq!(ctx.inputs().len(), 2);
    assert_eq!(ctx.output().data(), &[4.0, 5.0]);
    assert!(ctx.needs_grad(0));
    assert!(!ctx.needs_grad(1));
    assert!(!ctx.needs_grad(7));
    assert!(matches!(ctx.input(2), Err(ToychError::InternalError(_))));
    Ok(())
}

#[test]
fn test_nested_context_shares_staging() -> Result<()> {
    let p = create_test_param(vec![0.0], vec![1]);
    let outer_inputs = vec![Arc::new(create_test_tensor(vec![1.0], vec![1]))];
    let inner_inputs = vec![Arc::new(create_test_tensor(vec![2.0, 2.0], vec![2]))];
    let output = create_test_tensor(vec![0.0], vec![1]);
    let inner_output = create_test_tensor(vec![0.0, 0.0], vec![2]);
    let mut staging = ParamStaging::default();
    {
        let mut ctx = BackwardContext::new(&outer_inputs, &output, &[true], &mut staging);
        ctx.accumulate(&p, create_test_tensor(vec![1.0], vec![1]))?;
        let mut inner = ctx.with_tensors(&inner_inputs, &inner_output, &[false]);
        assert_eq!(inner.input(0)?.shape(), &[2]);
        inner.accumulate(&p, create_test_tensor(vec![2.0], vec![1]))?;
    }
    staging.commit()?;
    check_tensor_near(&p.grad(), &[1], &[3.0], 1e-12);
    Ok(())
}
