use super::*;
use crate::utils::testing::{check_tensor_near, create_test_param, create_test_tensor};

#[test]
fn test_first_step_is_plain_descent() -> Result<()> {
    let p = create_test_param(vec![1.0, -1.0], vec![2]);
    p.accumulate_grad(&create_test_tensor(vec![2.0, -4.0], vec![2]))?;
    let mut sgd = Sgd::new(OptimizerConfig::with_lr(0.1))?.with_momentum(0.5)?;
    sgd.step(&[p.clone()])?;
    check_tensor_near(&p.value(), &[2], &[0.8, -0.6], 1e-12);
    Ok(())
}

#[test]
fn test_momentum_blends_previous_delta() -> Result<()> {
    let p = create_test_param(vec![0.0], vec![1]);
    let mut sgd = Sgd::new(OptimizerConfig::with_lr(1.0))?.with_momentum(0.5)?;

    p.accumulate_grad(&create_test_tensor(vec![2.0], vec![1]))?;
    sgd.step(&[p.clone()])?;
    // Δ1 = -2
    check_tensor_near(&p.value(), &[1], &[-2.0], 1e-12);

    p.accumulate_grad(&create_test_tensor(vec![4.0], vec![1]))?;
    sgd.step(&[p.clone()])?;
    // Δ2 = 0.5·(-2) - 0.5·4 = -3
    check_tensor_near(&p.value(), &[1], &[-5.0], 1e-12);
    Ok(())
}

#[test]
fn test_momentum_range() {
    let sgd = Sgd::new(OptimizerConfig::default()).unwrap();
    assert!(matches!(sgd.with_momentum(1.0), Err(ToychError::ConfigurationError(_))));
}

#[test]
fn test_state_is_per_parameter() -> Result<()> {
    let p = create_test_param(vec![0.0], vec![1]);
    let q = create_test_param(vec![0.0], vec![1]);
    let mut sgd = Sgd::new(OptimizerConfig::with_lr(1.0))?.with_momentum(0.5)?;
    p.accumulate_grad(&create_test_tensor(vec![1.0], vec![1]))?;
    sgd.step(&[p.clone()])?;

    q.accumulate_grad(&create_test_tensor(vec![1.0], vec![1]))?;
    sgd.step(&[q.clone()])?;
    check_tensor_near(&q.value(), &[1], &[-1.0], 1e-12);
    Ok(())
}
