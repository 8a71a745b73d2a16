use super::*;
use crate::autograd::grad_check::check_grad;
use crate::autograd::not_training;
use crate::tensor::Tensor;
use crate::utils::testing::{check_tensor_near, create_test_tensor};
use std::cell::RefCell;

fn input(rows: usize, width: usize) -> Var {
    let data = (0..rows * width).map(|i| 0.1 * i as f64 - 0.3).collect();
    Var::constant(create_test_tensor(data, vec![rows, width]))
}

/// Every weight zero except a cell-candidate bias of 1.
fn constant_cell() -> Result<Lstm> {
    let mut lstm = Lstm::new(2)?;
    lstm.forward(&input(1, 2))?;
    lstm.reset_state();
    for param in lstm.parameters() {
        param.set_value(crate::tensor::zeros_like(&param.value()))?;
    }
    lstm.parameters()[3].set_value(create_test_tensor(vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0], vec![3, 2]))?;
    Ok(lstm)
}

#[test]
fn test_zero_hidden_rejected() {
    assert!(matches!(Lstm::new(0), Err(ToychError::InvalidArgument(_))));
}

#[test]
fn test_shapes_and_parameters() -> Result<()> {
    let mut lstm = Lstm::with_seed(3, 11)?;
    assert_eq!(lstm.state().0.shape(), &[1, 3]);
    // Only the recurrent transforms are built before the first input.
    assert_eq!(lstm.parameters().len(), 4);

    let h = lstm.forward(&input(2, 4))?;
    assert_eq!(h.shape(), &[2, 3]);
    assert_eq!(lstm.state().1.shape(), &[2, 3]);

    let named = lstm.named_parameters();
    assert_eq!(named.len(), 8);
    assert_eq!(named[0].0, "w_forget.weights");
    assert_eq!(named[0].1.shape(), vec![5, 3]);
    assert_eq!(named[7].0, "u_cell.weights");
    assert_eq!(named[7].1.shape(), vec![3, 3]);
    Ok(())
}

#[test]
fn test_step_values() -> Result<()> {
    let mut lstm = constant_cell()?;
    let x = input(1, 2);
    // f = i = o = 0.5, c̃ = tanh(1)
    let h1 = lstm.forward(&x)?;
    check_tensor_near(lstm.state().1.value(), &[1, 2], &[0.380797077977882, 0.380797077977882], 1e-12);
    check_tensor_near(h1.value(), &[1, 2], &[0.181699742194526, 0.181699742194526], 1e-12);

    let h2 = lstm.forward(&x)?;
    check_tensor_near(lstm.state().1.value(), &[1, 2], &[0.571195616966882, 0.571195616966882], 1e-12);
    check_tensor_near(h2.value(), &[1, 2], &[0.258118401869521, 0.258118401869521], 1e-12);
    Ok(())
}

#[test]
fn test_gradients_reach_input_and_recurrent_weights() -> Result<()> {
    let mut lstm = Lstm::with_seed(3, 5)?;
    let x = input(2, 4);
    lstm.forward(&x)?;
    lstm.forward(&x)?;
    let h = lstm.forward(&x)?;
    let params = h.pow(2.0)?.sum()?.backward()?;
    assert_eq!(params.len(), 8);
    for (name, param) in lstm.named_parameters() {
        assert!(param.has_grad(), "{} got no gradient", name);
        assert!(param.grad().abs_max() > 0.0, "{} got a zero gradient", name);
    }
    Ok(())
}

#[test]
fn test_state_from_consumed_graph_is_detached() -> Result<()> {
    let mut lstm = Lstm::with_seed(2, 3)?;
    let x = input(1, 3);
    lstm.forward(&x)?.sum()?.backward()?;
    assert!(lstm.state().0.graph().map_or(false, |g| g.is_consumed()));

    let before = lstm.state().0.value().clone();
    let h = lstm.forward(&x)?;
    assert!(!h.graph().map_or(true, |g| g.is_consumed()));
    h.sum()?.backward()?;
    assert_ne!(lstm.state().0.value(), &before);
    Ok(())
}

#[test]
fn test_detach_and_reset_state() -> Result<()> {
    let mut lstm = Lstm::with_seed(2, 3)?;
    let x = input(1, 3);
    let h = lstm.forward(&x)?;
    assert!(lstm.state().0.is_variable());

    lstm.detach_state();
    assert!(!lstm.state().0.is_variable());
    assert_eq!(lstm.state().0.value(), h.value());

    lstm.reset_state();
    assert_eq!(lstm.state().0.value(), &crate::tensor::zeros(&[1, 2]));
    assert_eq!(lstm.state().1.value(), &crate::tensor::zeros(&[1, 2]));
    Ok(())
}

#[test]
fn test_batch_size_change_resets_state() -> Result<()> {
    let mut lstm = Lstm::with_seed(2, 3)?;
    lstm.forward(&input(4, 3))?;
    assert_eq!(lstm.state().0.shape(), &[4, 2]);
    let h = lstm.forward(&input(3, 3))?;
    assert_eq!(h.shape(), &[3, 2]);
    Ok(())
}

#[test]
fn test_not_training_records_nothing() -> Result<()> {
    let mut lstm = Lstm::with_seed(2, 3)?;
    let _guard = not_training();
    let h = lstm.forward(&input(1, 3))?;
    assert!(!h.is_variable());
    assert!(!lstm.state().1.is_variable());
    Ok(())
}

#[test]
fn test_lstm_grad_check_over_two_steps() -> Result<()> {
    let lstm = RefCell::new(Lstm::with_seed(2, 9)?);
    let x: Tensor = input(2, 3).value().clone();
    lstm.borrow_mut().forward(&Var::constant(x.clone()))?;
    let params = lstm.borrow().parameters();

    check_grad(
        || {
            let mut lstm = lstm.borrow_mut();
            lstm.reset_state();
            lstm.forward(&Var::constant(x.clone()))?;
            lstm.forward(&Var::constant(x.clone()))?.pow(2.0)?.sum()
        },
        &params,
        1e-6,
        1e-4,
    )
    .unwrap();
    Ok(())
}
