use toych_core::autograd::grad_check::check_grad;
use toych_core::model::{fit, Compose, FitConfig, Lstm, Model};
use toych_core::nn::layers::{Dense, Layer};
use toych_core::nn::LossKind;
use toych_core::ops::activation::Activation;
use toych_core::optim::OptimizerKind;
use toych_core::{Result, Tensor, Var};

mod common;
use common::{create_test_tensor, init_logger};

/// `t = sin(x)` sampled on [-2, 2], in batches of 5.
fn sine_batches() -> Vec<(Tensor, Tensor)> {
    let xs: Vec<f64> = (0..20).map(|i| -2.0 + 4.0 * i as f64 / 19.0).collect();
    xs.chunks(5)
        .map(|c| {
            let ts = c.iter().map(|x| x.sin()).collect();
            (create_test_tensor(c.to_vec(), vec![5, 1]), create_test_tensor(ts, vec![5, 1]))
        })
        .collect()
}

#[test]
fn test_two_layer_network_learns_a_curve() -> Result<()> {
    init_logger();
    let mut model = Compose::new()
        .then(Layer::new(Dense::new(8).with_seed(3)).with_activation(Activation::Tanh))
        .then(Layer::new(Dense::new(1).with_seed(4)));
    let config = FitConfig::default()
        .with_epochs(150)
        .with_loss(LossKind::Mse)
        .with_optimizer(OptimizerKind::Adam)
        .with_lr(0.02);
    let history = fit(&mut model, &mut sine_batches(), &config, None)?;

    let (first, last) = (history.loss[0], history.loss[history.epochs() - 1]);
    assert!(last < first / 5.0, "loss went from {} to {}", first, last);
    Ok(())
}

#[test]
fn test_dense_gradients_match_finite_differences() {
    let layer = Layer::new(Dense::new(2).with_seed(8))
        .with_activation(Activation::Sigmoid)
        .with_input_dim(3)
        .unwrap();
    let x = create_test_tensor(vec![0.2, -0.1, 0.4, 1.0, 0.5, -0.3], vec![2, 3]);
    let params = layer.parameters();
    check_grad(
        || layer.call(&Var::constant(x.clone()))?.pow(2.0)?.sum(),
        &params,
        1e-6,
        1e-4,
    )
    .unwrap();
}

#[test]
fn test_lstm_trains_on_a_sequence() -> Result<()> {
    init_logger();
    let mut lstm = Lstm::with_seed(4, 21)?;
    let steps: Vec<Var> = (0..4)
        .map(|k| Var::constant(create_test_tensor(vec![0.1 * k as f64, 1.0], vec![1, 2])))
        .collect();

    let mut h = lstm.forward(&steps[0])?;
    for x in &steps[1..] {
        h = lstm.forward(x)?;
    }
    let touched = h.pow(2.0)?.sum()?.backward()?;
    assert_eq!(touched.len(), lstm.parameters().len());
    for (name, param) in lstm.named_parameters() {
        assert!(param.grad().abs_max() > 0.0, "{} got no gradient", name);
    }

    // The next sequence starts from the carried values, detached.
    lstm.forward(&steps[0])?.sum()?.backward()?;
    Ok(())
}
