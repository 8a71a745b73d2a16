use super::Model;
use crate::autograd::{not_training, Var};
use crate::error::{Result, ToychError};
use crate::nn::LossKind;
use crate::optim::{OptimizerConfig, OptimizerKind};
use crate::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Something that yields the `(input, target)` batches of one epoch.
pub trait BatchSource {
    /// Batches for the next epoch. Called once per epoch, so a source may reshuffle.
    fn batches(&mut self) -> Result<Vec<(Tensor, Tensor)>>;
}

impl BatchSource for Vec<(Tensor, Tensor)> {
    fn batches(&mut self) -> Result<Vec<(Tensor, Tensor)>> {
        Ok(self.clone())
    }
}

/// A validation metric computed from `(prediction, target)`.
pub type Metric = Arc<dyn Fn(&Tensor, &Tensor) -> Result<f64> + Send + Sync>;

/// Called at the end of every epoch with the model, the history so far and the epoch index.
pub type Callback = Arc<dyn Fn(&dyn Model, &History, usize) + Send + Sync>;

/// Settings of [`fit`].
#[derive(Clone)]
pub struct FitConfig {
    pub epochs: usize,
    pub loss: LossKind,
    pub optimizer: OptimizerKind,
    /// Overrides the optimizer's default learning rate.
    pub lr: Option<f64>,
    /// Named metrics evaluated on the validation data after every epoch.
    pub metrics: Vec<(String, Metric)>,
    /// Run in order after each epoch, outside training mode.
    pub callbacks: Vec<Callback>,
}

impl Default for FitConfig {
    fn default() -> Self {
        FitConfig {
            epochs: 20,
            loss: LossKind::default(),
            optimizer: OptimizerKind::default(),
            lr: None,
            metrics: Vec::new(),
            callbacks: Vec::new(),
        }
    }
}

impl FitConfig {
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_loss(mut self, loss: LossKind) -> Self {
        self.loss = loss;
        self
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerKind) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_lr(mut self, lr: f64) -> Self {
        self.lr = Some(lr);
        self
    }

    pub fn with_metric<F>(mut self, name: &str, metric: F) -> Self
    where
        F: Fn(&Tensor, &Tensor) -> Result<f64> + Send + Sync + 'static,
    {
        self.metrics.push((name.to_string(), Arc::new(metric)));
        self
    }

    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&dyn Model, &History, usize) + Send + Sync + 'static,
    {
        self.callbacks.push(Arc::new(callback));
        self
    }

    /// The optimizer configuration this fit runs with.
    ///
    /// # Errors
    /// `ConfigurationError` if the learning rate is not positive and finite.
    pub fn optimizer_config(&self) -> Result<OptimizerConfig> {
        let config = match self.lr {
            Some(lr) => OptimizerConfig::with_lr(lr),
            None => OptimizerConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }
}

impl fmt::Debug for FitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metrics: Vec<&str> = self.metrics.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("FitConfig")
            .field("epochs", &self.epochs)
            .field("loss", &self.loss)
            .field("optimizer", &self.optimizer)
            .field("lr", &self.lr)
            .field("metrics", &metrics)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

/// Per-epoch record of a [`fit`] run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    /// Mean training loss over the epoch's batches.
    pub loss: Vec<f64>,
    /// Loss on the validation data, when given.
    pub val_loss: Vec<f64>,
    pub metrics: BTreeMap<String, Vec<f64>>,
    /// Metric failures, one message each.
    pub warnings: Vec<String>,
}

impl History {
    pub fn epochs(&self) -> usize {
        self.loss.len()
    }
}

/// Trains `model` on the batches of `source`.
///
/// Every batch runs forward, computes the loss, backpropagates it and steps the
/// optimizer on the parameters that received a gradient. After each epoch, if
/// `validation` holds `(inputs, targets)`, the model is evaluated on it without
/// recording a graph and the validation loss and metrics are stored. Callbacks then
/// run, also outside training mode.
///
/// A failing metric does not abort training: it is logged and kept in
/// [`History::warnings`].
///
/// # Errors
/// `ConfigurationError` for an invalid learning rate, `InvalidArgument` if the source
/// yields no batch, and any error raised by the model, loss or optimizer.
pub fn fit(
    model: &mut dyn Model,
    source: &mut dyn BatchSource,
    config: &FitConfig,
    validation: Option<(&Tensor, &Tensor)>,
) -> Result<History> {
    let mut optimizer = config.optimizer.build(config.optimizer_config()?)?;
    let mut history = History::default();

    log::info!("Start training {:?}", model);
    log::info!("Total epochs: {}", config.epochs);
    log::info!("Loss: {}, optimizer: {:?}", config.loss, optimizer);

    for epoch in 0..config.epochs {
        let batches = source.batches()?;
        if batches.is_empty() {
            return Err(ToychError::InvalidArgument(
                "the batch source yielded no batch".to_string(),
            ));
        }
        if epoch == 0 {
            let (x, t) = &batches[0];
            log::info!("Input shape: {:?}, target shape: {:?}", x.shape(), t.shape());
            log::info!("Batches per epoch: {}", batches.len());
        }

        let mut total = 0.0;
        for (x, t) in &batches {
            let y = model.forward(&Var::constant(x.clone()))?;
            let loss = config.loss.compute(&y, &Var::constant(t.clone()))?;
            total += loss.item()?;
            let params = loss.backward()?;
            optimizer.step(&params)?;
        }
        history.loss.push(total / batches.len() as f64);

        if let Some((x_val, t_val)) = validation {
            validate(model, config, x_val, t_val, epoch, &mut history)?;
        }
        if !config.callbacks.is_empty() {
            let _guard = not_training();
            for callback in &config.callbacks {
                callback(&*model, &history, epoch);
            }
        }

        match history.val_loss.last() {
            Some(val) => log::info!(
                "Epoch {}: loss = {:.4}, val_loss = {:.4}",
                epoch,
                history.loss[epoch],
                val
            ),
            None => log::info!("Epoch {}: loss = {:.4}", epoch, history.loss[epoch]),
        }
    }
    Ok(history)
}

fn validate(
    model: &mut dyn Model,
    config: &FitConfig,
    x_val: &Tensor,
    t_val: &Tensor,
    epoch: usize,
    history: &mut History,
) -> Result<()> {
    let _guard = not_training();
    let y_val = model.forward(&Var::constant(x_val.clone()))?;
    let val_loss = config.loss.compute(&y_val, &Var::constant(t_val.clone()))?;
    history.val_loss.push(val_loss.item()?);

    for (name, metric) in &config.metrics {
        match metric(y_val.value(), t_val) {
            Ok(value) => history.metrics.entry(name.clone()).or_default().push(value),
            Err(e) => {
                log::warn!("Metric '{}' failed at epoch {}: {}", name, epoch, e);
                history
                    .warnings
                    .push(format!("epoch {}: metric '{}' failed: {}", epoch, name, e));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "fit_test.rs"]
mod tests;
