use super::Model;
use crate::autograd::Var;
use crate::error::{Result, ToychError};
use crate::nn::layers::{Dense, Layer};
use crate::nn::Parameter;
use crate::tensor::zeros;

const GATES: [&str; 4] = ["forget", "input", "output", "cell"];

/// Long short-term memory cell.
///
/// Each call advances one time step:
///
/// ```text
/// f = σ(W_f x + U_f h)    i = σ(W_i x + U_i h)    o = σ(W_o x + U_o h)
/// c̃ = tanh(W_c x + U_c h)
/// c = c·f + i·c̃
/// h = o·tanh(c)
/// ```
///
/// and returns `h`. The input transforms `W` carry the biases and are built on first
/// use; the recurrent transforms `U` have none. `h` and `c` start as zeros of shape
/// `[1, hidden]` and stay in the graph between calls, so a backward pass after several
/// steps reaches every step. Once that graph is consumed the state is detached
/// automatically.
#[derive(Debug)]
pub struct Lstm {
    hidden: usize,
    inputs: Vec<Layer<Dense>>,
    recurrent: Vec<Layer<Dense>>,
    h: Var,
    c: Var,
}

impl Lstm {
    /// # Errors
    /// `InvalidArgument` if `hidden` is zero.
    pub fn new(hidden: usize) -> Result<Self> {
        Lstm::build(hidden, None)
    }

    /// Same as [`new`](Lstm::new) with reproducible weights.
    pub fn with_seed(hidden: usize, seed: u64) -> Result<Self> {
        Lstm::build(hidden, Some(seed))
    }

    fn build(hidden: usize, seed: Option<u64>) -> Result<Self> {
        if hidden == 0 {
            return Err(ToychError::InvalidArgument(
                "an LSTM needs at least one hidden unit".to_string(),
            ));
        }
        let dense = |k: u64, bias: bool| {
            let dense = Dense::new(hidden).with_bias(bias);
            match seed {
                Some(s) => dense.with_seed(s.wrapping_add(k)),
                None => dense,
            }
        };
        let inputs = (0..4).map(|k| Layer::new(dense(k, true))).collect();
        let recurrent = (4..8)
            .map(|k| Layer::new(dense(k, false)).with_input_dim(hidden))
            .collect::<Result<Vec<_>>>()?;
        log::debug!("Created LSTM with {} hidden unit(s)", hidden);
        Ok(Lstm {
            hidden,
            inputs,
            recurrent,
            h: Var::constant(zeros(&[1, hidden])),
            c: Var::constant(zeros(&[1, hidden])),
        })
    }

    pub fn hidden(&self) -> usize {
        self.hidden
    }

    /// Current hidden and cell state.
    pub fn state(&self) -> (&Var, &Var) {
        (&self.h, &self.c)
    }

    /// Zeros the state.
    pub fn reset_state(&mut self) {
        self.h = Var::constant(zeros(&[1, self.hidden]));
        self.c = Var::constant(zeros(&[1, self.hidden]));
    }

    /// Keeps the state values but cuts them from their graph (truncated backpropagation).
    pub fn detach_state(&mut self) {
        self.h = self.h.detach();
        self.c = self.c.detach();
    }

    /// Detaches a state whose graph already ran backward, and resets a state whose
    /// batch size cannot broadcast against `rows` input rows.
    fn prepare_state(&mut self, rows: Option<usize>) {
        if self.h.graph().map_or(false, |g| g.is_consumed()) {
            log::debug!("LSTM state graph was consumed, detaching state");
            self.detach_state();
        }
        let state_rows = self.h.shape().first().copied().unwrap_or(1);
        if let Some(rows) = rows {
            if state_rows != 1 && state_rows != rows {
                log::debug!(
                    "LSTM batch size changed from {} to {}, resetting state",
                    state_rows,
                    rows
                );
                self.reset_state();
            }
        }
    }

    /// `W_k x + U_k h` for gate `k`.
    fn gate(&self, k: usize, x: &Var) -> Result<Var> {
        self.inputs[k].call(x)?.add(&self.recurrent[k].call(&self.h)?)
    }
}

impl Model for Lstm {
    fn forward(&mut self, input: &Var) -> Result<Var> {
        let rows = match input.shape() {
            [n, _] => Some(*n),
            _ => None,
        };
        self.prepare_state(rows);

        let f = self.gate(0, input)?.sigmoid()?;
        let i = self.gate(1, input)?.sigmoid()?;
        let o = self.gate(2, input)?.sigmoid()?;
        let candidate = self.gate(3, input)?.tanh()?;

        let c = self.c.mul(&f)?.add(&i.mul(&candidate)?)?;
        let h = o.mul(&c.tanh()?)?;
        self.c = c;
        self.h = h.clone();
        Ok(h)
    }

    fn parameters(&self) -> Vec<Parameter> {
        self.inputs
            .iter()
            .chain(&self.recurrent)
            .flat_map(|layer| layer.parameters())
            .collect()
    }

    fn named_parameters(&self) -> Vec<(String, Parameter)> {
        let mut params = Vec::new();
        for (prefix, layers) in [("w", &self.inputs), ("u", &self.recurrent)] {
            for (gate, layer) in GATES.iter().zip(layers) {
                for (name, param) in layer.named_parameters() {
                    params.push((format!("{}_{}.{}", prefix, gate, name), param));
                }
            }
        }
        params
    }
}

#[cfg(test)]
#[path = "lstm_test.rs"]
mod tests;
