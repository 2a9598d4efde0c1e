//! Sliding open/close price window fed to the entry-signal evaluator.
//!
//! The window length is fixed when the window is built and never changes:
//! [`PriceWindow::slide`] drops the oldest pair and appends the newest.

use crate::domain::error::ScalpcheckError;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceWindow {
    opens: Vec<f64>,
    closes: Vec<f64>,
}

impl PriceWindow {
    /// Copies the given history; its length becomes the window capacity.
    pub fn from_history(opens: &[f64], closes: &[f64]) -> Result<Self, ScalpcheckError> {
        if opens.len() != closes.len() {
            return Err(ScalpcheckError::InvalidWindow {
                reason: format!(
                    "open window has {} prices but close window has {}",
                    opens.len(),
                    closes.len()
                ),
            });
        }
        if opens.is_empty() {
            return Err(ScalpcheckError::InvalidWindow {
                reason: "window must hold at least one price".into(),
            });
        }
        Ok(Self {
            opens: opens.to_vec(),
            closes: closes.to_vec(),
        })
    }

    pub fn len(&self) -> usize {
        self.opens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opens.is_empty()
    }

    pub fn opens(&self) -> &[f64] {
        &self.opens
    }

    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn slide(&mut self, open: f64, close: f64) {
        push_back_fixed(&mut self.opens, open);
        push_back_fixed(&mut self.closes, close);
    }
}

fn push_back_fixed(values: &mut [f64], value: f64) {
    values.rotate_left(1);
    if let Some(slot) = values.last_mut() {
        *slot = value;
    }
}

/// Last element of a sequence, `None` when empty.
pub fn last_of<T>(seq: &[T]) -> Option<&T> {
    seq.last()
}

/// `a[i] - b[i]` over the common prefix of both sequences.
pub fn elementwise_difference(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}
