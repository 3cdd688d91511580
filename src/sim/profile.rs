//! Piecewise-constant time series for price and load-limit profiles.

use crate::error::{EnvError, Result};

/// A step function over elapsed ticks.
///
/// The value is `values[i]` for the largest `i` whose breakpoint has been
/// passed (`steps[i] < tick counter`), starting from `values[0]` and holding
/// the last value forever. An optional scale is applied to every value,
/// including the initial one; the load-limit profile uses it to widen the
/// configured envelope by a tolerance factor.
#[derive(Debug, Clone)]
pub struct StepSeries {
    name: String,
    steps: Vec<usize>,
    values: Vec<f32>,
    scale: f32,
    current_step: usize,
    current_value: f32,
}

impl StepSeries {
    /// Creates an unscaled series.
    ///
    /// # Errors
    ///
    /// Returns a config error when `steps` and `values` are empty, differ in
    /// length, or the breakpoints are not strictly ascending.
    pub fn new(name: impl Into<String>, steps: Vec<usize>, values: Vec<f32>) -> Result<Self> {
        Self::scaled(name.into(), steps, values, 1.0)
    }

    /// Creates a series whose values are widened by `1 + tolerance_factor`.
    ///
    /// # Errors
    ///
    /// Same shape requirements as [`StepSeries::new`].
    pub fn with_tolerance(
        name: impl Into<String>,
        steps: Vec<usize>,
        values: Vec<f32>,
        tolerance_factor: f32,
    ) -> Result<Self> {
        Self::scaled(name.into(), steps, values, 1.0 + tolerance_factor)
    }

    fn scaled(name: String, steps: Vec<usize>, values: Vec<f32>, scale: f32) -> Result<Self> {
        if steps.is_empty() || values.is_empty() {
            return Err(EnvError::config(
                format!("{name}.steps"),
                "steps and values must not be empty",
            ));
        }
        if steps.len() != values.len() {
            return Err(EnvError::config(
                format!("{name}.steps"),
                "steps and values must have the same length",
            ));
        }
        if steps.windows(2).any(|w| w[1] <= w[0]) {
            return Err(EnvError::config(
                format!("{name}.steps"),
                "breakpoints must be strictly ascending",
            ));
        }
        let current_value = values[0] * scale;
        Ok(Self {
            name,
            steps,
            values,
            scale,
            current_step: 0,
            current_value,
        })
    }

    /// Advances the tick counter and returns the value in force.
    ///
    /// A breakpoint equal to the new counter has not been passed yet; the
    /// previous value still holds through that tick.
    pub fn step(&mut self) -> f32 {
        self.current_step += 1;
        for (breakpoint, value) in self.steps.iter().zip(&self.values) {
            if self.current_step > *breakpoint {
                self.current_value = value * self.scale;
            } else {
                break;
            }
        }
        self.current_value
    }

    /// Intentionally a no-op: the series models calendar context that keeps
    /// running across episodes instead of rewinding with them.
    pub fn reset(&mut self) {}

    /// Value currently in force.
    pub fn current_value(&self) -> f32 {
        self.current_value
    }

    /// Ticks elapsed since construction.
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Series name, used in config error fields.
    pub fn name(&self) -> &str {
        &self.name
    }
}
