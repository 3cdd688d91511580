//! Post-hoc episode summary computed from collected tick records.

use std::fmt;

use super::types::TickRecord;

/// Aggregate summary of one episode.
///
/// Computed after the fact from `Vec<TickRecord>` so the summary and the
/// exported telemetry can never disagree.
#[derive(Debug, Clone)]
pub struct EpisodeReport {
    /// Number of ticks simulated.
    pub ticks: usize,
    /// Sum of every tick's reward-vector sum.
    pub total_reward: f32,
    /// Mean of the per-tick global rewards.
    pub mean_global_reward: f32,
    /// Largest absolute system power seen (kW).
    pub peak_system_power_kw: f32,
    /// Sum of `system_power x price` over the episode.
    pub total_energy_cost: f32,
    /// Production cycles completed by the end of the episode.
    pub final_production: u32,
    /// First tick that breached the budget, if any.
    pub violation_tick: Option<usize>,
    /// Whether the final tick reported `done`.
    pub terminated: bool,
}

impl EpisodeReport {
    /// Aggregates a complete record vector into a report.
    pub fn from_records(records: &[TickRecord]) -> Self {
        if records.is_empty() {
            return Self {
                ticks: 0,
                total_reward: 0.0,
                mean_global_reward: 0.0,
                peak_system_power_kw: 0.0,
                total_energy_cost: 0.0,
                final_production: 0,
                violation_tick: None,
                terminated: false,
            };
        }

        let n = records.len() as f32;
        let mut total_reward = 0.0_f32;
        let mut global_sum = 0.0_f32;
        let mut peak_power = 0.0_f32;
        let mut total_cost = 0.0_f32;
        let mut violation_tick = None;

        for r in records {
            total_reward += r.total_reward;
            global_sum += r.global_reward;
            peak_power = peak_power.max(r.system_power.abs());
            total_cost += r.energy_cost;
            if r.budget_violated && violation_tick.is_none() {
                violation_tick = Some(r.timestep);
            }
        }

        let last = &records[records.len() - 1];
        Self {
            ticks: records.len(),
            total_reward,
            mean_global_reward: global_sum / n,
            peak_system_power_kw: peak_power,
            total_energy_cost: total_cost,
            final_production: last.production,
            violation_tick,
            terminated: last.done,
        }
    }
}

impl fmt::Display for EpisodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Episode Report ---")?;
        writeln!(f, "Ticks simulated:       {}", self.ticks)?;
        writeln!(f, "Total reward:          {:.3}", self.total_reward)?;
        writeln!(f, "Mean global reward:    {:.3}", self.mean_global_reward)?;
        writeln!(f, "Peak |system power|:   {:.2} kW", self.peak_system_power_kw)?;
        writeln!(f, "Total energy cost:     {:.2}", self.total_energy_cost)?;
        writeln!(f, "Production cycles:     {}", self.final_production)?;
        match self.violation_tick {
            Some(t) => writeln!(f, "Budget violation:      tick {t}")?,
            None => writeln!(f, "Budget violation:      none")?,
        }
        write!(f, "Terminated:            {}", self.terminated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(timestep: usize, system_power: f32, total_reward: f32) -> TickRecord {
        TickRecord {
            timestep,
            energy_price: 0.5,
            load_limit: 150.0,
            system_power,
            energy_cost: system_power * 0.5,
            total_reward,
            global_reward: total_reward / 2.0,
            production: timestep as u32,
            budget_violated: false,
            done: false,
        }
    }

    #[test]
    fn aggregates_reward_and_power() {
        let records = vec![
            make_record(0, 10.0, 1.0),
            make_record(1, -40.0, 0.5),
            make_record(2, 20.0, -0.5),
        ];
        let report = EpisodeReport::from_records(&records);
        assert_eq!(report.ticks, 3);
        assert!((report.total_reward - 1.0).abs() < 1e-6);
        assert!((report.mean_global_reward - (0.5 + 0.25 - 0.25) / 3.0).abs() < 1e-6);
        assert_eq!(report.peak_system_power_kw, 40.0);
        assert!((report.total_energy_cost - (5.0 - 20.0 + 10.0)).abs() < 1e-4);
        assert_eq!(report.final_production, 2);
        assert_eq!(report.violation_tick, None);
        assert!(!report.terminated);
    }

    #[test]
    fn first_violation_tick_wins() {
        let mut records = vec![
            make_record(0, 10.0, 0.0),
            make_record(1, 10.0, 0.0),
            make_record(2, 10.0, 0.0),
        ];
        records[1].budget_violated = true;
        records[2].budget_violated = true;
        records[2].done = true;
        let report = EpisodeReport::from_records(&records);
        assert_eq!(report.violation_tick, Some(1));
        assert!(report.terminated);
    }

    #[test]
    fn empty_records() {
        let report = EpisodeReport::from_records(&[]);
        assert_eq!(report.ticks, 0);
        assert_eq!(report.violation_tick, None);
        assert!(!report.terminated);
    }

    #[test]
    fn display_contains_the_header() {
        let report = EpisodeReport::from_records(&[make_record(0, 10.0, 1.0)]);
        let s = format!("{report}");
        assert!(s.starts_with("--- Episode Report ---"));
        assert!(s.contains("Budget violation:      none"));
    }
}
