//! Report formatting: the original's
//! `"---------------"`-bracketed `varName -> value` / `Obj -> value`
//! stdout block, plus a `--json` mode and the persisted
//! `best_marg_prob` artifact for the schedule pipeline's two-step
//! workflow.

use std::io::Write;

use ndarray::Array2;
use serde::Serialize;
use tabwriter::TabWriter;

use crate::orchestrator::{MixResult, SchedResult, WtfResult};

const SEPARATOR: &str = "---------------";

/// Render a solved MILP's variable assignment the way the original's
/// `printSeperator()` + `"%s -> %g"` loop does.
pub fn print_raw(names: &[(&str, f64)], objective: f64) -> String {
    let mut out = String::new();
    out.push_str(SEPARATOR);
    out.push('\n');
    for (name, value) in names {
        out.push_str(&format!("{name} -> {value:.6}\n"));
    }
    out.push_str(SEPARATOR);
    out.push('\n');
    out.push_str(&format!("Obj -> {objective:.6}\n"));
    out.push_str(SEPARATOR);
    out.push('\n');
    out
}

/// Render a defender mixed strategy as an aligned table (the
/// teacher's `Display for Schema` uses the same `tabwriter` idiom).
pub fn print_mix_table(result: &MixResult) -> std::io::Result<String> {
    let mut tw = TabWriter::new(Vec::new());
    writeln!(tw, "action\tprobability")?;
    for (i, p) in result.defender_strategy.iter().enumerate() {
        writeln!(tw, "{i}\t{p:.6}")?;
    }
    writeln!(tw, "objective\t{:.6}", result.objective)?;
    tw.flush()?;
    Ok(String::from_utf8(tw.into_inner().unwrap()).unwrap())
}

/// Render O-WTF's ranked `(combination, objective)` table, the best
/// combination(s) highlighted first.
pub fn print_wtf_table(result: &WtfResult) -> std::io::Result<String> {
    let mut tw = TabWriter::new(Vec::new());
    writeln!(tw, "excluded\tobjective")?;
    for (combo, obj) in &result.ranked {
        writeln!(tw, "{}\t{obj:.6}", combo.join(","))?;
    }
    tw.flush()?;
    Ok(String::from_utf8(tw.into_inner().unwrap()).unwrap())
}

#[derive(Debug, Serialize)]
pub struct MixReport {
    pub defender_strategy: Vec<f64>,
    pub objective: f64,
}

impl From<&MixResult> for MixReport {
    fn from(r: &MixResult) -> Self {
        MixReport { defender_strategy: r.defender_strategy.clone(), objective: r.objective }
    }
}

#[derive(Debug, Serialize)]
pub struct WtfReport {
    pub ranked: Vec<(Vec<String>, f64)>,
}

impl From<&WtfResult> for WtfReport {
    fn from(r: &WtfResult) -> Self {
        WtfReport { ranked: r.ranked.clone() }
    }
}

#[derive(Debug, Serialize)]
pub struct SchedReport {
    pub attacked_target: usize,
    pub objective: f64,
    pub marginal: Vec<Vec<f64>>,
    pub components: Vec<(f64, Vec<Vec<f64>>)>,
}

impl From<&SchedResult> for SchedReport {
    fn from(r: &SchedResult) -> Self {
        SchedReport {
            attacked_target: r.attacked_target,
            objective: r.objective,
            marginal: matrix_rows(&r.marginal),
            components: r
                .decomposition
                .components
                .iter()
                .map(|c| (c.probability, matrix_rows(&c.matrix)))
                .collect(),
        }
    }
}

fn matrix_rows(m: &Array2<f64>) -> Vec<Vec<f64>> {
    m.outer_iter().map(|row| row.to_vec()).collect()
}

/// The persisted `best_marg_prob` artifact: the original's
/// `best_marg_prob.pkl`, re-expressed as JSON for the CLI's
/// `sched`-then-decompose two-step workflow.
#[derive(Debug, Serialize)]
pub struct BestMargProb {
    pub attacked_target: usize,
    pub objective: f64,
    pub marginal: Vec<Vec<f64>>,
}

impl From<&SchedResult> for BestMargProb {
    fn from(r: &SchedResult) -> Self {
        BestMargProb { attacked_target: r.attacked_target, objective: r.objective, marginal: matrix_rows(&r.marginal) }
    }
}
