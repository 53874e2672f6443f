//! Column store for pipeline output.
//!
//! Each stage fills whole columns before the next stage reads them. Once
//! `compute` returns, the table is read-only: consumers see columns through
//! [`FeatureTable::column`] or rows through [`FeatureTable::rows`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::path::Path;

/// Numeric columns in export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Returns,
    SigmaShort,
    SigmaLong,
    TransRaw,
    TransSm,
    HurstRaw,
    Hurst,
    EntRaw,
    EntSm,
    VolImbalance,
    Es,
    ResRaw,
    ResSm,
    AlphaEff,
    BetaEff,
    Stress,
    SigmaC,
    SigmaR,
}

impl Column {
    pub const ALL: [Column; 18] = [
        Column::Returns,
        Column::SigmaShort,
        Column::SigmaLong,
        Column::TransRaw,
        Column::TransSm,
        Column::HurstRaw,
        Column::Hurst,
        Column::EntRaw,
        Column::EntSm,
        Column::VolImbalance,
        Column::Es,
        Column::ResRaw,
        Column::ResSm,
        Column::AlphaEff,
        Column::BetaEff,
        Column::Stress,
        Column::SigmaC,
        Column::SigmaR,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::Returns => "returns",
            Column::SigmaShort => "sigma_short",
            Column::SigmaLong => "sigma_long",
            Column::TransRaw => "trans_raw",
            Column::TransSm => "trans_sm",
            Column::HurstRaw => "hurst_raw",
            Column::Hurst => "hurst",
            Column::EntRaw => "ent_raw",
            Column::EntSm => "ent_sm",
            Column::VolImbalance => "vol_imbalance",
            Column::Es => "es",
            Column::ResRaw => "res_raw",
            Column::ResSm => "res_sm",
            Column::AlphaEff => "alpha_eff",
            Column::BetaEff => "beta_eff",
            Column::Stress => "D",
            Column::SigmaC => "sigma_C",
            Column::SigmaR => "sigma_R",
        }
    }

    /// Position in [`Column::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_name(name: &str) -> Option<Column> {
        Column::ALL.iter().copied().find(|c| c.name() == name)
    }
}

/// Counts of fallback branches and clip hits, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub hurst_degenerate: usize,
    pub entropy_degenerate: usize,
    pub es_degenerate: usize,
    pub volume_undefined: usize,
    /// Rows where systemic stress D was <= 0 or non-finite
    pub stress_nonpositive: usize,
    pub sigma_c_clipped: usize,
    pub sigma_r_clipped: usize,
}

/// One row of the table, as exchanged with CSV/JSON consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub ts: i64,
    pub returns: f64,
    pub sigma_short: f64,
    pub sigma_long: f64,
    pub trans_raw: f64,
    pub trans_sm: f64,
    pub hurst_raw: f64,
    pub hurst: f64,
    pub ent_raw: f64,
    pub ent_sm: f64,
    pub vol_imbalance: f64,
    pub es: f64,
    pub res_raw: f64,
    pub res_sm: f64,
    pub alpha_eff: f64,
    pub beta_eff: f64,
    #[serde(rename = "D")]
    pub stress: f64,
    #[serde(rename = "sigma_C")]
    pub sigma_c: f64,
    #[serde(rename = "sigma_R")]
    pub sigma_r: f64,
}

impl FeatureRow {
    /// Build a row from a per-column lookup.
    pub fn assemble(ts: i64, at: impl Fn(Column) -> f64) -> Self {
        FeatureRow {
            ts,
            returns: at(Column::Returns),
            sigma_short: at(Column::SigmaShort),
            sigma_long: at(Column::SigmaLong),
            trans_raw: at(Column::TransRaw),
            trans_sm: at(Column::TransSm),
            hurst_raw: at(Column::HurstRaw),
            hurst: at(Column::Hurst),
            ent_raw: at(Column::EntRaw),
            ent_sm: at(Column::EntSm),
            vol_imbalance: at(Column::VolImbalance),
            es: at(Column::Es),
            res_raw: at(Column::ResRaw),
            res_sm: at(Column::ResSm),
            alpha_eff: at(Column::AlphaEff),
            beta_eff: at(Column::BetaEff),
            stress: at(Column::Stress),
            sigma_c: at(Column::SigmaC),
            sigma_r: at(Column::SigmaR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTable {
    pub(crate) ts: Vec<i64>,
    pub(crate) returns: Vec<f64>,
    pub(crate) sigma_short: Vec<f64>,
    pub(crate) sigma_long: Vec<f64>,
    pub(crate) trans_raw: Vec<f64>,
    pub(crate) trans_sm: Vec<f64>,
    pub(crate) hurst_raw: Vec<f64>,
    pub(crate) hurst: Vec<f64>,
    pub(crate) ent_raw: Vec<f64>,
    pub(crate) ent_sm: Vec<f64>,
    pub(crate) vol_imbalance: Vec<f64>,
    pub(crate) es: Vec<f64>,
    pub(crate) res_raw: Vec<f64>,
    pub(crate) res_sm: Vec<f64>,
    pub(crate) alpha_eff: Vec<f64>,
    pub(crate) beta_eff: Vec<f64>,
    pub(crate) stress: Vec<f64>,
    pub(crate) sigma_c: Vec<f64>,
    pub(crate) sigma_r: Vec<f64>,
    pub(crate) diagnostics: Diagnostics,
}

impl FeatureTable {
    pub(crate) fn keyed(ts: &[i64]) -> Self {
        Self { ts: ts.to_vec(), ..Self::default() }
    }

    pub fn len(&self) -> usize {
        self.ts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ts.is_empty()
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.ts
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn column(&self, col: Column) -> &[f64] {
        match col {
            Column::Returns => &self.returns,
            Column::SigmaShort => &self.sigma_short,
            Column::SigmaLong => &self.sigma_long,
            Column::TransRaw => &self.trans_raw,
            Column::TransSm => &self.trans_sm,
            Column::HurstRaw => &self.hurst_raw,
            Column::Hurst => &self.hurst,
            Column::EntRaw => &self.ent_raw,
            Column::EntSm => &self.ent_sm,
            Column::VolImbalance => &self.vol_imbalance,
            Column::Es => &self.es,
            Column::ResRaw => &self.res_raw,
            Column::ResSm => &self.res_sm,
            Column::AlphaEff => &self.alpha_eff,
            Column::BetaEff => &self.beta_eff,
            Column::Stress => &self.stress,
            Column::SigmaC => &self.sigma_c,
            Column::SigmaR => &self.sigma_r,
        }
    }

    pub fn row(&self, i: usize) -> Option<FeatureRow> {
        let ts = *self.ts.get(i)?;
        Some(FeatureRow::assemble(ts, |c| self.column(c).get(i).copied().unwrap_or(0.0)))
    }

    pub fn rows(&self) -> impl Iterator<Item = FeatureRow> + '_ {
        (0..self.len()).filter_map(move |i| self.row(i))
    }

    pub fn last_row(&self) -> Option<FeatureRow> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }

    /// sha256 over timestamps and the bit pattern of every column.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for ts in &self.ts {
            hasher.update(ts.to_le_bytes());
        }
        for col in Column::ALL {
            hasher.update(col.name().as_bytes());
            for v in self.column(col) {
                hasher.update(v.to_bits().to_le_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::from("ts");
        for col in Column::ALL {
            out.push(',');
            out.push_str(col.name());
        }
        out.push('\n');
        for i in 0..self.len() {
            let _ = write!(out, "{}", self.ts[i]);
            for col in Column::ALL {
                let v = self.column(col).get(i).copied().unwrap_or(0.0);
                let _ = write!(out, ",{}", v);
            }
            out.push('\n');
        }
        out
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_csv())
            .with_context(|| format!("writing feature table to {}", path.display()))
    }
}
