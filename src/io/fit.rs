//! Read/write fit JSON files.
//!
//! A fit file carries the fitted parameters together with the mixing settings
//! they were estimated under, so the same model can be applied to fresh data
//! later (`midas predict`).

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::FitResult;
use crate::error::MidasResult;

/// Portable representation of a fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitFile {
    pub tool: String,
    pub xlag: usize,
    pub ylag: usize,
    pub horizon: i64,
    pub estimation_start: NaiveDate,
    pub estimation_end: NaiveDate,
    pub fit: FitResult,
}

pub fn write_fit_json(path: &Path, file: &FitFile) -> MidasResult<()> {
    let out = File::create(path)?;
    serde_json::to_writer_pretty(out, file)?;
    Ok(())
}

pub fn read_fit_json(path: &Path) -> MidasResult<FitFile> {
    let input = File::open(path)?;
    Ok(serde_json::from_reader(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitDiagnostics, Termination, WeightFamily, WeightParams};

    #[test]
    fn fit_file_survives_disk() {
        let file = FitFile {
            tool: "midas".to_string(),
            xlag: 9,
            ylag: 1,
            horizon: 1,
            estimation_start: NaiveDate::from_ymd_opt(1985, 1, 1).unwrap(),
            estimation_end: NaiveDate::from_ymd_opt(2009, 1, 1).unwrap(),
            fit: FitResult {
                family: WeightFamily::BetaNonZero,
                a: 0.25,
                b: 1.5,
                theta: WeightParams::new(vec![1.0, 4.5, 0.01]),
                ar: vec![0.3],
                diagnostics: FitDiagnostics {
                    converged: true,
                    termination: Termination::Ftol,
                    cost: 1.25,
                    residual_norm: 1.5811388300841898,
                    iterations: 12,
                    evaluations: 15,
                },
            },
        };
        let path = std::env::temp_dir().join(format!("midas-fit-{}.json", std::process::id()));
        write_fit_json(&path, &file).unwrap();
        let back = read_fit_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(back, file);

        let text = serde_json::to_string(&file.fit).unwrap();
        assert!(text.contains("\"family\":\"beta_nz\""));
    }
}
