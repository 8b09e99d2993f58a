use std::fs;
use std::path::PathBuf;

use almanac_core::datetime::iso_date_serde;
use almanac_core::{Calendar, CalendarError, GestureEvent, Outcome};
use anyhow::Context;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct Script {
    pub name: String,
    #[serde(default, with = "iso_date_serde::option")]
    pub month: Option<NaiveDate>,
    pub steps: Vec<GestureEvent>,
}

#[derive(Debug, Clone)]
pub enum StepResult {
    Done(Outcome),
    Rejected(CalendarError),
}

#[derive(Debug, Clone)]
pub struct StepReport {
    pub index: usize,
    pub op: &'static str,
    pub result: StepResult,
}

impl StepReport {
    pub fn is_rejected(&self) -> bool {
        matches!(self.result, StepResult::Rejected(_))
    }
}

pub fn load_scripts(paths: &[PathBuf]) -> anyhow::Result<Vec<Script>> {
    let mut out = Vec::new();

    for path in paths {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        let script: Script = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse script {}", path.display()))?;
        out.push(script);
    }

    Ok(out)
}

/// Dispatches every step in order. Rejections a front end would show to the
/// user are recorded and the replay goes on; anything else stops it.
#[tracing::instrument(skip(calendar, script), fields(script = %script.name))]
pub fn replay(calendar: &mut Calendar, script: &Script) -> anyhow::Result<Vec<StepReport>> {
    if let Some(month) = script.month {
        calendar.set_visible_month(month);
    }

    let mut reports = Vec::with_capacity(script.steps.len());
    for (idx, step) in script.steps.iter().cloned().enumerate() {
        let op = step.op_name();
        let result = match calendar.dispatch(step) {
            Ok(outcome) => {
                info!(step = idx + 1, op, ?outcome, "step applied");
                StepResult::Done(outcome)
            }
            Err(err @ (CalendarError::Validation(_) | CalendarError::GestureInProgress)) => {
                warn!(step = idx + 1, op, error = %err, "step rejected");
                StepResult::Rejected(err)
            }
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("step {} ({op}) of script {} failed", idx + 1, script.name)
                });
            }
        };
        reports.push(StepReport {
            index: idx + 1,
            op,
            result,
        });
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use almanac_core::CalendarConfig;
    use tempfile::NamedTempFile;

    use super::*;

    const SCRIPT: &str = r#"{
        "name": "plan launch",
        "month": "2024-06-01",
        "steps": [
            {"op": "begin_select", "day": "2024-06-10"},
            {"op": "extend_select", "day": "2024-06-12"},
            {"op": "end_select"},
            {"op": "create", "name": "   "},
            {"op": "create", "name": "Design Review", "category": "review"},
            {"op": "begin_move", "task": "Design Review"},
            {"op": "drop", "day": "2024-06-15"}
        ]
    }"#;

    #[test]
    fn replays_script_and_keeps_going_after_rejection() {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(SCRIPT.as_bytes()).expect("write script");

        let scripts = load_scripts(&[file.path().to_path_buf()]).expect("load");
        assert_eq!(scripts.len(), 1);

        let mut calendar = Calendar::with_month(
            CalendarConfig::default(),
            NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date"),
        );
        let reports = replay(&mut calendar, &scripts[0]).expect("replay");

        assert_eq!(reports.len(), 7);
        let rejected: Vec<_> = reports.iter().filter(|r| r.is_rejected()).map(|r| r.index).collect();
        assert_eq!(rejected, vec![4]);

        assert_eq!(
            calendar.visible_month(),
            NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
        );
        let visible = calendar.visible_tasks();
        assert_eq!(visible.len(), 1);
        assert_eq!(
            visible[0].start,
            NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date")
        );
        assert_eq!(
            visible[0].end,
            NaiveDate::from_ymd_opt(2024, 6, 17).expect("valid date")
        );
    }

    #[test]
    fn unreadable_script_reports_path() {
        let dir = tempfile::tempdir().expect("dir");
        let missing = dir.path().join("missing.json");
        let err = load_scripts(&[missing]).expect_err("missing script");
        assert!(format!("{err:#}").contains("missing.json"));
    }
}
