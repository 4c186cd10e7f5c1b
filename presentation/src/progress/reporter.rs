//! Progress reporting for council turns

use colored::Colorize;
use council_application::ProgressNotifier;
use council_domain::{Model, Stage};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::Mutex;

/// Reports progress during a council turn with progress bars on stderr
pub struct ProgressReporter {
    multi: MultiProgress,
    stage_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::stderr()),
            stage_bar: Mutex::new(None),
        }
    }

    fn stage_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    pub(crate) fn stage_display_name(stage: Stage) -> &'static str {
        match stage {
            Stage::Responses => "Stage 1: Individual Responses",
            Stage::Rankings => "Stage 2: Peer Rankings",
            Stage::Synthesis => "Stage 3: Synthesis",
        }
    }

    fn stage_short_name(stage: Stage) -> &'static str {
        match stage {
            Stage::Responses => "Stage 1",
            Stage::Rankings => "Stage 2",
            Stage::Synthesis => "Stage 3",
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_stage_start(&self, stage: Stage, total_tasks: usize) {
        let pb = self.multi.add(ProgressBar::new(total_tasks as u64));
        pb.set_style(Self::stage_style());
        pb.set_prefix(Self::stage_display_name(stage).to_string());
        pb.set_message("Starting...");

        if let Ok(mut slot) = self.stage_bar.lock() {
            *slot = Some(pb);
        }
    }

    fn on_model_complete(&self, _stage: Stage, model: &Model, success: bool) {
        if let Ok(slot) = self.stage_bar.lock() {
            if let Some(pb) = slot.as_ref() {
                let status = if success {
                    format!("{} {}", "v".green(), model)
                } else {
                    format!("{} {}", "x".red(), model)
                };
                pb.set_message(status);
                pb.inc(1);
            }
        }
    }

    fn on_stage_complete(&self, stage: Stage) {
        if let Ok(mut slot) = self.stage_bar.lock() {
            if let Some(pb) = slot.take() {
                pb.finish_with_message(format!(
                    "{} complete!",
                    Self::stage_short_name(stage).green()
                ));
            }
        }
    }
}

/// Simple text-based progress (no fancy UI), written to stderr
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_stage_start(&self, stage: Stage, total_tasks: usize) {
        eprintln!(
            "{} {} ({} models)",
            "->".cyan(),
            ProgressReporter::stage_display_name(stage).bold(),
            total_tasks
        );
    }

    fn on_model_complete(&self, _stage: Stage, model: &Model, success: bool) {
        if success {
            eprintln!("  {} {}", "v".green(), model);
        } else {
            eprintln!("  {} {} (failed)", "x".red(), model);
        }
    }

    fn on_stage_complete(&self, _stage: Stage) {
        eprintln!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reporter_tracks_a_stage() {
        let reporter = ProgressReporter {
            multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            stage_bar: Mutex::new(None),
        };

        reporter.on_stage_start(Stage::Responses, 2);
        reporter.on_model_complete(Stage::Responses, &Model::new("a"), true);
        reporter.on_model_complete(Stage::Responses, &Model::new("b"), false);
        {
            let slot = reporter.stage_bar.lock().unwrap();
            assert_eq!(slot.as_ref().unwrap().position(), 2);
        }
        reporter.on_stage_complete(Stage::Responses);
        assert!(reporter.stage_bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(
            ProgressReporter::stage_display_name(Stage::Rankings),
            "Stage 2: Peer Rankings"
        );
    }
}
