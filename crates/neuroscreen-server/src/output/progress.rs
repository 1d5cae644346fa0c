//! Progress bar adapter using indicatif.

use std::path::Path;

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};
use neuroscreen_core::{AnalysisRecord, ProgressEvent, ProgressSink};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {wide_msg}";

/// Reports batch progress on stderr.
///
/// With a bar, per-image lines are suppressed and only skips are printed
/// above it. Without one, every analyzed image gets a status line.
pub struct ProgressBar {
    bar: Option<IndicatifBar>,
    quiet: bool,
}

impl ProgressBar {
    /// Creates a reporter for `total` images. `quiet` silences everything,
    /// `show_bar` chooses the bar over per-image lines.
    #[must_use]
    pub fn new(total: usize, quiet: bool, show_bar: bool) -> Self {
        let bar = (!quiet && show_bar).then(|| {
            let bar = IndicatifBar::new(total as u64);
            if let Ok(style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        });
        Self { bar, quiet }
    }

    fn print(&self, line: &str) {
        match &self.bar {
            Some(bar) => bar.suspend(|| eprintln!("{line}")),
            None => eprintln!("{line}"),
        }
    }
}

/// One-line summary of a record: labels, confidences and whether a face was
/// found.
fn status_line(record: &AnalysisRecord) -> String {
    format!(
        "{}: {} ({}%), {} ({}%), combined {}%{}",
        record.upload_name,
        record.autism.label,
        record.autism.confidence,
        record.emotion.label,
        record.emotion.confidence,
        record.combined_confidence,
        if record.face_detected() { "" } else { " [no face]" }
    )
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map_or_else(|| path.to_owned(), |n| n.to_string_lossy().into_owned())
}

impl ProgressSink for ProgressBar {
    fn on_event(&self, event: ProgressEvent) {
        if self.quiet {
            return;
        }

        match event {
            ProgressEvent::Started { path, .. } => {
                if let Some(bar) = &self.bar {
                    bar.set_message(file_name(&path));
                }
            }
            ProgressEvent::Completed { record } => match &self.bar {
                Some(bar) => bar.inc(1),
                None => eprintln!("{}", status_line(&record)),
            },
            ProgressEvent::Skipped { path, reason } => {
                self.print(&format!("skipped {path}: {reason}"));
                if let Some(bar) = &self.bar {
                    bar.inc(1);
                }
            }
            ProgressEvent::Finished { processed, skipped } => {
                if let Some(bar) = &self.bar {
                    bar.finish_and_clear();
                }
                eprintln!("{processed} analyzed, {skipped} skipped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuroscreen_core::FaceRegion;

    #[test]
    fn test_status_line_marks_missing_face() {
        let record = neuroscreen_test_support::sample_record("kid.jpg");
        let line = status_line(&record);
        assert!(line.starts_with("kid.jpg: No Autism Detected ("), "{line}");
        assert!(line.ends_with("[no face]"), "{line}");
    }

    #[test]
    fn test_status_line_with_face() {
        let mut record = neuroscreen_test_support::sample_record("kid.jpg");
        record.face = Some(FaceRegion::new(0, 0, 10, 10));
        assert!(!status_line(&record).contains("no face"));
    }

    #[test]
    fn test_file_name_strips_directories() {
        assert_eq!(file_name("/photos/2024/kid.png"), "kid.png");
        assert_eq!(file_name("kid.png"), "kid.png");
    }
}
