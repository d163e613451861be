use std::path::PathBuf;

use gemini_ocr::analyzer::Progress;
use gemini_ocr::export::FALLBACK_JSON_PATH;
use gemini_ocr::prompt::{load_prompt, PromptSource};
use gemini_ocr::scanner::ImageSelection;
use gemini_ocr::worker::{OcrJob, WorkerEvent};
use gemini_ocr_common::{flatten_records, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptMode {
    #[default]
    Typed,
    File,
}

/// Everything the window shows, independent of egui.
#[derive(Debug, Default)]
pub struct AppState {
    pub selection: ImageSelection,
    pub output_path: String,
    pub prompt_mode: PromptMode,
    pub prompt_text: String,
    pub prompt_file: String,
    pub running: bool,
    pub progress: Option<Progress>,
    pub status: String,
    pub preview: Option<Table>,
}

impl AppState {
    pub fn prompt_source(&self) -> PromptSource {
        match self.prompt_mode {
            PromptMode::Typed => PromptSource::Text(self.prompt_text.clone()),
            PromptMode::File => PromptSource::File(PathBuf::from(self.prompt_file.trim())),
        }
    }

    /// Checks the inputs and assembles a job. The second value is a notice
    /// when the default instruction had to be used.
    pub fn build_job(&self) -> Result<(OcrJob, Option<String>), String> {
        if self.selection.is_empty() {
            return Err("No images selected. Add files or a folder first.".to_string());
        }
        let output = self.output_path.trim();
        if output.is_empty() {
            return Err("Choose an output file.".to_string());
        }

        let prompt = load_prompt(&self.prompt_source());
        let notice = prompt
            .fallback_reason
            .map(|reason| format!("{reason}; using the default instruction"));

        let job = OcrJob {
            images: self.selection.images().to_vec(),
            custom_prompt: prompt.text,
            output_path: PathBuf::from(output),
            fallback_path: PathBuf::from(FALLBACK_JSON_PATH),
        };
        Ok((job, notice))
    }

    pub fn start(&mut self, total: usize, notice: Option<String>) {
        self.running = true;
        self.preview = None;
        self.progress = Some(Progress { completed: 0, total });
        self.status = match notice {
            Some(notice) => format!("Processing {total} image(s)... ({notice})"),
            None => format!("Processing {total} image(s)..."),
        };
    }

    pub fn apply_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Progress(progress) => {
                self.status = format!("Processed {}/{}", progress.completed, progress.total);
                self.progress = Some(progress);
            }
            WorkerEvent::Results(records) => {
                let failed = records.iter().filter(|r| r.is_error()).count();
                self.status = format!(
                    "OCR finished: {} succeeded, {} failed. Saving...",
                    records.len() - failed,
                    failed
                );
                self.preview = Some(flatten_records(&records));
            }
            WorkerEvent::Complete(outcome) => {
                self.running = false;
                self.status = outcome.message();
            }
            WorkerEvent::Error(message) => {
                self.running = false;
                self.status = format!("Error: {message}");
            }
        }
    }

    /// The worker's channel closed before a final event arrived.
    pub fn worker_lost(&mut self) {
        self.running = false;
        self.status = "Error: the OCR worker stopped unexpectedly".to_string();
    }

    pub fn progress_fraction(&self) -> f32 {
        self.progress
            .map(|p| f32::from(p.percent()) / 100.0)
            .unwrap_or(0.0)
    }
}
