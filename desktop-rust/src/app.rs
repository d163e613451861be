use std::path::PathBuf;
use std::sync::mpsc::TryRecvError;

use eframe::egui::{self, Color32, RichText};
use eframe::egui::{FontData, FontDefinitions, FontFamily};

use gemini_ocr::analyzer::GeminiClient;
use gemini_ocr::config::{Settings, SUPPORTED_MODELS};
use gemini_ocr::scanner::IMAGE_EXTENSIONS;
use gemini_ocr::worker::{spawn_worker, WorkerEvent, WorkerHandle};
use gemini_ocr_common::DEFAULT_CUSTOM_PROMPT;

use crate::io::{existing_dir, initial_output_path, parent_dir, save_settings};
use crate::model::{AppState, PromptMode};

const PREVIEW_CELL_CHARS: usize = 60;

pub struct DesktopApp {
    settings: Settings,
    state: AppState,
    worker: Option<WorkerHandle>,
    show_api_key: bool,
}

impl DesktopApp {
    pub fn new(settings: Settings, notice: Option<String>) -> Self {
        let mut state = AppState {
            output_path: initial_output_path(&settings),
            prompt_file: settings.last_prompt_file.clone(),
            status: notice.unwrap_or_default(),
            ..Default::default()
        };
        if !state.prompt_file.is_empty() {
            state.prompt_mode = PromptMode::File;
        }
        Self {
            settings,
            state,
            worker: None,
            show_api_key: false,
        }
    }

    /// Writes the settings file; failures go to the status line.
    fn persist_settings(&mut self) -> bool {
        match save_settings(&self.settings) {
            Ok(()) => {
                tracing::debug!("settings saved");
                true
            }
            Err(err) => {
                self.state.status = format!("Settings save failed: {err:#}");
                false
            }
        }
    }

    fn save_api_key(&mut self) {
        self.settings.api_key = self.settings.api_key.trim().to_string();
        if self.persist_settings() {
            self.state.status = "API key saved".to_string();
        }
    }

    fn add_files(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("Images", IMAGE_EXTENSIONS);
        if let Some(dir) = existing_dir(&self.settings.last_photo_dir) {
            dialog = dialog.set_directory(dir);
        }
        let Some(paths) = dialog.pick_files() else {
            return;
        };
        let picked_dir = parent_dir(&paths);
        let added = self.state.selection.add_files(paths);
        self.state.status = format!("Added {added} image(s)");

        if let Some(dir) = picked_dir {
            self.settings.last_photo_dir = dir;
            self.persist_settings();
        }
    }

    fn add_folder(&mut self) {
        let mut dialog = rfd::FileDialog::new();
        if let Some(dir) = existing_dir(&self.settings.last_photo_dir) {
            dialog = dialog.set_directory(dir);
        }
        let Some(folder) = dialog.pick_folder() else {
            return;
        };
        match self.state.selection.add_folder(&folder) {
            Ok(0) => self.state.status = format!("No images found in {}", folder.display()),
            Ok(added) => self.state.status = format!("Added {added} image(s) from {}", folder.display()),
            Err(err) => {
                self.state.status = format!("Error: {err}");
                return;
            }
        }
        self.settings.last_photo_dir = folder.display().to_string();
        self.persist_settings();
    }

    fn choose_output(&mut self) {
        let current = PathBuf::from(self.state.output_path.trim());
        let file_name = current
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("output.xlsx")
            .to_string();
        let mut dialog = rfd::FileDialog::new()
            .add_filter("Excel", &["xlsx"])
            .set_file_name(file_name);
        if let Some(dir) = existing_dir(&self.state.output_path) {
            dialog = dialog.set_directory(dir);
        }
        if let Some(path) = dialog.save_file() {
            self.state.output_path = path.display().to_string();
            self.remember_output();
        }
    }

    fn remember_output(&mut self) {
        let output = self.state.output_path.trim().to_string();
        if output != self.settings.last_output_path {
            self.settings.last_output_path = output;
            self.persist_settings();
        }
    }

    fn choose_prompt_file(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("Text", &["txt"]);
        if let Some(dir) = existing_dir(&self.state.prompt_file) {
            dialog = dialog.set_directory(dir);
        }
        if let Some(path) = dialog.pick_file() {
            self.state.prompt_file = path.display().to_string();
            self.remember_prompt_file();
        }
    }

    fn remember_prompt_file(&mut self) {
        let prompt_file = self.state.prompt_file.trim().to_string();
        if prompt_file != self.settings.last_prompt_file {
            self.settings.last_prompt_file = prompt_file;
            self.persist_settings();
        }
    }

    fn run(&mut self) {
        let api_key = match self.settings.resolve_api_key() {
            Ok(key) => key,
            Err(_) => {
                self.state.status = "Enter an API key first.".to_string();
                return;
            }
        };
        let (job, notice) = match self.state.build_job() {
            Ok(prepared) => prepared,
            Err(message) => {
                self.state.status = message;
                return;
            }
        };

        self.settings.api_key = self.settings.api_key.trim().to_string();
        self.settings.last_output_path = job.output_path.display().to_string();
        if !self.persist_settings() {
            return;
        }

        let total = job.images.len();
        let client = GeminiClient::new(api_key, self.settings.model.as_str());
        match spawn_worker(job, client) {
            Ok(handle) => {
                tracing::info!(images = total, model = %self.settings.model, "OCR started");
                self.worker = Some(handle);
                self.state.start(total, notice);
            }
            Err(err) => self.state.status = format!("Error: {err}"),
        }
    }

    fn poll_worker(&mut self) {
        let Some(worker) = &self.worker else {
            return;
        };

        let mut events = Vec::new();
        let mut finished = false;
        let mut lost = false;
        loop {
            match worker.try_recv() {
                Ok(event) => {
                    finished = event.is_terminal();
                    events.push(event);
                    if finished {
                        break;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    lost = true;
                    break;
                }
            }
        }

        for event in events {
            if let WorkerEvent::Error(message) = &event {
                tracing::error!(%message, "OCR worker failed");
            }
            self.state.apply_event(event);
        }
        if lost && !finished {
            self.state.worker_lost();
        }
        if finished || lost {
            self.worker = None;
        }
    }

    fn render_settings(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("API Key");
            ui.add(
                egui::TextEdit::singleline(&mut self.settings.api_key)
                    .password(!self.show_api_key)
                    .desired_width(320.0),
            );
            ui.checkbox(&mut self.show_api_key, "Show");
            if ui.button("Save Key").clicked() {
                self.save_api_key();
            }

            ui.separator();
            ui.label("Model");
            let mut model = self.settings.model.clone();
            egui::ComboBox::from_id_source("model")
                .selected_text(model.as_str())
                .show_ui(ui, |ui| {
                    for name in SUPPORTED_MODELS {
                        ui.selectable_value(&mut model, name.to_string(), *name);
                    }
                });
            if model != self.settings.model {
                self.settings.model = model;
                self.persist_settings();
            }
        });
    }

    fn render_inputs(&mut self, ui: &mut egui::Ui) {
        let enabled = !self.state.running;

        ui.heading("Images");
        ui.horizontal(|ui| {
            if ui.add_enabled(enabled, egui::Button::new("Add Files")).clicked() {
                self.add_files();
            }
            if ui.add_enabled(enabled, egui::Button::new("Add Folder")).clicked() {
                self.add_folder();
            }
            let can_clear = enabled && !self.state.selection.is_empty();
            if ui.add_enabled(can_clear, egui::Button::new("Clear")).clicked() {
                self.state.selection.clear();
            }
        });
        ui.label(format!("{} selected", self.state.selection.len()));

        let mut remove = None;
        egui::ScrollArea::vertical()
            .id_source("selection")
            .max_height(220.0)
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for (index, image) in self.state.selection.images().iter().enumerate() {
                    ui.horizontal(|ui| {
                        if ui.add_enabled(enabled, egui::Button::new("✕").small()).clicked() {
                            remove = Some(index);
                        }
                        ui.label(image.file_name.as_str())
                            .on_hover_text(image.path.display().to_string());
                    });
                }
            });
        if let Some(index) = remove {
            self.state.selection.remove(index);
        }

        ui.separator();
        ui.heading("Output");
        ui.horizontal(|ui| {
            let response = ui.add_enabled(
                enabled,
                egui::TextEdit::singleline(&mut self.state.output_path).desired_width(220.0),
            );
            if response.lost_focus() {
                self.remember_output();
            }
            if ui.add_enabled(enabled, egui::Button::new("Browse...")).clicked() {
                self.choose_output();
            }
        });

        ui.separator();
        ui.heading("Prompt");
        ui.horizontal(|ui| {
            ui.radio_value(&mut self.state.prompt_mode, PromptMode::Typed, "Type");
            ui.radio_value(&mut self.state.prompt_mode, PromptMode::File, "From file");
        });
        match self.state.prompt_mode {
            PromptMode::Typed => {
                ui.add_enabled(
                    enabled,
                    egui::TextEdit::multiline(&mut self.state.prompt_text)
                        .desired_rows(6)
                        .hint_text(DEFAULT_CUSTOM_PROMPT),
                );
            }
            PromptMode::File => {
                ui.horizontal(|ui| {
                    let response = ui.add_enabled(
                        enabled,
                        egui::TextEdit::singleline(&mut self.state.prompt_file)
                            .desired_width(220.0),
                    );
                    if response.lost_focus() {
                        self.remember_prompt_file();
                    }
                    if ui.add_enabled(enabled, egui::Button::new("Browse...")).clicked() {
                        self.choose_prompt_file();
                    }
                });
            }
        }

        ui.separator();
        let label = if self.state.running { "Running..." } else { "Run OCR" };
        if ui
            .add_enabled(enabled, egui::Button::new(RichText::new(label).strong()))
            .clicked()
        {
            self.run();
        }
    }

    fn render_status(&self, ui: &mut egui::Ui) {
        if self.state.progress.is_some() {
            ui.add(egui::ProgressBar::new(self.state.progress_fraction()).show_percentage());
        }
        if !self.state.status.is_empty() {
            let color = if self.state.status.starts_with("Error") {
                Color32::from_rgb(230, 110, 100)
            } else {
                Color32::from_gray(170)
            };
            ui.label(RichText::new(&self.state.status).color(color));
        }
    }

    fn render_preview(&self, ui: &mut egui::Ui) {
        ui.heading("Results");
        ui.separator();
        let Some(table) = &self.state.preview else {
            ui.label("No results yet.");
            return;
        };
        ui.label(format!("{} rows", table.len()));

        egui::ScrollArea::both().auto_shrink([false, false]).show(ui, |ui| {
            egui::Grid::new("preview_grid")
                .striped(true)
                .min_col_width(80.0)
                .show(ui, |ui| {
                    for column in table.columns() {
                        ui.label(RichText::new(column).strong());
                    }
                    ui.end_row();

                    for row in table.rows() {
                        for cell in row {
                            let text = cell.to_string();
                            let shown = truncate(&text, PREVIEW_CELL_CHARS);
                            let response = ui.label(RichText::new(shown).size(12.0));
                            if shown.len() < text.len() {
                                response.on_hover_text(text);
                            }
                        }
                        ui.end_row();
                    }
                });
        });
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn configure_fonts(ctx: &egui::Context) {
    let mut fonts = FontDefinitions::default();
    let candidates = [
        r"C:\Windows\Fonts\meiryo.ttc",
        r"C:\Windows\Fonts\msgothic.ttc",
        "/System/Library/Fonts/ヒラギノ角ゴシック W3.ttc",
        "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
        "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
        "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
    ];

    let Some(data) = candidates.iter().find_map(|path| std::fs::read(path).ok()) else {
        tracing::debug!("no CJK font found; OCR text may not render");
        return;
    };

    fonts
        .font_data
        .insert("cjk".to_string(), FontData::from_owned(data));
    for family in [FontFamily::Proportional, FontFamily::Monospace] {
        fonts
            .families
            .entry(family)
            .or_default()
            .insert(0, "cjk".to_string());
    }
    ctx.set_fonts(fonts);
}

impl eframe::App for DesktopApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_worker();
        if self.worker.is_some() {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("settings").show(ctx, |ui| {
            ui.add_space(4.0);
            self.render_settings(ui);
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.add_space(4.0);
            self.render_status(ui);
            ui.add_space(4.0);
        });

        egui::SidePanel::left("inputs")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.render_inputs(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_preview(ui);
        });
    }
}
