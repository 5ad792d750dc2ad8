use std::{fs, time::Duration};

use arboard::Clipboard;
use client_core::{
    narration::{parse_narration, plain_text, NarrationSpan},
    trivia::LOADING_STEPS,
    types::IMAGE_UNAVAILABLE,
    AnalysisResult, ControllerSnapshot, ProcessingState, TriviaUpdate,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::TextureHandle;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{err_label, UiError, UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;
use crate::media::{self, DecodedVisualization};

const ACCENT: egui::Color32 = egui::Color32::from_rgb(201, 162, 39);
const CARD_FILL: egui::Color32 = egui::Color32::from_rgb(30, 33, 40);
const MAX_CONTENT_WIDTH: f32 = 760.0;

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusBannerSeverity {
    Error,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    severity: StatusBannerSeverity,
    message: String,
}

impl StatusBanner {
    fn from_error(err: &UiError) -> Self {
        Self {
            severity: StatusBannerSeverity::Error,
            message: format!("{} error: {}", err_label(err.category()), err.message()),
        }
    }
}

struct VisualizationTexture {
    texture: TextureHandle,
    size: egui::Vec2,
    original_bytes: Vec<u8>,
}

pub struct ScoreSenseApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    startup: StartupConfig,
    snapshot: ControllerSnapshot,
    trivia: TriviaUpdate,
    visualization: Option<VisualizationTexture>,
    visualization_error: Option<String>,
    narration: Vec<NarrationSpan>,
    status: String,
    status_banner: Option<StatusBanner>,
    theme_applied: bool,
}

impl ScoreSenseApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: StartupConfig,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            startup,
            snapshot: ControllerSnapshot::default(),
            trivia: TriviaUpdate::default(),
            visualization: None,
            visualization_error: None,
            narration: Vec::new(),
            status: "Starting...".to_string(),
            status_banner: None,
            theme_applied: false,
        }
    }

    fn process_ui_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Error(err) => self.report_error(err),
                UiEvent::StateChanged(snapshot) => self.apply_snapshot(snapshot),
                UiEvent::Trivia(update) => {
                    self.trivia = update;
                }
                UiEvent::VisualizationDecoded(decoded) => {
                    self.visualization_error = None;
                    self.visualization = decoded.map(|decoded| load_visualization(ctx, decoded));
                }
                UiEvent::VisualizationFailed { reason } => {
                    self.visualization = None;
                    self.visualization_error = Some(reason);
                }
            }
        }
    }

    fn report_error(&mut self, err: UiError) {
        tracing::warn!(context = ?err.context(), "{}", err.message());
        self.status = err.message().to_string();
        self.status_banner = Some(StatusBanner::from_error(&err));
    }

    fn apply_snapshot(&mut self, snapshot: ControllerSnapshot) {
        let narration_changed = self.snapshot.result.as_ref().map(|r| &r.narration)
            != snapshot.result.as_ref().map(|r| &r.narration);
        if narration_changed {
            self.narration = snapshot
                .result
                .as_ref()
                .map(|result| parse_narration(result.display_narration()))
                .unwrap_or_default();
        }

        self.status = match snapshot.state {
            ProcessingState::Idle => "Ready".to_string(),
            ProcessingState::PendingAuto | ProcessingState::Loading => {
                snapshot.loading_message().to_string()
            }
            ProcessingState::HasResult if snapshot.error_message.is_some() => {
                "Showing previous visualization".to_string()
            }
            ProcessingState::HasResult => "Visualization ready".to_string(),
            ProcessingState::Error => "Upload failed".to_string(),
        };
        self.snapshot = snapshot;
    }

    fn apply_theme_if_needed(&mut self, ctx: &egui::Context) {
        if self.theme_applied {
            return;
        }
        let mut style = (*ctx.style()).clone();
        style.visuals = egui::Visuals::dark();
        style.visuals.selection.bg_fill = ACCENT.gamma_multiply(0.7);
        style.visuals.hyperlink_color = ACCENT;
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        style.spacing.button_padding = egui::vec2(12.0, 6.0);
        style.spacing.interact_size = egui::vec2(40.0, 30.0);
        ctx.set_style(style);
        self.theme_applied = true;
    }

    fn pick_score(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_title("Select sheet music")
            .add_filter("PDF", &["pdf"])
            .pick_file()
        {
            self.status = format!("Reading {}", path.display());
            dispatch_backend_command(
                &self.cmd_tx,
                BackendCommand::SelectFile { path },
                &mut self.status,
            );
        }
    }

    fn request_regenerate(&mut self) {
        dispatch_backend_command(&self.cmd_tx, BackendCommand::Regenerate, &mut self.status);
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.status_banner.clone() {
            let (fill, stroke) = match banner.severity {
                StatusBannerSeverity::Error => (
                    egui::Color32::from_rgb(111, 53, 53),
                    egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)),
                ),
            };

            egui::Frame::NONE
                .fill(fill)
                .stroke(stroke)
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(egui::RichText::new(&banner.message).color(egui::Color32::WHITE));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.status_banner = None;
                            }
                        });
                    });
                });
            ui.add_space(8.0);
        }
    }

    fn show_intro_card(&mut self, ui: &mut egui::Ui) {
        card_frame().show(ui, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(egui::RichText::new("ScoreSense").color(ACCENT).size(30.0));
                ui.add_space(4.0);
                ui.label(
                    "Upload a PDF of sheet music to see the piece as an image and read a \
                     plain-language story of how it sounds.",
                );
                ui.add_space(14.0);
                let upload = ui.add_enabled(
                    self.snapshot.can_upload(),
                    egui::Button::new(egui::RichText::new("Upload Sheet Music (PDF Only)").strong())
                        .fill(ACCENT.gamma_multiply(0.35)),
                );
                if upload.clicked() {
                    self.pick_score();
                }
                if let Some(message) = self.snapshot.error_message.clone() {
                    ui.add_space(10.0);
                    ui.label(egui::RichText::new(message).color(error_text_color()));
                }
            });
        });
    }

    fn show_loading_card(&mut self, ui: &mut egui::Ui) {
        let time = ui.ctx().input(|i| i.time);
        card_frame().show(ui, |ui| {
            ui.vertical_centered(|ui| {
                show_loading_dots(ui, time);
                ui.add_space(6.0);
                ui.heading(self.snapshot.loading_message());
                if let Some(file) = &self.snapshot.selected_file {
                    ui.label(
                        egui::RichText::new(format!(
                            "{} ({})",
                            file.name,
                            human_readable_bytes(file.size_bytes as u64)
                        ))
                        .weak(),
                    );
                }
                ui.add_space(10.0);
                ui.add(
                    egui::ProgressBar::new(progress_fraction(self.trivia.step))
                        .desired_width(ui.available_width().min(420.0))
                        .fill(ACCENT),
                );
                ui.add_space(12.0);
                ui.label(egui::RichText::new("Did you know?").strong());
                ui.label(egui::RichText::new(&self.trivia.text).italics());
            });
        });
    }

    fn show_result_card(&mut self, ui: &mut egui::Ui, result: &AnalysisResult) {
        card_frame().show(ui, |ui| {
            ui.heading(
                egui::RichText::new(format!("Visualizing: {}", result.display_title()))
                    .color(ACCENT),
            );
            ui.label(format!(
                "Visualization Style: {}",
                result.display_visualization_type()
            ));
            ui.add_space(10.0);

            match &self.visualization {
                Some(visualization) => {
                    let width = ui.available_width().min(visualization.size.x);
                    let scale = width / visualization.size.x.max(1.0);
                    ui.vertical_centered(|ui| {
                        ui.add(
                            egui::Image::new(&visualization.texture)
                                .fit_to_exact_size(visualization.size * scale),
                        );
                    });
                }
                None => {
                    let message = self
                        .visualization_error
                        .as_deref()
                        .map(|reason| format!("{IMAGE_UNAVAILABLE} ({reason})"))
                        .unwrap_or_else(|| IMAGE_UNAVAILABLE.to_string());
                    ui.label(egui::RichText::new(message).weak());
                }
            }

            ui.add_space(12.0);
            ui.label(egui::RichText::new("Narrative for Non-Musicians:").strong());
            ui.label(narration_job(&self.narration, ui.available_width()));

            if let Some(message) = self.snapshot.error_message.clone() {
                ui.add_space(10.0);
                show_error_overlay(ui, &message);
            }

            ui.add_space(12.0);
            ui.horizontal_wrapped(|ui| {
                let regenerate = ui.add_enabled(
                    self.snapshot.can_regenerate(),
                    egui::Button::new("Generate Another Visual Style"),
                );
                if regenerate.clicked() {
                    self.request_regenerate();
                }
                if ui
                    .add_enabled(
                        self.snapshot.can_upload(),
                        egui::Button::new("Upload New Sheet Music"),
                    )
                    .clicked()
                {
                    self.pick_score();
                }
            });
            ui.horizontal_wrapped(|ui| {
                let bytes = self
                    .visualization
                    .as_ref()
                    .map(|visualization| visualization.original_bytes.clone());
                if let Some(bytes) = bytes {
                    if ui.button("Save Image…").clicked() {
                        self.save_image_bytes_as(&bytes, &media::suggested_image_file_name(result));
                    }
                    if ui.button("Copy Image").clicked() {
                        match media::write_clipboard_image(&bytes) {
                            Ok(()) => self.status = "Copied visualization to clipboard".to_string(),
                            Err(err) => self.report_error(UiError::from_message(
                                UiErrorContext::General,
                                format!("failed to copy visualization: {err}"),
                            )),
                        }
                    }
                }
                if ui.button("Copy Narration").clicked() {
                    self.copy_narration(result);
                }
            });

        });
    }

    fn save_image_bytes_as(&mut self, bytes: &[u8], suggested_name: &str) {
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(suggested_name)
            .add_filter("PNG image", &["png"])
            .save_file()
        {
            match fs::write(&path, bytes) {
                Ok(()) => {
                    self.status = format!("Saved image to {}", path.display());
                }
                Err(err) => self.report_error(UiError::from_message(
                    UiErrorContext::General,
                    format!("failed to save image: {err}"),
                )),
            }
        }
    }

    fn copy_narration(&mut self, result: &AnalysisResult) {
        let text = plain_text(result.display_narration());
        match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
            Ok(()) => self.status = "Copied narration to clipboard".to_string(),
            Err(err) => self.status = format!("Failed to copy narration: {err}"),
        }
    }

    fn show_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar")
            .frame(
                egui::Frame::NONE
                    .fill(egui::Color32::from_rgb(22, 24, 29))
                    .inner_margin(egui::Margin::symmetric(10, 4)),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(&self.status).small());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            egui::RichText::new(format!("Backend: {}", self.startup.base_url))
                                .small()
                                .weak(),
                        );
                    });
                });
            });
    }
}

impl eframe::App for ScoreSenseApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events(ctx);
        self.apply_theme_if_needed(ctx);
        self.show_status_bar(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    let side = ((ui.available_width() - MAX_CONTENT_WIDTH) / 2.0).max(0.0);
                    ui.horizontal(|ui| {
                        ui.add_space(side);
                        ui.vertical(|ui| {
                            ui.set_max_width(MAX_CONTENT_WIDTH);
                            ui.add_space(16.0);
                            self.show_status_banner(ui);
                            match self.snapshot.state {
                                ProcessingState::PendingAuto | ProcessingState::Loading => {
                                    self.show_loading_card(ui)
                                }
                                _ => match self.snapshot.result.clone() {
                                    Some(result) => self.show_result_card(ui, &result),
                                    None => self.show_intro_card(ui),
                                },
                            }
                            if let Some(disclaimer) = visible_disclaimer(&self.snapshot) {
                                ui.add_space(14.0);
                                show_disclaimer(ui, disclaimer);
                            }
                        });
                    });
                });
        });

        let loading = self.snapshot.is_loading
            || self.snapshot.state == ProcessingState::PendingAuto;
        if loading {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

fn load_visualization(ctx: &egui::Context, decoded: DecodedVisualization) -> VisualizationTexture {
    let preview = decoded.preview;
    let color_image =
        egui::ColorImage::from_rgba_unmultiplied([preview.width, preview.height], &preview.rgba);
    let texture = ctx.load_texture("visualization", color_image, egui::TextureOptions::LINEAR);
    VisualizationTexture {
        texture,
        size: egui::vec2(preview.width as f32, preview.height as f32),
        original_bytes: decoded.original_bytes,
    }
}

fn card_frame() -> egui::Frame {
    egui::Frame::NONE
        .fill(CARD_FILL)
        .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(52, 56, 66)))
        .corner_radius(10.0)
        .inner_margin(egui::Margin::symmetric(20, 18))
}

fn error_text_color() -> egui::Color32 {
    egui::Color32::from_rgb(240, 128, 128)
}

fn show_error_overlay(ui: &mut egui::Ui, message: &str) {
    egui::Frame::NONE
        .fill(egui::Color32::from_rgb(74, 38, 40))
        .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
        .corner_radius(6.0)
        .inner_margin(egui::Margin::symmetric(10, 8))
        .show(ui, |ui| {
            ui.label(egui::RichText::new(message).color(error_text_color()));
        });
}

/// The retained result's disclaimer stays visible while a new style is generating.
fn visible_disclaimer(snapshot: &ControllerSnapshot) -> Option<&str> {
    snapshot.result.as_ref().and_then(AnalysisResult::disclaimer)
}

fn show_disclaimer(ui: &mut egui::Ui, disclaimer: &str) {
    egui::Frame::NONE
        .fill(egui::Color32::from_rgb(40, 44, 54))
        .corner_radius(6.0)
        .inner_margin(egui::Margin::symmetric(10, 8))
        .show(ui, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.label(
                    egui::RichText::new("Visualization Consistency Disclaimer:")
                        .small()
                        .strong(),
                );
                ui.label(egui::RichText::new(disclaimer).small().weak());
            });
        });
}

fn show_loading_dots(ui: &mut egui::Ui, time: f64) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(84.0, 28.0), egui::Sense::hover());
    for index in 0..3 {
        let center = egui::pos2(
            rect.left() + 18.0 + index as f32 * 24.0,
            rect.center().y + loading_dot_offset(time, index),
        );
        ui.painter().circle_filled(center, 6.0, ACCENT);
    }
}

/// Vertical offset of each dot; phases are staggered so the dots ripple.
fn loading_dot_offset(time: f64, index: usize) -> f32 {
    ((time * 5.0 - index as f64 * 0.8).sin() * 6.0) as f32
}

/// Starts empty and stops one step short of full, like the fact counter wraps.
fn progress_fraction(step: u8) -> f32 {
    f32::from(step % LOADING_STEPS) / f32::from(LOADING_STEPS)
}

fn narration_job(spans: &[NarrationSpan], wrap_width: f32) -> egui::text::LayoutJob {
    let mut job = egui::text::LayoutJob::default();
    job.wrap.max_width = wrap_width;
    let body = egui::Color32::from_gray(215);
    for span in spans {
        job.append(
            &span.text,
            0.0,
            egui::TextFormat {
                font_id: egui::FontId::proportional(15.0),
                color: if span.bold { egui::Color32::WHITE } else { body },
                italics: span.italic,
                underline: if span.bold {
                    egui::Stroke::new(1.0, ACCENT.gamma_multiply(0.5))
                } else {
                    egui::Stroke::NONE
                },
                ..Default::default()
            },
        );
    }
    job
}

fn human_readable_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f >= MB {
        format!("{:.1} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.1} KB", bytes_f / KB)
    } else {
        format!("{bytes} B")
    }
}
