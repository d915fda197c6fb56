mod graph;
mod scene;

use crate::{
    config::{Block, DisplayConfig},
    pipe::{Task2UI, TaskFailure, TaskInformation, UI2Task},
    session::Report,
    trial::{Frame, TrialResult},
};
use egui::{Color32, TextStyle, vec2};
use log::info;
use std::sync::mpsc::TryRecvError;

pub struct UI {
    tx: std::sync::mpsc::Sender<UI2Task>,
    rx: std::sync::mpsc::Receiver<Task2UI>,
    display: DisplayConfig,
    information: Option<TaskInformation>,
    started: bool,
    block: Option<(usize, Block)>,
    frame: Option<Frame>,
    last_result: Option<TrialResult>,
    report: Option<Report>,
    failure: Option<TaskFailure>,
}

impl UI {
    pub fn new(
        tx: std::sync::mpsc::Sender<UI2Task>,
        rx: std::sync::mpsc::Receiver<Task2UI>,
        display: DisplayConfig,
        cc: &eframe::CreationContext,
    ) -> Self {
        cc.egui_ctx.style_mut(|style| {
            for (style, font) in &mut style.text_styles {
                match style {
                    TextStyle::Body => font.size = 19.0,
                    TextStyle::Heading => font.size = 36.0,
                    _ => {}
                }
            }
        });

        Self {
            tx,
            rx,
            display,
            information: None,
            started: false,
            block: None,
            frame: None,
            last_result: None,
            report: None,
            failure: None,
        }
    }

    pub fn run(
        tx: std::sync::mpsc::Sender<UI2Task>,
        rx: std::sync::mpsc::Receiver<Task2UI>,
        display: DisplayConfig,
    ) -> eframe::Result<()> {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_title("Visuomotor Task")
                .with_inner_size([display.width, display.height + 40.0]),
            ..Default::default()
        };
        let rtn =
            eframe::run_native("Visuomotor Task", options, Box::new(move |cc| Ok(Box::new(UI::new(tx, rx, display, cc)))));
        info!("Frontend stopped");
        rtn
    }

    fn handle(&mut self, msg: Task2UI) {
        match msg {
            Task2UI::Running(inf) => self.information = Some(inf),
            Task2UI::Failure(inf) => self.failure = Some(inf),
            Task2UI::BlockStarted { index, block } => self.block = Some((index, block)),
            Task2UI::Frame(frame) => self.frame = Some(frame),
            Task2UI::TrialRecorded(result) => self.last_result = Some(result),
            Task2UI::Finished(report) => self.report = Some(report),
        }
    }

    fn caption(&self) -> String {
        let (Some((index, block)), Some(information)) = (&self.block, &self.information) else {
            return String::new();
        };
        let trial = self.frame.map(|f| f.trial).unwrap_or(0);
        let mut caption =
            format!("{} block {}/{}, trial {}/{}", block.kind, index + 1, information.blocks.len(), trial, block.trials);
        if let Some(result) = &self.last_result {
            match result.error {
                Some(error) => caption.push_str(&format!("    last error {:.1}°", error)),
                None => caption.push_str("    last trial: no movement"),
            }
        }
        caption
    }
}

impl eframe::App for UI {
    fn update(&mut self, ctx: &eframe::egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint();
        loop {
            match self.rx.try_recv() {
                Ok(msg) => self.handle(msg),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.report.is_none() && self.failure.is_none() {
                        self.failure = Some(TaskFailure::Disconnected);
                    }
                    break;
                }
            }
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            let _ = self.tx.send(UI2Task::Shutdown);
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        let running = self.started && self.report.is_none() && self.failure.is_none();
        let panel = if running {
            egui::CentralPanel::default().frame(egui::Frame::none().fill(Color32::BLACK))
        } else {
            egui::CentralPanel::default()
        };

        panel.show(ctx, |ui| {
            if let Some(failure) = &self.failure {
                ui.heading(egui::RichText::from("Task Failed").color(Color32::RED));
                ui.separator();
                ui.label(format!("{}", failure));
                return;
            }

            if let Some(report) = &self.report {
                ui.heading("Directional Error Across Trials");
                ui.separator();
                ui.label(format!("{} trials, {} without movement", report.trials.len(), report.missed()));
                graph::graph(report, ui);
                return;
            }

            let Some(information) = &self.information else {
                ui.heading("Starting...");
                return;
            };

            if !self.started {
                ui.heading(format!("{}", &information.device));
                ui.separator();

                let rect = egui::Rect::from_center_size(ui.available_rect_before_wrap().center(), vec2(200.0, 50.0));
                let cursor = vec2(
                    (ui.available_rect_before_wrap().width() - rect.width()) / 2.0 - ui.spacing().item_spacing.x,
                    (ui.available_rect_before_wrap().height() - rect.height()) / 2.0 - ui.spacing().item_spacing.y,
                );

                ui.horizontal(|ui| {
                    ui.allocate_space(cursor);
                    ui.vertical(|ui| {
                        ui.allocate_space(cursor);
                        if ui.add_sized(vec2(200.0, 50.0), egui::Button::new("Start")).clicked() {
                            let _ = self.tx.send(UI2Task::Start);
                            self.started = true;
                        }
                    });
                });
                return;
            }

            ui.label(egui::RichText::from(self.caption()).color(Color32::GRAY));
            let response = scene::scene(ui, &self.display, &information.ring, self.frame.as_ref());
            if response.hovered() {
                ui.ctx().set_cursor_icon(egui::CursorIcon::None);
            }
        });
    }

    fn on_exit(&mut self, _ctx: Option<&eframe::glow::Context>) { let _ = self.tx.send(UI2Task::Shutdown); }
}
