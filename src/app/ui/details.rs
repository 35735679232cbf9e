use eframe::egui::{self, Color32, RichText, Ui};

use super::super::ViewModel;

const HISTORY_ROWS: usize = 8;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Écho");
        ui.add_space(6.0);

        match &self.feed.murmur {
            Some(murmur) => {
                ui.label(RichText::new(murmur).italics());
            }
            None => {
                ui.label("Touchez un nœud pour l'écouter, appui long pour plonger dedans.");
            }
        }

        if let Some(node) = self.engine.focus().and_then(|id| self.engine.snapshot().node(id)) {
            ui.small(format!("Focus : {} ({})", node.label, node.category.label()));
        }

        ui.separator();
        ui.label(RichText::new("Sélection").strong());
        if self.feed.selection.is_empty() {
            ui.label("Double-touchez deux nœuds pour les faire résonner.");
        }
        for id in &self.feed.selection {
            let label = self
                .engine
                .snapshot()
                .node(id)
                .map_or(id.as_str(), |node| node.label.as_str());
            ui.label(format!("• {label}"));
        }

        if let Some(text) = self.engine.resonance_text() {
            ui.add_space(4.0);
            ui.label(RichText::new(text).color(Color32::from_rgb(186, 230, 253)));
            ui.small("Appui long sur la bulle pour garder cette résonance.");
        }
        if self.engine.stable_echo_count() > 0 {
            ui.small(format!("Échos gardés : {}", self.engine.stable_echo_count()));
        }

        if let Some(error) = self.engine.frame_error() {
            ui.separator();
            ui.colored_label(
                Color32::from_rgb(248, 113, 113),
                format!("Rendu interrompu : {error}"),
            );
        }

        ui.separator();
        egui::CollapsingHeader::new("Résonances récentes")
            .default_open(true)
            .show(ui, |ui| {
                if self.feed.history.is_empty() {
                    ui.label("Aucune résonance pour l'instant.");
                }
                for record in self.feed.history.iter().take(HISTORY_ROWS) {
                    ui.label(&record.text);
                    ui.small(format!("{} ↔ {}", record.pair[0], record.pair[1]));
                }
            });

        ui.separator();
        egui::CollapsingHeader::new("Prompt prêt").show(ui, |ui| {
            let mut prompt = self.prompt_text();
            ui.add(
                egui::TextEdit::multiline(&mut prompt)
                    .code_editor()
                    .interactive(false),
            );
        });

        if let Some(reply) = &self.cloud_reply {
            ui.separator();
            ui.label(RichText::new(format!("Réponse ({})", reply.provider)).strong());
            ui.label(&reply.output);
        }
    }
}
