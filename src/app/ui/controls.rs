use eframe::egui::{self, Key, Response, Ui};

use crate::layout::LayoutStrategy;

use super::super::ViewModel;
use super::super::physics::PhysicsConfig;
use super::{STYLES, USAGES, catalog_label};

const SLIDER_KEY_BASE_RATE: f32 = 10.0;
const SLIDER_KEY_ACCEL_PER_SEC: f32 = 9.0;
const SLIDER_KEY_ACCEL_MAX: f32 = 40.0;

#[derive(Clone, Copy, Default)]
struct SliderKeyHoldState {
    positive_secs: f32,
    negative_secs: f32,
}

fn slider_key_accel_multiplier(hold_secs: f32) -> f32 {
    let ramp = hold_secs * SLIDER_KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(SLIDER_KEY_ACCEL_MAX)
}

fn default_slider_key_step(min: f32, max: f32) -> f32 {
    ((max - min) / 200.0).max(0.0005)
}

/// Holding an arrow key on a focused slider moves it faster the longer the
/// key stays down.
fn apply_slider_arrow_acceleration(
    ui: &Ui,
    response: &Response,
    value: &mut f32,
    min: f32,
    max: f32,
) -> bool {
    let state_id = response.id.with("arrow_key_hold_state");
    let mut hold_state = ui.ctx().data(|data| {
        data.get_temp::<SliderKeyHoldState>(state_id)
            .unwrap_or_default()
    });

    if !response.has_focus() {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, SliderKeyHoldState::default()));
        return false;
    }

    let (delta_time, increase_down, decrease_down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });

    hold_state.positive_secs = if increase_down {
        hold_state.positive_secs + delta_time
    } else {
        0.0
    };
    hold_state.negative_secs = if decrease_down {
        hold_state.negative_secs + delta_time
    } else {
        0.0
    };
    ui.ctx()
        .data_mut(|data| data.insert_temp(state_id, hold_state));

    let direction = (increase_down as i8) - (decrease_down as i8);
    if direction == 0 {
        return false;
    }

    let hold_secs = if direction > 0 {
        hold_state.positive_secs
    } else {
        hold_state.negative_secs
    };
    let speed = SLIDER_KEY_BASE_RATE * slider_key_accel_multiplier(hold_secs);
    let step = default_slider_key_step(min, max);
    let old_value = *value;
    *value = (*value + direction as f32 * step * speed * delta_time).clamp(min, max);
    ui.ctx().request_repaint();

    (*value - old_value).abs() > f32::EPSILON
}

fn tuning_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: std::ops::RangeInclusive<f32>,
    text: &str,
    hover: &str,
) -> bool {
    let (min, max) = (*range.start(), *range.end());
    let slider = ui
        .add(
            egui::Slider::new(value, range)
                .text(text)
                .clamping(egui::SliderClamping::Always),
        )
        .on_hover_text(hover);
    if slider.hovered() {
        slider.request_focus();
    }
    let dragged = slider.changed();
    dragged | apply_slider_arrow_acceleration(ui, &slider, value, min, max)
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Déposer les mots");
        ui.separator();
        ui.add_space(4.0);

        ui.add(
            egui::TextEdit::multiline(&mut self.draft)
                .hint_text("La mer, le vent, une lumière qui tremble...")
                .desired_rows(3),
        );
        ui.horizontal(|ui| {
            if ui.button("Faire résonner").clicked() {
                self.deposit();
            }
            if ui
                .button("Réinitialiser la scène")
                .on_hover_text("Efface focus et sélection et recentre la vue.")
                .clicked()
            {
                self.engine.reset(&mut self.feed);
            }
        });
        if !self.session.words.is_empty() {
            ui.small(format!("Mots retenus : {}", self.session.words.join(", ")));
        }

        ui.separator();
        ui.label("Chercher un nœud")
            .on_hover_text("Entoure en bleu les nœuds dont le libellé correspond.");
        if ui.text_edit_singleline(&mut self.search).changed() {
            self.engine.set_search(&self.search);
        }
        if !self.search.trim().is_empty() {
            ui.small(format!("{} correspondance(s)", self.engine.search_hit_count()));
        }

        ui.separator();
        self.draw_layout_controls(ui);

        ui.separator();
        self.draw_prompt_controls(ui);
    }

    fn draw_layout_controls(&mut self, ui: &mut Ui) {
        let mut strategy = self.engine.strategy();
        ui.horizontal(|ui| {
            for candidate in [LayoutStrategy::Orbital, LayoutStrategy::Physics] {
                ui.selectable_value(&mut strategy, candidate, candidate.label());
            }
        });
        if strategy != self.engine.strategy() {
            self.engine.set_strategy(strategy);
            self.session.strategy = strategy;
            self.persist_session();
        }

        ui.collapsing("Réglages de la physique", |ui| {
            ui.add_enabled_ui(strategy == LayoutStrategy::Physics, |ui| {
                let mut config = self.engine.physics_config();
                let mut changed = false;
                changed |= tuning_slider(
                    ui,
                    &mut config.link_distance,
                    30.0..=220.0,
                    "Longueur des liens",
                    "Distance de repos entre deux nœuds liés.",
                );
                changed |= tuning_slider(
                    ui,
                    &mut config.link_strength,
                    0.05..=1.0,
                    "Raideur des liens",
                    "Force avec laquelle un lien ramène ses extrémités.",
                );
                changed |= tuning_slider(
                    ui,
                    &mut config.charge_scale,
                    0.2..=3.0,
                    "Répulsion",
                    "Multiplie la charge de chaque catégorie.",
                );
                changed |= tuning_slider(
                    ui,
                    &mut config.collision_strength,
                    0.0..=1.0,
                    "Collision",
                    "Empêche les bulles de se chevaucher.",
                );
                changed |= tuning_slider(
                    ui,
                    &mut config.velocity_decay,
                    0.1..=0.9,
                    "Amortissement",
                    "Part de vitesse perdue à chaque pas.",
                );

                if ui.button("Valeurs par défaut").clicked() {
                    config = PhysicsConfig::default();
                    changed = true;
                }
                if changed {
                    self.engine.set_physics_config(config);
                }
            });
        });
    }

    fn draw_prompt_controls(&mut self, ui: &mut Ui) {
        let mut session_changed = false;

        egui::ComboBox::from_label("Style")
            .selected_text(catalog_label(&STYLES, &self.session.style_id))
            .show_ui(ui, |ui| {
                for (id, label) in STYLES {
                    session_changed |= ui
                        .selectable_value(&mut self.session.style_id, id.to_owned(), label)
                        .changed();
                }
            });
        egui::ComboBox::from_label("Usage")
            .selected_text(catalog_label(&USAGES, &self.session.usage_id))
            .show_ui(ui, |ui| {
                for (id, label) in USAGES {
                    session_changed |= ui
                        .selectable_value(&mut self.session.usage_id, id.to_owned(), label)
                        .changed();
                }
            });

        if ui
            .checkbox(&mut self.cloud.enabled, "IA cloud (optionnelle)")
            .on_hover_text("Sans cette option, rien ne quitte la machine.")
            .changed()
        {
            self.session.cloud_enabled = self.cloud.enabled;
            session_changed = true;
        }
        if session_changed {
            self.persist_session();
        }

        if ui.button("Envoyer le prompt").clicked() {
            self.send_prompt();
        }
    }
}
