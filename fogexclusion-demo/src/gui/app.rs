use egui::{Color32, Pos2, Rect, Stroke, Vec2};
use fogexclusion_core::{
    config::ExclusionManagerDesc,
    gizmo::{GizmoPainter, draw_gizmos},
    manager::{ExclusionManager, MAX_EXCLUSION_VOLUMES},
    math::{EulerRot, Mat4, Quat, Transform, Vec3},
    scene::{ExclusionScene, VolumeId},
    sink::UniformStore,
    uniforms::ExclusionUniforms,
    volume::{ExclusionVolume, Rgba},
};
use std::time::{Duration, Instant};

const PALETTE: [Rgba; 4] = [
    ExclusionVolume::DEFAULT_GIZMO_COLOR,
    Rgba::new(0.3, 0.8, 1.0, 0.3),
    Rgba::new(0.4, 1.0, 0.4, 0.3),
    Rgba::new(1.0, 0.8, 0.2, 0.3),
];

/// Maps the XZ plane onto a screen rect (X right, Z up).
#[derive(Clone, Copy)]
struct TopDownView {
    rect: Rect,
    half_extent: f32,
}

impl TopDownView {
    fn scale(&self) -> f32 {
        self.rect.width().min(self.rect.height()) / (self.half_extent * 2.0)
    }

    fn world_to_screen(&self, world_pos: Vec3) -> Pos2 {
        let center = self.rect.center();
        let scale = self.scale();
        Pos2::new(center.x + world_pos.x * scale, center.y - world_pos.z * scale)
    }

    fn screen_to_world(&self, screen_pos: Pos2, height: f32) -> Vec3 {
        let center = self.rect.center();
        let scale = self.scale();
        Vec3::new(
            (screen_pos.x - center.x) / scale,
            height,
            -(screen_pos.y - center.y) / scale,
        )
    }
}

fn to_color32(color: Rgba) -> Color32 {
    Color32::from_rgba_unmultiplied(
        (color.r.clamp(0.0, 1.0) * 255.0) as u8,
        (color.g.clamp(0.0, 1.0) * 255.0) as u8,
        (color.b.clamp(0.0, 1.0) * 255.0) as u8,
        (color.a.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Draws volume gizmos projected onto the top-down view.
struct TopDownPainter<'a> {
    painter: &'a egui::Painter,
    view: TopDownView,
}

impl GizmoPainter for TopDownPainter<'_> {
    fn draw_cube(&mut self, local_to_world: Mat4, color: Rgba) {
        let mut points: Vec<Pos2> = (0..8)
            .map(|i| {
                let local = Vec3::new(
                    if i & 1 == 0 { -0.5 } else { 0.5 },
                    if i & 2 == 0 { -0.5 } else { 0.5 },
                    if i & 4 == 0 { -0.5 } else { 0.5 },
                );
                self.view.world_to_screen(local_to_world.transform_point3(local))
            })
            .collect();
        let hull = convex_hull(&mut points);
        if hull.len() >= 3 {
            self.painter.add(egui::Shape::convex_polygon(
                hull,
                to_color32(color),
                Stroke::NONE,
            ));
        }
    }

    fn draw_line(&mut self, start: Vec3, end: Vec3, color: Rgba) {
        self.painter.line_segment(
            [self.view.world_to_screen(start), self.view.world_to_screen(end)],
            Stroke::new(1.5, to_color32(color)),
        );
    }
}

/// Monotone chain hull, counter-clockwise in screen space.
fn convex_hull(points: &mut [Pos2]) -> Vec<Pos2> {
    points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));

    let cross = |o: Pos2, a: Pos2, b: Pos2| (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x);
    let mut hull: Vec<Pos2> = Vec::with_capacity(points.len() * 2);

    for &p in points.iter() {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in points.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

pub struct FogExclusionDemo {
    scene: ExclusionScene,
    manager: ExclusionManager<UniformStore>,
    started: Instant,
    view_half_extent: f32,

    // UI state
    selected: Option<VolumeId>,
    dragging: bool,
    sample_height: f32,
    sample_resolution: usize,
    interval_secs: f32,
}

impl FogExclusionDemo {
    pub fn new() -> Self {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();

        let mut scene = ExclusionScene::new();
        let mut manager =
            ExclusionManager::new(ExclusionManagerDesc::every_tick(), UniformStore::new());

        let initial = [
            Transform::from_translation_scale(Vec3::new(-4.0, 1.0, 2.0), Vec3::new(3.0, 2.0, 2.0)),
            Transform::from_translation_scale(Vec3::new(3.0, 1.0, -2.0), Vec3::new(2.0, 2.0, 5.0))
                .with_rotation(Quat::from_rotation_y(0.6)),
        ];
        for (i, transform) in initial.into_iter().enumerate() {
            let volume = ExclusionVolume::new(transform).with_color(PALETTE[i % PALETTE.len()]);
            match scene.add_volume(volume) {
                Ok(id) => manager.push_volume(id),
                Err(e) => log::error!("GUI: Failed to add initial volume: {}", e),
            }
        }

        let started = Instant::now();
        manager.initialize(&scene, Duration::ZERO);
        log::info!("GUI: Exclusion manager initialized");

        Self {
            scene,
            manager,
            started,
            view_half_extent: 10.0,
            selected: None,
            dragging: false,
            sample_height: 1.0,
            sample_resolution: 48,
            interval_secs: 0.0,
        }
    }

    fn add_volume(&mut self) {
        let index = self.scene.len();
        let volume = ExclusionVolume::from_center_size(Vec3::new(0.0, 1.0, 0.0), Vec3::splat(2.0))
            .with_color(PALETTE[index % PALETTE.len()]);

        match self.scene.add_volume(volume) {
            Ok(id) => {
                self.manager.push_volume(id);
                self.selected = Some(id);
                log::info!(
                    "GUI: Added volume {} ({} assigned, capacity {})",
                    id,
                    self.manager.volumes().len(),
                    MAX_EXCLUSION_VOLUMES
                );
            }
            Err(e) => log::error!("GUI: Failed to add volume: {}", e),
        }
    }

    fn remove_selected(&mut self) {
        if let Some(id) = self.selected.take() {
            // The manager keeps the dangling handle, which publishes as an empty slot.
            self.scene.remove_volume(id);
            log::info!("GUI: Removed volume {}", id);
        }
    }

    fn compact_slots(&mut self) {
        let live: Vec<Option<VolumeId>> = self
            .manager
            .volumes()
            .iter()
            .copied()
            .filter(|entry| entry.is_some_and(|id| self.scene.contains(id)))
            .collect();
        self.manager.set_volumes(live);
    }

    fn update_transform(&mut self, id: VolumeId, transform: Transform) {
        if let Err(e) = self.scene.set_transform(id, transform) {
            log::error!("GUI: Failed to move volume: {}", e);
        }
    }

    fn apply_interval(&mut self) {
        let desc = if self.interval_secs <= 0.0 {
            ExclusionManagerDesc::every_tick()
        } else {
            match ExclusionManagerDesc::every_secs(self.interval_secs) {
                Ok(desc) => desc,
                Err(e) => {
                    log::error!("GUI: {}", e);
                    return;
                }
            }
        };
        let continuous = self.manager.desc().continuous_update;
        self.manager.set_desc(ExclusionManagerDesc {
            continuous_update: continuous,
            ..desc
        });
    }

    /// Topmost volume whose footprint contains `point`, ignoring height.
    fn pick_volume(&self, point: Vec3) -> Option<VolumeId> {
        self.scene.ids().into_iter().rev().find(|&id| {
            self.scene.get(id).is_some_and(|volume| {
                let probe = Vec3::new(point.x, volume.position().y, point.z);
                volume
                    .world_to_local()
                    .map(|m| m.transform_point3(probe).abs().cmple(Vec3::splat(0.5)).all())
                    .unwrap_or(false)
            })
        })
    }

    fn draw_grid(&self, painter: &egui::Painter, view: TopDownView) {
        let extent = self.view_half_extent;
        let lines = extent as i32;
        for i in -lines..=lines {
            let offset = i as f32;
            painter.line_segment(
                [
                    view.world_to_screen(Vec3::new(offset, 0.0, extent)),
                    view.world_to_screen(Vec3::new(offset, 0.0, -extent)),
                ],
                Stroke::new(1.0, Color32::from_gray(60)),
            );
            painter.line_segment(
                [
                    view.world_to_screen(Vec3::new(-extent, 0.0, offset)),
                    view.world_to_screen(Vec3::new(extent, 0.0, offset)),
                ],
                Stroke::new(1.0, Color32::from_gray(60)),
            );
        }
    }

    /// Fog visibility as the shader would compute it from the published uniforms.
    fn draw_fog_samples(&self, painter: &egui::Painter, view: TopDownView) {
        let Some(uniforms) = ExclusionUniforms::from_store(self.manager.sink()) else {
            return;
        };

        let extent = self.view_half_extent;
        let step = extent * 2.0 / self.sample_resolution as f32;
        for iz in 0..self.sample_resolution {
            for ix in 0..self.sample_resolution {
                let point = Vec3::new(
                    -extent + (ix as f32 + 0.5) * step,
                    self.sample_height,
                    -extent + (iz as f32 + 0.5) * step,
                );
                let fog = uniforms.fog_visibility(point);
                let color = if fog > 0.0 {
                    Color32::from_rgba_unmultiplied(160, 170, 190, 50)
                } else {
                    Color32::from_rgba_unmultiplied(20, 20, 30, 200)
                };
                let center = view.world_to_screen(point);
                let half = step * view.scale() * 0.5;
                painter.rect_filled(
                    Rect::from_center_size(center, Vec2::splat(half * 2.0 - 1.0)),
                    0.0,
                    color,
                );
            }
        }
    }

    fn handle_mouse_interaction(&mut self, ui: &mut egui::Ui, view: TopDownView) {
        let response = ui.allocate_rect(view.rect, egui::Sense::click_and_drag());

        if response.clicked() || response.drag_started() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.selected = self.pick_volume(view.screen_to_world(pos, 0.0));
                self.dragging = response.drag_started() && self.selected.is_some();
            }
        }

        if response.dragged() && self.dragging {
            if let (Some(id), Some(pos)) = (self.selected, response.interact_pointer_pos()) {
                if let Some(mut transform) = self.scene.get(id).map(|v| v.transform) {
                    let target = view.screen_to_world(pos, transform.translation.y);
                    transform.translation = target.clamp(
                        Vec3::splat(-self.view_half_extent),
                        Vec3::splat(self.view_half_extent),
                    );
                    self.update_transform(id, transform);
                }
            }
        }

        if response.drag_stopped() {
            self.dragging = false;
        }
    }

    fn selected_volume_controls(&mut self, ui: &mut egui::Ui) {
        let Some(id) = self.selected else {
            ui.label("Click a volume to select it");
            return;
        };
        let Some(volume) = self.scene.get(id) else {
            self.selected = None;
            return;
        };

        let mut transform = volume.transform;
        let mut always_show = volume.always_show_gizmo;
        let (yaw, _, _) = transform.rotation.to_euler(EulerRot::YXZ);
        let mut yaw_degrees = yaw.to_degrees();

        ui.label(format!("Selected: {}", id));
        let mut changed = false;
        changed |= ui
            .add(egui::Slider::new(&mut transform.translation.y, -5.0..=5.0).text("height"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut yaw_degrees, -180.0..=180.0).text("yaw°"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut transform.scale.x, 0.0..=10.0).text("size x"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut transform.scale.y, 0.0..=10.0).text("size y"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut transform.scale.z, 0.0..=10.0).text("size z"))
            .changed();

        if ui.checkbox(&mut always_show, "Always show gizmo").changed() {
            if let Some(volume) = self.scene.get_mut(id) {
                volume.always_show_gizmo = always_show;
            }
        }

        if changed {
            transform.rotation = Quat::from_rotation_y(yaw_degrees.to_radians());
            self.update_transform(id, transform);
        }

        if ui.button("Remove volume").clicked() {
            self.remove_selected();
        }
    }
}

impl eframe::App for FogExclusionDemo {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Scheduler tick: the manager decides whether this frame publishes.
        let now = self.started.elapsed();
        self.manager.tick(&self.scene, now);

        egui::SidePanel::right("control_panel")
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.heading("Control Panel");
                ui.separator();

                ui.label("Update Settings:");
                let mut continuous = self.manager.desc().continuous_update;
                if ui.checkbox(&mut continuous, "Continuous update").changed() {
                    let mut desc = self.manager.desc().clone();
                    desc.continuous_update = continuous;
                    self.manager.set_desc(desc);
                }
                if ui
                    .add(
                        egui::Slider::new(&mut self.interval_secs, 0.0..=2.0)
                            .text("interval (s)"),
                    )
                    .changed()
                {
                    self.apply_interval();
                }
                if ui.button("Publish now").clicked() {
                    self.manager.publish(&self.scene);
                }
                ui.label(format!("Publishes: {}", self.manager.publish_count()));
                if let Some(report) = self.manager.last_report() {
                    ui.label(format!(
                        "count {} | resolved {} | missing {} | degenerate {} | ignored {}",
                        report.count,
                        report.resolved,
                        report.missing,
                        report.degenerate,
                        report.truncated
                    ));
                }

                ui.add_space(10.0);
                ui.separator();

                ui.label("Sampling:");
                ui.add(egui::Slider::new(&mut self.sample_height, -5.0..=5.0).text("height"));
                ui.add(
                    egui::Slider::new(&mut self.sample_resolution, 8..=96).text("resolution"),
                );

                ui.add_space(10.0);
                ui.separator();

                ui.horizontal(|ui| {
                    if ui.button("Add volume").clicked() {
                        self.add_volume();
                    }
                    if ui.button("Compact slots").clicked() {
                        self.compact_slots();
                    }
                });

                ui.add_space(5.0);
                ui.label(format!(
                    "Assigned slots: {} (capacity {})",
                    self.manager.volumes().len(),
                    MAX_EXCLUSION_VOLUMES
                ));

                let assigned: Vec<Option<VolumeId>> = self.manager.volumes().to_vec();
                egui::ScrollArea::vertical()
                    .max_height(200.0)
                    .show(ui, |ui| {
                        for (slot, entry) in assigned.iter().enumerate() {
                            let status = match entry {
                                Some(id) if !self.scene.contains(*id) => format!("{} (removed)", id),
                                Some(id) => id.to_string(),
                                None => "empty".to_string(),
                            };
                            let ignored = if slot >= MAX_EXCLUSION_VOLUMES {
                                " [ignored]"
                            } else {
                                ""
                            };
                            let is_selected = entry.is_some() && *entry == self.selected;
                            if ui
                                .selectable_label(
                                    is_selected,
                                    format!("#{}: {}{}", slot, status, ignored),
                                )
                                .clicked()
                            {
                                self.selected = *entry;
                            }
                        }
                    });

                ui.add_space(10.0);
                ui.separator();
                self.selected_volume_controls(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Fog Exclusion Demo");
            ui.label("Dark cells are excluded from fog according to the published uniforms");
            ui.separator();

            let available_size = ui.available_size();
            let size = available_size.x.min(available_size.y) - 20.0;
            let rect =
                Rect::from_center_size(ui.available_rect_before_wrap().center(), Vec2::splat(size));
            let view = TopDownView {
                rect,
                half_extent: self.view_half_extent,
            };

            let painter = ui.painter().clone();
            self.draw_grid(&painter, view);
            self.draw_fog_samples(&painter, view);
            draw_gizmos(
                &self.scene,
                self.selected,
                &mut TopDownPainter {
                    painter: &painter,
                    view,
                },
            );

            self.handle_mouse_interaction(ui, view);
        });

        ctx.request_repaint();
    }
}
