use egui::{FontId, Mesh, Pos2, Rect, Response, Sense, Shape, Stroke, Ui, Vec2, Widget};

use crate::map::scene::MapScene;

/// Immediate-mode view over a built [`MapScene`]: background disc,
/// country shapes, micro-state dots, hover tooltip. The widget offers no
/// zoom or pan; scroll input over it is swallowed so ambient scrolling
/// cannot move the map either.
pub struct AllianceMap<'a> {
    scene: &'a MapScene,
    tooltip_offset: Vec2,
}

impl<'a> AllianceMap<'a> {
    pub fn new(scene: &'a MapScene, tooltip_offset: Vec2) -> Self {
        Self {
            scene,
            tooltip_offset,
        }
    }
}

impl Widget for AllianceMap<'_> {
    fn ui(self, ui: &mut Ui) -> Response {
        let (rect, response) = ui.allocate_exact_size(self.scene.size, Sense::hover());
        let painter = ui.painter().with_clip_rect(rect);
        let origin = rect.min.to_vec2();

        painter.circle_filled(
            self.scene.projection.center() + origin,
            self.scene.disc_radius,
            self.scene.disc_fill,
        );

        for country in &self.scene.countries {
            if !country.triangles.is_empty() {
                let mut mesh = Mesh::default();
                for tri in country.triangles.chunks_exact(3) {
                    let base = mesh.vertices.len() as u32;
                    for p in tri {
                        mesh.colored_vertex(*p + origin, country.fill);
                    }
                    mesh.add_triangle(base, base + 1, base + 2);
                }
                painter.add(Shape::mesh(mesh));
            }
            if country.stroke != Stroke::NONE {
                for ring in &country.rings {
                    if ring.len() < 3 {
                        continue;
                    }
                    let points: Vec<Pos2> = ring.iter().map(|p| *p + origin).collect();
                    painter.add(Shape::closed_line(points, country.stroke));
                }
            }
        }

        for marker in &self.scene.markers {
            painter.circle_filled(marker.pos + origin, self.scene.marker_radius, marker.fill);
        }

        if response.hovered() {
            ui.input_mut(|i| {
                i.raw_scroll_delta = Vec2::ZERO;
                i.smooth_scroll_delta = Vec2::ZERO;
            });
        }

        if let Some(pointer) = response.hover_pos() {
            if let Some(name) = self.scene.hovered_name(pointer - origin) {
                draw_tooltip(ui, rect, pointer + self.tooltip_offset, name);
            }
        }

        response
    }
}

fn draw_tooltip(ui: &Ui, clip: Rect, at: egui::Pos2, text: &str) {
    let painter = ui.painter().with_clip_rect(clip);
    let galley = painter.layout_no_wrap(
        text.to_owned(),
        FontId::proportional(13.0),
        egui::Color32::WHITE,
    );
    let pad = egui::vec2(6.0, 4.0);
    let tip = Rect::from_min_size(at, galley.size() + pad * 2.0);
    painter.rect_filled(tip, 3.0, egui::Color32::from_black_alpha(210));
    painter.galley(tip.min + pad, galley, egui::Color32::WHITE);
}
