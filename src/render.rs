use crate::config::{WINDOW_HEIGHT, WINDOW_WIDTH};
use crate::game::{GameStateMachine, Mode};
use crate::hud::Hud;
use crate::marquee::{CameraPose, Marquee};
use crate::play::{CameraMode, PlaySession};
use crate::scene::{NodeShape, SceneNode};
use macroquad::prelude::*;

const SKY_COLOR: Color = Color::new(0.45, 0.62, 0.80, 1.0);
const TURRET_SIZE: Vec3 = Vec3::new(1.6, 0.7, 1.8);
const BARREL_SIZE: Vec3 = Vec3::new(0.3, 0.3, 2.6);

fn faded_color(mut color: Color, alpha: f32) -> Color {
    color.a *= alpha;
    color
}

fn darken_color(color: Color, factor: f32) -> Color {
    Color::new(color.r * factor, color.g * factor, color.b * factor, color.a)
}

// Health bar gradient: green at full, yellow at half, red when empty
fn get_health_gradient_color(ratio: f32) -> Color {
    if ratio > 0.5 {
        let t = (ratio - 0.5) * 2.0;
        Color::new(1.0 - t, 1.0, 0.0, 1.0)
    } else {
        let t = ratio * 2.0;
        Color::new(1.0, t, 0.0, 1.0)
    }
}

fn camera_from_pose(pose: CameraPose) -> Camera3D {
    Camera3D {
        position: pose.position,
        target: pose.look_at,
        up: Vec3::Y,
        ..Default::default()
    }
}

/// A rotated box: its center and the three edge vectors spanning it
#[derive(Debug, Clone, Copy, PartialEq)]
struct OrientedBox {
    center: Vec3,
    edges: [Vec3; 3],
}

impl OrientedBox {
    fn new(center: Vec3, rotation: Quat, size: Vec3) -> Self {
        OrientedBox {
            center,
            edges: [
                rotation * Vec3::X * size.x,
                rotation * Vec3::Y * size.y,
                rotation * Vec3::Z * size.z,
            ],
        }
    }

    fn corner(&self) -> Vec3 {
        let [x, y, z] = self.edges;
        self.center - (x + y + z) * 0.5
    }

    fn draw(&self, color: Color, wireframe: bool) {
        let [x, y, z] = self.edges;
        let corner = self.corner();
        if wireframe {
            draw_affine_parallelepiped_wire(corner, x, y, z, color);
        } else {
            draw_affine_parallelepiped(corner, x, y, z, None, color);
            draw_affine_parallelepiped_wire(corner, x, y, z, darken_color(color, 0.6));
        }
    }
}

// Hull, turret and barrel of a tank, in that order
fn tank_parts(
    rotation: Quat,
    translation: Vec3,
    half_extents: Vec3,
    turret_yaw: f32,
) -> [OrientedBox; 3] {
    let hull = OrientedBox::new(translation, rotation, half_extents * 2.0);
    let turret_rotation = rotation * Quat::from_rotation_y(turret_yaw);
    let turret_offset = Vec3::new(0.0, half_extents.y + TURRET_SIZE.y / 2.0, 0.0);
    let turret_center = translation + rotation * turret_offset;
    let turret = OrientedBox::new(turret_center, turret_rotation, TURRET_SIZE);
    let barrel_offset = Vec3::new(0.0, 0.0, (TURRET_SIZE.z + BARREL_SIZE.z) / 2.0);
    let barrel_center = turret_center + turret_rotation * barrel_offset;
    let barrel = OrientedBox::new(barrel_center, turret_rotation, BARREL_SIZE);
    [hull, turret, barrel]
}

// Handles rendering the active mode using macroquad
pub struct Renderer {
    title_font: Option<Font>,
    ui_font: Option<Font>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            title_font: None,
            ui_font: None,
        }
    }

    // Load the custom title font
    pub async fn load_title_font(&mut self) {
        match load_ttf_font("assets/title.ttf").await {
            Ok(font) => self.title_font = Some(font),
            Err(e) => log::warn!("Failed to load font assets/title.ttf: {}", e),
        }
    }

    // Load the custom UI font
    pub async fn load_ui_font(&mut self) {
        match load_ttf_font("assets/default.ttf").await {
            Ok(font) => self.ui_font = Some(font),
            Err(e) => log::warn!("Failed to load UI font assets/default.ttf: {}", e),
        }
    }

    pub fn draw_frame(&self, machine: &GameStateMachine) {
        clear_background(SKY_COLOR);
        match machine.mode() {
            Mode::PreMarquee => {
                set_default_camera();
                clear_background(BLACK);
                self.draw_title("TANK ARENA", "Press ENTER to continue");
            }
            Mode::Marquee(marquee) => {
                self.draw_marquee(marquee, machine.config().half_extent());
                if let Some(e) = machine.last_error() {
                    self.draw_centered(&format!("Setup failed: {}", e), 18.0, 80.0, RED);
                }
            }
            Mode::Play(session) => self.draw_play(session),
        }
    }

    fn draw_marquee(&self, marquee: &Marquee, half_extent: f32) {
        if let Some(pose) = marquee.pose() {
            set_camera(&camera_from_pose(pose));
            let slices = (half_extent / 5.0).max(1.0) as u32 * 2;
            draw_grid(slices, 5.0, DARKGREEN, faded_color(GREEN, 0.4));
            let size = Vec3::new(half_extent * 2.0, 4.0, half_extent * 2.0);
            draw_cube_wires(Vec3::new(0.0, 2.0, 0.0), size, GRAY);
        }
        set_default_camera();
        self.draw_title("TANK ARENA", "Press ENTER to play, ESC to quit");
    }

    fn draw_play(&self, session: &PlaySession) {
        set_camera(&camera_from_pose(session.camera()));
        for (_, node) in session.scene.iter() {
            Self::draw_node(node, session.wireframe);
        }
        session.particles.draw();

        set_default_camera();
        if session.hud.visible {
            self.draw_hud(&session.hud, session.state.enemies.len(), session.camera_mode());
        }
        if let Some(score) = session.hud.final_score {
            let title = if session.is_won() { "VICTORY" } else { "GAME OVER" };
            self.draw_announcement(&format!("{} - score {}", title, score));
        }
    }

    fn draw_node(node: &SceneNode, wireframe: bool) {
        let transform = node.transform;
        match node.shape {
            NodeShape::Cuboid { half_extents } => {
                OrientedBox::new(transform.translation, transform.rotation, half_extents * 2.0)
                    .draw(node.color, wireframe);
            }
            NodeShape::Sphere { radius } => {
                if wireframe {
                    draw_sphere_wires(transform.translation, radius, None, node.color);
                } else {
                    draw_sphere(transform.translation, radius, None, node.color);
                }
            }
            NodeShape::Tank {
                half_extents,
                turret_yaw,
            } => {
                let [hull, turret, barrel] = tank_parts(
                    transform.rotation,
                    transform.translation,
                    half_extents,
                    turret_yaw,
                );
                hull.draw(node.color, wireframe);
                turret.draw(darken_color(node.color, 0.8), wireframe);
                barrel.draw(DARKGRAY, wireframe);
            }
        }
    }

    fn draw_hud(&self, hud: &Hud, enemies_left: usize, camera_mode: CameraMode) {
        let padding = 16.0;
        let params = TextParams {
            font: self.ui_font.as_ref(),
            font_size: 24,
            color: WHITE,
            ..Default::default()
        };
        draw_text_ex(&format!("Score: {}", hud.score), padding, padding + 20.0, params.clone());
        draw_text_ex(
            &format!("Enemies: {}", enemies_left),
            padding,
            padding + 48.0,
            params.clone(),
        );
        if camera_mode == CameraMode::Fly {
            let small = TextParams {
                font_size: 16,
                color: LIGHTGRAY,
                ..params.clone()
            };
            draw_text_ex("FLY CAMERA (F to return)", padding, padding + 72.0, small);
        }

        // Segmented health bar, bottom left
        let bar_width = 260.0;
        let bar_height = 14.0;
        let bar_x = padding;
        let bar_y = WINDOW_HEIGHT as f32 - padding - bar_height;
        draw_rectangle(bar_x, bar_y, bar_width, bar_height, Color::from_rgba(54, 58, 70, 200));

        let ratio = hud.health_fraction();
        let segments = 10;
        let gap = 2.0;
        let segment_width = (bar_width - gap * (segments - 1) as f32) / segments as f32;
        let filled = (ratio * segments as f32).ceil() as i32;
        for i in 0..filled {
            let x = bar_x + (segment_width + gap) * i as f32;
            let width = if i == filled - 1 {
                bar_width * ratio - (segment_width + gap) * i as f32
            } else {
                segment_width
            }
            .max(0.0);
            let color = get_health_gradient_color((i + 1) as f32 / segments as f32);
            draw_rectangle(x, bar_y, width, bar_height, color);
        }
        let label = TextParams {
            font_size: 16,
            ..params
        };
        draw_text_ex(
            &format!("HP {:.0}/{:.0}", hud.hp.max(0.0), hud.max_hp),
            bar_x,
            bar_y - 6.0,
            label,
        );
    }

    fn draw_title(&self, title: &str, hint: &str) {
        let title_params = TextParams {
            font: self.title_font.as_ref(),
            font_size: 64,
            color: WHITE,
            ..Default::default()
        };
        let dims = measure_text(title, self.title_font.as_ref(), title_params.font_size, 1.0);
        let x = (WINDOW_WIDTH as f32 - dims.width) / 2.0;
        let y = WINDOW_HEIGHT as f32 * 0.3;
        let shadow = TextParams {
            color: faded_color(BLACK, 0.6),
            ..title_params.clone()
        };
        draw_text_ex(title, x + 3.0, y + 3.0, shadow);
        draw_text_ex(title, x, y, title_params);
        self.draw_centered(hint, 22.0, WINDOW_HEIGHT as f32 * 0.3 + 60.0, LIGHTGRAY);
    }

    fn draw_centered(&self, text: &str, size: f32, y: f32, color: Color) {
        let params = TextParams {
            font: self.ui_font.as_ref(),
            font_size: size as u16,
            color,
            ..Default::default()
        };
        let dims = measure_text(text, self.ui_font.as_ref(), params.font_size, 1.0);
        draw_text_ex(text, (WINDOW_WIDTH as f32 - dims.width) / 2.0, y, params);
    }

    fn draw_announcement(&self, msg: &str) {
        let rect_width = 500.0;
        let rect_height = 120.0;
        let x = (WINDOW_WIDTH as f32 / 2.0) - (rect_width / 2.0);
        let y = (WINDOW_HEIGHT as f32 / 2.0) - (rect_height / 2.0);
        draw_rectangle(x, y, rect_width, rect_height, Color::from_rgba(0, 0, 0, 180));

        let font_size_announcement = 32.0;
        let announcement_params = TextParams {
            font: self.ui_font.as_ref(),
            font_size: font_size_announcement as u16,
            color: WHITE,
            ..Default::default()
        };
        let text_dims = measure_text(
            msg,
            self.ui_font.as_ref(),
            announcement_params.font_size,
            1.0,
        );
        let text_x = x + (rect_width - text_dims.width) / 2.0;
        let text_y =
            y + (rect_height - font_size_announcement) / 2.0 + font_size_announcement * 0.7;
        draw_text_ex(msg, text_x, text_y, announcement_params);

        let hint = "Press ENTER to return";
        let hint_size = 18.0;
        let hint_params = TextParams {
            font: self.ui_font.as_ref(),
            font_size: hint_size as u16,
            color: LIGHTGRAY,
            ..Default::default()
        };
        let hint_dims = measure_text(hint, self.ui_font.as_ref(), hint_params.font_size, 1.0);
        let hint_x = x + (rect_width - hint_dims.width) / 2.0;
        draw_text_ex(hint, hint_x, y + rect_height - hint_size - 10.0, hint_params);
    }

    pub fn window_should_close() -> bool {
        is_quit_requested()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_health_gradient() {
        let full = get_health_gradient_color(1.0);
        assert_approx_eq!(full.r, 0.0);
        assert_approx_eq!(full.g, 1.0);
        let half = get_health_gradient_color(0.5);
        assert_approx_eq!(half.r, 1.0);
        assert_approx_eq!(half.g, 1.0);
        let empty = get_health_gradient_color(0.0);
        assert_approx_eq!(empty.g, 0.0);
    }

    #[test]
    fn test_oriented_box_corner() {
        let size = Vec3::new(2.0, 4.0, 6.0);
        let upright = OrientedBox::new(Vec3::new(10.0, 0.0, 0.0), Quat::IDENTITY, size);
        assert!(upright.corner().abs_diff_eq(Vec3::new(9.0, -2.0, -3.0), 1e-5));

        // A quarter turn about Y swaps the footprint
        let turned = OrientedBox::new(Vec3::ZERO, Quat::from_rotation_y(FRAC_PI_2), size);
        assert!(turned.corner().abs_diff_eq(Vec3::new(-3.0, -2.0, 1.0), 1e-5));
    }

    #[test]
    fn test_tank_parts_follow_turret_yaw() {
        let half_extents = Vec3::new(1.5, 0.75, 2.5);
        let at = Vec3::new(0.0, 1.0, 0.0);
        let reach = (TURRET_SIZE.z + BARREL_SIZE.z) / 2.0;
        let turret_y = at.y + half_extents.y + TURRET_SIZE.y / 2.0;

        let [hull, turret, barrel] = tank_parts(Quat::IDENTITY, at, half_extents, 0.0);
        assert!(hull.center.abs_diff_eq(at, 1e-5));
        assert_approx_eq!(turret.center.y, turret_y);
        assert!(barrel.center.abs_diff_eq(Vec3::new(0.0, turret_y, reach), 1e-5));

        // Hull yawed one way, turret the other: the barrel points straight ahead again
        let hull_yaw = Quat::from_rotation_y(0.5);
        let [_, _, barrel] = tank_parts(hull_yaw, at, half_extents, -0.5);
        assert!(barrel.center.abs_diff_eq(Vec3::new(0.0, turret_y, reach), 1e-4));

        let [_, _, barrel] = tank_parts(Quat::IDENTITY, at, half_extents, FRAC_PI_2);
        assert!(barrel.center.abs_diff_eq(Vec3::new(reach, turret_y, 0.0), 1e-4));
    }

    #[test]
    fn test_color_helpers() {
        let c = faded_color(Color::new(1.0, 1.0, 1.0, 0.8), 0.5);
        assert_approx_eq!(c.a, 0.4);
        let d = darken_color(Color::new(1.0, 0.5, 0.0, 1.0), 0.5);
        assert_approx_eq!(d.r, 0.5);
        assert_approx_eq!(d.g, 0.25);
        assert_approx_eq!(d.a, 1.0);
    }
}
