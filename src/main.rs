use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Parser;
use eframe::egui;
use glam::DVec2;

use sunburst::canvas::{ArcGeometry, Viewport};
use sunburst::host::{
    self, ActionOutcome, ContextAction, HostBridge, HostError, HostOs, NativeDialogs,
};
use sunburst::renderer::ActionTarget;
use sunburst::scene::{ArcKey, ArcPrimitive};
use sunburst::{ChartConfig, RadialTreeRenderer, TreeNode};

#[derive(Debug, Parser)]
#[command(name = "sunburst", about = "Zoomable sunburst view of a sized tree")]
struct Cli {
    /// Tree as JSON: { "name": .., "children": [..], "size": .. }
    tree: PathBuf,

    /// Chart settings (JSON), any field may be omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rings shown below the focus
    #[arg(long)]
    visible_depth: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ChartConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ChartConfig::default(),
    };
    if let Some(depth) = cli.visible_depth {
        config.visible_depth = depth;
    }

    let tree = sunburst::load_tree(&cli.tree)
        .with_context(|| format!("loading tree {}", cli.tree.display()))?;
    let app = SunburstApp::new(tree, config)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([720.0, 780.0])
            .with_title(format!("Sunburst - {}", app.tree.name)),
        ..Default::default()
    };

    eframe::run_native(
        "Sunburst",
        options,
        Box::new(move |cc| {
            configure_style(&cc.egui_ctx);
            Box::new(app)
        }),
    )
    .map_err(|err| anyhow::anyhow!("viewer exited with an error: {err}"))
}

fn configure_style(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    let mut visuals = egui::Visuals::dark();
    visuals.panel_fill = egui::Color32::from_rgb(24, 26, 31);
    visuals.window_rounding = egui::Rounding::same(8.0);
    style.visuals = visuals;
    style.spacing.item_spacing = egui::vec2(10.0, 6.0);
    ctx.set_style(style);
}

/// Host bridge for the viewer: clipboard goes through egui, the rest to
/// the native helpers.
struct EguiHost<'a> {
    ctx: &'a egui::Context,
}

impl HostBridge for EguiHost<'_> {
    fn open_path(&mut self, path: &str) -> Result<(), HostError> {
        host::open_in_file_manager(path)
    }

    fn write_clipboard(&mut self, text: &str) -> Result<(), HostError> {
        self.ctx.output_mut(|o| o.copied_text = text.to_string());
        Ok(())
    }

    fn move_to_trash(&mut self, path: &str) -> Result<(), HostError> {
        host::trash_path(path)
    }

    fn delete_path(&mut self, path: &str) -> Result<(), HostError> {
        host::remove_path(path)
    }
}

struct SunburstApp {
    tree: TreeNode,
    renderer: RadialTreeRenderer,
    dialogs: NativeDialogs,
    os: Option<HostOs>,
    /// Arc the open context menu belongs to
    menu_target: Option<ActionTarget>,
}

impl SunburstApp {
    fn new(tree: TreeNode, config: ChartConfig) -> Result<Self> {
        let renderer = RadialTreeRenderer::new(&tree, config)?;
        let os = HostOs::current();
        tracing::info!(
            nodes = tree.count(),
            levels = renderer.layout().height(),
            root = %tree.name,
            os = os.map_or("unknown", HostOs::name),
            "tree loaded"
        );
        Ok(Self {
            tree,
            renderer,
            dialogs: NativeDialogs,
            os,
            menu_target: None,
        })
    }

    fn run_action(&mut self, ctx: &egui::Context, action: ContextAction) {
        let Some(target) = self.menu_target.take() else {
            return;
        };
        let mut bridge = EguiHost { ctx };
        let mut removed = None;
        let outcome = host::run_context_action(action, &target, &mut bridge, &mut self.dialogs, |t| {
            removed = Some(t.source.clone())
        });
        if outcome == ActionOutcome::Removed {
            if let Some(source) = removed {
                self.remove_node(&source);
            }
        }
    }

    /// Drop a node that is gone from disk and redraw the chart from scratch.
    fn remove_node(&mut self, source: &[usize]) {
        if self.tree.remove_at(source).is_none() {
            tracing::warn!(?source, "removed node not found in tree");
            return;
        }
        match RadialTreeRenderer::new(&self.tree, self.renderer.config().clone()) {
            Ok(renderer) => self.renderer = renderer,
            Err(err) => tracing::error!("failed to rebuild chart: {err}"),
        }
    }

    fn paint_arc(
        painter: &egui::Painter,
        viewport: &Viewport,
        geometry: &ArcGeometry,
        arc: &ArcPrimitive,
        hovered: bool,
    ) {
        if arc.opacity <= 0.0 || arc.span.is_degenerate() {
            return;
        }
        let sector = geometry.sector(&arc.span);
        let color = arc_color(arc, hovered);

        // Triangle strip between the two edges
        let mut mesh = egui::Mesh::default();
        for (inner, outer) in sector.inner.iter().zip(&sector.outer) {
            mesh.colored_vertex(to_pos(viewport.to_screen(*inner)), color);
            mesh.colored_vertex(to_pos(viewport.to_screen(*outer)), color);
        }
        let quads = sector.inner.len().saturating_sub(1) as u32;
        for i in 0..quads {
            let base = 2 * i;
            mesh.add_triangle(base, base + 1, base + 2);
            mesh.add_triangle(base + 1, base + 3, base + 2);
        }
        painter.add(egui::Shape::mesh(mesh));
    }
}

fn arc_color(arc: &ArcPrimitive, hovered: bool) -> egui::Color32 {
    let boost = |c: u8| {
        if hovered {
            (c as f32 * 1.15).min(255.0) as u8
        } else {
            c
        }
    };
    egui::Color32::from_rgba_unmultiplied(
        boost(arc.fill.r),
        boost(arc.fill.g),
        boost(arc.fill.b),
        (arc.opacity.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

fn to_pos(v: DVec2) -> egui::Pos2 {
    egui::pos2(v.x as f32, v.y as f32)
}

fn to_dvec(p: egui::Pos2) -> DVec2 {
    DVec2::new(p.x as f64, p.y as f64)
}

/// Last path component, for the center label.
fn short_name(name: &str) -> &str {
    name.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(name)
}

impl eframe::App for SunburstApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.renderer.is_animating() {
            let dt = ctx.input(|i| i.stable_dt).clamp(0.0, 0.1);
            self.renderer.advance(Duration::from_secs_f32(dt));
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Sunburst");
                ui.separator();
                let focus = self.renderer.layout().node(self.renderer.focus());
                ui.label(focus.name.as_str());
                ui.separator();
                let levels = self.renderer.layout().height().saturating_sub(focus.depth);
                ui.label(format!(
                    "{} arcs, {} levels below",
                    self.renderer.render_set().main_arcs.len(),
                    levels
                ));
            });
        });

        let mut pending: Option<ContextAction> = None;

        egui::CentralPanel::default().show(ctx, |ui| {
            let (mut response, painter) =
                ui.allocate_painter(ui.available_size(), egui::Sense::click());
            let rect = response.rect;
            let viewport = Viewport::fit(
                self.renderer.config().width,
                to_dvec(rect.min),
                DVec2::new(rect.width() as f64, rect.height() as f64),
            );
            let geometry = *self.renderer.geometry();

            let hover = response.hover_pos().map(|p| viewport.to_logical(to_dvec(p)));
            let hovered_key = hover
                .and_then(|p| self.renderer.arc_at(p))
                .map(ArcKey::Node);

            for arc in self.renderer.arcs() {
                let hovered = hovered_key.as_ref() == Some(&arc.key) && arc.is_clickable();
                Self::paint_arc(&painter, &viewport, &geometry, &arc, hovered);
            }

            let center = to_pos(viewport.center);
            painter.circle_filled(
                center,
                (geometry.radius * viewport.scale) as f32,
                egui::Color32::from_rgb(40, 44, 52),
            );
            let focus = self.renderer.layout().node(self.renderer.focus());
            painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                short_name(&focus.name),
                egui::FontId::proportional(13.0),
                egui::Color32::from_rgba_unmultiplied(255, 255, 255, 200),
            );

            if let Some(point) = hover {
                if self.renderer.hit_test(point).is_some() {
                    ctx.set_cursor_icon(egui::CursorIcon::PointingHand);
                }
                if let Some(label) = self.renderer.label_at(point) {
                    let label = label.to_string();
                    response = response.on_hover_text_at_pointer(label);
                }
            }

            if response.clicked() {
                let target = response
                    .interact_pointer_pos()
                    .and_then(|p| self.renderer.hit_test(viewport.to_logical(to_dvec(p))));
                if let Some(target) = target {
                    if self.renderer.click(target) {
                        ctx.request_repaint();
                    }
                }
            }

            if response.secondary_clicked() {
                self.menu_target = response
                    .interact_pointer_pos()
                    .and_then(|p| self.renderer.arc_at(viewport.to_logical(to_dvec(p))))
                    .map(|id| self.renderer.action_target(id));
            }

            let os = self.os;
            let menu_target = &self.menu_target;
            response.context_menu(|ui| {
                let Some(target) = menu_target else {
                    ui.close_menu();
                    return;
                };
                ui.label(short_name(&target.path));
                ui.separator();
                for action in ContextAction::MENU {
                    if ui.button(action.label(os)).clicked() {
                        pending = Some(action);
                        ui.close_menu();
                    }
                }
            });
        });

        if let Some(action) = pending {
            self.run_action(ctx, action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("/home/user/docs"), "docs");
        assert_eq!(short_name("/home/user/docs/"), "docs");
        assert_eq!(short_name(r"C:\Users\me"), "me");
        assert_eq!(short_name("root"), "root");
        assert_eq!(short_name("/"), "/");
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from(["sunburst", "tree.json", "--visible-depth", "3"]).unwrap();
        assert_eq!(cli.tree, PathBuf::from("tree.json"));
        assert_eq!(cli.visible_depth, Some(3));
        assert!(cli.config.is_none());
    }
}
