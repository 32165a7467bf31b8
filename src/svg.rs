//! SVG visualization of a preview plan.
//!
//! Renders a vertical sequence of annotated panels: the sensor buffer the
//! camera delivers, the view with the transformed buffer drawn over it, and
//! the view after aspect fitting.
//!
//! # Example
//!
//! ```
//! use previewfit::{PreviewSetup, Rotation, Size, svg::render_preview_svg};
//!
//! let plan = PreviewSetup::new(Size::new(1920, 1080), Size::new(1920, 1080))
//!     .display_rotation(Rotation::Rotate90)
//!     .sensor_orientation(90)
//!     .plan(&[Size::new(1920, 1080), Size::new(1280, 720)])
//!     .unwrap();
//!
//! let svg = render_preview_svg(&plan);
//! assert!(svg.starts_with("<svg"));
//! ```

use std::fmt::Write;

use crate::geometry::Size;
use crate::plan::PreviewPlan;
use crate::transform::RectF;

/// Maximum pixel width for any panel in the SVG output.
const MAX_PANEL_W: f64 = 300.0;
/// Maximum pixel height for any panel in the SVG output.
const MAX_PANEL_H: f64 = 200.0;
/// Vertical distance between panels, arrow included.
const PANEL_GAP: f64 = 50.0;
const MARGIN_X: f64 = 50.0;
const MARGIN_TOP: f64 = 30.0;
/// Height of the label line above each panel.
const LABEL_H: f64 = 22.0;

/// One panel of the visualization.
struct Panel {
    label: String,
    outer: Size,
    overlay: Overlay,
    annotation: String,
}

/// What is drawn on top of a panel's outer box, in the outer box's pixels.
enum Overlay {
    /// Content fills the whole box.
    Fill,
    /// Axis-aligned content placed inside the box.
    Inner { x: f64, y: f64, w: f64, h: f64 },
    /// Transformed content; may extend past the box.
    Quad([(f32, f32); 4]),
}

/// Render a complete SVG document illustrating `plan`.
pub fn render_preview_svg(plan: &PreviewPlan) -> String {
    render_panels(&build_panels(plan))
}

fn build_panels(plan: &PreviewPlan) -> Vec<Panel> {
    let setup = &plan.setup;
    let sensor = plan.sensor_size;
    let mut panels = Vec::with_capacity(3);

    panels.push(Panel {
        label: format!("Sensor  {}×{}", sensor.width, sensor.height),
        outer: sensor,
        overlay: Overlay::Fill,
        annotation: format!(
            "{:?}{}, mounted {}°",
            plan.reason,
            if plan.swapped { ", swapped" } else { "" },
            setup.sensor_orientation
        ),
    });

    let view = setup.view;
    let (overlay, annotation) = match plan.transform {
        Some(t) if !t.matrix.is_identity() => (
            Overlay::Quad(t.matrix.map_rect(RectF::from_size(view))),
            format!(
                "display {}°, scale {:.3}, rotate {}°",
                setup.display_rotation.degrees(),
                t.scale,
                t.rotation_degrees
            ),
        ),
        _ => (Overlay::Fill, format!("display {}°", setup.display_rotation.degrees())),
    };
    panels.push(Panel {
        label: format!("View  {}×{}", view.width, view.height),
        outer: view,
        overlay,
        annotation,
    });

    let fitted = plan.fitted_view();
    if fitted != view {
        panels.push(Panel {
            label: format!("Fitted  {}×{}", fitted.width, fitted.height),
            outer: view,
            overlay: Overlay::Inner {
                x: (view.width - fitted.width) as f64 / 2.0,
                y: (view.height - fitted.height) as f64 / 2.0,
                w: fitted.width as f64,
                h: fitted.height as f64,
            },
            annotation: format!(
                "{:?} aspect {}:{}",
                setup.ui_orientation, plan.view_aspect.width, plan.view_aspect.height
            ),
        });
    }

    panels
}

/// Scale a size to fit within MAX_PANEL_W × MAX_PANEL_H, preserving aspect ratio.
fn scale_to_fit(size: Size) -> (f64, f64, f64) {
    let w = size.width as f64;
    let h = size.height as f64;
    if w == 0.0 || h == 0.0 {
        return (1.0, 1.0, 1.0);
    }
    let scale = (MAX_PANEL_W / w).min(MAX_PANEL_H / h);
    (w * scale, h * scale, scale)
}

fn render_panels(panels: &[Panel]) -> String {
    let n = panels.len() as f64;
    let total_h =
        2.0 * MARGIN_TOP + n * (LABEL_H + MAX_PANEL_H) + (n - 1.0).max(0.0) * PANEL_GAP;
    let total_w = MAX_PANEL_W + 2.0 * MARGIN_X;

    let mut svg = String::with_capacity(4096);

    // Writing into a String cannot fail.
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        total_w as u32, total_h as u32, total_w, total_h
    );

    // Light/dark mode via prefers-color-scheme
    svg.push_str(
        r##"<style>
  text { font-family: "Consolas", "DejaVu Sans Mono", "Courier New", monospace; }
  .label { font-size: 13px; font-weight: bold; fill: #333; }
  .annotation { font-size: 11px; fill: #666; }
  .outer { fill: #e8e8e8; stroke: #999; stroke-width: 1; }
  .inner { fill: #6ba3d6; stroke: #2c6faa; stroke-width: 1.5; }
  .quad { fill: #6ba3d6; fill-opacity: 0.6; stroke: #2c6faa; stroke-width: 1.5; }
  .corner { fill: #c0392b; }
  .arrow { stroke: #666; stroke-width: 1.5; fill: none; marker-end: url(#arrowhead); }
  .arrowhead { fill: #666; }
  @media (prefers-color-scheme: dark) {
    .label { fill: #e0e0e0; }
    .annotation { fill: #aaa; }
    .outer { fill: #2d2d2d; stroke: #555; }
    .inner, .quad { fill: #3a72a4; stroke: #5a9fd4; }
    .arrow { stroke: #888; }
    .arrowhead { fill: #888; }
  }
</style>
<defs>
  <marker id="arrowhead" markerWidth="8" markerHeight="6" refX="8" refY="3" orient="auto">
    <polygon points="0 0, 8 3, 0 6" class="arrowhead"/>
  </marker>
</defs>
"##,
    );

    let center_x = total_w / 2.0;
    let mut y = MARGIN_TOP;

    for (i, panel) in panels.iter().enumerate() {
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" class="label" text-anchor="middle">{}</text>"#,
            center_x,
            y + 14.0,
            escape_xml(&panel.label)
        );
        y += LABEL_H;

        let (pw, ph, scale) = scale_to_fit(panel.outer);
        let px = center_x - pw / 2.0;
        let py = y;

        let _ = writeln!(
            svg,
            r#"<rect x="{px:.1}" y="{py:.1}" width="{pw:.1}" height="{ph:.1}" class="outer" rx="2"/>"#
        );

        match &panel.overlay {
            Overlay::Fill => {
                let _ = writeln!(
                    svg,
                    r#"<rect x="{px:.1}" y="{py:.1}" width="{pw:.1}" height="{ph:.1}" class="inner" rx="2"/>"#
                );
            }
            Overlay::Inner { x, y, w, h } => {
                let _ = writeln!(
                    svg,
                    r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" class="inner" rx="1"/>"#,
                    px + x * scale,
                    py + y * scale,
                    w * scale,
                    h * scale
                );
            }
            Overlay::Quad(corners) => {
                let points: Vec<String> = corners
                    .iter()
                    .map(|&(cx, cy)| {
                        format!("{:.1},{:.1}", px + cx as f64 * scale, py + cy as f64 * scale)
                    })
                    .collect();
                let _ = writeln!(svg, r#"<polygon points="{}" class="quad"/>"#, points.join(" "));
                // Marks where the buffer's top-left corner ended up.
                let (cx, cy) = corners[0];
                let _ = writeln!(
                    svg,
                    r#"<circle cx="{:.1}" cy="{:.1}" r="3" class="corner"/>"#,
                    px + cx as f64 * scale,
                    py + cy as f64 * scale
                );
            }
        }

        if !panel.annotation.is_empty() {
            let _ = writeln!(
                svg,
                r#"<text x="{}" y="{:.1}" class="annotation" text-anchor="middle">{}</text>"#,
                center_x,
                py + ph + 14.0,
                escape_xml(&panel.annotation)
            );
        }

        y += MAX_PANEL_H;

        if i + 1 < panels.len() {
            let _ = writeln!(
                svg,
                r#"<line x1="{center_x}" y1="{:.1}" x2="{center_x}" y2="{:.1}" class="arrow"/>"#,
                y + 8.0,
                y + PANEL_GAP - 8.0
            );
            y += PANEL_GAP;
        }
    }

    svg.push_str("</svg>\n");
    svg
}

/// Escape special characters for XML text content.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
