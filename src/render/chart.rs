use crate::model::ReportData;
use std::fmt::Write as _;

const HEIGHT: f64 = 420.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 70.0;
const MARGIN_TOP: f64 = 30.0;
const MARGIN_BOTTOM: f64 = 140.0;
const BAND: f64 = 60.0;
const BAR_WIDTH: f64 = 0.4;
const TICKS: usize = 5;

const CPU_COLOR: &str = "red";
const WALL_COLOR: &str = "blue";

/// Render a self-contained SVG bar chart: CPU hours per stage against the left
/// axis, wall time in hours against the right axis, stages along x.
///
/// The markup skeleton is a template with `__NAME__` placeholders; the bars,
/// ticks and labels are generated and spliced in.
pub fn render_chart_svg(data: &ReportData) -> String {
    let n = data.stages.len().max(1);
    let plot_w = BAND * n as f64;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let width = MARGIN_LEFT + plot_w + MARGIN_RIGHT;
    let bottom = MARGIN_TOP + plot_h;
    let right = MARGIN_LEFT + plot_w;

    let cpu: Vec<f64> = data.stages.iter().map(|s| s.cpu_units).collect();
    let wall: Vec<f64> = data
        .stages
        .iter()
        .map(|s| s.total_elapsed as f64 / 3600.0)
        .collect();
    let cpu_max = nice_max(cpu.iter().copied().fold(0.0, f64::max));
    let wall_max = nice_max(wall.iter().copied().fold(0.0, f64::max));

    let mut bars = String::new();
    let mut labels = String::new();
    for (i, stage) in data.stages.iter().enumerate() {
        let x0 = MARGIN_LEFT + BAND * i as f64;
        let centre = x0 + BAND / 2.0;
        let bar_w = BAND * BAR_WIDTH;

        let h = plot_h * cpu[i].max(0.0) / cpu_max;
        let _ = writeln!(
            bars,
            r#"  <rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"><title>{}: {:.2} CPU hours</title></rect>"#,
            centre - bar_w,
            bottom - h,
            bar_w,
            h,
            CPU_COLOR,
            escape_xml(&stage.step),
            cpu[i]
        );

        let h = plot_h * wall[i].max(0.0) / wall_max;
        let _ = writeln!(
            bars,
            r#"  <rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"><title>{}: {:.2} wall hours</title></rect>"#,
            centre,
            bottom - h,
            bar_w,
            h,
            WALL_COLOR,
            escape_xml(&stage.step),
            wall[i]
        );

        let _ = writeln!(
            labels,
            r#"  <text x="{:.1}" y="{:.1}" text-anchor="end" transform="rotate(-45 {:.1} {:.1})">{}</text>"#,
            centre,
            bottom + 14.0,
            centre,
            bottom + 14.0,
            escape_xml(&stage.step)
        );
    }

    let mut ticks = String::new();
    for k in 0..=TICKS {
        let frac = k as f64 / TICKS as f64;
        let y = bottom - plot_h * frac;
        let _ = writeln!(
            ticks,
            r##"  <line x1="{l:.1}" y1="{y:.1}" x2="{r:.1}" y2="{y:.1}" stroke="#eee"/>
  <text x="{lx:.1}" y="{ty:.1}" text-anchor="end" fill="{cc}">{cv}</text>
  <text x="{rx:.1}" y="{ty:.1}" text-anchor="start" fill="{wc}">{wv}</text>"##,
            l = MARGIN_LEFT,
            r = right,
            y = y,
            lx = MARGIN_LEFT - 6.0,
            rx = right + 6.0,
            ty = y + 4.0,
            cc = CPU_COLOR,
            wc = WALL_COLOR,
            cv = fmt_tick(cpu_max * frac),
            wv = fmt_tick(wall_max * frac),
        );
    }

    const TEMPLATE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="__WIDTH__" height="__HEIGHT__" viewBox="0 0 __WIDTH__ __HEIGHT__" font-family="sans-serif" font-size="11">
  <rect width="100%" height="100%" fill="white"/>
__TICKS__
__BARS__
  <line x1="__LEFT__" y1="__TOP__" x2="__LEFT__" y2="__BOTTOM__" stroke="red"/>
  <line x1="__RIGHT__" y1="__TOP__" x2="__RIGHT__" y2="__BOTTOM__" stroke="blue"/>
  <line x1="__LEFT__" y1="__BOTTOM__" x2="__RIGHT__" y2="__BOTTOM__" stroke="black"/>
__LABELS__
  <text x="16" y="__MIDDLE__" text-anchor="middle" fill="red" transform="rotate(-90 16 __MIDDLE__)">CPU Hours</text>
  <text x="__RIGHT_TITLE__" y="__MIDDLE__" text-anchor="middle" fill="blue" transform="rotate(90 __RIGHT_TITLE__ __MIDDLE__)">Wall time (Hours)</text>
</svg>
"##;

    TEMPLATE
        .replace("__WIDTH__", &format!("{:.0}", width))
        .replace("__HEIGHT__", &format!("{:.0}", HEIGHT))
        .replace("__LEFT__", &format!("{:.1}", MARGIN_LEFT))
        .replace("__RIGHT_TITLE__", &format!("{:.1}", width - 16.0))
        .replace("__RIGHT__", &format!("{:.1}", right))
        .replace("__TOP__", &format!("{:.1}", MARGIN_TOP))
        .replace("__BOTTOM__", &format!("{:.1}", bottom))
        .replace("__MIDDLE__", &format!("{:.1}", MARGIN_TOP + plot_h / 2.0))
        .replace("__TICKS__", ticks.trim_end())
        .replace("__BARS__", bars.trim_end())
        .replace("__LABELS__", labels.trim_end())
}

/// Round an axis maximum up to 1, 2 or 5 times a power of ten.
fn nice_max(v: f64) -> f64 {
    if !v.is_finite() || v <= 0.0 {
        return 1.0;
    }
    let mag = 10f64.powf(v.log10().floor());
    [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|m| m * mag)
        .find(|&m| m >= v)
        .unwrap_or(10.0 * mag)
}

fn fmt_tick(v: f64) -> String {
    if v == v.trunc() {
        format!("{:.0}", v)
    } else {
        format!("{:.2}", v)
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
