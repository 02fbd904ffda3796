use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::CanvasState;

const CORNER_RADIUS: f64 = 6.0;
const LABEL_PADDING: f64 = 10.0;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
	let r = r.min(w / 2.0).min(h / 2.0);
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}

fn draw_edges(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (line_width, dash, gap, arrow_size) = (1.5 / k.max(0.5), 8.0, 4.0, 9.0);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let t = ease_out_cubic(state.hover.highlight_t);
	let has_highlight = state.has_active_highlight();

	for (i, edge) in state.scene.edges.iter().enumerate() {
		let (Some(((x1, y1), (x2, y2))), Some((s, tg))) = (state.edge_segment(i), state.edge_link(i))
		else {
			continue;
		};
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		let is_highlighted = state.is_highlighted(s) && state.is_highlighted(tg);

		// t=0: every edge at 0.6; t=1: highlighted at 0.9, the rest at 0.15
		let (edge_alpha, arrow_alpha, width) = if is_highlighted {
			(0.6 + 0.3 * t, 0.8 + 0.1 * t, line_width * (1.0 + 0.3 * t))
		} else {
			(0.6 - 0.45 * t, 0.8 - 0.45 * t, line_width * (1.0 - 0.3 * t))
		};

		ctx.set_stroke_style_str(&format!("rgba(100, 180, 255, {})", edge_alpha));
		ctx.set_line_width(width);
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(dash),
			&JsValue::from_f64(gap),
		));
		ctx.set_line_dash_offset(dash_offset);

		let (ux, uy) = (dx / dist, dy / dist);
		ctx.begin_path();
		ctx.move_to(x1, y1);
		ctx.line_to(x2 - ux * arrow_size, y2 - uy * arrow_size);
		ctx.stroke();

		let _ = ctx.set_line_dash(&js_sys::Array::new());
		ctx.set_fill_style_str(&format!("rgba(100, 180, 255, {})", arrow_alpha));
		let (back_x, back_y) = (x2 - ux * arrow_size, y2 - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(x2, y2);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();

		if edge.label.is_empty() || (has_highlight && !is_highlighted) {
			continue;
		}
		ctx.set_fill_style_str(&format!("rgba(200, 220, 255, {})", edge_alpha));
		ctx.set_font("10px sans-serif");
		ctx.set_text_align("center");
		let _ = ctx.fill_text(&edge.label, (x1 + x2) / 2.0, (y1 + y2) / 2.0 - 4.0);
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
	ctx.set_text_align("start");
}

fn draw_nodes(state: &CanvasState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
		state.transform.k,
	);
	let size = state.scene.node_size;

	// Dimmed nodes first so highlighted ones draw on top.
	let order = (0..state.scene.nodes.len())
		.filter(|&i| !(has_highlight && state.is_highlighted(i)))
		.chain((0..state.scene.nodes.len()).filter(|&i| has_highlight && state.is_highlighted(i)));

	for idx in order {
		let node = &state.scene.nodes[idx];
		let (x, y) = (node.position.x, node.position.y);
		let highlighted = has_highlight && state.is_highlighted(idx);
		let alpha = if has_highlight && !highlighted {
			1.0 - 0.7 * t
		} else {
			1.0
		};

		if highlighted && state.is_hovered(idx) && t > 0.01 {
			let (cx, cy) = state.node_center(idx);
			let glow_radius = size.width * (0.6 + 0.2 * t);
			if let Ok(gradient) = ctx.create_radial_gradient(cx, cy, size.height * 0.3, cx, cy, glow_radius) {
				let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {})", 0.3 * t));
				let _ = gradient.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", 0.1 * t));
				let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
				ctx.begin_path();
				let _ = ctx.arc(cx, cy, glow_radius, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		ctx.set_global_alpha(alpha);
		rounded_rect(ctx, x, y, size.width, size.height, CORNER_RADIUS);
		ctx.set_fill_style_str(&node.color.to_css());
		ctx.fill();

		if state.is_focused(idx) {
			rounded_rect(ctx, x - 5.0, y - 5.0, size.width + 10.0, size.height + 10.0, CORNER_RADIUS + 4.0);
			ctx.set_stroke_style_str("rgba(255, 215, 0, 0.9)");
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(4.0),
				&JsValue::from_f64(3.0),
			));
			ctx.set_line_width(2.0 / k.max(0.5));
			ctx.stroke();
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}
		if state.is_selected(idx) {
			rounded_rect(ctx, x - 2.0, y - 2.0, size.width + 4.0, size.height + 4.0, CORNER_RADIUS + 2.0);
			ctx.set_stroke_style_str("white");
			ctx.set_line_width(2.5 / k.max(0.5));
			ctx.stroke();
		}

		ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", 0.95 * alpha));
		ctx.set_font("12px sans-serif");
		ctx.set_text_baseline("middle");
		let _ = ctx.fill_text_with_max_width(
			&node.label,
			x + LABEL_PADDING,
			y + size.height / 2.0,
			size.width - 2.0 * LABEL_PADDING,
		);
		ctx.set_global_alpha(1.0);
	}
	ctx.set_text_baseline("alphabetic");
}
