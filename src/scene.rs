//! The animated scene: an orbiting circle and a spinning earth image, kept as
//! SVG elements whose attributes are bound to cells derived from scene time.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use crate::frp::{Cell, Listener, Transaction};
use crate::math::{orbit_position, pulse_radius, rotate_about, spin_degrees, ORBIT_RADIUS};
use crate::vec2::Vec2;

pub const SVG_NS: &str = "http://www.w3.org/2000/svg";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Side length of the earth image in scene units
pub const EARTH_SIZE: f64 = 100.0;

/// Margin kept around the orbit in the exported view box
const VIEW_MARGIN: f64 = 50.0;

/// An SVG element with attributes in insertion order
#[derive(Clone, Debug, PartialEq)]
pub struct SvgElement {
    tag: &'static str,
    attributes: Vec<(String, String)>,
}

impl SvgElement {
    pub fn new(tag: &'static str) -> Self {
        SvgElement {
            tag,
            attributes: Vec::new(),
        }
    }

    pub fn tag(&self) -> &str {
        self.tag
    }

    /// Sets an attribute, replacing an existing value in place
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn to_markup(&self) -> String {
        let mut markup = format!("<{}", self.tag);
        for (name, value) in &self.attributes {
            let _ = write!(markup, " {}=\"{}\"", name, escape_attribute(value));
        }
        markup.push_str("/>");
        markup
    }
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Formats a number the way a browser writes it into an attribute:
/// shortest round-trip digits, exponent notation below 1e-6 and from 1e21
pub fn svg_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return value.to_string();
    }
    let formatted = format!("{:e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => formatted,
    }
}

/// Formats the image transform for a spin of `degrees`
pub fn earth_transform(degrees: f64) -> String {
    format!("translate(-50, -50) rotate({} 100 100)", svg_number(degrees))
}

/// Corners of the earth image after its transform, clockwise from the
/// image's top-left, followed by the tip of its meridian
pub fn earth_outline(degrees: f64) -> ([Vec2; 4], Vec2, Vec2) {
    let pivot = Vec2::new(EARTH_SIZE, EARTH_SIZE);
    let offset = Vec2::new(-EARTH_SIZE / 2.0, -EARTH_SIZE / 2.0);
    let place = |x: f64, y: f64| {
        let p = rotate_about(Vec2::new(x, y), pivot, degrees);
        Vec2::new(p.x + offset.x, p.y + offset.y)
    };
    let corners = [
        place(0.0, 0.0),
        place(EARTH_SIZE, 0.0),
        place(EARTH_SIZE, EARTH_SIZE),
        place(0.0, EARTH_SIZE),
    ];
    let half = EARTH_SIZE / 2.0;
    (corners, place(half, half), place(half, 0.0))
}

type SharedElement = Rc<RefCell<SvgElement>>;

/// Circle bound to a position and radius
fn circle(position: &Cell<Vec2>, radius: &Cell<f64>) -> (SharedElement, Listener) {
    let mut element = SvgElement::new("circle");
    element.set("fill", "lightgrey");
    element.set("stroke-width", "4");
    element.set("stroke", "grey");
    let element = Rc::new(RefCell::new(element));

    let target = element.clone();
    let position_binding = position.listen(move |p: &Vec2| {
        let mut circle = target.borrow_mut();
        circle.set("cx", svg_number(p.x));
        circle.set("cy", svg_number(p.y));
    });

    let target = element.clone();
    let radius_binding = radius.listen(move |r: &f64| {
        target.borrow_mut().set("r", svg_number(*r));
    });

    (element, position_binding.append(radius_binding))
}

/// Earth image bound to a rotation in degrees
fn image(rotation: &Cell<f64>, href: &str) -> (SharedElement, Listener) {
    let mut element = SvgElement::new("image");
    element.set("width", svg_number(EARTH_SIZE));
    element.set("height", svg_number(EARTH_SIZE));
    element.set("xlink:href", href);
    let element = Rc::new(RefCell::new(element));

    let target = element.clone();
    let binding = rotation.listen(move |degrees: &f64| {
        target.borrow_mut().set("transform", earth_transform(*degrees));
    });
    element.borrow_mut().set("class", "earth");

    (element, binding)
}

/// The scene graph derived from one scene-time cell
pub struct Scene {
    position: Cell<Vec2>,
    radius: Cell<f64>,
    rotation: Cell<f64>,
    circle: SharedElement,
    earth: SharedElement,
    _bindings: Listener,
}

impl Scene {
    pub fn build(time: &Cell<f64>, image_href: &str) -> Scene {
        Transaction::run(|| {
            let position = time.map(|t: &f64| orbit_position(*t));
            let radius = time.map(|t: &f64| pulse_radius(*t));
            let rotation = time.map(|t: &f64| spin_degrees(*t));

            let (circle, circle_bindings) = circle(&position, &radius);
            let (earth, earth_bindings) = image(&rotation, image_href);

            Scene {
                position,
                radius,
                rotation,
                circle,
                earth,
                _bindings: circle_bindings.append(earth_bindings),
            }
        })
    }

    pub fn position(&self) -> Cell<Vec2> {
        self.position.clone()
    }

    pub fn radius(&self) -> Cell<f64> {
        self.radius.clone()
    }

    pub fn rotation(&self) -> Cell<f64> {
        self.rotation.clone()
    }

    /// Current state of the orbiting circle element
    pub fn circle(&self) -> SvgElement {
        self.circle.borrow().clone()
    }

    /// Current state of the earth image element
    pub fn earth(&self) -> SvgElement {
        self.earth.borrow().clone()
    }

    /// Serialises the scene as a standalone SVG document centred on the
    /// origin.
    pub fn to_svg(&self) -> String {
        let extent = ORBIT_RADIUS + VIEW_MARGIN;
        let side = extent * 2.0;
        let mut svg = String::new();
        let _ = writeln!(
            svg,
            "<svg xmlns=\"{}\" xmlns:xlink=\"{}\" viewBox=\"{} {} {} {}\" width=\"{}\" height=\"{}\">",
            SVG_NS, XLINK_NS, -extent, -extent, side, side, side, side
        );
        for element in [&self.circle, &self.earth] {
            let _ = writeln!(svg, "  {}", element.borrow().to_markup());
        }
        svg.push_str("</svg>\n");
        svg
    }
}
