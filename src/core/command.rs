//! Terminal command parser for typed participant input
//!
//! Accepted forms:
//! - `412 187`, `412,187`, `click 412 187` - click position in pixels
//! - `45deg`, `45°`, `angle 45`, `a -30` - angle on the circle in degrees
//! - a single digit - confidence rating
//! - `y` / `yes`, `n` / `no` - revision choice
//! - `q`, `quit`, `exit` - quit

use lazy_static::lazy_static;
use regex::Regex;
use crate::types::{Circle, Point};

lazy_static! {
    static ref RE_QUIT: Regex = Regex::new(r"(?i)^(q|quit|exit)$").unwrap();

    static ref RE_YES: Regex = Regex::new(r"(?i)^(y|yes)$").unwrap();

    static ref RE_NO: Regex = Regex::new(r"(?i)^(n|no)$").unwrap();

    static ref RE_DIGIT: Regex = Regex::new(r"^([0-9])$").unwrap();

    static ref RE_ANGLE: Regex = Regex::new(
        r"(?i)^(?:(?:a|angle)\s+(-?\d+(?:\.\d+)?)|(-?\d+(?:\.\d+)?)\s*(?:°|deg|degrees))$"
    ).unwrap();

    static ref RE_CLICK: Regex = Regex::new(
        r"(?i)^(?:click\s+)?(-?\d+(?:\.\d+)?)\s*[,\s]\s*(-?\d+(?:\.\d+)?)$"
    ).unwrap();
}

/// One parsed line of terminal input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Quit,
    Yes,
    No,
    Digit(u8),
    /// Degrees
    Angle(f64),
    Click(Point),
    Unrecognized,
}

impl Command {
    /// Click position for commands that name a place on the circle
    pub fn to_click(&self, circle: &Circle) -> Option<Point> {
        match self {
            Command::Click(p) => Some(*p),
            Command::Angle(deg) => Some(circle.point_from_angle(deg.to_radians())),
            _ => None,
        }
    }
}

/// Stateless parser over the accepted command forms
#[derive(Debug, Default)]
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, line: &str) -> Command {
        let line = line.trim();

        if RE_QUIT.is_match(line) {
            return Command::Quit;
        }
        if RE_YES.is_match(line) {
            return Command::Yes;
        }
        if RE_NO.is_match(line) {
            return Command::No;
        }
        if let Some(caps) = RE_DIGIT.captures(line) {
            if let Ok(d) = caps[1].parse::<u8>() {
                return Command::Digit(d);
            }
        }
        if let Some(caps) = RE_ANGLE.captures(line) {
            let value = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
            if let Some(Ok(deg)) = value.map(str::parse::<f64>) {
                return Command::Angle(deg);
            }
        }
        if let Some(caps) = RE_CLICK.captures(line) {
            if let (Ok(x), Ok(y)) = (caps[1].parse::<f64>(), caps[2].parse::<f64>()) {
                return Command::Click(Point::new(x, y));
            }
        }

        Command::Unrecognized
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quit_forms() {
        let p = CommandParser::new();
        for s in ["q", "quit", "EXIT", "  quit  "] {
            assert_eq!(p.parse(s), Command::Quit);
        }
    }

    #[test]
    fn test_yes_no() {
        let p = CommandParser::new();
        assert_eq!(p.parse("Y"), Command::Yes);
        assert_eq!(p.parse("yes"), Command::Yes);
        assert_eq!(p.parse("n"), Command::No);
        assert_eq!(p.parse("No"), Command::No);
    }

    #[test]
    fn test_digit() {
        let p = CommandParser::new();
        assert_eq!(p.parse("5"), Command::Digit(5));
        assert_eq!(p.parse("12"), Command::Unrecognized);
    }

    #[test]
    fn test_angle_forms() {
        let p = CommandParser::new();
        assert_eq!(p.parse("45deg"), Command::Angle(45.0));
        assert_eq!(p.parse("45 °"), Command::Angle(45.0));
        assert_eq!(p.parse("angle 12.5"), Command::Angle(12.5));
        assert_eq!(p.parse("a -30"), Command::Angle(-30.0));
    }

    #[test]
    fn test_click_forms() {
        let p = CommandParser::new();
        assert_eq!(p.parse("412 187"), Command::Click(Point::new(412.0, 187.0)));
        assert_eq!(p.parse("412,187"), Command::Click(Point::new(412.0, 187.0)));
        assert_eq!(p.parse("click 10.5, 20"), Command::Click(Point::new(10.5, 20.0)));
    }

    #[test]
    fn test_garbage() {
        let p = CommandParser::new();
        assert_eq!(p.parse(""), Command::Unrecognized);
        assert_eq!(p.parse("left"), Command::Unrecognized);
    }

    #[test]
    fn test_angle_to_click_on_circle() {
        let circle = Circle::default();
        let click = Command::Angle(0.0).to_click(&circle).unwrap();
        assert!((click.x - 600.0).abs() < 1e-9);
        assert!(Command::Yes.to_click(&circle).is_none());
    }
}
