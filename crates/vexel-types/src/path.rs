//! Normalized path commands and SVG path-data parsing.
//!
//! Path data is parsed by [`kurbo::BezPath::from_svg`], which resolves
//! relative forms, turns `H`/`V` into lines, makes the reflected control
//! point of `S`/`T` explicit, and converts elliptical arcs to cubic
//! Béziers. Stored paths are therefore absolute `M L C Q Z` commands.

use kurbo::{BezPath, PathEl};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::geometry::Point;

/// One absolute path command.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    CubicTo {
        c1: Point,
        c2: Point,
        to: Point,
    },
    QuadTo {
        c: Point,
        to: Point,
    },
    Close,
}

impl PathCommand {
    /// Absolute SVG command letter.
    pub fn letter(&self) -> char {
        match self {
            Self::MoveTo(_) => 'M',
            Self::LineTo(_) => 'L',
            Self::CubicTo { .. } => 'C',
            Self::QuadTo { .. } => 'Q',
            Self::Close => 'Z',
        }
    }

    /// Flat parameter list in SVG order.
    pub fn params(&self) -> Vec<f32> {
        self.points().iter().flat_map(|p| [p.x, p.y]).collect()
    }

    /// Number of parameters the absolute command with `letter` takes.
    pub fn arity(letter: char) -> Option<usize> {
        match letter {
            'M' | 'L' => Some(2),
            'C' => Some(6),
            'Q' => Some(4),
            'Z' => Some(0),
            _ => None,
        }
    }

    /// Rebuild a command from its letter and flat parameters.
    pub fn from_letter_params(letter: char, params: &[f32]) -> Result<Self, TypeError> {
        let expected =
            Self::arity(letter).ok_or_else(|| TypeError::UnknownPathCommand(letter.to_string()))?;
        if params.len() != expected {
            return Err(TypeError::PathArity {
                command: letter,
                expected,
                actual: params.len(),
            });
        }
        let pt = |i: usize| Point::new(params[i], params[i + 1]);
        Ok(match letter {
            'M' => Self::MoveTo(pt(0)),
            'L' => Self::LineTo(pt(0)),
            'C' => Self::CubicTo {
                c1: pt(0),
                c2: pt(2),
                to: pt(4),
            },
            'Q' => Self::QuadTo { c: pt(0), to: pt(2) },
            _ => Self::Close,
        })
    }

    /// The point this command leaves the pen at, if it moves the pen.
    pub fn end_point(&self) -> Option<Point> {
        match *self {
            Self::MoveTo(p) | Self::LineTo(p) => Some(p),
            Self::CubicTo { to, .. } | Self::QuadTo { to, .. } => Some(to),
            Self::Close => None,
        }
    }

    /// Every explicit point (control and end points) in this command.
    pub fn points(&self) -> Vec<Point> {
        match *self {
            Self::MoveTo(p) | Self::LineTo(p) => vec![p],
            Self::CubicTo { c1, c2, to } => vec![c1, c2, to],
            Self::QuadTo { c, to } => vec![c, to],
            Self::Close => Vec::new(),
        }
    }

    /// Apply `f` to every explicit point in place.
    pub fn map_points(&mut self, mut f: impl FnMut(Point) -> Point) {
        match self {
            Self::MoveTo(p) | Self::LineTo(p) => *p = f(*p),
            Self::CubicTo { c1, c2, to } => {
                *c1 = f(*c1);
                *c2 = f(*c2);
                *to = f(*to);
            }
            Self::QuadTo { c, to } => {
                *c = f(*c);
                *to = f(*to);
            }
            Self::Close => {}
        }
    }

    pub fn is_finite(&self) -> bool {
        self.points().iter().all(|p| p.is_finite())
    }
}

impl From<PathEl> for PathCommand {
    fn from(el: PathEl) -> Self {
        match el {
            PathEl::MoveTo(p) => Self::MoveTo(p.into()),
            PathEl::LineTo(p) => Self::LineTo(p.into()),
            PathEl::QuadTo(c, to) => Self::QuadTo {
                c: c.into(),
                to: to.into(),
            },
            PathEl::CurveTo(c1, c2, to) => Self::CubicTo {
                c1: c1.into(),
                c2: c2.into(),
                to: to.into(),
            },
            PathEl::ClosePath => Self::Close,
        }
    }
}

impl From<PathCommand> for PathEl {
    fn from(cmd: PathCommand) -> Self {
        match cmd {
            PathCommand::MoveTo(p) => PathEl::MoveTo(p.into()),
            PathCommand::LineTo(p) => PathEl::LineTo(p.into()),
            PathCommand::QuadTo { c, to } => PathEl::QuadTo(c.into(), to.into()),
            PathCommand::CubicTo { c1, c2, to } => {
                PathEl::CurveTo(c1.into(), c2.into(), to.into())
            }
            PathCommand::Close => PathEl::ClosePath,
        }
    }
}

/// Rebuild a kurbo path from stored commands.
pub fn to_bez_path(commands: &[PathCommand]) -> BezPath {
    commands.iter().copied().map(PathEl::from).collect()
}

/// Parse SVG path data into normalized absolute commands.
pub fn parse_svg_path(data: &str) -> Result<Vec<PathCommand>, TypeError> {
    let path = BezPath::from_svg(data)?;
    Ok(path.elements().iter().copied().map(PathCommand::from).collect())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn absolute_commands() {
        let cmds = parse_svg_path("M 10 20 L 30 40 Z").unwrap();
        assert_eq!(
            cmds,
            vec![
                PathCommand::MoveTo(p(10.0, 20.0)),
                PathCommand::LineTo(p(30.0, 40.0)),
                PathCommand::Close,
            ]
        );
    }

    #[test]
    fn relative_and_shorthand_commands_normalize() {
        let cmds = parse_svg_path("m10,10 h5 v5 l-5,0 z").unwrap();
        assert_eq!(
            cmds,
            vec![
                PathCommand::MoveTo(p(10.0, 10.0)),
                PathCommand::LineTo(p(15.0, 10.0)),
                PathCommand::LineTo(p(15.0, 15.0)),
                PathCommand::LineTo(p(10.0, 15.0)),
                PathCommand::Close,
            ]
        );
    }

    #[test]
    fn implicit_lineto_after_moveto() {
        let cmds = parse_svg_path("M0 0 10 0 10 10").unwrap();
        assert_eq!(cmds.len(), 3);
        assert_eq!(cmds[1], PathCommand::LineTo(p(10.0, 0.0)));
        assert_eq!(cmds[2], PathCommand::LineTo(p(10.0, 10.0)));
    }

    #[test]
    fn smooth_cubic_reflects_previous_control() {
        let cmds = parse_svg_path("M0 0 C 0 10 10 10 10 0 S 20 -10 20 0").unwrap();
        assert_eq!(
            cmds[2],
            PathCommand::CubicTo {
                c1: p(10.0, -10.0),
                c2: p(20.0, -10.0),
                to: p(20.0, 0.0),
            }
        );
    }

    #[test]
    fn arcs_become_cubics_ending_at_the_arc_endpoint() {
        let cmds = parse_svg_path("M0 0 a5 5 0 1 1 10 0").unwrap();
        assert_eq!(cmds[0], PathCommand::MoveTo(p(0.0, 0.0)));
        assert!(cmds.len() > 1);
        assert!(cmds[1..]
            .iter()
            .all(|c| matches!(c, PathCommand::CubicTo { .. })));
        let end = cmds.last().and_then(PathCommand::end_point).unwrap();
        assert!(end.distance(p(10.0, 0.0)) < 1e-3);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            parse_svg_path("L 1 2"),
            Err(TypeError::InvalidPathData(_))
        ));
        assert!(matches!(
            parse_svg_path("M 0 0 X 1 2"),
            Err(TypeError::UnknownPathCommand(_))
        ));
        assert!(parse_svg_path("M 0").is_err());
    }

    #[test]
    fn kurbo_path_roundtrip() {
        let cmds = parse_svg_path("M 0 0 C 1 2 3 4 5 6 Q 7 8 9 10 Z").unwrap();
        let path = to_bez_path(&cmds);
        let back: Vec<PathCommand> = path.elements().iter().copied().map(PathCommand::from).collect();
        assert_eq!(back, cmds);
    }

    #[test]
    fn from_letter_params_checks_arity() {
        assert_eq!(
            PathCommand::from_letter_params('L', &[1.0, 2.0]).unwrap(),
            PathCommand::LineTo(p(1.0, 2.0))
        );
        assert_eq!(
            PathCommand::from_letter_params('C', &[1.0]).unwrap_err(),
            TypeError::PathArity {
                command: 'C',
                expected: 6,
                actual: 1
            }
        );
        assert!(PathCommand::from_letter_params('A', &[0.0; 7]).is_err());
    }

    proptest! {
        #[test]
        fn parser_never_panics(data in "[MmLlHhVvCcSsQqTtAaZz0-9 ,.+-]{0,64}") {
            if let Ok(commands) = parse_svg_path(&data) {
                prop_assert!(matches!(commands.first(), None | Some(PathCommand::MoveTo(_))));
            }
        }
    }
}
